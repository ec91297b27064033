//! Game core: grid state, spawner, scroll engine, collision resolution, tick loop.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use ratatui::style::Color;
use thiserror::Error;

/// The player's column never changes; objects scroll toward it.
pub const PLAYER_COL: usize = 0;

/// Logical content of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    Empty,
    Player,
    Obstacle,
    Reward,
}

/// Pending vertical movement for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Up,
    Down,
    #[default]
    None,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("cell ({row}, {col}) outside {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

/// Single cell: occupant plus a cosmetic background colour.
/// The colour is display-only; core logic never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellState {
    pub occupant: Occupant,
    pub color: Color,
}

impl CellState {
    fn new(color: Color) -> Self {
        Self {
            occupant: Occupant::Empty,
            color,
        }
    }
}

/// Rectangular board of cells. Dimensions are fixed at construction; the
/// grid owns every cell for its lifetime. Occupant writes are recorded in a
/// change journal that the presentation loop drains into its `BoardSink`.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    /// cells[row * cols + col]
    cells: Vec<CellState>,
    changes: Vec<(usize, usize, Occupant)>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, background: Color) -> Self {
        Self {
            rows,
            cols,
            cells: vec![CellState::new(background); rows * cols],
            changes: Vec::new(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, GridError> {
        if row >= self.rows || col >= self.cols {
            return Err(GridError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    pub fn occupant(&self, row: usize, col: usize) -> Result<Occupant, GridError> {
        Ok(self.cells[self.index(row, col)?].occupant)
    }

    /// Last write wins; no stacking of occupants within a cell.
    pub fn set_occupant(
        &mut self,
        row: usize,
        col: usize,
        occupant: Occupant,
    ) -> Result<(), GridError> {
        let idx = self.index(row, col)?;
        self.cells[idx].occupant = occupant;
        self.changes.push((row, col, occupant));
        Ok(())
    }

    pub fn color(&self, row: usize, col: usize) -> Result<Color, GridError> {
        Ok(self.cells[self.index(row, col)?].color)
    }

    /// Drain the occupant-change journal accumulated since the last call.
    pub fn take_changes(&mut self) -> Vec<(usize, usize, Occupant)> {
        std::mem::take(&mut self.changes)
    }
}

/// Randomized right-edge placement: per scroll pass, one uniformly random
/// row and one weighted roll deciding Obstacle / Reward / nothing.
///
/// The row is drawn even when the roll lands in the empty bucket, so a
/// seeded run consumes the RNG stream identically regardless of outcome.
/// Existing occupants at the right edge are overwritten without a check.
#[derive(Debug, Clone)]
pub struct Spawner {
    rng: Pcg32,
    obstacle_chance: f64,
    reward_chance: f64,
}

impl Spawner {
    pub fn new(obstacle_chance: f64, reward_chance: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => Pcg32::seed_from_u64(s),
            None => Pcg32::from_rng(&mut rand::rng()),
        };
        Self {
            rng,
            obstacle_chance,
            reward_chance,
        }
    }

    pub fn spawn(&mut self, grid: &mut Grid) -> Result<(), GridError> {
        let row = self.rng.random_range(0..grid.rows());
        let roll: f64 = self.rng.random();
        let edge = grid.cols() - 1;
        if roll < self.obstacle_chance {
            grid.set_occupant(row, edge, Occupant::Obstacle)?;
        } else if roll < self.obstacle_chance + self.reward_chance {
            grid.set_occupant(row, edge, Occupant::Reward)?;
        }
        Ok(())
    }
}

/// Capability set the tick driver needs from a game. Implemented by
/// [`GameState`]; tests may substitute their own implementation.
pub trait ScrollerGame {
    /// Steps 1-4 of a tick: clear the player marker, apply the pending
    /// direction (clamped to the board), reset it, re-mark the player.
    fn apply_move(&mut self) -> Result<(), GridError>;
    /// Shift every non-player occupant one column left; drop column 0.
    fn scroll_left(&mut self) -> Result<(), GridError>;
    /// Randomized placement at the rightmost column.
    fn populate_right_edge(&mut self) -> Result<(), GridError>;
    /// Consume the occupant at (row, col), updating the counters.
    fn handle_collision(&mut self, row: usize, col: usize) -> Result<(), GridError>;
    fn score(&self) -> u32;
    fn is_game_over(&self) -> bool;
    /// True when this tick boundary includes a scroll-and-spawn pass.
    fn scroll_due(&self) -> bool;
    fn advance_clock(&mut self);
    fn player_cell(&self) -> (usize, usize);
    fn set_direction(&mut self, direction: Direction);
}

/// One tick of the state machine. Returns `Ok(false)` once the game is
/// over; no work is performed past that point.
///
/// Sequence per tick: movement, then (on scroll boundaries) scroll, spawn,
/// and collision resolution at the player's cell, then clock advance.
pub fn step<G: ScrollerGame>(game: &mut G) -> Result<bool, GridError> {
    if game.is_game_over() {
        return Ok(false);
    }
    game.apply_move()?;
    if game.scroll_due() {
        game.scroll_left()?;
        game.populate_right_edge()?;
        let (row, col) = game.player_cell();
        game.handle_collision(row, col)?;
    }
    game.advance_clock();
    Ok(!game.is_game_over())
}

/// Display collaborator: owns all glyph/colour mapping and drawing. The
/// core only reports logical changes.
pub trait BoardSink {
    fn occupant_changed(&mut self, row: usize, col: usize, occupant: Occupant);
    fn title_changed(&mut self, title: &str);
}

/// Input collaborator: one pending direction read per tick, non-blocking.
pub trait InputSource {
    fn poll_direction(&mut self) -> Direction;
}

/// Single-slot input buffer with last-write-wins semantics: if several
/// direction events land within one tick, only the latest is honored.
#[derive(Debug, Default)]
pub struct DirectionSlot {
    pending: Direction,
}

impl DirectionSlot {
    pub fn push(&mut self, direction: Direction) {
        self.pending = direction;
    }
}

impl InputSource for DirectionSlot {
    fn poll_direction(&mut self) -> Direction {
        std::mem::take(&mut self.pending)
    }
}

/// Game state: grid, player position, counters, virtual clock.
#[derive(Debug)]
pub struct GameState {
    pub grid: Grid,
    pub player_row: usize,
    pub pending: Direction,
    /// Virtual elapsed time; advances by `tick_ms` per tick. Scroll passes
    /// happen on ticks where `ms_elapsed % scroll_ms == 0`, so the very
    /// first tick scrolls.
    pub ms_elapsed: u64,
    pub tick_ms: u64,
    pub scroll_ms: u64,
    pub times_get: u32,
    pub times_avoid: u32,
    pub avoid_limit: u32,
    pub spawner: Spawner,
}

impl GameState {
    pub fn new(config: &crate::GameConfig, background: Color) -> Self {
        let mut grid = Grid::new(config.rows, config.cols, background);
        let player_row = 0;
        // Grid is never zero-sized (clap enforces >= 1), so this cannot fail.
        let _ = grid.set_occupant(player_row, PLAYER_COL, Occupant::Player);
        Self {
            grid,
            player_row,
            pending: Direction::None,
            ms_elapsed: 0,
            tick_ms: config.tick_ms,
            scroll_ms: config.scroll_ms,
            times_get: 0,
            times_avoid: 0,
            avoid_limit: config.avoid_limit,
            spawner: Spawner::new(config.obstacle_chance, config.reward_chance, config.seed),
        }
    }
}

impl ScrollerGame for GameState {
    fn apply_move(&mut self) -> Result<(), GridError> {
        self.grid
            .set_occupant(self.player_row, PLAYER_COL, Occupant::Empty)?;
        match self.pending {
            Direction::Up if self.player_row > 0 => {
                self.player_row -= 1;
                self.handle_collision(self.player_row, PLAYER_COL)?;
            }
            Direction::Down if self.player_row + 1 < self.grid.rows() => {
                self.player_row += 1;
                self.handle_collision(self.player_row, PLAYER_COL)?;
            }
            // At an edge, or no input: stay put. The re-mark below then
            // overwrites whatever sits in the cell without resolving it;
            // this asymmetry matches the original game.
            _ => {}
        }
        self.pending = Direction::None;
        self.grid
            .set_occupant(self.player_row, PLAYER_COL, Occupant::Player)
    }

    fn scroll_left(&mut self) -> Result<(), GridError> {
        // Ascending column order: a moved object lands in a column already
        // visited, so it shifts exactly once per pass.
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                let kind = self.grid.occupant(row, col)?;
                if !matches!(kind, Occupant::Obstacle | Occupant::Reward) {
                    continue;
                }
                self.grid.set_occupant(row, col, Occupant::Empty)?;
                if col > 0 {
                    self.grid.set_occupant(row, col - 1, kind)?;
                }
                // col == 0: scrolled off the board, no collision here.
                // The driver re-checks the player's cell after the pass.
            }
        }
        Ok(())
    }

    fn populate_right_edge(&mut self) -> Result<(), GridError> {
        self.spawner.spawn(&mut self.grid)
    }

    fn handle_collision(&mut self, row: usize, col: usize) -> Result<(), GridError> {
        match self.grid.occupant(row, col)? {
            Occupant::Reward => {
                self.times_get += 1;
                self.grid.set_occupant(row, col, Occupant::Empty)
            }
            Occupant::Obstacle => {
                self.times_avoid += 1;
                self.grid.set_occupant(row, col, Occupant::Empty)
            }
            Occupant::Empty | Occupant::Player => Ok(()),
        }
    }

    fn score(&self) -> u32 {
        self.times_get
    }

    fn is_game_over(&self) -> bool {
        self.times_avoid >= self.avoid_limit
    }

    fn scroll_due(&self) -> bool {
        self.ms_elapsed % self.scroll_ms == 0
    }

    fn advance_clock(&mut self) {
        self.ms_elapsed += self.tick_ms;
    }

    fn player_cell(&self) -> (usize, usize) {
        (self.player_row, PLAYER_COL)
    }

    fn set_direction(&mut self, direction: Direction) {
        self.pending = direction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(rows: usize, cols: usize) -> crate::GameConfig {
        crate::GameConfig {
            rows,
            cols,
            tick_ms: 100,
            scroll_ms: 400,
            avoid_limit: 3,
            obstacle_chance: 0.0,
            reward_chance: 0.0,
            seed: Some(7),
        }
    }

    /// 10x15 board, scroll every tick, no random spawns.
    fn scrolling_state() -> GameState {
        let mut cfg = config(10, 15);
        cfg.scroll_ms = 100;
        GameState::new(&cfg, Color::Black)
    }

    /// 10x15 board, scroll every 4th tick; advanced one tick past the
    /// boundary so a single `step` performs no scroll pass.
    fn between_scrolls_state() -> GameState {
        let mut state = GameState::new(&config(10, 15), Color::Black);
        state.ms_elapsed = 100;
        state
    }

    #[test]
    fn occupant_last_write_wins() {
        let mut grid = Grid::new(4, 4, Color::Black);
        grid.set_occupant(2, 3, Occupant::Obstacle).unwrap();
        grid.set_occupant(2, 3, Occupant::Reward).unwrap();
        assert_eq!(grid.occupant(2, 3).unwrap(), Occupant::Reward);
    }

    #[test]
    fn out_of_bounds_rejected() {
        let mut grid = Grid::new(4, 4, Color::Black);
        let expected = GridError::OutOfBounds {
            row: 4,
            col: 0,
            rows: 4,
            cols: 4,
        };
        assert_eq!(grid.occupant(4, 0).unwrap_err(), expected);
        assert_eq!(
            grid.set_occupant(4, 0, Occupant::Reward).unwrap_err(),
            expected
        );
        assert!(grid.occupant(0, 4).is_err());
    }

    #[test]
    fn change_journal_records_writes() {
        let mut grid = Grid::new(2, 2, Color::Black);
        grid.set_occupant(0, 1, Occupant::Reward).unwrap();
        grid.set_occupant(1, 0, Occupant::Empty).unwrap();
        assert_eq!(
            grid.take_changes(),
            vec![(0, 1, Occupant::Reward), (1, 0, Occupant::Empty)]
        );
        assert!(grid.take_changes().is_empty());
    }

    #[test]
    fn scroll_shifts_objects_one_column_left() {
        let mut state = scrolling_state();
        state.grid.set_occupant(3, 7, Occupant::Obstacle).unwrap();
        state.grid.set_occupant(8, 14, Occupant::Reward).unwrap();
        state.scroll_left().unwrap();
        assert_eq!(state.grid.occupant(3, 7).unwrap(), Occupant::Empty);
        assert_eq!(state.grid.occupant(3, 6).unwrap(), Occupant::Obstacle);
        assert_eq!(state.grid.occupant(8, 14).unwrap(), Occupant::Empty);
        assert_eq!(state.grid.occupant(8, 13).unwrap(), Occupant::Reward);
    }

    #[test]
    fn scroll_drops_column_zero_without_collision() {
        let mut state = scrolling_state();
        state.grid.set_occupant(4, 0, Occupant::Obstacle).unwrap();
        state.scroll_left().unwrap();
        assert_eq!(state.grid.occupant(4, 0).unwrap(), Occupant::Empty);
        assert_eq!(state.times_avoid, 0);
    }

    #[test]
    fn scroll_never_touches_player() {
        let mut state = scrolling_state();
        state.scroll_left().unwrap();
        assert_eq!(state.grid.occupant(0, 0).unwrap(), Occupant::Player);
    }

    #[test]
    fn collision_consumes_and_is_idempotent() {
        let mut state = scrolling_state();
        state.grid.set_occupant(6, 0, Occupant::Reward).unwrap();
        state.handle_collision(6, 0).unwrap();
        assert_eq!(state.times_get, 1);
        assert_eq!(state.grid.occupant(6, 0).unwrap(), Occupant::Empty);
        // Second resolution on the cleared cell is a no-op.
        state.handle_collision(6, 0).unwrap();
        assert_eq!(state.times_get, 1);
        assert_eq!(state.times_avoid, 0);
    }

    #[test]
    fn movement_clamps_at_edges() {
        let mut state = between_scrolls_state();
        state.set_direction(Direction::Up);
        step(&mut state).unwrap();
        assert_eq!(state.player_row, 0);

        state.player_row = 9;
        state.grid.set_occupant(0, 0, Occupant::Empty).unwrap();
        state.grid.set_occupant(9, 0, Occupant::Player).unwrap();
        state.ms_elapsed = 100;
        state.set_direction(Direction::Down);
        step(&mut state).unwrap();
        assert_eq!(state.player_row, 9);
        assert_eq!(state.grid.occupant(9, 0).unwrap(), Occupant::Player);
    }

    #[test]
    fn moving_into_object_resolves_same_tick() {
        let mut state = between_scrolls_state();
        state.grid.set_occupant(1, 0, Occupant::Reward).unwrap();
        state.set_direction(Direction::Down);
        step(&mut state).unwrap();
        assert_eq!(state.player_row, 1);
        assert_eq!(state.times_get, 1);
        assert_eq!(state.grid.occupant(1, 0).unwrap(), Occupant::Player);
        assert_eq!(state.pending, Direction::None);
    }

    /// Known asymmetry carried over from the original: when the row does
    /// not change, the re-mark overwrites an occupant without scoring it.
    #[test]
    fn stationary_remark_discards_occupant_without_scoring() {
        let mut state = between_scrolls_state();
        state.player_row = 2;
        state.grid.set_occupant(2, 0, Occupant::Reward).unwrap();
        step(&mut state).unwrap();
        assert_eq!(state.grid.occupant(2, 0).unwrap(), Occupant::Player);
        assert_eq!(state.times_get, 0);
    }

    #[test]
    fn three_obstacle_hits_end_the_game_with_zero_score() {
        let mut state = scrolling_state();
        state.player_row = 5;
        state.grid.set_occupant(0, 0, Occupant::Empty).unwrap();
        state.grid.set_occupant(5, 0, Occupant::Player).unwrap();
        for cycle in 1..=3 {
            state.grid.set_occupant(5, 1, Occupant::Obstacle).unwrap();
            let running = step(&mut state).unwrap();
            assert_eq!(state.times_avoid, cycle);
            assert_eq!(running, cycle < 3);
        }
        assert!(state.is_game_over());
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn rewards_accumulate_and_game_keeps_running() {
        let mut state = scrolling_state();
        state.player_row = 2;
        state.grid.set_occupant(0, 0, Occupant::Empty).unwrap();
        state.grid.set_occupant(2, 0, Occupant::Player).unwrap();
        let mut last = 0;
        for cycle in 1..=5 {
            state.grid.set_occupant(2, 1, Occupant::Reward).unwrap();
            assert!(step(&mut state).unwrap());
            assert_eq!(state.times_get, cycle);
            // Monotone: never decreases.
            assert!(state.times_get >= last);
            last = state.times_get;
        }
        assert!(!state.is_game_over());
        assert_eq!(state.score(), 5);
    }

    #[test]
    fn no_tick_work_after_game_over() {
        let mut state = scrolling_state();
        state.times_avoid = 3;
        state.grid.set_occupant(4, 8, Occupant::Obstacle).unwrap();
        assert!(!step(&mut state).unwrap());
        // Nothing moved, clock untouched.
        assert_eq!(state.grid.occupant(4, 8).unwrap(), Occupant::Obstacle);
        assert_eq!(state.ms_elapsed, 0);
    }

    #[test]
    fn scroll_pass_only_on_wait_time_boundaries() {
        let cfg = config(10, 15); // scroll every 400 ms, tick 100 ms
        let mut state = GameState::new(&cfg, Color::Black);
        state.grid.set_occupant(5, 10, Occupant::Obstacle).unwrap();
        // Tick at t=0 scrolls; the next three do not.
        for _ in 0..4 {
            step(&mut state).unwrap();
        }
        assert_eq!(state.grid.occupant(5, 9).unwrap(), Occupant::Obstacle);
        step(&mut state).unwrap(); // t=400: scrolls again
        assert_eq!(state.grid.occupant(5, 8).unwrap(), Occupant::Obstacle);
    }

    #[test]
    fn spawner_writes_only_the_right_edge() {
        let mut grid = Grid::new(10, 15, Color::Black);
        let mut spawner = Spawner::new(1.0, 0.0, Some(42));
        for _ in 0..20 {
            spawner.spawn(&mut grid).unwrap();
        }
        for row in 0..10 {
            for col in 0..14 {
                assert_eq!(grid.occupant(row, col).unwrap(), Occupant::Empty);
            }
        }
        let edge_filled = (0..10)
            .filter(|&row| grid.occupant(row, 14).unwrap() == Occupant::Obstacle)
            .count();
        assert!(edge_filled > 0);
    }

    #[test]
    fn spawner_buckets_follow_the_chances() {
        let mut grid = Grid::new(1, 3, Color::Black);
        // Certain obstacle.
        Spawner::new(1.0, 0.0, Some(1)).spawn(&mut grid).unwrap();
        assert_eq!(grid.occupant(0, 2).unwrap(), Occupant::Obstacle);
        // Certain reward.
        Spawner::new(0.0, 1.0, Some(1)).spawn(&mut grid).unwrap();
        assert_eq!(grid.occupant(0, 2).unwrap(), Occupant::Reward);
        // Certain nothing leaves the previous write alone.
        Spawner::new(0.0, 0.0, Some(1)).spawn(&mut grid).unwrap();
        assert_eq!(grid.occupant(0, 2).unwrap(), Occupant::Reward);
    }

    /// The source never checks before placing; an existing edge occupant
    /// is silently replaced.
    #[test]
    fn spawner_overwrites_existing_edge_occupant() {
        let mut grid = Grid::new(1, 5, Color::Black);
        grid.set_occupant(0, 4, Occupant::Reward).unwrap();
        Spawner::new(1.0, 0.0, Some(3)).spawn(&mut grid).unwrap();
        assert_eq!(grid.occupant(0, 4).unwrap(), Occupant::Obstacle);
    }

    #[test]
    fn seeded_spawner_is_reproducible() {
        let mut a = Grid::new(10, 15, Color::Black);
        let mut b = Grid::new(10, 15, Color::Black);
        let mut sa = Spawner::new(0.4, 0.2, Some(99));
        let mut sb = Spawner::new(0.4, 0.2, Some(99));
        for _ in 0..50 {
            sa.spawn(&mut a).unwrap();
            sb.spawn(&mut b).unwrap();
        }
        for row in 0..10 {
            assert_eq!(a.occupant(row, 14).unwrap(), b.occupant(row, 14).unwrap());
        }
    }

    #[test]
    fn direction_slot_keeps_only_the_latest() {
        let mut slot = DirectionSlot::default();
        slot.push(Direction::Up);
        slot.push(Direction::Down);
        assert_eq!(slot.poll_direction(), Direction::Down);
        assert_eq!(slot.poll_direction(), Direction::None);
    }

    #[test]
    fn object_scrolling_under_player_is_consumed() {
        let mut state = scrolling_state();
        state.grid.set_occupant(0, 1, Occupant::Reward).unwrap();
        assert!(step(&mut state).unwrap());
        assert_eq!(state.times_get, 1);
        assert_eq!(state.grid.occupant(0, 1).unwrap(), Occupant::Empty);
    }
}
