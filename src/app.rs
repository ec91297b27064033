//! App: terminal init, main loop, tick pacing and key handling.

use crate::game::{
    self, BoardSink, Direction, DirectionSlot, GameState, InputSource, Occupant, ScrollerGame,
};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::GameConfig;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

/// Display collaborator for the terminal: the board is redrawn in full
/// every frame, so per-cell signals need no bookkeeping; the title line is
/// kept and rendered over the board border.
#[derive(Debug, Default)]
struct TuiSink {
    title: String,
}

impl BoardSink for TuiSink {
    fn occupant_changed(&mut self, _row: usize, _col: usize, _occupant: Occupant) {}

    fn title_changed(&mut self, title: &str) {
        self.title = title.to_string();
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    /// Input collaborator: crossterm events drain into this slot; the
    /// simulation reads it once per tick (last write wins).
    slot: DirectionSlot,
    sink: TuiSink,
    last_tick: Instant,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let state = GameState::new(&config, theme.bg);
        Self {
            config,
            theme,
            state,
            screen: Screen::Playing,
            paused: false,
            slot: DirectionSlot::default(),
            sink: TuiSink::default(),
            last_tick: Instant::now(),
        }
    }

    fn reset_game(&mut self) {
        self.state = GameState::new(&self.config, self.theme.bg);
        self.screen = Screen::Playing;
        self.paused = false;
        self.slot = DirectionSlot::default();
        self.sink = TuiSink::default();
        self.last_tick = Instant::now();
    }

    /// Run the game to quit or game over. Returns the final score.
    pub fn run(&mut self) -> Result<u32> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<u32> {
        let tick_interval = Duration::from_millis(self.config.tick_ms);
        loop {
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.paused,
                    &self.sink.title,
                )
            })?;

            // Block on input until the next tick is due; wall-clock pacing
            // is purely presentational, the simulation runs on its own
            // virtual clock.
            let timeout = tick_interval.saturating_sub(self.last_tick.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if let Some(score) = self.handle_action(key_to_action(key)) {
                            return Ok(score);
                        }
                    }
                }
            }

            if self.screen == Screen::Playing
                && !self.paused
                && self.last_tick.elapsed() >= tick_interval
            {
                self.last_tick = Instant::now();
                self.state.set_direction(self.slot.poll_direction());
                let running = game::step(&mut self.state)?;
                self.publish();
                if !running {
                    self.screen = Screen::GameOver;
                }
            }
        }
    }

    /// Returns `Some(score)` when the app should exit.
    fn handle_action(&mut self, action: Action) -> Option<u32> {
        match action {
            Action::Quit => return Some(self.state.score()),
            Action::Pause if self.screen == Screen::Playing => {
                self.paused = !self.paused;
            }
            Action::Restart if self.screen == Screen::GameOver => {
                self.reset_game();
            }
            Action::MoveUp if self.screen == Screen::Playing && !self.paused => {
                self.slot.push(Direction::Up);
            }
            Action::MoveDown if self.screen == Screen::Playing && !self.paused => {
                self.slot.push(Direction::Down);
            }
            _ => {}
        }
        None
    }

    /// Forward this tick's grid changes and the score line to the sink.
    fn publish(&mut self) {
        for (row, col, occupant) in self.state.grid.take_changes() {
            self.sink.occupant_changed(row, col, occupant);
        }
        self.sink
            .title_changed(&format!(" Score: {} ", self.state.score()));
    }
}
