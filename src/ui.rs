//! Layout and drawing: board, score sidebar, pause and game-over overlays.

use crate::app::Screen;
use crate::game::{GameState, Occupant, PLAYER_COL, ScrollerGame};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Each grid cell is rendered two terminal columns wide so the board
/// doesn't look squashed.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 22;

const PLAYER_GLYPH: &str = "▶ ";
const OBSTACLE_GLYPH: &str = "◆ ";
const REWARD_GLYPH: &str = "★ ";
const EMPTY_GLYPH: &str = "  ";

pub fn draw(
    f: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    paused: bool,
    title: &str,
) {
    let area = f.area();
    let (board, sidebar) = layout(area, state);
    draw_board(f, board, state, theme, title);
    draw_sidebar(f, sidebar, state, theme);
    match screen {
        Screen::GameOver => draw_game_over(f, board, state, theme),
        Screen::Playing if paused => draw_overlay(f, board, theme, "PAUSED", "p to resume", ""),
        Screen::Playing => {}
    }
}

/// Board (with border) centered in the area, sidebar to its right.
fn layout(area: Rect, state: &GameState) -> (Rect, Rect) {
    let board_w = (state.grid.cols() as u16) * CELL_WIDTH + 2;
    let board_h = state.grid.rows() as u16 + 2;
    let total_w = board_w + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(board_h) / 2;
    let board = Rect {
        x,
        y,
        width: board_w.min(area.width),
        height: board_h.min(area.height),
    };
    let sidebar = Rect {
        x: (board.x + board.width).min(area.x + area.width),
        y: board.y,
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(board.width)),
        height: board.height,
    };
    (board, sidebar)
}

fn occupant_span(occupant: Occupant, bg: ratatui::style::Color, theme: &Theme) -> Span<'static> {
    let glyph = match occupant {
        Occupant::Player => PLAYER_GLYPH,
        Occupant::Obstacle => OBSTACLE_GLYPH,
        Occupant::Reward => REWARD_GLYPH,
        Occupant::Empty => EMPTY_GLYPH,
    };
    let style = match theme.occupant_color(occupant) {
        Some(fg) => Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
        None => Style::default().bg(bg),
    };
    Span::styled(glyph, style)
}

fn draw_board(f: &mut Frame, board: Rect, state: &GameState, theme: &Theme, title: &str) {
    // Before the first tick the sink hasn't published a title yet.
    let title = if title.is_empty() {
        format!(" Score: {} ", state.times_get)
    } else {
        title.to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line))
        .title(Span::styled(
            title,
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        ));

    let mut lines = Vec::with_capacity(state.grid.rows());
    for row in 0..state.grid.rows() {
        let mut spans = Vec::with_capacity(state.grid.cols());
        for col in 0..state.grid.cols() {
            let occupant = state.grid.occupant(row, col).unwrap_or(Occupant::Empty);
            // A collision this tick can leave the player's cell empty
            // until the next re-mark; keep the icon visible regardless.
            let occupant = if row == state.player_row
                && col == PLAYER_COL
                && occupant == Occupant::Empty
                && !state.is_game_over()
            {
                Occupant::Player
            } else {
                occupant
            };
            let bg = state.grid.color(row, col).unwrap_or(theme.bg);
            spans.push(occupant_span(occupant, bg, theme));
        }
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines).block(block), board);
}

fn draw_sidebar(f: &mut Frame, sidebar: Rect, state: &GameState, theme: &Theme) {
    if sidebar.width < 4 {
        return;
    }
    let label = Style::default().fg(theme.main_fg);
    let value = Style::default().fg(theme.title).add_modifier(Modifier::BOLD);
    let hits_left = state.avoid_limit.saturating_sub(state.times_avoid);
    let lines = vec![
        Line::from(Span::styled("dodgescroll", value)),
        Line::default(),
        Line::from(vec![
            Span::styled("Score  ", label),
            Span::styled(state.times_get.to_string(), value),
        ]),
        Line::from(vec![
            Span::styled("Hits   ", label),
            Span::styled(
                format!("{}/{}", state.times_avoid, state.avoid_limit),
                Style::default().fg(theme.obstacle),
            ),
        ]),
        Line::from(vec![
            Span::styled("Lives  ", label),
            Span::styled("♥ ".repeat(hits_left as usize), Style::default().fg(theme.obstacle)),
        ]),
        Line::from(vec![
            Span::styled("Time   ", label),
            Span::styled(format!("{}s", state.ms_elapsed / 1000), value),
        ]),
        Line::default(),
        Line::from(Span::styled("↑/k up   ↓/j down", label)),
        Line::from(Span::styled("p pause  q quit", label)),
        Line::default(),
        Line::from(vec![
            Span::styled(REWARD_GLYPH, Style::default().fg(theme.reward)),
            Span::styled("collect", label),
        ]),
        Line::from(vec![
            Span::styled(OBSTACLE_GLYPH, Style::default().fg(theme.obstacle)),
            Span::styled("dodge", label),
        ]),
    ];
    let inner = Rect {
        x: sidebar.x + 2,
        y: sidebar.y + 1,
        width: sidebar.width.saturating_sub(2),
        height: sidebar.height.saturating_sub(1),
    };
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_game_over(f: &mut Frame, board: Rect, state: &GameState, theme: &Theme) {
    let line = format!("Final score: {}", state.times_get);
    draw_overlay(f, board, theme, "GAME OVER", &line, "r restart  q quit");
}

/// Small centered box over the board with a headline and one detail line.
fn draw_overlay(
    f: &mut Frame,
    board: Rect,
    theme: &Theme,
    headline: &str,
    detail: &str,
    footer: &str,
) {
    let w = (headline.len().max(detail.len()).max(18) as u16 + 4).min(board.width);
    let h = 5u16.min(board.height);
    let rect = Rect {
        x: board.x + board.width.saturating_sub(w) / 2,
        y: board.y + board.height.saturating_sub(h) / 2,
        width: w,
        height: h,
    };
    f.render_widget(Clear, rect);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title));
    let mut lines = vec![
        Line::from(Span::styled(
            headline.to_string(),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            detail.to_string(),
            Style::default().fg(theme.main_fg),
        )),
    ];
    if !footer.is_empty() {
        lines.push(Line::from(Span::styled(
            footer.to_string(),
            Style::default().fg(theme.main_fg),
        )));
    }
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(block),
        rect,
    );
}
