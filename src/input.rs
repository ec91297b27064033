//! Key bindings: normal and vim-style.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveUp,
    MoveDown,
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Supports both normal (arrows) and vim (j/k).
/// Unrecognized keys map to `Action::None` and are silently ignored.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod && modifiers != KeyModifiers::CONTROL {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc if no_mod => Action::Quit,
        KeyCode::Char('c') if modifiers == KeyModifiers::CONTROL => Action::Quit,
        KeyCode::Char('p') if no_mod => Action::Pause,
        KeyCode::Char('r') if no_mod => Action::Restart,
        KeyCode::Up | KeyCode::Char('k') if no_mod => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') if no_mod => Action::MoveDown,
        _ => Action::None,
    }
}
