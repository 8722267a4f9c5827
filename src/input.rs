//! Key bindings: arrows plus vim-style letters.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    RotateCw,
    RotateCcw,
    /// Let time pass immediately instead of waiting for the timer.
    Tick,
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Ctrl-C always quits; other modified keys are ignored.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('r') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k' | 'x') => Action::RotateCw,
        KeyCode::Char('z' | 'u') => Action::RotateCcw,
        KeyCode::Down | KeyCode::Char('j') => Action::Tick,
        _ => Action::None,
    }
}
