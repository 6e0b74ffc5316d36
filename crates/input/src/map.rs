//! Mapping from terminal events to game actions and taps.

use crate::types::GameAction;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// A tap at a terminal cell. The front end converts it to play-area pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapCell {
    pub column: u16,
    pub row: u16,
}

/// Map keyboard input to game actions.
pub fn handle_key_event(key: KeyEvent) -> Option<GameAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }

    match key.code {
        KeyCode::Enter | KeyCode::Char('s') | KeyCode::Char('S') => Some(GameAction::Start),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(GameAction::Reset),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(GameAction::PlayAgain),
        KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('C') => Some(GameAction::CloseOverlay),
        _ => None,
    }
}

/// Map a mouse event to a tap. Only the left button press counts.
pub fn handle_mouse_event(mouse: MouseEvent) -> Option<TapCell> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(TapCell {
            column: mouse.column,
            row: mouse.row,
        }),
        _ => None,
    }
}

/// Check if key should quit the game.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}
