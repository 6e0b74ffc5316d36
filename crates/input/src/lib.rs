//! Terminal input module.
//!
//! Maps `crossterm` key events into [`crate::types::GameAction`] and left mouse
//! presses into [`TapCell`]s. Converting a cell into play-area coordinates is
//! the renderer's job, since only it knows the layout.

pub mod map;

pub use slime_tap_types as types;

pub use map::{handle_key_event, handle_mouse_event, should_quit, TapCell};
