//! Terminal "game renderer" module.
//!
//! A small, game-oriented rendering layer for terminal play. It avoids widget
//! toolkits and renders into a plain framebuffer that is diffed and flushed to
//! the terminal.
//!
//! - [`layout`] maps between terminal cells and play-area pixels
//! - [`game_view`] draws a `GameSnapshot`, the HUD and the result overlay
//! - [`effects`] is the session collaborator that animates feedback
//! - [`renderer`] writes frames to the terminal
//! - [`render_throttle`] skips redraws of a static screen

pub mod effects;
pub mod fb;
pub mod game_view;
pub mod layout;
pub mod render_throttle;
pub mod renderer;

pub use slime_tap_core as core;
pub use slime_tap_types as types;

pub use effects::{Burst, EffectLayer, Flash, Popup};
pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{slime_color, AdapterStatusView, GameView};
pub use layout::{Layout, Viewport, CELL_ASPECT, PANEL_COLS};
pub use render_throttle::RenderThrottle;
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
