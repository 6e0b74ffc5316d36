//! Slime Tap (workspace facade crate).
//!
//! Re-exports the workspace crates under one roof so the binary, the
//! integration tests and the benches can use `slime_tap::{core,adapter,term,input,types}`.

pub use slime_tap_adapter as adapter;
pub use slime_tap_core as core;
pub use slime_tap_input as input;
pub use slime_tap_term as term;
pub use slime_tap_types as types;
