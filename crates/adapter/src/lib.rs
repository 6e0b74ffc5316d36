//! Adapter module - remote control via TCP socket with a JSON protocol
//!
//! Lets an external agent (a bot, a test harness, a second screen) drive and
//! watch a session. The game loop stays synchronous and owns the session; the
//! server runs on its own tokio runtime and talks to the loop over channels.
//!
//! # Protocol Overview
//!
//! **Line-delimited JSON** over TCP (default `127.0.0.1:7878`):
//!
//! 1. **Handshake**: the client sends `hello`, the server answers `welcome`
//! 2. **Controller**: the first client to say hello controls the session
//! 3. **Commanding**: the controller sends `command`s (`start`, `reset`,
//!    `playAgain`, `tap`); each is acked once the game loop has applied it
//! 4. **Streaming**: clients receive `observation` snapshots and `feedback`
//!    events (hits, misses, session end)
//!
//! `control` messages claim or release the controller role. Every client
//! message must carry a strictly increasing `seq`.
//!
//! # Environment
//!
//! - `SLIME_AI_HOST` (default `127.0.0.1`)
//! - `SLIME_AI_PORT` (default `7878`)
//! - `SLIME_AI_MAX_PENDING` (default `16`): bounded command queue; overflow is
//!   answered with a `backpressure` error
//! - `SLIME_AI_DISABLED`: `1` or `true` turns the adapter off

pub mod protocol;
pub mod runtime;
pub mod server;

pub use slime_tap_core as core;
pub use slime_tap_types as types;

pub use runtime::{
    apply_inbound, Adapter, ClientCommand, FeedbackTap, InboundCommand, InboundPayload,
    ObservationPacer, OutboundMessage, SharedStatus, StatusSnapshot,
};
pub use server::{is_disabled, run_server, serve, ServerConfig};
