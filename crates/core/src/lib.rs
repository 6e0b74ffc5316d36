//! Core game logic module - pure, deterministic, and testable
//!
//! This crate holds every game rule for the slime-tap session. It has **no
//! dependencies** on a terminal, a network or a wall clock:
//!
//! - **Deterministic**: the same seed and the same driver steps replay the same session
//! - **Testable**: cadences run on a simulated clock, collaborators can be recorded
//! - **Portable**: the terminal front end and the remote adapter both drive it
//!
//! # Module Structure
//!
//! - [`rng`]: seeded generator and the weighted category selector
//! - [`config`]: tuning values, env overrides and validation
//! - [`scheduler`]: countdown, spawn and frame cadences on a caller-driven clock
//! - [`live`]: the collection of drops currently falling
//! - [`spawn`]: spawn geometry and the speed ramp
//! - [`motion`]: per-frame integration and escape detection
//! - [`scoring`]: hit and miss resolution
//! - [`collab`]: the outward-facing collaborator seam
//! - [`session`]: the state machine that ties them together
//!
//! # Rules
//!
//! - A session lasts 20 seconds, counted down in 100 ms ticks
//! - A new slime drops every 520 ms, up to 18 on screen
//! - Fall speed ramps from 1x to 3.2x as time runs out
//! - Tapping a positive slime scores and extends the streak
//! - Tapping a negative slime costs points (never below zero) and breaks the streak
//! - Letting a positive slime fall out breaks the streak; negative ones fall harmlessly
//!
//! # Example
//!
//! ```
//! use slime_tap_core::{NullCollaborators, Session};
//! use slime_tap_core::types::{SessionPhase, SlimeKind};
//!
//! let mut session = Session::with_seed(12345);
//! let mut collab = NullCollaborators;
//! session.start(&mut collab);
//!
//! let id = session.spawn_kind(SlimeKind::Yellow, &mut collab).unwrap();
//! session.tap(id, 0.0, 0.0, &mut collab);
//! assert_eq!(session.score(), 30);
//!
//! // Run out the clock.
//! session.advance(20_000, &mut collab);
//! assert_eq!(session.phase(), SessionPhase::Finished);
//! assert_eq!(session.result().unwrap().final_score, 30);
//! ```

pub mod collab;
pub mod config;
pub mod live;
pub mod motion;
pub mod rng;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod spawn;

pub use slime_tap_types as types;

pub use collab::{CollabCall, Collaborators, Feedback, Hud, NullCollaborators, Recorder, TokenId};
pub use config::{ConfigError, SessionConfig, StreakBonus};
pub use live::{FallingSlime, LiveDrops};
pub use rng::{pick_category, select_category, SimpleRng};
pub use scheduler::{Cadence, Scheduler, TimerQueue};
pub use scoring::{HitOutcome, SessionState};
pub use session::Session;
pub use snapshot::{DropSnapshot, GameSnapshot};
pub use spawn::{plan_spawn, speed_ramp_multiplier, SpawnPlan};
