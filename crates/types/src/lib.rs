//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the game.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, terminal rendering, the control adapter).
//!
//! # Play Area
//!
//! The play area is measured in abstract pixels. Front ends scale it to
//! whatever surface they draw on.
//!
//! - **Width**: 480 px
//! - **Height**: 800 px
//! - Drops spawn above the top edge and are lost `MISS_MARGIN_PX` below the bottom.
//!
//! # Session Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `GAME_TIME_MS` | 20000 | Session length |
//! | `COUNTDOWN_TICK_MS` | 100 | Countdown cadence |
//! | `SPAWN_MS` | 520 | Spawn cadence |
//! | `FRAME_MS` | 16 | Nominal motion frame (~60 FPS) |
//!
//! # Fall Speed
//!
//! Every drop falls at `BASE_FALL_SPEED * (1 + t * SPEED_RAMP)` px/s where
//! `t` goes from 0 at session start to 1 at the end. The multiplier is sampled
//! once, when the drop spawns.
//!
//! # Examples
//!
//! ```
//! use slime_tap_types::{SlimeKind, Polarity, DEFAULT_CATEGORIES};
//!
//! let kind = SlimeKind::from_str("Red").unwrap();
//! assert_eq!(kind, SlimeKind::Red);
//!
//! let def = DEFAULT_CATEGORIES.iter().find(|d| d.kind == kind).unwrap();
//! assert_eq!(def.delta, 50);
//! assert_eq!(def.polarity(), Polarity::Positive);
//! assert!(def.critical);
//! ```

/// Session length in milliseconds (20 s).
pub const GAME_TIME_MS: u32 = 20_000;

/// Countdown cadence in milliseconds. Each tick removes this much time.
pub const COUNTDOWN_TICK_MS: u32 = 100;

/// Spawn cadence in milliseconds.
pub const SPAWN_MS: u32 = 520;

/// Nominal motion frame interval for frame-driven front ends.
pub const FRAME_MS: u32 = 16;

/// Base fall speed in px/s.
pub const BASE_FALL_SPEED: f64 = 120.0;

/// Speed ramp factor. Drops spawned at the very end fall `1 + SPEED_RAMP` times faster.
pub const SPEED_RAMP: f64 = 2.2;

/// Maximum number of concurrently live drops.
pub const MAX_DROPS: usize = 18;

/// Hard upper bound for `MAX_DROPS` overrides (storage is fixed-capacity).
pub const MAX_DROPS_LIMIT: usize = 64;

/// Drawn size of a slime in px.
pub const VISUAL_SIZE: f64 = 110.0;

/// Hit footprint scale. The footprint is a little larger than the sprite.
pub const HIT_SCALE: f64 = 1.18;

/// Horizontal margin kept clear at both edges when spawning.
pub const SPAWN_MARGIN_PX: f64 = 8.0;

/// Maximum extra distance above the top edge at spawn.
pub const DROP_OFFSET_PX: f64 = 80.0;

/// Distance below the bottom edge at which an unhit drop counts as missed.
pub const MISS_MARGIN_PX: f64 = 80.0;

/// Default play area width in px.
pub const PLAY_AREA_WIDTH: f64 = 480.0;

/// Default play area height in px.
pub const PLAY_AREA_HEIGHT: f64 = 800.0;

/// Vibration length requested on a positive hit (ms).
pub const HAPTIC_POSITIVE_MS: u16 = 8;

/// Vibration length requested on a negative hit (ms).
pub const HAPTIC_NEGATIVE_MS: u16 = 14;

/// Footprint for the given sprite size and scale, rounded to whole pixels.
pub fn footprint_for(visual_size: f64, hit_scale: f64) -> f64 {
    (visual_size * hit_scale).round()
}

/// The five slime colors.
///
/// Green, yellow and red are worth points; blue and purple cost points.
/// Red is the rare, critical tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlimeKind {
    Green,
    Yellow,
    Red,
    Blue,
    Purple,
}

impl SlimeKind {
    pub const COUNT: usize = 5;

    pub const ALL: [SlimeKind; Self::COUNT] = [
        SlimeKind::Green,
        SlimeKind::Yellow,
        SlimeKind::Red,
        SlimeKind::Blue,
        SlimeKind::Purple,
    ];

    /// Parse a slime kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use slime_tap_types::SlimeKind;
    ///
    /// assert_eq!(SlimeKind::from_str("green"), Some(SlimeKind::Green));
    /// assert_eq!(SlimeKind::from_str("PURPLE"), Some(SlimeKind::Purple));
    /// assert_eq!(SlimeKind::from_str("orange"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "green" => Some(SlimeKind::Green),
            "yellow" => Some(SlimeKind::Yellow),
            "red" => Some(SlimeKind::Red),
            "blue" => Some(SlimeKind::Blue),
            "purple" => Some(SlimeKind::Purple),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlimeKind::Green => "green",
            SlimeKind::Yellow => "yellow",
            SlimeKind::Red => "red",
            SlimeKind::Blue => "blue",
            SlimeKind::Purple => "purple",
        }
    }
}

/// Whether catching a category is good or bad for the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// Hit: streak grows, points awarded. Missed: streak resets.
    Positive,
    /// Hit: streak resets, points deducted. Missed: nothing happens.
    Negative,
}

/// Static definition of one spawn category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryDef {
    pub kind: SlimeKind,
    /// Spawn probability. A table's probabilities should sum to 1.0.
    pub probability: f64,
    /// Signed score delta applied on hit.
    pub delta: i32,
    /// Distinguished high tier; positive hits report as critical.
    pub critical: bool,
}

impl CategoryDef {
    pub const fn new(kind: SlimeKind, probability: f64, delta: i32, critical: bool) -> Self {
        Self {
            kind,
            probability,
            delta,
            critical,
        }
    }

    pub fn polarity(&self) -> Polarity {
        if self.delta > 0 {
            Polarity::Positive
        } else {
            Polarity::Negative
        }
    }

    pub fn is_positive(&self) -> bool {
        self.polarity() == Polarity::Positive
    }
}

/// Default category table, in selection order.
pub const DEFAULT_CATEGORIES: [CategoryDef; SlimeKind::COUNT] = [
    CategoryDef::new(SlimeKind::Green, 0.40, 10, false),
    CategoryDef::new(SlimeKind::Yellow, 0.22, 30, false),
    CategoryDef::new(SlimeKind::Red, 0.12, 50, true),
    CategoryDef::new(SlimeKind::Blue, 0.16, -10, false),
    CategoryDef::new(SlimeKind::Purple, 0.10, -30, false),
];

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Running,
    Finished,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Running => "running",
            SessionPhase::Finished => "finished",
        }
    }
}

/// Kinds of feedback the core emits for sound, haptics and effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackKind {
    PositiveHit,
    CriticalHit,
    NegativeHit,
    Miss,
    SessionEnd,
}

impl FeedbackKind {
    /// Wire name (camelCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::PositiveHit => "positiveHit",
            FeedbackKind::CriticalHit => "criticalHit",
            FeedbackKind::NegativeHit => "negativeHit",
            FeedbackKind::Miss => "miss",
            FeedbackKind::SessionEnd => "sessionEnd",
        }
    }
}

/// Session-level actions a front end can request.
///
/// Taps carry coordinates and are routed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    Start,
    Reset,
    PlayAgain,
    /// Hide the result overlay without leaving the finished phase.
    CloseOverlay,
}

impl GameAction {
    /// Parse action from string (case-sensitive camelCase)
    ///
    /// # Examples
    ///
    /// ```
    /// use slime_tap_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("start"), Some(GameAction::Start));
    /// assert_eq!(GameAction::from_str("playAgain"), Some(GameAction::PlayAgain));
    /// assert_eq!(GameAction::from_str("jump"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "start" => Some(GameAction::Start),
            "reset" => Some(GameAction::Reset),
            "playAgain" => Some(GameAction::PlayAgain),
            "closeOverlay" => Some(GameAction::CloseOverlay),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::Start => "start",
            GameAction::Reset => "reset",
            GameAction::PlayAgain => "playAgain",
            GameAction::CloseOverlay => "closeOverlay",
        }
    }
}

/// Identifier of a live drop, unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId(pub u32);

/// Final result of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SessionResult {
    pub final_score: u32,
    pub best_streak: u32,
}
