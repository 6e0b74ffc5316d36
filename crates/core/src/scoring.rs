//! Scoring module - hit and miss resolution rules
//!
//! Pure state transitions on [`SessionState`]; the session applies the side
//! effects (token removal, feedback, haptics) around them.
//!
//! - Positive hit: streak +1, best streak updated, `delta + bonus` added.
//! - Negative hit: streak reset, `delta` applied with a floor of zero.
//! - Positive miss: streak reset, score untouched.
//! - Negative miss: nothing.

use crate::config::StreakBonus;
use crate::types::*;

/// Score, streak and countdown for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub running: bool,
    pub score: u32,
    pub streak: u32,
    pub best_streak: u32,
    /// Countdown in whole milliseconds, so fixed ticks land exactly on zero.
    pub time_remaining_ms: u32,
}

impl SessionState {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            running: false,
            score: 0,
            streak: 0,
            best_streak: 0,
            time_remaining_ms: duration_ms,
        }
    }

    pub fn time_remaining(&self) -> f64 {
        self.time_remaining_ms as f64 / 1000.0
    }
}

/// Result of resolving one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOutcome {
    /// Signed points the hit was worth (before the zero floor).
    pub points: i32,
    /// Change actually applied to the score.
    pub applied: i32,
    pub feedback: FeedbackKind,
    pub haptic_ms: u16,
}

/// Apply a signed delta with the zero floor.
pub fn apply_delta(score: u32, delta: i32) -> u32 {
    let next = score as i64 + delta as i64;
    next.clamp(0, u32::MAX as i64) as u32
}

pub fn resolve_hit(state: &mut SessionState, def: &CategoryDef, bonus: &StreakBonus) -> HitOutcome {
    let before = state.score;
    match def.polarity() {
        Polarity::Positive => {
            state.streak = state.streak.saturating_add(1);
            state.best_streak = state.best_streak.max(state.streak);
            let extra = bonus.bonus_for(state.streak).min(i32::MAX as u32) as i32;
            let points = def.delta.saturating_add(extra);
            state.score = apply_delta(state.score, points);
            HitOutcome {
                points,
                applied: (state.score as i64 - before as i64) as i32,
                feedback: if def.critical {
                    FeedbackKind::CriticalHit
                } else {
                    FeedbackKind::PositiveHit
                },
                haptic_ms: HAPTIC_POSITIVE_MS,
            }
        }
        Polarity::Negative => {
            state.streak = 0;
            state.score = apply_delta(state.score, def.delta);
            HitOutcome {
                points: def.delta,
                applied: (state.score as i64 - before as i64) as i32,
                feedback: FeedbackKind::NegativeHit,
                haptic_ms: HAPTIC_NEGATIVE_MS,
            }
        }
    }
}

/// Apply the consequence of a drop leaving the play area unhit.
///
/// Returns true when the miss counts (positive categories only).
pub fn resolve_miss(state: &mut SessionState, def: &CategoryDef) -> bool {
    match def.polarity() {
        Polarity::Positive => {
            state.streak = 0;
            true
        }
        Polarity::Negative => false,
    }
}
