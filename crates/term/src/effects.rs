//! EffectLayer: the terminal's collaborator for the session.
//!
//! Turns feedback into short-lived visuals (score popups, burst glyphs, a
//! border flash standing in for vibration) and holds the result overlay.
//! Drops themselves are drawn straight from the snapshot, so tokens here only
//! track how many are alive.
//!
//! Effects age against a wall clock the runner feeds through [`EffectLayer::tick`].

use crate::core::{Collaborators, Feedback, TokenId};
use crate::types::{ObjectId, SessionResult, SlimeKind, HAPTIC_NEGATIVE_MS};

pub const POPUP_MS: u64 = 700;
pub const BURST_MS: u64 = 320;
/// A terminal cannot vibrate; flash the border this many ms per haptic ms.
pub const FLASH_MS_PER_HAPTIC_MS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Popup {
    pub points: i32,
    pub critical: bool,
    pub x: f64,
    pub y: f64,
    pub born_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub kind: SlimeKind,
    pub x: f64,
    pub y: f64,
    pub miss: bool,
    pub born_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flash {
    pub negative: bool,
    pub until_ms: u64,
}

#[derive(Debug, Default)]
pub struct EffectLayer {
    now_ms: u64,
    popups: Vec<Popup>,
    bursts: Vec<Burst>,
    flash: Option<Flash>,
    overlay: Option<SessionResult>,
    live_tokens: u32,
}

impl EffectLayer {
    pub fn new() -> Self {
        Self {
            popups: Vec::with_capacity(32),
            bursts: Vec::with_capacity(32),
            ..Self::default()
        }
    }

    /// Advance the effect clock and drop anything expired.
    pub fn tick(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;
        self.popups.retain(|p| now.saturating_sub(p.born_ms) < POPUP_MS);
        self.bursts.retain(|b| now.saturating_sub(b.born_ms) < BURST_MS);
        if self.flash.is_some_and(|f| now >= f.until_ms) {
            self.flash = None;
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn popups(&self) -> &[Popup] {
        &self.popups
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    pub fn flash(&self) -> Option<Flash> {
        self.flash
    }

    /// Result shown over the play area until closed.
    pub fn overlay(&self) -> Option<SessionResult> {
        self.overlay
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn live_tokens(&self) -> u32 {
        self.live_tokens
    }

    /// True while something is still animating.
    pub fn is_animating(&self) -> bool {
        !self.popups.is_empty() || !self.bursts.is_empty() || self.flash.is_some()
    }

    /// Forget every transient effect. The overlay goes too.
    pub fn clear(&mut self) {
        self.popups.clear();
        self.bursts.clear();
        self.flash = None;
        self.overlay = None;
    }

    /// Fraction of a lifetime elapsed, in `0.0..=1.0`.
    pub fn age(&self, born_ms: u64, lifetime_ms: u64) -> f64 {
        let age = self.now_ms.saturating_sub(born_ms) as f64;
        (age / lifetime_ms as f64).clamp(0.0, 1.0)
    }

    fn push_hit(&mut self, kind: SlimeKind, points: i32, critical: bool, x: f64, y: f64) {
        let born_ms = self.now_ms;
        self.popups.push(Popup {
            points,
            critical,
            x,
            y,
            born_ms,
        });
        self.bursts.push(Burst {
            kind,
            x,
            y,
            miss: false,
            born_ms,
        });
    }
}

impl Collaborators for EffectLayer {
    fn create_token(&mut self, id: ObjectId, _kind: SlimeKind, _x: f64, _y: f64, _fp: f64) -> TokenId {
        self.live_tokens = self.live_tokens.saturating_add(1);
        TokenId(id.0)
    }

    fn update_token_position(&mut self, _token: TokenId, _x: f64, _y: f64) {}

    fn remove_token(&mut self, _token: TokenId) {
        self.live_tokens = self.live_tokens.saturating_sub(1);
    }

    fn emit_feedback(&mut self, feedback: Feedback) {
        match feedback {
            Feedback::PositiveHit { kind, points, x, y } | Feedback::NegativeHit { kind, points, x, y } => {
                self.push_hit(kind, points, false, x, y);
            }
            Feedback::CriticalHit { kind, points, x, y } => {
                self.push_hit(kind, points, true, x, y);
            }
            Feedback::Miss { kind, x, y } => self.bursts.push(Burst {
                kind,
                x,
                y,
                miss: true,
                born_ms: self.now_ms,
            }),
            Feedback::SessionEnd(result) => self.overlay = Some(result),
        }
    }

    fn request_haptic(&mut self, intensity_ms: u16) {
        self.flash = Some(Flash {
            negative: intensity_ms >= HAPTIC_NEGATIVE_MS,
            until_ms: self.now_ms + intensity_ms as u64 * FLASH_MS_PER_HAPTIC_MS,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Session;
    use crate::types::HAPTIC_POSITIVE_MS;

    #[test]
    fn hit_spawns_popup_burst_and_flash() {
        let mut fx = EffectLayer::new();
        fx.tick(1_000);
        fx.emit_feedback(Feedback::CriticalHit {
            kind: SlimeKind::Red,
            points: 50,
            x: 100.0,
            y: 200.0,
        });
        fx.request_haptic(HAPTIC_POSITIVE_MS);

        assert_eq!(fx.popups().len(), 1);
        assert!(fx.popups()[0].critical);
        assert_eq!(fx.bursts().len(), 1);
        assert_eq!(
            fx.flash(),
            Some(Flash {
                negative: false,
                until_ms: 1_000 + 8 * FLASH_MS_PER_HAPTIC_MS
            })
        );
        assert!(fx.is_animating());
    }

    #[test]
    fn effects_decay_with_time() {
        let mut fx = EffectLayer::new();
        fx.emit_feedback(Feedback::NegativeHit {
            kind: SlimeKind::Purple,
            points: -30,
            x: 0.0,
            y: 0.0,
        });
        fx.request_haptic(HAPTIC_NEGATIVE_MS);
        assert!(fx.flash().unwrap().negative);

        fx.tick(BURST_MS);
        assert!(fx.bursts().is_empty());
        assert_eq!(fx.popups().len(), 1);

        fx.tick(POPUP_MS);
        assert!(!fx.is_animating());
    }

    #[test]
    fn session_end_opens_overlay_until_closed() {
        let mut fx = EffectLayer::new();
        fx.emit_feedback(Feedback::SessionEnd(SessionResult {
            final_score: 120,
            best_streak: 6,
        }));
        assert_eq!(fx.overlay().unwrap().final_score, 120);
        fx.close_overlay();
        assert!(fx.overlay().is_none());
    }

    #[test]
    fn tokens_balance_across_a_session() {
        let mut session = Session::with_seed(5);
        let mut fx = EffectLayer::new();
        session.start(&mut fx);
        session.advance(3_000, &mut fx);
        assert_eq!(fx.live_tokens() as usize, session.drops().len());
        session.reset(&mut fx);
        assert_eq!(fx.live_tokens(), 0);
    }
}
