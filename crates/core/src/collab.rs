//! Collaborator interfaces.
//!
//! The core never draws, plays sounds or vibrates. It tells a [`Collaborators`]
//! implementation what happened and lets the front end decide how to show it.

use crate::types::{FeedbackKind, ObjectId, SessionResult, SlimeKind};

/// Handle to a visual token owned by the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TokenId(pub u32);

/// Feedback event with its payload.
///
/// Hit coordinates are the tap position; miss coordinates are the drop's
/// last position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feedback {
    PositiveHit {
        kind: SlimeKind,
        points: i32,
        x: f64,
        y: f64,
    },
    CriticalHit {
        kind: SlimeKind,
        points: i32,
        x: f64,
        y: f64,
    },
    NegativeHit {
        kind: SlimeKind,
        points: i32,
        x: f64,
        y: f64,
    },
    Miss {
        kind: SlimeKind,
        x: f64,
        y: f64,
    },
    SessionEnd(SessionResult),
}

impl Feedback {
    pub fn kind(&self) -> FeedbackKind {
        match self {
            Feedback::PositiveHit { .. } => FeedbackKind::PositiveHit,
            Feedback::CriticalHit { .. } => FeedbackKind::CriticalHit,
            Feedback::NegativeHit { .. } => FeedbackKind::NegativeHit,
            Feedback::Miss { .. } => FeedbackKind::Miss,
            Feedback::SessionEnd(_) => FeedbackKind::SessionEnd,
        }
    }

    /// Signed point change carried by hit events.
    pub fn points(&self) -> Option<i32> {
        match *self {
            Feedback::PositiveHit { points, .. }
            | Feedback::CriticalHit { points, .. }
            | Feedback::NegativeHit { points, .. } => Some(points),
            _ => None,
        }
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        match *self {
            Feedback::PositiveHit { x, y, .. }
            | Feedback::CriticalHit { x, y, .. }
            | Feedback::NegativeHit { x, y, .. }
            | Feedback::Miss { x, y, .. } => Some((x, y)),
            Feedback::SessionEnd(_) => None,
        }
    }
}

/// Externally observable counters, pushed after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hud {
    pub score: u32,
    pub streak: u32,
    pub time_remaining: f64,
}

/// Everything the session needs from the outside world.
pub trait Collaborators {
    fn create_token(
        &mut self,
        id: ObjectId,
        kind: SlimeKind,
        x: f64,
        y: f64,
        footprint: f64,
    ) -> TokenId;

    fn update_token_position(&mut self, token: TokenId, x: f64, y: f64);

    fn remove_token(&mut self, token: TokenId);

    fn emit_feedback(&mut self, feedback: Feedback);

    /// Intensity is a vibration length in milliseconds.
    fn request_haptic(&mut self, intensity_ms: u16);

    fn refresh(&mut self, _hud: Hud) {}
}

/// Discards everything. Tokens mirror object ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCollaborators;

impl Collaborators for NullCollaborators {
    fn create_token(&mut self, id: ObjectId, _: SlimeKind, _: f64, _: f64, _: f64) -> TokenId {
        TokenId(id.0)
    }

    fn update_token_position(&mut self, _: TokenId, _: f64, _: f64) {}

    fn remove_token(&mut self, _: TokenId) {}

    fn emit_feedback(&mut self, _: Feedback) {}

    fn request_haptic(&mut self, _: u16) {}
}

/// One recorded collaborator call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollabCall {
    Create {
        id: ObjectId,
        kind: SlimeKind,
        token: TokenId,
        x: f64,
        y: f64,
        footprint: f64,
    },
    Remove(TokenId),
    Feedback(Feedback),
    Haptic(u16),
}

/// Records calls for inspection.
///
/// Position updates are counted rather than stored; they arrive every frame.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub calls: Vec<CollabCall>,
    pub position_updates: u64,
    pub last_hud: Hud,
    next_token: u32,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feedback(&self) -> impl Iterator<Item = &Feedback> + '_ {
        self.calls.iter().filter_map(|c| match c {
            CollabCall::Feedback(f) => Some(f),
            _ => None,
        })
    }

    pub fn feedback_kinds(&self) -> Vec<FeedbackKind> {
        self.feedback().map(Feedback::kind).collect()
    }

    pub fn created(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, CollabCall::Create { .. }))
            .count()
    }

    pub fn removed(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, CollabCall::Remove(_)))
            .count()
    }

    pub fn haptics(&self) -> Vec<u16> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                CollabCall::Haptic(ms) => Some(*ms),
                _ => None,
            })
            .collect()
    }

    /// Drain recorded feedback, keeping other calls.
    pub fn take_feedback(&mut self) -> Vec<Feedback> {
        let mut out = Vec::new();
        self.calls.retain(|c| match c {
            CollabCall::Feedback(f) => {
                out.push(*f);
                false
            }
            _ => true,
        });
        out
    }

    pub fn clear(&mut self) {
        self.calls.clear();
        self.position_updates = 0;
    }
}

impl Collaborators for Recorder {
    fn create_token(
        &mut self,
        id: ObjectId,
        kind: SlimeKind,
        x: f64,
        y: f64,
        footprint: f64,
    ) -> TokenId {
        self.next_token = self.next_token.wrapping_add(1);
        let token = TokenId(self.next_token);
        self.calls.push(CollabCall::Create {
            id,
            kind,
            token,
            x,
            y,
            footprint,
        });
        token
    }

    fn update_token_position(&mut self, _token: TokenId, _x: f64, _y: f64) {
        self.position_updates += 1;
    }

    fn remove_token(&mut self, token: TokenId) {
        self.calls.push(CollabCall::Remove(token));
    }

    fn emit_feedback(&mut self, feedback: Feedback) {
        self.calls.push(CollabCall::Feedback(feedback));
    }

    fn request_haptic(&mut self, intensity_ms: u16) {
        self.calls.push(CollabCall::Haptic(intensity_ms));
    }

    fn refresh(&mut self, hud: Hud) {
        self.last_hud = hud;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_accessors() {
        let hit = Feedback::NegativeHit {
            kind: SlimeKind::Purple,
            points: -30,
            x: 1.0,
            y: 2.0,
        };
        assert_eq!(hit.kind(), FeedbackKind::NegativeHit);
        assert_eq!(hit.points(), Some(-30));
        assert_eq!(hit.position(), Some((1.0, 2.0)));

        let end = Feedback::SessionEnd(SessionResult::default());
        assert_eq!(end.points(), None);
        assert_eq!(end.position(), None);
    }

    #[test]
    fn recorder_take_feedback_keeps_other_calls() {
        let mut r = Recorder::new();
        let t = r.create_token(ObjectId(1), SlimeKind::Green, 0.0, 0.0, 130.0);
        r.emit_feedback(Feedback::Miss {
            kind: SlimeKind::Green,
            x: 0.0,
            y: 900.0,
        });
        r.remove_token(t);

        let fb = r.take_feedback();
        assert_eq!(fb.len(), 1);
        assert_eq!(r.created(), 1);
        assert_eq!(r.removed(), 1);
        assert!(r.feedback_kinds().is_empty());
    }

    #[test]
    fn recorder_tokens_are_unique() {
        let mut r = Recorder::new();
        let a = r.create_token(ObjectId(1), SlimeKind::Green, 0.0, 0.0, 1.0);
        let b = r.create_token(ObjectId(2), SlimeKind::Red, 0.0, 0.0, 1.0);
        assert_ne!(a, b);
    }
}
