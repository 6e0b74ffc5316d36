use arrayvec::ArrayVec;

use crate::live::FallingSlime;
use crate::types::{ObjectId, SessionPhase, SessionResult, SlimeKind, MAX_DROPS_LIMIT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropSnapshot {
    pub id: ObjectId,
    pub kind: SlimeKind,
    pub x: f64,
    pub y: f64,
    pub vy: f64,
    pub footprint: f64,
}

impl From<&FallingSlime> for DropSnapshot {
    fn from(value: &FallingSlime) -> Self {
        Self {
            id: value.id,
            kind: value.kind,
            x: value.x,
            y: value.y,
            vy: value.vy,
            footprint: value.footprint,
        }
    }
}

/// Everything a front end needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub phase: SessionPhase,
    pub session_id: u32,
    pub score: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub time_remaining_ms: u32,
    pub duration_ms: u32,
    pub play_area_width: f64,
    pub play_area_height: f64,
    pub drops: ArrayVec<DropSnapshot, MAX_DROPS_LIMIT>,
    pub result: Option<SessionResult>,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        self.phase = SessionPhase::Idle;
        self.session_id = 0;
        self.score = 0;
        self.streak = 0;
        self.best_streak = 0;
        self.time_remaining_ms = 0;
        self.duration_ms = 0;
        self.play_area_width = 0.0;
        self.play_area_height = 0.0;
        self.drops.clear();
        self.result = None;
    }

    pub fn time_remaining(&self) -> f64 {
        self.time_remaining_ms as f64 / 1000.0
    }

    pub fn running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    /// Cheap change detector for render throttling.
    pub fn fingerprint(&self) -> u64 {
        let mut h: u64 = 0xcbf29ce484222325;
        let mut mix = |v: u64| {
            h ^= v;
            h = h.wrapping_mul(0x100000001b3);
        };
        mix(self.phase as u64);
        mix(self.session_id as u64);
        mix(self.score as u64);
        mix(self.streak as u64);
        mix(self.time_remaining_ms as u64);
        for d in &self.drops {
            mix(d.id.0 as u64);
            mix(d.y.to_bits());
        }
        h
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            session_id: 0,
            score: 0,
            streak: 0,
            best_streak: 0,
            time_remaining_ms: 0,
            duration_ms: 0,
            play_area_width: 0.0,
            play_area_height: 0.0,
            drops: ArrayVec::new(),
            result: None,
        }
    }
}
