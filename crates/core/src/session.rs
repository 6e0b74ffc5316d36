//! Session module - the state machine that ties the game together
//!
//! Owns the score/streak/countdown state, the live drops, the RNG and the
//! scheduler. Every mutation happens inside one of its methods, and every
//! method takes the collaborators by reference, so nothing else can touch the
//! session state between cadence steps.
//!
//! ```text
//!   Idle --start--> Running --countdown hits 0--> Finished
//!    ^                 |                             |
//!    +-----reset-------+------------reset------------+
//!                      ^                             |
//!                      +---start / play again--------+
//! ```

use tracing::{debug, trace};

use crate::collab::{Collaborators, Feedback, Hud};
use crate::config::{ConfigError, SessionConfig};
use crate::live::{FallingSlime, LiveDrops};
use crate::motion::integrate;
use crate::rng::{pick_category, SimpleRng};
use crate::scheduler::{Cadence, Scheduler, TimerQueue};
use crate::scoring::{self, HitOutcome, SessionState};
use crate::snapshot::{DropSnapshot, GameSnapshot};
use crate::spawn::plan_spawn;
use crate::types::*;

pub struct Session<S: Scheduler = TimerQueue> {
    config: SessionConfig,
    phase: SessionPhase,
    state: SessionState,
    live: LiveDrops,
    rng: SimpleRng,
    timers: S,
    /// Next object id. Monotonic across sessions.
    next_id: u32,
    /// Incremented on every start.
    session_id: u32,
    last_frame_ms: Option<u64>,
    result: Option<SessionResult>,
}

impl Session<TimerQueue> {
    /// Create a session with a validated configuration.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        Self::with_scheduler(config, TimerQueue::new())
    }

    /// Default tuning with the given RNG seed.
    pub fn with_seed(seed: u32) -> Self {
        let config = SessionConfig {
            seed,
            ..SessionConfig::default()
        };
        Self::build(config, TimerQueue::new())
    }
}

impl<S: Scheduler> Session<S> {
    pub fn with_scheduler(config: SessionConfig, timers: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, timers))
    }

    fn build(config: SessionConfig, timers: S) -> Self {
        Self {
            phase: SessionPhase::Idle,
            state: SessionState::new(config.duration_ms),
            live: LiveDrops::new(),
            rng: SimpleRng::new(config.seed),
            timers,
            next_id: 0,
            session_id: 0,
            last_frame_ms: None,
            result: None,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn running(&self) -> bool {
        self.state.running
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn streak(&self) -> u32 {
        self.state.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.state.best_streak
    }

    /// Seconds left on the countdown.
    pub fn time_remaining(&self) -> f64 {
        self.state.time_remaining()
    }

    /// Final score and best streak, once finished.
    pub fn result(&self) -> Option<SessionResult> {
        self.result
    }

    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    pub fn drops(&self) -> &LiveDrops {
        &self.live
    }

    pub fn scheduler(&self) -> &S {
        &self.timers
    }

    pub fn hud(&self) -> Hud {
        Hud {
            score: self.state.score,
            streak: self.state.streak,
            time_remaining: self.state.time_remaining(),
        }
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.phase = self.phase;
        out.session_id = self.session_id;
        out.score = self.state.score;
        out.streak = self.state.streak;
        out.best_streak = self.state.best_streak;
        out.time_remaining_ms = self.state.time_remaining_ms;
        out.duration_ms = self.config.duration_ms;
        out.play_area_width = self.config.play_area_width;
        out.play_area_height = self.config.play_area_height;
        out.drops.clear();
        out.drops.extend(self.live.iter().map(DropSnapshot::from));
        out.result = self.result;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    // ---- transitions -------------------------------------------------------

    /// Start a session from `Idle` or `Finished`. No-op while running.
    pub fn start(&mut self, collab: &mut impl Collaborators) -> bool {
        if self.phase == SessionPhase::Running {
            return false;
        }

        self.clear_session(collab);
        self.session_id = self.session_id.wrapping_add(1);
        self.state.running = true;
        self.phase = SessionPhase::Running;

        self.timers
            .schedule_repeating(Cadence::Countdown, self.config.countdown_tick_ms);
        self.timers
            .schedule_repeating(Cadence::Spawn, self.config.spawn_interval_ms);
        self.timers.schedule_frame();

        debug!(session = self.session_id, "session started");
        collab.refresh(self.hud());
        true
    }

    /// Start again from the result screen. Only valid from `Finished`.
    pub fn play_again(&mut self, collab: &mut impl Collaborators) -> bool {
        if self.phase != SessionPhase::Finished {
            return false;
        }
        self.start(collab)
    }

    /// End the running session and publish the result.
    ///
    /// Live drops stay where they are, frozen, until the next reset or start.
    pub fn finish(&mut self, collab: &mut impl Collaborators) -> bool {
        if self.phase != SessionPhase::Running {
            return false;
        }

        self.timers.cancel_all();
        self.state.running = false;
        self.phase = SessionPhase::Finished;

        let result = SessionResult {
            final_score: self.state.score,
            best_streak: self.state.best_streak,
        };
        self.result = Some(result);

        debug!(
            session = self.session_id,
            score = result.final_score,
            best_streak = result.best_streak,
            "session finished"
        );
        collab.emit_feedback(Feedback::SessionEnd(result));
        collab.refresh(self.hud());
        true
    }

    /// Return to `Idle` from any phase. Idempotent.
    pub fn reset(&mut self, collab: &mut impl Collaborators) {
        self.clear_session(collab);
        debug!(session = self.session_id, "session reset");
        collab.refresh(self.hud());
    }

    pub fn apply_action(&mut self, action: GameAction, collab: &mut impl Collaborators) -> bool {
        match action {
            GameAction::Start => self.start(collab),
            GameAction::Reset => {
                self.reset(collab);
                true
            }
            GameAction::PlayAgain => self.play_again(collab),
            GameAction::CloseOverlay => false,
        }
    }

    fn clear_session(&mut self, collab: &mut impl Collaborators) {
        self.timers.cancel_all();
        self.live.drain_each(|s| collab.remove_token(s.token));
        self.state = SessionState::new(self.config.duration_ms);
        self.phase = SessionPhase::Idle;
        self.result = None;
        self.last_frame_ms = None;
    }

    // ---- cadences ----------------------------------------------------------

    /// Run every cadence due within the next `elapsed_ms`, then one motion
    /// frame if one is pending.
    pub fn advance(&mut self, elapsed_ms: u32, collab: &mut impl Collaborators) {
        let until = self.timers.now_ms().saturating_add(elapsed_ms as u64);

        while let Some(cadence) = self.timers.next_due(until) {
            match cadence {
                Cadence::Countdown => self.countdown_tick(collab),
                Cadence::Spawn => {
                    self.spawn(collab);
                }
                Cadence::Frame => {}
            }
        }
        self.timers.advance_to(until);

        if self.timers.take_frame() {
            self.frame(collab);
        }
    }

    /// One countdown step. Finishes the session when time runs out.
    pub fn countdown_tick(&mut self, collab: &mut impl Collaborators) {
        if !self.state.running {
            return;
        }

        self.state.time_remaining_ms = self
            .state
            .time_remaining_ms
            .saturating_sub(self.config.countdown_tick_ms);
        collab.refresh(self.hud());

        if self.state.time_remaining_ms == 0 {
            self.finish(collab);
        }
    }

    /// Scheduled spawn: pick a category and drop it in.
    pub fn spawn(&mut self, collab: &mut impl Collaborators) -> Option<ObjectId> {
        if !self.can_spawn() {
            return None;
        }
        let kind = pick_category(&mut self.rng, &self.config.categories).kind;
        self.spawn_kind(kind, collab)
    }

    /// Spawn a specific category, subject to the same checks as [`Session::spawn`].
    pub fn spawn_kind(&mut self, kind: SlimeKind, collab: &mut impl Collaborators) -> Option<ObjectId> {
        if !self.can_spawn() {
            return None;
        }

        let plan = plan_spawn(&self.config, &mut self.rng, self.state.time_remaining_ms);
        self.next_id = self.next_id.wrapping_add(1);
        let id = ObjectId(self.next_id);
        let token = collab.create_token(id, kind, plan.x, plan.y, plan.footprint);

        let slime = FallingSlime {
            id,
            kind,
            x: plan.x,
            y: plan.y,
            vy: plan.vy,
            footprint: plan.footprint,
            token,
        };
        if let Err(s) = self.live.push(slime) {
            collab.remove_token(s.token);
            return None;
        }

        trace!(id = id.0, kind = kind.as_str(), x = plan.x, vy = plan.vy, "spawn");
        Some(id)
    }

    fn can_spawn(&self) -> bool {
        self.state.running && self.live.len() < self.config.max_drops
    }

    /// One motion frame at the scheduler's current time.
    ///
    /// The first frame of a session has zero elapsed time.
    pub fn frame(&mut self, collab: &mut impl Collaborators) {
        if !self.state.running {
            return;
        }

        let now = self.timers.now_ms();
        let dt_ms = self.last_frame_ms.map_or(0, |last| now.saturating_sub(last));
        self.last_frame_ms = Some(now);

        let bottom = self.config.play_area_height + self.config.miss_margin;
        let escaped = integrate(&mut self.live, dt_ms as f64 / 1000.0, bottom, collab);
        for id in escaped {
            self.resolve_miss(id, collab);
        }

        self.timers.schedule_frame();
    }

    // ---- resolution --------------------------------------------------------

    fn resolve_miss(&mut self, id: ObjectId, collab: &mut impl Collaborators) {
        let Some(slime) = self.live.remove(id) else {
            return;
        };

        let def = *self.config.category(slime.kind);
        if scoring::resolve_miss(&mut self.state, &def) {
            trace!(id = id.0, kind = slime.kind.as_str(), "miss");
            collab.emit_feedback(Feedback::Miss {
                kind: slime.kind,
                x: slime.x,
                y: slime.y,
            });
            collab.refresh(self.hud());
        }
        collab.remove_token(slime.token);
    }

    /// Tap on a specific drop at play-area point `(x, y)`.
    ///
    /// Ignored unless running and the drop is still live.
    pub fn tap(
        &mut self,
        id: ObjectId,
        x: f64,
        y: f64,
        collab: &mut impl Collaborators,
    ) -> Option<HitOutcome> {
        if !self.state.running {
            return None;
        }
        let slime = self.live.remove(id)?;

        let def = *self.config.category(slime.kind);
        let outcome = scoring::resolve_hit(&mut self.state, &def, &self.config.streak_bonus);
        trace!(
            id = id.0,
            kind = slime.kind.as_str(),
            points = outcome.points,
            score = self.state.score,
            "hit"
        );

        let kind = slime.kind;
        let points = outcome.points;
        collab.emit_feedback(match outcome.feedback {
            FeedbackKind::CriticalHit => Feedback::CriticalHit { kind, points, x, y },
            FeedbackKind::NegativeHit => Feedback::NegativeHit { kind, points, x, y },
            _ => Feedback::PositiveHit { kind, points, x, y },
        });
        collab.request_haptic(outcome.haptic_ms);
        collab.refresh(self.hud());
        collab.remove_token(slime.token);

        Some(outcome)
    }

    /// Tap at a play-area point; hits the topmost drop under it, if any.
    pub fn tap_at(&mut self, x: f64, y: f64, collab: &mut impl Collaborators) -> Option<HitOutcome> {
        if !self.state.running {
            return None;
        }
        let id = self.live.hit_test(x, y)?;
        self.tap(id, x, y, collab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{NullCollaborators, Recorder};

    fn started() -> (Session, Recorder) {
        let mut s = Session::with_seed(7);
        let mut rec = Recorder::new();
        assert!(s.start(&mut rec));
        (s, rec)
    }

    #[test]
    fn new_session_is_idle() {
        let s = Session::with_seed(1);
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(!s.running());
        assert_eq!(s.time_remaining(), 20.0);
        assert!(s.result().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = SessionConfig {
            max_drops: 0,
            ..SessionConfig::default()
        };
        assert!(Session::new(cfg).is_err());
    }

    #[test]
    fn start_arms_all_cadences() {
        let (s, _) = started();
        assert_eq!(s.phase(), SessionPhase::Running);
        assert!(s.scheduler().is_scheduled(Cadence::Countdown));
        assert!(s.scheduler().is_scheduled(Cadence::Spawn));
        assert!(s.scheduler().is_scheduled(Cadence::Frame));
        assert_eq!(s.session_id(), 1);
    }

    #[test]
    fn start_while_running_is_noop() {
        let (mut s, mut rec) = started();
        s.advance(600, &mut rec);
        let before = s.snapshot();
        assert!(!s.start(&mut rec));
        assert_eq!(s.snapshot(), before);
    }

    #[test]
    fn finish_outside_running_is_noop() {
        let mut s = Session::with_seed(1);
        let mut rec = Recorder::new();
        assert!(!s.finish(&mut rec));
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(rec.feedback_kinds().is_empty());
    }

    #[test]
    fn play_again_only_from_finished() {
        let mut s = Session::with_seed(1);
        let mut rec = Recorder::new();
        assert!(!s.play_again(&mut rec));
        s.start(&mut rec);
        assert!(!s.play_again(&mut rec));
        s.finish(&mut rec);
        assert!(s.play_again(&mut rec));
        assert_eq!(s.phase(), SessionPhase::Running);
        assert_eq!(s.session_id(), 2);
    }

    #[test]
    fn first_spawn_lands_after_one_interval() {
        let (mut s, mut rec) = started();
        s.advance(519, &mut rec);
        assert!(s.drops().is_empty());
        s.advance(1, &mut rec);
        assert_eq!(s.drops().len(), 1);
        assert_eq!(rec.created(), 1);
    }

    #[test]
    fn first_frame_has_zero_elapsed() {
        let (mut s, mut rec) = started();
        let id = s.spawn_kind(SlimeKind::Green, &mut rec).unwrap();
        let y0 = s.drops().get(id).unwrap().y;

        s.advance(50, &mut rec);
        assert_eq!(s.drops().get(id).unwrap().y, y0);

        s.advance(500, &mut rec);
        let y1 = s.drops().get(id).unwrap().y;
        assert!((y1 - (y0 + 120.0 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn tap_removes_and_scores_once() {
        let (mut s, mut rec) = started();
        let id = s.spawn_kind(SlimeKind::Yellow, &mut rec).unwrap();

        let out = s.tap(id, 50.0, 10.0, &mut rec).unwrap();
        assert_eq!(out.points, 30);
        assert_eq!(s.score(), 30);
        assert!(!s.drops().contains(id));
        assert_eq!(rec.removed(), 1);
        assert_eq!(rec.haptics(), vec![HAPTIC_POSITIVE_MS]);
        assert_eq!(rec.last_hud.score, 30);

        assert!(s.tap(id, 50.0, 10.0, &mut rec).is_none());
        assert_eq!(s.score(), 30);
        assert_eq!(rec.removed(), 1);
    }

    #[test]
    fn tap_at_uses_footprint() {
        let (mut s, mut rec) = started();
        let id = s.spawn_kind(SlimeKind::Green, &mut rec).unwrap();
        let (cx, cy) = s.drops().get(id).unwrap().center();

        assert!(s.tap_at(-500.0, -500.0, &mut rec).is_none());
        let out = s.tap_at(cx, cy, &mut rec).unwrap();
        assert_eq!(out.points, 10);
        assert!(s.drops().is_empty());
    }

    #[test]
    fn taps_ignored_after_finish() {
        let (mut s, mut rec) = started();
        let id = s.spawn_kind(SlimeKind::Green, &mut rec).unwrap();
        s.finish(&mut rec);
        assert!(s.tap(id, 0.0, 0.0, &mut rec).is_none());
        assert!(s.drops().contains(id));
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn reset_clears_drops_and_tokens() {
        let (mut s, mut rec) = started();
        s.spawn_kind(SlimeKind::Green, &mut rec);
        s.spawn_kind(SlimeKind::Blue, &mut rec);
        s.reset(&mut rec);
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(s.drops().is_empty());
        assert_eq!(rec.removed(), 2);
        assert!(!s.scheduler().is_scheduled(Cadence::Countdown));
        assert!(!s.scheduler().is_scheduled(Cadence::Frame));
    }

    #[test]
    fn idle_session_ignores_cadences() {
        let mut s = Session::with_seed(3);
        let mut n = NullCollaborators;
        s.advance(5_000, &mut n);
        s.countdown_tick(&mut n);
        assert!(s.spawn(&mut n).is_none());
        assert_eq!(s.time_remaining(), 20.0);
        assert!(s.drops().is_empty());
    }

    #[test]
    fn apply_action_routes() {
        let mut s = Session::with_seed(3);
        let mut n = NullCollaborators;
        assert!(s.apply_action(GameAction::Start, &mut n));
        assert!(!s.apply_action(GameAction::CloseOverlay, &mut n));
        assert!(s.apply_action(GameAction::Reset, &mut n));
        assert_eq!(s.phase(), SessionPhase::Idle);
    }
}
