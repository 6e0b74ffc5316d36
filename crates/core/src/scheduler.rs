//! Scheduler module - cadences on a caller-driven clock
//!
//! The session runs three cadences: the countdown and the spawner repeat on
//! fixed intervals, the motion integrator runs once per rendered frame. None of
//! them read the wall clock. A driver advances time explicitly, so a test can
//! replay a whole 20 second session in microseconds.
//!
//! Repeating timers follow interval semantics: scheduled at `t`, a timer with
//! interval `i` first fires at `t + i`, then every `i` after that. Timers due
//! at the same instant fire in declared [`Cadence`] order.

/// The session's independent cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cadence {
    Countdown,
    Spawn,
    Frame,
}

/// Scheduling surface used by the session.
pub trait Scheduler {
    /// Current simulated time.
    fn now_ms(&self) -> u64;

    /// Start (or restart) a repeating timer. `Cadence::Frame` is not repeating;
    /// use [`Scheduler::schedule_frame`].
    fn schedule_repeating(&mut self, cadence: Cadence, interval_ms: u32);

    /// Request one frame callback.
    fn schedule_frame(&mut self);

    /// Stop every timer and drop any pending frame request.
    fn cancel_all(&mut self);

    fn is_scheduled(&self, cadence: Cadence) -> bool;

    /// Pop the earliest repeating timer due at or before `until_ms`.
    ///
    /// Moves the clock to the timer's due time and re-arms it.
    fn next_due(&mut self, until_ms: u64) -> Option<Cadence>;

    /// Consume a pending frame request.
    fn take_frame(&mut self) -> bool;

    /// Move the clock forward. Never moves backwards.
    fn advance_to(&mut self, now_ms: u64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Repeating {
    interval_ms: u32,
    next_due_ms: u64,
}

/// Simulated-clock scheduler.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    now_ms: u64,
    countdown: Option<Repeating>,
    spawn: Option<Repeating>,
    frame_pending: bool,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, cadence: Cadence) -> Option<&Repeating> {
        match cadence {
            Cadence::Countdown => self.countdown.as_ref(),
            Cadence::Spawn => self.spawn.as_ref(),
            Cadence::Frame => None,
        }
    }

    fn slot_mut(&mut self, cadence: Cadence) -> Option<&mut Option<Repeating>> {
        match cadence {
            Cadence::Countdown => Some(&mut self.countdown),
            Cadence::Spawn => Some(&mut self.spawn),
            Cadence::Frame => None,
        }
    }

    /// Time of the next repeating timer, if any is armed.
    pub fn next_deadline(&self) -> Option<u64> {
        [self.countdown, self.spawn]
            .iter()
            .flatten()
            .map(|r| r.next_due_ms)
            .min()
    }
}

impl Scheduler for TimerQueue {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn schedule_repeating(&mut self, cadence: Cadence, interval_ms: u32) {
        let now = self.now_ms;
        if let Some(slot) = self.slot_mut(cadence) {
            let interval_ms = interval_ms.max(1);
            *slot = Some(Repeating {
                interval_ms,
                next_due_ms: now + interval_ms as u64,
            });
        } else {
            self.frame_pending = true;
        }
    }

    fn schedule_frame(&mut self) {
        self.frame_pending = true;
    }

    fn cancel_all(&mut self) {
        self.countdown = None;
        self.spawn = None;
        self.frame_pending = false;
    }

    fn is_scheduled(&self, cadence: Cadence) -> bool {
        match cadence {
            Cadence::Frame => self.frame_pending,
            c => self.slot(c).is_some(),
        }
    }

    fn next_due(&mut self, until_ms: u64) -> Option<Cadence> {
        let mut best: Option<(u64, Cadence)> = None;
        for cadence in [Cadence::Countdown, Cadence::Spawn] {
            if let Some(r) = self.slot(cadence) {
                if r.next_due_ms <= until_ms && best.map_or(true, |(t, _)| r.next_due_ms < t) {
                    best = Some((r.next_due_ms, cadence));
                }
            }
        }

        let (due, cadence) = best?;
        self.now_ms = self.now_ms.max(due);
        if let Some(Some(r)) = self.slot_mut(cadence) {
            r.next_due_ms = due + r.interval_ms as u64;
        }
        Some(cadence)
    }

    fn take_frame(&mut self) -> bool {
        std::mem::take(&mut self.frame_pending)
    }

    fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}
