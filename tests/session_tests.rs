use slime_tap::core::{Feedback, Recorder, Session, SessionConfig};
use slime_tap::types::{FeedbackKind, ObjectId, SessionPhase, SlimeKind};

/// Only scripted spawns, so tests control exactly what falls.
fn quiet_config() -> SessionConfig {
    SessionConfig {
        spawn_interval_ms: 1_000_000,
        ..SessionConfig::default()
    }
}

fn started(config: SessionConfig) -> (Session, Recorder) {
    let mut s = Session::new(config).expect("valid config");
    let mut rec = Recorder::new();
    assert!(s.start(&mut rec));
    (s, rec)
}

/// Drive frames until `id` leaves the live collection.
fn run_until_gone(s: &mut Session, rec: &mut Recorder, id: ObjectId) {
    for _ in 0..1_000 {
        if !s.drops().contains(id) {
            return;
        }
        s.advance(16, rec);
    }
    panic!("drop {:?} never left the play area", id);
}

#[test]
fn two_hundred_ticks_reach_exactly_zero_and_finish() {
    let (mut s, mut rec) = started(quiet_config());

    for _ in 0..199 {
        s.advance(100, &mut rec);
    }
    assert_eq!(s.phase(), SessionPhase::Running);
    assert_eq!(s.state().time_remaining_ms, 100);

    s.advance(100, &mut rec);
    assert_eq!(s.phase(), SessionPhase::Finished);
    assert_eq!(s.state().time_remaining_ms, 0);
    assert_eq!(s.time_remaining(), 0.0);
}

#[test]
fn countdown_finishes_exactly_once() {
    let (mut s, mut rec) = started(SessionConfig::default());
    s.advance(25_000, &mut rec);
    s.advance(5_000, &mut rec);

    let ends = rec
        .feedback_kinds()
        .into_iter()
        .filter(|k| *k == FeedbackKind::SessionEnd)
        .count();
    assert_eq!(ends, 1);
    assert_eq!(s.phase(), SessionPhase::Finished);
    assert_eq!(s.state().time_remaining_ms, 0);
}

#[test]
fn positive_hit_from_zero_streak() {
    let (mut s, mut rec) = started(quiet_config());
    let id = s.spawn_kind(SlimeKind::Green, &mut rec).unwrap();

    let outcome = s.tap(id, 100.0, 100.0, &mut rec).unwrap();
    assert_eq!(outcome.points, 10);
    assert_eq!(s.score(), 10);
    assert_eq!(s.streak(), 1);
    assert_eq!(s.best_streak(), 1);
    assert!(s.drops().is_empty());
}

#[test]
fn negative_hit_floors_score_at_zero() {
    let (mut s, mut rec) = started(quiet_config());
    let green = s.spawn_kind(SlimeKind::Green, &mut rec).unwrap();
    s.tap(green, 0.0, 0.0, &mut rec);
    assert_eq!(s.score(), 10);

    let purple = s.spawn_kind(SlimeKind::Purple, &mut rec).unwrap();
    let outcome = s.tap(purple, 0.0, 0.0, &mut rec).unwrap();
    assert_eq!(outcome.points, -30);
    assert_eq!(outcome.applied, -10);
    assert_eq!(s.score(), 0);
    assert_eq!(s.streak(), 0);
    assert_eq!(s.best_streak(), 1);
}

#[test]
fn critical_hit_feedback_for_red() {
    let (mut s, mut rec) = started(quiet_config());
    let red = s.spawn_kind(SlimeKind::Red, &mut rec).unwrap();
    s.tap(red, 12.0, 34.0, &mut rec);

    let fb: Vec<Feedback> = rec.take_feedback();
    assert_eq!(
        fb,
        vec![Feedback::CriticalHit {
            kind: SlimeKind::Red,
            points: 50,
            x: 12.0,
            y: 34.0,
        }]
    );
    assert_eq!(rec.haptics(), vec![8]);
}

#[test]
fn positive_miss_resets_streak_and_keeps_score() {
    let (mut s, mut rec) = started(quiet_config());
    let hit = s.spawn_kind(SlimeKind::Yellow, &mut rec).unwrap();
    let missed = s.spawn_kind(SlimeKind::Green, &mut rec).unwrap();
    s.tap(hit, 0.0, 0.0, &mut rec);
    assert_eq!((s.score(), s.streak()), (30, 1));

    run_until_gone(&mut s, &mut rec, missed);

    assert_eq!(s.score(), 30);
    assert_eq!(s.streak(), 0);
    assert_eq!(s.best_streak(), 1);
    assert!(rec.feedback_kinds().contains(&FeedbackKind::Miss));
}

#[test]
fn negative_miss_changes_nothing() {
    let (mut s, mut rec) = started(quiet_config());
    let hit = s.spawn_kind(SlimeKind::Yellow, &mut rec).unwrap();
    let blue = s.spawn_kind(SlimeKind::Blue, &mut rec).unwrap();
    s.tap(hit, 0.0, 0.0, &mut rec);

    run_until_gone(&mut s, &mut rec, blue);

    assert_eq!((s.score(), s.streak()), (30, 1));
    assert!(!rec.feedback_kinds().contains(&FeedbackKind::Miss));
    // The token still goes away.
    assert_eq!(rec.created(), rec.removed());
}

#[test]
fn tap_after_miss_is_ignored() {
    let (mut s, mut rec) = started(quiet_config());
    let id = s.spawn_kind(SlimeKind::Green, &mut rec).unwrap();
    run_until_gone(&mut s, &mut rec, id);

    assert!(s.tap(id, 0.0, 0.0, &mut rec).is_none());
    assert_eq!(s.score(), 0);
    assert_eq!(rec.removed(), 1);
}

#[test]
fn spawn_at_cap_creates_nothing() {
    let config = SessionConfig {
        max_drops: 3,
        ..quiet_config()
    };
    let (mut s, mut rec) = started(config);
    for _ in 0..3 {
        assert!(s.spawn_kind(SlimeKind::Green, &mut rec).is_some());
    }
    assert_eq!(rec.created(), 3);

    assert!(s.spawn_kind(SlimeKind::Green, &mut rec).is_none());
    assert!(s.spawn(&mut rec).is_none());
    assert_eq!(s.drops().len(), 3);
    assert_eq!(rec.created(), 3);
}

#[test]
fn scheduled_spawns_stop_at_cap() {
    let config = SessionConfig {
        spawn_interval_ms: 10,
        base_fall_speed: 0.0,
        ..SessionConfig::default()
    };
    let (mut s, mut rec) = started(config);
    for _ in 0..100 {
        s.advance(16, &mut rec);
        assert!(s.drops().len() <= 18);
    }
    assert_eq!(s.drops().len(), 18);
    assert_eq!(rec.created(), 18);
}

#[test]
fn later_spawns_fall_faster() {
    let (mut s, mut rec) = started(quiet_config());
    let early = s.spawn_kind(SlimeKind::Green, &mut rec).unwrap();
    let vy_early = s.drops().get(early).map(|d| d.vy).unwrap();
    for _ in 0..100 {
        s.advance(100, &mut rec);
    }
    let late = s.spawn_kind(SlimeKind::Green, &mut rec).unwrap();
    let vy_late = s.drops().get(late).map(|d| d.vy).unwrap();

    assert_eq!(vy_early, 120.0);
    // Half way through: 1 + 0.5 * 2.2.
    assert!((vy_late - 120.0 * 2.1).abs() < 1e-9);
}

#[test]
fn finish_exposes_result_and_freezes_drops() {
    let (mut s, mut rec) = started(quiet_config());
    let id = s.spawn_kind(SlimeKind::Yellow, &mut rec).unwrap();
    let keep = s.spawn_kind(SlimeKind::Green, &mut rec).unwrap();
    s.tap(id, 0.0, 0.0, &mut rec);

    s.advance(20_000, &mut rec);
    let result = s.result().unwrap();
    assert_eq!(result.final_score, 30);
    assert_eq!(result.best_streak, 1);

    let y = s.drops().get(keep).map(|d| d.y);
    s.advance(1_000, &mut rec);
    assert_eq!(s.drops().get(keep).map(|d| d.y), y);
    assert!(s.tap(keep, 0.0, 0.0, &mut rec).is_none());
}

#[test]
fn reset_twice_equals_reset_once() {
    let (mut s, mut rec) = started(SessionConfig::default());
    s.advance(3_000, &mut rec);

    s.reset(&mut rec);
    let once = s.snapshot();
    s.reset(&mut rec);
    let twice = s.snapshot();

    assert_eq!(once, twice);
    assert_eq!(twice.phase, SessionPhase::Idle);
    assert_eq!(twice.score, 0);
    assert_eq!(twice.time_remaining_ms, 20_000);
    assert!(twice.drops.is_empty());
    assert_eq!(rec.created(), rec.removed());
}

#[test]
fn play_again_starts_fresh_session() {
    let (mut s, mut rec) = started(quiet_config());
    let id = s.spawn_kind(SlimeKind::Red, &mut rec).unwrap();
    s.tap(id, 0.0, 0.0, &mut rec);
    s.advance(20_000, &mut rec);
    assert_eq!(s.phase(), SessionPhase::Finished);

    assert!(s.play_again(&mut rec));
    assert_eq!(s.phase(), SessionPhase::Running);
    assert_eq!(s.session_id(), 2);
    assert_eq!((s.score(), s.streak(), s.best_streak()), (0, 0, 0));
    assert_eq!(s.state().time_remaining_ms, 20_000);
    assert!(s.result().is_none());
}

#[test]
fn same_seed_same_session() {
    let run = || {
        let (mut s, mut rec) = started(SessionConfig {
            seed: 42,
            ..SessionConfig::default()
        });
        for _ in 0..200 {
            s.advance(16, &mut rec);
        }
        s.snapshot()
    };
    assert_eq!(run(), run());
}
