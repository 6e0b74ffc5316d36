//! Spawn geometry and the speed ramp.

use crate::config::SessionConfig;
use crate::rng::SimpleRng;

/// Fall speed multiplier for a drop spawned with `remaining_ms` left.
///
/// `t = 1 - remaining / duration` runs from 0 at start to 1 at the end;
/// the multiplier is `1 + t * ramp`.
pub fn speed_ramp_multiplier(remaining_ms: u32, duration_ms: u32, ramp: f64) -> f64 {
    if duration_ms == 0 {
        return 1.0;
    }
    let remaining = remaining_ms.min(duration_ms) as f64;
    let t = 1.0 - remaining / duration_ms as f64;
    1.0 + t * ramp
}

/// Where and how fast a new drop starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPlan {
    pub x: f64,
    pub y: f64,
    pub vy: f64,
    pub footprint: f64,
}

/// Draw the position of a new drop and fix its speed.
///
/// `x` is uniform in `[margin, width - footprint - margin]`; `y` starts one
/// footprint above the top edge plus a uniform extra offset.
pub fn plan_spawn(cfg: &SessionConfig, rng: &mut SimpleRng, remaining_ms: u32) -> SpawnPlan {
    let footprint = cfg.footprint();
    let x = rng.range_f64(
        cfg.spawn_margin,
        cfg.play_area_width - footprint - cfg.spawn_margin,
    );
    let y = -footprint - rng.range_f64(0.0, cfg.drop_offset);
    let vy = cfg.base_fall_speed
        * speed_ramp_multiplier(remaining_ms, cfg.duration_ms, cfg.speed_ramp);

    SpawnPlan { x, y, vy, footprint }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_runs_from_one_to_one_plus_factor() {
        assert_eq!(speed_ramp_multiplier(20_000, 20_000, 2.2), 1.0);
        assert!((speed_ramp_multiplier(10_000, 20_000, 2.2) - 2.1).abs() < 1e-12);
        assert!((speed_ramp_multiplier(0, 20_000, 2.2) - 3.2).abs() < 1e-12);
    }

    #[test]
    fn ramp_clamps_overfull_remaining() {
        assert_eq!(speed_ramp_multiplier(30_000, 20_000, 2.2), 1.0);
        assert_eq!(speed_ramp_multiplier(5, 0, 2.2), 1.0);
    }

    #[test]
    fn spawn_stays_inside_horizontal_bounds_and_above_top() {
        let cfg = SessionConfig::default();
        let mut rng = SimpleRng::new(42);
        for _ in 0..2_000 {
            let p = plan_spawn(&cfg, &mut rng, cfg.duration_ms);
            assert!(p.x >= cfg.spawn_margin);
            assert!(p.x <= cfg.play_area_width - p.footprint - cfg.spawn_margin);
            assert!(p.y <= -p.footprint);
            assert!(p.y >= -p.footprint - cfg.drop_offset);
            assert_eq!(p.vy, cfg.base_fall_speed);
        }
    }

    #[test]
    fn later_spawns_fall_faster() {
        let cfg = SessionConfig::default();
        let mut rng = SimpleRng::new(1);
        let early = plan_spawn(&cfg, &mut rng, 19_000);
        let late = plan_spawn(&cfg, &mut rng, 1_000);
        assert!(late.vy > early.vy);
    }
}
