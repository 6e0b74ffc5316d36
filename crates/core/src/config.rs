//! Session configuration.
//!
//! Defaults reproduce the shipped game. `from_env` applies overrides for quick
//! tuning without a rebuild.

use thiserror::Error;
use tracing::warn;

use crate::types::*;

/// Optional bonus on positive hits that scales with the streak.
///
/// A hit that brings the streak to `s` earns `min(cap, (s / step) * points)`
/// extra points. `step == 0` disables the bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakBonus {
    pub step: u32,
    pub points: u32,
    pub cap: u32,
}

impl StreakBonus {
    pub fn bonus_for(&self, streak: u32) -> u32 {
        if self.step == 0 {
            return 0;
        }
        (streak / self.step).saturating_mul(self.points).min(self.cap)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("session duration must be positive")]
    ZeroDuration,
    #[error("{0} interval must be positive")]
    ZeroInterval(&'static str),
    #[error("play area {width}x{height} cannot fit a {footprint}px drop")]
    PlayAreaTooSmall {
        width: f64,
        height: f64,
        footprint: f64,
    },
    #[error("max drops must be between 1 and {limit}, got {got}")]
    MaxDrops { got: usize, limit: usize },
    #[error("{0} must be a finite, non-negative number")]
    InvalidNumber(&'static str),
    #[error("category {0} has a negative spawn probability")]
    NegativeProbability(&'static str),
}

/// Tunables for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub duration_ms: u32,
    pub countdown_tick_ms: u32,
    pub spawn_interval_ms: u32,
    pub base_fall_speed: f64,
    pub speed_ramp: f64,
    pub max_drops: usize,
    pub visual_size: f64,
    pub hit_scale: f64,
    pub spawn_margin: f64,
    pub drop_offset: f64,
    pub miss_margin: f64,
    pub play_area_width: f64,
    pub play_area_height: f64,
    pub categories: [CategoryDef; SlimeKind::COUNT],
    pub streak_bonus: StreakBonus,
    pub seed: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_ms: GAME_TIME_MS,
            countdown_tick_ms: COUNTDOWN_TICK_MS,
            spawn_interval_ms: SPAWN_MS,
            base_fall_speed: BASE_FALL_SPEED,
            speed_ramp: SPEED_RAMP,
            max_drops: MAX_DROPS,
            visual_size: VISUAL_SIZE,
            hit_scale: HIT_SCALE,
            spawn_margin: SPAWN_MARGIN_PX,
            drop_offset: DROP_OFFSET_PX,
            miss_margin: MISS_MARGIN_PX,
            play_area_width: PLAY_AREA_WIDTH,
            play_area_height: PLAY_AREA_HEIGHT,
            categories: DEFAULT_CATEGORIES,
            streak_bonus: StreakBonus::default(),
            seed: 1,
        }
    }
}

impl SessionConfig {
    /// Defaults with environment overrides, validated.
    ///
    /// - `SLIME_DURATION_SECS`: session length in seconds
    /// - `SLIME_SPAWN_MS`: spawn cadence
    /// - `SLIME_MAX_DROPS`: concurrency cap
    /// - `SLIME_SPEED_RAMP`: ramp factor
    /// - `SLIME_SEED`: RNG seed
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        use std::env;

        let mut cfg = Self::default();

        if let Some(secs) = env::var("SLIME_DURATION_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
        {
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::InvalidNumber("SLIME_DURATION_SECS"));
            }
            cfg.duration_ms = (secs * 1000.0).round() as u32;
        }
        if let Some(ms) = env::var("SLIME_SPAWN_MS").ok().and_then(|s| s.trim().parse().ok()) {
            cfg.spawn_interval_ms = ms;
        }
        if let Some(n) = env::var("SLIME_MAX_DROPS").ok().and_then(|s| s.trim().parse().ok()) {
            cfg.max_drops = n;
        }
        if let Some(r) = env::var("SLIME_SPEED_RAMP").ok().and_then(|s| s.trim().parse().ok()) {
            cfg.speed_ramp = r;
        }
        if let Some(seed) = env::var("SLIME_SEED").ok().and_then(|s| s.trim().parse().ok()) {
            cfg.seed = seed;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Hit footprint in px.
    pub fn footprint(&self) -> f64 {
        footprint_for(self.visual_size, self.hit_scale)
    }

    /// Session length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }

    pub fn category(&self, kind: SlimeKind) -> &CategoryDef {
        self.categories
            .iter()
            .find(|d| d.kind == kind)
            .unwrap_or(&self.categories[self.categories.len() - 1])
    }

    /// Reject configurations the session cannot run with.
    ///
    /// A probability table that does not sum to 1.0 is accepted with a warning;
    /// selection then falls back to the last category.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_ms == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.countdown_tick_ms == 0 {
            return Err(ConfigError::ZeroInterval("countdown"));
        }
        if self.spawn_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("spawn"));
        }
        if self.max_drops == 0 || self.max_drops > MAX_DROPS_LIMIT {
            return Err(ConfigError::MaxDrops {
                got: self.max_drops,
                limit: MAX_DROPS_LIMIT,
            });
        }

        for (name, v) in [
            ("base_fall_speed", self.base_fall_speed),
            ("speed_ramp", self.speed_ramp),
            ("visual_size", self.visual_size),
            ("hit_scale", self.hit_scale),
            ("spawn_margin", self.spawn_margin),
            ("drop_offset", self.drop_offset),
            ("miss_margin", self.miss_margin),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::InvalidNumber(name));
            }
        }

        let footprint = self.footprint();
        if !(self.play_area_width.is_finite() && self.play_area_height.is_finite())
            || self.play_area_width < footprint + 2.0 * self.spawn_margin
            || self.play_area_height <= 0.0
        {
            return Err(ConfigError::PlayAreaTooSmall {
                width: self.play_area_width,
                height: self.play_area_height,
                footprint,
            });
        }

        for def in &self.categories {
            if !(def.probability >= 0.0) {
                return Err(ConfigError::NegativeProbability(def.kind.as_str()));
            }
        }
        let sum: f64 = self.categories.iter().map(|d| d.probability).sum();
        if (sum - 1.0).abs() > 1e-6 {
            warn!(sum, "spawn probabilities do not sum to 1.0");
        }

        Ok(())
    }
}
