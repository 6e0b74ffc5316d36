//! RNG module - seeded randomness and weighted category selection
//!
//! The session draws every random number from one [`SimpleRng`], so a seed
//! fully determines spawn kinds, positions and offsets.
//!
//! [`select_category`] is the weighted selector: one uniform draw in `[0, 1)`,
//! probabilities accumulated in declared order, first cumulative value at or
//! above the draw wins. If float drift leaves the draw above every cumulative
//! value, the last category is returned.

use crate::types::CategoryDef;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }

    /// Uniform value in `[min, max)`. Returns `min` when the range is empty.
    pub fn range_f64(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + self.next_f64() * (max - min)
    }

    /// Current internal state (reseeding with it continues the same sequence).
    pub fn state(&self) -> u32 {
        self.state
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Pick the category for a uniform `draw` in `[0, 1)`.
///
/// # Panics
///
/// Panics if `table` is empty.
pub fn select_category(table: &[CategoryDef], draw: f64) -> &CategoryDef {
    let mut acc = 0.0;
    for def in table {
        acc += def.probability;
        if draw <= acc {
            return def;
        }
    }
    &table[table.len() - 1]
}

/// Draw once from `rng` and select a category.
pub fn pick_category<'a>(rng: &mut SimpleRng, table: &'a [CategoryDef]) -> &'a CategoryDef {
    let draw = rng.next_f64();
    select_category(table, draw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SlimeKind, DEFAULT_CATEGORIES};

    #[test]
    fn test_rng_deterministic() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(12345);

        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_zero_seed_is_remapped() {
        let mut a = SimpleRng::new(0);
        let mut b = SimpleRng::new(1);
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn test_next_f64_in_unit_interval() {
        let mut rng = SimpleRng::new(7);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_range_f64_bounds_and_empty_range() {
        let mut rng = SimpleRng::new(99);
        for _ in 0..1_000 {
            let v = rng.range_f64(8.0, 342.0);
            assert!((8.0..342.0).contains(&v));
        }
        assert_eq!(rng.range_f64(5.0, 5.0), 5.0);
        assert_eq!(rng.range_f64(5.0, 1.0), 5.0);
    }

    #[test]
    fn test_select_boundaries_follow_declared_order() {
        let t = &DEFAULT_CATEGORIES;
        assert_eq!(select_category(t, 0.0).kind, SlimeKind::Green);
        assert_eq!(select_category(t, 0.40).kind, SlimeKind::Green);
        assert_eq!(select_category(t, 0.41).kind, SlimeKind::Yellow);
        assert_eq!(select_category(t, 0.61).kind, SlimeKind::Yellow);
        assert_eq!(select_category(t, 0.70).kind, SlimeKind::Red);
        assert_eq!(select_category(t, 0.80).kind, SlimeKind::Blue);
        assert_eq!(select_category(t, 0.95).kind, SlimeKind::Purple);
    }

    #[test]
    fn test_select_falls_back_to_last_when_probabilities_short() {
        let mut t = DEFAULT_CATEGORIES;
        for def in t.iter_mut() {
            def.probability *= 0.5;
        }
        assert_eq!(select_category(&t, 0.9).kind, SlimeKind::Purple);
        assert_eq!(select_category(&t, 0.999_999).kind, SlimeKind::Purple);
    }
}
