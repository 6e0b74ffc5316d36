//! Live drop collection.
//!
//! Fixed-capacity storage for the slimes currently on screen. Spawn order is
//! preserved, so the last entry is drawn on top and wins overlapping taps.

use arrayvec::ArrayVec;

use crate::collab::TokenId;
use crate::types::{ObjectId, SlimeKind, MAX_DROPS_LIMIT};

/// A slime falling through the play area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingSlime {
    pub id: ObjectId,
    pub kind: SlimeKind,
    /// Left edge, fixed at spawn.
    pub x: f64,
    /// Top edge. Starts above the visible area and only increases.
    pub y: f64,
    /// px/s, fixed at spawn.
    pub vy: f64,
    /// Hit-testable square size.
    pub footprint: f64,
    pub token: TokenId,
}

impl FallingSlime {
    /// Whether the point lies inside the footprint square (edges inclusive).
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.footprint && py >= self.y && py <= self.y + self.footprint
    }

    pub fn center(&self) -> (f64, f64) {
        let half = self.footprint / 2.0;
        (self.x + half, self.y + half)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LiveDrops {
    items: ArrayVec<FallingSlime, MAX_DROPS_LIMIT>,
}

impl LiveDrops {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a drop. Returns it back if storage is full.
    pub fn push(&mut self, slime: FallingSlime) -> Result<(), FallingSlime> {
        self.items.try_push(slime).map_err(|e| e.element())
    }

    pub fn get(&self, id: ObjectId) -> Option<&FallingSlime> {
        self.items.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Remove by id, preserving order of the rest.
    pub fn remove(&mut self, id: ObjectId) -> Option<FallingSlime> {
        let idx = self.items.iter().position(|s| s.id == id)?;
        Some(self.items.remove(idx))
    }

    /// Topmost drop whose footprint contains the point.
    pub fn hit_test(&self, px: f64, py: f64) -> Option<ObjectId> {
        self.items
            .iter()
            .rev()
            .find(|s| s.contains(px, py))
            .map(|s| s.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FallingSlime> + '_ {
        self.items.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut FallingSlime> + '_ {
        self.items.iter_mut()
    }

    /// Empty the collection, handing each drop to `f` in spawn order.
    pub fn drain_each(&mut self, mut f: impl FnMut(FallingSlime)) {
        for s in self.items.drain(..) {
            f(s);
        }
    }
}
