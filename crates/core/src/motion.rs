//! Motion integrator.
//!
//! Advances every live drop, then reports the ones past the bottom boundary.
//! Removal happens after the pass, so the collection is never mutated while
//! it is being walked.

use arrayvec::ArrayVec;

use crate::collab::Collaborators;
use crate::live::LiveDrops;
use crate::types::{ObjectId, MAX_DROPS_LIMIT};

pub type Escaped = ArrayVec<ObjectId, MAX_DROPS_LIMIT>;

/// Move every drop by `vy * dt_secs` and collect those with `y > bottom`.
///
/// `bottom` is the play-area height plus the miss margin.
pub fn integrate(
    live: &mut LiveDrops,
    dt_secs: f64,
    bottom: f64,
    collab: &mut impl Collaborators,
) -> Escaped {
    let mut escaped = Escaped::new();
    for slime in live.iter_mut() {
        slime.y += slime.vy * dt_secs;
        collab.update_token_position(slime.token, slime.x, slime.y);
        if slime.y > bottom {
            // Capacity matches the collection, so this cannot overflow.
            let _ = escaped.try_push(slime.id);
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{Recorder, TokenId};
    use crate::live::FallingSlime;
    use crate::types::SlimeKind;

    fn slime(id: u32, y: f64, vy: f64) -> FallingSlime {
        FallingSlime {
            id: ObjectId(id),
            kind: SlimeKind::Green,
            x: 10.0,
            y,
            vy,
            footprint: 130.0,
            token: TokenId(id),
        }
    }

    #[test]
    fn zero_dt_moves_nothing() {
        let mut live = LiveDrops::new();
        live.push(slime(1, -130.0, 120.0)).unwrap();
        let mut rec = Recorder::new();

        let out = integrate(&mut live, 0.0, 880.0, &mut rec);
        assert!(out.is_empty());
        assert_eq!(live.get(ObjectId(1)).unwrap().y, -130.0);
        assert_eq!(rec.position_updates, 1);
    }

    #[test]
    fn advances_by_speed_times_dt() {
        let mut live = LiveDrops::new();
        live.push(slime(1, 0.0, 120.0)).unwrap();
        live.push(slime(2, 0.0, 240.0)).unwrap();

        integrate(&mut live, 0.5, 880.0, &mut Recorder::new());
        assert_eq!(live.get(ObjectId(1)).unwrap().y, 60.0);
        assert_eq!(live.get(ObjectId(2)).unwrap().y, 120.0);
    }

    #[test]
    fn reports_only_drops_strictly_past_bottom() {
        let mut live = LiveDrops::new();
        live.push(slime(1, 870.0, 10.0)).unwrap();
        live.push(slime(2, 876.0, 10.0)).unwrap();
        live.push(slime(3, 100.0, 10.0)).unwrap();

        let out = integrate(&mut live, 0.5, 880.0, &mut Recorder::new());
        assert_eq!(out.as_slice(), &[ObjectId(2)]);
        assert_eq!(live.len(), 3);
    }
}
