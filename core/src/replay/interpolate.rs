//! Keyframe interpolation
//!
//! Positions between two keyframes are extrapolated from the lower
//! keyframe's velocities. `u` is an absolute offset in seconds from `a.t`,
//! not a `0..1` blend factor.

use glam::Vec2;
use hashbrown::HashSet;

use crate::replay::types::KeyframeEvent;

/// How entities of `a` are paired with entities of `b`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matching {
    /// By stable key (both keyframes fully keyed)
    Key,
    /// By list index
    Index,
}

impl Matching {
    pub fn for_pair(a: &KeyframeEvent, b: &KeyframeEvent) -> Self {
        if a.fully_keyed() && b.fully_keyed() {
            Matching::Key
        } else {
            Matching::Index
        }
    }
}

/// Displayed position of every entity of `a`, `u` seconds after `a.t`.
///
/// Entities matched in `b` move along their recorded velocity; unmatched
/// entities and entities without a velocity stay at their `a` position.
pub fn positions_at(a: &KeyframeEvent, b: &KeyframeEvent, u: f64) -> Vec<Vec2> {
    let u = u.max(0.0) as f32;

    match Matching::for_pair(a, b) {
        Matching::Key => {
            let keys: HashSet<u64> = b.entities.iter().filter_map(|e| e.key).collect();
            a.entities
                .iter()
                .map(|e| match (e.velocity, e.key) {
                    (Some(v), Some(key)) if keys.contains(&key) => e.position + v * u,
                    _ => e.position,
                })
                .collect()
        }
        Matching::Index => a
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| match e.velocity {
                Some(v) if i < b.len() => e.position + v * u,
                _ => e.position,
            })
            .collect(),
    }
}
