//! Bounded random repositioning
//!
//! Moves something off a colliding spot by sampling candidate positions,
//! giving up after a fixed number of attempts instead of looping forever.

use glam::Vec2;
use rand::Rng;
use tracing::warn;

/// Default attempt budget for [`reposition_until_clear`]
pub const MAX_POSITION_ATTEMPTS: u32 = 1000;

/// Outcome of a repositioning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Final position (the last one tried if no clear spot was found)
    pub position: Vec2,
    /// Candidates sampled
    pub attempts: u32,
    /// Whether `position` is free of collisions
    pub cleared: bool,
}

/// Sample positions until one no longer collides.
///
/// `start` is checked first and kept if it is already clear. At most
/// `max_attempts` candidates are drawn from `sample`.
pub fn reposition_until_clear<S, C>(
    start: Vec2,
    max_attempts: u32,
    mut sample: S,
    mut collides: C,
) -> Placement
where
    S: FnMut() -> Vec2,
    C: FnMut(Vec2) -> bool,
{
    let mut position = start;
    let mut attempts = 0;

    while collides(position) {
        if attempts >= max_attempts {
            warn!(
                "No clear position after {} attempts; staying at ({:.1}, {:.1})",
                attempts, position.x, position.y
            );
            return Placement {
                position,
                attempts,
                cleared: false,
            };
        }
        position = sample();
        attempts += 1;
    }

    Placement {
        position,
        attempts,
        cleared: true,
    }
}

/// Uniform random point in `[0, bounds)`
pub fn random_point<R: Rng + ?Sized>(rng: &mut R, bounds: Vec2) -> Vec2 {
    Vec2::new(
        rng.random::<f32>() * bounds.x,
        rng.random::<f32>() * bounds.y,
    )
}
