//! Playback scene interface
//!
//! The player never draws anything itself. It rebuilds entities through a
//! [`PlaybackScene`] and pushes positions to it every tick.

use glam::Vec2;

use crate::replay::types::{EntitySnapshot, Rgba, ShapeKind};

/// Fixed size of the enemy archetype
pub const ENEMY_SIZE: Vec2 = Vec2::new(20.0, 20.0);
/// Fixed color of the enemy archetype
pub const ENEMY_COLOR: Rgba = Rgba::new(1.0, 0.5, 0.0, 1.0);
/// Color of generic entities recorded without one
pub const GENERIC_COLOR: Rgba = Rgba::new(0.9, 0.9, 0.2, 1.0);

/// How a replayed entity should be constructed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Archetype {
    /// The player's own custom visual
    PlayerAvatar,
    Enemy {
        size: Vec2,
        color: Rgba,
    },
    /// Anything else, rebuilt from the recorded shape
    Generic {
        kind: ShapeKind,
        size: Vec2,
        color: Rgba,
    },
}

impl Archetype {
    /// Pick the archetype for a recorded entity by its display name
    pub fn for_snapshot(snapshot: &EntitySnapshot) -> Self {
        if snapshot.id.eq_ignore_ascii_case("Player") {
            return Archetype::PlayerAvatar;
        }
        if snapshot.id.eq_ignore_ascii_case("Enemy") {
            return Archetype::Enemy {
                size: ENEMY_SIZE,
                color: ENEMY_COLOR,
            };
        }

        let shape = snapshot.shape.as_ref();
        let kind = match shape.map(|s| s.kind) {
            Some(ShapeKind::Rectangle) => ShapeKind::Rectangle,
            // Custom visuals can't be rebuilt from a recording
            _ => ShapeKind::Circle,
        };
        Archetype::Generic {
            kind,
            size: shape
                .and_then(|s| s.size)
                .map_or(Vec2::ONE, |size| size.max(Vec2::ONE)),
            color: shape.and_then(|s| s.color).unwrap_or(GENERIC_COLOR),
        }
    }
}

/// An entity as currently displayed by the player
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackEntity {
    pub name: String,
    pub archetype: Archetype,
    pub position: Vec2,
    pub velocity: Option<Vec2>,
    pub key: Option<u64>,
}

impl PlaybackEntity {
    /// Build from the `index`-th snapshot of a keyframe
    pub fn from_snapshot(index: usize, snapshot: &EntitySnapshot) -> Self {
        let name = if snapshot.id.is_empty() {
            format!("Obj#{index}")
        } else {
            snapshot.id.clone()
        };
        Self {
            name,
            archetype: Archetype::for_snapshot(snapshot),
            position: snapshot.position,
            velocity: snapshot.velocity,
            key: snapshot.key,
        }
    }
}

/// Rendering collaborator driven by the player
pub trait PlaybackScene {
    type Handle;

    /// Create a visual for `entity` at its position
    fn instantiate(&mut self, entity: &PlaybackEntity) -> Self::Handle;

    /// Remove a visual created by `instantiate`
    fn destroy(&mut self, handle: Self::Handle);

    fn set_position(&mut self, handle: &Self::Handle, position: Vec2);
}

/// Scene that renders nothing; only tracks how many visuals are alive
#[derive(Debug, Default)]
pub struct HeadlessScene {
    live: usize,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> usize {
        self.live
    }
}

impl PlaybackScene for HeadlessScene {
    type Handle = ();

    fn instantiate(&mut self, _entity: &PlaybackEntity) {
        self.live += 1;
    }

    fn destroy(&mut self, _handle: ()) {
        self.live = self.live.saturating_sub(1);
    }

    fn set_position(&mut self, _handle: &(), _position: Vec2) {}
}
