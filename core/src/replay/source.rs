//! Source-state interface
//!
//! What the recorder needs from a live simulation entity. The simulation
//! owns its entities; the recorder only reads them once per tick.

use glam::Vec2;

use crate::replay::types::{EntitySnapshot, Rgba, Shape, ShapeKind};

/// Shape an entity is drawn with, as reported by the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    pub size: Vec2,
    pub color: Rgba,
}

impl ShapeDescriptor {
    pub fn new(kind: ShapeKind, size: Vec2, color: Rgba) -> Self {
        Self { kind, size, color }
    }
}

/// Non-finite sizes and colors become absent
impl From<ShapeDescriptor> for Shape {
    fn from(desc: ShapeDescriptor) -> Self {
        Shape {
            kind: desc.kind,
            size: Some(desc.size).filter(|s| s.is_finite()),
            color: Some(desc.color).filter(|c| c.is_finite()),
        }
    }
}

/// An entity the recorder can sample
pub trait RecordableEntity {
    /// Display name written as the snapshot `id`
    fn name(&self) -> &str;

    /// Current position. Entities without one are not recorded.
    fn position(&self) -> Option<Vec2>;

    /// Shape descriptor. `None` means the entity draws itself.
    fn shape(&self) -> Option<ShapeDescriptor> {
        None
    }

    /// Physical velocity, if the entity has one
    fn velocity(&self) -> Option<Vec2> {
        None
    }

    /// Identifier that stays the same for this entity across keyframes
    fn stable_key(&self) -> Option<u64> {
        None
    }
}

impl<T: RecordableEntity + ?Sized> RecordableEntity for &T {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn position(&self) -> Option<Vec2> {
        (**self).position()
    }
    fn shape(&self) -> Option<ShapeDescriptor> {
        (**self).shape()
    }
    fn velocity(&self) -> Option<Vec2> {
        (**self).velocity()
    }
    fn stable_key(&self) -> Option<u64> {
        (**self).stable_key()
    }
}

impl<T: RecordableEntity + ?Sized> RecordableEntity for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn position(&self) -> Option<Vec2> {
        (**self).position()
    }
    fn shape(&self) -> Option<ShapeDescriptor> {
        (**self).shape()
    }
    fn velocity(&self) -> Option<Vec2> {
        (**self).velocity()
    }
    fn stable_key(&self) -> Option<u64> {
        (**self).stable_key()
    }
}

/// Sample one entity.
///
/// Returns `None` when the entity has no usable position. A non-finite
/// velocity, size or color is dropped rather than written.
pub fn capture<E: RecordableEntity + ?Sized>(entity: &E) -> Option<EntitySnapshot> {
    let position = entity.position().filter(|p| p.is_finite())?;

    Some(EntitySnapshot {
        id: entity.name().to_string(),
        position,
        shape: Some(entity.shape().map_or_else(Shape::custom, Shape::from)),
        velocity: entity.velocity().filter(|v| v.is_finite()),
        key: entity.stable_key(),
    })
}

/// Sample an ordered entity sequence, skipping entities without a position
pub fn capture_all<I>(entities: I) -> Vec<EntitySnapshot>
where
    I: IntoIterator,
    I::Item: RecordableEntity,
{
    entities
        .into_iter()
        .filter_map(|entity| capture(&entity))
        .collect()
}
