//! Core types for the replay system
//!
//! In-memory representation of the events that make up a recording. The
//! line encoding for these lives in [`crate::replay::format`].

use glam::Vec2;

/// Version written into every header event
pub const FORMAT_VERSION: u32 = 1;

/// A single decoded event from a recording
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Header(HeaderEvent),
    Input(InputEvent),
    Keyframe(KeyframeEvent),
}

impl Event {
    /// Timestamp of the event (headers have none)
    pub fn timestamp(&self) -> Option<f64> {
        match self {
            Event::Header(_) => None,
            Event::Input(input) => Some(input.t),
            Event::Keyframe(keyframe) => Some(keyframe.t),
        }
    }
}

/// First line of every recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderEvent {
    /// Format version
    pub version: u32,
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
}

impl HeaderEvent {
    /// Header for the current format version
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            version: FORMAT_VERSION,
            width,
            height,
        }
    }
}

/// Key codes newly pressed at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    /// Seconds since recording start
    pub t: f64,
    /// Key codes, in the order the input snapshot reported them
    pub keys: Vec<i32>,
}

/// Full snapshot of all recordable entities at one timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeEvent {
    /// Seconds since recording start
    pub t: f64,
    /// Entity snapshots, in source order
    pub entities: Vec<EntitySnapshot>,
}

impl KeyframeEvent {
    pub fn new(t: f64, entities: Vec<EntitySnapshot>) -> Self {
        Self { t, entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// True when every entity carries a stable key
    pub fn fully_keyed(&self) -> bool {
        !self.entities.is_empty() && self.entities.iter().all(|e| e.key.is_some())
    }
}

/// Recorded state of one entity inside a keyframe.
///
/// `id` is a display name, not an identity: several entities of the same
/// kind share it. `key` is only present when the source assigned a stable
/// per-entity identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub id: String,
    pub position: Vec2,
    pub shape: Option<Shape>,
    pub velocity: Option<Vec2>,
    pub key: Option<u64>,
}

impl EntitySnapshot {
    /// Snapshot with only the required fields
    pub fn new(id: impl Into<String>, position: Vec2) -> Self {
        Self {
            id: id.into(),
            position,
            shape: None,
            velocity: None,
            key: None,
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_key(mut self, key: u64) -> Self {
        self.key = Some(key);
        self
    }
}

/// Render shape family recorded for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    /// Entity draws itself (or the shape family was not recognized)
    Custom,
}

impl ShapeKind {
    /// Wire name (`RECTANGLE`, `CIRCLE`, `CUSTOM`)
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "RECTANGLE",
            ShapeKind::Circle => "CIRCLE",
            ShapeKind::Custom => "CUSTOM",
        }
    }

    /// Parse a wire name. Case-insensitive; unknown names map to `Custom`.
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("RECTANGLE") {
            ShapeKind::Rectangle
        } else if name.eq_ignore_ascii_case("CIRCLE") {
            ShapeKind::Circle
        } else {
            ShapeKind::Custom
        }
    }
}

/// RGBA color with channels in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from a channel list. Three channels imply opaque alpha; fewer
    /// than three is not a color.
    pub fn from_channels(channels: &[f32]) -> Option<Self> {
        match *channels {
            [r, g, b] => Some(Self::new(r, g, b, 1.0)),
            [r, g, b, a, ..] => Some(Self::new(r, g, b, a)),
            _ => None,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn is_finite(self) -> bool {
        self.to_array().iter().all(|c| c.is_finite())
    }
}

/// Recorded shape descriptor. Every part except `kind` may be absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub size: Option<Vec2>,
    pub color: Option<Rgba>,
}

impl Shape {
    /// Marker for entities that render themselves
    pub fn custom() -> Self {
        Self {
            kind: ShapeKind::Custom,
            size: None,
            color: None,
        }
    }

    /// Fully described shape
    pub fn described(kind: ShapeKind, size: Vec2, color: Rgba) -> Self {
        Self {
            kind,
            size: Some(size),
            color: Some(color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_kind_parse_is_lenient() {
        assert_eq!(ShapeKind::parse("RECTANGLE"), ShapeKind::Rectangle);
        assert_eq!(ShapeKind::parse("circle"), ShapeKind::Circle);
        assert_eq!(ShapeKind::parse("CUSTOM"), ShapeKind::Custom);
        // Shape families this build doesn't know about still load
        assert_eq!(ShapeKind::parse("LINE"), ShapeKind::Custom);
    }

    #[test]
    fn test_rgba_from_channels() {
        assert_eq!(
            Rgba::from_channels(&[0.1, 0.2, 0.3]),
            Some(Rgba::new(0.1, 0.2, 0.3, 1.0))
        );
        assert_eq!(
            Rgba::from_channels(&[0.1, 0.2, 0.3, 0.4]),
            Some(Rgba::new(0.1, 0.2, 0.3, 0.4))
        );
        assert_eq!(Rgba::from_channels(&[0.1, 0.2]), None);
    }

    #[test]
    fn test_keyframe_fully_keyed() {
        let keyed = KeyframeEvent::new(
            0.0,
            vec![
                EntitySnapshot::new("Enemy", Vec2::ZERO).with_key(1),
                EntitySnapshot::new("Enemy", Vec2::ONE).with_key(2),
            ],
        );
        assert!(keyed.fully_keyed());

        let mixed = KeyframeEvent::new(
            0.0,
            vec![
                EntitySnapshot::new("Enemy", Vec2::ZERO).with_key(1),
                EntitySnapshot::new("Enemy", Vec2::ONE),
            ],
        );
        assert!(!mixed.fully_keyed());
        assert!(!KeyframeEvent::new(0.0, Vec::new()).fully_keyed());
    }
}
