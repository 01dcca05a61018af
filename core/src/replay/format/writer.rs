//! Event line writer
//!
//! Turns events into single JSON lines with quantized floats.

use std::borrow::Cow;

use super::{FormatError, WireEntity, WireEvent};
use crate::replay::types::{EntitySnapshot, Event, HeaderEvent};

/// Decimal precision beyond which rounding is a no-op for f64
const MAX_DECIMALS: u32 = 15;

/// Lossy rounding of floats to a fixed number of decimal places
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    decimals: u32,
    scale: f64,
}

impl Quantizer {
    pub fn new(decimals: u32) -> Self {
        let decimals = decimals.min(MAX_DECIMALS);
        Self {
            decimals,
            scale: 10f64.powi(decimals as i32),
        }
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Round `value` to the configured precision. Non-finite values pass
    /// through unchanged.
    pub fn quantize(&self, value: f64) -> f64 {
        if !value.is_finite() || self.decimals == MAX_DECIMALS {
            return value;
        }
        let rounded = (value * self.scale).round() / self.scale;
        // Values too large to scale stay as they are
        if rounded.is_finite() { rounded } else { value }
    }

    /// Largest error a round trip can introduce
    pub fn tolerance(&self) -> f64 {
        0.5 / self.scale
    }
}

impl Default for Quantizer {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Encode one event with the given quantizer
pub fn encode_event(event: &Event, quantizer: &Quantizer) -> Result<String, FormatError> {
    LineEncoder::new(*quantizer).encode(event)
}

/// Encoder for event lines
#[derive(Debug, Clone, Copy, Default)]
pub struct LineEncoder {
    quantizer: Quantizer,
}

impl LineEncoder {
    pub fn new(quantizer: Quantizer) -> Self {
        Self { quantizer }
    }

    pub fn quantizer(&self) -> Quantizer {
        self.quantizer
    }

    /// Encode any event
    pub fn encode(&self, event: &Event) -> Result<String, FormatError> {
        match event {
            Event::Header(header) => self.encode_header(header),
            Event::Input(input) => self.encode_input(input.t, &input.keys),
            Event::Keyframe(keyframe) => self.encode_keyframe(keyframe.t, &keyframe.entities),
        }
    }

    pub fn encode_header(&self, header: &HeaderEvent) -> Result<String, FormatError> {
        Ok(serde_json::to_string(&WireEvent::Header {
            version: header.version,
            w: header.width,
            h: header.height,
        })?)
    }

    pub fn encode_input(&self, t: f64, keys: &[i32]) -> Result<String, FormatError> {
        Ok(serde_json::to_string(&WireEvent::Input {
            t: self.quantizer.quantize(t),
            keys: Cow::Borrowed(keys),
        })?)
    }

    /// Encode a keyframe directly from borrowed snapshots
    pub fn encode_keyframe(
        &self,
        t: f64,
        entities: &[EntitySnapshot],
    ) -> Result<String, FormatError> {
        let entities = entities.iter().map(|e| self.wire_entity(e)).collect();
        Ok(serde_json::to_string(&WireEvent::Keyframe {
            t: self.quantizer.quantize(t),
            entities,
        })?)
    }

    fn wire_entity<'a>(&self, entity: &'a EntitySnapshot) -> WireEntity<'a> {
        let q = |v: f32| self.quantizer.quantize(f64::from(v));
        let shape = entity.shape.as_ref();
        let size = shape.and_then(|s| s.size).filter(|s| s.is_finite());
        let velocity = entity.velocity.filter(|v| v.is_finite());

        WireEntity {
            id: Cow::Borrowed(entity.id.as_str()),
            x: q(entity.position.x),
            y: q(entity.position.y),
            rt: shape.map(|s| Cow::Borrowed(s.kind.as_str())),
            w: size.map(|size| q(size.x)),
            h: size.map(|size| q(size.y)),
            color: shape
                .and_then(|s| s.color)
                .filter(|c| c.is_finite())
                .map(|c| c.to_array().into_iter().map(q).collect()),
            vx: velocity.map(|v| q(v.x)),
            vy: velocity.map(|v| q(v.y)),
            key: entity.key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::types::{InputEvent, KeyframeEvent, Rgba, Shape, ShapeKind};
    use glam::Vec2;

    #[test]
    fn test_quantize_rounds_to_decimals() {
        let q = Quantizer::new(2);
        assert_eq!(q.quantize(1.23456), 1.23);
        assert_eq!(q.quantize(-0.125), -0.13);
        assert_eq!(q.quantize(400.0), 400.0);
        assert!(q.quantize(f64::NAN).is_nan());

        let whole = Quantizer::new(0);
        assert_eq!(whole.quantize(2.6), 3.0);
    }

    #[test]
    fn test_encode_header_matches_wire_shape() {
        let line = LineEncoder::default()
            .encode(&Event::Header(HeaderEvent::new(800, 600)))
            .unwrap();
        assert_eq!(line, r#"{"type":"header","version":1,"w":800,"h":600}"#);
    }

    #[test]
    fn test_encode_input() {
        let line = LineEncoder::default()
            .encode(&Event::Input(InputEvent {
                t: 1.23456,
                keys: vec![32, 65],
            }))
            .unwrap();
        assert_eq!(line, r#"{"type":"input","t":1.23,"keys":[32,65]}"#);
    }

    #[test]
    fn test_encode_keyframe_omits_absent_fields() {
        let keyframe = KeyframeEvent::new(
            0.5,
            vec![EntitySnapshot::new("Decoration", Vec2::new(1.0, 2.0))],
        );
        let line = LineEncoder::default()
            .encode(&Event::Keyframe(keyframe))
            .unwrap();

        assert!(line.starts_with(r#"{"type":"keyframe","t":0.5,"entities":["#));
        for absent in ["\"rt\"", "\"w\"", "\"h\"", "\"color\"", "\"vx\"", "\"vy\"", "\"key\""] {
            assert!(!line.contains(absent), "{absent} should be omitted: {line}");
        }
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_encode_keyframe_quantizes_all_floats() {
        let entity = EntitySnapshot::new("Enemy", Vec2::new(10.123, -4.987))
            .with_shape(Shape::described(
                ShapeKind::Rectangle,
                Vec2::new(20.0, 20.0),
                Rgba::new(1.0, 0.5, 0.0, 1.0),
            ))
            .with_velocity(Vec2::new(3.14159, 0.0));
        let line = LineEncoder::new(Quantizer::new(1))
            .encode_keyframe(2.0, &[entity])
            .unwrap();

        assert!(line.contains(r#""x":10.1"#), "{line}");
        assert!(line.contains(r#""y":-5.0"#), "{line}");
        assert!(line.contains(r#""rt":"RECTANGLE""#), "{line}");
        assert!(line.contains(r#""color":[1.0,0.5,0.0,1.0]"#), "{line}");
        assert!(line.contains(r#""vx":3.1"#), "{line}");
    }

    #[test]
    fn test_encode_keyframe_omits_non_finite_shape_parts() {
        let entity = EntitySnapshot::new("Enemy", Vec2::ONE)
            .with_shape(Shape::described(
                ShapeKind::Circle,
                Vec2::new(f32::NAN, 3.0),
                Rgba::new(f32::NAN, 0.0, 0.0, 1.0),
            ))
            .with_velocity(Vec2::new(f32::INFINITY, 0.0));
        let line = LineEncoder::default().encode_keyframe(1.0, &[entity]).unwrap();

        assert!(!line.contains("null"), "{line}");
        for absent in ["\"w\"", "\"h\"", "\"color\"", "\"vx\"", "\"vy\""] {
            assert!(!line.contains(absent), "{absent} should be omitted: {line}");
        }
        assert!(crate::replay::format::decode_line(&line).is_ok());
    }
}
