//! Event line reader
//!
//! Decodes lines leniently: a line that doesn't decode is skipped by
//! [`parse_recording`], never fatal.

use glam::Vec2;
use tracing::debug;

use super::{FormatError, WireEntity, WireEvent};
use crate::replay::types::{
    EntitySnapshot, Event, HeaderEvent, InputEvent, KeyframeEvent, Rgba, Shape, ShapeKind,
};

/// Decode one event line
pub fn decode_line(line: &str) -> Result<Event, FormatError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(FormatError::Blank);
    }

    let wire: WireEvent<'static> = serde_json::from_str(line)?;
    Ok(match wire {
        WireEvent::Header { version, w, h } => Event::Header(HeaderEvent {
            version,
            width: w,
            height: h,
        }),
        WireEvent::Input { t, keys } => Event::Input(InputEvent {
            t,
            keys: keys.into_owned(),
        }),
        WireEvent::Keyframe { t, entities } => Event::Keyframe(KeyframeEvent {
            t,
            entities: entities.into_iter().map(snapshot_from_wire).collect(),
        }),
    })
}

fn snapshot_from_wire(wire: WireEntity<'_>) -> EntitySnapshot {
    let size = match (wire.w, wire.h) {
        (Some(w), Some(h)) => Some(Vec2::new(w as f32, h as f32)),
        _ => None,
    };
    let color = wire.color.as_deref().and_then(|channels| {
        let channels: Vec<f32> = channels.iter().map(|&c| c as f32).collect();
        Rgba::from_channels(&channels)
    });

    let shape = match (&wire.rt, size, color) {
        (None, None, None) => None,
        (rt, size, color) => Some(Shape {
            kind: rt.as_deref().map_or(ShapeKind::Custom, ShapeKind::parse),
            size,
            color,
        }),
    };

    // Half a velocity is no velocity
    let velocity = match (wire.vx, wire.vy) {
        (Some(vx), Some(vy)) => Some(Vec2::new(vx as f32, vy as f32)),
        _ => None,
    };

    EntitySnapshot {
        id: wire.id.into_owned(),
        position: Vec2::new(wire.x as f32, wire.y as f32),
        shape,
        velocity,
        key: wire.key,
    }
}

/// Everything recovered from a recording's lines
#[derive(Debug, Clone, Default)]
pub struct ParsedRecording {
    /// First header seen, if any
    pub header: Option<HeaderEvent>,
    /// Input events, in file order
    pub inputs: Vec<InputEvent>,
    /// Non-empty keyframes, in file order (not sorted)
    pub keyframes: Vec<KeyframeEvent>,
    /// Lines that failed to decode, plus empty keyframes
    pub skipped_lines: usize,
}

/// Decode every line of a recording, skipping anything unreadable
pub fn parse_recording<I>(lines: I) -> ParsedRecording
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut parsed = ParsedRecording::default();

    for (line_no, line) in lines.into_iter().enumerate() {
        match decode_line(line.as_ref()) {
            Ok(Event::Header(header)) => {
                if parsed.header.is_none() {
                    parsed.header = Some(header);
                } else {
                    debug!("line {}: duplicate header ignored", line_no + 1);
                }
            }
            Ok(Event::Input(input)) => parsed.inputs.push(input),
            Ok(Event::Keyframe(keyframe)) => {
                if keyframe.is_empty() {
                    debug!("line {}: empty keyframe ignored", line_no + 1);
                    parsed.skipped_lines += 1;
                } else {
                    parsed.keyframes.push(keyframe);
                }
            }
            Err(FormatError::Blank) => {}
            Err(e) => {
                debug!("line {}: skipped ({})", line_no + 1, e);
                parsed.skipped_lines += 1;
            }
        }
    }

    parsed
}
