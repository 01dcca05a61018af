//! Line-delimited event format (.jsonl)
//!
//! Every event is one self-contained JSON object on its own line, tagged by
//! a `type` discriminator.
//!
//! # Line Shapes
//!
//! ```text
//! {"type":"header","version":1,"w":800,"h":600}
//! {"type":"input","t":1.25,"keys":[32,65]}
//! {"type":"keyframe","t":1.5,"entities":[
//!     {"id":"Player","x":400,"y":300,"rt":"CUSTOM","vx":12.5,"vy":0},
//!     {"id":"Enemy","x":10.5,"y":4,"rt":"RECTANGLE","w":20,"h":20,"color":[1,0.5,0,1]}
//! ]}
//! ```
//!
//! (keyframes are written on a single line; wrapped here for reading)
//!
//! Floats are quantized before encoding. Optional entity fields (`rt`, `w`,
//! `h`, `color`, `vx`/`vy`, `key`) are omitted when absent and decode back
//! to `None`. Unknown fields are ignored so newer writers stay readable.

mod reader;
mod writer;

pub use reader::{ParsedRecording, decode_line, parse_recording};
pub use writer::{LineEncoder, Quantizer, encode_event};

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Error decoding or encoding a single event line
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("blank line")]
    Blank,
    #[error("malformed event line: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Serde mirror of [`crate::replay::types::Event`].
///
/// Borrows on the encode path so keyframes serialize straight from the
/// recorder's buffers; decodes into owned data.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireEvent<'a> {
    Header {
        version: u32,
        w: u32,
        h: u32,
    },
    Input {
        t: f64,
        keys: Cow<'a, [i32]>,
    },
    Keyframe {
        t: f64,
        entities: Vec<WireEntity<'a>>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEntity<'a> {
    #[serde(default)]
    id: Cow<'a, str>,
    x: f64,
    y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rt: Option<Cow<'a, str>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<u64>,
}
