//! Simulation replay system
//!
//! Records a running simulation as a line-delimited event log (`.jsonl`)
//! and plays it back by interpolating between keyframes, without re-running
//! the simulation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Recording                              │
//! │ simulation tick ─► Recorder ─► bounded queue ─► record-writer │
//! │                                                   │          │
//! │                                          RecordingStorage    │
//! └──────────────────────────────────────────────────────────────┘
//!
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Playback                               │
//! │ RecordingStorage ─► parse ─► sorted timeline ─► Player       │
//! │                                                   │          │
//! │                           interpolate ─► PlaybackScene       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ## Recording
//!
//! ```ignore
//! use simreel_core::replay::{FileStorage, Recorder, RecorderConfig};
//!
//! let storage = FileStorage::new("recordings");
//! let mut recorder = Recorder::new(RecorderConfig::default());
//! recorder.start(&storage, "session", 800, 600)?;
//!
//! // Every simulation tick:
//! recorder.update(dt, &entities, &just_pressed);
//!
//! let stats = recorder.stop();
//! ```
//!
//! ## Playback
//!
//! ```ignore
//! use simreel_core::replay::{HeadlessScene, Player, PlayerConfig};
//!
//! let mut player = Player::new(HeadlessScene::new(), PlayerConfig::default());
//! player.load(&storage, "session")?;
//!
//! while !player.is_at_end() {
//!     player.advance(dt);
//!     for entity in player.entities() {
//!         // draw entity.position
//!     }
//! }
//! ```

pub mod format;
pub mod interpolate;
pub mod runtime;
pub mod source;
pub mod storage;
pub mod types;

// Re-export core types
pub use types::{
    EntitySnapshot, Event, FORMAT_VERSION, HeaderEvent, InputEvent, KeyframeEvent, Rgba, Shape,
    ShapeKind,
};

// Re-export the line format
pub use format::{
    FormatError, LineEncoder, ParsedRecording, Quantizer, decode_line, encode_event,
    parse_recording,
};

pub use interpolate::{Matching, positions_at};
pub use source::{RecordableEntity, ShapeDescriptor, capture, capture_all};
pub use storage::{
    FileStorage, LineSink, MemoryStorage, RECORDING_EXTENSION, RecordingHandle, RecordingStorage,
    StorageError,
};

// Re-export runtime
pub use runtime::{
    Archetype, ENEMY_COLOR, ENEMY_SIZE, GENERIC_COLOR, HeadlessScene, LoadSummary, MAX_SPEED,
    MIN_SPEED, PlaybackEntity, PlaybackScene, PlaybackState, Player, PlayerConfig, Recorder,
    RecorderConfig, RecorderError, RecorderState, RecordingStats, StartOutcome,
};
