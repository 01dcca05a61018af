//! simreel core - Simulation recording and interpolated replay
//!
//! This crate captures the evolving state of a running simulation as a
//! compact, append-only event log and reconstructs an approximate playback
//! from it without re-running the simulation.
//!
//! # Architecture
//!
//! - [`Recorder`] - Samples entities every tick; never blocks the simulation
//! - [`Player`] - Loads a recording and interpolates entities between keyframes
//! - [`RecordingStorage`] - Where recordings are written to and read from
//! - [`config`] - Persistent settings for all of the above

pub mod config;
#[cfg(test)]
mod integration;
pub mod placement;
pub mod replay;
#[cfg(test)]
pub mod test_utils;

// Re-export the recording and playback entry points
pub use replay::{
    FileStorage, HeadlessScene, MemoryStorage, PlaybackScene, Player, PlayerConfig,
    RecordableEntity, Recorder, RecorderConfig, RecordingStorage, ShapeDescriptor,
};

pub use config::Config;
pub use placement::{MAX_POSITION_ATTEMPTS, Placement, reposition_until_clear};
