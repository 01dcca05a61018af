//! Replay runtime
//!
//! This module contains the moving parts of recording and playback:
//! - **Recorder**: Samples simulation state into event lines
//! - **Writer**: Background thread draining lines into storage
//! - **Player**: Rebuilds and interpolates entities from a recording
//! - **Scene**: Rendering collaborator the player drives

mod player;
mod recorder;
mod scene;
mod writer;

pub use player::{LoadSummary, MAX_SPEED, MIN_SPEED, PlaybackState, Player, PlayerConfig};
pub use recorder::{
    Recorder, RecorderConfig, RecorderError, RecorderState, RecordingStats, StartOutcome,
};
pub use scene::{
    Archetype, ENEMY_COLOR, ENEMY_SIZE, GENERIC_COLOR, HeadlessScene, PlaybackEntity,
    PlaybackScene,
};
pub use writer::{WriterHandle, WriterStats};
