//! Replay recorder
//!
//! Samples simulation state every tick and hands encoded event lines to the
//! background writer. Nothing here blocks the simulation thread except
//! `stop`, which waits at most the configured join timeout.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::writer::{WriterHandle, WriterStats};
use crate::replay::format::{FormatError, LineEncoder, Quantizer};
use crate::replay::source::{RecordableEntity, capture_all};
use crate::replay::storage::{RecordingStorage, StorageError};
use crate::replay::types::{EntitySnapshot, HeaderEvent};

/// Configuration for the recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Seconds between periodic keyframes (default: 0.5)
    #[serde(default = "default_keyframe_interval")]
    pub keyframe_interval_secs: f64,
    /// No keyframe is taken before this many seconds have elapsed (default: 0.1)
    #[serde(default = "default_warmup")]
    pub warmup_secs: f64,
    /// Decimal places kept for every float written (default: 2)
    #[serde(default = "default_quantize_decimals")]
    pub quantize_decimals: u32,
    /// Lines the writer queue holds before dropping (default: 4096)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// How long `stop` waits for the writer to drain (default: 500)
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
    /// Writer wake-up period while the queue is empty (default: 2)
    #[serde(default = "default_writer_idle_ms")]
    pub writer_idle_ms: u64,
}

fn default_keyframe_interval() -> f64 {
    0.5
}
fn default_warmup() -> f64 {
    0.1
}
fn default_quantize_decimals() -> u32 {
    2
}
fn default_queue_capacity() -> usize {
    4096
}
fn default_join_timeout_ms() -> u64 {
    500
}
fn default_writer_idle_ms() -> u64 {
    2
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            keyframe_interval_secs: default_keyframe_interval(),
            warmup_secs: default_warmup(),
            quantize_decimals: default_quantize_decimals(),
            queue_capacity: default_queue_capacity(),
            join_timeout_ms: default_join_timeout_ms(),
            writer_idle_ms: default_writer_idle_ms(),
        }
    }
}

impl RecorderConfig {
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    pub fn writer_idle(&self) -> Duration {
        Duration::from_millis(self.writer_idle_ms.max(1))
    }
}

/// Recorder lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    /// Inside `stop`, flushing the final keyframe
    Stopping,
}

/// Result of a successful `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A recording was already running; nothing changed
    AlreadyRecording,
}

/// Failure to begin a recording
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("failed to open recording '{target}': {source}")]
    Open {
        target: String,
        #[source]
        source: StorageError,
    },
    #[error("failed to spawn record writer: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("failed to encode header: {0}")]
    Encode(#[from] FormatError),
}

/// Counters for one recording session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordingStats {
    pub lines_enqueued: u64,
    pub lines_dropped: u64,
    pub lines_written: u64,
    pub keyframes_emitted: u64,
    pub inputs_emitted: u64,
}

/// Replay recorder state
pub struct Recorder {
    config: RecorderConfig,
    encoder: LineEncoder,
    state: RecorderState,
    writer: Option<WriterHandle>,
    target: Option<String>,
    elapsed: f64,
    keyframe_elapsed: f64,
    /// Entities seen on the latest tick, used for the final keyframe
    last_state: Vec<EntitySnapshot>,
    keyframes_emitted: u64,
    inputs_emitted: u64,
    /// Stats of the last finished session
    finished: RecordingStats,
}

impl Recorder {
    /// Create a new recorder with the given configuration
    pub fn new(config: RecorderConfig) -> Self {
        let encoder = LineEncoder::new(Quantizer::new(config.quantize_decimals));
        Self {
            config,
            encoder,
            state: RecorderState::Idle,
            writer: None,
            target: None,
            elapsed: 0.0,
            keyframe_elapsed: 0.0,
            last_state: Vec::new(),
            keyframes_emitted: 0,
            inputs_emitted: 0,
            finished: RecordingStats::default(),
        }
    }

    /// Start recording into `target`.
    ///
    /// Writes the header and spawns the writer. Calling this while already
    /// recording does nothing.
    pub fn start(
        &mut self,
        storage: &dyn RecordingStorage,
        target: &str,
        width: u32,
        height: u32,
    ) -> Result<StartOutcome, RecorderError> {
        if self.state != RecorderState::Idle {
            debug!("Recorder already running; start ignored");
            return Ok(StartOutcome::AlreadyRecording);
        }

        let header = self.encoder.encode_header(&HeaderEvent::new(width, height))?;
        let sink = storage
            .open_writer(target)
            .map_err(|source| RecorderError::Open {
                target: target.to_string(),
                source,
            })?;
        let writer = WriterHandle::spawn(
            sink,
            self.config.queue_capacity,
            self.config.writer_idle(),
            self.config.join_timeout(),
        )?;

        self.elapsed = 0.0;
        self.keyframe_elapsed = 0.0;
        self.last_state.clear();
        self.keyframes_emitted = 0;
        self.inputs_emitted = 0;
        self.finished = RecordingStats::default();

        writer.enqueue(header);
        self.writer = Some(writer);
        self.target = Some(target.to_string());
        self.state = RecorderState::Recording;

        info!("Recording started: {} ({}x{})", target, width, height);
        Ok(StartOutcome::Started)
    }

    /// Advance the recording by one simulation tick.
    ///
    /// `entities` is sampled in order; `input` holds the key codes pressed
    /// since the previous tick.
    pub fn update<I>(&mut self, dt: f64, entities: I, input: &[i32])
    where
        I: IntoIterator,
        I::Item: RecordableEntity,
    {
        if self.state != RecorderState::Recording {
            return;
        }

        if self.writer.as_ref().is_some_and(WriterHandle::has_failed) {
            warn!("Record writer failed; recording stopped");
            self.finish();
            return;
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;
        self.keyframe_elapsed += dt;

        self.last_state = capture_all(entities);

        if !input.is_empty() {
            match self.encoder.encode_input(self.elapsed, input) {
                Ok(line) => {
                    if self.enqueue(line) {
                        self.inputs_emitted += 1;
                    }
                }
                Err(e) => debug!("Failed to encode input event: {}", e),
            }
        }

        if self.elapsed >= self.config.warmup_secs
            && self.keyframe_elapsed >= self.config.keyframe_interval_secs
            && self.write_keyframe()
        {
            self.keyframe_elapsed = 0.0;
        }
    }

    /// Stop recording.
    ///
    /// Writes a final keyframe from the last observed state and waits for
    /// the writer. Returns `None` if no recording was running.
    pub fn stop(&mut self) -> Option<RecordingStats> {
        if self.state != RecorderState::Recording {
            return None;
        }

        self.state = RecorderState::Stopping;
        self.write_keyframe();
        Some(self.finish())
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Check if recording is active
    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Seconds recorded so far
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Seconds since the last keyframe was written
    pub fn keyframe_elapsed(&self) -> f64 {
        self.keyframe_elapsed
    }

    /// Target of the current (or last) recording
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Counters for the running session, or the last finished one
    pub fn stats(&self) -> RecordingStats {
        match &self.writer {
            Some(writer) => self.session_stats(writer.stats()),
            None => self.finished,
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Queue a keyframe built from the last observed state.
    ///
    /// Returns false, without writing anything, when there are no entities.
    fn write_keyframe(&mut self) -> bool {
        if self.last_state.is_empty() {
            return false;
        }

        let line = match self.encoder.encode_keyframe(self.elapsed, &self.last_state) {
            Ok(line) => line,
            Err(e) => {
                debug!("Failed to encode keyframe: {}", e);
                return false;
            }
        };
        if self.enqueue(line) {
            self.keyframes_emitted += 1;
        }
        true
    }

    fn enqueue(&self, line: String) -> bool {
        self.writer
            .as_ref()
            .is_some_and(|writer| writer.enqueue(line))
    }

    /// Shut the writer down and return to idle
    fn finish(&mut self) -> RecordingStats {
        let writer_stats = match self.writer.take() {
            Some(mut writer) => {
                writer.shutdown(self.config.join_timeout());
                writer.stats()
            }
            None => WriterStats::default(),
        };

        self.finished = self.session_stats(writer_stats);
        self.state = RecorderState::Idle;

        info!(
            "Recording stopped after {:.2}s: {} lines written, {} dropped",
            self.elapsed, self.finished.lines_written, self.finished.lines_dropped
        );
        self.finished
    }

    fn session_stats(&self, writer: WriterStats) -> RecordingStats {
        RecordingStats {
            lines_enqueued: writer.enqueued,
            lines_dropped: writer.dropped,
            lines_written: writer.written,
            keyframes_emitted: self.keyframes_emitted,
            inputs_emitted: self.inputs_emitted,
        }
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(RecorderConfig::default())
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
    }
}
