//! Replay player
//!
//! Loads a recording into a keyframe timeline and drives a
//! [`PlaybackScene`] from it. Playback clamps at the last keyframe; it
//! never loops.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::scene::{PlaybackEntity, PlaybackScene};
use crate::replay::format::parse_recording;
use crate::replay::interpolate::positions_at;
use crate::replay::storage::{RecordingStorage, StorageError};
use crate::replay::types::{HeaderEvent, InputEvent, KeyframeEvent};

/// Slowest allowed playback speed
pub const MIN_SPEED: f64 = 0.1;
/// Fastest allowed playback speed
pub const MAX_SPEED: f64 = 10.0;

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Playback speed multiplier (default: 1.0, range: 0.1-10.0)
    #[serde(default = "default_speed")]
    pub speed: f64,
}

fn default_speed() -> f64 {
    1.0
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
        }
    }
}

/// Player lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    NoRecordingSelected,
    /// Recording loaded, clock not yet advanced
    Loaded,
    Playing,
}

/// What a load found
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub header: Option<HeaderEvent>,
    pub keyframes: usize,
    pub inputs: usize,
    pub skipped_lines: usize,
    /// Timestamp of the last keyframe
    pub duration: f64,
}

/// Replay player state
pub struct Player<S: PlaybackScene> {
    scene: S,
    config: PlayerConfig,
    state: PlaybackState,
    paused: bool,
    header: Option<HeaderEvent>,
    inputs: Vec<InputEvent>,
    /// Keyframes sorted by timestamp
    timeline: Vec<KeyframeEvent>,
    clock: f64,
    /// Lower bound of the bracketing pair the entity set was built from
    lower: Option<usize>,
    entities: Vec<PlaybackEntity>,
    handles: Vec<S::Handle>,
    rebuilds: u64,
}

impl<S: PlaybackScene> Player<S> {
    /// Create a new player driving `scene`
    pub fn new(scene: S, config: PlayerConfig) -> Self {
        let mut player = Self {
            scene,
            config: PlayerConfig::default(),
            state: PlaybackState::NoRecordingSelected,
            paused: false,
            header: None,
            inputs: Vec::new(),
            timeline: Vec::new(),
            clock: 0.0,
            lower: None,
            entities: Vec::new(),
            handles: Vec::new(),
            rebuilds: 0,
        };
        player.set_speed(config.speed);
        player
    }

    /// Load `target` from storage, replacing the current recording.
    ///
    /// The current recording is kept if the read fails.
    pub fn load(
        &mut self,
        storage: &dyn RecordingStorage,
        target: &str,
    ) -> Result<LoadSummary, StorageError> {
        let lines = storage.read_lines(target)?;
        let summary = self.load_lines(lines);
        info!(
            "Loaded {}: {} keyframes, {:.2}s, {} lines skipped",
            target, summary.keyframes, summary.duration, summary.skipped_lines
        );
        Ok(summary)
    }

    /// Load a recording from already-read lines
    pub fn load_lines<I>(&mut self, lines: I) -> LoadSummary
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let parsed = parse_recording(lines);
        let mut skipped_lines = parsed.skipped_lines;

        let mut timeline = parsed.keyframes;
        let before = timeline.len();
        timeline.retain(|k| k.t.is_finite());
        skipped_lines += before - timeline.len();
        // Stable, so equal timestamps keep file order
        timeline.sort_by(|a, b| a.t.total_cmp(&b.t));

        self.clear_entities();
        self.header = parsed.header;
        self.inputs = parsed.inputs;
        self.timeline = timeline;
        self.clock = 0.0;
        self.lower = None;
        self.paused = false;
        self.state = PlaybackState::Loaded;

        debug!(
            "Timeline built: {} keyframes, {} inputs",
            self.timeline.len(),
            self.inputs.len()
        );

        LoadSummary {
            header: self.header,
            keyframes: self.timeline.len(),
            inputs: self.inputs.len(),
            skipped_lines,
            duration: self.duration(),
        }
    }

    /// Drop the loaded recording and every visual
    pub fn unload(&mut self) {
        self.clear_entities();
        self.header = None;
        self.inputs.clear();
        self.timeline.clear();
        self.clock = 0.0;
        self.lower = None;
        self.paused = false;
        self.state = PlaybackState::NoRecordingSelected;
    }

    /// Advance playback by `dt` seconds of wall time
    pub fn advance(&mut self, dt: f64) {
        let Some(last) = self.timeline.last() else {
            return;
        };
        if self.paused {
            return;
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.clock = (self.clock + dt * self.config.speed).min(last.t);
        self.state = PlaybackState::Playing;
        self.present();
    }

    /// Jump to `t` seconds, clamped to the recording
    pub fn seek(&mut self, t: f64) {
        let Some(last) = self.timeline.last() else {
            return;
        };
        if !t.is_finite() {
            return;
        }
        self.clock = t.max(0.0).min(last.t);
        self.state = PlaybackState::Playing;
        self.present();
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume playback
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Check if paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set the playback speed
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() {
            self.config.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        }
    }

    pub fn speed(&self) -> f64 {
        self.config.speed
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current playback clock in recording seconds
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Timestamp of the last keyframe
    pub fn duration(&self) -> f64 {
        self.timeline.last().map_or(0.0, |k| k.t.max(0.0))
    }

    /// Get playback progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        (self.clock / duration).clamp(0.0, 1.0)
    }

    /// Check if the clock has reached the last keyframe
    pub fn is_at_end(&self) -> bool {
        self.timeline.last().is_some_and(|k| self.clock >= k.t)
    }

    /// Indices of the keyframes enclosing the clock
    pub fn bracket(&self) -> Option<(usize, usize)> {
        let first = self.timeline.first()?;
        let n = self.timeline.len();
        if n == 1 || self.clock < first.t {
            return Some((0, 0));
        }

        let clock = self.clock;
        let pair = self
            .timeline
            .windows(2)
            .position(|w| w[0].t <= clock && clock <= w[1].t)
            .map_or((n - 1, n - 1), |i| (i, i + 1));
        Some(pair)
    }

    /// Entities as currently displayed
    pub fn entities(&self) -> &[PlaybackEntity] {
        &self.entities
    }

    pub fn timeline(&self) -> &[KeyframeEvent] {
        &self.timeline
    }

    pub fn header(&self) -> Option<&HeaderEvent> {
        self.header.as_ref()
    }

    /// Input events of the loaded recording (not replayed)
    pub fn inputs(&self) -> &[InputEvent] {
        &self.inputs
    }

    /// Times the entity set has been rebuilt since creation
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// Get the player configuration
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Push the state at the current clock to the scene
    fn present(&mut self) {
        let Some((lo, hi)) = self.bracket() else {
            return;
        };
        if self.lower != Some(lo) {
            self.rebuild(lo);
        }

        let a = &self.timeline[lo];
        let b = &self.timeline[hi];
        let positions = positions_at(a, b, self.clock - a.t);

        for ((entity, handle), position) in self
            .entities
            .iter_mut()
            .zip(&self.handles)
            .zip(positions)
        {
            entity.position = position;
            self.scene.set_position(handle, position);
        }
    }

    /// Replace the entity set with the entities of keyframe `index`
    fn rebuild(&mut self, index: usize) {
        self.clear_entities();

        self.entities = self.timeline[index]
            .entities
            .iter()
            .enumerate()
            .map(|(i, snapshot)| PlaybackEntity::from_snapshot(i, snapshot))
            .collect();
        self.handles = self
            .entities
            .iter()
            .map(|entity| self.scene.instantiate(entity))
            .collect();

        self.lower = Some(index);
        self.rebuilds += 1;
        trace!(
            "Rebuilt {} entities from keyframe {} (t={:.2})",
            self.entities.len(),
            index,
            self.timeline[index].t
        );
    }

    fn clear_entities(&mut self) {
        for handle in self.handles.drain(..) {
            self.scene.destroy(handle);
        }
        self.entities.clear();
    }
}
