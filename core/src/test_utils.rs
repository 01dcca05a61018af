//! Shared test utilities for integration and unit tests

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use glam::Vec2;
use hashbrown::HashMap;

use crate::replay::{
    LineSink, MemoryStorage, PlaybackEntity, PlaybackScene, RecordableEntity, RecordingHandle,
    RecordingStorage, ShapeDescriptor, StorageError,
};

// ============================================================================
// Source entities
// ============================================================================

/// Plain entity for feeding the recorder
#[derive(Debug, Clone)]
pub struct TestEntity {
    pub name: String,
    pub position: Option<Vec2>,
    pub shape: Option<ShapeDescriptor>,
    pub velocity: Option<Vec2>,
    pub key: Option<u64>,
}

impl TestEntity {
    pub fn new(name: &str, position: Vec2) -> Self {
        Self {
            name: name.to_string(),
            position: Some(position),
            shape: None,
            velocity: None,
            key: None,
        }
    }

    /// Entity that has not been placed yet
    pub fn unplaced(name: &str) -> Self {
        Self {
            position: None,
            ..Self::new(name, Vec2::ZERO)
        }
    }

    pub fn with_shape(mut self, shape: ShapeDescriptor) -> Self {
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

impl RecordableEntity for TestEntity {
    fn name(&self) -> &str {
        &self.name
    }
    fn position(&self) -> Option<Vec2> {
        self.position
    }
    fn shape(&self) -> Option<ShapeDescriptor> {
        self.shape
    }
    fn velocity(&self) -> Option<Vec2> {
        self.velocity
    }
    fn stable_key(&self) -> Option<u64> {
        self.key
    }
}

// ============================================================================
// Playback scene
// ============================================================================

/// Scene that counts visual churn and remembers pushed positions
#[derive(Debug, Default)]
pub struct CountingScene {
    next: usize,
    positions: HashMap<usize, Vec2>,
    pub spawned: usize,
    pub destroyed: usize,
}

impl CountingScene {
    pub fn live(&self) -> usize {
        self.positions.len()
    }

    pub fn position_of(&self, handle: usize) -> Option<Vec2> {
        self.positions.get(&handle).copied()
    }
}

impl PlaybackScene for CountingScene {
    type Handle = usize;

    fn instantiate(&mut self, entity: &PlaybackEntity) -> usize {
        let handle = self.next;
        self.next += 1;
        self.spawned += 1;
        self.positions.insert(handle, entity.position);
        handle
    }

    fn destroy(&mut self, handle: usize) {
        if self.positions.remove(&handle).is_some() {
            self.destroyed += 1;
        }
    }

    fn set_position(&mut self, handle: &usize, position: Vec2) {
        if let Some(slot) = self.positions.get_mut(handle) {
            *slot = position;
        }
    }
}

// ============================================================================
// Failing storage
// ============================================================================

/// Sink that accepts `succeed` lines and then fails every write
#[derive(Debug)]
pub struct FailingSink {
    succeed: usize,
    writes: usize,
    closed: Arc<AtomicBool>,
}

impl FailingSink {
    pub fn new(succeed: usize) -> Self {
        Self {
            succeed,
            writes: 0,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set once `close` has been called
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl LineSink for FailingSink {
    fn write_line(&mut self, _line: &str) -> Result<(), StorageError> {
        if self.writes >= self.succeed {
            return Err(StorageError::Io {
                path: "failing".into(),
                source: io::Error::other("disk full"),
            });
        }
        self.writes += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Storage whose writers fail
#[derive(Debug)]
pub enum FailingStorage {
    /// `open_writer` itself fails
    Unopenable,
    /// Writers accept this many lines, then fail
    FailingAfter(usize),
}

impl FailingStorage {
    pub fn unopenable() -> Self {
        FailingStorage::Unopenable
    }

    pub fn failing_after(lines: usize) -> Self {
        FailingStorage::FailingAfter(lines)
    }
}

impl RecordingStorage for FailingStorage {
    fn open_writer(&self, target: &str) -> Result<Box<dyn LineSink>, StorageError> {
        match self {
            FailingStorage::Unopenable => Err(StorageError::Io {
                path: target.into(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            }),
            FailingStorage::FailingAfter(n) => Ok(Box::new(FailingSink::new(*n))),
        }
    }

    fn read_lines(&self, target: &str) -> Result<Vec<String>, StorageError> {
        Err(StorageError::NotFound(target.to_string()))
    }

    fn list_available(&self) -> Vec<RecordingHandle> {
        vec![]
    }
}

// ============================================================================
// Slow storage
// ============================================================================

/// One-shot latch that blocked writers wait on
#[derive(Debug, Clone, Default)]
pub struct Gate {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        let (lock, cvar) = &*self.state;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    pub fn wait(&self) {
        let (lock, cvar) = &*self.state;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
    }
}

/// Sink whose writes block until its gate opens
pub struct GatedSink {
    inner: Box<dyn LineSink>,
    gate: Gate,
}

impl GatedSink {
    pub fn new(inner: Box<dyn LineSink>, gate: Gate) -> Self {
        Self { inner, gate }
    }
}

impl LineSink for GatedSink {
    fn write_line(&mut self, line: &str) -> Result<(), StorageError> {
        self.gate.wait();
        self.inner.write_line(line)
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.inner.close()
    }
}

/// Memory storage whose writers stall until the gate opens
#[derive(Debug, Clone, Default)]
pub struct GatedStorage {
    pub inner: MemoryStorage,
    pub gate: Gate,
}

impl RecordingStorage for GatedStorage {
    fn open_writer(&self, target: &str) -> Result<Box<dyn LineSink>, StorageError> {
        let sink = self.inner.open_writer(target)?;
        Ok(Box::new(GatedSink::new(sink, self.gate.clone())))
    }

    fn read_lines(&self, target: &str) -> Result<Vec<String>, StorageError> {
        self.inner.read_lines(target)
    }

    fn list_available(&self) -> Vec<RecordingHandle> {
        self.inner.list_available()
    }
}
