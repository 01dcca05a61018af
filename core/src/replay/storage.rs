//! Recording storage
//!
//! Abstracts "append a line to a durable medium" and "enumerate available
//! recordings" so the recorder and player don't care whether recordings
//! live on disk or in memory.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use hashbrown::HashMap;

/// File extension used for recordings on disk
pub const RECORDING_EXTENSION: &str = "jsonl";

/// Storage failure
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("recording '{0}' not found")]
    NotFound(String),
    #[error("invalid recording name '{0}'")]
    InvalidTarget(String),
    #[error("line sink already closed")]
    Closed,
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// An available recording, as reported by [`RecordingStorage::list_available`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingHandle {
    /// Name to pass back to `read_lines`
    pub name: String,
    /// Backing file, for file storage
    pub path: Option<PathBuf>,
    /// Last modification time, when known
    pub modified: Option<SystemTime>,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Append-only destination for one recording
pub trait LineSink: Send {
    /// Append one line (the newline is added by the sink)
    fn write_line(&mut self, line: &str) -> Result<(), StorageError>;

    /// Flush and release the medium. Writing after close fails.
    fn close(&mut self) -> Result<(), StorageError>;
}

/// Backend shared by the recorder (writes) and the player (reads)
pub trait RecordingStorage: Send + Sync {
    /// Open `target` for writing, replacing any previous contents
    fn open_writer(&self, target: &str) -> Result<Box<dyn LineSink>, StorageError>;

    /// Read every line of `target`
    fn read_lines(&self, target: &str) -> Result<Vec<String>, StorageError>;

    /// Recordings that can be played back
    fn list_available(&self) -> Vec<RecordingHandle>;
}

// ============================================================================
// File storage
// ============================================================================

/// Recordings stored as `.jsonl` files in one directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a target to a file path.
    ///
    /// Bare names live in the storage directory and get the `.jsonl`
    /// extension if they have none. Anything with a directory component is
    /// used as given.
    pub fn resolve(&self, target: &str) -> Result<PathBuf, StorageError> {
        let trimmed = target.trim();
        if trimmed.is_empty() {
            return Err(StorageError::InvalidTarget(target.to_string()));
        }

        let path = Path::new(trimmed);
        if path.is_absolute() || path.components().count() > 1 {
            return Ok(path.to_path_buf());
        }
        if trimmed == "." || trimmed == ".." {
            return Err(StorageError::InvalidTarget(target.to_string()));
        }

        let mut file = self.dir.join(path);
        if file.extension().is_none() {
            file.set_extension(RECORDING_EXTENSION);
        }
        Ok(file)
    }
}

impl RecordingStorage for FileStorage {
    fn open_writer(&self, target: &str) -> Result<Box<dyn LineSink>, StorageError> {
        let path = self.resolve(target)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        let file = File::create(&path).map_err(|e| StorageError::io(&path, e))?;

        tracing::debug!("Recording to {}", path.display());
        Ok(Box::new(FileSink {
            path,
            writer: Some(BufWriter::new(file)),
        }))
    }

    fn read_lines(&self, target: &str) -> Result<Vec<String>, StorageError> {
        let path = self.resolve(target)?;
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(target.to_string()));
            }
            Err(e) => return Err(StorageError::io(&path, e)),
        };

        // Lossy per line: a corrupt byte sequence costs one line, not the file
        let mut reader = BufReader::new(file);
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| StorageError::io(&path, e))?;
            if read == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            lines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }

        Ok(lines)
    }

    fn list_available(&self) -> Vec<RecordingHandle> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return vec![];
        };

        let mut handles: Vec<RecordingHandle> = entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if !path.is_file()
                    || path.extension().and_then(|e| e.to_str()) != Some(RECORDING_EXTENSION)
                {
                    return None;
                }
                let name = path.file_stem()?.to_str()?.to_string();
                let metadata = fs::metadata(&path).ok();

                Some(RecordingHandle {
                    name,
                    modified: metadata.as_ref().and_then(|m| m.modified().ok()),
                    size_bytes: metadata.map_or(0, |m| m.len()),
                    path: Some(path),
                })
            })
            .collect();

        // Newest first, then by name for a stable listing
        handles.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
        handles
    }
}

struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl LineSink for FileSink {
    fn write_line(&mut self, line: &str) -> Result<(), StorageError> {
        let writer = self.writer.as_mut().ok_or(StorageError::Closed)?;
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .map_err(|e| StorageError::io(&self.path, e))
    }

    fn close(&mut self) -> Result<(), StorageError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer.flush().map_err(|e| StorageError::io(&self.path, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| StorageError::io(&self.path, e))
    }
}

// ============================================================================
// Memory storage
// ============================================================================

/// Recordings kept in memory. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    recordings: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of `name`
    pub fn insert<I, S>(&self, name: &str, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines.into_iter().map(Into::into).collect();
        self.lock().insert(name.to_string(), lines);
    }

    /// Snapshot of the lines currently stored under `name`
    pub fn lines(&self, name: &str) -> Option<Vec<String>> {
        self.lock().get(name).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<String>>> {
        self.recordings.lock().unwrap_or_else(|e| {
            tracing::warn!("Memory storage mutex poisoned; continuing");
            e.into_inner()
        })
    }
}

impl RecordingStorage for MemoryStorage {
    fn open_writer(&self, target: &str) -> Result<Box<dyn LineSink>, StorageError> {
        if target.trim().is_empty() {
            return Err(StorageError::InvalidTarget(target.to_string()));
        }
        self.lock().insert(target.to_string(), Vec::new());
        Ok(Box::new(MemorySink {
            name: target.to_string(),
            storage: self.clone(),
            closed: false,
        }))
    }

    fn read_lines(&self, target: &str) -> Result<Vec<String>, StorageError> {
        self.lines(target)
            .ok_or_else(|| StorageError::NotFound(target.to_string()))
    }

    fn list_available(&self) -> Vec<RecordingHandle> {
        let mut handles: Vec<RecordingHandle> = self
            .lock()
            .iter()
            .map(|(name, lines)| RecordingHandle {
                name: name.clone(),
                path: None,
                modified: None,
                size_bytes: lines.iter().map(|l| l.len() as u64 + 1).sum(),
            })
            .collect();
        handles.sort_by(|a, b| a.name.cmp(&b.name));
        handles
    }
}

struct MemorySink {
    name: String,
    storage: MemoryStorage,
    closed: bool,
}

impl LineSink for MemorySink {
    fn write_line(&mut self, line: &str) -> Result<(), StorageError> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        self.storage
            .lock()
            .entry(self.name.clone())
            .or_default()
            .push(line.to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.closed = true;
        Ok(())
    }
}
