//! Background line writer
//!
//! Single-producer/single-consumer boundary between the simulation thread
//! and storage I/O. The producer never blocks: when the bounded queue is
//! full the newest line is dropped.
//!
//! ```text
//! Recorder ──try_send──► [ sync_channel(capacity) ] ──recv──► record-writer ──► LineSink
//!            (drop on full)                                    (closes sink on every exit)
//! ```

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::replay::storage::LineSink;

/// Counter snapshot for one writer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Lines accepted into the queue
    pub enqueued: u64,
    /// Lines rejected because the queue was full or the writer was gone
    pub dropped: u64,
    /// Lines the sink accepted
    pub written: u64,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    written: AtomicU64,
    failed: AtomicBool,
}

/// Handle to the `record-writer` thread
///
/// Dropping the handle shuts the writer down with the join timeout it was
/// spawned with.
pub struct WriterHandle {
    /// Option so shutdown can drop the sender before waiting
    tx: Option<SyncSender<String>>,
    handle: Option<JoinHandle<()>>,
    /// Signalled by the worker once the sink is closed
    done_rx: Receiver<()>,
    counters: Arc<Counters>,
    join_timeout: Duration,
}

impl WriterHandle {
    /// Spawn a writer draining into `sink`
    pub fn spawn(
        sink: Box<dyn LineSink>,
        capacity: usize,
        idle_wait: Duration,
        join_timeout: Duration,
    ) -> io::Result<Self> {
        let (tx, rx) = mpsc::sync_channel::<String>(capacity.max(1));
        let (done_tx, done_rx) = mpsc::channel();
        let counters = Arc::new(Counters::default());

        let worker_counters = Arc::clone(&counters);
        let handle = thread::Builder::new()
            .name("record-writer".into())
            .spawn(move || {
                run(rx, sink, &worker_counters, idle_wait);
                let _ = done_tx.send(());
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            done_rx,
            counters,
            join_timeout,
        })
    }

    /// Queue a line without blocking. Returns false if it was dropped.
    pub fn enqueue(&self, line: String) -> bool {
        let Some(tx) = &self.tx else {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        match tx.try_send(line) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("Record queue full, dropping line");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("Record writer gone, dropping line");
                false
            }
        }
    }

    /// True once a write has failed and the worker has given up
    pub fn has_failed(&self) -> bool {
        self.counters.failed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> WriterStats {
        WriterStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            written: self.counters.written.load(Ordering::Relaxed),
        }
    }

    /// Close the queue and wait up to `timeout` for the worker to drain it.
    ///
    /// Returns false if the worker did not finish in time; it is then left
    /// running detached.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        // Drop the sender first so the worker sees Disconnected after draining
        drop(self.tx.take());

        let Some(handle) = self.handle.take() else {
            return true;
        };

        match self.done_rx.recv_timeout(timeout) {
            // Disconnected without a signal means the worker panicked
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    warn!("Record writer thread panicked");
                    return false;
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Record writer did not finish within {:?}; abandoning it",
                    timeout
                );
                false
            }
        }
    }
}

impl Drop for WriterHandle {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown(self.join_timeout);
        }
    }
}

/// Closes the sink however the worker loop exits
struct SinkGuard(Box<dyn LineSink>);

impl Drop for SinkGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.close() {
            warn!("Failed to close recording: {}", e);
        }
    }
}

fn run(rx: Receiver<String>, sink: Box<dyn LineSink>, counters: &Counters, idle_wait: Duration) {
    debug!("Record writer started");
    let mut sink = SinkGuard(sink);

    loop {
        match rx.recv_timeout(idle_wait) {
            Ok(line) => {
                if let Err(e) = sink.0.write_line(&line) {
                    warn!("Recording write failed, stopping writer: {}", e);
                    counters.failed.store(true, Ordering::Release);
                    break;
                }
                counters.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(RecvTimeoutError::Timeout) => continue,
            // Only reported once every queued line has been received
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    drop(sink);
    debug!(
        "Record writer finished ({} lines)",
        counters.written.load(Ordering::Relaxed)
    );
}
