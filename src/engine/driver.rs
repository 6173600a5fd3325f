//! Engine driver
//!
//! The driver owns the engine's background worker thread. Segment writes
//! are shipped to it over a crossbeam channel, and unloading it is the only
//! way to release that thread.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::error::{RestoreError, Result};
use crate::storage::Segment;

use super::ShutdownOutcome;

/// Signal sent by the worker in answer to an unload request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// All work drained, worker exiting
    Unloaded,

    /// Worker exiting, but some segment writes failed while it was loaded
    FailedWrites(u64),
}

enum Request {
    WriteSegment {
        path: PathBuf,
        entries: Vec<(Vec<u8>, Vec<u8>)>,
        reply: Sender<Result<Segment>>,
    },
    Unload {
        ack: Sender<Signal>,
    },
    /// Block the worker until the sender side is dropped
    #[cfg(test)]
    Stall(Receiver<()>),
}

struct Loaded {
    requests: Sender<Request>,
    worker: JoinHandle<()>,
}

/// Loads and unloads the engine's worker
#[derive(Default)]
pub struct Driver {
    loaded: Mutex<Option<Loaded>>,
}

/// Cheap handle used by connections and keystores to reach the worker
#[derive(Clone)]
pub struct DriverHandle {
    requests: Sender<Request>,
}

impl Driver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the worker unless it is already running
    pub fn load(&self) -> Result<DriverHandle> {
        let mut loaded = self.loaded.lock();
        if let Some(current) = loaded.as_ref() {
            return Ok(DriverHandle {
                requests: current.requests.clone(),
            });
        }

        let (tx, rx) = channel::unbounded();
        let worker = thread::Builder::new()
            .name("kvrestore-driver".to_string())
            .spawn(move || run_worker(rx))
            .map_err(|e| RestoreError::Driver(format!("failed to start driver: {}", e)))?;

        tracing::debug!("keystore driver loaded");
        *loaded = Some(Loaded {
            requests: tx.clone(),
            worker,
        });
        Ok(DriverHandle { requests: tx })
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.lock().is_some()
    }

    /// Ask the worker to unload and wait at most `timeout` for its answer
    ///
    /// The worker is joined only once it has answered, so a wedged worker
    /// never blocks the caller past the timeout.
    pub fn unload(&self, timeout: Duration) -> ShutdownOutcome {
        let Some(loaded) = self.loaded.lock().take() else {
            return ShutdownOutcome::NotLoaded;
        };

        let (ack_tx, ack_rx) = channel::bounded(1);
        if loaded.requests.send(Request::Unload { ack: ack_tx }).is_err() {
            let reason = match loaded.worker.join() {
                Ok(()) => "driver worker exited before unload".to_string(),
                Err(_) => "driver worker panicked".to_string(),
            };
            tracing::warn!(%reason, "driver unload");
            return ShutdownOutcome::Unexpected(reason);
        }

        match ack_rx.recv_timeout(timeout) {
            Ok(Signal::Unloaded) => {
                join_worker(loaded.worker);
                tracing::debug!("keystore driver unloaded");
                ShutdownOutcome::Unloaded
            }
            Ok(other) => {
                join_worker(loaded.worker);
                tracing::warn!(signal = ?other, "unexpected signal while unloading driver");
                ShutdownOutcome::Unexpected(format!("{:?}", other))
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(?timeout, "driver did not acknowledge unload in time");
                ShutdownOutcome::Unexpected(format!("no unload acknowledgement within {:?}", timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                join_worker(loaded.worker);
                tracing::warn!("driver dropped the unload request");
                ShutdownOutcome::Unexpected("driver dropped the unload request".to_string())
            }
        }
    }
}

impl DriverHandle {
    /// Have the worker write a segment; blocks until it is on disk
    pub fn write_segment(
        &self,
        path: PathBuf,
        entries: Vec<(Vec<u8>, Vec<u8>)>,
    ) -> Result<Segment> {
        let (reply_tx, reply_rx) = channel::bounded(1);
        self.requests
            .send(Request::WriteSegment {
                path,
                entries,
                reply: reply_tx,
            })
            .map_err(|_| RestoreError::Driver("driver is not loaded".to_string()))?;

        reply_rx
            .recv()
            .map_err(|_| RestoreError::Driver("driver stopped before replying".to_string()))?
    }
}

fn run_worker(requests: Receiver<Request>) {
    let mut failed_writes = 0u64;

    for request in requests.iter() {
        match request {
            Request::WriteSegment {
                path,
                entries,
                reply,
            } => {
                let result = Segment::write(&path, &entries);
                if let Err(e) = &result {
                    failed_writes += 1;
                    tracing::debug!(path = %path.display(), error = %e, "segment write failed");
                }
                let _ = reply.send(result);
            }
            Request::Unload { ack } => {
                let signal = match failed_writes {
                    0 => Signal::Unloaded,
                    n => Signal::FailedWrites(n),
                };
                let _ = ack.send(signal);
                return;
            }
            #[cfg(test)]
            Request::Stall(release) => {
                let _ = release.recv();
            }
        }
    }
}

fn join_worker(worker: JoinHandle<()>) {
    if worker.join().is_err() {
        tracing::warn!("driver worker panicked during unload");
    }
}
