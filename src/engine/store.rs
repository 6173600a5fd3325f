//! File-backed keystore engine
//!
//! ## Layout
//! ```text
//!   {data_dir}/
//!     ├── LOCK                      (held while a connection is open)
//!     ├── users/                    (one directory per keystore)
//!     │     ├── segment_000001.seg
//!     │     └── segment_000002.seg
//!     └── sessions/
//! ```
//!
//! Puts are buffered in a per-keystore [`MemTable`]; once it reaches
//! `memtable_size_limit`, and again on close, the buffered entries are
//! written as a new segment by the driver's worker.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::EngineSettings;
use crate::error::{RestoreError, Result};
use crate::memtable::MemTable;
use crate::storage::SegmentSet;

use super::{Driver, DriverHandle, EngineConnection, Keystore, KeystoreEngine, ShutdownOutcome};

/// The file-backed engine
pub struct StoreEngine {
    settings: EngineSettings,
    driver: Driver,
}

impl StoreEngine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const LOCK_FILENAME: &'static str = "LOCK";

    /// Configure an engine; nothing touches disk until `connect`
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            driver: Driver::new(),
        }
    }

    /// Engine settings in effect
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Whether the driver is currently loaded
    pub fn is_loaded(&self) -> bool {
        self.driver.is_loaded()
    }
}

impl KeystoreEngine for StoreEngine {
    type Connection = StoreConnection;

    /// Load the driver, create the data directory and take its lock
    fn connect(&mut self) -> Result<StoreConnection> {
        let driver = self.driver.load()?;
        let data_dir = &self.settings.data_dir;

        fs::create_dir_all(data_dir).map_err(|e| {
            RestoreError::Engine(format!(
                "cannot create data directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;

        let lock_path = data_dir.join(Self::LOCK_FILENAME);
        let mut lock = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => RestoreError::Engine(format!(
                    "{} is locked by another connection (remove {} if stale)",
                    data_dir.display(),
                    lock_path.display()
                )),
                _ => RestoreError::Engine(format!("cannot lock {}: {}", data_dir.display(), e)),
            })?;
        writeln!(lock, "{}", std::process::id())?;

        tracing::debug!(data_dir = %data_dir.display(), "connected to keystore engine");

        Ok(StoreConnection {
            data_dir: data_dir.clone(),
            lock_path,
            memtable_size_limit: self.settings.memtable_size_limit,
            create_missing: self.settings.create_missing_keystores,
            driver,
            released: false,
        })
    }

    fn shutdown(&mut self) -> ShutdownOutcome {
        let timeout = Duration::from_millis(self.settings.unload_timeout_ms);
        self.driver.unload(timeout)
    }
}

/// A connection holding the data directory lock
pub struct StoreConnection {
    data_dir: PathBuf,
    lock_path: PathBuf,
    memtable_size_limit: usize,
    create_missing: bool,
    driver: DriverHandle,
    released: bool,
}

impl StoreConnection {
    /// Engine data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn release_lock(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match fs::remove_file(&self.lock_path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

impl EngineConnection for StoreConnection {
    type Keystore = StoreKeystore;

    fn open_keystore(&mut self, name: &str) -> Result<StoreKeystore> {
        validate_keystore_name(name)?;

        let dir = self.data_dir.join(name);
        if !dir.is_dir() && !self.create_missing {
            return Err(RestoreError::Keystore(format!(
                "keystore '{}' does not exist",
                name
            )));
        }

        let segments = SegmentSet::open(&dir).map_err(|e| {
            RestoreError::Keystore(format!("cannot open keystore '{}': {}", name, e))
        })?;

        Ok(StoreKeystore {
            name: name.to_string(),
            memtable: MemTable::new(),
            segments,
            memtable_size_limit: self.memtable_size_limit,
            driver: self.driver.clone(),
        })
    }

    fn disconnect(mut self) -> Result<()> {
        self.release_lock()?;
        tracing::debug!(data_dir = %self.data_dir.display(), "disconnected from keystore engine");
        Ok(())
    }
}

impl Drop for StoreConnection {
    fn drop(&mut self) {
        if let Err(e) = self.release_lock() {
            tracing::warn!(error = %e, "failed to release data directory lock");
        }
    }
}

/// An open keystore
pub struct StoreKeystore {
    name: String,
    memtable: MemTable,
    segments: SegmentSet,
    memtable_size_limit: usize,
    driver: DriverHandle,
}

impl StoreKeystore {
    /// Keystore name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a value; buffered puts first, then segments newest → oldest
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(value) = self.memtable.get(key) {
            return Ok(Some(value));
        }
        self.segments.get(key)
    }

    /// Write buffered puts to a new segment
    pub fn flush(&mut self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        let bytes = self.memtable.size();
        let entries = self.memtable.drain();
        let path = self.segments.allocate_path();
        let segment = self.driver.write_segment(path, entries)?;

        tracing::trace!(
            keystore = %self.name,
            path = %segment.path().display(),
            entries = segment.entry_count(),
            bytes,
            "segment written"
        );
        self.segments.install(segment);
        Ok(())
    }

    /// Number of segments on disk
    pub fn segment_count(&self) -> usize {
        self.segments.segment_count()
    }

    /// Number of keys still buffered in memory
    pub fn pending_entries(&self) -> usize {
        self.memtable.entry_count()
    }
}

impl Keystore for StoreKeystore {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        if self.memtable.put(key, value) >= self.memtable_size_limit {
            self.flush()?;
        }
        Ok(())
    }

    fn close(mut self) -> Result<()> {
        self.flush()
    }
}

/// Keystore names become directory names under the data directory
fn validate_keystore_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RestoreError::Keystore("empty keystore name".to_string()));
    }
    if name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(RestoreError::Keystore(format!(
            "invalid keystore name '{}'",
            name
        )));
    }
    Ok(())
}
