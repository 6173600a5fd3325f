//! Dump log discovery
//!
//! Finds the `*.log` files in a directory and derives the keystore each
//! one restores into.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Extension (without the dot) that marks a dump log
pub const LOG_EXTENSION: &str = "log";

/// One discovered dump log and its target keystore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileRef {
    path: PathBuf,
    keystore: String,
}

impl LogFileRef {
    /// Build a reference from a path ending in `.log`
    ///
    /// "dir/users.log" → keystore "users". Returns `None` for other
    /// extensions and for names that are not valid UTF-8.
    pub fn from_path(path: &Path) -> Option<Self> {
        if path.extension()? != LOG_EXTENSION {
            return None;
        }
        let keystore = path.file_stem()?.to_str()?;
        if keystore.is_empty() {
            return None;
        }
        Some(Self {
            path: path.to_path_buf(),
            keystore: keystore.to_string(),
        })
    }

    /// Path of the dump log
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keystore the log restores into
    pub fn keystore(&self) -> &str {
        &self.keystore
    }
}

/// List dump logs directly inside `dir`, sorted by file name
///
/// Subdirectories are not searched.
pub fn discover(dir: &Path) -> Result<Vec<LogFileRef>> {
    let mut logs = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        match LogFileRef::from_path(&path) {
            Some(log) => logs.push(log),
            None if path.extension().is_some_and(|ext| ext == LOG_EXTENSION) => {
                tracing::warn!(path = %path.display(), "skipping dump log with non UTF-8 name");
            }
            None => {}
        }
    }

    logs.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(logs)
}
