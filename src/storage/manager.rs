//! Segment Set
//!
//! The segments belonging to one keystore directory.
//!
//! ## Responsibilities
//! - Discover existing segments when a keystore is opened
//! - Hand out paths for new segments
//! - Search segments newest → oldest for reads

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::Result;

use super::Segment;

/// Manages the segments of a single keystore
pub struct SegmentSet {
    /// Keystore directory
    dir: PathBuf,

    /// Open segments, ordered newest → oldest
    segments: RwLock<Vec<Segment>>,

    /// Next ID for new segments
    next_segment_id: AtomicU64,
}

impl SegmentSet {
    /// Open the segments in `dir`, creating the directory if needed
    ///
    /// Leftover `.seg.tmp` files from an interrupted flush are removed.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let mut ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.to_string_lossy().ends_with(".seg.tmp") {
                tracing::debug!(path = %path.display(), "removing incomplete segment");
                fs::remove_file(&path)?;
                continue;
            }
            if let Some(id) = Self::parse_segment_id(&path) {
                ids.push(id);
            }
        }

        // Newest first
        ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut segments = Vec::with_capacity(ids.len());
        for id in &ids {
            segments.push(Segment::open(&Self::segment_path_in(dir, *id))?);
        }

        let next_id = ids.first().map(|&id| id + 1).unwrap_or(1);

        Ok(Self {
            dir: dir.to_path_buf(),
            segments: RwLock::new(segments),
            next_segment_id: AtomicU64::new(next_id),
        })
    }

    /// Reserve the path for the next segment
    pub fn allocate_path(&self) -> PathBuf {
        let id = self.next_segment_id.fetch_add(1, Ordering::SeqCst);
        Self::segment_path_in(&self.dir, id)
    }

    /// Add a freshly written segment as the newest one
    pub fn install(&self, segment: Segment) {
        self.segments.write().insert(0, segment);
    }

    /// Get a value by key (newest segment wins)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        for segment in self.segments.read().iter() {
            if let Some(value) = segment.get(key)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Number of segments on disk
    pub fn segment_count(&self) -> usize {
        self.segments.read().len()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn segment_path_in(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("segment_{:06}.seg", id))
    }

    /// "segment_000042.seg" → Some(42)
    fn parse_segment_id(path: &Path) -> Option<u64> {
        if path.extension()? != "seg" {
            return None;
        }
        let name = path.file_stem()?.to_str()?;
        name.strip_prefix("segment_")?.parse().ok()
    }
}
