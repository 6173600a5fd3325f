//! Storage Module
//!
//! Persistent storage for a keystore: a directory of immutable, sorted
//! segment files written whenever a keystore's memtable is flushed.
//!
//! ## Responsibilities
//! - Write a sorted batch of entries as one segment (atomically, via rename)
//! - Rediscover segments when a keystore is reopened
//! - Point lookups, newest segment first
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "KVSG" (4) | Version: u16 (2) | Count: u64 (8) │
//! ├─────────────────────────────────────────────────────────┤
//! │ Entry Block (variable)                                  │
//! │   [KeyLen: u32][ValLen: u32][Key][Value]                │
//! │   ... repeated for each entry, in key order ...         │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (4 bytes)                                        │
//! │   EntryBlockCRC: u32                                    │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod manager;
mod segment;

pub use manager::SegmentSet;
pub use segment::Segment;

// =============================================================================
// Shared Constants
// =============================================================================

/// Magic bytes identifying a segment file
pub(crate) const MAGIC: &[u8; 4] = b"KVSG";

/// Current segment format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + EntryCount (8) = 14 bytes
pub(crate) const HEADER_SIZE: u64 = 14;

/// Footer size: EntryBlockCRC (4)
pub(crate) const FOOTER_SIZE: u64 = 4;
