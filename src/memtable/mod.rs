//! MemTable Module
//!
//! In-memory buffer for a keystore's pending puts.
//!
//! ## Responsibilities
//! - Absorb puts without touching disk
//! - Keep keys ordered so a flush produces a sorted segment
//! - Track approximate size for the flush trigger
//!
//! Later puts of the same key overwrite earlier ones, matching the replay
//! order of the dump log.

mod table;

pub use table::MemTable;
