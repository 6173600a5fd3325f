//! Keystore engine tests
//!
//! These tests verify:
//! - MemTable buffering and size tracking
//! - Segment write/open round trips and corruption checks
//! - StoreEngine connect/lock/disconnect lifecycle
//! - Keystore put/flush/close durability
//! - Driver unload on shutdown

mod segment_tests;
