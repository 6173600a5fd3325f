//! # kvrestore
//!
//! Crash-recovery loader: replays the key/value records captured in dump
//! log files back into the keystores they came from.
//! - One dump log per keystore (`users.log` → keystore `users`)
//! - Strictly sequential replay, in file-name order
//! - Keep-going or abort-on-first-failure policy
//! - Engine always disconnected and unloaded, whatever happened
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CLI / RunConfig                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Recovery Loader                           │
//! │        (discover → replay each log → report → unload)       │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │    Dump Log     │                │ Keystore Engine │
//!   │ (chunk reader)  │                │ (driver thread) │
//!   └─────────────────┘                └────────┬────────┘
//!                                               │
//!                                      ┌────────▼────────┐
//!                                      │ MemTable → Seg- │
//!                                      │ ment files      │
//!                                      └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod logging;
pub mod cli;

pub mod dumplog;
pub mod memtable;
pub mod storage;
pub mod engine;
pub mod loader;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RestoreError, Result};
pub use config::{EngineSettings, RunConfig};
pub use engine::StoreEngine;
pub use loader::{ExitStatus, Loader, RunReport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvrestore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
