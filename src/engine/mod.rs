//! Engine Module
//!
//! The keystore engine the loader replays into.
//!
//! ## Contract
//! The loader only needs three capabilities, expressed as traits so it can
//! drive any engine:
//! - [`KeystoreEngine`]: connect, and unload the engine's driver
//! - [`EngineConnection`]: open a named keystore, disconnect
//! - [`Keystore`]: put, close
//!
//! ## Lifecycle
//! ```text
//!   connect ──► open_keystore ──► put* ──► close ──► ... ──► disconnect ──► shutdown
//!                                                                           (unload driver)
//! ```
//! `shutdown` is more than dropping the connection: it asks the driver to
//! release its resources and waits, bounded, for the acknowledgement.

mod driver;
mod store;

pub use driver::{Driver, DriverHandle, Signal};
pub use store::{StoreConnection, StoreEngine, StoreKeystore};

use crate::error::Result;

/// An engine that hands out connections
pub trait KeystoreEngine {
    type Connection: EngineConnection;

    /// Establish a connection, loading the driver if needed
    fn connect(&mut self) -> Result<Self::Connection>;

    /// Unload the driver; a no-op when nothing is loaded
    fn shutdown(&mut self) -> ShutdownOutcome;
}

/// A live connection to an engine
pub trait EngineConnection {
    type Keystore: Keystore;

    /// Open (or create) a named keystore
    fn open_keystore(&mut self, name: &str) -> Result<Self::Keystore>;

    /// Release the connection
    fn disconnect(self) -> Result<()>;
}

/// An open keystore
pub trait Keystore {
    /// Insert one record
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// Make all puts durable and release the handle
    fn close(self) -> Result<()>;
}

/// How a shutdown request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The driver acknowledged the unload
    Unloaded,

    /// Nothing was loaded
    NotLoaded,

    /// Anything else: a foreign signal, a timeout, a dead worker
    Unexpected(String),
}

impl ShutdownOutcome {
    /// True unless the unload went sideways
    pub fn is_clean(&self) -> bool {
        !matches!(self, ShutdownOutcome::Unexpected(_))
    }
}
