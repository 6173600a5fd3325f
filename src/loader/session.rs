//! Engine session guard
//!
//! Wraps the engine for the duration of a run. Disconnect and shutdown
//! happen exactly once: through `close`, or on drop if the run unwinds.

use crate::engine::{EngineConnection, KeystoreEngine, ShutdownOutcome};
use crate::error::Result;

pub(crate) struct EngineSession<'e, E: KeystoreEngine> {
    engine: &'e mut E,
    connection: Option<E::Connection>,
    shutdown: Option<ShutdownOutcome>,
}

impl<'e, E: KeystoreEngine> EngineSession<'e, E> {
    pub(crate) fn new(engine: &'e mut E) -> Self {
        Self {
            engine,
            connection: None,
            shutdown: None,
        }
    }

    /// Connect; the connection stays owned by the session
    pub(crate) fn connect(&mut self) -> Result<&mut E::Connection> {
        let connection = self.engine.connect()?;
        Ok(self.connection.insert(connection))
    }

    /// Disconnect (if connected) and shut the engine down
    pub(crate) fn close(&mut self) -> ShutdownOutcome {
        if let Some(outcome) = &self.shutdown {
            return outcome.clone();
        }

        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.disconnect() {
                tracing::warn!(error = %e, "disconnect failed");
            }
        }

        let outcome = self.engine.shutdown();
        match &outcome {
            ShutdownOutcome::Unloaded => tracing::debug!("engine shut down"),
            ShutdownOutcome::NotLoaded => tracing::debug!("engine shutdown: nothing loaded"),
            ShutdownOutcome::Unexpected(reason) => {
                tracing::warn!(%reason, "engine shutdown completed with unexpected signal")
            }
        }
        self.shutdown = Some(outcome.clone());
        outcome
    }
}

impl<'e, E: KeystoreEngine> Drop for EngineSession<'e, E> {
    fn drop(&mut self) {
        if self.shutdown.is_none() {
            self.close();
        }
    }
}
