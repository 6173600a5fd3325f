//! Recovery Loader
//!
//! Replays every dump log in the input directory into its keystore.
//!
//! ## Run
//! 1. Connect to the engine (failure: startup error, nothing replayed)
//! 2. Discover `*.log` files, sorted by name
//! 3. Replay each file into the keystore named after it
//! 4. On a failed keystore: keep going, or stop if `keep_going` is off
//! 5. Disconnect and unload the engine, on every path
//!
//! Replay is strictly sequential: one keystore at a time, records in log
//! order.

mod session;
mod state;
mod status;

pub use state::RunState;
pub use status::{ExitStatus, KeystoreFailure, RunReport};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::config::RunConfig;
use crate::dumplog::{discover, DumpLogReader, LogFileRef};
use crate::engine::{EngineConnection, Keystore, KeystoreEngine};
use crate::error::{RestoreError, Result};

use session::EngineSession;

/// Drives one recovery run against an engine
pub struct Loader<E: KeystoreEngine> {
    engine: E,
    config: RunConfig,
}

impl<E: KeystoreEngine> Loader<E> {
    pub fn new(engine: E, config: RunConfig) -> Self {
        Self { engine, config }
    }

    /// Run the recovery to completion
    ///
    /// Never fails: every error ends up in the returned report, and the
    /// engine has been shut down by the time this returns.
    pub fn run(&mut self) -> RunReport {
        let config = &self.config;
        tracing::debug!(?config, "run configuration");

        let mut state = RunState::new(config.verbosity, config.keep_going);
        let mut attempted = Vec::new();
        let mut failures = Vec::new();

        let mut session = EngineSession::new(&mut self.engine);
        let status = match session.connect() {
            Err(e) => {
                tracing::error!(error = %e, "cannot connect to keystore engine");
                ExitStatus::Startup
            }
            Ok(connection) => match discover(&config.input_dir) {
                Err(e) => {
                    tracing::error!(
                        dir = %config.input_dir.display(),
                        error = %e,
                        "cannot list dump logs"
                    );
                    ExitStatus::Fatal
                }
                Ok(logs) => {
                    tracing::info!(
                        dir = %config.input_dir.display(),
                        count = logs.len(),
                        "found dump logs"
                    );
                    replay_all(connection, &logs, &mut state, &mut attempted, &mut failures)
                }
            },
        };
        let shutdown = session.close();

        if state.error_count() == 0 && status.is_success() {
            tracing::info!(
                total = state.total_count(),
                errors = state.error_count(),
                "restore complete"
            );
        } else {
            tracing::error!(
                total = state.total_count(),
                errors = state.error_count(),
                status = %status,
                "restore finished with errors"
            );
        }

        RunReport {
            status,
            state,
            attempted,
            failures,
            shutdown,
        }
    }

    /// The engine, e.g. to inspect keystores after a run
    pub fn engine(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }
}

/// Fold the ordered log list into the run state
fn replay_all<C: EngineConnection>(
    connection: &mut C,
    logs: &[LogFileRef],
    state: &mut RunState,
    attempted: &mut Vec<String>,
    failures: &mut Vec<KeystoreFailure>,
) -> ExitStatus {
    for (i, log) in logs.iter().enumerate() {
        attempted.push(log.keystore().to_string());

        let outcome = replay(connection, log, state);
        let contributed = state.finish_keystore(outcome.is_ok());

        match outcome {
            Ok(_) => {
                tracing::info!(keystore = log.keystore(), records = contributed, "keystore loaded");
            }
            Err(e) => {
                tracing::error!(
                    keystore = log.keystore(),
                    records = contributed,
                    error = %e,
                    "keystore failed to load"
                );
                failures.push(KeystoreFailure {
                    keystore: log.keystore().to_string(),
                    reason: e.to_string(),
                });

                if !state.keep_going() {
                    let skipped = logs.len() - i - 1;
                    if skipped > 0 {
                        tracing::error!(skipped, "aborting run; remaining dump logs not replayed");
                    }
                    break;
                }
            }
        }
    }

    if state.error_count() == 0 {
        ExitStatus::Success
    } else {
        ExitStatus::LoadErrors
    }
}

/// Replay one dump log into its keystore
///
/// Returns the number of records put. Any failure (open, read, put,
/// close, or a panic inside the engine) comes back as `Err`; the reader is
/// released and the keystore closed before returning either way.
pub fn replay<C: EngineConnection>(
    connection: &mut C,
    log: &LogFileRef,
    state: &mut RunState,
) -> Result<u64> {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Result<u64> {
        let mut keystore = connection.open_keystore(log.keystore())?;
        let drained = drain(&mut keystore, log, state);
        let closed = keystore.close();
        drained?;
        closed.map_err(|e| RestoreError::Load(format!("close failed: {}", e)))?;
        Ok(state.processed_count())
    }));

    match attempt {
        Ok(result) => result,
        Err(payload) => Err(RestoreError::Load(format!(
            "engine panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn drain<K: Keystore>(keystore: &mut K, log: &LogFileRef, state: &mut RunState) -> Result<()> {
    let mut reader = DumpLogReader::open(log.path())?;

    while let Some(records) = reader.next_chunk()? {
        tracing::trace!(
            keystore = log.keystore(),
            chunk = reader.chunks_read(),
            records = records.len(),
            "replaying chunk"
        );
        for (key, value) in records {
            keystore.put(key, value).map_err(|e| {
                RestoreError::Load(format!(
                    "put failed after {} records: {}",
                    state.processed_count(),
                    e
                ))
            })?;
            state.record_put();
        }
    }

    tracing::debug!(
        keystore = log.keystore(),
        path = %reader.path().display(),
        chunks = reader.chunks_read(),
        records = reader.records_read(),
        "dump log drained"
    );
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
