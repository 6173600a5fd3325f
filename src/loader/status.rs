//! Exit statuses and the run report

use std::fmt;

use crate::engine::ShutdownOutcome;

use super::RunState;

/// Final status of a process run, with a fixed exit code mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every dump log replayed cleanly
    Success,
    /// Malformed command line
    Usage,
    /// Engine could not be reached, or configuration could not be resolved
    Startup,
    /// Reserved; the loader never produces it
    State,
    /// The run completed but at least one keystore failed to load
    LoadErrors,
    /// Anything else, e.g. the input directory could not be listed
    Fatal,
}

impl ExitStatus {
    pub const fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Usage => 1,
            ExitStatus::Startup => 2,
            ExitStatus::State => 3,
            ExitStatus::LoadErrors => 4,
            ExitStatus::Fatal => 10,
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitStatus::Success
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitStatus::Success => "success",
            ExitStatus::Usage => "usage error",
            ExitStatus::Startup => "startup error",
            ExitStatus::State => "state error",
            ExitStatus::LoadErrors => "load errors",
            ExitStatus::Fatal => "fatal error",
        };
        write!(f, "{} (exit {})", name, self.code())
    }
}

/// A keystore that did not load, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreFailure {
    pub keystore: String,
    pub reason: String,
}

/// Everything a finished run has to say
#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: ExitStatus,
    pub state: RunState,
    /// Keystores attempted, in replay order
    pub attempted: Vec<String>,
    pub failures: Vec<KeystoreFailure>,
    pub shutdown: ShutdownOutcome,
}

impl RunReport {
    pub fn total_count(&self) -> u64 {
        self.state.total_count()
    }

    pub fn error_count(&self) -> u64 {
        self.state.error_count()
    }
}

/// One-line summary, shown at every verbosity
impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "restored {} records into {} keystores, {} errors: {}",
            self.total_count(),
            self.attempted.len(),
            self.error_count(),
            self.status
        )
    }
}
