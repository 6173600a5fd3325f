//! Run counters

/// Counters and policy for one recovery run
///
/// `processed` counts puts into the keystore currently being replayed and
/// is folded into `total` exactly once per finished dump log, whether the
/// log loaded cleanly or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    processed: u64,
    total: u64,
    errors: u64,
    verbosity: u8,
    keep_going: bool,
}

impl RunState {
    pub fn new(verbosity: u8, keep_going: bool) -> Self {
        Self {
            processed: 0,
            total: 0,
            errors: 0,
            verbosity,
            keep_going,
        }
    }

    /// Count one successful put
    pub fn record_put(&mut self) {
        self.processed += 1;
    }

    /// Close the books on the current keystore
    ///
    /// Returns the number of records it contributed.
    pub fn finish_keystore(&mut self, succeeded: bool) -> u64 {
        let contributed = self.processed;
        self.total += contributed;
        self.processed = 0;
        if !succeeded {
            self.errors += 1;
        }
        contributed
    }

    /// Puts into the keystore currently being replayed
    pub fn processed_count(&self) -> u64 {
        self.processed
    }

    /// Puts across the whole run
    pub fn total_count(&self) -> u64 {
        self.total
    }

    /// Keystores that failed to load
    pub fn error_count(&self) -> u64 {
        self.errors
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    pub fn keep_going(&self) -> bool {
        self.keep_going
    }
}
