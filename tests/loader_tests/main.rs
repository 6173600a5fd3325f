//! Recovery loader tests
//!
//! These tests verify:
//! - Abort vs keep-going policy
//! - Counter accounting across successful and failed keystores
//! - Engine shutdown exactly once on every exit path
//! - End-to-end scenarios against the file-backed engine
//! - Exit codes of the kvrestore binary


mod scenario_tests;
