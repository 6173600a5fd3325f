//! Dump log tests
//!
//! These tests verify:
//! - Reading chunks written by the writer, in order
//! - End of file as a terminal signal
//! - Corruption detection (header, truncation, CRC)
//! - Discovery order and keystore naming

mod reader_tests;
