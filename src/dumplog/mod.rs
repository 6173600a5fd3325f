//! Dump Log Module
//!
//! Reads the chunked append-log files produced by the dump step.
//!
//! ## Responsibilities
//! - Discover `*.log` files in the input directory, in a stable order
//! - Validate the file header before any record is handed out
//! - Yield records chunk by chunk, in file order
//! - Detect corruption (CRC mismatch, truncated frames)
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Header                                  │
//! │ ┌───────────────┬─────────────────────┐ │
//! │ │ Magic "KVDL"  │ Version u16 (2)     │ │
//! │ └───────────────┴─────────────────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Chunk 1                                 │
//! │ ┌─────────┬─────────┬─────────────────┐ │
//! │ │ Len (4) │ CRC (4) │ Payload         │ │
//! │ └─────────┴─────────┴─────────────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Chunk 2 ...                             │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The payload is a bincode-encoded list of `(key, value)` records.
//! End of file on a chunk boundary is the terminal signal, not an error.

mod chunk;
mod discovery;
mod reader;
mod writer;

pub use chunk::{
    decode_payload, encode_chunk, Record, FILE_HEADER_SIZE, FRAME_HEADER_SIZE, MAGIC,
    MAX_CHUNK_SIZE, VERSION,
};
pub use discovery::{discover, LogFileRef, LOG_EXTENSION};
pub use reader::DumpLogReader;
pub use writer::DumpLogWriter;
