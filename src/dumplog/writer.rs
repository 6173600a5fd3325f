//! Dump Log Writer
//!
//! Produces files in the dump log format. The loader never writes logs;
//! this exists so fixtures and benchmarks use the real encoding.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

use super::chunk::{encode_chunk, encode_file_header};
use super::Record;

/// Writes chunks to a new dump log file
pub struct DumpLogWriter {
    writer: BufWriter<File>,
    chunks_written: u64,
    records_written: u64,
}

impl DumpLogWriter {
    /// Create (or truncate) a dump log and write its header
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);
        writer.write_all(&encode_file_header())?;

        Ok(Self {
            writer,
            chunks_written: 0,
            records_written: 0,
        })
    }

    /// Append one chunk of records
    pub fn append_chunk(&mut self, records: &[Record]) -> Result<()> {
        let frame = encode_chunk(records)?;
        self.writer.write_all(&frame)?;
        self.chunks_written += 1;
        self.records_written += records.len() as u64;
        Ok(())
    }

    /// Flush and sync; returns the number of records written
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(self.records_written)
    }

    /// Chunks appended so far
    pub fn chunks_written(&self) -> u64 {
        self.chunks_written
    }
}
