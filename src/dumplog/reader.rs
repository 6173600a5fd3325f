//! Dump Log Reader
//!
//! Sequential, read-only access to a dump log file. The file handle is
//! released when the reader is dropped.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use crate::error::{RestoreError, Result};

use super::chunk::{check_file_header, decode_frame_header, decode_payload};
use super::{Record, FILE_HEADER_SIZE, FRAME_HEADER_SIZE};

/// Reads chunks from a dump log file
pub struct DumpLogReader {
    path: PathBuf,
    reader: BufReader<File>,
    chunks_read: u64,
    records_read: u64,
}

impl DumpLogReader {
    /// Open a dump log and validate its header
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut header = [0u8; FILE_HEADER_SIZE];
        let n = read_full(&mut reader, &mut header)?;
        if n < FILE_HEADER_SIZE {
            return Err(RestoreError::LogCorruption(format!(
                "truncated header in {} ({} of {} bytes)",
                path.display(),
                n,
                FILE_HEADER_SIZE
            )));
        }
        check_file_header(&header)?;

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            chunks_read: 0,
            records_read: 0,
        })
    }

    /// Read the next chunk
    ///
    /// Returns `Ok(None)` at end of file. A frame cut short anywhere past
    /// its first byte is corruption.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<Record>>> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        match read_full(&mut self.reader, &mut header)? {
            0 => return Ok(None),
            n if n < FRAME_HEADER_SIZE => {
                return Err(RestoreError::LogCorruption(format!(
                    "truncated chunk header after chunk {} in {}",
                    self.chunks_read,
                    self.path.display()
                )));
            }
            _ => {}
        }

        let (len, crc) = decode_frame_header(&header)?;

        let mut payload = vec![0u8; len as usize];
        let n = read_full(&mut self.reader, &mut payload)?;
        if n < payload.len() {
            return Err(RestoreError::LogCorruption(format!(
                "truncated chunk {} in {} ({} of {} bytes)",
                self.chunks_read + 1,
                self.path.display(),
                n,
                len
            )));
        }

        let records = decode_payload(&payload, crc)?;
        self.chunks_read += 1;
        self.records_read += records.len() as u64;
        Ok(Some(records))
    }

    /// Path this reader was opened on
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Chunks successfully read so far
    pub fn chunks_read(&self) -> u64 {
        self.chunks_read
    }

    /// Records successfully read so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }
}

/// Fill `buf` as far as the source allows, returning the byte count
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
