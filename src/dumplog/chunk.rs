//! Chunk framing
//!
//! Encoding and validation for the file header and chunk frames.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{RestoreError, Result};

/// A single `(key, value)` record
pub type Record = (Vec<u8>, Vec<u8>);

/// Magic bytes identifying a dump log file
pub const MAGIC: &[u8; 4] = b"KVDL";

/// Current dump log format version
pub const VERSION: u16 = 1;

/// File header size: Magic (4) + Version (2)
pub const FILE_HEADER_SIZE: usize = 6;

/// Frame header size: PayloadLen (4) + CRC (4)
pub const FRAME_HEADER_SIZE: usize = 8;

/// Largest payload a single chunk may carry (64 MB)
pub const MAX_CHUNK_SIZE: u32 = 64 * 1024 * 1024;

/// Encode the file header
pub(crate) fn encode_file_header() -> [u8; FILE_HEADER_SIZE] {
    let mut header = [0u8; FILE_HEADER_SIZE];
    header[0..4].copy_from_slice(MAGIC);
    header[4..6].copy_from_slice(&VERSION.to_le_bytes());
    header
}

/// Validate a file header read from disk
pub(crate) fn check_file_header(header: &[u8; FILE_HEADER_SIZE]) -> Result<()> {
    if &header[0..4] != MAGIC {
        return Err(RestoreError::LogCorruption(format!(
            "invalid magic: expected KVDL, got {:?}",
            &header[0..4]
        )));
    }

    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != VERSION {
        return Err(RestoreError::LogCorruption(format!(
            "unsupported dump log version: {}",
            version
        )));
    }

    Ok(())
}

/// Encode one chunk frame: [len][crc][payload]
pub fn encode_chunk(records: &[Record]) -> Result<Bytes> {
    let payload = bincode::serialize(records)?;
    if payload.len() > MAX_CHUNK_SIZE as usize {
        return Err(RestoreError::Serialization(format!(
            "chunk payload of {} bytes exceeds limit of {}",
            payload.len(),
            MAX_CHUNK_SIZE
        )));
    }

    let mut frame = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
    frame.put_u32_le(payload.len() as u32);
    frame.put_u32_le(crc32fast::hash(&payload));
    frame.put_slice(&payload);
    Ok(frame.freeze())
}

/// Split a frame header into (payload_len, crc)
pub(crate) fn decode_frame_header(mut header: &[u8]) -> Result<(u32, u32)> {
    let len = header.get_u32_le();
    let crc = header.get_u32_le();

    if len > MAX_CHUNK_SIZE {
        return Err(RestoreError::LogCorruption(format!(
            "chunk length {} exceeds limit of {}",
            len, MAX_CHUNK_SIZE
        )));
    }
    Ok((len, crc))
}

/// Verify and decode a chunk payload
pub fn decode_payload(payload: &[u8], expected_crc: u32) -> Result<Vec<Record>> {
    let actual = crc32fast::hash(payload);
    if actual != expected_crc {
        return Err(RestoreError::LogCorruption(format!(
            "chunk CRC mismatch: expected {:#010x}, got {:#010x}",
            expected_crc, actual
        )));
    }

    bincode::deserialize(payload)
        .map_err(|e| RestoreError::LogCorruption(format!("undecodable chunk: {}", e)))
}
