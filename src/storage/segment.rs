//! Segment files
//!
//! A segment keeps only its key index in memory; values are read from
//! disk on lookup.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{RestoreError, Result};

use super::{FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// An immutable on-disk segment
pub struct Segment {
    path: PathBuf,
    /// key → (value offset, value length)
    index: BTreeMap<Vec<u8>, (u64, u32)>,
    file: Mutex<BufReader<File>>,
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("path", &self.path)
            .field("entries", &self.index.len())
            .finish()
    }
}

impl Segment {
    /// Write sorted entries to `path` and open the result
    ///
    /// Data goes to a temporary file first and is renamed into place after
    /// an fsync, so a crash never leaves a half-written segment under the
    /// final name.
    pub fn write(path: &Path, entries: &[(Vec<u8>, Vec<u8>)]) -> Result<Self> {
        let tmp_path = path.with_extension("seg.tmp");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&(entries.len() as u64).to_le_bytes())?;

        let mut hasher = crc32fast::Hasher::new();
        let mut index = BTreeMap::new();
        let mut offset = HEADER_SIZE;

        for (key, value) in entries {
            let value_len = u32::try_from(value.len()).map_err(|_| {
                RestoreError::Keystore(format!("value of {} bytes too large", value.len()))
            })?;
            let key_len = u32::try_from(key.len()).map_err(|_| {
                RestoreError::Keystore(format!("key of {} bytes too large", key.len()))
            })?;

            let key_len_bytes = key_len.to_le_bytes();
            let value_len_bytes = value_len.to_le_bytes();
            let parts: [&[u8]; 4] = [&key_len_bytes, &value_len_bytes, key, value];
            for part in parts {
                writer.write_all(part)?;
                hasher.update(part);
            }

            let value_offset = offset + 8 + key.len() as u64;
            index.insert(key.clone(), (value_offset, value_len));
            offset = value_offset + value.len() as u64;
        }

        writer.write_all(&hasher.finalize().to_le_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);

        fs::rename(&tmp_path, path)?;

        Ok(Self {
            path: path.to_path_buf(),
            index,
            file: Mutex::new(BufReader::new(File::open(path)?)),
        })
    }

    /// Open an existing segment, rebuilding its index and checking its CRC
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(corrupt(path, "file shorter than header and footer"));
        }

        let mut reader = BufReader::new(file);

        let mut header = [0u8; HEADER_SIZE as usize];
        reader.read_exact(&mut header)?;
        if &header[0..4] != MAGIC {
            return Err(corrupt(path, "invalid magic"));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(corrupt(path, &format!("unsupported version {}", version)));
        }
        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&header[6..14]);
        let entry_count = u64::from_le_bytes(count_bytes);

        let block_end = file_size - FOOTER_SIZE;
        let mut hasher = crc32fast::Hasher::new();
        let mut index = BTreeMap::new();
        let mut offset = HEADER_SIZE;

        for _ in 0..entry_count {
            if offset + 8 > block_end {
                return Err(corrupt(path, "entry header past end of entry block"));
            }
            let mut lens = [0u8; 8];
            reader.read_exact(&mut lens)?;
            hasher.update(&lens);

            let key_len = u32::from_le_bytes([lens[0], lens[1], lens[2], lens[3]]);
            let value_len = u32::from_le_bytes([lens[4], lens[5], lens[6], lens[7]]);

            let value_offset = offset + 8 + key_len as u64;
            let next = value_offset + value_len as u64;
            if next > block_end {
                return Err(corrupt(path, "entry past end of entry block"));
            }

            let mut key = vec![0u8; key_len as usize];
            reader.read_exact(&mut key)?;
            hasher.update(&key);

            let mut value = vec![0u8; value_len as usize];
            reader.read_exact(&mut value)?;
            hasher.update(&value);

            index.insert(key, (value_offset, value_len));
            offset = next;
        }

        if offset != block_end {
            return Err(corrupt(path, "trailing bytes after last entry"));
        }

        let mut footer = [0u8; FOOTER_SIZE as usize];
        reader.read_exact(&mut footer)?;
        if u32::from_le_bytes(footer) != hasher.finalize() {
            return Err(corrupt(path, "CRC mismatch"));
        }

        Ok(Self {
            path: path.to_path_buf(),
            index,
            file: Mutex::new(reader),
        })
    }

    /// Look up a value
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let Some(&(offset, len)) = self.index.get(key) else {
            return Ok(None);
        };

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        let mut value = vec![0u8; len as usize];
        file.read_exact(&mut value)?;
        Ok(Some(value))
    }

    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn corrupt(path: &Path, reason: &str) -> RestoreError {
    RestoreError::Keystore(format!("corrupt segment {}: {}", path.display(), reason))
}
