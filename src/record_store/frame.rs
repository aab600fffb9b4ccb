//! Journal frame encoding
//!
//! Every journal entry is written as one self-delimiting frame:
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE, includes length and checksum fields)
//! +------------------+
//! | Entry Body       | (JSON)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 over length + body)
//! +------------------+
//! ```

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use super::errors::{RecordStoreError, RecordStoreResult};
use super::record::Record;

const HEADER_LEN: usize = 4;
const TRAILER_LEN: usize = 4;
const MIN_FRAME_LEN: usize = HEADER_LEN + TRAILER_LEN + 2; // "{}" is the smallest body

/// One journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum JournalEntry {
    /// Full image of a record after a write
    Upsert { record: Record },
    /// The record with this key was deleted
    Tombstone { id: String },
}

impl JournalEntry {
    /// Key the entry applies to
    pub fn id(&self) -> &str {
        match self {
            JournalEntry::Upsert { record } => &record.id,
            JournalEntry::Tombstone { id } => id,
        }
    }
}

/// CRC32 (IEEE) over `data`
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Encode an entry into a frame
pub fn encode(entry: &JournalEntry) -> RecordStoreResult<Vec<u8>> {
    let body = serde_json::to_vec(entry)?;
    let frame_len = (HEADER_LEN + body.len() + TRAILER_LEN) as u32;

    let mut frame = Vec::with_capacity(frame_len as usize);
    frame.extend_from_slice(&frame_len.to_le_bytes());
    frame.extend_from_slice(&body);
    let checksum = compute_checksum(&frame);
    frame.extend_from_slice(&checksum.to_le_bytes());

    Ok(frame)
}

/// Decode the frame starting at the beginning of `data`.
///
/// Returns the entry and the number of bytes consumed. `offset` is only
/// used for error reporting.
pub fn decode(data: &[u8], offset: u64) -> RecordStoreResult<(JournalEntry, usize)> {
    let corrupt = |detail: String| RecordStoreError::Corruption { offset, detail };

    if data.len() < MIN_FRAME_LEN {
        return Err(corrupt(format!(
            "Truncated frame: {} bytes remaining, minimum frame size is {}",
            data.len(),
            MIN_FRAME_LEN
        )));
    }

    let frame_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if frame_len < MIN_FRAME_LEN {
        return Err(corrupt(format!("Invalid frame length: {}", frame_len)));
    }
    if frame_len > data.len() {
        return Err(corrupt(format!(
            "Frame length {} exceeds remaining journal size {}",
            frame_len,
            data.len()
        )));
    }

    let checked = &data[..frame_len - TRAILER_LEN];
    let trailer = &data[frame_len - TRAILER_LEN..frame_len];
    let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let actual = compute_checksum(checked);
    if actual != expected {
        return Err(corrupt(format!(
            "Checksum mismatch: expected {:08x}, computed {:08x}",
            expected, actual
        )));
    }

    let entry: JournalEntry = serde_json::from_slice(&checked[HEADER_LEN..])
        .map_err(|e| corrupt(format!("Undecodable entry: {}", e)))?;

    Ok((entry, frame_len))
}
