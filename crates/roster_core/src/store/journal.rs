//! Commit journal: one checksummed frame per committed transaction.
//!
//! ```text
//! +-------+---------+--------+-------------------+-------+
//! | RJNL  | version | length | CBOR JournalEntry | CRC32 |
//! | 4 B   | u16 LE  | u32 LE | `length` bytes    | u32LE |
//! +-------+---------+--------+-------------------+-------+
//! ```
//!
//! The CRC covers every byte before it. A frame whose header or body
//! runs past the end of the log is a torn write from a crash and is cut
//! off on recovery; a complete frame with a bad checksum is corruption.

use crate::error::{CoreError, CoreResult};
use crate::record::{OrderedRecord, RecordId};
use crate::store::collection::CollectionSpec;
use crate::types::{CollectionId, SequenceNumber};
use roster_storage::StorageBackend;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Magic bytes opening every frame.
pub(crate) const JOURNAL_MAGIC: [u8; 4] = *b"RJNL";

/// Current frame format version.
pub(crate) const JOURNAL_VERSION: u16 = 1;

/// magic (4) + version (2) + length (4)
const HEADER_SIZE: usize = 10;

const CRC_SIZE: usize = 4;

/// One state change inside a committed transaction.
///
/// `Put` carries the record's final state in that transaction, so replay
/// never needs the intermediate writes of a shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum JournalOp {
    RegisterCollection {
        id: CollectionId,
        spec: CollectionSpec,
    },
    Put {
        collection: CollectionId,
        record: OrderedRecord,
    },
    Delete {
        collection: CollectionId,
        id: RecordId,
    },
}

/// A committed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct JournalEntry {
    pub(crate) sequence: SequenceNumber,
    pub(crate) ops: Vec<JournalOp>,
}

/// Frames entries into a [`StorageBackend`].
pub(crate) struct Journal {
    backend: Box<dyn StorageBackend>,
    sync_on_commit: bool,
    /// Set when a failed append could not be cut back. Holds the length
    /// of the last good frame; no append is accepted until the log is
    /// back to it.
    repair_to: Option<u64>,
}

impl Journal {
    pub(crate) fn new(backend: Box<dyn StorageBackend>, sync_on_commit: bool) -> Self {
        Self {
            backend,
            sync_on_commit,
            repair_to: None,
        }
    }

    /// Appends one entry and makes it durable.
    ///
    /// On failure the log is cut back to its previous length so a
    /// half-written frame cannot hide later commits from recovery. If the
    /// cut fails too, every later append retries it first and fails
    /// while it keeps failing.
    pub(crate) fn append(&mut self, entry: &JournalEntry) -> CoreResult<u64> {
        self.repair()?;
        let frame = encode_frame(entry)?;
        let start = self.backend.size()?;

        let written = self.backend.append(&frame).and_then(|offset| {
            self.backend.flush()?;
            if self.sync_on_commit {
                self.backend.sync()?;
            }
            Ok(offset)
        });

        match written {
            Ok(offset) => Ok(offset),
            Err(err) => {
                // A short write can land bytes the backend never counted,
                // so the cut does not depend on the reported size.
                if let Err(undo) = self.backend.truncate(start) {
                    warn!(
                        error = %undo,
                        len = start,
                        "failed to cut back partial journal frame, refusing appends"
                    );
                    self.repair_to = Some(start);
                }
                Err(err.into())
            }
        }
    }

    /// Cuts off a frame left behind by an earlier failed append.
    fn repair(&mut self) -> CoreResult<()> {
        let Some(len) = self.repair_to else {
            return Ok(());
        };
        if let Err(err) = self.backend.truncate(len) {
            warn!(error = %err, len, "journal still holds a partial frame");
            return Err(err.into());
        }
        info!(len, "cut back partial journal frame");
        self.repair_to = None;
        Ok(())
    }

    /// Reads every complete entry, cutting off a torn trailing frame.
    pub(crate) fn read_all(&mut self) -> CoreResult<Vec<JournalEntry>> {
        let size = self.backend.size()?;
        let mut entries = Vec::new();
        let mut offset = 0u64;

        while offset < size {
            let remaining = size - offset;
            if remaining < (HEADER_SIZE + CRC_SIZE) as u64 {
                self.cut_torn_tail(offset, size)?;
                break;
            }

            let header = self.backend.read_at(offset, HEADER_SIZE)?;
            if header[0..4] != JOURNAL_MAGIC {
                return Err(CoreError::journal_corruption(offset, "bad frame magic"));
            }
            let version = u16::from_le_bytes([header[4], header[5]]);
            if version != JOURNAL_VERSION {
                return Err(CoreError::journal_corruption(
                    offset,
                    format!("unsupported frame version {version}"),
                ));
            }
            let len = u32::from_le_bytes([header[6], header[7], header[8], header[9]]) as usize;
            let frame_len = (HEADER_SIZE + len + CRC_SIZE) as u64;
            if frame_len > remaining {
                self.cut_torn_tail(offset, size)?;
                break;
            }

            let frame = self.backend.read_at(offset, frame_len as usize)?;
            let body_end = HEADER_SIZE + len;
            let stored = u32::from_le_bytes([
                frame[body_end],
                frame[body_end + 1],
                frame[body_end + 2],
                frame[body_end + 3],
            ]);
            let actual = crc32fast::hash(&frame[..body_end]);
            if stored != actual {
                return Err(CoreError::journal_corruption(
                    offset,
                    format!("checksum mismatch: expected {stored:08x}, got {actual:08x}"),
                ));
            }

            let entry: JournalEntry = ciborium::from_reader(&frame[HEADER_SIZE..body_end])
                .map_err(|e| CoreError::journal_corruption(offset, e.to_string()))?;
            entries.push(entry);
            offset += frame_len;
        }

        Ok(entries)
    }

    /// Replaces the whole journal with a single entry.
    pub(crate) fn rewrite(&mut self, entry: &JournalEntry) -> CoreResult<()> {
        let frame = encode_frame(entry)?;
        self.backend.replace(&frame)?;
        self.repair_to = None;
        Ok(())
    }

    /// Returns the journal length in bytes.
    pub(crate) fn size(&self) -> CoreResult<u64> {
        Ok(self.backend.size()?)
    }

    fn cut_torn_tail(&mut self, offset: u64, size: u64) -> CoreResult<()> {
        warn!(
            offset,
            dropped_bytes = size - offset,
            "discarding torn journal frame"
        );
        self.backend.truncate(offset)?;
        Ok(())
    }
}

fn encode_frame(entry: &JournalEntry) -> CoreResult<Vec<u8>> {
    let mut body = Vec::new();
    ciborium::into_writer(entry, &mut body).map_err(|e| CoreError::codec(e.to_string()))?;
    let len = u32::try_from(body.len())
        .map_err(|_| CoreError::invalid_operation("journal entry too large"))?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + body.len() + CRC_SIZE);
    frame.extend_from_slice(&JOURNAL_MAGIC);
    frame.extend_from_slice(&JOURNAL_VERSION.to_le_bytes());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&body);
    let crc = crc32fast::hash(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    Ok(frame)
}
