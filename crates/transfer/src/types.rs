use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use glyphcast_protocol::TransferId;

use crate::pieces::PieceSet;

/// Result of feeding one packet to the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessStatus {
    /// The piece was stored (and may have completed the file).
    Accepted,
    /// The piece had already been received.
    Duplicate,
    /// Structural fields or payload bounds were inconsistent.
    InvalidMetadata,
    /// The payload did not match its own checksum.
    InvalidChecksum,
    /// Every piece arrived but the reassembled file failed its checksum.
    /// All progress for the transfer was discarded.
    InvalidFileChecksum,
}

impl ProcessStatus {
    /// Returns `true` for statuses that reject the packet.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, ProcessStatus::Accepted | ProcessStatus::Duplicate)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessStatus::Accepted => "accepted",
            ProcessStatus::Duplicate => "duplicate",
            ProcessStatus::InvalidMetadata => "invalid metadata",
            ProcessStatus::InvalidChecksum => "invalid checksum",
            ProcessStatus::InvalidFileChecksum => "invalid file checksum",
        };
        f.write_str(s)
    }
}

/// Status plus a fresh projection of the transfer it touched.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub status: ProcessStatus,
    /// `None` when the transfer id is unknown and no state could be created
    /// for it (structurally invalid packet or failed allocation).
    pub snapshot: Option<Snapshot>,
    /// Present when this packet completed the transfer.
    pub file: Option<Arc<AssembledFile>>,
}

/// Immutable progress projection of one transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub transfer_id: TransferId,
    pub file_name: String,
    pub file_size: u64,
    pub chunk_size: u32,
    pub correction_tag: String,
    pub file_checksum: u32,
    pub total_pieces: u32,
    pub received_pieces: u32,
    pub received_bytes: u64,
    /// Pieces rejected for a bad payload checksum or bad bounds.
    pub invalid_pieces: u32,
    /// Whole-file checksum mismatches after apparent completion.
    pub checksum_failures: u32,
    /// Times the transfer was re-created because a packet carried different
    /// metadata under the same id.
    pub metadata_resets: u32,
    pub completed: bool,
    pub last_updated: DateTime<Utc>,
    pub(crate) pieces: PieceSet,
}

impl Snapshot {
    /// Piece indices not yet received, ascending.
    pub fn missing_pieces(&self) -> Vec<u32> {
        self.pieces.missing().collect()
    }

    /// Returns `true` if `index` has been received.
    pub fn has_piece(&self, index: u32) -> bool {
        self.pieces.contains(index)
    }

    /// Fraction of pieces received, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.total_pieces == 0 {
            return 0.0;
        }
        f64::from(self.received_pieces) / f64::from(self.total_pieces)
    }
}

/// A completely received and verified file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFile {
    pub transfer_id: TransferId,
    pub file_name: String,
    pub file_size: u64,
    pub chunk_size: u32,
    pub correction_tag: String,
    pub file_checksum: u32,
    pub data: Vec<u8>,
}
