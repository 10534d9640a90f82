//! Packet model and wire format for Glyphcast transfers.
//!
//! A transfer moves one file across a one-way barcode channel as a series
//! of independently verifiable [`Packet`]s. This crate owns the value model,
//! the compact JSON record each packet travels as, and the symbol capacity
//! table used to validate chunk sizes before building.

pub mod capacity;
pub mod constants;
pub mod packet;
pub mod wire;

// Re-export primary types for convenience.
pub use capacity::{CorrectionLevel, PayloadCapacity, QR_BYTE_CAPACITY, QrCapacityTable};
pub use constants::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MAX_FILE_SIZE};
pub use packet::{Packet, TransferId, expected_total_pieces};

/// Errors produced while encoding or decoding wire records.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown correction level: {0}")]
    UnknownCorrection(String),
}
