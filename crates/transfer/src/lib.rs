//! Splitting files into barcode-sized packets and reassembling them.
//!
//! The sender side is [`build`]: a pure transformation from file bytes to an
//! ordered list of packets. The receiver side is the [`Assembler`], which
//! accepts packets in any order, with duplicates and corruption, and reports
//! a typed [`ProcessStatus`] for each one.

mod assembler;
mod builder;
pub mod checksum;
mod output;
mod pieces;
mod types;

pub use assembler::Assembler;
pub use builder::{build, validate_chunk_size};
pub use output::{validate_file_name, write_assembled};
pub use pieces::PieceSet;
pub use types::{AssembledFile, ProcessOutcome, ProcessStatus, Snapshot};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid chunk size {chunk_size}: {reason}")]
    InvalidChunkSize { chunk_size: u32, reason: String },

    #[error("file too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("file name must not be empty")]
    EmptyFileName,

    #[error("correction tag must not be empty")]
    EmptyCorrectionTag,

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
