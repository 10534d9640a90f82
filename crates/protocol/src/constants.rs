use crate::capacity::CorrectionLevel;

/// Largest file a transfer may carry (1 MiB).
///
/// Shared by the builder and the assembler: a file the sender is allowed to
/// build must never be rejected by the receiver for its size. The receiver
/// pre-allocates `file_size` bytes per transfer, so this also caps memory per
/// transfer.
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Largest payload a single piece may carry.
pub const MAX_CHUNK_SIZE: u32 = 255;

/// Default payload bytes per piece.
pub const DEFAULT_CHUNK_SIZE: u32 = 128;

/// Default symbol version used when validating the chunk size.
pub const DEFAULT_SYMBOL_VERSION: u8 = 10;

/// Default error-correction strength.
pub const DEFAULT_CORRECTION: CorrectionLevel = CorrectionLevel::Medium;
