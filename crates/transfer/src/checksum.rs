//! CRC-32 used for per-piece and whole-file integrity.
//!
//! Reflected polynomial `0xEDB88320`, initial value `0xFFFFFFFF`, final
//! complement. Bit-compatible with zlib's `crc32`.

/// Computes the CRC-32 of `data`.
pub fn compute(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Returns `true` if `data` hashes to `expected`.
pub fn verify(data: &[u8], expected: u32) -> bool {
    compute(data) == expected
}
