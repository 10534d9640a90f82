//! Wire record encoding.
//!
//! ```text
//! {"id":"<transfer id>","n":"<file name>","s":<file size>,"c":<chunk size>,
//!  "e":"<correction tag>","i":<piece index>,"t":<total pieces>,
//!  "d":"<base64 payload>","h":<payload crc32>,"f":<file crc32>}
//! ```
//!
//! Decoding only checks the record shape. Protocol invariants (index bounds,
//! payload lengths, checksums) are enforced by the receiver.

use crate::ProtocolError;
use crate::packet::Packet;

/// Serializes a packet into its wire record.
pub fn encode(packet: &Packet) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(packet)?)
}

/// Parses a wire record back into a packet.
pub fn decode(record: &str) -> Result<Packet, ProtocolError> {
    Ok(serde_json::from_str(record.trim())?)
}

/// Parses a wire record from raw bytes as produced by a symbol decoder.
pub fn decode_bytes(record: &[u8]) -> Result<Packet, ProtocolError> {
    let packet: Packet = serde_json::from_slice(record.trim_ascii())?;
    Ok(packet)
}
