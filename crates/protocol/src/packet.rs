use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier grouping every packet of one file transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(String);

impl TransferId {
    /// Wraps an existing identifier, e.g. one decoded off the wire.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransferId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TransferId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One addressable piece of one file transfer.
///
/// Serialized as a compact record with single-letter field names so that it
/// fits in a barcode symbol. The payload is standard base64 on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    #[serde(rename = "id")]
    pub transfer_id: TransferId,
    #[serde(rename = "n")]
    pub file_name: String,
    #[serde(rename = "s")]
    pub file_size: u64,
    /// Nominal payload bytes per piece; only the last piece may be shorter.
    #[serde(rename = "c")]
    pub chunk_size: u32,
    /// Error-correction label, interpreted only by the symbol codec.
    #[serde(rename = "e")]
    pub correction_tag: String,
    #[serde(rename = "i")]
    pub piece_index: u32,
    #[serde(rename = "t")]
    pub total_pieces: u32,
    #[serde(rename = "d", with = "base64_bytes")]
    pub payload: Vec<u8>,
    /// CRC-32 of `payload`.
    #[serde(rename = "h")]
    pub payload_checksum: u32,
    /// CRC-32 of the complete file, identical on every packet of a transfer.
    #[serde(rename = "f")]
    pub file_checksum: u32,
}

impl Packet {
    /// Byte offset of this piece within the file.
    pub fn offset(&self) -> u64 {
        u64::from(self.piece_index) * u64::from(self.chunk_size)
    }

    /// Returns `true` if this is the final piece of the transfer.
    pub fn is_last(&self) -> bool {
        self.total_pieces > 0 && self.piece_index == self.total_pieces - 1
    }
}

/// Number of pieces a file of `file_size` bytes splits into.
///
/// An empty file still occupies one (empty) piece. Returns `None` if
/// `chunk_size` is zero or the count does not fit a `u32`.
pub fn expected_total_pieces(file_size: u64, chunk_size: u32) -> Option<u32> {
    if chunk_size == 0 {
        return None;
    }
    let pieces = file_size.div_ceil(u64::from(chunk_size)).max(1);
    u32::try_from(pieces).ok()
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
