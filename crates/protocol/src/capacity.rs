//! Symbol payload capacity lookup.
//!
//! The builder never consults this table on its own; callers pass a
//! [`PayloadCapacity`] implementation to chunk-size validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Error-correction strength of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrectionLevel {
    #[serde(rename = "L")]
    Low,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "Q")]
    Quartile,
    #[serde(rename = "H")]
    High,
}

impl CorrectionLevel {
    /// All levels, weakest first.
    pub fn all() -> &'static [CorrectionLevel] {
        &[
            CorrectionLevel::Low,
            CorrectionLevel::Medium,
            CorrectionLevel::Quartile,
            CorrectionLevel::High,
        ]
    }

    /// Tag carried in packets.
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionLevel::Low => "L",
            CorrectionLevel::Medium => "M",
            CorrectionLevel::Quartile => "Q",
            CorrectionLevel::High => "H",
        }
    }

    fn column(self) -> usize {
        match self {
            CorrectionLevel::Low => 0,
            CorrectionLevel::Medium => 1,
            CorrectionLevel::Quartile => 2,
            CorrectionLevel::High => 3,
        }
    }
}

impl fmt::Display for CorrectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrectionLevel {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L" | "l" => Ok(CorrectionLevel::Low),
            "M" | "m" => Ok(CorrectionLevel::Medium),
            "Q" | "q" => Ok(CorrectionLevel::Quartile),
            "H" | "h" => Ok(CorrectionLevel::High),
            other => Err(ProtocolError::UnknownCorrection(other.to_string())),
        }
    }
}

/// Maximum payload bytes a symbol can hold.
pub trait PayloadCapacity {
    /// Returns the byte capacity for `version` at `correction_tag`, or `None`
    /// if the pair is unknown.
    fn max_payload_bytes(&self, version: u8, correction_tag: &str) -> Option<usize>;
}

/// Byte-mode capacity table indexed by symbol version.
#[derive(Debug, Clone, Copy)]
pub struct QrCapacityTable {
    rows: &'static [[u16; 4]],
}

impl QrCapacityTable {
    /// Highest version in the table.
    pub fn max_version(&self) -> u8 {
        self.rows.len() as u8
    }
}

impl PayloadCapacity for QrCapacityTable {
    fn max_payload_bytes(&self, version: u8, correction_tag: &str) -> Option<usize> {
        let level: CorrectionLevel = correction_tag.parse().ok()?;
        let row = self.rows.get(usize::from(version).checked_sub(1)?)?;
        Some(usize::from(row[level.column()]))
    }
}

/// QR code byte-mode capacities, versions 1 through 40, columns L/M/Q/H.
pub const QR_BYTE_CAPACITY: QrCapacityTable = QrCapacityTable {
    rows: &[
        [17, 14, 11, 7],
        [32, 26, 20, 14],
        [53, 42, 32, 24],
        [78, 62, 46, 34],
        [106, 84, 60, 44],
        [134, 106, 74, 58],
        [154, 122, 86, 64],
        [192, 152, 108, 84],
        [230, 180, 130, 98],
        [271, 213, 151, 119],
        [321, 251, 177, 137],
        [367, 287, 203, 155],
        [425, 331, 241, 177],
        [458, 362, 258, 194],
        [520, 412, 292, 220],
        [586, 450, 322, 250],
        [644, 504, 364, 280],
        [718, 560, 394, 310],
        [792, 624, 442, 338],
        [858, 666, 482, 382],
        [929, 711, 509, 403],
        [1003, 779, 565, 439],
        [1091, 857, 611, 461],
        [1171, 911, 661, 511],
        [1273, 997, 715, 535],
        [1367, 1059, 751, 593],
        [1465, 1125, 805, 625],
        [1528, 1190, 868, 658],
        [1628, 1264, 908, 698],
        [1732, 1370, 982, 742],
        [1840, 1452, 1030, 790],
        [1952, 1538, 1112, 842],
        [2068, 1628, 1168, 898],
        [2188, 1722, 1228, 958],
        [2303, 1809, 1283, 983],
        [2431, 1911, 1351, 1051],
        [2563, 1989, 1423, 1093],
        [2699, 2099, 1499, 1139],
        [2809, 2213, 1579, 1219],
        [2953, 2331, 1663, 1273],
    ],
};
