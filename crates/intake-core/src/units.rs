use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::UploadError;

const KB: u64 = 1024;
const MB: u64 = 1_048_576;
const GB: u64 = 1_073_741_824;
const TB: u64 = 1_099_511_627_776;

/// Storage size units (1024-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SizeUnit {
    #[default]
    Bytes,
    KB,
    MB,
    GB,
    TB,
}

impl SizeUnit {
    /// Number of bytes in one of this unit
    pub fn multiplier(self) -> u64 {
        match self {
            SizeUnit::Bytes => 1,
            SizeUnit::KB => KB,
            SizeUnit::MB => MB,
            SizeUnit::GB => GB,
            SizeUnit::TB => TB,
        }
    }

    /// Convert `size` of this unit to bytes, `None` on overflow
    pub fn to_bytes(self, size: u64) -> Option<u64> {
        size.checked_mul(self.multiplier())
    }

    /// Express a byte count in this unit
    pub fn from_bytes(self, bytes: u64) -> f64 {
        bytes as f64 / self.multiplier() as f64
    }
}

impl FromStr for SizeUnit {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "" | "B" | "BYTES" => Ok(SizeUnit::Bytes),
            "KB" => Ok(SizeUnit::KB),
            "MB" => Ok(SizeUnit::MB),
            "GB" => Ok(SizeUnit::GB),
            "TB" => Ok(SizeUnit::TB),
            _ => Err(UploadError::InvalidSizeUnit(s.to_string())),
        }
    }
}

impl Display for SizeUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            SizeUnit::Bytes => "B",
            SizeUnit::KB => "KB",
            SizeUnit::MB => "MB",
            SizeUnit::GB => "GB",
            SizeUnit::TB => "TB",
        };
        write!(f, "{}", s)
    }
}
