//! Data file formats a compaction run can be told about.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported data file formats.
///
/// The format is optional on a run; when present it enables schema-aware handling
/// downstream. Only [`FileType::Avro`] carries a writer schema that must be supplied
/// separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    /// Newline-delimited text files.
    Text,
    /// Hadoop sequence files.
    Seq,
    /// Apache ORC files.
    Orc,
    /// Apache Avro container files.
    Avro,
    /// Apache Parquet files.
    Parquet,
}

impl FileType {
    /// All supported formats, in declaration order.
    pub const ALL: [Self; 5] = [Self::Text, Self::Seq, Self::Orc, Self::Avro, Self::Parquet];

    /// Parses a file format using case-sensitive matching.
    ///
    /// Accepted values: `TEXT`, `SEQ`, `ORC`, `AVRO`, `PARQUET`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when `raw` is not a supported format.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|file_type| file_type.as_str() == raw)
            .ok_or_else(|| {
                Error::invalid_configuration(format!(
                    "unsupported file format '{raw}'; expected one of: TEXT, SEQ, ORC, AVRO, PARQUET"
                ))
            })
    }

    /// Returns the canonical uppercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Seq => "SEQ",
            Self::Orc => "ORC",
            Self::Avro => "AVRO",
            Self::Parquet => "PARQUET",
        }
    }

    /// Whether a schema path must accompany this format.
    #[must_use]
    pub const fn requires_schema(self) -> bool {
        matches!(self, Self::Avro)
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
