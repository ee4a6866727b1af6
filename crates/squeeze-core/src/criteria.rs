//! Parameters governing a single compaction run.
//!
//! A [`CompactionCriteria`] is validated once at construction and is immutable
//! afterwards, so it can be shared read-only between concurrent workers.
//!
//! # Construction paths
//!
//! | Path | Input | Used by |
//! |------|-------|---------|
//! | [`CompactionCriteria::from_options`] | string-keyed option mapping | job configuration, CLI |
//! | [`CompactionCriteria::new`] | typed values, no file format | callers holding validated values |
//! | [`CompactionCriteria::with_file_type`] | typed values plus format and schema | schema-aware callers |
//!
//! All paths apply the same rules: source and target are required and non-empty, and a
//! schema-carrying [`FileType`] must come with a schema path.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::file_type::FileType;
use crate::options::{
    FILE_TYPE, MAX_REDUCERS, OptionSource, SCHEMA_PATH, SOURCE_PATH, TARGET_PATH,
    THRESHOLD_IN_BYTES,
};

/// Threshold applied when a run does not request a size check.
///
/// Zero means every directory is large enough to be compacted on its own.
pub const DEFAULT_THRESHOLD_IN_BYTES: u64 = 0;

/// Validated description of one compaction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionCriteria {
    source_path: String,
    target_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_in_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_reducers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_type: Option<FileType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema_path: Option<String>,
}

impl CompactionCriteria {
    /// Builds criteria from a loosely-typed option mapping.
    ///
    /// Absent numeric options stay absent; present ones must parse as unsigned
    /// 64-bit integers. `schemaPath` is carried whenever it is set, even for formats
    /// that do not need it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidNumber`] if `thresholdInBytes` or `maxReducers` is present but
    ///   not a number.
    /// - [`Error::InvalidConfiguration`] if `sourcePath`/`targetPath` is missing or empty,
    ///   `fileType` is not a supported format, or `fileType` requires a schema and
    ///   `schemaPath` is missing.
    pub fn from_options<O: OptionSource + ?Sized>(options: &O) -> Result<Self> {
        let source_path = required_path(SOURCE_PATH, options.option(SOURCE_PATH))?;
        let target_path = required_path(TARGET_PATH, options.option(TARGET_PATH))?;
        let threshold_in_bytes =
            parse_number(THRESHOLD_IN_BYTES, options.option(THRESHOLD_IN_BYTES))?;
        let max_reducers = parse_number(MAX_REDUCERS, options.option(MAX_REDUCERS))?;
        let file_type = options.option(FILE_TYPE).map(FileType::parse).transpose()?;
        let schema_path = options.option(SCHEMA_PATH).map(str::to_string);

        Self::validated(
            source_path,
            target_path,
            threshold_in_bytes,
            max_reducers,
            file_type,
            schema_path,
        )
    }

    /// Builds criteria for a run without schema-aware handling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if either path is empty.
    pub fn new(
        source_path: impl Into<String>,
        target_path: impl Into<String>,
        threshold_in_bytes: Option<u64>,
        max_reducers: Option<u64>,
    ) -> Result<Self> {
        let source_path: String = source_path.into();
        let target_path: String = target_path.into();
        Self::validated(
            required_path(SOURCE_PATH, Some(source_path.as_str()))?,
            required_path(TARGET_PATH, Some(target_path.as_str()))?,
            threshold_in_bytes,
            max_reducers,
            None,
            None,
        )
    }

    /// Builds criteria for a run over files of a known format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if either path is empty or `file_type`
    /// requires a schema and `schema_path` is `None`.
    pub fn with_file_type(
        source_path: impl Into<String>,
        target_path: impl Into<String>,
        threshold_in_bytes: Option<u64>,
        max_reducers: Option<u64>,
        file_type: FileType,
        schema_path: Option<String>,
    ) -> Result<Self> {
        let source_path: String = source_path.into();
        let target_path: String = target_path.into();
        Self::validated(
            required_path(SOURCE_PATH, Some(source_path.as_str()))?,
            required_path(TARGET_PATH, Some(target_path.as_str()))?,
            threshold_in_bytes,
            max_reducers,
            Some(file_type),
            schema_path,
        )
    }

    fn validated(
        source_path: String,
        target_path: String,
        threshold_in_bytes: Option<u64>,
        max_reducers: Option<u64>,
        file_type: Option<FileType>,
        schema_path: Option<String>,
    ) -> Result<Self> {
        if let Some(file_type) = file_type {
            if file_type.requires_schema() && schema_path.is_none() {
                return Err(Error::invalid_configuration(format!(
                    "schema path required for {file_type} files"
                )));
            }
        }

        Ok(Self {
            source_path,
            target_path,
            threshold_in_bytes,
            max_reducers,
            file_type,
            schema_path,
        })
    }

    /// The directory tree to compact.
    #[must_use]
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Where compacted output is written.
    #[must_use]
    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    /// Minimum aggregate directory size compacted on its own, if a size check was requested.
    #[must_use]
    pub const fn threshold_in_bytes(&self) -> Option<u64> {
        self.threshold_in_bytes
    }

    /// The threshold to apply, falling back to [`DEFAULT_THRESHOLD_IN_BYTES`].
    #[must_use]
    pub fn effective_threshold(&self) -> u64 {
        self.threshold_in_bytes.unwrap_or(DEFAULT_THRESHOLD_IN_BYTES)
    }

    /// Cap on downstream output units; `None` means unbounded.
    #[must_use]
    pub const fn max_reducers(&self) -> Option<u64> {
        self.max_reducers
    }

    /// Format of the data files, if known.
    #[must_use]
    pub const fn file_type(&self) -> Option<FileType> {
        self.file_type
    }

    /// Writer schema location, if one was supplied.
    #[must_use]
    pub fn schema_path(&self) -> Option<&str> {
        self.schema_path.as_deref()
    }
}

fn required_path(key: &'static str, raw: Option<&str>) -> Result<String> {
    match raw {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(Error::invalid_configuration(format!(
            "missing required option '{key}'"
        ))),
    }
}

fn parse_number(key: &'static str, raw: Option<&str>) -> Result<Option<u64>> {
    raw.map(|value| {
        value.parse::<u64>().map_err(|source| Error::InvalidNumber {
            option: key,
            value: value.to_string(),
            source,
        })
    })
    .transpose()
}
