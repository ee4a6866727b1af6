//! Error types and result aliases for Squeeze.
//!
//! Construction-time errors ([`Error::InvalidNumber`], [`Error::InvalidConfiguration`])
//! prevent a compaction run from starting. Setup-time errors ([`Error::ListingFailure`])
//! fail the affected work unit and are left to the caller's retry policy.

use std::num::ParseIntError;

/// The result type used throughout Squeeze.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or grouping a compaction run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A numeric option was present but could not be parsed.
    #[error("invalid number for option '{option}': '{value}'")]
    InvalidNumber {
        /// Name of the offending option.
        option: &'static str,
        /// The raw value that failed to parse.
        value: String,
        /// The underlying parse failure.
        #[source]
        source: ParseIntError,
    },

    /// The combination of options does not describe a valid run.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of what is wrong with the configuration.
        message: String,
    },

    /// A directory could not be listed.
    #[error("failed to list '{path}'")]
    ListingFailure {
        /// The directory that was being listed.
        path: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The downstream sink rejected a record.
    #[error("sink error: {message}")]
    Sink {
        /// Description of the sink failure.
        message: String,
    },

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new configuration error with the given message.
    #[must_use]
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Creates a new listing failure without an underlying cause.
    #[must_use]
    pub fn listing(path: impl Into<String>) -> Self {
        Self::ListingFailure {
            path: path.into(),
            source: None,
        }
    }

    /// Creates a new listing failure with a source cause.
    #[must_use]
    pub fn listing_with_source(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ListingFailure {
            path: path.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true for errors raised while validating compaction options.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidNumber { .. } | Self::InvalidConfiguration { .. }
        )
    }
}
