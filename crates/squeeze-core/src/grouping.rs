//! Directory grouping decision.
//!
//! For every work unit, the grouping mapper decides whether the directory holding the
//! unit carries enough data to be compacted on its own or must be rolled up with its
//! siblings under the common parent.
//!
//! # Two-phase contract
//!
//! ```text
//! GroupingMapper::setup(unit)                 (once per work unit)
//!     │
//!     ├── list the unit's directory           (FileLister, read-only)
//!     ├── sum non-directory entries           (DirectorySizeSnapshot)
//!     └── decide the key basis                (GroupingKey)
//!
//! WorkUnitGrouping::map(record, sink)         (once per record)
//!     └── emit (key basis, payload) unchanged
//! ```
//!
//! # Decision
//!
//! | Aggregate size | Key |
//! |----------------|-----|
//! | `< threshold` | [`GroupingKey::Rollup`] of the parent directory |
//! | `>= threshold` | [`GroupingKey::Directory`] of the directory itself |
//!
//! The boundary is inclusive on the "large enough" side, so a zero threshold never
//! rolls anything up. A directory without a parent cannot roll up and keeps its own key.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;

use crate::criteria::CompactionCriteria;
use crate::error::{Error, Result};
use crate::paths::{DELIMITER, DataPaths};
use crate::sink::RecordSink;
use crate::storage::{FileLister, FileStatus};

/// Key under which records are handed to the downstream aggregation stage.
///
/// Equality is on the typed value: a rollup key never equals a directory key, even
/// where their textual forms coincide (a root directory and a rollup into root).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupingKey {
    /// The directory is compacted on its own.
    Directory(String),
    /// The directory is merged with its siblings under this parent.
    Rollup(String),
}

impl GroupingKey {
    /// The directory path the key is based on.
    #[must_use]
    pub fn basis(&self) -> &str {
        match self {
            Self::Directory(path) | Self::Rollup(path) => path,
        }
    }

    /// Whether records under this key come from more than one directory.
    #[must_use]
    pub const fn is_rollup(&self) -> bool {
        matches!(self, Self::Rollup(_))
    }
}

/// Directory keys render as the path; rollup keys append a trailing delimiter.
impl fmt::Display for GroupingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(path) => f.write_str(path),
            Self::Rollup(path) if path.ends_with(DELIMITER) => f.write_str(path),
            Self::Rollup(path) => write!(f, "{path}{DELIMITER}"),
        }
    }
}

/// Aggregate size of a directory's immediate non-directory entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySizeSnapshot {
    directory: String,
    total_bytes: u64,
    file_count: usize,
}

impl DirectorySizeSnapshot {
    /// Builds a snapshot from a listing of `directory`.
    ///
    /// Subdirectories are ignored; every other entry counts, hidden or not.
    #[must_use]
    pub fn from_listing(directory: &str, entries: &[FileStatus]) -> Self {
        let (total_bytes, file_count) = entries
            .iter()
            .filter(|entry| !entry.is_dir)
            .fold((0_u64, 0_usize), |(bytes, count), entry| {
                (bytes.saturating_add(entry.len), count + 1)
            });

        Self {
            directory: DataPaths::normalize(directory),
            total_bytes,
            file_count,
        }
    }

    /// The listed directory, normalized.
    #[must_use]
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Sum of the sizes of all non-directory entries.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Number of non-directory entries.
    #[must_use]
    pub const fn file_count(&self) -> usize {
        self.file_count
    }

    /// Decides the grouping key for this directory under `threshold_in_bytes`.
    #[must_use]
    pub fn decide(&self, threshold_in_bytes: u64) -> GroupingKey {
        if self.total_bytes < threshold_in_bytes {
            if let Some(parent) = DataPaths::parent(&self.directory) {
                return GroupingKey::Rollup(parent);
            }
        }
        GroupingKey::Directory(self.directory.clone())
    }
}

/// One assignment of input data: a single data file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkUnit {
    source: String,
}

impl WorkUnit {
    /// Creates a work unit for the file at `source`.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Path of the file this unit reads.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Directory containing the unit's file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the source has no containing directory.
    pub fn directory(&self) -> Result<String> {
        DataPaths::parent(&self.source).ok_or_else(|| {
            Error::invalid_configuration(format!(
                "work unit '{}' has no containing directory",
                self.source
            ))
        })
    }
}

/// A record handed to the mapper. The key is discarded; the payload is passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Input key, ignored by the grouping stage.
    pub key: Bytes,
    /// Opaque record content.
    pub payload: Bytes,
}

impl Record {
    /// Creates a record with an empty key.
    #[must_use]
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            key: Bytes::new(),
            payload: payload.into(),
        }
    }
}

/// Decides grouping keys for work units.
///
/// Holds no state shared with other mappers. Snapshots are cached per directory for
/// the lifetime of the mapper, so work units from the same directory list it once.
#[derive(Debug)]
pub struct GroupingMapper<L> {
    lister: L,
    threshold_in_bytes: u64,
    snapshots: HashMap<String, DirectorySizeSnapshot>,
}

impl<L: FileLister> GroupingMapper<L> {
    /// Creates a mapper that compares directory sizes against `threshold_in_bytes`.
    pub fn new(lister: L, threshold_in_bytes: u64) -> Self {
        Self {
            lister,
            threshold_in_bytes,
            snapshots: HashMap::new(),
        }
    }

    /// Creates a mapper using the run's threshold, or the default when none was requested.
    pub fn from_criteria(criteria: &CompactionCriteria, lister: L) -> Self {
        Self::new(lister, criteria.effective_threshold())
    }

    /// The threshold this mapper decides against.
    #[must_use]
    pub const fn threshold_in_bytes(&self) -> u64 {
        self.threshold_in_bytes
    }

    /// Lists `directory` and sums its non-directory entries. Never cached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ListingFailure`] if the directory cannot be listed.
    pub async fn snapshot(&self, directory: &str) -> Result<DirectorySizeSnapshot> {
        let entries = self.lister.list_status(directory).await.inspect_err(|e| {
            tracing::warn!(directory = %directory, error = %e, "directory listing failed");
        })?;
        Ok(DirectorySizeSnapshot::from_listing(directory, &entries))
    }

    /// Runs the setup phase for `unit` and returns its fixed grouping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ListingFailure`] if the unit's directory cannot be listed, and
    /// [`Error::InvalidConfiguration`] if the unit has no containing directory. Both are
    /// fatal to the work unit.
    pub async fn setup(&mut self, unit: &WorkUnit) -> Result<WorkUnitGrouping> {
        let directory = DataPaths::normalize(&unit.directory()?);

        let snapshot = match self.snapshots.get(&directory) {
            Some(snapshot) => snapshot.clone(),
            None => {
                let snapshot = self.snapshot(&directory).await?;
                self.snapshots.insert(directory, snapshot.clone());
                snapshot
            }
        };

        let key = snapshot.decide(self.threshold_in_bytes);
        tracing::debug!(
            source = %unit.source(),
            directory = %snapshot.directory(),
            total_bytes = snapshot.total_bytes(),
            threshold_in_bytes = self.threshold_in_bytes,
            rollup = key.is_rollup(),
            key = %key,
            "grouping decided"
        );

        Ok(WorkUnitGrouping { key, snapshot })
    }
}

/// The outcome of the setup phase: the key every record of a work unit is emitted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnitGrouping {
    key: GroupingKey,
    snapshot: DirectorySizeSnapshot,
}

impl WorkUnitGrouping {
    /// The cached key basis.
    #[must_use]
    pub const fn key(&self) -> &GroupingKey {
        &self.key
    }

    /// The snapshot the decision was based on.
    #[must_use]
    pub const fn snapshot(&self) -> &DirectorySizeSnapshot {
        &self.snapshot
    }

    /// Emits `record`'s payload under the cached key. The payload is not modified.
    ///
    /// # Errors
    ///
    /// Propagates sink failures.
    pub async fn map<S: RecordSink + ?Sized>(&self, record: Record, sink: &S) -> Result<()> {
        sink.emit(self.key.clone(), record.payload).await
    }

    /// Emits every record in order and returns how many were emitted.
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first sink failure.
    pub async fn map_all<S, I>(&self, records: I, sink: &S) -> Result<u64>
    where
        S: RecordSink + ?Sized,
        I: IntoIterator<Item = Record>,
    {
        let mut emitted = 0;
        for record in records {
            self.map(record, sink).await?;
            emitted += 1;
        }
        Ok(emitted)
    }
}
