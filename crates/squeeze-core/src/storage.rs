//! File-system listing abstraction.
//!
//! The grouping decision only needs one capability from the file system: list the
//! immediate entries of a directory with their sizes. [`FileLister`] is that contract.
//!
//! | Implementation | Backing | Use |
//! |----------------|---------|-----|
//! | [`LocalFileSystem`] | `tokio::fs` | local runs of the plan command |
//! | [`MemoryFileSystem`] | in-process map | tests and dry runs |
//! | [`FnLister`] | a closure | pre-seeded snapshots in tests |
//!
//! Listing is read-only and idempotent; concurrent listings of the same directory
//! never conflict, so no implementation takes a lock across an await point.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};
use crate::paths::{DELIMITER, DataPaths};

/// One entry returned by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    /// Full path of the entry.
    pub path: String,
    /// Size in bytes. Always zero for directories.
    pub len: u64,
    /// Whether the entry is itself a directory.
    pub is_dir: bool,
    /// Last modification timestamp, when the backend reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

impl FileStatus {
    /// Creates a status for a regular file.
    #[must_use]
    pub fn file(path: impl Into<String>, len: u64) -> Self {
        Self {
            path: path.into(),
            len,
            is_dir: false,
            modified: None,
        }
    }

    /// Creates a status for a directory.
    #[must_use]
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            len: 0,
            is_dir: true,
            modified: None,
        }
    }
}

/// Lists the immediate entries of a directory.
#[async_trait]
pub trait FileLister: Send + Sync + 'static {
    /// Lists `dir` without recursing.
    ///
    /// **Ordering**: entries are returned in arbitrary order. Callers requiring a
    /// deterministic order should sort by `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ListingFailure`] if the directory is missing or unreadable.
    async fn list_status(&self, dir: &str) -> Result<Vec<FileStatus>>;
}

#[async_trait]
impl<T: FileLister + ?Sized> FileLister for Arc<T> {
    async fn list_status(&self, dir: &str) -> Result<Vec<FileStatus>> {
        (**self).list_status(dir).await
    }
}

// ============================================================================
// LocalFileSystem
// ============================================================================

/// Lister over the local file system.
///
/// Accepts plain paths and `file://` URIs. Symlinks to files are listed with the size
/// of their target. Symlinks to directories and dangling symlinks are left out, so a
/// walk never descends through a link. Entry names must be valid UTF-8; any other name
/// fails the listing rather than being reported under a lossy substitute.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Creates a new local lister.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileLister for LocalFileSystem {
    async fn list_status(&self, dir: &str) -> Result<Vec<FileStatus>> {
        let local = dir.strip_prefix("file://").unwrap_or(dir);
        let mut entries = tokio::fs::read_dir(local)
            .await
            .map_err(|e| Error::listing_with_source(dir, e))?;

        let mut statuses = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::listing_with_source(dir, e))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                return Err(Error::ListingFailure {
                    path: DataPaths::join(dir, &name.to_string_lossy()),
                    source: Some("file name is not valid UTF-8".into()),
                });
            };
            let path = DataPaths::join(dir, name);

            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Error::listing_with_source(dir, e))?;
            let metadata = if file_type.is_symlink() {
                match tokio::fs::metadata(entry.path()).await {
                    Ok(target) if target.is_dir() => {
                        tracing::debug!(path = %path, "skipping symlinked directory");
                        continue;
                    }
                    Ok(target) => target,
                    Err(e) => {
                        tracing::debug!(path = %path, error = %e, "skipping dangling symlink");
                        continue;
                    }
                }
            } else {
                entry
                    .metadata()
                    .await
                    .map_err(|e| Error::listing_with_source(dir, e))?
            };

            statuses.push(FileStatus {
                path,
                len: if metadata.is_dir() { 0 } else { metadata.len() },
                is_dir: metadata.is_dir(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        Ok(statuses)
    }
}

// ============================================================================
// MemoryFileSystem
// ============================================================================

/// In-memory file tree for tests and dry runs.
///
/// Directories are implied by the files beneath them; empty directories must be
/// registered with [`MemoryFileSystem::add_dir`]. Thread-safe via `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    tree: RwLock<Tree>,
}

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<String, StoredFile>,
    dirs: BTreeSet<String>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    len: u64,
    modified: DateTime<Utc>,
}

impl MemoryFileSystem {
    /// Creates an empty file tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a file of `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the tree lock is poisoned.
    pub fn add_file(&self, path: &str, len: u64) -> Result<()> {
        self.write()?.files.insert(
            DataPaths::normalize(path),
            StoredFile {
                len,
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    /// Registers a directory, so that it can be listed even when empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the tree lock is poisoned.
    pub fn add_dir(&self, path: &str) -> Result<()> {
        self.write()?.dirs.insert(DataPaths::normalize(path));
        Ok(())
    }

    /// Removes a file, or a directory and everything beneath it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the tree lock is poisoned.
    pub fn remove(&self, path: &str) -> Result<()> {
        let path = DataPaths::normalize(path);
        let prefix = child_prefix(&path);
        let mut tree = self.write()?;
        tree.files
            .retain(|file, _| *file != path && !file.starts_with(&prefix));
        tree.dirs
            .retain(|dir| *dir != path && !dir.starts_with(&prefix));
        Ok(())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tree>> {
        self.tree.write().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })
    }
}

#[async_trait]
impl FileLister for MemoryFileSystem {
    async fn list_status(&self, dir: &str) -> Result<Vec<FileStatus>> {
        let tree = self.tree.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        let dir = DataPaths::normalize(dir);
        let prefix = child_prefix(&dir);
        let mut entries: BTreeMap<String, FileStatus> = BTreeMap::new();

        for (path, file) in tree.files.range(prefix.clone()..) {
            let Some(rest) = path.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once(DELIMITER) {
                None => {
                    entries.insert(
                        path.clone(),
                        FileStatus {
                            path: path.clone(),
                            len: file.len,
                            is_dir: false,
                            modified: Some(file.modified),
                        },
                    );
                }
                Some((child, _)) => {
                    let child = format!("{prefix}{child}");
                    entries
                        .entry(child.clone())
                        .or_insert_with(|| FileStatus::directory(child));
                }
            }
        }

        for path in tree.dirs.range(prefix.clone()..) {
            let Some(rest) = path.strip_prefix(&prefix) else {
                break;
            };
            let child = rest.split(DELIMITER).next().unwrap_or(rest);
            if !child.is_empty() {
                let child = format!("{prefix}{child}");
                entries
                    .entry(child.clone())
                    .or_insert_with(|| FileStatus::directory(child));
            }
        }

        if entries.is_empty() && !tree.dirs.contains(&dir) {
            // Listing a file yields the file itself.
            if let Some(file) = tree.files.get(&dir) {
                return Ok(vec![FileStatus::file(dir.clone(), file.len)]);
            }
            return Err(Error::ListingFailure {
                path: dir,
                source: Some("directory does not exist".into()),
            });
        }

        Ok(entries.into_values().collect())
    }
}

/// Returns the prefix shared by every child of `dir`.
fn child_prefix(dir: &str) -> String {
    if dir.ends_with(DELIMITER) {
        dir.to_string()
    } else {
        format!("{dir}{DELIMITER}")
    }
}

// ============================================================================
// FnLister
// ============================================================================

/// Adapts a closure into a [`FileLister`].
///
/// Lets callers substitute a fixed listing without any file-system I/O.
///
/// # Example
///
/// ```rust
/// use squeeze_core::storage::{FileStatus, FnLister};
///
/// let lister = FnLister::new(|dir: &str| Ok(vec![FileStatus::file(format!("{dir}/part-0"), 1234)]));
/// ```
pub struct FnLister<F> {
    list: F,
}

impl<F> FnLister<F>
where
    F: Fn(&str) -> Result<Vec<FileStatus>> + Send + Sync + 'static,
{
    /// Wraps `list` as a lister.
    pub const fn new(list: F) -> Self {
        Self { list }
    }
}

impl<F> std::fmt::Debug for FnLister<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnLister").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> FileLister for FnLister<F>
where
    F: Fn(&str) -> Result<Vec<FileStatus>> + Send + Sync + 'static,
{
    async fn list_status(&self, dir: &str) -> Result<Vec<FileStatus>> {
        (self.list)(dir)
    }
}
