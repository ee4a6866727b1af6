//! Test listers with operation tracing.
//!
//! Provides an in-memory file tree that records every listing for test assertions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use squeeze_core::error::{Error, Result};
use squeeze_core::storage::{FileLister, FileStatus, MemoryFileSystem};

/// Record of a listing operation for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOp {
    /// Listing succeeded.
    Listed {
        /// Directory that was listed.
        dir: String,
        /// Number of entries returned.
        entries: usize,
    },
    /// Listing failed.
    Failed {
        /// Directory that was listed.
        dir: String,
    },
}

impl ListOp {
    /// The directory the operation targeted.
    pub fn dir(&self) -> &str {
        match self {
            Self::Listed { dir, .. } | Self::Failed { dir } => dir,
        }
    }
}

/// In-memory file tree with operation tracing.
///
/// Records all listings for later assertion in tests. Clones share the same tree,
/// recorded operations and injected failures.
#[derive(Debug, Clone, Default)]
pub struct TracingFileSystem {
    tree: Arc<MemoryFileSystem>,
    operations: Arc<Mutex<Vec<ListOp>>>,
    fail_paths: Arc<Mutex<Vec<String>>>,
    latency: Option<Duration>,
}

impl TracingFileSystem {
    /// Creates a new empty tracing file tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a file tree with simulated listing latency.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Adds a file of `len` bytes.
    pub fn add_file(&self, path: &str, len: u64) -> &Self {
        self.tree.add_file(path, len).expect("add file");
        self
    }

    /// Registers an (empty) directory.
    pub fn add_dir(&self, path: &str) -> &Self {
        self.tree.add_dir(path).expect("add dir");
        self
    }

    /// Removes a file or directory subtree.
    pub fn remove(&self, path: &str) {
        self.tree.remove(path).expect("remove");
    }

    /// Returns all recorded operations.
    pub fn operations(&self) -> Vec<ListOp> {
        self.operations.lock().expect("lock").clone()
    }

    /// Number of listings (successful or not) of `dir`.
    pub fn list_count(&self, dir: &str) -> usize {
        self.operations
            .lock()
            .expect("lock")
            .iter()
            .filter(|op| op.dir() == dir)
            .count()
    }

    /// Clears recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().expect("lock").clear();
    }

    /// Injects a failure for every directory under the given path prefix.
    pub fn inject_failure(&self, prefix: impl Into<String>) {
        self.fail_paths.lock().expect("lock").push(prefix.into());
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        self.fail_paths.lock().expect("lock").clear();
    }

    fn should_fail(&self, dir: &str) -> bool {
        self.fail_paths
            .lock()
            .expect("lock")
            .iter()
            .any(|prefix| dir.starts_with(prefix.as_str()))
    }

    fn record(&self, op: ListOp) {
        self.operations.lock().expect("lock").push(op);
    }
}

#[async_trait]
impl FileLister for TracingFileSystem {
    async fn list_status(&self, dir: &str) -> Result<Vec<FileStatus>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.should_fail(dir) {
            self.record(ListOp::Failed {
                dir: dir.to_string(),
            });
            return Err(Error::listing(dir));
        }

        match self.tree.list_status(dir).await {
            Ok(entries) => {
                self.record(ListOp::Listed {
                    dir: dir.to_string(),
                    entries: entries.len(),
                });
                Ok(entries)
            }
            Err(e) => {
                self.record(ListOp::Failed {
                    dir: dir.to_string(),
                });
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracing_fs_records_operations() {
        let fs = TracingFileSystem::new();
        fs.add_file("/s/a/part-0", 10).add_file("/s/a/part-1", 20);

        let entries = fs.list_status("/s/a").await.expect("list");
        assert_eq!(entries.len(), 2);
        let _ = fs.list_status("/s/missing").await;

        assert_eq!(
            fs.operations(),
            vec![
                ListOp::Listed {
                    dir: "/s/a".into(),
                    entries: 2
                },
                ListOp::Failed {
                    dir: "/s/missing".into()
                },
            ]
        );
        fs.clear_operations();
        assert!(fs.operations().is_empty());
    }

    #[tokio::test]
    async fn tracing_fs_failure_injection() {
        let fs = TracingFileSystem::new();
        fs.add_file("/s/bad/part-0", 1).add_file("/s/ok/part-0", 1);
        fs.inject_failure("/s/bad");

        let err = fs.list_status("/s/bad").await.unwrap_err();
        assert!(matches!(err, Error::ListingFailure { .. }));
        assert!(fs.list_status("/s/ok").await.is_ok());

        fs.clear_failures();
        assert!(fs.list_status("/s/bad").await.is_ok());
        assert_eq!(fs.list_count("/s/bad"), 2);
    }

    #[tokio::test]
    async fn tracing_fs_clones_share_state() {
        let fs = TracingFileSystem::with_latency(Duration::from_millis(1));
        let clone = fs.clone();
        fs.add_file("/s/a/part-0", 5);

        let entries = clone.list_status("/s/a").await.expect("list");
        assert_eq!(entries[0].len, 5);
        assert_eq!(fs.list_count("/s/a"), 1);
    }
}
