//! Discovery of the work units under a source path.

use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::error::Result;
use crate::grouping::WorkUnit;
use crate::paths::DataPaths;
use crate::storage::{FileLister, FileStatus};

/// Data files found beneath a source path, grouped by containing directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSummary {
    root: String,
    directories: BTreeMap<String, Vec<FileStatus>>,
    total_bytes: u64,
    file_count: usize,
}

impl SourceSummary {
    /// Walks `root` breadth-first and records every visible data file.
    ///
    /// Hidden entries (names starting with `_` or `.`) are skipped, together with
    /// everything beneath hidden directories. Directories holding no visible files do
    /// not appear in the summary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ListingFailure`](crate::Error::ListingFailure) if any directory
    /// cannot be listed.
    pub async fn collect<L: FileLister + ?Sized>(lister: &L, root: &str) -> Result<Self> {
        let root = DataPaths::normalize(root);
        let mut summary = Self {
            root: root.clone(),
            ..Self::default()
        };

        let mut visited = HashSet::new();
        let mut pending = VecDeque::from([root]);

        while let Some(dir) = pending.pop_front() {
            if !visited.insert(dir.clone()) {
                continue;
            }

            let mut entries = lister.list_status(&dir).await?;
            entries.sort_by(|a, b| a.path.cmp(&b.path));

            for entry in entries {
                if DataPaths::is_hidden(&entry.path) {
                    continue;
                }
                if entry.is_dir {
                    pending.push_back(DataPaths::normalize(&entry.path));
                    continue;
                }

                let parent = DataPaths::parent(&entry.path).unwrap_or_else(|| dir.clone());
                summary.total_bytes = summary.total_bytes.saturating_add(entry.len);
                summary.file_count += 1;
                summary.directories.entry(parent).or_default().push(entry);
            }
        }

        tracing::debug!(
            root = %summary.root,
            directories = summary.directories.len(),
            files = summary.file_count,
            total_bytes = summary.total_bytes,
            "source summarized"
        );

        Ok(summary)
    }

    /// The walked source path, normalized.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Visible data files per containing directory, in path order.
    #[must_use]
    pub const fn directories(&self) -> &BTreeMap<String, Vec<FileStatus>> {
        &self.directories
    }

    /// Work units for every visible data file.
    pub fn work_units(&self) -> impl Iterator<Item = WorkUnit> + '_ {
        self.directories
            .values()
            .flatten()
            .map(|file| WorkUnit::new(file.path.clone()))
    }

    /// Sum of the sizes of all visible data files.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Number of visible data files.
    #[must_use]
    pub const fn file_count(&self) -> usize {
        self.file_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::storage::MemoryFileSystem;

    #[tokio::test]
    async fn test_collect_walks_tree_and_skips_hidden() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/src/a/part-0", 10).unwrap();
        fs.add_file("/src/a/_SUCCESS", 0).unwrap();
        fs.add_file("/src/a/b/part-0", 5).unwrap();
        fs.add_file("/src/_temporary/part-0", 999).unwrap();
        fs.add_file("/src/top", 1).unwrap();

        let summary = SourceSummary::collect(&fs, "/src/").await.expect("summary");

        assert_eq!(summary.root(), "/src");
        assert_eq!(summary.file_count(), 3);
        assert_eq!(summary.total_bytes(), 16);
        let dirs: Vec<&str> = summary.directories().keys().map(String::as_str).collect();
        assert_eq!(dirs, vec!["/src", "/src/a", "/src/a/b"]);

        let units: Vec<WorkUnit> = summary.work_units().collect();
        assert_eq!(units.len(), 3);
        assert!(units.contains(&WorkUnit::new("/src/a/b/part-0")));
    }

    #[tokio::test]
    async fn test_collect_fails_on_missing_root() {
        let fs = MemoryFileSystem::new();
        let err = SourceSummary::collect(&fs, "/nope").await.unwrap_err();
        assert!(matches!(err, Error::ListingFailure { .. }));
    }
}
