//! Pre-built directory layouts for common test scenarios.
//!
//! Provides factory functions to create source trees with sensible defaults.

use squeeze_core::{CompactionCriteria, FileType};

use crate::storage::TracingFileSystem;

/// Default source root used by fixtures.
pub const SOURCE_ROOT: &str = "/source";

/// Default target root used by fixtures.
pub const TARGET_ROOT: &str = "/target";

/// Factory for source trees.
pub struct LayoutFactory;

impl LayoutFactory {
    /// A single directory holding `files` parts of `part_len` bytes each.
    pub fn uniform_directory(dir: &str, files: usize, part_len: u64) -> TracingFileSystem {
        let fs = TracingFileSystem::new();
        for i in 0..files {
            fs.add_file(&format!("{dir}/part-{i:05}"), part_len);
        }
        fs
    }

    /// A date-partitioned table under [`SOURCE_ROOT`]:
    /// `/source/dt=2024-01-0N/part-00000` with the given sizes, one per partition.
    pub fn daily_partitions(sizes: &[u64]) -> TracingFileSystem {
        let fs = TracingFileSystem::new();
        for (day, len) in sizes.iter().enumerate() {
            fs.add_file(
                &format!("{SOURCE_ROOT}/dt=2024-01-{:02}/part-00000", day + 1),
                *len,
            );
        }
        fs
    }

    /// A mixed tree: one large partition, two small ones, an empty one, and the
    /// bookkeeping files Hadoop-style writers leave behind.
    ///
    /// With a threshold of `1_000` the large partition stays on its own and the
    /// small ones roll up into [`SOURCE_ROOT`].
    pub fn mixed() -> TracingFileSystem {
        let fs = TracingFileSystem::new();
        fs.add_file("/source/large/part-00000", 800)
            .add_file("/source/large/part-00001", 400)
            .add_file("/source/small-a/part-00000", 10)
            .add_file("/source/small-b/part-00000", 20)
            .add_file("/source/small-b/_SUCCESS", 0)
            .add_file("/source/_temporary/attempt/part-00000", 5_000)
            .add_dir("/source/empty");
        fs
    }
}

/// Criteria over the fixture roots with the given threshold.
pub fn criteria(threshold_in_bytes: u64) -> CompactionCriteria {
    CompactionCriteria::new(SOURCE_ROOT, TARGET_ROOT, Some(threshold_in_bytes), None)
        .expect("valid criteria")
}

/// Criteria for an Avro run with a schema.
pub fn avro_criteria(threshold_in_bytes: u64) -> CompactionCriteria {
    CompactionCriteria::with_file_type(
        SOURCE_ROOT,
        TARGET_ROOT,
        Some(threshold_in_bytes),
        None,
        FileType::Avro,
        Some("/schemas/event.avsc".to_string()),
    )
    .expect("valid criteria")
}
