//! # squeeze-core
//!
//! Decision core for small-file compaction.
//!
//! Given a tree of data directories, Squeeze decides per directory whether it holds
//! enough data to be compacted on its own, or whether it must be merged with its
//! siblings under a common parent to reach an economical output size.
//!
//! - **Criteria**: validated, immutable parameters of a compaction run
//! - **Grouping**: the per-directory size-threshold decision and record emission
//! - **Storage**: the file-listing boundary the decision consumes
//! - **Reducers**: how grouping keys map onto a bounded number of output units
//!
//! ## Crate Boundary
//!
//! Physical concatenation of grouped files, file-format readers and writers, and the
//! execution engine that runs mappers are not part of this crate. They interact with it
//! through [`FileLister`](storage::FileLister) and [`RecordSink`](sink::RecordSink).
//!
//! ## Example
//!
//! ```rust
//! use squeeze_core::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let fs = MemoryFileSystem::new();
//! fs.add_file("/warehouse/events/dt=2024-01-01/part-0", 1_234)?;
//!
//! let criteria = CompactionCriteria::new("/warehouse/events", "/compacted", Some(12_345), None)?;
//! let mut mapper = GroupingMapper::from_criteria(&criteria, fs);
//!
//! // 1 234 bytes is below the threshold: the directory rolls up into its parent.
//! let grouping = mapper
//!     .setup(&WorkUnit::new("/warehouse/events/dt=2024-01-01/part-0"))
//!     .await?;
//! assert_eq!(grouping.key().to_string(), "/warehouse/events/");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod criteria;
pub mod error;
pub mod file_type;
pub mod grouping;
pub mod observability;
pub mod options;
pub mod paths;
pub mod reducer;
pub mod sink;
pub mod storage;
pub mod summary;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use squeeze_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::criteria::{CompactionCriteria, DEFAULT_THRESHOLD_IN_BYTES};
    pub use crate::error::{Error, Result};
    pub use crate::file_type::FileType;
    pub use crate::grouping::{
        DirectorySizeSnapshot, GroupingKey, GroupingMapper, Record, WorkUnit, WorkUnitGrouping,
    };
    pub use crate::options::OptionSource;
    pub use crate::paths::DataPaths;
    pub use crate::reducer::{Partitioner, reducer_count};
    pub use crate::sink::{ChannelSink, GroupCollector, RecordSink};
    pub use crate::storage::{FileLister, FileStatus, FnLister, LocalFileSystem, MemoryFileSystem};
    pub use crate::summary::SourceSummary;
}

// Re-export key types at crate root for ergonomics
pub use criteria::CompactionCriteria;
pub use error::{Error, Result};
pub use file_type::FileType;
pub use grouping::{DirectorySizeSnapshot, GroupingKey, GroupingMapper, Record, WorkUnit};
pub use observability::{LogFormat, init_logging};
pub use sink::{GroupCollector, RecordSink};
pub use storage::{FileLister, FileStatus};
