//! Shared test utilities for Squeeze integration tests.
//!
//! This crate provides:
//! - [`TracingFileSystem`]: In-memory file tree with listing recording
//! - [`LayoutFactory`]: Factory functions for common source trees
//!
//! # Example
//!
//! ```rust,ignore
//! use squeeze_test_utils::{LayoutFactory, criteria};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let fs = LayoutFactory::daily_partitions(&[10, 2_000]);
//!     let criteria = criteria(1_000);
//!     // ... run test ...
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod fixtures;
pub mod storage;

pub use fixtures::*;
pub use storage::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("squeeze_core=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
