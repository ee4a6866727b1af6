//! # squeeze-compactor
//!
//! Plans small-file compaction over a directory tree.
//!
//! For every data directory under the source, the planner decides whether the
//! directory holds enough data to be compacted on its own or must be merged with its
//! siblings under the parent, then spreads the resulting groups over reducers.
//! Planning only lists files; it never reads, moves or writes data.
//!
//! ## Usage
//!
//! ```bash
//! # Human-readable plan
//! squeeze-compactor plan --source /data/events --target /data/compacted --threshold 134217728
//!
//! # JSON plan, capped at 16 reducers
//! squeeze-compactor plan --source /data/events --target /data/compacted \
//!     --threshold 134217728 --max-reducers 16 --format json
//!
//! # Avro input needs a schema
//! squeeze-compactor plan --source /data/events --target /data/compacted \
//!     --file-type AVRO --schema-path /schemas/event.avsc
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

mod job;
mod report;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use squeeze_core::options::{
    FILE_TYPE, MAX_REDUCERS, SCHEMA_PATH, SOURCE_PATH, TARGET_PATH, THRESHOLD_IN_BYTES,
};
use squeeze_core::storage::{FileLister, LocalFileSystem};
use squeeze_core::{CompactionCriteria, LogFormat, init_logging};

use crate::job::{DEFAULT_CONCURRENCY, PlanJob};

// ============================================================================
// CLI Arguments
// ============================================================================

/// Squeeze compaction planner.
#[derive(Debug, Parser)]
#[command(name = "squeeze-compactor")]
#[command(about = "Plans small-file compaction over a directory tree")]
#[command(version)]
struct Args {
    /// Log output format.
    #[arg(
        long,
        env = "SQUEEZE_LOG_FORMAT",
        value_enum,
        default_value_t = LogOutput::Json,
        global = true
    )]
    log_format: LogOutput,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute and print a compaction plan.
    Plan(PlanArgs),
}

#[derive(Debug, clap::Args)]
struct PlanArgs {
    /// Directory tree to compact.
    #[arg(long, env = "SQUEEZE_SOURCE_PATH")]
    source: String,

    /// Where compacted output is written.
    #[arg(long, env = "SQUEEZE_TARGET_PATH")]
    target: String,

    /// Minimum directory size, in bytes, compacted on its own.
    #[arg(long, env = "SQUEEZE_THRESHOLD_IN_BYTES")]
    threshold: Option<String>,

    /// Cap on the number of reducers.
    #[arg(long, env = "SQUEEZE_MAX_REDUCERS")]
    max_reducers: Option<String>,

    /// Data file format (TEXT, SEQ, ORC, AVRO, PARQUET).
    #[arg(long, env = "SQUEEZE_FILE_TYPE")]
    file_type: Option<String>,

    /// Writer schema, required for AVRO.
    #[arg(long, env = "SQUEEZE_SCHEMA_PATH")]
    schema_path: Option<String>,

    /// Plan output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Directories grouped concurrently.
    #[arg(long, env = "SQUEEZE_PLAN_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogOutput {
    Json,
    Pretty,
}

impl From<LogOutput> for LogFormat {
    fn from(output: LogOutput) -> Self {
        match output {
            LogOutput::Json => Self::Json,
            LogOutput::Pretty => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl PlanArgs {
    /// The flags as a job option mapping, so they are validated like job configuration.
    fn options(&self) -> HashMap<String, Option<String>> {
        HashMap::from([
            (SOURCE_PATH.to_string(), Some(self.source.clone())),
            (TARGET_PATH.to_string(), Some(self.target.clone())),
            (THRESHOLD_IN_BYTES.to_string(), self.threshold.clone()),
            (MAX_REDUCERS.to_string(), self.max_reducers.clone()),
            (FILE_TYPE.to_string(), self.file_type.clone()),
            (SCHEMA_PATH.to_string(), self.schema_path.clone()),
        ])
    }

    fn criteria(&self) -> Result<CompactionCriteria> {
        CompactionCriteria::from_options(&self.options()).context("invalid compaction criteria")
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn plan(args: PlanArgs) -> Result<()> {
    let criteria = args.criteria()?;
    tracing::info!(
        source = %criteria.source_path(),
        target = %criteria.target_path(),
        threshold_in_bytes = criteria.effective_threshold(),
        max_reducers = ?criteria.max_reducers(),
        file_type = ?criteria.file_type(),
        "planning compaction"
    );

    let lister: Arc<dyn FileLister> = Arc::new(LocalFileSystem::new());
    let plan = PlanJob::new(criteria, lister)
        .with_concurrency(args.concurrency)
        .run()
        .await
        .context("planning failed")?;

    let rendered = match args.format {
        OutputFormat::Text => plan.to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(&plan)?,
    };
    println!("{rendered}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_format.into());

    match args.command {
        Commands::Plan(plan_args) => plan(plan_args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squeeze_core::{Error, FileType};

    fn plan_args(extra: &[&str]) -> PlanArgs {
        let mut argv = vec![
            "squeeze-compactor",
            "plan",
            "--source",
            "/data/in",
            "--target",
            "/data/out",
        ];
        argv.extend_from_slice(extra);
        match Args::parse_from(argv).command {
            Commands::Plan(args) => args,
        }
    }

    #[test]
    fn test_plan_flags_build_criteria() {
        let args = plan_args(&[
            "--threshold",
            "1024",
            "--max-reducers",
            "4",
            "--file-type",
            "AVRO",
            "--schema-path",
            "/schemas/a.avsc",
            "--format",
            "json",
        ]);
        assert_eq!(args.format, OutputFormat::Json);

        let criteria = args.criteria().expect("criteria");
        assert_eq!(criteria.source_path(), "/data/in");
        assert_eq!(criteria.threshold_in_bytes(), Some(1024));
        assert_eq!(criteria.max_reducers(), Some(4));
        assert_eq!(criteria.file_type(), Some(FileType::Avro));
        assert_eq!(criteria.schema_path(), Some("/schemas/a.avsc"));
    }

    #[test]
    fn test_malformed_threshold_is_reported() {
        let err = plan_args(&["--threshold", "12kb"]).criteria().unwrap_err();
        let cause = err.downcast_ref::<Error>().expect("core error");
        assert!(matches!(cause, Error::InvalidNumber { .. }));
    }

    #[test]
    fn test_avro_without_schema_is_rejected() {
        let err = plan_args(&["--file-type", "AVRO"]).criteria().unwrap_err();
        let cause = err.downcast_ref::<Error>().expect("core error");
        assert!(cause.is_configuration());
    }

    #[test]
    fn test_defaults() {
        let args = plan_args(&[]);
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(args.concurrency, DEFAULT_CONCURRENCY);

        let criteria = args.criteria().expect("criteria");
        assert_eq!(criteria.threshold_in_bytes(), None);
        assert_eq!(criteria.effective_threshold(), 0);
    }
}
