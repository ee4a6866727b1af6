//! Plan job: walks the source, groups every directory, and assigns reducers.
//!
//! Each directory gets its own grouping mapper running as a tokio task. Mappers share
//! nothing but the collector sink; the number of tasks listing at once is bounded.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

use squeeze_core::observability::{grouping_span, run_span};
use squeeze_core::prelude::*;

use crate::report::CompactionPlan;

/// Directories grouped concurrently when no limit is given.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// A single planning run over one source tree.
pub struct PlanJob {
    criteria: CompactionCriteria,
    lister: Arc<dyn FileLister>,
    concurrency: usize,
}

impl PlanJob {
    /// Creates a job listing through `lister`.
    pub fn new(criteria: CompactionCriteria, lister: Arc<dyn FileLister>) -> Self {
        Self {
            criteria,
            lister,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets how many directories are grouped at once (at least one).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Runs the job and returns the plan.
    ///
    /// # Errors
    ///
    /// Fails on the first listing failure, whether while walking the source or while
    /// grouping a directory. Remaining grouping tasks are cancelled.
    pub async fn run(&self) -> Result<CompactionPlan> {
        let span = run_span(
            "plan",
            self.criteria.source_path(),
            self.criteria.target_path(),
        );
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&self) -> Result<CompactionPlan> {
        let summary = SourceSummary::collect(&self.lister, self.criteria.source_path()).await?;
        tracing::info!(
            directories = summary.directories().len(),
            files = summary.file_count(),
            total_bytes = summary.total_bytes(),
            "source walked"
        );

        let threshold = self.criteria.effective_threshold();
        let sink = Arc::new(GroupCollector::new());
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (directory, files) in summary.directories() {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|_| Error::Internal {
                    message: "grouping semaphore closed".into(),
                })?;
            let mut mapper = GroupingMapper::new(Arc::clone(&self.lister), threshold);
            let sink = Arc::clone(&sink);
            let units: Vec<WorkUnit> = files
                .iter()
                .map(|file| WorkUnit::new(file.path.clone()))
                .collect();
            let span = grouping_span(directory, threshold);

            tasks.spawn(
                async move {
                    let _permit = permit;
                    let mut emitted = 0_u64;
                    for unit in units {
                        let grouping = mapper.setup(&unit).await?;
                        grouping
                            .map(Record::new(unit.source().to_string()), &sink)
                            .await?;
                        emitted += 1;
                    }
                    Ok::<_, Error>(emitted)
                }
                .instrument(span),
            );
        }

        let mut emitted = 0_u64;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(count)) => emitted += count,
                Ok(Err(e)) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(Error::Internal {
                        message: format!("grouping task failed: {e}"),
                    });
                }
            }
        }

        let groups = sink.groups()?;
        let plan = CompactionPlan::build(&self.criteria, &summary, &groups, Utc::now());
        tracing::info!(
            records = emitted,
            groups = plan.groups.len(),
            rollups = plan.rollup_count(),
            reducers = plan.reducers,
            "grouping complete"
        );
        Ok(plan)
    }
}
