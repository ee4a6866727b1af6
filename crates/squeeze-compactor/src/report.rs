//! The compaction plan produced by `squeeze-compactor plan`.
//!
//! A plan is a read-only description: which files would be merged under which key,
//! by which reducer, and where the output would land.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use squeeze_core::paths::DataPaths;
use squeeze_core::reducer::Partitioner;
use squeeze_core::summary::SourceSummary;
use squeeze_core::{CompactionCriteria, GroupingKey};

/// A planned compaction run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionPlan {
    /// When the plan was computed.
    pub generated_at: DateTime<Utc>,
    /// The criteria the plan was computed under.
    pub criteria: CompactionCriteria,
    /// Number of reducers the groups are spread over.
    pub reducers: u64,
    /// Data files found under the source.
    pub source_files: usize,
    /// Total size of those files.
    pub source_bytes: u64,
    /// One entry per grouping key, in key order.
    pub groups: Vec<PlannedGroup>,
}

/// One output unit of a planned run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedGroup {
    /// Textual grouping key.
    pub key: String,
    /// Whether the group merges several sibling directories.
    pub rollup: bool,
    /// Reducer index in `0..reducers`.
    pub reducer: u64,
    /// Where the merged output would be written.
    pub output: String,
    /// Member files, in path order.
    pub files: Vec<String>,
    /// Total size of the member files.
    pub bytes: u64,
}

impl CompactionPlan {
    /// Assembles a plan from collected groups whose payloads are member file paths.
    ///
    /// Paths are UTF-8: listers fail on any other entry name, so decoding is lossless.
    pub fn build(
        criteria: &CompactionCriteria,
        summary: &SourceSummary,
        groups: &BTreeMap<GroupingKey, Vec<Bytes>>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let sizes: HashMap<&str, u64> = summary
            .directories()
            .values()
            .flatten()
            .map(|file| (file.path.as_str(), file.len))
            .collect();
        let partitioner = Partitioner::for_groups(groups.len(), criteria);

        let groups = groups
            .iter()
            .map(|(key, payloads)| {
                let mut files: Vec<String> = payloads
                    .iter()
                    .map(|payload| String::from_utf8_lossy(payload).into_owned())
                    .collect();
                files.sort();
                let bytes = files
                    .iter()
                    .filter_map(|file| sizes.get(file.as_str()))
                    .fold(0_u64, |total, len| total.saturating_add(*len));

                PlannedGroup {
                    key: key.to_string(),
                    rollup: key.is_rollup(),
                    reducer: partitioner.partition(key),
                    output: output_location(criteria, key),
                    files,
                    bytes,
                }
            })
            .collect();

        Self {
            generated_at,
            criteria: criteria.clone(),
            reducers: partitioner.reducers(),
            source_files: summary.file_count(),
            source_bytes: summary.total_bytes(),
            groups,
        }
    }

    /// Number of groups whose output merges several directories.
    pub fn rollup_count(&self) -> usize {
        self.groups.iter().filter(|group| group.rollup).count()
    }
}

/// Output directory that receives the merged output of rollup groups.
pub const ROLLUP_DIR: &str = "_rollup";

/// Output directory for keys above the source, i.e. a rollup of the source itself.
pub const PARENT_DIR: &str = "_parent";

/// Maps a key onto the target tree, mirroring its position under the source.
///
/// Rollup keys land in a [`ROLLUP_DIR`] beneath the mirrored location, so a directory
/// compacted on its own and the rollup of its small children never share an output.
/// Both reserved names are hidden, and hidden directories are never walked, so no
/// directory key can map onto them.
fn output_location(criteria: &CompactionCriteria, key: &GroupingKey) -> String {
    let target = DataPaths::normalize(criteria.target_path());
    let base = match DataPaths::relative_to(criteria.source_path(), key.basis()) {
        Some(relative) if relative.is_empty() => target,
        Some(relative) => DataPaths::join(&target, &relative),
        None => DataPaths::join(&target, PARENT_DIR),
    };
    if key.is_rollup() {
        DataPaths::join(&base, ROLLUP_DIR)
    } else {
        base
    }
}

impl fmt::Display for CompactionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "compaction plan {}",
            self.generated_at.format("%Y-%m-%dT%H:%M:%SZ")
        )?;
        writeln!(
            f,
            "source: {} ({} files, {} bytes)",
            self.criteria.source_path(),
            self.source_files,
            self.source_bytes
        )?;
        writeln!(f, "target: {}", self.criteria.target_path())?;
        writeln!(
            f,
            "threshold: {} bytes, reducers: {}, groups: {} ({} rollups)",
            self.criteria.effective_threshold(),
            self.reducers,
            self.groups.len(),
            self.rollup_count()
        )?;

        for group in &self.groups {
            writeln!(f)?;
            writeln!(
                f,
                "[reducer {}] {} -> {} ({}{} files, {} bytes)",
                group.reducer,
                group.key,
                group.output,
                if group.rollup { "rollup, " } else { "" },
                group.files.len(),
                group.bytes
            )?;
            for file in &group.files {
                writeln!(f, "  {file}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use squeeze_core::storage::MemoryFileSystem;

    fn criteria(source: &str, target: &str) -> CompactionCriteria {
        CompactionCriteria::new(source, target, Some(100), Some(4)).expect("criteria")
    }

    #[test]
    fn test_output_location_mirrors_source_layout() {
        let criteria = criteria("/in", "/out/");

        let own = GroupingKey::Directory("/in/dt=1/hour=2".into());
        let rollup = GroupingKey::Rollup("/in/dt=1".into());
        let source_own = GroupingKey::Directory("/in".into());
        let source_rollup = GroupingKey::Rollup("/in".into());
        let parent_rollup = GroupingKey::Rollup("/".into());

        assert_eq!(output_location(&criteria, &own), "/out/dt=1/hour=2");
        assert_eq!(output_location(&criteria, &rollup), "/out/dt=1/_rollup");
        assert_eq!(output_location(&criteria, &source_own), "/out");
        assert_eq!(output_location(&criteria, &source_rollup), "/out/_rollup");
        assert_eq!(output_location(&criteria, &parent_rollup), "/out/_parent/_rollup");
    }

    #[test]
    fn test_directory_and_rollup_of_same_path_get_distinct_outputs() {
        let criteria = criteria("/in", "/out");
        let summary = SourceSummary::default();
        let groups = BTreeMap::from([
            (
                GroupingKey::Directory("/in/a".into()),
                vec![Bytes::from("/in/a/part-0")],
            ),
            (
                GroupingKey::Rollup("/in/a".into()),
                vec![Bytes::from("/in/a/b/part-0")],
            ),
            (
                GroupingKey::Directory("/in".into()),
                vec![Bytes::from("/in/part-0")],
            ),
            (
                GroupingKey::Rollup("/in".into()),
                vec![Bytes::from("/in/c/part-0")],
            ),
        ]);

        let plan = CompactionPlan::build(&criteria, &summary, &groups, Utc::now());

        let mut outputs: Vec<&str> = plan.groups.iter().map(|g| g.output.as_str()).collect();
        outputs.sort_unstable();
        let before = outputs.len();
        outputs.dedup();
        assert_eq!(outputs.len(), before, "outputs collide: {outputs:?}");
        assert_eq!(
            outputs,
            vec!["/out", "/out/_rollup", "/out/a", "/out/a/_rollup"]
        );
    }

    #[tokio::test]
    async fn test_build_sums_member_sizes() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/in/a/part-0", 10).expect("add");
        fs.add_file("/in/b/part-0", 20).expect("add");
        fs.add_file("/in/big/part-0", 500).expect("add");
        let summary = SourceSummary::collect(&fs, "/in").await.expect("summary");

        let groups = BTreeMap::from([
            (
                GroupingKey::Rollup("/in".into()),
                vec![Bytes::from("/in/a/part-0"), Bytes::from("/in/b/part-0")],
            ),
            (
                GroupingKey::Directory("/in/big".into()),
                vec![Bytes::from("/in/big/part-0")],
            ),
        ]);
        let generated_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let plan = CompactionPlan::build(&criteria("/in", "/out"), &summary, &groups, generated_at);

        assert_eq!(plan.reducers, 2);
        assert_eq!(plan.source_files, 3);
        assert_eq!(plan.source_bytes, 530);
        assert_eq!(plan.rollup_count(), 1);

        let big = &plan.groups[0];
        assert_eq!(big.key, "/in/big");
        assert_eq!(big.bytes, 500);
        assert_eq!(big.output, "/out/big");

        let rollup = &plan.groups[1];
        assert_eq!(rollup.key, "/in/");
        assert!(rollup.rollup);
        assert_eq!(rollup.bytes, 30);
        assert_eq!(rollup.output, "/out/_rollup");
        assert!(plan.groups.iter().all(|g| g.reducer < plan.reducers));
    }

    #[test]
    fn test_render_text_and_json() {
        let plan = CompactionPlan {
            generated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            criteria: criteria("/in", "/out"),
            reducers: 1,
            source_files: 1,
            source_bytes: 10,
            groups: vec![PlannedGroup {
                key: "/in/".into(),
                rollup: true,
                reducer: 0,
                output: "/out".into(),
                files: vec!["/in/a/part-0".into()],
                bytes: 10,
            }],
        };

        let text = plan.to_string();
        assert!(text.starts_with("compaction plan 2024-01-01T00:00:00Z"));
        assert!(text.contains("[reducer 0] /in/ -> /out (rollup, 1 files, 10 bytes)"));
        assert!(text.contains("  /in/a/part-0"));

        let json = serde_json::to_value(&plan).expect("json");
        assert_eq!(json["generatedAt"], "2024-01-01T00:00:00Z");
        assert_eq!(json["criteria"]["thresholdInBytes"], 100);
        assert_eq!(json["groups"][0]["rollup"], true);
        assert_eq!(json["groups"][0]["files"][0], "/in/a/part-0");
    }
}
