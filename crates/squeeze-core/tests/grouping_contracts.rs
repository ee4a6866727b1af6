//! Contract tests for the per-directory grouping decision.

use bytes::Bytes;
use proptest::prelude::*;
use squeeze_core::prelude::*;
use squeeze_test_utils::{LayoutFactory, TracingFileSystem};

async fn key_for(fs: TracingFileSystem, threshold: u64, unit: &str) -> GroupingKey {
    let mut mapper = GroupingMapper::new(fs, threshold);
    mapper
        .setup(&WorkUnit::new(unit))
        .await
        .expect("setup")
        .key()
        .clone()
}

#[tokio::test]
async fn small_directory_rolls_up_into_parent() {
    let fs = LayoutFactory::uniform_directory("/source/path", 1, 1234);
    let sink = GroupCollector::new();
    let mut mapper = GroupingMapper::new(fs, 12_345);

    let grouping = mapper
        .setup(&WorkUnit::new("/source/path/part-00000"))
        .await
        .expect("setup");
    grouping
        .map(Record::new("Hello World!"), &sink)
        .await
        .expect("map");

    let groups = sink.into_groups().expect("groups");
    let (key, payloads) = groups.iter().next().expect("one group");
    assert_eq!(key.to_string(), "/source/");
    assert_eq!(payloads, &vec![Bytes::from_static(b"Hello World!")]);
}

#[tokio::test]
async fn zero_threshold_keeps_directory_key() {
    let fs = LayoutFactory::uniform_directory("/source/path", 1, 1234);
    let key = key_for(fs, 0, "/source/path/part-00000").await;

    assert_eq!(key, GroupingKey::Directory("/source/path".into()));
    assert_eq!(key.to_string(), "/source/path");
}

#[tokio::test]
async fn threshold_boundary_is_inclusive() {
    let fs = LayoutFactory::uniform_directory("/source/path", 2, 500);

    let at = key_for(fs.clone(), 1_000, "/source/path/part-00000").await;
    let above = key_for(fs, 1_001, "/source/path/part-00000").await;

    assert!(!at.is_rollup());
    assert!(above.is_rollup());
}

#[tokio::test]
async fn empty_directory_with_zero_threshold_keeps_own_key() {
    let fs = TracingFileSystem::new();
    fs.add_dir("/source/empty");
    let mut mapper = GroupingMapper::new(fs, 0);

    let snapshot = mapper.snapshot("/source/empty").await.expect("snapshot");
    assert_eq!(snapshot.total_bytes(), 0);
    assert_eq!(
        snapshot.decide(mapper.threshold_in_bytes()),
        GroupingKey::Directory("/source/empty".into())
    );

    // A directory the unit claims to live in but that cannot be listed is fatal.
    let err = mapper
        .setup(&WorkUnit::new("/source/gone/part-0"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ListingFailure { .. }));
}

#[tokio::test]
async fn root_directory_never_rolls_up() {
    let fs = TracingFileSystem::new();
    fs.add_file("/part-00000", 1);

    let key = key_for(fs, 1_000, "/part-00000").await;
    assert_eq!(key, GroupingKey::Directory("/".into()));
}

#[tokio::test]
async fn subdirectories_do_not_count_towards_size() {
    let fs = TracingFileSystem::new();
    fs.add_file("/source/a/part-0", 10)
        .add_file("/source/a/nested/part-0", 10_000);

    let key = key_for(fs, 100, "/source/a/part-0").await;
    assert_eq!(key, GroupingKey::Rollup("/source".into()));
}

#[tokio::test]
async fn decision_is_stable_across_setups() {
    let fs = LayoutFactory::daily_partitions(&[10, 20]);
    let mut mapper = GroupingMapper::new(fs.clone(), 100);

    let first = mapper
        .setup(&WorkUnit::new("/source/dt=2024-01-01/part-00000"))
        .await
        .expect("setup");
    // The directory grows past the threshold, but the mapper keeps its snapshot.
    fs.add_file("/source/dt=2024-01-01/part-00001", 1_000);
    let second = mapper
        .setup(&WorkUnit::new("/source/dt=2024-01-01/part-00001"))
        .await
        .expect("setup");

    assert_eq!(first.key(), second.key());
    assert_eq!(fs.list_count("/source/dt=2024-01-01"), 1);
}

#[tokio::test]
async fn map_all_emits_every_record_unchanged() {
    let fs = LayoutFactory::uniform_directory("/source/a", 1, 5);
    let sink = GroupCollector::new();
    let mut mapper = GroupingMapper::new(fs, 0);
    let grouping = mapper
        .setup(&WorkUnit::new("/source/a/part-00000"))
        .await
        .expect("setup");

    let records = (0..3).map(|i| Record::new(format!("line-{i}")));
    let emitted = grouping.map_all(records, &sink).await.expect("map_all");

    assert_eq!(emitted, 3);
    let groups = sink.into_groups().expect("groups");
    assert_eq!(
        groups[grouping.key()],
        vec![
            Bytes::from_static(b"line-0"),
            Bytes::from_static(b"line-1"),
            Bytes::from_static(b"line-2"),
        ]
    );
}

proptest! {
    #[test]
    fn decision_matches_size_comparison(
        sizes in prop::collection::vec(0_u64..10_000, 0..8),
        threshold in 0_u64..50_000,
    ) {
        let entries: Vec<FileStatus> = sizes
            .iter()
            .enumerate()
            .map(|(i, len)| FileStatus::file(format!("/source/d/part-{i}"), *len))
            .collect();
        let snapshot = DirectorySizeSnapshot::from_listing("/source/d", &entries);
        let total: u64 = sizes.iter().sum();

        let key = snapshot.decide(threshold);

        prop_assert_eq!(snapshot.total_bytes(), total);
        if total < threshold {
            prop_assert_eq!(key, GroupingKey::Rollup("/source".into()));
        } else {
            prop_assert_eq!(key, GroupingKey::Directory("/source/d".into()));
        }
    }

    #[test]
    fn rollup_key_text_ends_with_delimiter(name in "[a-z]{1,8}", parent in "[a-z]{1,8}") {
        let key = GroupingKey::Rollup(format!("/{parent}"));
        prop_assert!(key.to_string().ends_with('/'));
        prop_assert_eq!(GroupingKey::Directory(format!("/{parent}/{name}")).to_string(), format!("/{parent}/{name}"));
    }
}
