mod common;

use common::{MemorySink, T0, minutes, write_csv};
use series_sync::{
    SyncError,
    config::{BulkGapPolicy, SyncConfig},
    gaps::Gap,
    preprocess::preprocess,
    report::{MemoryReporter, NoopReporter, ReportEvent},
};
use tempfile::{TempDir, tempdir};

// Raw bulk export: float stamps, one row with an empty close, holes at
// T0+2m and T0+4m..=T0+5m. Gap export: fills T0+4m and overrides T0+3m.
fn fixture(policy: BulkGapPolicy) -> (TempDir, SyncConfig) {
    let dir = tempdir().unwrap();
    let mut cfg = SyncConfig::default();
    cfg.paths.raw_bulk = dir.path().join("original/bulk.csv");
    cfg.paths.raw_gaps = dir.path().join("original/gaps.csv");
    cfg.paths.bulk = dir.path().join("historical/bulk.csv");
    cfg.bulk_gap_policy = policy;

    let row = |t: i64, c: &str| format!("{t}.0,{c},{c},{c},{c},0.5");
    let bulk = [
        "Timestamp,Open,High,Low,Close,Volume".to_string(),
        row(T0, "10"),
        row(T0 + 60, "11"),
        format!("{}.0,12,12,12,,0.5", T0 + 120),
        row(T0 + 180, "13"),
        row(T0 + 360, "16"),
    ];
    let gaps = [
        "timestamp_unix,open,high,low,close,volume".to_string(),
        format!("{},23,23,23,23,1", T0 + 180),
        format!("{},14,14,14,14,1", T0 + 240),
    ];
    let bulk: Vec<&str> = bulk.iter().map(String::as_str).collect();
    let gaps: Vec<&str> = gaps.iter().map(String::as_str).collect();
    write_csv(&cfg.paths.raw_bulk, &bulk);
    write_csv(&cfg.paths.raw_gaps, &gaps);
    (dir, cfg)
}

#[tokio::test]
async fn truncate_policy_cuts_at_first_gap() {
    let (_dir, cfg) = fixture(BulkGapPolicy::Truncate);
    let sink = MemorySink::default();
    let reporter = MemoryReporter::new();

    let out = preprocess(&cfg, &sink, &reporter).await.unwrap();

    assert_eq!(
        out.gaps,
        vec![
            Gap::new(T0 + 120, T0 + 120, common::M),
            Gap::new(T0 + 300, T0 + 300, common::M)
        ]
    );
    assert_eq!(out.truncated_at, Some(out.gaps[0]));
    assert_eq!(out.series.timestamps().collect::<Vec<_>>(), minutes(T0, 2));
    assert_eq!(out.written, 2);
    assert!(out.integrity.is_clean());

    let events = reporter.events();
    assert!(events.contains(&ReportEvent::DuplicatesResolved { count: 1 }));
    assert!(events.iter().any(|e| matches!(
        e,
        ReportEvent::RowsDropped {
            label: "raw bulk",
            null_rows: 1,
            ..
        }
    )));
}

#[tokio::test]
async fn fill_policy_densifies_with_gap_export_winning() {
    let (_dir, cfg) = fixture(BulkGapPolicy::Fill);
    let sink = MemorySink::default();

    let out = preprocess(&cfg, &sink, &NoopReporter).await.unwrap();

    assert_eq!(out.truncated_at, None);
    assert_eq!(out.synthesized, 2);
    assert_eq!(out.series.timestamps().collect::<Vec<_>>(), minutes(T0, 7));
    assert_eq!(out.series.get(T0 + 120).unwrap().close, 11.0);
    assert_eq!(out.series.get(T0 + 180).unwrap().close, 23.0);
    assert_eq!(out.series.get(T0 + 300).unwrap().close, 14.0);
    assert_eq!(out.series.get(T0 + 300).unwrap().volume, 0.0);
    assert_eq!(sink.last(), Some(out.series.clone()));
}

#[tokio::test]
async fn missing_raw_export_is_fatal() {
    let (dir, cfg) = fixture(BulkGapPolicy::Truncate);
    std::fs::remove_file(&cfg.paths.raw_gaps).unwrap();
    let sink = MemorySink::default();

    let err = preprocess(&cfg, &sink, &NoopReporter).await.unwrap_err();

    assert!(matches!(err, SyncError::BootstrapMissing { .. }));
    assert_eq!(sink.writes(), 0);
    drop(dir);
}
