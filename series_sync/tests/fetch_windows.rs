mod common;

use common::{M, MarketSource, T0, minutes};
use ohlc_ingestor::BarSeries;
use series_sync::{
    densify::densify,
    fetch::{StopReason, fetch_range},
    report::{MemoryReporter, NoopReporter, ReportEvent},
};

fn starts_and_limits(src: &MarketSource) -> Vec<(i64, i64, u32)> {
    src.requests()
        .iter()
        .map(|r| ((r.start - T0) / 60, (r.end - T0) / 60, r.limit))
        .collect()
}

#[tokio::test]
async fn long_range_is_split_at_the_call_limit() {
    let src = MarketSource::with_stamps(&minutes(T0, 3_000));

    let out = fetch_range(&src, "btcusd", T0, T0 + 2_500 * 60, 1_000, M, &NoopReporter).await;

    assert_eq!(
        starts_and_limits(&src),
        vec![(0, 999, 1_000), (1_000, 1_999, 1_000), (2_000, 2_499, 500)]
    );
    assert_eq!(out.stop, StopReason::Covered);
    let stamps: Vec<i64> = out.bars.iter().map(|b| b.timestamp).collect();
    assert_eq!(stamps, minutes(T0, 2_500));
    assert_eq!(out.resume_at, T0 + 2_500 * 60);
}

#[tokio::test]
async fn short_page_resumes_after_last_returned_bar() {
    let src = MarketSource::with_stamps(&minutes(T0, 1_000)).page_cap(400);

    let out = fetch_range(&src, "btcusd", T0, T0 + 1_000 * 60, 1_000, M, &NoopReporter).await;

    assert_eq!(
        starts_and_limits(&src),
        vec![(0, 999, 1_000), (400, 999, 600), (800, 999, 200)]
    );
    assert_eq!(out.bars.len(), 1_000);
    assert_eq!(out.stop, StopReason::Covered);
}

#[tokio::test]
async fn empty_page_means_no_more_data() {
    let src = MarketSource::with_stamps(&minutes(T0, 100));

    let out = fetch_range(&src, "btcusd", T0, T0 + 500 * 60, 1_000, M, &NoopReporter).await;

    assert_eq!(src.requests().len(), 2);
    assert_eq!(out.bars.len(), 100);
    assert_eq!(out.stop, StopReason::Exhausted { at: T0 + 100 * 60 });
}

#[tokio::test]
async fn failed_call_halts_without_error() {
    let src = MarketSource::with_stamps(&minutes(T0, 3_000)).fail_on(1);
    let reporter = MemoryReporter::new();

    let out = fetch_range(&src, "btcusd", T0, T0 + 2_500 * 60, 1_000, M, &reporter).await;

    assert_eq!(src.requests().len(), 2);
    assert_eq!(out.bars.len(), 1_000);
    match &out.stop {
        StopReason::SourceFailed { at, error } => {
            assert_eq!(*at, T0 + 1_000 * 60);
            assert!(error.contains("503"), "{error}");
        }
        other => panic!("unexpected stop: {other:?}"),
    }
    assert!(
        reporter
            .warnings()
            .iter()
            .any(|e| matches!(e, ReportEvent::FetchFailed { .. }))
    );
}

#[tokio::test]
async fn rows_past_the_target_are_dropped() {
    // the market jumps from T0 to T0+10m, past the end of the target
    let src = MarketSource::with_stamps(&[T0, T0 + 600]);
    let reporter = MemoryReporter::new();

    let out = fetch_range(&src, "btcusd", T0, T0 + 180, 1_000, M, &reporter).await;

    assert_eq!(out.bars.iter().map(|b| b.timestamp).collect::<Vec<_>>(), vec![T0]);
    assert_eq!(out.stop, StopReason::Exhausted { at: T0 + 60 });
    assert!(reporter.events().iter().any(|e| matches!(
        e,
        ReportEvent::FetchReceived {
            kept: 1,
            discarded: 1,
            ..
        }
    )));
}

#[tokio::test]
async fn nothing_is_requested_for_an_empty_target() {
    let src = MarketSource::with_stamps(&minutes(T0, 10));

    let covered = fetch_range(&src, "btcusd", T0, T0, 1_000, M, &NoopReporter).await;
    let sliver = fetch_range(&src, "btcusd", T0, T0 + 30, 1_000, M, &NoopReporter).await;

    assert!(src.requests().is_empty());
    assert_eq!(covered.stop, StopReason::Covered);
    assert_eq!(sliver.stop, StopReason::NonPositiveLimit { at: T0 });
}

#[tokio::test]
async fn bars_after_an_outage_longer_than_a_page_are_kept() {
    let mut stamps = minutes(T0, 100);
    stamps.extend(minutes(T0 + 1_500 * 60, 1_000));
    let src = MarketSource::with_stamps(&stamps);

    let out = fetch_range(&src, "btcusd", T0, T0 + 2_500 * 60, 1_000, M, &NoopReporter).await;

    // the first page runs past its window into the bars after the outage
    assert_eq!(
        starts_and_limits(&src),
        vec![(0, 999, 1_000), (2_400, 2_499, 100)]
    );
    assert_eq!(out.bars.len(), 1_100);
    assert_eq!(out.stop, StopReason::Covered);
    assert_eq!(out.resume_at, T0 + 2_500 * 60);
}

#[tokio::test]
async fn page_entirely_past_the_window_still_advances() {
    let src = MarketSource::with_stamps(&minutes(T0 + 600, 5));

    let out = fetch_range(&src, "btcusd", T0, T0 + 900, 3, M, &NoopReporter).await;

    // first call asks for T0..=T0+2m and gets T0+10m..=T0+12m
    assert_eq!(
        starts_and_limits(&src),
        vec![(0, 2, 3), (13, 14, 2)]
    );
    let got: Vec<i64> = out.bars.iter().map(|b| b.timestamp).collect();
    assert_eq!(got, minutes(T0 + 600, 5));
    assert_eq!(out.stop, StopReason::Covered);
}

#[tokio::test]
async fn off_grid_rows_are_dropped_and_reported() {
    let src = MarketSource::with_stamps(&[T0, T0 + 90, T0 + 240]);
    let reporter = MemoryReporter::new();

    let out = fetch_range(&src, "btcusd", T0, T0 + 300, 1_000, M, &reporter).await;

    let got: Vec<i64> = out.bars.iter().map(|b| b.timestamp).collect();
    assert_eq!(got, vec![T0, T0 + 240]);
    assert_eq!(out.stop, StopReason::Covered);
    assert!(reporter.warnings().contains(&ReportEvent::RowsDropped {
        label: "fetched",
        null_rows: 0,
        misaligned_rows: 1,
        duplicate_rows: 0,
    }));

    let dense = densify(&BarSeries::from_bars(M, out.bars));
    assert_eq!(dense.timestamps().collect::<Vec<_>>(), minutes(T0, 5));
}
