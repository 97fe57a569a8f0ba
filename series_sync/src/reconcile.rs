//! The update run: extend the stored series up to the last complete bar.
//!
//! A run walks [`Stage`]s in order:
//!
//! ```text
//! Load -> MergeOrDiff -> CheckCurrent -> Fetch -> Densify -> Validate -> Persist -> Done
//!                             |                                                    ^
//!                             +------------------- up to date ---------------------+
//! ```
//!
//! The bulk history is read-only here. New bars are merged onto the recent
//! tail, which is densified, validated and rewritten in full.

use chrono::Utc;
use ohlc_ingestor::{
    BarSeries, OhlcSource,
    io::{sink::DataSink, source::SourceKind},
};

use crate::{
    config::SyncConfig,
    densify::densify_counted,
    error::SyncError,
    fetch::{StopReason, fetch_range},
    merge::{DuplicatePolicy, merge},
    preprocess::{load_reported, load_required},
    report::{ReportEvent, Reporter},
    validate::{IntegrityReport, validate},
};

/// Steps of an update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the bulk history and the recent tail.
    Load,
    /// Working out the last stored bar and the missing range.
    MergeOrDiff,
    /// Deciding whether anything is missing at all.
    CheckCurrent,
    /// Calling the quote API.
    Fetch,
    /// Forward-filling holes.
    Densify,
    /// Integrity checks.
    Validate,
    /// Writing the tail.
    Persist,
    /// Finished.
    Done,
}

/// Summary of a run that wrote a new tail.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileSummary<O> {
    /// The tail as written.
    pub series: BarSeries,
    /// Bars the fetch loop returned.
    pub fetched: usize,
    /// Fetch calls issued.
    pub calls: usize,
    /// Why fetching stopped.
    pub stop: StopReason,
    /// Bars synthesized by densifying.
    pub synthesized: usize,
    /// Integrity of the written tail.
    pub integrity: IntegrityReport,
    /// What the sink returned.
    pub written: O,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome<O> {
    /// The last complete bar was already stored; nothing was fetched or written.
    UpToDate {
        /// Last stored timestamp.
        last_known: i64,
        /// Last complete bar timestamp.
        current: i64,
    },
    /// No tail existed and the fetch produced nothing; nothing was written.
    NoData {
        /// Why fetching stopped.
        stop: StopReason,
    },
    /// A new tail was written.
    Updated(ReconcileSummary<O>),
}

/// Runs updates against one source and one tail sink.
pub struct Reconciler<'a, S> {
    config: &'a SyncConfig,
    source: &'a dyn OhlcSource,
    sink: &'a S,
    reporter: &'a dyn Reporter,
}

impl<'a, S> Reconciler<'a, S>
where
    S: DataSink + Sync,
{
    /// Wires the collaborators of a run.
    pub fn new(
        config: &'a SyncConfig,
        source: &'a dyn OhlcSource,
        sink: &'a S,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            source,
            sink,
            reporter,
        }
    }

    fn enter(&self, stage: Stage) {
        self.reporter.report(ReportEvent::StageEntered { stage });
    }

    /// [`Reconciler::run_at`] with the current UTC time.
    pub async fn run(&self) -> Result<ReconcileOutcome<S::Output>, SyncError> {
        self.run_at(Utc::now().timestamp()).await
    }

    /// Runs one update as if the clock read `now` (epoch seconds).
    ///
    /// The bar starting at `now` floored to the interval is still forming
    /// and is never requested.
    pub async fn run_at(&self, now: i64) -> Result<ReconcileOutcome<S::Output>, SyncError> {
        let interval = self.config.interval;
        let paths = &self.config.paths;

        self.enter(Stage::Load);
        let bulk = load_required(
            "bulk",
            &paths.bulk,
            SourceKind::Canonical,
            interval,
            self.reporter,
        )?;
        let tail = if paths.recent.exists() {
            load_reported(
                "recent",
                &paths.recent,
                SourceKind::Canonical,
                interval,
                self.reporter,
            )?
        } else {
            self.reporter.report(ReportEvent::TailMissing {
                path: paths.recent.clone(),
            });
            BarSeries::empty(interval)
        };

        self.enter(Stage::MergeOrDiff);
        match (bulk.last_timestamp(), tail.first_timestamp()) {
            (Some(bulk_last), Some(tail_first)) if tail_first > interval.step(bulk_last, 1) => {
                self.reporter.report(ReportEvent::TailDiscontinuity {
                    bulk_last,
                    tail_first,
                });
            }
            _ => {}
        }
        let last_known = tail
            .last_timestamp()
            .or(bulk.last_timestamp())
            .ok_or_else(|| SyncError::EmptyBaseline {
                path: paths.bulk.clone(),
            })?;

        self.enter(Stage::CheckCurrent);
        let now_floor = interval.align_down(now);
        let current = interval.step(now_floor, -1);
        if last_known >= current {
            self.reporter.report(ReportEvent::UpToDate {
                last_known,
                current,
            });
            self.enter(Stage::Done);
            return Ok(ReconcileOutcome::UpToDate {
                last_known,
                current,
            });
        }

        self.enter(Stage::Fetch);
        let start = interval.step(last_known, 1);
        self.reporter.report(ReportEvent::MissingRange {
            start,
            end: current,
            bars: interval.steps_between(start, current) + 1,
        });
        let fetched = fetch_range(
            self.source,
            &self.config.pair,
            start,
            now_floor,
            self.config.provider.max_limit,
            interval,
            self.reporter,
        )
        .await;
        let fetched_count = fetched.bars.len();
        let calls = fetched.windows.len();
        let stop = fetched.stop;

        let merged = merge(
            vec![tail, BarSeries::from_bars(interval, fetched.bars)],
            DuplicatePolicy::LastWins,
        )?;
        if merged.series.is_empty() {
            self.enter(Stage::Done);
            return Ok(ReconcileOutcome::NoData { stop });
        }

        self.enter(Stage::Densify);
        let (series, synthesized) = densify_counted(&merged.series);
        if synthesized > 0 {
            self.reporter.report(ReportEvent::Densified { synthesized });
        }

        self.enter(Stage::Validate);
        let integrity = validate(&series, self.reporter);

        self.enter(Stage::Persist);
        let written = self.sink.write(&series).await?;
        self.reporter.report(ReportEvent::Persisted {
            bars: series.len(),
            first: series.first_timestamp(),
            last: series.last_timestamp(),
        });

        self.enter(Stage::Done);
        Ok(ReconcileOutcome::Updated(ReconcileSummary {
            series,
            fetched: fetched_count,
            calls,
            stop,
            synthesized,
            integrity,
            written,
        }))
    }
}
