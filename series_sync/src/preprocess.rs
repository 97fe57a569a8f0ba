//! Bootstrapping the canonical bulk history from the two raw exports.
//!
//! The long-horizon export and the gap-fill export are normalized, merged
//! (gap export wins on overlap), and then either cut at the first remaining
//! gap or forward-filled, depending on [`BulkGapPolicy`].

use std::path::Path;

use ohlc_ingestor::{
    BarSeries, Interval,
    io::{
        sink::DataSink,
        source::{SourceKind, load_series},
    },
};

use crate::{
    config::{BulkGapPolicy, SyncConfig},
    densify::densify_counted,
    error::SyncError,
    gaps::{Gap, find_series_gaps},
    merge::{DuplicatePolicy, merge, truncate_at_first_gap},
    report::{ReportEvent, Reporter},
    validate::{IntegrityReport, validate},
};

/// Result of a bootstrap run.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessOutcome<O> {
    /// The series that was written.
    pub series: BarSeries,
    /// Gaps found after merging, before the policy was applied.
    pub gaps: Vec<Gap>,
    /// The gap the series was cut at, under [`BulkGapPolicy::Truncate`].
    pub truncated_at: Option<Gap>,
    /// Bars added under [`BulkGapPolicy::Fill`].
    pub synthesized: usize,
    /// Integrity of the written series.
    pub integrity: IntegrityReport,
    /// What the sink returned.
    pub written: O,
}

pub(crate) fn load_required(
    label: &'static str,
    path: &Path,
    kind: SourceKind,
    interval: Interval,
    reporter: &dyn Reporter,
) -> Result<BarSeries, SyncError> {
    if !path.exists() {
        return Err(SyncError::BootstrapMissing {
            path: path.to_path_buf(),
        });
    }
    load_reported(label, path, kind, interval, reporter)
}

pub(crate) fn load_reported(
    label: &'static str,
    path: &Path,
    kind: SourceKind,
    interval: Interval,
    reporter: &dyn Reporter,
) -> Result<BarSeries, SyncError> {
    let loaded = load_series(path, kind, interval)
        .map_err(|source| SyncError::SourceLoad { label, source })?;

    reporter.report(ReportEvent::SourceLoaded {
        label,
        path: path.to_path_buf(),
        bars: loaded.series.len(),
    });
    if loaded.null_rows + loaded.misaligned_rows + loaded.duplicate_rows > 0 {
        reporter.report(ReportEvent::RowsDropped {
            label,
            null_rows: loaded.null_rows,
            misaligned_rows: loaded.misaligned_rows,
            duplicate_rows: loaded.duplicate_rows,
        });
    }
    Ok(loaded.series)
}

/// Builds the bulk history from `config.paths.raw_bulk` and
/// `config.paths.raw_gaps` and writes it to `sink`.
pub async fn preprocess<S>(
    config: &SyncConfig,
    sink: &S,
    reporter: &dyn Reporter,
) -> Result<PreprocessOutcome<S::Output>, SyncError>
where
    S: DataSink + Sync,
{
    let interval = config.interval;
    let raw = load_required(
        "raw bulk",
        &config.paths.raw_bulk,
        SourceKind::BulkExport,
        interval,
        reporter,
    )?;
    let fill = load_required(
        "raw gaps",
        &config.paths.raw_gaps,
        SourceKind::GapExport,
        interval,
        reporter,
    )?;

    let merged = merge(vec![raw, fill], DuplicatePolicy::LastWins)?;
    if merged.duplicates > 0 {
        reporter.report(ReportEvent::DuplicatesResolved {
            count: merged.duplicates,
        });
    }

    let gaps = find_series_gaps(&merged.series);
    for gap in &gaps {
        reporter.report(ReportEvent::GapDetected { gap: *gap });
    }

    let (series, truncated_at, synthesized) = match config.bulk_gap_policy {
        BulkGapPolicy::Truncate => {
            let (series, gap) = truncate_at_first_gap(merged.series);
            if let Some(gap) = gap {
                reporter.report(ReportEvent::Truncated {
                    gap,
                    kept: series.len(),
                });
            }
            (series, gap, 0)
        }
        BulkGapPolicy::Fill => {
            let (series, synthesized) = densify_counted(&merged.series);
            if synthesized > 0 {
                reporter.report(ReportEvent::Densified { synthesized });
            }
            (series, None, synthesized)
        }
    };

    let integrity = validate(&series, reporter);
    let written = sink.write(&series).await?;
    reporter.report(ReportEvent::Persisted {
        bars: series.len(),
        first: series.first_timestamp(),
        last: series.last_timestamp(),
    });

    Ok(PreprocessOutcome {
        series,
        gaps,
        truncated_at,
        synthesized,
        integrity,
        written,
    })
}
