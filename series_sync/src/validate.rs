//! Post-reconciliation integrity checks.
//!
//! Findings are reported, never enforced: a series with problems is still
//! persisted so the next run can pick up from it.

use ohlc_ingestor::BarSeries;

use crate::{
    gaps::{Gap, find_series_gaps, total_missing},
    report::{ReportEvent, Reporter},
};

/// What [`validate`] found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntegrityReport {
    /// Gaps still present in the series.
    pub missing: Vec<Gap>,
    /// NaN or infinite price/volume cells.
    pub non_finite: usize,
    /// Bars with volume below zero.
    pub negative_volume: usize,
}

impl IntegrityReport {
    /// `true` when nothing was flagged.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.non_finite == 0 && self.negative_volume == 0
    }

    /// Total bars absent from the series.
    pub fn missing_bars(&self) -> i64 {
        total_missing(&self.missing)
    }
}

/// Checks `series` for gaps, non-finite cells and negative volume.
pub fn validate(series: &BarSeries, reporter: &dyn Reporter) -> IntegrityReport {
    let report = IntegrityReport {
        missing: find_series_gaps(series),
        non_finite: series.bars().iter().map(|b| b.non_finite_count()).sum(),
        negative_volume: series.bars().iter().filter(|b| b.volume < 0.0).count(),
    };

    if report.missing.is_empty() {
        reporter.report(ReportEvent::NoMissing);
    } else {
        reporter.report(ReportEvent::ResidualGaps {
            missing: report.missing_bars(),
            gaps: report.missing.len(),
        });
    }
    if report.non_finite == 0 {
        reporter.report(ReportEvent::NoNulls);
    } else {
        reporter.report(ReportEvent::NonFinite {
            count: report.non_finite,
        });
    }
    if report.negative_volume > 0 {
        reporter.report(ReportEvent::NegativeVolume {
            count: report.negative_volume,
        });
    }

    report
}
