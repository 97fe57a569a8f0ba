//! Covering a missing range with bounded fetch calls.
//!
//! A quote API returns at most `max_limit` bars per call, and when `limit`
//! and `end` disagree it honors `start` and `limit`. Each call is therefore
//! sized so its `limit` spans exactly `[start, end]`, and the next call
//! resumes one interval after the last bar actually returned. A short page
//! never makes the loop skip ahead. After an outage the API answers with
//! bars past the call's `end`; those are kept as long as they fall inside
//! the target range.

use std::fmt;

use ohlc_ingestor::{Bar, Interval, OhlcRequest, OhlcSource};

use crate::{
    gaps::format_ts,
    report::{ReportEvent, Reporter},
};

/// One call's bounds: `[start, end]` inclusive, `limit` bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// First requested timestamp.
    pub start: i64,
    /// Last requested timestamp.
    pub end: i64,
    /// Bars requested.
    pub limit: u32,
}

impl FetchWindow {
    /// Sizes the next call for the half-open target `[start, end)`.
    ///
    /// Returns `None` when not even one bar fits.
    pub fn next(start: i64, end: i64, max_limit: u32, interval: Interval) -> Option<Self> {
        let remaining = interval.steps_between(start, end);
        let limit = remaining.min(i64::from(max_limit));
        if limit <= 0 {
            return None;
        }
        Some(Self {
            start,
            end: interval.step(start, limit - 1).min(end),
            limit: u32::try_from(limit).ok()?,
        })
    }

    /// The request a source receives for this window.
    pub fn request(&self, pair: &str, interval: Interval) -> OhlcRequest {
        OhlcRequest {
            pair: pair.to_string(),
            start: self.start,
            end: self.end,
            step: interval,
            limit: self.limit,
        }
    }

}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "window {} .. {} (limit {})",
            format_ts(self.start),
            format_ts(self.end),
            self.limit
        )
    }
}

/// Why the fetch loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The whole target was requested.
    Covered,
    /// The source had nothing in the target at or after `at`.
    Exhausted {
        /// Start of the call that came back empty.
        at: i64,
    },
    /// The call starting at `at` failed.
    SourceFailed {
        /// Start of the failed call.
        at: i64,
        /// Rendered provider error.
        error: String,
    },
    /// Less than one interval was left between `at` and the target end.
    NonPositiveLimit {
        /// Where the loop stood.
        at: i64,
    },
}

impl StopReason {
    /// `true` for [`StopReason::SourceFailed`].
    pub fn is_failure(&self) -> bool {
        matches!(self, StopReason::SourceFailed { .. })
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Covered => f.write_str("range covered"),
            StopReason::Exhausted { at } => write!(f, "no more data from {}", format_ts(*at)),
            StopReason::SourceFailed { at, error } => {
                write!(f, "source failed at {}: {error}", format_ts(*at))
            }
            StopReason::NonPositiveLimit { at } => {
                write!(f, "nothing left to request at {}", format_ts(*at))
            }
        }
    }
}

/// Everything the fetch loop collected.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    /// Bars from every call, in call order.
    pub bars: Vec<Bar>,
    /// The windows requested, in order.
    pub windows: Vec<FetchWindow>,
    /// Why the loop ended.
    pub stop: StopReason,
    /// Where the next call would have started.
    pub resume_at: i64,
}

/// Fetches `[start, end)` from `source` in windows of at most `max_limit` bars.
///
/// Source failures end the loop and are recorded in [`FetchOutcome::stop`];
/// this function does not fail. Rows before the current call's start, at or
/// past `end`, or off the interval grid are dropped.
pub async fn fetch_range(
    source: &dyn OhlcSource,
    pair: &str,
    start: i64,
    end: i64,
    max_limit: u32,
    interval: Interval,
    reporter: &dyn Reporter,
) -> FetchOutcome {
    let mut cursor = start;
    let mut bars = Vec::new();
    let mut windows = Vec::new();
    let mut misaligned = 0;

    let stop = loop {
        if cursor >= end {
            break StopReason::Covered;
        }
        let Some(window) = FetchWindow::next(cursor, end, max_limit, interval) else {
            break StopReason::NonPositiveLimit { at: cursor };
        };
        windows.push(window);
        reporter.report(ReportEvent::FetchRequested { window });

        let rows = match source.fetch_bars(&window.request(pair, interval)).await {
            Ok(rows) => rows,
            Err(e) => {
                let error = e.to_string();
                reporter.report(ReportEvent::FetchFailed {
                    window,
                    error: error.clone(),
                });
                break StopReason::SourceFailed { at: cursor, error };
            }
        };

        let total = rows.len();
        let (aligned, off_grid): (Vec<Bar>, Vec<Bar>) = rows
            .into_iter()
            .partition(|b| interval.is_aligned(b.timestamp));
        misaligned += off_grid.len();
        let kept: Vec<Bar> = aligned
            .into_iter()
            .filter(|b| (cursor..end).contains(&b.timestamp))
            .collect();
        let Some(last) = kept.iter().map(|b| b.timestamp).max() else {
            reporter.report(ReportEvent::FetchEmpty { window });
            break StopReason::Exhausted { at: cursor };
        };
        reporter.report(ReportEvent::FetchReceived {
            window,
            kept: kept.len(),
            discarded: total - kept.len(),
            last,
        });

        bars.extend(kept);
        cursor = interval.step(last, 1);
    };

    if misaligned > 0 {
        reporter.report(ReportEvent::RowsDropped {
            label: "fetched",
            null_rows: 0,
            misaligned_rows: misaligned,
            duplicate_rows: 0,
        });
    }
    reporter.report(ReportEvent::FetchStopped {
        reason: stop.clone(),
        fetched: bars.len(),
        calls: windows.len(),
    });

    FetchOutcome {
        bars,
        windows,
        stop,
        resume_at: cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: Interval = Interval::MINUTE;

    #[test]
    fn window_spans_exactly_limit_bars() {
        let w = FetchWindow::next(0, 2_500 * 60, 1_000, M).unwrap();
        assert_eq!(
            w,
            FetchWindow {
                start: 0,
                end: 999 * 60,
                limit: 1_000
            }
        );

        let tail = FetchWindow::next(2_000 * 60, 2_500 * 60, 1_000, M).unwrap();
        assert_eq!(tail.limit, 500);
        assert_eq!(tail.end, 2_499 * 60);
    }

    #[test]
    fn window_needs_at_least_one_bar() {
        assert_eq!(FetchWindow::next(60, 60, 1_000, M), None);
        assert_eq!(FetchWindow::next(60, 90, 1_000, M), None);
        assert_eq!(FetchWindow::next(60, 120, 0, M), None);
        assert_eq!(FetchWindow::next(60, 120, 1_000, M).map(|w| w.limit), Some(1));
    }

    #[test]
    fn request_carries_window_bounds() {
        let w = FetchWindow {
            start: 120,
            end: 240,
            limit: 3,
        };
        let req = w.request("btcusd", M);
        assert_eq!((req.start, req.end, req.limit), (120, 240, 3));
        assert!(req.validate().is_ok());
    }
}
