//! Continuity checking: which expected timestamps are absent from a series.
//!
//! The expected domain of a set of stamps is every multiple of the interval
//! from the smallest stamp up to the largest. Anything in that domain which
//! is not present is missing; runs of consecutive missing stamps are grouped
//! into [`Gap`]s.
//!
//! ```
//! use ohlc_ingestor::Interval;
//! use series_sync::gaps::{Gap, find_gaps};
//!
//! let gaps = find_gaps([0, 60, 240, 300], Interval::MINUTE);
//! assert_eq!(gaps, vec![Gap::new(120, 180, Interval::MINUTE)]);
//! assert_eq!(gaps[0].missing_count(), 2);
//! ```

use std::fmt;

use chrono::DateTime;
use ohlc_ingestor::{BarSeries, Interval};

/// A maximal run of missing timestamps, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gap {
    /// First missing timestamp.
    pub start: i64,
    /// Last missing timestamp.
    pub end: i64,
    missing: i64,
}

impl Gap {
    /// Builds the gap `[start, end]` on the `interval` grid.
    pub fn new(start: i64, end: i64, interval: Interval) -> Self {
        Self {
            start,
            end,
            missing: interval.steps_between(start, end) + 1,
        }
    }

    /// Number of absent bars in the gap.
    pub fn missing_count(&self) -> i64 {
        self.missing
    }
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {} ({} missing)",
            format_ts(self.start),
            format_ts(self.end),
            self.missing
        )
    }
}

/// RFC 3339 rendering of an epoch stamp, falling back to the raw number.
pub fn format_ts(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}

/// Sum of [`Gap::missing_count`] over `gaps`.
pub fn total_missing(gaps: &[Gap]) -> i64 {
    gaps.iter().map(Gap::missing_count).sum()
}

/// Groups the missing timestamps of `timestamps` into gaps.
///
/// Input order and duplicates do not matter. Stamps that are not a whole
/// number of intervals away from the minimum are ignored.
pub fn find_gaps(timestamps: impl IntoIterator<Item = i64>, interval: Interval) -> Vec<Gap> {
    let mut stamps: Vec<i64> = timestamps.into_iter().collect();
    stamps.sort_unstable();
    stamps.dedup();

    let Some(&anchor) = stamps.first() else {
        return Vec::new();
    };
    let step = interval.secs();

    let mut gaps = Vec::new();
    let mut expected = anchor;
    for ts in stamps {
        if (ts - anchor).rem_euclid(step) != 0 {
            continue;
        }
        if ts > expected {
            gaps.push(Gap::new(expected, ts - step, interval));
        }
        expected = ts + step;
    }
    gaps
}

/// [`find_gaps`] over the bars of a series, at the series' own interval.
pub fn find_series_gaps(series: &BarSeries) -> Vec<Gap> {
    find_gaps(series.timestamps(), series.interval())
}

/// Every missing timestamp, ascending.
pub fn missing_timestamps(
    timestamps: impl IntoIterator<Item = i64>,
    interval: Interval,
) -> Vec<i64> {
    find_gaps(timestamps, interval)
        .into_iter()
        .flat_map(|g| (0..g.missing).map(move |n| interval.step(g.start, n)))
        .collect()
}
