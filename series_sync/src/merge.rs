//! Combining overlapping bar series into one canonical series.

use std::collections::{BTreeMap, btree_map::Entry};

use ohlc_ingestor::{Bar, BarSeries, Interval};
use thiserror::Error;

use crate::gaps::{Gap, find_series_gaps};

/// Which bar survives when two sources carry the same timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// The bar from the later-listed source wins.
    #[default]
    LastWins,
    /// The bar from the earlier-listed source wins.
    FirstWins,
}

/// Errors from [`merge`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// Nothing was given to merge.
    #[error("no sources to merge")]
    NoSources,

    /// Two sources have different bar widths.
    #[error("cannot merge {found} bars into a {expected} series")]
    IntervalMismatch {
        /// Interval of the first source.
        expected: Interval,
        /// Interval of the offending source.
        found: Interval,
    },
}

/// Result of a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    /// Sorted, duplicate-free series.
    pub series: BarSeries,
    /// Bars that lost to another source's bar at the same timestamp.
    pub duplicates: usize,
}

/// Merges `sources` into one series.
///
/// Sources are taken in order; a timestamp present in several of them keeps
/// one bar chosen by `policy`. All sources must share one interval.
pub fn merge(sources: Vec<BarSeries>, policy: DuplicatePolicy) -> Result<Merged, MergeError> {
    let interval = sources
        .first()
        .map(BarSeries::interval)
        .ok_or(MergeError::NoSources)?;

    let mut by_ts: BTreeMap<i64, Bar> = BTreeMap::new();
    let mut duplicates = 0;
    for source in sources {
        if source.interval() != interval {
            return Err(MergeError::IntervalMismatch {
                expected: interval,
                found: source.interval(),
            });
        }
        for bar in source.into_bars() {
            match by_ts.entry(bar.timestamp) {
                Entry::Vacant(slot) => {
                    slot.insert(bar);
                }
                Entry::Occupied(mut slot) => {
                    duplicates += 1;
                    if policy == DuplicatePolicy::LastWins {
                        slot.insert(bar);
                    }
                }
            }
        }
    }

    Ok(Merged {
        series: BarSeries::from_bars(interval, by_ts.into_values().collect()),
        duplicates,
    })
}

/// Cuts `series` so it ends just before its first gap.
///
/// Returns the series unchanged and `None` when it is dense.
pub fn truncate_at_first_gap(series: BarSeries) -> (BarSeries, Option<Gap>) {
    match find_series_gaps(&series).into_iter().next() {
        Some(gap) => (series.truncated_before(gap.start), Some(gap)),
        None => (series, None),
    }
}
