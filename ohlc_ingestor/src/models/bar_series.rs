//! An ordered, duplicate-free run of bars at a fixed interval.

use std::collections::BTreeMap;

use crate::models::{bar::Bar, interval::Interval};

/// Bars strictly increasing by timestamp, all at the same [`Interval`].
///
/// The only way in is through the constructors, which sort and drop
/// duplicate timestamps, so every `BarSeries` upholds the ordering invariant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarSeries {
    interval: Interval,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn empty(interval: Interval) -> Self {
        Self {
            interval,
            bars: Vec::new(),
        }
    }

    /// Builds a series from bars in any order. For duplicate timestamps the
    /// bar that comes last in `bars` is kept.
    pub fn from_bars(interval: Interval, bars: Vec<Bar>) -> Self {
        Self::from_bars_counted(interval, bars).0
    }

    /// Like [`BarSeries::from_bars`], also returning how many duplicates were dropped.
    pub fn from_bars_counted(interval: Interval, bars: Vec<Bar>) -> (Self, usize) {
        let total = bars.len();
        let by_ts: BTreeMap<i64, Bar> = bars.into_iter().map(|b| (b.timestamp, b)).collect();
        let bars: Vec<Bar> = by_ts.into_values().collect();
        let dropped = total - bars.len();
        (Self { interval, bars }, dropped)
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn first_timestamp(&self) -> Option<i64> {
        self.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.last().map(|b| b.timestamp)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.bars.iter().map(|b| b.timestamp)
    }

    /// Keeps only the bars with `timestamp < cutoff`.
    pub fn truncated_before(mut self, cutoff: i64) -> Self {
        let keep = self.bars.partition_point(|b| b.timestamp < cutoff);
        self.bars.truncate(keep);
        self
    }

    /// Binary search by timestamp.
    pub fn get(&self, timestamp: i64) -> Option<&Bar> {
        self.bars
            .binary_search_by_key(&timestamp, |b| b.timestamp)
            .ok()
            .map(|i| &self.bars[i])
    }
}
