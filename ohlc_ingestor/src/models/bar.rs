//! Canonical in-memory representation of a one-interval OHLCV bar.
//!
//! This struct is the output of every [`OhlcSource`](crate::providers::OhlcSource)
//! and of every CSV loader, regardless of how the source names its columns.

use serde::{Deserialize, Serialize};

/// Column order of the persisted schema.
pub const COLUMN_NAMES: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

/// A single bar for one interval.
///
/// Field order matches [`COLUMN_NAMES`], so serializing a `Bar` with `csv`
/// produces the canonical layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Interval start, epoch seconds (UTC).
    pub timestamp: i64,

    /// Opening price.
    pub open: f64,

    /// Highest price during the interval.
    pub high: f64,

    /// Lowest price during the interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the interval.
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// A "no trades" bar: every price equals `price`, volume is zero.
    pub fn flat(timestamp: i64, price: f64) -> Self {
        Self::new(timestamp, price, price, price, price, 0.0)
    }

    /// Price and volume fields in schema order.
    pub fn values(&self) -> [f64; 5] {
        [self.open, self.high, self.low, self.close, self.volume]
    }

    /// Number of NaN or infinite fields.
    pub fn non_finite_count(&self) -> usize {
        self.values().iter().filter(|v| !v.is_finite()).count()
    }
}
