use serde::{Deserialize, Serialize};

use crate::models::interval::Interval;

/// Hard cap on bars per OHLC call.
pub const MAX_LIMIT: u32 = 1000;

/// Parameters for one bounded OHLC call.
///
/// This is the vendor-agnostic input of every
/// [`OhlcSource`](crate::providers::OhlcSource). `start` and `end` are both
/// inclusive bar timestamps; `limit` is the number of bars the window spans.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OhlcRequest {
    /// Instrument code as the provider spells it (e.g. `"btcusd"`).
    pub pair: String,

    /// First bar timestamp, epoch seconds.
    pub start: i64,

    /// Last bar timestamp, epoch seconds. Providers that rank `limit` above
    /// `end` may ignore it, so callers must size `limit` to match.
    pub end: i64,

    /// Bar width.
    pub step: Interval,

    /// Maximum number of bars to return, `1..=MAX_LIMIT`.
    pub limit: u32,
}

impl OhlcRequest {
    /// Checks the invariants every provider relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.pair.trim().is_empty() {
            return Err("pair must not be empty".into());
        }
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(format!("limit {} outside 1..={MAX_LIMIT}", self.limit));
        }
        if self.end < self.start {
            return Err(format!("end {} before start {}", self.end, self.start));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(limit: u32) -> OhlcRequest {
        OhlcRequest {
            pair: "btcusd".into(),
            start: 60,
            end: 120,
            step: Interval::MINUTE,
            limit,
        }
    }

    #[test]
    fn limit_bounds_are_enforced() {
        assert!(request(1).validate().is_ok());
        assert!(request(MAX_LIMIT).validate().is_ok());
        assert!(request(0).validate().is_err());
        assert!(request(MAX_LIMIT + 1).validate().is_err());
    }

    #[test]
    fn reversed_window_is_rejected() {
        let mut r = request(2);
        r.end = 0;
        assert!(r.validate().unwrap_err().contains("before start"));
    }
}
