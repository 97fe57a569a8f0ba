//! Fixed-width bar interval expressed in whole seconds.
//!
//! All math is plain epoch-second arithmetic in UTC; there are no calendar
//! aware units because every supported interval has a constant width.
//!
//! ```
//! use ohlc_ingestor::models::interval::Interval;
//!
//! let one_min: Interval = "1m".parse().unwrap();
//! assert_eq!(one_min, Interval::MINUTE);
//! assert_eq!(one_min.align_down(125), 120);
//! assert_eq!(one_min.to_string(), "1m");
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of seconds in a minute.
pub const SECS_PER_MINUTE: i64 = 60;
/// Number of seconds in an hour.
pub const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
/// Number of seconds in a day.
pub const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntervalError {
    #[error("empty interval")]
    Empty,

    #[error("interval amount must be > 0")]
    Zero,

    #[error("invalid interval amount in {input:?}")]
    InvalidAmount { input: String },

    #[error("unknown interval unit {unit:?} (expected s, m, h or d)")]
    UnknownUnit { unit: String },
}

/// Width of one bar in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval(NonZeroU32);

impl Interval {
    /// The one-minute interval used by the persisted series.
    pub const MINUTE: Interval = match NonZeroU32::new(SECS_PER_MINUTE as u32) {
        Some(nz) => Interval(nz),
        None => unreachable!(),
    };

    pub const fn from_secs(secs: NonZeroU32) -> Self {
        Self(secs)
    }

    pub const fn secs(&self) -> i64 {
        self.0.get() as i64
    }

    /// Largest interval boundary `<= ts`.
    pub fn align_down(&self, ts: i64) -> i64 {
        ts.div_euclid(self.secs()) * self.secs()
    }

    pub fn is_aligned(&self, ts: i64) -> bool {
        ts.rem_euclid(self.secs()) == 0
    }

    /// Timestamp `n` intervals after `ts`.
    pub fn step(&self, ts: i64, n: i64) -> i64 {
        ts + n * self.secs()
    }

    /// Whole intervals from `start` up to `end` (negative if `end < start`).
    pub fn steps_between(&self, start: i64, end: i64) -> i64 {
        (end - start).div_euclid(self.secs())
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::MINUTE
    }
}

/// Display in the largest whole unit: `60` → `"1m"`, `90` → `"90s"`.
impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.secs();
        if s % SECS_PER_DAY == 0 {
            write!(f, "{}d", s / SECS_PER_DAY)
        } else if s % SECS_PER_HOUR == 0 {
            write!(f, "{}h", s / SECS_PER_HOUR)
        } else if s % SECS_PER_MINUTE == 0 {
            write!(f, "{}m", s / SECS_PER_MINUTE)
        } else {
            write!(f, "{s}s")
        }
    }
}

impl FromStr for Interval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // very small parser: 60s / 1m / 4h / 1d
        let s = s.trim();
        if s.is_empty() {
            return Err(IntervalError::Empty);
        }
        let (digits, unit) = s.split_at(s.len() - 1);
        let amount: u32 = digits.parse().map_err(|_| IntervalError::InvalidAmount {
            input: s.to_string(),
        })?;
        let per_unit = match unit {
            "s" => 1,
            "m" => SECS_PER_MINUTE as u32,
            "h" => SECS_PER_HOUR as u32,
            "d" => SECS_PER_DAY as u32,
            _ => {
                return Err(IntervalError::UnknownUnit {
                    unit: unit.to_string(),
                });
            }
        };
        let secs = amount
            .checked_mul(per_unit)
            .ok_or_else(|| IntervalError::InvalidAmount {
                input: s.to_string(),
            })?;
        NonZeroU32::new(secs).map(Self).ok_or(IntervalError::Zero)
    }
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
