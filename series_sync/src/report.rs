//! Progress and anomaly reporting.
//!
//! Engine code never logs on its own. Everything worth telling an operator
//! is a [`ReportEvent`] handed to the [`Reporter`] the caller injected, which
//! keeps the engine silent in tests and lets the binary route events into
//! `tracing`.

use std::{fmt, path::PathBuf, sync::Mutex};

use crate::{
    fetch::{FetchWindow, StopReason},
    gaps::{Gap, format_ts},
    reconcile::Stage,
};

/// How loudly an event should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Step-by-step detail.
    Debug,
    /// Normal progress.
    Info,
    /// Data problems the run tolerated.
    Warn,
}

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    /// The driver moved to a new stage.
    StageEntered {
        /// Stage just entered.
        stage: Stage,
    },
    /// A dataset was read from disk.
    SourceLoaded {
        /// Which input (`bulk`, `recent`, ...).
        label: &'static str,
        /// File it came from.
        path: PathBuf,
        /// Bars kept.
        bars: usize,
    },
    /// Rows were dropped while normalizing a dataset.
    RowsDropped {
        /// Which input.
        label: &'static str,
        /// Rows with at least one empty cell.
        null_rows: usize,
        /// Rows whose timestamp is off the interval grid.
        misaligned_rows: usize,
        /// Rows superseded by a later row with the same timestamp.
        duplicate_rows: usize,
    },
    /// The recent-tail file does not exist yet.
    TailMissing {
        /// Where it was looked for.
        path: PathBuf,
    },
    /// The tail does not start right after the bulk history.
    TailDiscontinuity {
        /// Last bulk timestamp.
        bulk_last: i64,
        /// First tail timestamp.
        tail_first: i64,
    },
    /// Nothing to fetch: the last complete bar is already stored.
    UpToDate {
        /// Last stored timestamp.
        last_known: i64,
        /// Last complete bar timestamp.
        current: i64,
    },
    /// The range that will be fetched, bounds inclusive.
    MissingRange {
        /// First missing timestamp.
        start: i64,
        /// Last missing timestamp.
        end: i64,
        /// Number of bars in the range.
        bars: i64,
    },
    /// A fetch call is about to be issued.
    FetchRequested {
        /// The call's window.
        window: FetchWindow,
    },
    /// A fetch call returned rows.
    FetchReceived {
        /// The call's window.
        window: FetchWindow,
        /// Rows inside the target range.
        kept: usize,
        /// Rows outside the target range or off the grid, thrown away.
        discarded: usize,
        /// Last kept timestamp.
        last: i64,
    },
    /// A fetch call returned nothing usable.
    FetchEmpty {
        /// The call's window.
        window: FetchWindow,
    },
    /// A fetch call failed.
    FetchFailed {
        /// The call's window.
        window: FetchWindow,
        /// Rendered provider error.
        error: String,
    },
    /// The fetch loop ended.
    FetchStopped {
        /// Why it ended.
        reason: StopReason,
        /// Bars collected over all calls.
        fetched: usize,
        /// Calls issued.
        calls: usize,
    },
    /// A gap was found in a merged dataset.
    GapDetected {
        /// The gap.
        gap: Gap,
    },
    /// A dataset was cut short before its first gap.
    Truncated {
        /// The gap the cut was made at.
        gap: Gap,
        /// Bars left after the cut.
        kept: usize,
    },
    /// Overlapping sources disagreed on timestamps that were collapsed.
    DuplicatesResolved {
        /// Bars dropped in favor of another source.
        count: usize,
    },
    /// Flat bars were synthesized for missing timestamps.
    Densified {
        /// Bars added.
        synthesized: usize,
    },
    /// Timestamps are still missing after filling.
    ResidualGaps {
        /// Missing bars in total.
        missing: i64,
        /// Number of gaps they form.
        gaps: usize,
    },
    /// The series is dense.
    NoMissing,
    /// Some prices or volumes are NaN or infinite.
    NonFinite {
        /// Offending cells.
        count: usize,
    },
    /// Every cell is finite.
    NoNulls,
    /// Some bars report negative volume.
    NegativeVolume {
        /// Offending bars.
        count: usize,
    },
    /// The series was written out.
    Persisted {
        /// Bars written.
        bars: usize,
        /// First timestamp, if any.
        first: Option<i64>,
        /// Last timestamp, if any.
        last: Option<i64>,
    },
}

impl ReportEvent {
    /// Default severity for this kind of event.
    pub fn severity(&self) -> Severity {
        use ReportEvent::*;
        match self {
            StageEntered { .. } | FetchRequested { .. } => Severity::Debug,
            RowsDropped { .. }
            | TailDiscontinuity { .. }
            | FetchFailed { .. }
            | GapDetected { .. }
            | Truncated { .. }
            | ResidualGaps { .. }
            | NonFinite { .. }
            | NegativeVolume { .. } => Severity::Warn,
            FetchStopped { reason, .. } if reason.is_failure() => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for ReportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ReportEvent::*;
        match self {
            StageEntered { stage } => write!(f, "entering stage {stage:?}"),
            SourceLoaded { label, path, bars } => {
                write!(f, "loaded {bars} bars of {label} data from {}", path.display())
            }
            RowsDropped {
                label,
                null_rows,
                misaligned_rows,
                duplicate_rows,
            } => write!(
                f,
                "{label}: dropped {null_rows} rows with null fields, \
                 {misaligned_rows} misaligned, {duplicate_rows} duplicate"
            ),
            TailMissing { path } => {
                write!(f, "no recent data at {}; starting from bulk history", path.display())
            }
            TailDiscontinuity {
                bulk_last,
                tail_first,
            } => write!(
                f,
                "recent data starts at {} but bulk history ends at {}",
                format_ts(*tail_first),
                format_ts(*bulk_last)
            ),
            UpToDate {
                last_known,
                current,
            } => write!(
                f,
                "up to date: last stored bar {} covers last complete bar {}",
                format_ts(*last_known),
                format_ts(*current)
            ),
            MissingRange { start, end, bars } => write!(
                f,
                "fetching {bars} missing bars {} .. {}",
                format_ts(*start),
                format_ts(*end)
            ),
            FetchRequested { window } => write!(f, "requesting {window}"),
            FetchReceived {
                window,
                kept,
                discarded,
                last,
            } => {
                write!(f, "{window}: got {kept} bars up to {}", format_ts(*last))?;
                if *discarded > 0 {
                    write!(f, " ({discarded} unusable rows dropped)")?;
                }
                Ok(())
            }
            FetchEmpty { window } => write!(f, "{window}: no more data"),
            FetchFailed { window, error } => write!(f, "{window}: request failed: {error}"),
            FetchStopped {
                reason,
                fetched,
                calls,
            } => write!(f, "fetched {fetched} bars in {calls} calls; {reason}"),
            GapDetected { gap } => write!(f, "gap {gap}"),
            Truncated { gap, kept } => {
                write!(f, "truncated before first gap {gap}; {kept} bars kept")
            }
            DuplicatesResolved { count } => write!(f, "resolved {count} duplicate timestamps"),
            Densified { synthesized } => {
                write!(f, "filled {synthesized} missing bars with flat bars")
            }
            ResidualGaps { missing, gaps } => {
                write!(f, "{missing} bars still missing across {gaps} gaps")
            }
            NoMissing => f.write_str("no missing minutes"),
            NonFinite { count } => write!(f, "{count} non-finite values"),
            NoNulls => f.write_str("no null values"),
            NegativeVolume { count } => write!(f, "{count} bars with negative volume"),
            Persisted { bars, first, last } => {
                write!(f, "persisted {bars} bars")?;
                if let (Some(first), Some(last)) = (first, last) {
                    write!(f, " from {} to {}", format_ts(*first), format_ts(*last))?;
                }
                Ok(())
            }
        }
    }
}

/// Sink for [`ReportEvent`]s.
pub trait Reporter: Send + Sync {
    /// Records one event.
    fn report(&self, event: ReportEvent);
}

/// Forwards events to `tracing` at their [`Severity`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: ReportEvent) {
        match event.severity() {
            Severity::Debug => tracing::debug!("{event}"),
            Severity::Info => tracing::info!("{event}"),
            Severity::Warn => tracing::warn!("{event}"),
        }
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _event: ReportEvent) {}
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events at [`Severity::Warn`].
    pub fn warnings(&self) -> Vec<ReportEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.severity() == Severity::Warn)
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
