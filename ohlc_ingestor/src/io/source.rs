//! CSV loading with per-source column naming.
//!
//! Every tabular input is read through a [`SourceKind`], whose static rename
//! table maps the file's header names onto the canonical schema
//! ([`COLUMN_NAMES`]). Loading is two-step: [`read_table`] keeps every row as
//! written (nulls included) for inspection, and [`RawTable::into_series`]
//! turns it into a [`BarSeries`], counting whatever it had to drop.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use csv::{ReaderBuilder, StringRecord};
use snafu::{Backtrace, ResultExt, Snafu};

use crate::models::{
    bar::{Bar, COLUMN_NAMES},
    bar_series::BarSeries,
    interval::Interval,
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceError {
    /// The file could not be opened or its header row read.
    #[snafu(display("Failed to open {}: {source}", path.display()))]
    Open {
        path: PathBuf,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// A required column is absent from the header row.
    #[snafu(display("{} has no column {column:?} (expected for {kind})", path.display()))]
    MissingColumn {
        path: PathBuf,
        column: &'static str,
        kind: SourceKind,
        backtrace: Backtrace,
    },

    /// A row could not be read (bad quoting, I/O, ...).
    #[snafu(display("Failed to read {} near line {line}: {source}", path.display()))]
    Record {
        path: PathBuf,
        line: u64,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// A non-empty cell is not a number.
    #[snafu(display("{} line {line}: column {column:?} has unparseable value {value:?}", path.display()))]
    Parse {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
        backtrace: Backtrace,
    },
}

/// Naming convention of a tabular input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceKind {
    /// The persisted layout: `timestamp,open,high,low,close,volume`.
    #[default]
    Canonical,
    /// The long-horizon bulk export with capitalized headers.
    BulkExport,
    /// The gap-fill export, whose timestamp column is `timestamp_unix`.
    GapExport,
}

const BULK_EXPORT_COLUMNS: [&str; 6] = ["Timestamp", "Open", "High", "Low", "Close", "Volume"];
const GAP_EXPORT_COLUMNS: [&str; 6] = ["timestamp_unix", "open", "high", "low", "close", "volume"];

impl SourceKind {
    /// Source header names, position-aligned with [`COLUMN_NAMES`].
    pub const fn column_names(self) -> &'static [&'static str; 6] {
        match self {
            SourceKind::Canonical => &COLUMN_NAMES,
            SourceKind::BulkExport => &BULK_EXPORT_COLUMNS,
            SourceKind::GapExport => &GAP_EXPORT_COLUMNS,
        }
    }

    /// `(source name, canonical name)` pairs.
    pub fn rename_table(self) -> impl Iterator<Item = (&'static str, &'static str)> {
        self.column_names().iter().copied().zip(COLUMN_NAMES)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::Canonical => "canonical",
            SourceKind::BulkExport => "bulk-export",
            SourceKind::GapExport => "gap-export",
        })
    }
}

impl FromStr for SourceKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "canonical" => Ok(SourceKind::Canonical),
            "bulk-export" | "bulk_export" | "bulk" => Ok(SourceKind::BulkExport),
            "gap-export" | "gap_export" | "gaps" => Ok(SourceKind::GapExport),
            other => Err(format!("unknown source kind: {other}")),
        }
    }
}

/// One row as written in the file; `None` marks an empty or NaN cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRow {
    pub timestamp: Option<i64>,
    /// open, high, low, close, volume
    pub values: [Option<f64>; 5],
}

impl RawRow {
    pub fn null_count(&self) -> usize {
        usize::from(self.timestamp.is_none()) + self.values.iter().filter(|v| v.is_none()).count()
    }

    fn to_bar(self) -> Option<Bar> {
        let [o, h, l, c, v] = self.values;
        Some(Bar::new(self.timestamp?, o?, h?, l?, c?, v?))
    }
}

/// All rows of one file, in file order, already mapped to the canonical columns.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub kind: SourceKind,
    pub rows: Vec<RawRow>,
}

/// What [`RawTable::into_series`] produced and what it dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedSeries {
    pub series: BarSeries,
    /// Rows removed because at least one cell was null.
    pub null_rows: usize,
    /// Rows removed because their timestamp is off the interval grid.
    pub misaligned_rows: usize,
    /// Rows removed as duplicate timestamps (keep-last).
    pub duplicate_rows: usize,
}

impl RawTable {
    pub fn into_series(self, interval: Interval) -> LoadedSeries {
        let mut null_rows = 0;
        let mut misaligned_rows = 0;
        let mut bars = Vec::with_capacity(self.rows.len());
        for row in self.rows {
            match row.to_bar() {
                None => null_rows += 1,
                Some(bar) if !interval.is_aligned(bar.timestamp) => misaligned_rows += 1,
                Some(bar) => bars.push(bar),
            }
        }
        let (series, duplicate_rows) = BarSeries::from_bars_counted(interval, bars);
        LoadedSeries {
            series,
            null_rows,
            misaligned_rows,
            duplicate_rows,
        }
    }
}

fn is_null(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("null")
}

fn parse_f64(
    path: &Path,
    line: u64,
    column: &'static str,
    cell: &str,
) -> Result<Option<f64>, SourceError> {
    if is_null(cell) {
        return Ok(None);
    }
    cell.trim().parse::<f64>().map(Some).map_err(|_| {
        ParseSnafu {
            path,
            line,
            column,
            value: cell,
        }
        .build()
    })
}

/// Integer seconds; integral floats such as `1325317920.0` are accepted.
fn parse_timestamp(path: &Path, line: u64, cell: &str) -> Result<Option<i64>, SourceError> {
    if is_null(cell) {
        return Ok(None);
    }
    let cell = cell.trim();
    if let Ok(ts) = cell.parse::<i64>() {
        return Ok(Some(ts));
    }
    match cell.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
        _ => ParseSnafu {
            path,
            line,
            column: COLUMN_NAMES[0],
            value: cell,
        }
        .fail(),
    }
}

fn column_positions(
    path: &Path,
    headers: &StringRecord,
    kind: SourceKind,
) -> Result<[usize; 6], SourceError> {
    let mut positions = [0usize; 6];
    for (slot, (source_name, _)) in positions.iter_mut().zip(kind.rename_table()) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == source_name)
            .ok_or_else(|| {
                MissingColumnSnafu {
                    path,
                    column: source_name,
                    kind,
                }
                .build()
            })?;
    }
    Ok(positions)
}

/// Reads every row of a CSV file, mapping its columns through `kind`.
///
/// Extra columns are ignored. Null cells are preserved as `None`; any other
/// unparseable cell fails the whole load.
pub fn read_table(path: impl AsRef<Path>, kind: SourceKind) -> Result<RawTable, SourceError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(OpenSnafu { path })?;
    let headers = reader.headers().context(OpenSnafu { path })?.clone();
    let pos = column_positions(path, &headers, kind)?;

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    loop {
        let line = reader.position().line();
        let more = reader
            .read_record(&mut record)
            .context(RecordSnafu { path, line })?;
        if !more {
            break;
        }
        let cell = |i: usize| record.get(pos[i]).unwrap_or("");
        let timestamp = parse_timestamp(path, line, cell(0))?;
        let mut values = [None; 5];
        for (i, slot) in values.iter_mut().enumerate() {
            *slot = parse_f64(path, line, COLUMN_NAMES[i + 1], cell(i + 1))?;
        }
        rows.push(RawRow { timestamp, values });
    }

    tracing::debug!(path = %path.display(), %kind, rows = rows.len(), "read table");
    Ok(RawTable { kind, rows })
}

/// [`read_table`] followed by [`RawTable::into_series`].
pub fn load_series(
    path: impl AsRef<Path>,
    kind: SourceKind,
    interval: Interval,
) -> Result<LoadedSeries, SourceError> {
    Ok(read_table(path, kind)?.into_series(interval))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::with_suffix(".csv").unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn bulk_export_headers_are_renamed() {
        let f = write_csv(
            "Timestamp,Open,High,Low,Close,Volume\n\
             1325317920.0,4.39,4.39,4.39,4.39,0.455\n\
             1325317980.0,4.39,4.40,4.38,4.40,1.0\n",
        );
        let loaded = load_series(f.path(), SourceKind::BulkExport, Interval::MINUTE).unwrap();
        assert_eq!(loaded.series.len(), 2);
        assert_eq!(
            loaded.series.first().copied(),
            Some(Bar::new(1_325_317_920, 4.39, 4.39, 4.39, 4.39, 0.455))
        );
        assert_eq!(loaded.null_rows, 0);
    }

    #[test]
    fn gap_export_headers_and_extra_columns() {
        let f = write_csv(
            "timestamp_unix,datetime,open,high,low,close,volume\n\
             120,2025-01-01,1,2,0.5,1.5,3\n",
        );
        let loaded = load_series(f.path(), SourceKind::GapExport, Interval::MINUTE).unwrap();
        assert_eq!(
            loaded.series.bars(),
            &[Bar::new(120, 1.0, 2.0, 0.5, 1.5, 3.0)]
        );
    }

    #[test]
    fn wrong_kind_reports_missing_column() {
        let f = write_csv("timestamp,open,high,low,close,volume\n60,1,1,1,1,1\n");
        let err = read_table(f.path(), SourceKind::BulkExport).unwrap_err();
        match err {
            SourceError::MissingColumn { column, .. } => assert_eq!(column, "Timestamp"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn nulls_are_kept_in_table_and_dropped_from_series() {
        let f = write_csv(
            "timestamp,open,high,low,close,volume\n\
             60,1,1,1,1,1\n\
             120,,1,1,1,1\n\
             180,NaN,1,1,1,1\n\
             200,1,1,1,1,1\n\
             60,2,2,2,2,2\n",
        );
        let table = read_table(f.path(), SourceKind::Canonical).unwrap();
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.rows[1].null_count(), 1);

        let loaded = table.into_series(Interval::MINUTE);
        assert_eq!(loaded.null_rows, 2);
        assert_eq!(loaded.misaligned_rows, 1);
        assert_eq!(loaded.duplicate_rows, 1);
        assert_eq!(loaded.series.len(), 1);
        assert_eq!(loaded.series.get(60).unwrap().close, 2.0);
    }

    #[test]
    fn garbage_cell_fails_the_load() {
        let f = write_csv("timestamp,open,high,low,close,volume\n60,abc,1,1,1,1\n");
        let err = read_table(f.path(), SourceKind::Canonical).unwrap_err();
        assert!(matches!(err, SourceError::Parse { column: "open", .. }));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = read_table("/definitely/not/here.csv", SourceKind::Canonical).unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }));
    }

    #[test]
    fn source_kind_parses_cli_spellings() {
        assert_eq!("bulk-export".parse::<SourceKind>(), Ok(SourceKind::BulkExport));
        assert_eq!("gap_export".parse::<SourceKind>(), Ok(SourceKind::GapExport));
        assert_eq!("Canonical".parse::<SourceKind>(), Ok(SourceKind::Canonical));
        assert!("parquet".parse::<SourceKind>().is_err());
    }
}
