//! Read-only summary of a dataset on disk.
//!
//! Works on the raw table rather than a [`BarSeries`](ohlc_ingestor::BarSeries)
//! so that nulls and duplicate timestamps are visible instead of silently
//! dropped.

use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use ohlc_ingestor::{
    io::source::{RawRow, RawTable, SourceKind, read_table},
    models::bar::COLUMN_NAMES,
};

use crate::gaps::format_ts;

const PREVIEW_ROWS: usize = 5;

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    /// Non-null cells.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation; NaN for fewer than two cells.
    pub std: f64,
    /// Smallest value.
    pub min: f64,
    /// First quartile.
    pub q25: f64,
    /// Median.
    pub q50: f64,
    /// Third quartile.
    pub q75: f64,
    /// Largest value.
    pub max: f64,
}

impl ColumnStats {
    /// Statistics of `values`; `None` when there are none.
    pub fn of(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let std = if n > 1 {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            f64::NAN
        };
        Some(Self {
            count: n,
            mean,
            std,
            min: values[0],
            q25: quantile(&values, 0.25),
            q50: quantile(&values, 0.5),
            q75: quantile(&values, 0.75),
            max: values[n - 1],
        })
    }
}

// linear interpolation between closest ranks; `sorted` must be non-empty
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Everything `inspect` prints about a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetReport {
    /// File inspected.
    pub path: PathBuf,
    /// Naming convention it was read with.
    pub kind: SourceKind,
    /// Rows in the file.
    pub rows: usize,
    /// Smallest and largest non-null timestamp.
    pub range: Option<(i64, i64)>,
    /// Null cells per canonical column.
    pub nulls: IndexMap<&'static str, usize>,
    /// Rows whose timestamp already appeared earlier in the file.
    pub duplicate_timestamps: usize,
    /// Statistics per canonical column.
    pub stats: IndexMap<&'static str, Option<ColumnStats>>,
    /// First rows.
    pub head: Vec<RawRow>,
    /// Last rows.
    pub tail: Vec<RawRow>,
}

impl DatasetReport {
    /// Builds the report for an already-read table.
    pub fn from_table(path: impl Into<PathBuf>, table: &RawTable) -> Self {
        let rows = &table.rows;
        let column = |i: usize| -> Vec<Option<f64>> {
            rows.iter()
                .map(|r| match i {
                    0 => r.timestamp.map(|t| t as f64),
                    _ => r.values[i - 1],
                })
                .collect()
        };

        let mut nulls = IndexMap::new();
        let mut stats = IndexMap::new();
        for (i, name) in COLUMN_NAMES.iter().enumerate() {
            let cells = column(i);
            nulls.insert(*name, cells.iter().filter(|c| c.is_none()).count());
            stats.insert(*name, ColumnStats::of(cells.into_iter().flatten().collect()));
        }

        let stamps: Vec<i64> = rows.iter().filter_map(|r| r.timestamp).collect();
        let unique: HashSet<i64> = stamps.iter().copied().collect();
        let range = stamps.iter().min().zip(stamps.iter().max()).map(|(a, b)| (*a, *b));

        Self {
            path: path.into(),
            kind: table.kind,
            rows: rows.len(),
            range,
            nulls,
            duplicate_timestamps: stamps.len() - unique.len(),
            stats,
            head: rows.iter().take(PREVIEW_ROWS).copied().collect(),
            tail: rows[rows.len().saturating_sub(PREVIEW_ROWS)..].to_vec(),
        }
    }
}

/// Reads `path` as `kind` and summarizes it.
pub fn inspect_file(
    path: impl AsRef<Path>,
    kind: SourceKind,
) -> Result<DatasetReport, ohlc_ingestor::Error> {
    let path = path.as_ref();
    let table = read_table(path, kind)?;
    Ok(DatasetReport::from_table(path, &table))
}

fn cell(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "null".into())
}

fn write_rows(f: &mut fmt::Formatter<'_>, rows: &[RawRow]) -> fmt::Result {
    writeln!(f, "{}", COLUMN_NAMES.join(","))?;
    for r in rows {
        let ts = r.timestamp.map(|t| t.to_string()).unwrap_or_else(|| "null".into());
        let values: Vec<String> = r.values.iter().copied().map(cell).collect();
        writeln!(f, "{ts},{}", values.join(","))?;
    }
    Ok(())
}

impl fmt::Display for DatasetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
            writeln!(f)?;
            writeln!(f, "{title}")?;
            writeln!(f, "{}", "-".repeat(title.len()))
        }

        writeln!(f, "{} ({}, {} rows)", self.path.display(), self.kind, self.rows)?;

        section(f, "Range")?;
        match self.range {
            Some((lo, hi)) => {
                writeln!(f, "first  {lo}  {}", format_ts(lo))?;
                writeln!(f, "last   {hi}  {}", format_ts(hi))?;
            }
            None => writeln!(f, "(no timestamps)")?,
        }

        section(f, "Schema")?;
        for (source, canonical) in self.kind.rename_table() {
            let ty = if canonical == "timestamp" { "int64" } else { "float64" };
            if source == canonical {
                writeln!(f, "{canonical}: {ty}")?;
            } else {
                writeln!(f, "{canonical}: {ty}  (from {source})")?;
            }
        }

        section(f, "Missing values")?;
        for (name, n) in &self.nulls {
            writeln!(f, "{name}: {n}")?;
        }
        writeln!(f, "duplicate timestamps: {}", self.duplicate_timestamps)?;

        section(f, "Statistics")?;
        writeln!(f, "column,count,mean,std,min,25%,50%,75%,max")?;
        for (name, stats) in &self.stats {
            match stats {
                Some(s) => writeln!(
                    f,
                    "{name},{},{},{},{},{},{},{},{}",
                    s.count, s.mean, s.std, s.min, s.q25, s.q50, s.q75, s.max
                )?,
                None => writeln!(f, "{name},0")?,
            }
        }

        section(f, "Head")?;
        write_rows(f, &self.head)?;
        section(f, "Tail")?;
        write_rows(f, &self.tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ts: Option<i64>, close: Option<f64>) -> RawRow {
        RawRow {
            timestamp: ts,
            values: [Some(1.0), Some(1.0), Some(1.0), close, Some(0.0)],
        }
    }

    #[test]
    fn quartiles_interpolate_linearly() {
        let s = ColumnStats::of(vec![4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!((s.min, s.max, s.count), (1.0, 4.0, 4));
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.q25, 1.75);
        assert_eq!(s.q50, 2.5);
        assert_eq!(s.q75, 3.25);
        assert!((s.std - 1.290_994_448_735_805_6).abs() < 1e-12);

        let one = ColumnStats::of(vec![7.0]).unwrap();
        assert!(one.std.is_nan());
        assert_eq!(ColumnStats::of(vec![]), None);
    }

    #[test]
    fn report_counts_nulls_and_duplicates() {
        let table = RawTable {
            kind: SourceKind::Canonical,
            rows: (0..8)
                .map(|n| row(Some(n * 60), Some(n as f64)))
                .chain([row(Some(0), None), row(None, Some(1.0))])
                .collect(),
        };
        let report = DatasetReport::from_table("mem.csv", &table);

        assert_eq!(report.rows, 10);
        assert_eq!(report.range, Some((0, 420)));
        assert_eq!(report.nulls["timestamp"], 1);
        assert_eq!(report.nulls["close"], 1);
        assert_eq!(report.nulls["open"], 0);
        assert_eq!(report.duplicate_timestamps, 1);
        assert_eq!(report.stats["close"].unwrap().count, 9);
        assert_eq!(report.head.len(), 5);
        assert_eq!(report.tail.last(), Some(&row(None, Some(1.0))));

        let shown = report.to_string();
        assert!(shown.contains("1970-01-01T00:07:00+00:00"));
        assert!(shown.contains("duplicate timestamps: 1"));
        assert!(shown.contains("null"));
    }

    #[test]
    fn empty_table_renders() {
        let report = DatasetReport::from_table("empty.csv", &RawTable::default());
        assert_eq!(report.range, None);
        assert!(report.head.is_empty());
        assert!(report.to_string().contains("(no timestamps)"));
    }
}
