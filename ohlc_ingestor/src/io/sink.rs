use std::path::{Path, PathBuf};

use async_trait::async_trait;
use snafu::{Backtrace, ResultExt, Snafu};
use tempfile::NamedTempFile;

use crate::models::bar_series::BarSeries;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// An error occurred while trying to write the data (e.g., file I/O error).
    #[snafu(display("Failed to write {}: {message}", path.display()))]
    WriteError {
        path: PathBuf,
        message: String,
        backtrace: Backtrace,
    },

    /// An error occurred while encoding the series into the destination format.
    #[snafu(display("Data conversion error: {source}"))]
    ConversionError {
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// A generic I/O error.
    #[snafu(display("I/O error on {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

#[async_trait]
pub trait DataSink {
    /// The type of output returned after a successful write operation.
    ///
    /// A file sink returns the path it wrote; an in-memory sink might return
    /// the number of bars it holds.
    type Output;

    /// Replaces the destination's contents with `series`.
    async fn write(&self, series: &BarSeries) -> Result<Self::Output, SinkError>;
}

/// Encodes a series as canonical CSV (`timestamp,open,high,low,close,volume`).
pub fn encode_csv(series: &BarSeries) -> Result<Vec<u8>, SinkError> {
    let mut writer = csv::Writer::from_writer(Vec::with_capacity(series.len() * 64));
    if series.is_empty() {
        // serialize() emits the header with the first record only
        writer
            .write_record(crate::models::bar::COLUMN_NAMES)
            .context(ConversionSnafu)?;
    }
    for bar in series.bars() {
        writer.serialize(bar).context(ConversionSnafu)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
        .context(ConversionSnafu)
}

/// Writes canonical CSV files, replacing the target in a single rename.
///
/// The file is written in full to a temporary file next to the target and
/// then persisted over it, so a reader sees the old contents or the new ones.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SinkError> {
    use std::io::Write;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).context(IoSnafu { path: &dir })?;

    let mut tmp = NamedTempFile::new_in(&dir).context(IoSnafu { path: &dir })?;
    tmp.write_all(bytes).context(IoSnafu { path })?;
    tmp.as_file().sync_all().context(IoSnafu { path })?;
    tmp.persist(path).map_err(|e| {
        WriteSnafu {
            path,
            message: e.error.to_string(),
        }
        .build()
    })?;
    Ok(())
}

#[async_trait]
impl DataSink for CsvFileSink {
    type Output = PathBuf;

    async fn write(&self, series: &BarSeries) -> Result<PathBuf, SinkError> {
        let bytes = encode_csv(series)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes).map(|()| path))
            .await
            .map_err(|e| {
                WriteSnafu {
                    path: self.path.clone(),
                    message: e.to_string(),
                }
                .build()
            })?
    }
}
