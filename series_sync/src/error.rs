//! Fatal error taxonomy for a sync run.
//!
//! Everything here aborts the run. Problems the run can live with (failed
//! fetch calls, residual gaps, null cells) are reported through
//! [`crate::report::Reporter`] instead.

use std::path::PathBuf;

use ohlc_ingestor::{
    io::{sink::SinkError, source::SourceError},
    providers::ProviderInitError,
};
use thiserror::Error;

use crate::{config::ConfigError, merge::MergeError};

/// Errors that stop a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A file required to bootstrap the series does not exist.
    #[error("required dataset not found at {}", path.display())]
    BootstrapMissing {
        /// The path that was expected to exist.
        path: PathBuf,
    },

    /// A source file exists but could not be parsed.
    #[error("failed to load {label} dataset")]
    SourceLoad {
        /// Which input failed (`bulk`, `recent`, ...).
        label: &'static str,
        /// Underlying CSV error, which carries the path.
        #[source]
        source: SourceError,
    },

    /// The baseline dataset parsed but holds no usable bars.
    #[error("{} contains no usable bars", path.display())]
    EmptyBaseline {
        /// The empty file.
        path: PathBuf,
    },

    /// Sources could not be combined.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// The reconciled series could not be written.
    #[error("failed to persist series")]
    Persist(#[from] SinkError),

    /// The configuration is unreadable or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The quote API client could not be constructed.
    #[error("failed to initialize provider")]
    ProviderInit(#[from] ProviderInitError),
}
