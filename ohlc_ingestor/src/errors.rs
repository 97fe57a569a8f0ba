use thiserror::Error;

use crate::{
    io::{sink::SinkError, source::SourceError},
    providers::{ProviderError, ProviderInitError},
};

/// The unified error type for the `ohlc_ingestor` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error originating from a data provider (e.g., API error, validation).
    #[error("Provider error")]
    Provider(#[from] ProviderError),

    /// The provider could not be constructed.
    #[error("Provider setup error")]
    ProviderInit(#[from] ProviderInitError),

    /// A tabular input could not be read.
    #[error("Source error")]
    Source(#[from] SourceError),

    /// An error originating from a data sink (e.g., file I/O).
    #[error("Sink error")]
    Sink(#[from] SinkError),
}
