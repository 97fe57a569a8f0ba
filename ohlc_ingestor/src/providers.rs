//! Provider abstraction for OHLC quote APIs.
//!
//! This module defines the [`OhlcSource`] trait, the single capability the
//! reconciliation engine needs from a remote API: "give me up to `limit` bars
//! starting at `start`".
//!
//! A successful call with an empty vector means the provider has no bars for
//! the window. A transport, HTTP, or decoding failure is an `Err`. Callers
//! that want best-effort behavior decide themselves how to treat the error.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use ohlc_ingestor::models::{bar::Bar, request_params::OhlcRequest};
//! use ohlc_ingestor::providers::{OhlcSource, ProviderError};
//!
//! struct Silent;
//!
//! #[async_trait]
//! impl OhlcSource for Silent {
//!     async fn fetch_bars(&self, _request: &OhlcRequest) -> Result<Vec<Bar>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod bitstamp_rest;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::{bar::Bar, request_params::OhlcRequest};

/// Fetches one bounded window of bars from a quote API.
///
/// Implementations must not retry internally and must return bars for the
/// requested pair and step only.
#[async_trait]
pub trait OhlcSource: Send + Sync {
    /// Fetches at most `request.limit` bars starting at `request.start`.
    ///
    /// # Returns
    ///
    /// * `Ok(bars)` - Bars in any order; empty when the API has nothing.
    /// * `Err(ProviderError)` - The call failed; no partial data is returned.
    async fn fetch_bars(&self, request: &OhlcRequest) -> Result<Vec<Bar>, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Base URL could not be parsed.
    #[snafu(display("Invalid base URL {url:?}: {message}"))]
    InvalidBaseUrl {
        url: String,
        message: String,
        backtrace: Backtrace,
    },

    /// Rate limit must allow at least one request per second.
    #[snafu(display("Invalid rate limit: {message}"))]
    InvalidRateLimit {
        message: String,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within an `OhlcSource` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API returned an error status or error body.
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// The response body could not be turned into bars.
    #[snafu(display("Malformed provider response: {message}"))]
    Decode {
        message: String,
        backtrace: Backtrace,
    },
}
