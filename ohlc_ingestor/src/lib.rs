//! Bar models, the OHLC provider abstraction, and CSV persistence for a
//! single-instrument minute series.

pub mod errors;
pub mod io;
pub mod models;
pub mod providers;

pub use errors::Error;
pub use models::{bar::Bar, bar_series::BarSeries, interval::Interval, request_params::OhlcRequest};
pub use providers::{OhlcSource, ProviderError};
