//! Bitstamp public OHLC endpoint (`GET /api/v2/ohlc/{pair}/`).
//!
//! Bitstamp gives `limit` precedence over `end`: a request whose window spans
//! more than `limit` bars silently returns the first `limit` bars from
//! `start`. Callers size each window so the two agree.

pub mod params;
pub mod provider;
pub mod response;

pub use provider::{BitstampConfig, BitstampProvider};
