//! Keeps a single-instrument minute OHLCV series continuous.
//!
//! The stored series is a large read-only bulk history plus a recent tail.
//! An update run finds the bars missing between the tail and the last
//! complete minute, fetches them from a limit-constrained quote API in
//! bounded windows, forward-fills whatever is still missing, validates the
//! result, and rewrites the tail atomically.
//!
//! Modules, leaf first:
//! - [`gaps`]: which expected timestamps are absent
//! - [`merge`]: combining overlapping sources
//! - [`fetch`]: covering a range with bounded calls
//! - [`densify`]: flat-bar forward fill
//! - [`validate`]: integrity findings
//! - [`reconcile`]: the update run
//! - [`preprocess`]: bootstrapping the bulk history from raw exports
//! - [`inspect`]: read-only dataset summary

#![deny(missing_docs)]

pub mod config;
pub mod densify;
pub mod error;
pub mod fetch;
pub mod gaps;
pub mod inspect;
pub mod merge;
pub mod preprocess;
pub mod reconcile;
pub mod report;
pub mod validate;

pub use error::SyncError;
