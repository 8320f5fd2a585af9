//! Exchange rate provider adapter for travelfx.
//!
//! - [`HttpRateSource`] implements the core `RateSource` trait over a
//!   blocking HTTP client.
//! - [`SnapshotStore`] persists rate cache entries between runs.

pub mod error;
pub mod http;
mod response;
pub mod snapshot;

pub use error::RatesError;
pub use http::HttpRateSource;
pub use snapshot::SnapshotStore;
