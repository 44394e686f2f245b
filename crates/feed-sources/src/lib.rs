//! Data sources for the Tellor feed system.
//!
//! A data source is anything exposing one async "fetch a value" operation
//! returning a time-stamped datapoint, or `None` on failure. Concrete
//! sources wrap exchange price APIs; the [`PriceAggregator`] fans out to
//! several sources and reduces the surviving values to one, and itself
//! satisfies the same interface so aggregators can be nested.

use async_trait::async_trait;
use thiserror::Error;

use feed_types::DataPoint;

pub mod aggregator;
pub mod history;
pub mod price_source;
pub mod services;

pub use aggregator::{Algorithm, PriceAggregator};
pub use history::History;
pub use price_source::PriceSource;
pub use services::{PricePoint, PriceService};

/// Errors that can occur while fetching a price from an external service.
///
/// These are soft failures from the system's point of view: they are caught
/// at the source boundary and surfaced as a missing datapoint, never as a
/// panic or an aborted aggregation.
#[derive(Debug, Error)]
pub enum SourceError {
	/// Network-level failure (connect, timeout, TLS).
	#[error("HTTP request failed: {0}")]
	Http(String),
	/// The response body was not the expected JSON shape.
	#[error("Failed to parse API response: {0}")]
	Parse(String),
	/// The service returned an application-level error message.
	#[error("API error ({service}): {message}")]
	Api { service: String, message: String },
	/// The service does not serve this asset.
	#[error("Asset not supported: {0}")]
	UnsupportedAsset(String),
	/// The service does not serve this quote currency.
	#[error("Currency not supported: {0}")]
	UnsupportedCurrency(String),
}

/// Interface satisfied by every data source.
///
/// `fetch_new_datapoint` performs one fetch, appends the result to the
/// source's own bounded history on success, and returns `None` on failure.
/// Timeout policy, if any, belongs to the concrete source.
#[async_trait]
pub trait DataSource<T>: Send + Sync
where
	T: Clone + Send + Sync + 'static,
{
	/// Fetches a new value and stores it for later retrieval.
	async fn fetch_new_datapoint(&self) -> Option<DataPoint<T>>;

	/// The source's own bounded fetch history.
	fn history(&self) -> &History<T>;

	/// The most recent datapoint, or `None` if nothing was fetched yet.
	async fn latest(&self) -> Option<DataPoint<T>> {
		self.history().latest().await
	}

	/// All retained datapoints, oldest first.
	async fn all_datapoints(&self) -> Vec<DataPoint<T>> {
		self.history().all().await
	}

	/// Number of retained datapoints.
	async fn depth(&self) -> usize {
		self.history().depth().await
	}
}
