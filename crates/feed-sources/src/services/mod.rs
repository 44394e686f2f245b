//! Exchange price services.
//!
//! Each service wraps one exchange's public HTTP API: a single GET plus a
//! JSON path extraction. Hard errors stay `Result` at this layer; the
//! [`PriceSource`](crate::PriceSource) wrapper absorbs them into a missing
//! datapoint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::SourceError;

pub mod binance;
pub mod coinbase;
pub mod coingecko;
pub mod gemini;
pub mod kraken;
pub mod okx;

pub use binance::BinanceService;
pub use coinbase::CoinbaseService;
pub use coingecko::CoinGeckoService;
pub use gemini::GeminiService;
pub use kraken::KrakenService;
pub use okx::OkxService;

/// A price observation as reported by a service.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
	pub price: f64,
	pub timestamp: DateTime<Utc>,
}

impl PricePoint {
	/// Stamps a freshly fetched price with the current time.
	pub fn now(price: f64) -> Self {
		Self {
			price,
			timestamp: Utc::now(),
		}
	}
}

/// Interface to a pricing service.
#[async_trait]
pub trait PriceService: Send + Sync {
	/// Short service name used in logs.
	fn name(&self) -> &'static str;

	/// Fetches the price of `asset` quoted in `currency`.
	async fn get_price(&self, asset: &str, currency: &str) -> Result<PricePoint, SourceError>;
}

/// Issues a GET request and parses the body as JSON.
pub(crate) async fn fetch_json(
	client: &reqwest::Client,
	url: &str,
) -> Result<serde_json::Value, SourceError> {
	let response = client
		.get(url)
		.send()
		.await
		.map_err(|e| SourceError::Http(e.to_string()))?;
	response
		.json()
		.await
		.map_err(|e| SourceError::Parse(e.to_string()))
}

/// Extracts an `f64` from a JSON node that may be a number or a numeric
/// string, the two shapes exchange APIs use for prices.
pub(crate) fn json_price(value: &serde_json::Value) -> Result<f64, SourceError> {
	if let Some(price) = value.as_f64() {
		return Ok(price);
	}
	value
		.as_str()
		.and_then(|s| s.parse().ok())
		.ok_or_else(|| SourceError::Parse(format!("not a price: {}", value)))
}
