//! Coinbase spot price service.

use async_trait::async_trait;

use super::{fetch_json, json_price, PricePoint, PriceService};
use crate::SourceError;

const BASE_URL: &str = "https://api.exchange.coinbase.com";

/// Fetches spot prices from the Coinbase Exchange products API.
pub struct CoinbaseService {
	client: reqwest::Client,
}

impl CoinbaseService {
	pub fn new(client: reqwest::Client) -> Self {
		Self { client }
	}

	fn extract_price(&self, body: &serde_json::Value) -> Result<f64, SourceError> {
		if let Some(message) = body.get("message").and_then(|m| m.as_str()) {
			return Err(SourceError::Api {
				service: self.name().to_string(),
				message: message.to_string(),
			});
		}

		let node = body
			.get("price")
			.ok_or_else(|| SourceError::Parse("missing price".to_string()))?;
		json_price(node)
	}
}

#[async_trait]
impl PriceService for CoinbaseService {
	fn name(&self) -> &'static str {
		"coinbase"
	}

	async fn get_price(&self, asset: &str, currency: &str) -> Result<PricePoint, SourceError> {
		let url = format!(
			"{}/products/{}-{}/ticker",
			BASE_URL,
			asset.to_lowercase(),
			currency.to_lowercase()
		);
		let body = fetch_json(&self.client, &url).await?;
		Ok(PricePoint::now(self.extract_price(&body)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_extract_price_response_shapes() {
		let service = CoinbaseService::new(reqwest::Client::new());

		let price = service
			.extract_price(&serde_json::json!({"price": "12.5"}))
			.unwrap();
		assert_eq!(price, 12.5);

		let err = service
			.extract_price(&serde_json::json!({"message": "NotFound"}))
			.unwrap_err();
		assert!(matches!(err, SourceError::Api { .. }));

		// A body without a price field names the missing field, not null.
		let err = service.extract_price(&serde_json::json!({})).unwrap_err();
		assert!(matches!(err, SourceError::Parse(m) if m == "missing price"));
	}
}
