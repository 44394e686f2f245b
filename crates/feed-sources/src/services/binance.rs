//! Binance spot price service.

use async_trait::async_trait;

use super::{fetch_json, json_price, PricePoint, PriceService};
use crate::SourceError;

const BASE_URL: &str = "https://api.binance.com";

/// Fetches the latest daily kline close price from the Binance API.
pub struct BinanceService {
	client: reqwest::Client,
}

impl BinanceService {
	pub fn new(client: reqwest::Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl PriceService for BinanceService {
	fn name(&self) -> &'static str {
		"binance"
	}

	async fn get_price(&self, asset: &str, currency: &str) -> Result<PricePoint, SourceError> {
		let url = format!(
			"{}/api/v3/klines?symbol={}{}&interval=1d&limit=1",
			BASE_URL,
			asset.to_uppercase(),
			currency.to_uppercase()
		);
		let body = fetch_json(&self.client, &url).await?;

		if let Some(message) = body.get("msg").and_then(|m| m.as_str()) {
			return Err(SourceError::Api {
				service: self.name().to_string(),
				message: message.to_string(),
			});
		}

		// Kline row: [open time, open, high, low, close, ...].
		let node = body
			.get(0)
			.and_then(|kline| kline.get(4))
			.ok_or_else(|| SourceError::Parse("empty klines response".to_string()))?;
		Ok(PricePoint::now(json_price(node)?))
	}
}
