//! Kraken spot price service.

use async_trait::async_trait;

use super::{fetch_json, json_price, PricePoint, PriceService};
use crate::SourceError;

const BASE_URL: &str = "https://api.kraken.com";

/// Fetches spot prices from the Kraken public ticker API.
///
/// Kraken uses legacy asset codes: BTC is XBT, and XBT/ETH results are
/// keyed `X{asset}Z{currency}` in the response.
pub struct KrakenService {
	client: reqwest::Client,
}

impl KrakenService {
	pub fn new(client: reqwest::Client) -> Self {
		Self { client }
	}

	fn asset_code(asset: &str) -> String {
		let asset = asset.to_uppercase();
		if asset == "BTC" {
			"XBT".to_string()
		} else {
			asset
		}
	}

	fn result_key(asset: &str, currency: &str) -> String {
		if asset == "XBT" || asset == "ETH" {
			format!("X{}Z{}", asset, currency)
		} else {
			format!("{}{}", asset, currency)
		}
	}
}

#[async_trait]
impl PriceService for KrakenService {
	fn name(&self) -> &'static str {
		"kraken"
	}

	async fn get_price(&self, asset: &str, currency: &str) -> Result<PricePoint, SourceError> {
		let asset = Self::asset_code(asset);
		let currency = currency.to_uppercase();

		let url = format!("{}/0/public/Ticker?pair={}{}", BASE_URL, asset, currency);
		let body = fetch_json(&self.client, &url).await?;

		if let Some(errors) = body.get("error").and_then(|e| e.as_array()) {
			if !errors.is_empty() {
				return Err(SourceError::Api {
					service: self.name().to_string(),
					message: errors
						.iter()
						.filter_map(|e| e.as_str())
						.collect::<Vec<_>>()
						.join(", "),
				});
			}
		}

		let key = Self::result_key(&asset, &currency);
		// "c" is the last-trade-closed field: [price, lot volume].
		let node = body
			.get("result")
			.and_then(|result| result.get(&key))
			.and_then(|pair| pair.get("c"))
			.and_then(|closed| closed.get(0))
			.ok_or_else(|| SourceError::Parse(format!("missing result key {}", key)))?;
		Ok(PricePoint::now(json_price(node)?))
	}
}
