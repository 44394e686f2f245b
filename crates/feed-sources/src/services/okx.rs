//! OKX spot price service.

use async_trait::async_trait;

use super::{fetch_json, json_price, PricePoint, PriceService};
use crate::SourceError;

const BASE_URL: &str = "https://www.okx.com/api";

/// Fetches spot prices from the OKX market ticker API.
pub struct OkxService {
	client: reqwest::Client,
}

impl OkxService {
	pub fn new(client: reqwest::Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl PriceService for OkxService {
	fn name(&self) -> &'static str {
		"okx"
	}

	async fn get_price(&self, asset: &str, currency: &str) -> Result<PricePoint, SourceError> {
		let url = format!(
			"{}/v5/market/ticker?instId={}-{}",
			BASE_URL,
			asset.to_uppercase(),
			currency.to_uppercase()
		);
		let body = fetch_json(&self.client, &url).await?;

		if let Some(message) = body.get("msg").and_then(|m| m.as_str()) {
			if !message.is_empty() {
				return Err(SourceError::Api {
					service: self.name().to_string(),
					message: message.to_string(),
				});
			}
		}

		let node = body
			.get("data")
			.and_then(|data| data.get(0))
			.and_then(|ticker| ticker.get("last"))
			.ok_or_else(|| SourceError::Parse("missing ticker data".to_string()))?;
		Ok(PricePoint::now(json_price(node)?))
	}
}
