//! Gemini spot price service.

use async_trait::async_trait;

use super::{fetch_json, json_price, PricePoint, PriceService};
use crate::SourceError;

const BASE_URL: &str = "https://api.gemini.com";

/// Fetches spot prices from the Gemini public ticker API.
pub struct GeminiService {
	client: reqwest::Client,
}

impl GeminiService {
	pub fn new(client: reqwest::Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl PriceService for GeminiService {
	fn name(&self) -> &'static str {
		"gemini"
	}

	async fn get_price(&self, asset: &str, currency: &str) -> Result<PricePoint, SourceError> {
		let url = format!(
			"{}/v1/pubticker/{}{}",
			BASE_URL,
			asset.to_lowercase(),
			currency.to_lowercase()
		);
		let body = fetch_json(&self.client, &url).await?;

		if body.get("result").and_then(|r| r.as_str()) == Some("error") {
			let message = body
				.get("message")
				.and_then(|m| m.as_str())
				.unwrap_or("unknown error");
			return Err(SourceError::Api {
				service: self.name().to_string(),
				message: message.to_string(),
			});
		}

		let node = body
			.get("last")
			.ok_or_else(|| SourceError::Parse("missing last price".to_string()))?;
		Ok(PricePoint::now(json_price(node)?))
	}
}
