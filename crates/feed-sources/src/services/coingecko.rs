//! CoinGecko spot price service.

use async_trait::async_trait;

use super::{fetch_json, json_price, PricePoint, PriceService};
use crate::SourceError;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko keys its API by coin id rather than ticker symbol, so the
/// supported assets are a fixed mapping.
const COIN_IDS: &[(&str, &str)] = &[
	("btc", "bitcoin"),
	("eth", "ethereum"),
	("trb", "tellor"),
	("matic", "matic-network"),
	("dai", "dai"),
	("mkr", "maker"),
	("sushi", "sushi"),
	("usdc", "usd-coin"),
	("ohm", "olympus"),
	("avax", "avalanche-2"),
	("aave", "aave"),
	("comp", "compound-governance-token"),
	("link", "chainlink"),
	("uni", "uniswap"),
	("doge", "dogecoin"),
	("wbtc", "wrapped-bitcoin"),
	("usdt", "tether"),
	("ltc", "litecoin"),
	("shib", "shiba-inu"),
	("yfi", "yearn-finance"),
];

/// Fetches spot prices from the CoinGecko simple price API.
pub struct CoinGeckoService {
	client: reqwest::Client,
}

impl CoinGeckoService {
	pub fn new(client: reqwest::Client) -> Self {
		Self { client }
	}

	fn coin_id(asset: &str) -> Option<&'static str> {
		COIN_IDS
			.iter()
			.find(|(symbol, _)| symbol.eq_ignore_ascii_case(asset))
			.map(|(_, id)| *id)
	}
}

#[async_trait]
impl PriceService for CoinGeckoService {
	fn name(&self) -> &'static str {
		"coingecko"
	}

	async fn get_price(&self, asset: &str, currency: &str) -> Result<PricePoint, SourceError> {
		let coin_id = Self::coin_id(asset)
			.ok_or_else(|| SourceError::UnsupportedAsset(asset.to_string()))?;
		let currency = currency.to_lowercase();

		let url = format!(
			"{}/simple/price?ids={}&vs_currencies={}",
			BASE_URL, coin_id, currency
		);
		let body = fetch_json(&self.client, &url).await?;

		let node = body
			.get(coin_id)
			.and_then(|coin| coin.get(&currency))
			.ok_or_else(|| SourceError::Api {
				service: self.name().to_string(),
				message: format!("no price for {}/{}", coin_id, currency),
			})?;
		Ok(PricePoint::now(json_price(node)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_coin_id_lookup() {
		assert_eq!(CoinGeckoService::coin_id("eth"), Some("ethereum"));
		assert_eq!(CoinGeckoService::coin_id("ETH"), Some("ethereum"));
		assert_eq!(CoinGeckoService::coin_id("notacoin"), None);
	}
}
