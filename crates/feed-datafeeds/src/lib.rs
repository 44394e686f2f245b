//! Data feeds: a query paired with the source that answers it.
//!
//! The standard feeds mirror the network's reporting defaults: each spot
//! pair is a median aggregation over several independent exchange sources.

use reqwest::Client;

use feed_queries::{Query, QueryError, SpotPrice};
use feed_sources::services::{
	BinanceService, CoinGeckoService, CoinbaseService, GeminiService, KrakenService, OkxService,
};
use feed_sources::{Algorithm, DataSource, PriceAggregator, PriceSource};

/// A query and the data source used to answer it.
pub struct DataFeed<T>
where
	T: Clone + Send + Sync + 'static,
{
	pub query: Query,
	pub source: Box<dyn DataSource<T>>,
}

/// Tags with a standard feed definition.
pub const FEED_TAGS: &[&str] = &[
	"eth-usd-spot",
	"btc-usd-spot",
	"trb-usd-spot",
	"matic-usd-spot",
];

/// Looks up the standard feed for a catalog tag.
pub fn feed_for_tag(tag: &str, client: &Client) -> Result<Option<DataFeed<f64>>, QueryError> {
	let feed = match tag {
		"eth-usd-spot" => Some(eth_usd_median_feed(client)?),
		"btc-usd-spot" => Some(btc_usd_median_feed(client)?),
		"trb-usd-spot" => Some(trb_usd_median_feed(client)?),
		"matic-usd-spot" => Some(matic_usd_median_feed(client)?),
		_ => None,
	};
	Ok(feed)
}

/// ETH/USD median over five exchange sources.
pub fn eth_usd_median_feed(client: &Client) -> Result<DataFeed<f64>, QueryError> {
	spot_median_feed(
		"eth",
		"usd",
		vec![
			source("eth", "usd", Box::new(CoinbaseService::new(client.clone()))),
			source("eth", "usd", Box::new(CoinGeckoService::new(client.clone()))),
			source("eth", "usd", Box::new(KrakenService::new(client.clone()))),
			source("eth", "usd", Box::new(GeminiService::new(client.clone()))),
			source("eth", "usdt", Box::new(BinanceService::new(client.clone()))),
		],
	)
}

/// BTC/USD median over five exchange sources.
pub fn btc_usd_median_feed(client: &Client) -> Result<DataFeed<f64>, QueryError> {
	spot_median_feed(
		"btc",
		"usd",
		vec![
			source("btc", "usd", Box::new(CoinbaseService::new(client.clone()))),
			source("btc", "usd", Box::new(CoinGeckoService::new(client.clone()))),
			source("btc", "usd", Box::new(KrakenService::new(client.clone()))),
			source("btc", "usd", Box::new(GeminiService::new(client.clone()))),
			source("btc", "usdt", Box::new(BinanceService::new(client.clone()))),
		],
	)
}

/// TRB/USD median; TRB trades on fewer venues.
pub fn trb_usd_median_feed(client: &Client) -> Result<DataFeed<f64>, QueryError> {
	spot_median_feed(
		"trb",
		"usd",
		vec![
			source("trb", "usd", Box::new(CoinbaseService::new(client.clone()))),
			source("trb", "usd", Box::new(CoinGeckoService::new(client.clone()))),
			source("trb", "usdt", Box::new(BinanceService::new(client.clone()))),
			source("trb", "usdt", Box::new(OkxService::new(client.clone()))),
		],
	)
}

/// MATIC/USD median over four exchange sources.
pub fn matic_usd_median_feed(client: &Client) -> Result<DataFeed<f64>, QueryError> {
	spot_median_feed(
		"matic",
		"usd",
		vec![
			source("matic", "usd", Box::new(CoinbaseService::new(client.clone()))),
			source("matic", "usd", Box::new(CoinGeckoService::new(client.clone()))),
			source("matic", "usd", Box::new(KrakenService::new(client.clone()))),
			source("matic", "usdt", Box::new(BinanceService::new(client.clone()))),
		],
	)
}

fn source(
	asset: &str,
	currency: &str,
	service: Box<dyn feed_sources::PriceService>,
) -> Box<dyn DataSource<f64>> {
	Box::new(PriceSource::new(asset, currency, service))
}

fn spot_median_feed(
	asset: &str,
	currency: &str,
	sources: Vec<Box<dyn DataSource<f64>>>,
) -> Result<DataFeed<f64>, QueryError> {
	Ok(DataFeed {
		query: Query::SpotPrice(SpotPrice::new(asset, currency)?),
		source: Box::new(PriceAggregator::new(
			asset,
			currency,
			Algorithm::Median,
			sources,
		)),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_every_feed_tag_resolves() {
		let client = Client::new();
		for tag in FEED_TAGS {
			let feed = feed_for_tag(tag, &client).unwrap();
			assert!(feed.is_some(), "{} has no feed", tag);
		}
		assert!(feed_for_tag("unknown-tag", &client).unwrap().is_none());
	}

	#[test]
	fn test_feed_query_matches_tag() {
		let client = Client::new();
		let feed = eth_usd_median_feed(&client).unwrap();
		assert_eq!(
			feed.query,
			Query::SpotPrice(SpotPrice::new("eth", "usd").unwrap())
		);
	}
}
