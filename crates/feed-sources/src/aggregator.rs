//! Multi-source price aggregation.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use feed_types::DataPoint;

use crate::{DataSource, History};

/// Statistic used to reduce surviving source values to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
	#[default]
	Median,
	Mean,
}

impl Algorithm {
	/// Reduces a set of values; `None` when the set is empty.
	pub fn reduce(&self, values: &[f64]) -> Option<f64> {
		if values.is_empty() {
			return None;
		}
		match self {
			Algorithm::Median => {
				let mut sorted = values.to_vec();
				sorted.sort_by(f64::total_cmp);
				let mid = sorted.len() / 2;
				if sorted.len() % 2 == 1 {
					Some(sorted[mid])
				} else {
					Some((sorted[mid - 1] + sorted[mid]) / 2.0)
				}
			},
			Algorithm::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
		}
	}
}

impl FromStr for Algorithm {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"median" => Ok(Algorithm::Median),
			"mean" => Ok(Algorithm::Mean),
			other => Err(format!("unknown algorithm: {}", other)),
		}
	}
}

impl fmt::Display for Algorithm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Algorithm::Median => write!(f, "median"),
			Algorithm::Mean => write!(f, "mean"),
		}
	}
}

/// Produces one price for an asset/currency pair by combining several
/// independent sources.
///
/// The aggregator satisfies [`DataSource<f64>`] itself, so aggregators can
/// be nested as sources of other aggregators.
pub struct PriceAggregator {
	asset: String,
	currency: String,
	algorithm: Algorithm,
	sources: Vec<Box<dyn DataSource<f64>>>,
	history: History<f64>,
}

impl PriceAggregator {
	pub fn new(
		asset: &str,
		currency: &str,
		algorithm: Algorithm,
		sources: Vec<Box<dyn DataSource<f64>>>,
	) -> Self {
		Self {
			asset: asset.to_lowercase(),
			currency: currency.to_lowercase(),
			algorithm,
			sources,
			history: History::default(),
		}
	}

	pub fn asset(&self) -> &str {
		&self.asset
	}

	pub fn currency(&self) -> &str {
		&self.currency
	}

	pub fn algorithm(&self) -> Algorithm {
		self.algorithm
	}

	pub fn source_count(&self) -> usize {
		self.sources.len()
	}
}

#[async_trait]
impl DataSource<f64> for PriceAggregator {
	/// Fetches from every source concurrently and reduces the survivors.
	///
	/// All fetches are launched together and all are awaited; a failed
	/// source never cancels the others. There is no aggregator-level
	/// timeout: deadlines belong to the individual sources. When zero
	/// sources survive, the aggregate is reported as a missing datapoint
	/// with a logged warning, the same soft-failure contract a single
	/// source has, rather than letting an empty reduction blow up.
	async fn fetch_new_datapoint(&self) -> Option<DataPoint<f64>> {
		let results = join_all(
			self.sources
				.iter()
				.map(|source| source.fetch_new_datapoint()),
		)
		.await;

		// Source timestamps are ignored; only surviving values matter.
		let prices: Vec<f64> = results.into_iter().flatten().map(|dp| dp.value).collect();

		let Some(value) = self.algorithm.reduce(&prices) else {
			warn!(
				asset = %self.asset,
				currency = %self.currency,
				sources = self.sources.len(),
				"all sources failed, no aggregate value"
			);
			return None;
		};

		debug!(
			asset = %self.asset,
			currency = %self.currency,
			algorithm = %self.algorithm,
			survivors = prices.len(),
			value,
			"aggregated price"
		);

		let datapoint = DataPoint::now(value);
		self.history.store(datapoint.clone()).await;
		Some(datapoint)
	}

	fn history(&self) -> &History<f64> {
		&self.history
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	/// Source returning a fixed value, optionally after a delay.
	struct MockSource {
		value: Option<f64>,
		delay: Duration,
		history: History<f64>,
	}

	impl MockSource {
		fn new(value: Option<f64>) -> Box<dyn DataSource<f64>> {
			Box::new(Self {
				value,
				delay: Duration::ZERO,
				history: History::default(),
			})
		}

		fn slow(value: f64, delay: Duration) -> Box<dyn DataSource<f64>> {
			Box::new(Self {
				value: Some(value),
				delay,
				history: History::default(),
			})
		}
	}

	#[async_trait]
	impl DataSource<f64> for MockSource {
		async fn fetch_new_datapoint(&self) -> Option<DataPoint<f64>> {
			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}
			let datapoint = DataPoint::now(self.value?);
			self.history.store(datapoint.clone()).await;
			Some(datapoint)
		}

		fn history(&self) -> &History<f64> {
			&self.history
		}
	}

	#[test]
	fn test_algorithm_parsing() {
		assert_eq!("median".parse::<Algorithm>().unwrap(), Algorithm::Median);
		assert_eq!("MEAN".parse::<Algorithm>().unwrap(), Algorithm::Mean);
		assert!("mode".parse::<Algorithm>().is_err());
	}

	#[test]
	fn test_median_even_and_odd() {
		assert_eq!(Algorithm::Median.reduce(&[3.0, 1.0, 2.0]), Some(2.0));
		assert_eq!(Algorithm::Median.reduce(&[10.0, 12.0]), Some(11.0));
		assert_eq!(Algorithm::Median.reduce(&[]), None);
	}

	#[tokio::test]
	async fn test_partial_failure_tolerated() {
		let sources = vec![
			MockSource::new(Some(10.0)),
			MockSource::new(Some(12.0)),
			MockSource::new(None),
		];
		let aggregator = PriceAggregator::new("eth", "usd", Algorithm::Median, sources);

		let datapoint = aggregator.fetch_new_datapoint().await.unwrap();
		assert_eq!(datapoint.value, 11.0);
		assert_eq!(aggregator.latest().await.map(|dp| dp.value), Some(11.0));
	}

	#[tokio::test]
	async fn test_mean_reduction() {
		let sources = vec![
			MockSource::new(Some(10.0)),
			MockSource::new(Some(12.0)),
			MockSource::new(None),
		];
		let aggregator = PriceAggregator::new("eth", "usd", Algorithm::Mean, sources);
		let datapoint = aggregator.fetch_new_datapoint().await.unwrap();
		assert_eq!(datapoint.value, 11.0);
	}

	#[tokio::test]
	async fn test_total_failure_returns_none() {
		let sources = vec![
			MockSource::new(None),
			MockSource::new(None),
			MockSource::new(None),
		];
		let aggregator = PriceAggregator::new("eth", "usd", Algorithm::Median, sources);

		assert!(aggregator.fetch_new_datapoint().await.is_none());
		// Nothing is recorded for a failed aggregation.
		assert_eq!(aggregator.depth().await, 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_sources_fetched_concurrently() {
		let delay = Duration::from_millis(100);
		let sources = vec![
			MockSource::slow(10.0, delay),
			MockSource::slow(11.0, delay),
			MockSource::slow(12.0, delay),
		];
		let aggregator = PriceAggregator::new("eth", "usd", Algorithm::Median, sources);

		let start = tokio::time::Instant::now();
		let datapoint = aggregator.fetch_new_datapoint().await.unwrap();
		let elapsed = start.elapsed();

		assert_eq!(datapoint.value, 11.0);
		// Parallel fan-out: ~one delay, not three.
		assert!(elapsed < delay * 2, "fetches ran sequentially: {:?}", elapsed);
	}

	#[tokio::test]
	async fn test_aggregators_nest_as_sources() {
		let inner = PriceAggregator::new(
			"eth",
			"usd",
			Algorithm::Median,
			vec![MockSource::new(Some(10.0)), MockSource::new(Some(14.0))],
		);
		let outer = PriceAggregator::new(
			"eth",
			"usd",
			Algorithm::Mean,
			vec![Box::new(inner), MockSource::new(Some(16.0))],
		);

		let datapoint = outer.fetch_new_datapoint().await.unwrap();
		assert_eq!(datapoint.value, 14.0);
	}
}
