//! Price source: a service bound to one asset/currency pair.

use async_trait::async_trait;
use tracing::warn;

use feed_types::DataPoint;

use crate::services::PriceService;
use crate::{DataSource, History};

/// A [`DataSource<f64>`] that fetches one asset's price from a single
/// pricing service.
///
/// Service errors are absorbed here: a failed fetch is logged and surfaced
/// as a missing datapoint so an aggregator can tolerate it.
pub struct PriceSource {
	asset: String,
	currency: String,
	service: Box<dyn PriceService>,
	history: History<f64>,
}

impl PriceSource {
	pub fn new(asset: &str, currency: &str, service: Box<dyn PriceService>) -> Self {
		Self {
			asset: asset.to_lowercase(),
			currency: currency.to_lowercase(),
			service,
			history: History::default(),
		}
	}

	pub fn asset(&self) -> &str {
		&self.asset
	}

	pub fn currency(&self) -> &str {
		&self.currency
	}
}

#[async_trait]
impl DataSource<f64> for PriceSource {
	async fn fetch_new_datapoint(&self) -> Option<DataPoint<f64>> {
		match self.service.get_price(&self.asset, &self.currency).await {
			Ok(point) => {
				let datapoint = DataPoint {
					value: point.price,
					timestamp: point.timestamp,
				};
				self.history.store(datapoint.clone()).await;
				Some(datapoint)
			},
			Err(error) => {
				warn!(
					service = self.service.name(),
					asset = %self.asset,
					currency = %self.currency,
					%error,
					"price fetch failed"
				);
				None
			},
		}
	}

	fn history(&self) -> &History<f64> {
		&self.history
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::services::PricePoint;
	use crate::SourceError;

	struct StaticService(Option<f64>);

	#[async_trait]
	impl PriceService for StaticService {
		fn name(&self) -> &'static str {
			"static"
		}

		async fn get_price(&self, _: &str, _: &str) -> Result<PricePoint, SourceError> {
			match self.0 {
				Some(price) => Ok(PricePoint::now(price)),
				None => Err(SourceError::Http("connection refused".to_string())),
			}
		}
	}

	#[tokio::test]
	async fn test_success_is_stored() {
		let source = PriceSource::new("ETH", "USD", Box::new(StaticService(Some(1234.5))));
		let datapoint = source.fetch_new_datapoint().await.unwrap();
		assert_eq!(datapoint.value, 1234.5);
		assert_eq!(source.depth().await, 1);
		assert_eq!(source.latest().await.map(|dp| dp.value), Some(1234.5));
		assert_eq!(source.asset(), "eth");
	}

	#[tokio::test]
	async fn test_failure_is_absorbed() {
		let source = PriceSource::new("eth", "usd", Box::new(StaticService(None)));
		assert!(source.fetch_new_datapoint().await.is_none());
		assert_eq!(source.depth().await, 0);
	}
}
