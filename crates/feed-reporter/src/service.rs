//! Interval reporter: fetch, encode, submit, confirm.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use feed_datafeeds::DataFeed;
use feed_sources::DataSource;
use feed_types::FeedValue;

use crate::oracle::{OracleInterface, SubmitReceipt};
use crate::ReporterError;

/// Drives one data feed against the oracle on a fixed interval.
pub struct ReporterService {
	feed: DataFeed<f64>,
	oracle: Arc<dyn OracleInterface>,
	interval: Duration,
	confirmations: u64,
}

impl ReporterService {
	pub fn new(
		feed: DataFeed<f64>,
		oracle: Arc<dyn OracleInterface>,
		interval: Duration,
		confirmations: u64,
	) -> Self {
		Self {
			feed,
			oracle,
			interval,
			confirmations,
		}
	}

	/// Runs one report cycle.
	///
	/// A feed with no value this cycle is a soft failure: the cycle is
	/// skipped with a warning and `Ok(None)` is returned. Encoding and
	/// submission failures are hard errors.
	pub async fn report_once(&self) -> Result<Option<SubmitReceipt>, ReporterError> {
		let query_id = self.feed.query.query_id();

		let Some(datapoint) = self.feed.source.fetch_new_datapoint().await else {
			warn!(query_id = %query_id, "No datapoint this cycle, skipping report");
			return Ok(None);
		};

		let value_bytes = self
			.feed
			.query
			.value_type()
			.encode(&FeedValue::Float(datapoint.value))?;
		let query_data = self.feed.query.query_data();

		// The oracle's report count for this query doubles as the nonce.
		let nonce = self.oracle.report_count(query_id).await?;
		debug!(query_id = %query_id, nonce, value = datapoint.value, "Submitting report");

		let tx_hash = self
			.oracle
			.submit_value(query_id, &value_bytes, nonce, &query_data)
			.await?;

		let receipt = self
			.oracle
			.wait_for_confirmation(tx_hash, self.confirmations)
			.await?;

		if receipt.success {
			info!(
				query_id = %query_id,
				tx_hash = %receipt.tx_hash,
				block = receipt.block_number,
				value = datapoint.value,
				"Report confirmed"
			);
		} else {
			warn!(
				query_id = %query_id,
				tx_hash = %receipt.tx_hash,
				block = receipt.block_number,
				"Report transaction reverted"
			);
		}

		Ok(Some(receipt))
	}

	/// Reports on a fixed interval until the task is cancelled.
	///
	/// A failed cycle is logged and the loop continues; only the caller
	/// dropping the future stops it.
	pub async fn run(&self) {
		info!(
			interval_secs = self.interval.as_secs(),
			confirmations = self.confirmations,
			"Starting report loop"
		);

		let mut interval = tokio::time::interval(self.interval);
		loop {
			interval.tick().await;
			if let Err(error) = self.report_once().await {
				warn!(%error, "Report cycle failed");
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::{B256, U256};
	use async_trait::async_trait;
	use tokio::sync::Mutex;

	use feed_queries::{Query, SpotPrice};
	use feed_sources::History;
	use feed_types::DataPoint;

	use crate::oracle::StakerInfo;

	struct StaticSource {
		value: Option<f64>,
		history: History<f64>,
	}

	impl StaticSource {
		fn new(value: Option<f64>) -> Box<dyn DataSource<f64>> {
			Box::new(Self {
				value,
				history: History::default(),
			})
		}
	}

	#[async_trait]
	impl DataSource<f64> for StaticSource {
		async fn fetch_new_datapoint(&self) -> Option<DataPoint<f64>> {
			let datapoint = DataPoint::now(self.value?);
			self.history.store(datapoint.clone()).await;
			Some(datapoint)
		}

		fn history(&self) -> &History<f64> {
			&self.history
		}
	}

	#[derive(Debug, PartialEq)]
	struct RecordedSubmit {
		query_id: B256,
		value: Vec<u8>,
		nonce: u64,
		query_data: Vec<u8>,
	}

	#[derive(Default)]
	struct MockOracle {
		report_count: u64,
		submissions: Mutex<Vec<RecordedSubmit>>,
	}

	#[async_trait]
	impl OracleInterface for MockOracle {
		async fn report_count(&self, _query_id: B256) -> Result<u64, ReporterError> {
			Ok(self.report_count)
		}

		async fn submit_value(
			&self,
			query_id: B256,
			value: &[u8],
			nonce: u64,
			query_data: &[u8],
		) -> Result<B256, ReporterError> {
			self.submissions.lock().await.push(RecordedSubmit {
				query_id,
				value: value.to_vec(),
				nonce,
				query_data: query_data.to_vec(),
			});
			Ok(B256::repeat_byte(0xab))
		}

		async fn wait_for_confirmation(
			&self,
			tx_hash: B256,
			_confirmations: u64,
		) -> Result<SubmitReceipt, ReporterError> {
			Ok(SubmitReceipt {
				tx_hash,
				block_number: 100,
				success: true,
			})
		}

		async fn time_of_last_value(&self) -> Result<u64, ReporterError> {
			Ok(0)
		}

		async fn staker_info(&self) -> Result<StakerInfo, ReporterError> {
			Ok(StakerInfo {
				staked_balance: U256::ZERO,
				reports_submitted: U256::ZERO,
			})
		}
	}

	fn eth_usd_feed(value: Option<f64>) -> DataFeed<f64> {
		DataFeed {
			query: Query::SpotPrice(SpotPrice::new("eth", "usd").unwrap()),
			source: StaticSource::new(value),
		}
	}

	#[tokio::test]
	async fn test_report_once_submits_encoded_value() {
		let oracle = Arc::new(MockOracle {
			report_count: 7,
			..Default::default()
		});
		let service = ReporterService::new(
			eth_usd_feed(Some(1.0)),
			oracle.clone(),
			Duration::from_secs(60),
			2,
		);

		let receipt = service.report_once().await.unwrap().unwrap();
		assert!(receipt.success);

		let submissions = oracle.submissions.lock().await;
		assert_eq!(submissions.len(), 1);
		let submit = &submissions[0];

		let query = Query::SpotPrice(SpotPrice::new("eth", "usd").unwrap());
		assert_eq!(submit.query_id, query.query_id());
		assert_eq!(submit.query_data, query.query_data());
		// Report count is threaded through as the nonce.
		assert_eq!(submit.nonce, 7);
		// 1.0 at 18 decimals, one 32-byte word.
		assert_eq!(
			submit.value,
			query.value_type().encode(&FeedValue::Float(1.0)).unwrap()
		);
		assert_eq!(submit.value.len(), 32);
	}

	#[tokio::test]
	async fn test_report_once_skips_on_missing_datapoint() {
		let oracle = Arc::new(MockOracle::default());
		let service = ReporterService::new(
			eth_usd_feed(None),
			oracle.clone(),
			Duration::from_secs(60),
			2,
		);

		assert!(service.report_once().await.unwrap().is_none());
		assert!(oracle.submissions.lock().await.is_empty());
	}
}
