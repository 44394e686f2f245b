//! Tellor oracle contract interface.

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy::sol;
use async_trait::async_trait;

use crate::ReporterError;

sol! {
	#[sol(rpc)]
	interface ITellorOracle {
		function submitValue(bytes32 _queryId, bytes calldata _value, uint256 _nonce, bytes calldata _queryData) external;
		function getNewValueCountbyQueryId(bytes32 _queryId) external view returns (uint256);
		function getTimeOfLastNewValue() external view returns (uint256);
		function getStakerInfo(address _stakerAddress) external view returns (
			uint256 startDate,
			uint256 stakedBalance,
			uint256 lockedBalance,
			uint256 rewardDebt,
			uint256 reporterLastTimestamp,
			uint256 reportsSubmitted,
			uint256 startVoteCount,
			uint256 startVoteTally,
			bool staked
		);
	}
}

/// Outcome of a confirmed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
	pub tx_hash: B256,
	pub block_number: u64,
	pub success: bool,
}

/// On-chain staking state of a reporter address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakerInfo {
	pub staked_balance: U256,
	pub reports_submitted: U256,
}

/// Interface to the Tellor oracle contract.
#[async_trait]
pub trait OracleInterface: Send + Sync {
	/// Number of values already reported for a query id. Doubles as the
	/// nonce for the next submission.
	async fn report_count(&self, query_id: B256) -> Result<u64, ReporterError>;

	/// Submits an encoded value and returns the transaction hash.
	async fn submit_value(
		&self,
		query_id: B256,
		value: &[u8],
		nonce: u64,
		query_data: &[u8],
	) -> Result<B256, ReporterError>;

	/// Waits until the submission transaction has the requested number of
	/// confirmations.
	async fn wait_for_confirmation(
		&self,
		tx_hash: B256,
		confirmations: u64,
	) -> Result<SubmitReceipt, ReporterError>;

	/// Unix timestamp of the newest value on the oracle, any query.
	async fn time_of_last_value(&self) -> Result<u64, ReporterError>;

	/// Staking state of this reporter's address.
	async fn staker_info(&self) -> Result<StakerInfo, ReporterError>;
}

/// Alloy-backed oracle client.
///
/// Owns a provider with an attached wallet, so submissions are signed
/// locally and sent over plain HTTP RPC.
pub struct AlloyOracle {
	provider: DynProvider,
	address: Address,
	reporter: Address,
	gas_limit: Option<u64>,
}

impl AlloyOracle {
	/// Connects to an RPC endpoint with a signing key bound to `chain_id`.
	pub fn connect(
		rpc_url: &str,
		chain_id: u64,
		oracle_address: Address,
		private_key: &str,
		gas_limit: Option<u64>,
	) -> Result<Self, ReporterError> {
		let url = rpc_url
			.parse()
			.map_err(|e| ReporterError::Network(format!("Invalid RPC URL: {}", e)))?;

		let signer: PrivateKeySigner = private_key
			.parse()
			.map_err(|e| ReporterError::Signer(format!("Invalid private key: {}", e)))?;
		let signer = signer.with_chain_id(Some(chain_id));
		let reporter = signer.address();

		let wallet = EthereumWallet::from(signer);
		let provider = ProviderBuilder::new()
			.wallet(wallet)
			.connect_http(url)
			.erased();

		Ok(Self {
			provider,
			address: oracle_address,
			reporter,
			gas_limit,
		})
	}

	/// Address submissions are signed with.
	pub fn reporter_address(&self) -> Address {
		self.reporter
	}

	fn contract(&self) -> ITellorOracle::ITellorOracleInstance<DynProvider> {
		ITellorOracle::new(self.address, self.provider.clone())
	}
}

#[async_trait]
impl OracleInterface for AlloyOracle {
	async fn report_count(&self, query_id: B256) -> Result<u64, ReporterError> {
		let count = self
			.contract()
			.getNewValueCountbyQueryId(query_id)
			.call()
			.await
			.map_err(|e| ReporterError::Network(format!("Failed to read report count: {}", e)))?;
		u64::try_from(count)
			.map_err(|_| ReporterError::Network("Report count out of range".to_string()))
	}

	async fn submit_value(
		&self,
		query_id: B256,
		value: &[u8],
		nonce: u64,
		query_data: &[u8],
	) -> Result<B256, ReporterError> {
		let contract = self.contract();
		let mut call = contract.submitValue(
			query_id,
			Bytes::copy_from_slice(value),
			U256::from(nonce),
			Bytes::copy_from_slice(query_data),
		);
		if let Some(limit) = self.gas_limit {
			call = call.gas(limit);
		}

		let pending = call
			.send()
			.await
			.map_err(|e| ReporterError::Network(format!("Failed to send transaction: {}", e)))?;

		let tx_hash = *pending.tx_hash();
		tracing::info!(tx_hash = %tx_hash, query_id = %query_id, nonce, "Submitted value");
		Ok(tx_hash)
	}

	async fn wait_for_confirmation(
		&self,
		tx_hash: B256,
		confirmations: u64,
	) -> Result<SubmitReceipt, ReporterError> {
		let poll_interval = tokio::time::Duration::from_secs(10);
		// ~15s blocks plus buffer, capped at one hour
		let seconds_per_confirmation = 20;
		let timeout_seconds = (confirmations * seconds_per_confirmation)
			.max(seconds_per_confirmation)
			.min(3600);
		let max_wait_time = tokio::time::Duration::from_secs(timeout_seconds);
		let start_time = tokio::time::Instant::now();

		tracing::info!(
			tx_hash = %tx_hash,
			"Waiting for {} confirmations (timeout: {}s)",
			confirmations,
			timeout_seconds
		);

		loop {
			if start_time.elapsed() > max_wait_time {
				return Err(ReporterError::Network(format!(
					"Timeout waiting for {} confirmations after {} seconds",
					confirmations,
					max_wait_time.as_secs()
				)));
			}

			let receipt = match self.provider.get_transaction_receipt(tx_hash).await {
				Ok(Some(receipt)) => receipt,
				Ok(None) => {
					// Not mined yet
					tokio::time::sleep(poll_interval).await;
					continue;
				},
				Err(e) => {
					return Err(ReporterError::Network(format!(
						"Failed to get receipt: {}",
						e
					)));
				},
			};

			let current_block = self
				.provider
				.get_block_number()
				.await
				.map_err(|e| ReporterError::Network(format!("Failed to get block number: {}", e)))?;

			let tx_block = receipt.block_number.unwrap_or(0);
			let current_confirmations = current_block.saturating_sub(tx_block);

			if current_confirmations >= confirmations {
				return Ok(SubmitReceipt {
					tx_hash: receipt.transaction_hash,
					block_number: tx_block,
					success: receipt.status(),
				});
			}

			tracing::debug!(
				"Waiting for {} more confirmations...",
				confirmations.saturating_sub(current_confirmations)
			);
			tokio::time::sleep(poll_interval).await;
		}
	}

	async fn time_of_last_value(&self) -> Result<u64, ReporterError> {
		let timestamp = self
			.contract()
			.getTimeOfLastNewValue()
			.call()
			.await
			.map_err(|e| {
				ReporterError::Network(format!("Failed to read last value time: {}", e))
			})?;
		u64::try_from(timestamp)
			.map_err(|_| ReporterError::Network("Timestamp out of range".to_string()))
	}

	async fn staker_info(&self) -> Result<StakerInfo, ReporterError> {
		let info = self
			.contract()
			.getStakerInfo(self.reporter)
			.call()
			.await
			.map_err(|e| ReporterError::Network(format!("Failed to read staker info: {}", e)))?;

		Ok(StakerInfo {
			staked_balance: info.stakedBalance,
			reports_submitted: info.reportsSubmitted,
		})
	}
}
