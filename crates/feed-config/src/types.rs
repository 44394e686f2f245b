//! Configuration types for the feed reporter.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use feed_sources::Algorithm;

/// Complete reporter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Reporter identity and chain connection
	pub reporter: ReporterConfig,
	/// Feeds to report
	#[serde(default)]
	pub feeds: FeedsConfig,
	/// Price source settings
	#[serde(default)]
	pub sources: SourcesConfig,
	/// Logging
	#[serde(default)]
	pub telemetry: TelemetryConfig,
}

/// Reporter identity and chain connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReporterConfig {
	/// RPC endpoint URL
	pub rpc_url: String,
	/// Chain id the signer is bound to
	pub chain_id: u64,
	/// Private key (0x-prefixed, 32 bytes hex)
	pub private_key: String,
	/// Tellor oracle contract address
	pub oracle_address: Address,
	/// Seconds between report cycles
	#[serde(default = "default_interval_secs")]
	pub interval_secs: u64,
	/// Block confirmations to wait for after a submission
	#[serde(default = "default_confirmations")]
	pub confirmations: u64,
	/// Gas limit override for submitValue, None lets the node estimate
	#[serde(default)]
	pub gas_limit: Option<u64>,
}

/// Feeds to report
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedsConfig {
	/// Catalog tags of the feeds this reporter serves
	pub tags: Vec<String>,
	/// Aggregation statistic
	#[serde(default)]
	pub algorithm: Algorithm,
}

/// Price source settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
	/// Per-request HTTP timeout in seconds
	pub http_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
	/// Log level filter (trace, debug, info, warn, error)
	pub log_level: String,
}

fn default_interval_secs() -> u64 {
	300
}

fn default_confirmations() -> u64 {
	2
}

impl Default for Config {
	fn default() -> Self {
		Self {
			reporter: ReporterConfig::default(),
			feeds: FeedsConfig::default(),
			sources: SourcesConfig::default(),
			telemetry: TelemetryConfig::default(),
		}
	}
}

impl Default for ReporterConfig {
	fn default() -> Self {
		Self {
			rpc_url: "http://localhost:8545".to_string(),
			chain_id: 1,
			private_key: format!("0x{}", "00".repeat(32)),
			oracle_address: Address::ZERO,
			interval_secs: default_interval_secs(),
			confirmations: default_confirmations(),
			gas_limit: None,
		}
	}
}

impl Default for FeedsConfig {
	fn default() -> Self {
		Self {
			tags: vec!["eth-usd-spot".to_string()],
			algorithm: Algorithm::default(),
		}
	}
}

impl Default for SourcesConfig {
	fn default() -> Self {
		Self {
			http_timeout_secs: 10,
		}
	}
}

impl Default for TelemetryConfig {
	fn default() -> Self {
		Self {
			log_level: "info".to_string(),
		}
	}
}
