//! Configuration loading from files and environment.

use crate::types::*;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use feed_datafeeds::FEED_TAGS;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
	/// Load configuration from file
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
		let path = path.as_ref();
		info!("Loading configuration from {:?}", path);

		let contents = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {:?}", path))?;

		let config = match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml(&contents)?,
			Some("json") => Self::from_json(&contents)?,
			Some("yaml") | Some("yml") => Self::from_yaml(&contents)?,
			_ => anyhow::bail!("Unsupported config format: {:?}", path),
		};

		Self::validate_config(&config)?;
		Ok(config)
	}

	/// Load from TOML string
	pub fn from_toml(contents: &str) -> Result<Config> {
		toml::from_str(contents).map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))
	}

	/// Load from JSON string
	pub fn from_json(contents: &str) -> Result<Config> {
		serde_json::from_str(contents).context("Failed to parse JSON")
	}

	/// Load from YAML string
	pub fn from_yaml(contents: &str) -> Result<Config> {
		serde_yaml::from_str(contents).context("Failed to parse YAML")
	}

	/// Load from environment variables with optional file override
	pub fn from_env_and_file(file_path: Option<&Path>) -> Result<Config> {
		// Start with default config
		let mut config = if let Some(path) = file_path {
			Self::from_file(path)?
		} else {
			Config::default()
		};

		// Override with environment variables
		Self::apply_env_overrides(&mut config);

		Self::validate_config(&config)?;
		Ok(config)
	}

	/// Apply environment variable overrides
	fn apply_env_overrides(config: &mut Config) {
		if let Ok(key) = std::env::var("REPORTER_PRIVATE_KEY") {
			debug!("Overriding private key from environment");
			config.reporter.private_key = key;
		}

		if let Ok(url) = std::env::var("RPC_URL") {
			debug!("Overriding RPC URL from environment");
			config.reporter.rpc_url = url;
		}
	}

	/// Validate configuration
	pub fn validate_config(config: &Config) -> Result<()> {
		// Check private key format
		let key = &config.reporter.private_key;
		if !key.starts_with("0x") {
			anyhow::bail!("Private key must start with 0x");
		}
		let hex = &key[2..];
		if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
			anyhow::bail!("Private key must be 32 bytes of hex");
		}

		// Check feed tags have a feed definition
		for tag in &config.feeds.tags {
			if !FEED_TAGS.contains(&tag.as_str()) {
				anyhow::bail!("No feed defined for tag '{}'", tag);
			}
		}

		if config.reporter.interval_secs == 0 {
			anyhow::bail!("Report interval must be positive");
		}

		if config.sources.http_timeout_secs == 0 {
			anyhow::bail!("HTTP timeout must be positive");
		}

		Ok(())
	}
}
