//! Query catalog.
//!
//! The catalog maps short human-readable tags to fully-specified query
//! instances. It is built once at startup by an explicit sequence of
//! `add_entry` calls and handed to consumers by reference; it is never
//! mutated afterwards.

use serde::Serialize;
use thiserror::Error;

use crate::query::{CustomPrice, EvmCall, GasPriceOracle, Query, SpotPrice, StringQuery, TellorRng};
use crate::QueryError;

/// Errors that can occur while building or reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// Tags must be unique within a catalog.
	#[error("Error adding query entry: {0} already exists")]
	DuplicateTag(String),
	#[error(transparent)]
	Query(#[from] QueryError),
}

/// One catalog record. Immutable after registration.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
	/// Short lookup tag, e.g. `eth-usd-spot`.
	pub tag: String,
	/// Human-readable title.
	pub title: String,
	/// Registered query type name.
	pub query_type: String,
	/// Compact JSON descriptor of the query.
	pub descriptor: String,
	/// `0x`-prefixed hex query id.
	pub query_id: String,
	/// False for entries kept for decoding old submissions only.
	pub active: bool,
	/// JSON parameter ABI, empty for parameterless types.
	pub abi: String,
}

impl CatalogEntry {
	/// Re-derives the live query object from the registered descriptor.
	pub fn query(&self) -> Result<Query, QueryError> {
		Query::from_descriptor(&self.descriptor)
	}
}

/// Optional, AND-combined search filters for [`Catalog::find`].
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
	/// Substring match on the tag.
	pub tag: Option<String>,
	/// Exact match on the hex query id, `0x` prefix optional.
	pub query_id: Option<String>,
	/// Case-insensitive match on the query type name.
	pub query_type: Option<String>,
	/// Match on the active flag.
	pub active: Option<bool>,
}

/// Tag-to-entry mapping over all queries known to the process.
#[derive(Debug, Default)]
pub struct Catalog {
	// Vec keeps registration order for unfiltered listings.
	entries: Vec<CatalogEntry>,
}

#[derive(Serialize)]
struct AbiParam {
	name: &'static str,
	#[serde(rename = "type")]
	abi_type: &'static str,
}

impl Catalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a new entry. Fails if the tag is already registered.
	pub fn add_entry(
		&mut self,
		tag: &str,
		title: &str,
		query: Query,
		active: bool,
	) -> Result<(), CatalogError> {
		if self.entries.iter().any(|entry| entry.tag == tag) {
			return Err(CatalogError::DuplicateTag(tag.to_string()));
		}

		let params = query.params_abi();
		let abi = if params.is_empty() {
			String::new()
		} else {
			let params: Vec<AbiParam> = params
				.iter()
				.map(|(name, abi_type)| AbiParam { name, abi_type })
				.collect();
			serde_json::to_string(&params)
				.map_err(|e| QueryError::Serialization(e.to_string()))?
		};

		self.entries.push(CatalogEntry {
			tag: tag.to_string(),
			title: title.to_string(),
			query_type: query.query_type().to_string(),
			descriptor: query.descriptor()?,
			query_id: format!("0x{}", hex::encode(query.query_id())),
			active,
			abi,
		});
		Ok(())
	}

	/// Returns entries matching all provided filters, in registration
	/// order. With no filters set, returns every entry.
	pub fn find(&self, filter: &CatalogFilter) -> Vec<&CatalogEntry> {
		let normalized_id = filter.query_id.as_ref().map(|id| {
			let id = id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")).unwrap_or(id);
			format!("0x{}", id.to_lowercase())
		});

		self.entries
			.iter()
			.filter(|entry| {
				if let Some(tag) = &filter.tag {
					if !entry.tag.contains(tag.as_str()) {
						return false;
					}
				}
				if let Some(id) = &normalized_id {
					if entry.query_id.to_lowercase() != *id {
						return false;
					}
				}
				if let Some(query_type) = &filter.query_type {
					if !entry.query_type.eq_ignore_ascii_case(query_type) {
						return false;
					}
				}
				if let Some(active) = filter.active {
					if entry.active != active {
						return false;
					}
				}
				true
			})
			.collect()
	}

	/// Looks up a single entry by exact tag.
	pub fn get(&self, tag: &str) -> Option<&CatalogEntry> {
		self.entries.iter().find(|entry| entry.tag == tag)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Renders every entry as a markdown document, one section per query.
	pub fn to_markdown(&self) -> Result<String, CatalogError> {
		let mut lines = vec!["# Tellor Query Catalog".to_string(), String::new()];
		for entry in &self.entries {
			let query_data = entry.query()?.query_data();
			lines.push(format!("## {}", entry.title));
			lines.push(String::new());
			lines.push("| Parameter | Value |".to_string());
			lines.push("| --- | --- |".to_string());
			lines.push(format!("| Tag | `{}` |", entry.tag));
			lines.push(format!("| Active | `{}` |", entry.active));
			lines.push(format!("| Type | `{}` |", entry.query_type));
			lines.push(format!("| Descriptor | `{}` |", entry.descriptor));
			lines.push(format!("| Encoding ABI | `{}` |", entry.abi));
			lines.push(format!("| Query ID | `{}` |", entry.query_id));
			lines.push(format!("| Query data | `0x{}` |", hex::encode(query_data)));
			lines.push(String::new());
		}
		Ok(lines.join("\n"))
	}
}

/// Builds the standard catalog of known queries.
///
/// A representative subset of the network's full catalog: the heavily-used
/// spot pairs plus one example of each other query type.
pub fn standard_catalog() -> Result<Catalog, CatalogError> {
	let mut catalog = Catalog::new();

	let spot_tags: &[(&str, &str)] = &[
		("eth-usd-spot", "ETH/USD spot price"),
		("btc-usd-spot", "BTC/USD spot price"),
		("trb-usd-spot", "TRB/USD spot price"),
		("matic-usd-spot", "MATIC/USD spot price"),
		("dai-usd-spot", "DAI/USD spot price"),
		("mkr-usd-spot", "MKR/USD spot price"),
		("sushi-usd-spot", "SUSHI/USD spot price"),
		("usdc-usd-spot", "USDC/USD spot price"),
		("eur-usd-spot", "EUR/USD spot price"),
		("eth-jpy-spot", "ETH/JPY spot price"),
		("ohm-eth-spot", "OHM/ETH spot price"),
		("avax-usd-spot", "AVAX/USD spot price"),
		("aave-usd-spot", "AAVE/USD spot price"),
		("comp-usd-spot", "COMP/USD spot price"),
		("link-usd-spot", "LINK/USD spot price"),
		("uni-usd-spot", "UNI/USD spot price"),
		("doge-usd-spot", "DOGE/USD spot price"),
		("wbtc-usd-spot", "WBTC/USD spot price"),
	];
	for (tag, title) in spot_tags {
		let (asset, rest) = tag.split_once('-').unwrap_or((tag, ""));
		let (currency, _) = rest.split_once('-').unwrap_or((rest, ""));
		catalog.add_entry(
			tag,
			title,
			Query::SpotPrice(SpotPrice::new(asset, currency)?),
			true,
		)?;
	}

	catalog.add_entry(
		"landx-corn-custom",
		"Corn price per kilogram",
		Query::CustomPrice(CustomPrice {
			identifier: "landx".to_string(),
			asset: "corn".to_string(),
			currency: "usd".to_string(),
			unit: "per_kilogram".to_string(),
		}),
		true,
	)?;
	catalog.add_entry(
		"string-query-example",
		"String query example",
		Query::StringQuery(StringQuery {
			text: "Where is the Atlantic ocean?".to_string(),
		}),
		true,
	)?;
	catalog.add_entry(
		"evm-call-example",
		"EVM call example",
		Query::EvmCall(EvmCall {
			chain_id: 1,
			// TRB token totalSupply() on mainnet.
			contract_address: alloy::primitives::address!(
				"88dF592F8eb5D7Bd38bFeF7dEb0fBc02cf3778a0"
			),
			calldata: alloy::primitives::FixedBytes::from([0x18, 0x16, 0x0d, 0xdd]),
		}),
		true,
	)?;
	catalog.add_entry(
		"gas-price-oracle-example",
		"Gas price oracle mainnet",
		Query::GasPriceOracle(GasPriceOracle {
			chain_id: 1,
			timestamp: 1656633600,
		}),
		true,
	)?;
	catalog.add_entry(
		"tellor-rng-example",
		"Tellor RNG",
		Query::TellorRng(TellorRng {
			timestamp: 1660567612,
		}),
		true,
	)?;
	catalog.add_entry(
		"ampleforth-custom-spot-price",
		"AMPL/USD custom spot price",
		Query::AmpleforthCustomSpotPrice,
		true,
	)?;
	catalog.add_entry(
		"ampleforth-uspce",
		"USPCE value",
		Query::AmpleforthUspce,
		false,
	)?;

	Ok(catalog)
}
