//! Concrete query types and their canonical encodings.
//!
//! `query_data` is `abi.encode(["string","bytes"], [type_name, params])`
//! where `params` is the ABI encoding of the query's declared parameter
//! list. Any two Tellor clients must agree on these bytes bit-for-bit, so
//! every quirk of the reference encoding is preserved here, including the
//! phantom parameter placeholder for parameterless types and the EVMCall
//! selector shift.

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{keccak256, Address, FixedBytes, B256, U256};
use serde::{Deserialize, Serialize};

use feed_types::ValueType;

use crate::QueryError;

/// Currencies accepted by [`SpotPrice`].
pub const CURRENCIES: &[&str] = &["usd", "jpy", "eth", "btc"];

/// Asset/currency pairs accepted by [`SpotPrice`], `"ASSET/CURRENCY"`.
pub const SPOT_PRICE_PAIRS: &[&str] = &[
	"ETH/USD", "BTC/USD", "TRB/USD", "OHM/ETH", "DAI/USD", "MKR/USD", "SUSHI/USD", "MATIC/USD",
	"USDC/USD", "EUR/USD", "ETH/JPY", "ETH/BTC", "AVAX/USD", "AAVE/USD", "BADGER/USD", "BCH/USD",
	"COMP/USD", "CRV/USD", "DOGE/USD", "DOT/USD", "FIL/USD", "GNO/USD", "LINK/USD", "LTC/USD",
	"SHIB/USD", "UNI/USD", "USDT/USD", "YFI/USD", "STETH/USD", "RETH/USD", "WSTETH/USD", "OP/USD",
	"GRT/USD", "WLD/USD", "CBETH/USD", "PYTH/USD", "ORDI/USD", "WBTC/USD",
];

/// Placeholder parameter encoding for query types with no real parameters.
///
/// One offset word pointing at an empty `bytes` value. The reference
/// implementation emits these bytes manually to match the Solidity-side
/// encoding, so they are a compatibility constant, not derived.
const PHANTOM_PARAMS: [u8; 64] = {
	let mut bytes = [0u8; 64];
	bytes[31] = 0x20;
	bytes
};

/// Spot price of a cryptocurrency asset in a given currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotPrice {
	pub asset: String,
	pub currency: String,
}

impl SpotPrice {
	/// Creates a spot price query, lower-casing and validating the pair.
	pub fn new(asset: &str, currency: &str) -> Result<Self, QueryError> {
		let asset = asset.to_lowercase();
		let currency = currency.to_lowercase();

		if !CURRENCIES.contains(&currency.as_str()) {
			return Err(QueryError::UnsupportedCurrency(currency));
		}
		let supported = SPOT_PRICE_PAIRS.iter().any(|pair| {
			let (a, c) = pair.split_once('/').unwrap_or(("", ""));
			a.eq_ignore_ascii_case(&asset) && c.eq_ignore_ascii_case(&currency)
		});
		if !supported {
			return Err(QueryError::UnsupportedPair { asset, currency });
		}

		Ok(Self { asset, currency })
	}
}

/// Price of a non-crypto asset such as a stock or commodity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPrice {
	pub identifier: String,
	pub asset: String,
	pub currency: String,
	pub unit: String,
}

/// An arbitrary text question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringQuery {
	pub text: String,
}

/// Result of a read-only contract call on an EVM chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmCall {
	#[serde(rename = "chainId")]
	pub chain_id: u64,
	#[serde(rename = "contractAddress")]
	pub contract_address: Address,
	pub calldata: FixedBytes<4>,
}

/// Reported gas price on a chain at a point in time, in gwei.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPriceOracle {
	#[serde(rename = "chainId")]
	pub chain_id: u64,
	pub timestamp: u64,
}

/// Pseudorandom number derived from Tellor submissions after a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TellorRng {
	pub timestamp: u64,
}

/// A fully-specified oracle query.
///
/// The serde representation is the query descriptor: an internally-tagged
/// JSON object such as `{"type":"SpotPrice","asset":"eth","currency":"usd"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Query {
	SpotPrice(SpotPrice),
	CustomPrice(CustomPrice),
	StringQuery(StringQuery),
	#[serde(rename = "EVMCall")]
	EvmCall(EvmCall),
	GasPriceOracle(GasPriceOracle),
	#[serde(rename = "TellorRNG")]
	TellorRng(TellorRng),
	// The Ampleforth types carry no parameters at all.
	AmpleforthCustomSpotPrice,
	#[serde(rename = "AmpleforthUSPCE")]
	AmpleforthUspce,
}

impl Query {
	/// The registered type name embedded in `query_data`.
	pub fn query_type(&self) -> &'static str {
		match self {
			Query::SpotPrice(_) => "SpotPrice",
			Query::CustomPrice(_) => "CustomPrice",
			Query::StringQuery(_) => "StringQuery",
			Query::EvmCall(_) => "EVMCall",
			Query::GasPriceOracle(_) => "GasPriceOracle",
			Query::TellorRng(_) => "TellorRNG",
			Query::AmpleforthCustomSpotPrice => "AmpleforthCustomSpotPrice",
			Query::AmpleforthUspce => "AmpleforthUSPCE",
		}
	}

	/// The declared parameter list as `(name, abi_type)` pairs.
	pub fn params_abi(&self) -> &'static [(&'static str, &'static str)] {
		match self {
			Query::SpotPrice(_) => &[("asset", "string"), ("currency", "string")],
			Query::CustomPrice(_) => &[
				("identifier", "string"),
				("asset", "string"),
				("currency", "string"),
				("unit", "string"),
			],
			Query::StringQuery(_) => &[("text", "string")],
			Query::EvmCall(_) => &[
				("chainId", "uint256"),
				("contractAddress", "address"),
				("calldata", "bytes4"),
			],
			Query::GasPriceOracle(_) => &[("chainId", "uint256"), ("timestamp", "uint256")],
			Query::TellorRng(_) => &[("timestamp", "uint256")],
			Query::AmpleforthCustomSpotPrice | Query::AmpleforthUspce => &[],
		}
	}

	/// ABI encoding of the declared parameter values, or the phantom
	/// placeholder for parameterless types.
	pub fn encode_params(&self) -> Vec<u8> {
		let values: Vec<DynSolValue> = match self {
			Query::SpotPrice(q) => vec![
				DynSolValue::String(q.asset.clone()),
				DynSolValue::String(q.currency.clone()),
			],
			Query::CustomPrice(q) => vec![
				DynSolValue::String(q.identifier.clone()),
				DynSolValue::String(q.asset.clone()),
				DynSolValue::String(q.currency.clone()),
				DynSolValue::String(q.unit.clone()),
			],
			Query::StringQuery(q) => vec![DynSolValue::String(q.text.clone())],
			Query::EvmCall(q) => vec![
				DynSolValue::Uint(U256::from(q.chain_id), 256),
				DynSolValue::Address(q.contract_address),
				DynSolValue::FixedBytes(B256::right_padding_from(q.calldata.as_slice()), 4),
			],
			Query::GasPriceOracle(q) => vec![
				DynSolValue::Uint(U256::from(q.chain_id), 256),
				DynSolValue::Uint(U256::from(q.timestamp), 256),
			],
			Query::TellorRng(q) => vec![DynSolValue::Uint(U256::from(q.timestamp), 256)],
			Query::AmpleforthCustomSpotPrice | Query::AmpleforthUspce => {
				return PHANTOM_PARAMS.to_vec()
			},
		};
		DynSolValue::Tuple(values).abi_encode_params()
	}

	/// The canonical `query_data` bytes.
	pub fn query_data(&self) -> Vec<u8> {
		let encoded = DynSolValue::Tuple(vec![
			DynSolValue::String(self.query_type().to_string()),
			DynSolValue::Bytes(self.encode_params()),
		])
		.abi_encode_params();

		match self {
			// The function selector is right-justified in the final word so
			// the bytes match the query data generated in Solidity.
			Query::EvmCall(_) => shift_selector(encoded),
			_ => encoded,
		}
	}

	/// `keccak256(query_data)`, the 32-byte on-chain query identifier.
	pub fn query_id(&self) -> B256 {
		keccak256(self.query_data())
	}

	/// The ABI type expected for this query's response value.
	pub fn value_type(&self) -> ValueType {
		match self {
			Query::SpotPrice(_)
			| Query::CustomPrice(_)
			| Query::GasPriceOracle(_)
			| Query::AmpleforthCustomSpotPrice
			| Query::AmpleforthUspce => ValueType::ufixed(256, 18),
			Query::StringQuery(_) => ValueType::standard(DynSolType::String),
			Query::EvmCall(_) => ValueType::standard(DynSolType::Bytes),
			Query::TellorRng(_) => ValueType::standard(DynSolType::FixedBytes(32)),
		}
	}

	/// Compact JSON descriptor uniquely identifying the query.
	pub fn descriptor(&self) -> Result<String, QueryError> {
		serde_json::to_string(self).map_err(|e| QueryError::Serialization(e.to_string()))
	}

	/// Recreates a query from its JSON descriptor.
	pub fn from_descriptor(descriptor: &str) -> Result<Self, QueryError> {
		serde_json::from_str(descriptor).map_err(|e| QueryError::Serialization(e.to_string()))
	}
}

/// Right-justifies the 4-byte selector in the last word of EVMCall query
/// data. Compatibility quirk carried from the reference encoding.
fn shift_selector(mut data: Vec<u8>) -> Vec<u8> {
	let len = data.len();
	if len < 32 {
		return data;
	}
	let mut word = [0u8; 32];
	word[28..].copy_from_slice(&data[len - 32..len - 28]);
	data[len - 32..].copy_from_slice(&word);
	data
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_spot_price_canonical_query_id() {
		let q = Query::SpotPrice(SpotPrice::new("eth", "usd").unwrap());
		assert_eq!(
			hex::encode(q.query_id()),
			"83a7f3d48786ac2667503a61e8c415438ed2922eb86a2906e4ee66d9a2ce4992"
		);
	}

	#[test]
	fn test_spot_price_query_ids_stable() {
		let ids = [
			("btc", "a6f013ee236804827b77696d350e9f0ac3e879328f2a3021d473a0b778ad78ac"),
			("trb", "5c13cd9c97dbb98f2429c101a2a8150e6c7a0ddaff6124ee176a3a411067ded0"),
			("matic", "40aa71e5205fdc7bdb7d65f7ae41daca3820c5d3a8f62357a99eda3aa27244a3"),
		];
		for (asset, expected) in ids {
			let q = Query::SpotPrice(SpotPrice::new(asset, "usd").unwrap());
			assert_eq!(hex::encode(q.query_id()), expected, "{}/usd", asset);
		}
	}

	#[test]
	fn test_query_id_deterministic() {
		let a = Query::SpotPrice(SpotPrice::new("eth", "usd").unwrap());
		let b = Query::SpotPrice(SpotPrice::new("ETH", "USD").unwrap());
		assert_eq!(a.query_id(), b.query_id());
		assert_eq!(a.query_id().len(), 32);
	}

	#[test]
	fn test_spot_price_rejects_unsupported() {
		assert!(matches!(
			SpotPrice::new("eth", "xyz"),
			Err(QueryError::UnsupportedCurrency(_))
		));
		assert!(matches!(
			SpotPrice::new("notacoin", "usd"),
			Err(QueryError::UnsupportedPair { .. })
		));
	}

	#[test]
	fn test_descriptor_shape() {
		let q = Query::SpotPrice(SpotPrice::new("eth", "usd").unwrap());
		assert_eq!(
			q.descriptor().unwrap(),
			r#"{"type":"SpotPrice","asset":"eth","currency":"usd"}"#
		);
	}

	#[test]
	fn test_phantom_params_placeholder() {
		let q = Query::AmpleforthCustomSpotPrice;
		let params = q.encode_params();
		assert_eq!(params.len(), 64);
		assert_eq!(params[31], 0x20);
		assert!(params[..31].iter().all(|b| *b == 0));
		assert!(params[32..].iter().all(|b| *b == 0));
		assert!(q.query_data().ends_with(&params));

		assert_eq!(
			hex::encode(q.query_id()),
			"0d12ad49193163bbbeff4e6db8294ced23ff8605359fd666799d4e25a3aa0e3a"
		);
		assert_eq!(
			hex::encode(Query::AmpleforthUspce.query_id()),
			"612ec1d9cee860bb87deb6370ed0ae43345c9302c085c1dfc4c207cbec2970d7"
		);
	}

	#[test]
	fn test_evm_call_selector_shift() {
		let q = Query::EvmCall(EvmCall {
			chain_id: 1,
			contract_address: "0x88dF592F8eb5D7Bd38bFeF7dEb0fBc02cf3778a0"
				.parse()
				.unwrap(),
			calldata: FixedBytes::from([0x18, 0x16, 0x0d, 0xdd]),
		});
		let data = q.query_data();
		let last = &data[data.len() - 32..];
		assert!(last[..28].iter().all(|b| *b == 0));
		assert_eq!(&last[28..], &[0x18, 0x16, 0x0d, 0xdd]);
	}

	#[test]
	fn test_query_data_embeds_type_name() {
		let q = Query::StringQuery(StringQuery {
			text: "Where is the Atlantic ocean?".to_string(),
		});
		let data = q.query_data();
		let needle = b"StringQuery";
		assert!(data
			.windows(needle.len())
			.any(|window| window == needle));
	}
}
