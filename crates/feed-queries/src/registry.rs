//! Query type registry.
//!
//! The registry is the explicit mapping from a query type name to a decode
//! function, populated by one registration call per concrete type at
//! startup. Decoding `query_data` looks up the embedded type name and
//! reconstructs the concrete query from its encoded parameters.

use std::collections::HashMap;

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{Address, FixedBytes};

use crate::query::{
	CustomPrice, EvmCall, GasPriceOracle, Query, SpotPrice, StringQuery, TellorRng,
};
use crate::QueryError;

type DecodeFn = fn(&[u8]) -> Result<Query, QueryError>;

/// Mapping from query type name to parameter decoder.
pub struct QueryRegistry {
	decoders: HashMap<String, DecodeFn>,
}

impl QueryRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self {
			decoders: HashMap::new(),
		}
	}

	/// Creates a registry with every supported query type registered.
	pub fn with_known_types() -> Self {
		let mut registry = Self::new();
		// Registration is explicit per type; a failure here is a
		// programming error (duplicate constant), hence the debug assert.
		for (name, decoder) in [
			("SpotPrice", decode_spot_price as DecodeFn),
			("CustomPrice", decode_custom_price),
			("StringQuery", decode_string_query),
			("EVMCall", decode_evm_call),
			("GasPriceOracle", decode_gas_price_oracle),
			("TellorRNG", decode_tellor_rng),
			("AmpleforthCustomSpotPrice", decode_ampleforth_custom),
			("AmpleforthUSPCE", decode_ampleforth_uspce),
		] {
			let registered = registry.register(name, decoder);
			debug_assert!(registered.is_ok(), "duplicate builtin type {}", name);
		}
		registry
	}

	/// Registers a decode function under a type name.
	///
	/// Type names must be unique; re-registering is an error.
	pub fn register(&mut self, name: &str, decoder: DecodeFn) -> Result<(), QueryError> {
		if self.decoders.contains_key(name) {
			return Err(QueryError::DuplicateType(name.to_string()));
		}
		self.decoders.insert(name.to_string(), decoder);
		Ok(())
	}

	/// True if the type name has a registered decoder.
	pub fn contains(&self, name: &str) -> bool {
		self.decoders.contains_key(name)
	}

	/// Reconstructs a query from its canonical `query_data` bytes.
	///
	/// Round-trip law: `decode_query_data(&q.query_data()) == q` for every
	/// supported query type.
	pub fn decode_query_data(&self, data: &[u8]) -> Result<Query, QueryError> {
		let outer = DynSolType::Tuple(vec![DynSolType::String, DynSolType::Bytes])
			.abi_decode_params(data)
			.map_err(|e| QueryError::Decode(e.to_string()))?;

		let (name, params) = match outer {
			DynSolValue::Tuple(mut values) if values.len() == 2 => {
				let params = values.pop();
				let name = values.pop();
				match (name, params) {
					(Some(DynSolValue::String(name)), Some(DynSolValue::Bytes(params))) => {
						(name, params)
					},
					_ => {
						return Err(QueryError::Decode(
							"query data is not (string, bytes)".to_string(),
						))
					},
				}
			},
			_ => {
				return Err(QueryError::Decode(
					"query data is not (string, bytes)".to_string(),
				))
			},
		};

		let decoder = self
			.decoders
			.get(&name)
			.ok_or_else(|| QueryError::UnknownType(name.clone()))?;
		decoder(&params)
	}
}

impl Default for QueryRegistry {
	fn default() -> Self {
		Self::with_known_types()
	}
}

/// Decodes an encoded parameter sequence against the given types.
fn decode_params(types: &[DynSolType], data: &[u8]) -> Result<Vec<DynSolValue>, QueryError> {
	let decoded = DynSolType::Tuple(types.to_vec())
		.abi_decode_params(data)
		.map_err(|e| QueryError::Decode(e.to_string()))?;
	match decoded {
		DynSolValue::Tuple(values) => Ok(values),
		single => Ok(vec![single]),
	}
}

fn take_string(value: DynSolValue) -> Result<String, QueryError> {
	match value {
		DynSolValue::String(s) => Ok(s),
		other => Err(QueryError::Decode(format!(
			"expected string parameter, got {:?}",
			other
		))),
	}
}

fn take_u64(value: DynSolValue) -> Result<u64, QueryError> {
	match value {
		DynSolValue::Uint(v, _) => v
			.try_into()
			.map_err(|_| QueryError::Decode("uint256 parameter out of u64 range".to_string())),
		other => Err(QueryError::Decode(format!(
			"expected uint parameter, got {:?}",
			other
		))),
	}
}

fn decode_spot_price(data: &[u8]) -> Result<Query, QueryError> {
	let mut values = decode_params(&[DynSolType::String, DynSolType::String], data)?.into_iter();
	let asset = take_string(values.next().ok_or_else(missing_param)?)?;
	let currency = take_string(values.next().ok_or_else(missing_param)?)?;
	Ok(Query::SpotPrice(SpotPrice::new(&asset, &currency)?))
}

fn decode_custom_price(data: &[u8]) -> Result<Query, QueryError> {
	let types = [
		DynSolType::String,
		DynSolType::String,
		DynSolType::String,
		DynSolType::String,
	];
	let mut values = decode_params(&types, data)?.into_iter();
	Ok(Query::CustomPrice(CustomPrice {
		identifier: take_string(values.next().ok_or_else(missing_param)?)?,
		asset: take_string(values.next().ok_or_else(missing_param)?)?,
		currency: take_string(values.next().ok_or_else(missing_param)?)?,
		unit: take_string(values.next().ok_or_else(missing_param)?)?,
	}))
}

fn decode_string_query(data: &[u8]) -> Result<Query, QueryError> {
	let mut values = decode_params(&[DynSolType::String], data)?.into_iter();
	Ok(Query::StringQuery(StringQuery {
		text: take_string(values.next().ok_or_else(missing_param)?)?,
	}))
}

/// EVMCall parameters are decoded by hand because the selector word is
/// right-justified (see the query data shift) and a standard `bytes4`
/// decode would read zeros.
fn decode_evm_call(data: &[u8]) -> Result<Query, QueryError> {
	if data.len() != 96 {
		return Err(QueryError::Decode(format!(
			"EVMCall parameters must be 96 bytes, got {}",
			data.len()
		)));
	}
	let chain_id = take_u64(DynSolValue::Uint(
		alloy::primitives::U256::from_be_slice(&data[..32]),
		256,
	))?;
	let contract_address = Address::from_slice(&data[44..64]);
	let calldata = FixedBytes::<4>::from_slice(&data[92..96]);
	Ok(Query::EvmCall(EvmCall {
		chain_id,
		contract_address,
		calldata,
	}))
}

fn decode_gas_price_oracle(data: &[u8]) -> Result<Query, QueryError> {
	let mut values =
		decode_params(&[DynSolType::Uint(256), DynSolType::Uint(256)], data)?.into_iter();
	Ok(Query::GasPriceOracle(GasPriceOracle {
		chain_id: take_u64(values.next().ok_or_else(missing_param)?)?,
		timestamp: take_u64(values.next().ok_or_else(missing_param)?)?,
	}))
}

fn decode_tellor_rng(data: &[u8]) -> Result<Query, QueryError> {
	let mut values = decode_params(&[DynSolType::Uint(256)], data)?.into_iter();
	Ok(Query::TellorRng(TellorRng {
		timestamp: take_u64(values.next().ok_or_else(missing_param)?)?,
	}))
}

fn decode_ampleforth_custom(_data: &[u8]) -> Result<Query, QueryError> {
	Ok(Query::AmpleforthCustomSpotPrice)
}

fn decode_ampleforth_uspce(_data: &[u8]) -> Result<Query, QueryError> {
	Ok(Query::AmpleforthUspce)
}

fn missing_param() -> QueryError {
	QueryError::Decode("missing parameter".to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_queries() -> Vec<Query> {
		vec![
			Query::SpotPrice(SpotPrice::new("eth", "usd").unwrap()),
			Query::SpotPrice(SpotPrice::new("ohm", "eth").unwrap()),
			Query::CustomPrice(CustomPrice {
				identifier: "landx".to_string(),
				asset: "corn".to_string(),
				currency: "usd".to_string(),
				unit: "per_kilogram".to_string(),
			}),
			Query::StringQuery(StringQuery {
				text: "Where is the Atlantic ocean?".to_string(),
			}),
			Query::EvmCall(EvmCall {
				chain_id: 1,
				contract_address: "0x88dF592F8eb5D7Bd38bFeF7dEb0fBc02cf3778a0"
					.parse()
					.unwrap(),
				calldata: FixedBytes::from([0x18, 0x16, 0x0d, 0xdd]),
			}),
			Query::GasPriceOracle(GasPriceOracle {
				chain_id: 1,
				timestamp: 1656633600,
			}),
			Query::TellorRng(TellorRng {
				timestamp: 1660567612,
			}),
			Query::AmpleforthCustomSpotPrice,
			Query::AmpleforthUspce,
		]
	}

	#[test]
	fn test_query_data_round_trip() {
		let registry = QueryRegistry::with_known_types();
		for query in sample_queries() {
			let decoded = registry.decode_query_data(&query.query_data()).unwrap();
			assert_eq!(decoded, query, "{} did not round-trip", query.query_type());
		}
	}

	#[test]
	fn test_unknown_type_errors() {
		let registry = QueryRegistry::new();
		let query = Query::SpotPrice(SpotPrice::new("eth", "usd").unwrap());
		assert!(matches!(
			registry.decode_query_data(&query.query_data()),
			Err(QueryError::UnknownType(name)) if name == "SpotPrice"
		));
	}

	#[test]
	fn test_duplicate_registration_errors() {
		let mut registry = QueryRegistry::with_known_types();
		assert!(matches!(
			registry.register("SpotPrice", decode_spot_price),
			Err(QueryError::DuplicateType(_))
		));
	}

	#[test]
	fn test_malformed_query_data_errors() {
		let registry = QueryRegistry::with_known_types();
		assert!(matches!(
			registry.decode_query_data(&[0u8; 16]),
			Err(QueryError::Decode(_))
		));
	}

	#[test]
	fn test_descriptor_round_trip() {
		for query in sample_queries() {
			let descriptor = query.descriptor().unwrap();
			assert_eq!(Query::from_descriptor(&descriptor).unwrap(), query);
		}
	}
}
