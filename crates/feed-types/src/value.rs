//! Dynamic response values.
//!
//! A `FeedValue` is the loosely-typed value produced by a data source before
//! it is ABI-encoded for submission. Conversions to and from alloy's
//! `DynSolValue` are checked against the declared `DynSolType`, so a tuple
//! arity or element type mismatch surfaces as a `ValueError` instead of a
//! silently wrong encoding.

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{Address, B256, U256};

use crate::ValueError;

/// A dynamically typed value returned by a data source.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedValue {
	/// A floating point number, used with fixed-point ABI types.
	Float(f64),
	/// An unsigned integer.
	Uint(U256),
	/// A UTF-8 string.
	Text(String),
	/// Raw bytes, used for both `bytes` and `bytesN` ABI types.
	Bytes(Vec<u8>),
	/// A boolean.
	Bool(bool),
	/// An EVM address.
	Address(Address),
	/// An ordered, heterogeneous tuple.
	Tuple(Vec<FeedValue>),
	/// A homogeneous array.
	Array(Vec<FeedValue>),
}

impl FeedValue {
	/// Short name of the variant, used in error messages.
	pub fn kind_name(&self) -> &'static str {
		match self {
			FeedValue::Float(_) => "float",
			FeedValue::Uint(_) => "uint",
			FeedValue::Text(_) => "string",
			FeedValue::Bytes(_) => "bytes",
			FeedValue::Bool(_) => "bool",
			FeedValue::Address(_) => "address",
			FeedValue::Tuple(_) => "tuple",
			FeedValue::Array(_) => "array",
		}
	}

	/// Converts the value into a `DynSolValue` matching the expected type.
	///
	/// Fails with `ValueError::TypeMismatch` when the value shape does not
	/// fit the declared ABI type, including tuple arity mismatches.
	pub fn to_sol(&self, expected: &DynSolType) -> Result<DynSolValue, ValueError> {
		let mismatch = || ValueError::TypeMismatch {
			expected: expected.to_string(),
			got: self.kind_name().to_string(),
		};

		match (expected, self) {
			(DynSolType::Uint(size), FeedValue::Uint(v)) => Ok(DynSolValue::Uint(*v, *size)),
			(DynSolType::Bool, FeedValue::Bool(v)) => Ok(DynSolValue::Bool(*v)),
			(DynSolType::Address, FeedValue::Address(v)) => Ok(DynSolValue::Address(*v)),
			(DynSolType::String, FeedValue::Text(v)) => Ok(DynSolValue::String(v.clone())),
			(DynSolType::Bytes, FeedValue::Bytes(v)) => Ok(DynSolValue::Bytes(v.clone())),
			(DynSolType::FixedBytes(size), FeedValue::Bytes(v)) => {
				if v.len() != *size {
					return Err(ValueError::InvalidLength {
						expected: *size,
						got: v.len(),
					});
				}
				let mut word = B256::ZERO;
				word[..*size].copy_from_slice(v);
				Ok(DynSolValue::FixedBytes(word, *size))
			},
			(DynSolType::Tuple(types), FeedValue::Tuple(values)) => {
				if types.len() != values.len() {
					return Err(mismatch());
				}
				let converted = types
					.iter()
					.zip(values)
					.map(|(t, v)| v.to_sol(t))
					.collect::<Result<Vec<_>, _>>()?;
				Ok(DynSolValue::Tuple(converted))
			},
			(DynSolType::Array(inner), FeedValue::Array(values)) => {
				let converted = values
					.iter()
					.map(|v| v.to_sol(inner))
					.collect::<Result<Vec<_>, _>>()?;
				Ok(DynSolValue::Array(converted))
			},
			(DynSolType::FixedArray(inner, len), FeedValue::Array(values)) => {
				if values.len() != *len {
					return Err(mismatch());
				}
				let converted = values
					.iter()
					.map(|v| v.to_sol(inner))
					.collect::<Result<Vec<_>, _>>()?;
				Ok(DynSolValue::FixedArray(converted))
			},
			_ => Err(mismatch()),
		}
	}

	/// Converts a decoded `DynSolValue` back into a `FeedValue`.
	pub fn from_sol(value: DynSolValue) -> Result<Self, ValueError> {
		match value {
			DynSolValue::Uint(v, _) => Ok(FeedValue::Uint(v)),
			DynSolValue::Bool(v) => Ok(FeedValue::Bool(v)),
			DynSolValue::Address(v) => Ok(FeedValue::Address(v)),
			DynSolValue::String(v) => Ok(FeedValue::Text(v)),
			DynSolValue::Bytes(v) => Ok(FeedValue::Bytes(v)),
			DynSolValue::FixedBytes(word, size) => Ok(FeedValue::Bytes(word[..size].to_vec())),
			DynSolValue::Tuple(values) => {
				let converted = values
					.into_iter()
					.map(FeedValue::from_sol)
					.collect::<Result<Vec<_>, _>>()?;
				Ok(FeedValue::Tuple(converted))
			},
			DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
				let converted = values
					.into_iter()
					.map(FeedValue::from_sol)
					.collect::<Result<Vec<_>, _>>()?;
				Ok(FeedValue::Array(converted))
			},
			other => Err(ValueError::Decode(format!(
				"unsupported decoded value: {:?}",
				other
			))),
		}
	}
}

impl From<f64> for FeedValue {
	fn from(v: f64) -> Self {
		FeedValue::Float(v)
	}
}

impl From<String> for FeedValue {
	fn from(v: String) -> Self {
		FeedValue::Text(v)
	}
}

impl From<&str> for FeedValue {
	fn from(v: &str) -> Self {
		FeedValue::Text(v.to_string())
	}
}

impl From<U256> for FeedValue {
	fn from(v: U256) -> Self {
		FeedValue::Uint(v)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_tuple_arity_mismatch() {
		let ty = DynSolType::Tuple(vec![DynSolType::Uint(256), DynSolType::Uint(256)]);
		let value = FeedValue::Tuple(vec![
			FeedValue::Uint(U256::from(1)),
			FeedValue::Uint(U256::from(2)),
			FeedValue::Uint(U256::from(3)),
		]);

		assert!(matches!(
			value.to_sol(&ty),
			Err(ValueError::TypeMismatch { .. })
		));
	}

	#[test]
	fn test_fixed_bytes_length_check() {
		let ty = DynSolType::FixedBytes(4);
		let value = FeedValue::Bytes(vec![1, 2, 3]);

		assert!(matches!(
			value.to_sol(&ty),
			Err(ValueError::InvalidLength {
				expected: 4,
				got: 3
			})
		));
	}

	#[test]
	fn test_sol_round_trip() {
		let ty = DynSolType::Tuple(vec![DynSolType::String, DynSolType::Bool]);
		let value = FeedValue::Tuple(vec![FeedValue::Text("abc".into()), FeedValue::Bool(true)]);

		let sol = value.to_sol(&ty).unwrap();
		assert_eq!(FeedValue::from_sol(sol).unwrap(), value);
	}
}
