//! Response value encoding.
//!
//! A `ValueType` declares the Solidity ABI type string and packing mode used
//! to encode the response value submitted on-chain for a query. Encoding must
//! be byte-exact with every other Tellor client and with the oracle contract
//! itself, so the ABI type grammar is the single source of truth: fixed-point
//! strings like `ufixed256x18` are parsed by an explicit validator, and
//! everything else must parse as standard Solidity ABI grammar.

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::U256;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{FeedValue, ValueError};

/// The interpretation of a declared ABI type string.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
	/// An unsigned fixed-point number, `ufixed{bits}x{decimals}`.
	///
	/// Float inputs are quantized to `decimals` decimal places and encoded
	/// as a scaled unsigned integer.
	FixedPoint { bits: usize, decimals: u32 },
	/// Any other Solidity ABI type, handled by the standard codec.
	Standard(DynSolType),
}

/// Declared ABI type and packing mode for a query's response value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueType {
	abi_type: String,
	packed: bool,
	kind: ValueKind,
}

impl ValueType {
	/// Parses and validates an ABI type string.
	///
	/// Fixed-point strings are validated up front: the bit width must be a
	/// multiple of 8 in `8..=256` and the decimal count in `1..=80`. A
	/// malformed string is rejected here with a clear error rather than
	/// producing silently wrong offsets later.
	pub fn new(abi_type: &str, packed: bool) -> Result<Self, ValueError> {
		let kind = if let Some(stripped) = abi_type.strip_prefix("ufixed") {
			let (bits, decimals) = parse_fixed_suffix(abi_type, stripped)?;
			ValueKind::FixedPoint { bits, decimals }
		} else if abi_type.starts_with("fixed") {
			// The feed system never submits signed fixed-point values.
			return Err(ValueError::InvalidTypeString(format!(
				"{}: signed fixed-point types are not supported",
				abi_type
			)));
		} else {
			let ty = DynSolType::parse(abi_type)
				.map_err(|e| ValueError::InvalidTypeString(format!("{}: {}", abi_type, e)))?;
			ValueKind::Standard(ty)
		};

		Ok(Self {
			abi_type: abi_type.to_string(),
			packed,
			kind,
		})
	}

	/// Builds an unpacked fixed-point type directly from its components.
	///
	/// Used by query types whose response type is a code constant and can
	/// never be malformed.
	pub fn ufixed(bits: usize, decimals: u32) -> Self {
		Self {
			abi_type: format!("ufixed{}x{}", bits, decimals),
			packed: false,
			kind: ValueKind::FixedPoint { bits, decimals },
		}
	}

	/// Builds an unpacked standard type from an already-parsed ABI type.
	pub fn standard(ty: DynSolType) -> Self {
		Self {
			abi_type: ty.sol_type_name().into_owned(),
			packed: false,
			kind: ValueKind::Standard(ty),
		}
	}

	/// Convenience constructor for the common unpacked `ufixed` types.
	pub fn unsigned_float(abi_type: &str) -> Result<Self, ValueError> {
		let vt = Self::new(abi_type, false)?;
		match vt.kind {
			ValueKind::FixedPoint { .. } => Ok(vt),
			ValueKind::Standard(_) => Err(ValueError::InvalidTypeString(format!(
				"{}: not a ufixed type",
				abi_type
			))),
		}
	}

	/// The declared ABI type string.
	pub fn abi_type(&self) -> &str {
		&self.abi_type
	}

	/// True if values are encoded with the non-standard packed encoding.
	pub fn packed(&self) -> bool {
		self.packed
	}

	pub fn kind(&self) -> &ValueKind {
		&self.kind
	}

	/// Encodes a value into its canonical ABI byte representation.
	pub fn encode(&self, value: &FeedValue) -> Result<Vec<u8>, ValueError> {
		match &self.kind {
			ValueKind::FixedPoint { bits, decimals } => {
				let v = match value {
					FeedValue::Float(v) => *v,
					other => {
						return Err(ValueError::TypeMismatch {
							expected: self.abi_type.clone(),
							got: other.kind_name().to_string(),
						})
					},
				};
				let scaled = scale_to_integer(v, *decimals, &self.abi_type)?;
				if *bits < 256 && scaled >> *bits != U256::ZERO {
					return Err(ValueError::Overflow(self.abi_type.clone()));
				}
				let word = scaled.to_be_bytes::<32>();
				if self.packed {
					Ok(word[32 - bits / 8..].to_vec())
				} else {
					// Unpacked fixed-point values occupy a full word
					// regardless of the declared bit width.
					Ok(word.to_vec())
				}
			},
			ValueKind::Standard(ty) => {
				let sol = value.to_sol(ty)?;
				if self.packed {
					Ok(sol.abi_encode_packed())
				} else {
					match sol {
						// A top-level tuple encodes as a parameter
						// sequence, matching eth-abi and the contracts.
						DynSolValue::Tuple(_) => Ok(sol.abi_encode_params()),
						_ => Ok(sol.abi_encode()),
					}
				}
			},
		}
	}

	/// Decodes ABI bytes back into a value. Inverse of [`encode`](Self::encode).
	pub fn decode(&self, data: &[u8]) -> Result<FeedValue, ValueError> {
		match &self.kind {
			ValueKind::FixedPoint { bits, decimals } => {
				let expected = if self.packed { bits / 8 } else { 32 };
				if data.len() != expected {
					return Err(ValueError::InvalidLength {
						expected,
						got: data.len(),
					});
				}
				let scaled = U256::from_be_slice(data);
				Ok(FeedValue::Float(
					u256_to_f64(scaled) / 10f64.powi(*decimals as i32),
				))
			},
			ValueKind::Standard(ty) => {
				if self.packed {
					return Err(ValueError::Decode(
						"packed-encoded values cannot be decoded".to_string(),
					));
				}
				let decoded = match ty {
					DynSolType::Tuple(_) => ty.abi_decode_params(data),
					_ => ty.abi_decode(data),
				}
				.map_err(|e| ValueError::Decode(e.to_string()))?;
				FeedValue::from_sol(decoded)
			},
		}
	}
}

/// Parses the `{M}x{N}` suffix of a `ufixed` type string.
fn parse_fixed_suffix(abi_type: &str, suffix: &str) -> Result<(usize, u32), ValueError> {
	let invalid = |reason: &str| ValueError::InvalidTypeString(format!("{}: {}", abi_type, reason));

	let (m, n) = suffix
		.split_once('x')
		.ok_or_else(|| invalid("expected ufixed<bits>x<decimals>"))?;
	let bits: usize = m
		.parse()
		.map_err(|_| invalid("bit width is not a number"))?;
	let decimals: u32 = n
		.parse()
		.map_err(|_| invalid("decimal count is not a number"))?;

	if bits % 8 != 0 || !(8..=256).contains(&bits) {
		return Err(invalid("bit width must be a multiple of 8 in 8..=256"));
	}
	if !(1..=80).contains(&decimals) {
		return Err(invalid("decimal count must be in 1..=80"));
	}

	Ok((bits, decimals))
}

/// Quantizes a float to `decimals` decimal places and scales it to an
/// unsigned integer. Uses banker's rounding at the quantization step.
fn scale_to_integer(value: f64, decimals: u32, abi_type: &str) -> Result<U256, ValueError> {
	if !value.is_finite() {
		return Err(ValueError::NotFinite);
	}
	if value < 0.0 {
		return Err(ValueError::Negative);
	}

	let decimal =
		Decimal::from_f64(value).ok_or_else(|| ValueError::Overflow(abi_type.to_string()))?;
	let quantized = decimal.round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven);

	// mantissa * 10^(decimals - scale) in 256-bit arithmetic so wide
	// decimal counts like x18 cannot overflow the intermediate.
	let mantissa = U256::from(quantized.mantissa().unsigned_abs());
	let exponent = decimals.saturating_sub(quantized.scale());
	let factor = U256::from(10u64)
		.checked_pow(U256::from(exponent))
		.ok_or_else(|| ValueError::Overflow(abi_type.to_string()))?;
	mantissa
		.checked_mul(factor)
		.ok_or_else(|| ValueError::Overflow(abi_type.to_string()))
}

fn u256_to_f64(value: U256) -> f64 {
	value
		.as_limbs()
		.iter()
		.enumerate()
		.map(|(i, limb)| (*limb as f64) * 2f64.powi(64 * i as i32))
		.sum()
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::Address;

	#[test]
	fn test_fixed_encoding_ufixed256x9() {
		let vt = ValueType::new("ufixed256x9", false).unwrap();
		let encoded = vt.encode(&FeedValue::Float(1.0)).unwrap();
		assert_eq!(
			hex::encode(&encoded),
			"000000000000000000000000000000000000000000000000000000003b9aca00"
		);
	}

	#[test]
	fn test_fixed_encoding_packed() {
		let vt = ValueType::new("ufixed64x9", true).unwrap();
		let encoded = vt.encode(&FeedValue::Float(1.0)).unwrap();
		assert_eq!(hex::encode(&encoded), "000000003b9aca00");

		// Packed fixed-point values decode through the explicit width.
		let decoded = vt.decode(&encoded).unwrap();
		assert_eq!(decoded, FeedValue::Float(1.0));
	}

	#[test]
	fn test_unsigned_float_quantization() {
		let vt = ValueType::unsigned_float("ufixed64x6").unwrap();
		let encoded = vt.encode(&FeedValue::Float(99.0000009)).unwrap();
		// Unpacked values are a full word even for 64-bit widths.
		assert_eq!(
			hex::encode(&encoded),
			"0000000000000000000000000000000000000000000000000000000005e69ec1"
		);
		assert_eq!(vt.decode(&encoded).unwrap(), FeedValue::Float(99.000001));
	}

	#[test]
	fn test_float_round_trip_18_decimals() {
		let vt = ValueType::unsigned_float("ufixed256x18").unwrap();
		let value = 27.723456789123456789_f64;
		let encoded = vt.encode(&FeedValue::Float(value)).unwrap();
		let decoded = match vt.decode(&encoded).unwrap() {
			FeedValue::Float(v) => v,
			other => panic!("expected float, got {:?}", other),
		};
		assert!((decoded - value).abs() < 1e-9);
	}

	#[test]
	fn test_fixed_width_overflow() {
		let vt = ValueType::new("ufixed8x1", false).unwrap();
		assert!(matches!(
			vt.encode(&FeedValue::Float(100.0)),
			Err(ValueError::Overflow(_))
		));
	}

	#[test]
	fn test_negative_rejected() {
		let vt = ValueType::new("ufixed256x18", false).unwrap();
		assert!(matches!(
			vt.encode(&FeedValue::Float(-1.0)),
			Err(ValueError::Negative)
		));
	}

	#[test]
	fn test_malformed_type_strings_rejected() {
		for bad in ["ufixed256x", "ufixed0x18", "ufixed256x81", "ufixed12x3", "ufixedx18", "notatype"] {
			assert!(
				matches!(
					ValueType::new(bad, false),
					Err(ValueError::InvalidTypeString(_))
				),
				"{} should be rejected",
				bad
			);
		}
	}

	#[test]
	fn test_tuple_round_trip() {
		let vt = ValueType::new("(uint256,uint256)", false).unwrap();
		let value = FeedValue::Tuple(vec![
			FeedValue::Uint(U256::from(123)),
			FeedValue::Uint(U256::from(456)),
		]);
		let encoded = vt.encode(&value).unwrap();
		assert_eq!(encoded.len(), 64);
		assert_eq!(vt.decode(&encoded).unwrap(), value);
	}

	#[test]
	fn test_tuple_arity_mismatch_errors() {
		let vt = ValueType::new("(uint256,uint256)", false).unwrap();
		let value = FeedValue::Tuple(vec![
			FeedValue::Uint(U256::from(1)),
			FeedValue::Uint(U256::from(2)),
			FeedValue::Uint(U256::from(3)),
		]);
		assert!(matches!(
			vt.encode(&value),
			Err(ValueError::TypeMismatch { .. })
		));
	}

	#[test]
	fn test_short_buffer_decode_errors() {
		let vt = ValueType::new("ufixed256x18", false).unwrap();
		assert!(matches!(
			vt.decode(&[0u8; 16]),
			Err(ValueError::InvalidLength {
				expected: 32,
				got: 16
			})
		));

		let vt = ValueType::new("(uint256,uint256)", false).unwrap();
		assert!(matches!(
			vt.decode(&[0u8; 32]),
			Err(ValueError::Decode(_))
		));
	}

	#[test]
	fn test_string_value_round_trip() {
		let vt = ValueType::new("string", false).unwrap();
		let value = FeedValue::Text("Where is the Atlantic ocean?".to_string());
		let encoded = vt.encode(&value).unwrap();
		assert_eq!(vt.decode(&encoded).unwrap(), value);
	}

	#[test]
	fn test_address_value_round_trip() {
		let vt = ValueType::new("address", false).unwrap();
		let value = FeedValue::Address(Address::repeat_byte(0x11));
		let encoded = vt.encode(&value).unwrap();
		assert_eq!(encoded.len(), 32);
		assert_eq!(vt.decode(&encoded).unwrap(), value);
	}
}
