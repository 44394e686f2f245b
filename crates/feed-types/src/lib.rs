//! Shared leaf types for the Tellor feed system.
//!
//! This crate defines the time-stamped datapoint produced by every data
//! source, the dynamic value model exchanged between sources and the ABI
//! codec, and the `ValueType` that maps a logical response value to its
//! canonical on-chain byte encoding.

use thiserror::Error;

pub mod datapoint;
pub mod value;
pub mod value_type;

pub use datapoint::{datetime_now_utc, DataPoint};
pub use value::FeedValue;
pub use value_type::{ValueKind, ValueType};

/// Errors that can occur while encoding or decoding response values.
///
/// These are hard failures: they indicate a programming or protocol-version
/// mismatch, not a transient condition, and are meant to propagate.
#[derive(Debug, Error)]
pub enum ValueError {
	/// The ABI type string is not valid Solidity ABI grammar.
	#[error("Invalid ABI type string: {0}")]
	InvalidTypeString(String),
	/// The value does not match the declared ABI type.
	#[error("Type mismatch: expected {expected}, got {got}")]
	TypeMismatch { expected: String, got: String },
	/// A numeric value cannot be represented in the declared type.
	#[error("Value out of range for {0}")]
	Overflow(String),
	/// A negative value was supplied for an unsigned type.
	#[error("Negative value not allowed for unsigned type")]
	Negative,
	/// A non-finite float (NaN or infinity) cannot be encoded.
	#[error("Value is not a finite number")]
	NotFinite,
	/// The byte buffer has the wrong length for the declared type.
	#[error("Invalid encoded length: expected {expected} bytes, got {got}")]
	InvalidLength { expected: usize, got: usize },
	/// The underlying ABI decoder rejected the input.
	#[error("ABI decode error: {0}")]
	Decode(String),
}
