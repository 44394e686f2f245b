//! Oracle query model for the Tellor feed system.
//!
//! A query is an immutable logical request descriptor (for example "ETH
//! price in USD"). It derives two canonical values used on-chain:
//! `query_data`, the ABI encoding of the query's type name and parameters,
//! and `query_id`, the keccak-256 digest of `query_data`. This crate also
//! provides the type registry used to decode `query_data` back into a query,
//! and the catalog mapping human-readable tags to query instances.

use thiserror::Error;

pub mod catalog;
pub mod query;
pub mod registry;

pub use catalog::{standard_catalog, Catalog, CatalogEntry, CatalogError, CatalogFilter};
pub use query::{
	CustomPrice, EvmCall, GasPriceOracle, Query, SpotPrice, StringQuery, TellorRng,
};
pub use registry::QueryRegistry;

/// Errors that can occur while constructing, encoding or decoding queries.
#[derive(Debug, Error)]
pub enum QueryError {
	/// The asset/currency pair is not in the supported spot price list.
	#[error("{asset}/{currency} is not a supported pair")]
	UnsupportedPair { asset: String, currency: String },
	/// The currency is not in the supported currency list.
	#[error("currency {0} not supported")]
	UnsupportedCurrency(String),
	/// The query type name embedded in query data is not registered.
	#[error("Unsupported query type: {0}")]
	UnknownType(String),
	/// A query type was registered twice.
	#[error("Query type already registered: {0}")]
	DuplicateType(String),
	/// Malformed query data rejected by the ABI decoder.
	#[error("Query data decode error: {0}")]
	Decode(String),
	/// Descriptor serialization failure.
	#[error("Descriptor serialization error: {0}")]
	Serialization(String),
}
