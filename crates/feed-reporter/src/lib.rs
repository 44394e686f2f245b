//! Reporter: submits feed values to the Tellor oracle contract.
//!
//! The oracle contract is reached through [`OracleInterface`], with
//! [`AlloyOracle`] as the RPC-backed implementation; [`ReporterService`]
//! drives one feed against it on a fixed interval.

use thiserror::Error;

pub mod oracle;
pub mod service;

pub use oracle::{AlloyOracle, OracleInterface, StakerInfo, SubmitReceipt};
pub use service::ReporterService;

/// Errors raised while reporting a value on chain.
#[derive(Debug, Error)]
pub enum ReporterError {
	/// RPC transport or contract call failure.
	#[error("Network error: {0}")]
	Network(String),
	/// The signing key could not be used.
	#[error("Signer error: {0}")]
	Signer(String),
	/// The fetched value does not fit the query's value type.
	#[error(transparent)]
	Value(#[from] feed_types::ValueError),
	/// Query construction or encoding failure.
	#[error(transparent)]
	Query(#[from] feed_queries::QueryError),
}
