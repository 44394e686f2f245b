//! Time-stamped datapoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single fetched value together with the time it was observed.
///
/// A failed fetch is represented as `Option::<DataPoint<T>>::None`, so a
/// value without a timestamp (or the reverse) is unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint<T> {
	pub value: T,
	pub timestamp: DateTime<Utc>,
}

impl<T> DataPoint<T> {
	/// Creates a datapoint stamped with the current UTC time.
	pub fn now(value: T) -> Self {
		Self {
			value,
			timestamp: datetime_now_utc(),
		}
	}
}

/// Returns the current UTC time used to stamp new datapoints.
pub fn datetime_now_utc() -> DateTime<Utc> {
	Utc::now()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_datapoint_now_is_recent() {
		let before = datetime_now_utc();
		let dp = DataPoint::now(42.0_f64);
		let after = datetime_now_utc();

		assert_eq!(dp.value, 42.0);
		assert!(dp.timestamp >= before && dp.timestamp <= after);
	}
}
