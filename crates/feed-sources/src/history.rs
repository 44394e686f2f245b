//! Bounded per-source fetch history.

use std::collections::VecDeque;

use tokio::sync::RwLock;

use feed_types::DataPoint;

/// Default number of datapoints retained per source.
pub const DEFAULT_MAX_DATAPOINTS: usize = 256;

/// A bounded FIFO of datapoints.
///
/// Append-only; the oldest entry is evicted once the capacity is reached.
/// Each source owns its history exclusively, so the lock is only ever
/// contended by readers.
#[derive(Debug)]
pub struct History<T> {
	capacity: usize,
	buffer: RwLock<VecDeque<DataPoint<T>>>,
}

impl<T: Clone> History<T> {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			buffer: RwLock::new(VecDeque::with_capacity(capacity.min(64))),
		}
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Appends a datapoint, evicting the oldest entry when full.
	pub async fn store(&self, datapoint: DataPoint<T>) {
		let mut buffer = self.buffer.write().await;
		if buffer.len() == self.capacity {
			buffer.pop_front();
		}
		buffer.push_back(datapoint);
	}

	/// The most recent datapoint, O(1).
	pub async fn latest(&self) -> Option<DataPoint<T>> {
		self.buffer.read().await.back().cloned()
	}

	/// All retained datapoints, oldest first.
	pub async fn all(&self) -> Vec<DataPoint<T>> {
		self.buffer.read().await.iter().cloned().collect()
	}

	pub async fn depth(&self) -> usize {
		self.buffer.read().await.len()
	}
}

impl<T: Clone> Default for History<T> {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_DATAPOINTS)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_latest_on_empty_is_none() {
		let history: History<f64> = History::default();
		assert!(history.latest().await.is_none());
		assert_eq!(history.depth().await, 0);
	}

	#[tokio::test]
	async fn test_fifo_eviction_at_capacity() {
		let history: History<f64> = History::new(3);
		for i in 0..4 {
			history.store(DataPoint::now(i as f64)).await;
		}

		let all = history.all().await;
		assert_eq!(all.len(), 3);
		// Oldest entry (0.0) was evicted.
		let values: Vec<f64> = all.iter().map(|dp| dp.value).collect();
		assert_eq!(values, vec![1.0, 2.0, 3.0]);
		assert_eq!(history.latest().await.map(|dp| dp.value), Some(3.0));
	}
}
