//! Access-order tracking for least-recently-used eviction.

use std::collections::VecDeque;

/// Tracks the order in which keys were last used.
///
/// The front of the queue holds the most recently used key and the back holds the least recently used one.
#[derive(Debug, Clone, Default)]
pub(crate) struct LruTracker {
	/// Keys from most to least recently used
	order: VecDeque<String>,
}

impl LruTracker {
	/// Creates an empty tracker.
	#[must_use]
	pub(crate) const fn new() -> Self {
		Self { order: VecDeque::new() }
	}

	/// Marks a key as the most recently used, adding it if it isn't tracked yet.
	pub(crate) fn touch(&mut self, key: &str) {
		self.remove(key);
		self.order.push_front(key.to_owned());
	}

	/// Stops tracking a key.
	pub(crate) fn remove(&mut self, key: &str) {
		self.order.retain(|tracked| tracked != key);
	}

	/// Removes and returns the least recently used key.
	pub(crate) fn evict_oldest(&mut self) -> Option<String> {
		self.order.pop_back()
	}

	/// Least recently used key, without removing it
	#[cfg(test)]
	#[must_use]
	pub(crate) fn peek_oldest(&self) -> Option<&str> {
		self.order.back().map(String::as_str)
	}

	/// Number of tracked keys
	#[cfg(test)]
	#[must_use]
	pub(crate) fn len(&self) -> usize {
		self.order.len()
	}

	/// Forgets every key.
	pub(crate) fn clear(&mut self) {
		self.order.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::LruTracker;

	#[test]
	fn touch_orders_by_recency() {
		let mut lru = LruTracker::new();
		lru.touch("1D6");
		lru.touch("2D6");
		lru.touch("3D6");
		assert_eq!(lru.len(), 3);
		assert_eq!(lru.peek_oldest(), Some("1D6"));

		lru.touch("1D6");
		assert_eq!(lru.len(), 3);
		assert_eq!(lru.peek_oldest(), Some("2D6"));
	}

	#[test]
	fn evicts_from_the_back() {
		let mut lru = LruTracker::new();
		for key in ["a", "b", "c"] {
			lru.touch(key);
		}
		lru.touch("a");
		lru.touch("c");
		lru.touch("b");

		assert_eq!(lru.evict_oldest().as_deref(), Some("a"));
		assert_eq!(lru.evict_oldest().as_deref(), Some("c"));
		assert_eq!(lru.evict_oldest().as_deref(), Some("b"));
		assert_eq!(lru.evict_oldest(), None);
	}

	#[test]
	fn remove_and_clear() {
		let mut lru = LruTracker::new();
		lru.touch("a");
		lru.touch("b");
		lru.remove("missing");
		assert_eq!(lru.len(), 2);

		lru.remove("a");
		assert_eq!(lru.peek_oldest(), Some("b"));

		lru.clear();
		assert_eq!(lru.len(), 0);
		assert_eq!(lru.peek_oldest(), None);
	}
}
