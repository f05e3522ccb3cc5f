//! Bounded memo of expression results, keyed by normalized expression text.
//!
//! Note that this stores the *first* result of a random expression and hands it back on every later lookup. The
//! engine only consults it when asked to, see [`RollOptions`].
//!
//! [`RollOptions`]: crate::engine::RollOptions

mod lru;
mod stats;

use std::collections::HashMap;

pub use self::stats::StatsSnapshot;
use self::{lru::LruTracker, stats::Stats};

/// Least-recently-used cache of expression results
#[derive(Debug, Clone)]
pub struct Cache {
	/// Stored results by normalized expression
	entries: HashMap<String, i64>,

	/// Access order of the stored keys
	order: LruTracker,

	/// Maximum number of entries
	capacity: usize,

	/// Lookup counters
	stats: Stats,
}

impl Cache {
	/// Creates an empty cache holding at most `capacity` entries. A capacity of zero stores nothing.
	/// Storage grows with use, so a huge capacity costs nothing up front.
	#[must_use]
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: HashMap::new(),
			order: LruTracker::new(),
			capacity,
			stats: Stats::new(),
		}
	}

	/// Looks up a stored result, counting a hit or miss. A hit makes the entry the most recently used.
	pub fn get(&mut self, key: &str) -> Option<i64> {
		if let Some(&value) = self.entries.get(key) {
			self.order.touch(key);
			self.stats.record_hit();
			tracing::trace!(key, value, "cache hit");
			Some(value)
		} else {
			self.stats.record_miss();
			tracing::trace!(key, "cache miss");
			None
		}
	}

	/// Stores a result, evicting the least recently used entry when a new key arrives at capacity.
	///
	/// # Examples
	/// ```
	/// use dicetray::cache::Cache;
	///
	/// let mut cache = Cache::new(2);
	/// cache.put("1D6", 4);
	/// cache.put("2D6", 7);
	/// assert_eq!(cache.get("1D6"), Some(4));
	///
	/// // 2D6 is now the least recently used, so it makes way for 3D6
	/// cache.put("3D6", 12);
	/// assert_eq!(cache.get("2D6"), None);
	/// assert_eq!(cache.get("1D6"), Some(4));
	/// assert_eq!(cache.stats().evictions, 1);
	/// ```
	pub fn put(&mut self, key: &str, value: i64) {
		if self.capacity == 0 {
			return;
		}

		if !self.entries.contains_key(key) && self.entries.len() >= self.capacity {
			if let Some(evicted) = self.order.evict_oldest() {
				self.entries.remove(&evicted);
				self.stats.record_eviction();
				tracing::trace!(key = %evicted, "cache eviction");
			}
		}

		self.entries.insert(key.to_owned(), value);
		self.order.touch(key);
	}

	/// Drops every entry and zeroes the counters. The creation time is kept.
	pub fn clear(&mut self) {
		self.entries.clear();
		self.order.clear();
		self.stats.reset();
	}

	/// Number of stored entries
	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Checks whether nothing is stored.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Maximum number of entries
	#[must_use]
	pub const fn capacity(&self) -> usize {
		self.capacity
	}

	/// Captures the current size and counters.
	#[must_use]
	pub fn stats(&self) -> StatsSnapshot {
		self.stats.snapshot(self.entries.len(), self.capacity)
	}
}
