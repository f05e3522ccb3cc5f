//! Hit/miss accounting for the expression cache.

use core::time::Duration;
use std::time::Instant;

/// Running counters for a cache
#[derive(Debug, Clone)]
pub(crate) struct Stats {
	/// Lookups that found an entry
	hits: u64,

	/// Lookups that found nothing
	misses: u64,

	/// Entries dropped to make room for new ones
	evictions: u64,

	/// When the cache was created (survives resets)
	created_at: Instant,

	/// When the cache was last looked up, if ever
	last_access: Option<Instant>,
}

impl Stats {
	/// Creates zeroed counters, stamping the current time as the creation time.
	#[must_use]
	pub(crate) fn new() -> Self {
		Self {
			hits: 0,
			misses: 0,
			evictions: 0,
			created_at: Instant::now(),
			last_access: None,
		}
	}

	/// Counts a lookup that found an entry.
	pub(crate) fn record_hit(&mut self) {
		self.hits = self.hits.saturating_add(1);
		self.last_access = Some(Instant::now());
	}

	/// Counts a lookup that found nothing.
	pub(crate) fn record_miss(&mut self) {
		self.misses = self.misses.saturating_add(1);
		self.last_access = Some(Instant::now());
	}

	/// Counts an entry dropped to make room.
	pub(crate) fn record_eviction(&mut self) {
		self.evictions = self.evictions.saturating_add(1);
	}

	/// Zeroes every counter, keeping the creation time.
	pub(crate) fn reset(&mut self) {
		self.hits = 0;
		self.misses = 0;
		self.evictions = 0;
		self.last_access = None;
	}

	/// Captures the counters alongside the cache's current size and capacity.
	#[must_use]
	pub(crate) fn snapshot(&self, size: usize, max_size: usize) -> StatsSnapshot {
		let total_lookups = self.hits.saturating_add(self.misses);

		StatsSnapshot {
			size,
			max_size,
			hits: self.hits,
			misses: self.misses,
			evictions: self.evictions,
			hit_rate: hit_rate(self.hits, total_lookups),
			total_lookups,
			uptime: self.created_at.elapsed(),
			last_access: self.last_access,
		}
	}
}

impl Default for Stats {
	fn default() -> Self {
		Self::new()
	}
}

/// Point-in-time view of a cache's contents and counters
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct StatsSnapshot {
	/// Number of entries currently stored
	pub size: usize,

	/// Maximum number of entries the cache holds
	pub max_size: usize,

	/// Lookups that found an entry
	pub hits: u64,

	/// Lookups that found nothing
	pub misses: u64,

	/// Entries dropped to make room for new ones
	pub evictions: u64,

	/// Percentage (0 to 100) of lookups that were hits, or 0 with no lookups
	pub hit_rate: f64,

	/// Total lookups (hits + misses)
	pub total_lookups: u64,

	/// Time since the cache was created
	pub uptime: Duration,

	/// When the cache was last looked up, if ever
	pub last_access: Option<Instant>,
}

/// Calculates the hit percentage.
#[expect(clippy::cast_precision_loss, reason = "Lookup counts never get near 2^52")]
fn hit_rate(hits: u64, total: u64) -> f64 {
	if total == 0 {
		0.0
	} else {
		hits as f64 / total as f64 * 100.0
	}
}
