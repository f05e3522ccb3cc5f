//! Engine configuration: input limits and cache sizing.

use std::env;
use core::str::FromStr;

/// Default maximum number of dice in a single dice term
pub const DEFAULT_MAX_DICE_COUNT: u32 = 100;

/// Default maximum number of sides per die
pub const DEFAULT_MAX_DICE_SIDES: u32 = 1000;

/// Default maximum expression length, in characters
pub const DEFAULT_MAX_EXPR_LENGTH: usize = 200;

/// Default number of expressions the result cache holds
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Size bounds enforced while tokenizing expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[expect(clippy::exhaustive_structs, reason = "Plain configuration values")]
pub struct Limits {
	/// Maximum number of dice in a single dice term
	pub max_dice_count: u32,

	/// Maximum number of sides per die
	pub max_dice_sides: u32,

	/// Maximum length of a raw expression, in characters
	pub max_expr_length: usize,
}

impl Default for Limits {
	fn default() -> Self {
		Self {
			max_dice_count: DEFAULT_MAX_DICE_COUNT,
			max_dice_sides: DEFAULT_MAX_DICE_SIDES,
			max_expr_length: DEFAULT_MAX_EXPR_LENGTH,
		}
	}
}

/// Construction-time configuration for an [`Engine`](crate::Engine)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[expect(clippy::exhaustive_structs, reason = "Plain configuration values")]
pub struct Config {
	/// Bounds applied to every expression
	pub limits: Limits,

	/// Number of expression results the cache holds before evicting
	pub cache_capacity: usize,
}

impl Config {
	/// Loads configuration from environment variables, using the default for any that are absent or unparsable.
	///
	/// # Environment Variables
	/// - `DICETRAY_MAX_DICE_COUNT` - Maximum dice per term (default: 100)
	/// - `DICETRAY_MAX_DICE_SIDES` - Maximum sides per die (default: 1000)
	/// - `DICETRAY_MAX_EXPR_LENGTH` - Maximum expression length (default: 200)
	/// - `DICETRAY_CACHE_CAPACITY` - Result cache capacity (default: 128)
	#[must_use]
	pub fn from_env() -> Self {
		Self {
			limits: Limits {
				max_dice_count: env_or("DICETRAY_MAX_DICE_COUNT", DEFAULT_MAX_DICE_COUNT),
				max_dice_sides: env_or("DICETRAY_MAX_DICE_SIDES", DEFAULT_MAX_DICE_SIDES),
				max_expr_length: env_or("DICETRAY_MAX_EXPR_LENGTH", DEFAULT_MAX_EXPR_LENGTH),
			},
			cache_capacity: env_or("DICETRAY_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY),
		}
	}

	/// Replaces the cache capacity.
	#[must_use]
	pub const fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
		self.cache_capacity = cache_capacity;
		self
	}

	/// Replaces the input limits.
	#[must_use]
	pub const fn with_limits(mut self, limits: Limits) -> Self {
		self.limits = limits;
		self
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			limits: Limits::default(),
			cache_capacity: DEFAULT_CACHE_CAPACITY,
		}
	}
}

/// Reads and parses an environment variable, falling back to a default.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
	env::var(name).ok().and_then(|val| val.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = Config::default();
		assert_eq!(config.limits.max_dice_count, 100);
		assert_eq!(config.limits.max_dice_sides, 1000);
		assert_eq!(config.limits.max_expr_length, 200);
		assert_eq!(config.cache_capacity, 128);
	}

	#[test]
	fn from_env_overrides_and_falls_back() {
		env::set_var("DICETRAY_CACHE_CAPACITY", "7");
		env::set_var("DICETRAY_MAX_DICE_SIDES", "lots");
		let config = Config::from_env();
		env::remove_var("DICETRAY_CACHE_CAPACITY");
		env::remove_var("DICETRAY_MAX_DICE_SIDES");

		assert_eq!(config.cache_capacity, 7);
		assert_eq!(config.limits.max_dice_sides, DEFAULT_MAX_DICE_SIDES);
		assert_eq!(config.limits.max_dice_count, DEFAULT_MAX_DICE_COUNT);
	}

	#[test]
	fn builders_replace_fields() {
		let limits = Limits {
			max_dice_count: 5,
			..Limits::default()
		};
		let config = Config::default().with_cache_capacity(3).with_limits(limits);
		assert_eq!(config.cache_capacity, 3);
		assert_eq!(config.limits.max_dice_count, 5);
	}
}
