//! The public entry point: an engine that owns configuration, a result cache, a deterministic replay table, and an
//! RNG, and rolls expressions against them.

use std::{
	collections::HashMap,
	sync::{LazyLock, Mutex, MutexGuard, PoisonError},
};

use crate::{
	cache::{Cache, StatsSnapshot},
	config::Config,
	dice::{
		roller::{FastRand, Replay},
		Dice, Roller,
	},
	error::{DeterministicKind, Error, RollKind},
	expr::{Evaled, Expr},
	parse::{self, Operator, Token},
	validate::validate,
};

/// Per-call options for [`Engine::roll()`] and [`Engine::roll_detailed()`]
///
/// With the defaults, results are served from and stored in the engine's cache. That means repeating a random
/// expression returns the *first* result it produced until the entry is evicted or the cache is cleared. Use
/// [`Self::use_cache(false)`](Self::use_cache()) to get a fresh roll every time.
///
/// # Examples
/// ```
/// use dicetray::RollOptions;
///
/// let options = RollOptions::default().use_cache(false).seed(Some(42));
/// assert!(!options.caches());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollOptions {
	/// Whether the result cache may be consulted
	use_cache: bool,

	/// Whether dice come from the replay table
	deterministic: bool,

	/// Seed for a one-off generator
	seed: Option<u64>,
}

impl RollOptions {
	/// Sets whether the result cache may be consulted.
	#[must_use]
	pub const fn use_cache(mut self, use_cache: bool) -> Self {
		self.use_cache = use_cache;
		self
	}

	/// Sets whether dice are rolled from the engine's replay table. Requires deterministic mode to be enabled.
	#[must_use]
	pub const fn deterministic(mut self, deterministic: bool) -> Self {
		self.deterministic = deterministic;
		self
	}

	/// Sets a seed to roll with. A seeded roll uses its own generator, leaving the engine's untouched.
	#[must_use]
	pub const fn seed(mut self, seed: Option<u64>) -> Self {
		self.seed = seed;
		self
	}

	/// Checks whether a roll with these options goes through the cache.
	/// Only plain random rolls do; deterministic and seeded rolls always bypass it.
	#[must_use]
	pub const fn caches(&self) -> bool {
		self.use_cache && !self.deterministic && self.seed.is_none()
	}
}

impl Default for RollOptions {
	fn default() -> Self {
		Self {
			use_cache: true,
			deterministic: false,
			seed: None,
		}
	}
}

/// Result of rolling a single dice term
#[derive(Debug, Clone, PartialEq, Eq)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct RollDetails {
	/// Sum of all faces
	pub total: i64,

	/// Each individual face, in roll order
	pub faces: Vec<u32>,
}

/// Breakdown of the tokens in an expression by category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[expect(clippy::exhaustive_structs, reason = "The grammar only has these categories")]
pub struct Components {
	/// Dice terms, in order of appearance
	pub dice: Vec<Dice>,

	/// Number literals, in order of appearance
	pub numbers: Vec<i64>,

	/// Operators, in order of appearance
	pub operators: Vec<Operator>,

	/// Parentheses, in order of appearance
	pub parentheses: Vec<char>,
}

/// Dice expression engine
///
/// Every method takes `&self`; the cache, replay table, and RNG are each behind their own lock, so an engine can be
/// shared between threads.
///
/// # Examples
/// ```
/// use dicetray::{Engine, RollOptions};
///
/// let engine = Engine::default();
/// let total = engine.roll("(2d6 + 6) * 5", RollOptions::default())?;
/// assert!((40..=90).contains(&total));
///
/// // The same expression is served from the cache
/// assert_eq!(engine.roll("(2D6+6)*5", RollOptions::default())?, total);
/// assert_eq!(engine.cache_stats().hits, 1);
/// # Ok::<(), dicetray::Error>(())
/// ```
#[derive(Debug)]
pub struct Engine {
	/// Limits and cache sizing
	config: Config,

	/// Memoized results of plain random rolls
	cache: Mutex<Cache>,

	/// Replay table, present only while deterministic mode is enabled
	replay: Mutex<Option<Replay>>,

	/// Generator for plain random rolls
	rng: Mutex<FastRand>,
}

impl Engine {
	/// Creates an engine with the given configuration and an entropy-seeded RNG.
	#[must_use]
	pub fn new(config: Config) -> Self {
		Self::with_roller(config, FastRand::default())
	}

	/// Creates an engine whose own RNG is seeded, making its sequence of random rolls reproducible.
	#[must_use]
	pub fn with_seed(config: Config, seed: u64) -> Self {
		Self::with_roller(config, FastRand::with_seed(seed))
	}

	/// Creates an engine around an existing roller.
	fn with_roller(config: Config, rng: FastRand) -> Self {
		Self {
			config,
			cache: Mutex::new(Cache::new(config.cache_capacity)),
			replay: Mutex::new(None),
			rng: Mutex::new(rng),
		}
	}

	/// Configuration the engine was created with
	#[must_use]
	#[inline]
	pub const fn config(&self) -> &Config {
		&self.config
	}

	/// Rolls a full expression and returns its total.
	///
	/// # Errors
	/// Any tokenizing, validation, or evaluation error is returned. If `options` asks for a deterministic roll while
	/// deterministic mode is disabled, [`DeterministicKind::ModeNotEnabled`] is returned.
	///
	/// # Examples
	/// ```
	/// use dicetray::{Engine, Error, RollOptions, error::ValidationKind};
	///
	/// let engine = Engine::default();
	/// assert_eq!(engine.roll("2+3*4", RollOptions::default())?, 14);
	/// assert_eq!(engine.roll("7/2", RollOptions::default())?, 3);
	/// assert_eq!(
	/// 	engine.roll("(3D6", RollOptions::default()),
	/// 	Err(Error::Validation(ValidationKind::UnbalancedParentheses))
	/// );
	/// # Ok::<(), dicetray::Error>(())
	/// ```
	pub fn roll(&self, expression: &str, options: RollOptions) -> Result<i64, Error> {
		let expr = self.build(expression)?;

		if !options.caches() {
			let total = self.eval(&expr, options)?.calc()?;
			tracing::trace!(expression, total, ?options, "rolled expression");
			return Ok(total);
		}

		// Held through evaluation so concurrent misses on one key can't store different results
		let key = parse::normalize(expression);
		let mut cache = lock(&self.cache);
		if let Some(total) = cache.get(&key) {
			return Ok(total);
		}

		let total = self.eval(&expr, options)?.calc()?;
		cache.put(&key, total);
		tracing::trace!(expression, total, "rolled expression");
		Ok(total)
	}

	/// Rolls a full expression, returning the rolled tree with every face it produced. Never cached.
	///
	/// # Errors
	/// The same errors as [`Self::roll()`] are returned, including evaluation errors such as division by zero.
	///
	/// # Examples
	/// ```
	/// use dicetray::{expr::Describe, Engine, RollOptions};
	///
	/// let engine = Engine::default();
	/// let evaled = engine.roll_detailed("3d6 + 2", RollOptions::default())?;
	/// let faces = evaled.faces();
	/// assert_eq!(faces.len(), 3);
	/// assert!(evaled.describe(None).starts_with("3D6["));
	/// # Ok::<(), dicetray::Error>(())
	/// ```
	pub fn roll_detailed(&self, expression: &str, options: RollOptions) -> Result<Evaled<'static>, Error> {
		let expr = self.build(expression)?;
		let evaled = self.eval(&expr, options)?.into_owned();
		let total = evaled.calc()?;
		tracing::trace!(expression, total, "rolled detailed expression");
		Ok(evaled)
	}

	/// Rolls a single dice term, returning its total and individual faces.
	///
	/// Faces come from the replay table while deterministic mode is enabled and from the engine's RNG otherwise.
	/// Never cached.
	///
	/// # Errors
	/// If the expression is anything other than one bare dice term, [`Error::Format`] is returned. Tokenizing errors
	/// are returned as-is.
	///
	/// # Examples
	/// ```
	/// use dicetray::Engine;
	///
	/// let details = Engine::default().roll_with_details("3d6")?;
	/// assert_eq!(details.faces.len(), 3);
	/// assert!(details.faces.iter().all(|face| (1..=6).contains(face)));
	/// assert_eq!(details.total, details.faces.iter().map(|&face| i64::from(face)).sum());
	/// # Ok::<(), dicetray::Error>(())
	/// ```
	pub fn roll_with_details(&self, expression: &str) -> Result<RollDetails, Error> {
		let dice = Dice::parse_with_limits(expression, &self.config.limits)?;

		let rolled = {
			let mut replay = lock(&self.replay);
			match replay.as_mut() {
				Some(replay) => replay.roll(&dice),
				None => lock(&self.rng).roll(&dice),
			}
		};

		let total = i64::try_from(rolled.total()?).map_err(|_err| RollKind::Overflow)?;
		tracing::trace!(dice = %dice, total, faces = ?rolled.faces, "rolled dice term");
		Ok(RollDetails {
			total,
			faces: rolled.faces,
		})
	}

	/// Enables or disables deterministic mode. Enabling installs a new replay table (empty when `table` is `None`);
	/// either way the fallback counter starts over.
	///
	/// # Errors
	/// If a table key isn't a single dice term within the configured limits,
	/// [`DeterministicKind::InvalidNotation`] is returned. If a key's faces are empty or out of range for its dice,
	/// [`DeterministicKind::InvalidValues`] is returned. The previous mode is kept on error.
	///
	/// # Examples
	/// ```
	/// use std::collections::HashMap;
	/// use dicetray::{Engine, RollOptions};
	///
	/// let engine = Engine::default();
	/// engine.set_deterministic_mode(true, Some(HashMap::from([("3D6".to_owned(), vec![3, 3, 3])])))?;
	///
	/// let options = RollOptions::default().deterministic(true);
	/// assert_eq!(engine.roll("3D6", options)?, 9);
	/// assert_eq!(engine.roll("3d6 + 1", options)?, 10);
	/// # Ok::<(), dicetray::Error>(())
	/// ```
	pub fn set_deterministic_mode(&self, enabled: bool, table: Option<HashMap<String, Vec<u32>>>) -> Result<(), Error> {
		let replay = enabled
			.then(|| Replay::from_table(table.unwrap_or_default(), &self.config.limits))
			.transpose()?;

		*lock(&self.replay) = replay;
		tracing::debug!(enabled, "deterministic mode changed");
		Ok(())
	}

	/// Gets the faces the next deterministic roll of a dice term would produce, without rolling it.
	///
	/// # Errors
	/// If deterministic mode is disabled, [`DeterministicKind::ModeNotEnabled`] is returned. If the notation isn't a
	/// single dice term, the same errors as [`Self::roll_with_details()`] are returned.
	pub fn deterministic_faces(&self, notation: &str) -> Result<Vec<u32>, Error> {
		let dice = Dice::parse_with_limits(notation, &self.config.limits)?;
		lock(&self.replay)
			.as_ref()
			.map(|replay| replay.peek(&dice))
			.ok_or_else(|| DeterministicKind::ModeNotEnabled.into())
	}

	/// Checks whether deterministic mode is enabled.
	#[must_use]
	pub fn is_deterministic(&self) -> bool {
		lock(&self.replay).is_some()
	}

	/// Captures the cache's current size and counters.
	#[must_use]
	pub fn cache_stats(&self) -> StatsSnapshot {
		lock(&self.cache).stats()
	}

	/// Empties the cache and zeroes its counters, returning the stats from just before clearing.
	pub fn clear_cache(&self) -> StatsSnapshot {
		let mut cache = lock(&self.cache);
		let snapshot = cache.stats();
		cache.clear();
		tracing::debug!(cleared = snapshot.size, "cache cleared");
		snapshot
	}

	/// Checks whether an expression tokenizes and validates, without rolling anything.
	///
	/// # Examples
	/// ```
	/// let engine = dicetray::Engine::default();
	/// assert!(engine.is_valid("(2d6+6)*5"));
	/// assert!(!engine.is_valid("2d6+"));
	/// assert!(!engine.is_valid("1d10000"));
	/// ```
	#[must_use]
	pub fn is_valid(&self, expression: &str) -> bool {
		parse::tokenize(expression, &self.config.limits)
			.and_then(|tokens| validate(&tokens).map_err(Error::from))
			.is_ok()
	}

	/// Splits an expression's tokens into categories. The token sequence itself isn't validated.
	///
	/// # Errors
	/// Any tokenizing error is returned.
	///
	/// # Examples
	/// ```
	/// use dicetray::{parse::Operator, Dice, Engine};
	///
	/// let components = Engine::default().components("(2d6 + 6) * 5")?;
	/// assert_eq!(components.dice, vec![Dice::new(2, 6)]);
	/// assert_eq!(components.numbers, vec![6, 5]);
	/// assert_eq!(components.operators, vec![Operator::Add, Operator::Mul]);
	/// assert_eq!(components.parentheses, vec!['(', ')']);
	/// # Ok::<(), dicetray::Error>(())
	/// ```
	pub fn components(&self, expression: &str) -> Result<Components, Error> {
		let tokens = parse::tokenize(expression, &self.config.limits)?;

		Ok(tokens.into_iter().fold(Components::default(), |mut components, token| {
			match token {
				Token::Dice(dice) => components.dice.push(dice),
				Token::Number(val) => components.numbers.push(val),
				Token::Operator(op) => components.operators.push(op),
				Token::LeftParen => components.parentheses.push('('),
				Token::RightParen => components.parentheses.push(')'),
			}
			components
		}))
	}

	/// Tokenizes, validates, and builds an expression tree using the engine's limits.
	fn build(&self, expression: &str) -> Result<Expr, Error> {
		let tokens = parse::tokenize(expression, &self.config.limits)?;
		validate(&tokens)?;
		Expr::from_tokens(&tokens)
	}

	/// Rolls an expression tree with the roller the options call for.
	fn eval<'e>(&self, expr: &'e Expr, options: RollOptions) -> Result<Evaled<'e>, Error> {
		if options.deterministic {
			let mut replay = lock(&self.replay);
			let replay = replay.as_mut().ok_or(DeterministicKind::ModeNotEnabled)?;
			Ok(expr.eval(replay))
		} else if let Some(seed) = options.seed {
			Ok(expr.eval(&mut FastRand::with_seed(seed)))
		} else {
			Ok(expr.eval(&mut *lock(&self.rng)))
		}
	}
}

impl Default for Engine {
	fn default() -> Self {
		Self::new(Config::default())
	}
}

/// Process-wide engine, configured from the environment on first use
static GLOBAL: LazyLock<Engine> = LazyLock::new(|| Engine::new(Config::from_env()));

/// Gets the process-wide engine, creating it from [`Config::from_env()`] on first use.
///
/// # Examples
/// ```
/// let total = dicetray::global().roll("1d20", dicetray::RollOptions::default().use_cache(false))?;
/// assert!((1..=20).contains(&total));
/// # Ok::<(), dicetray::Error>(())
/// ```
#[must_use]
pub fn global() -> &'static Engine {
	&GLOBAL
}

/// Locks a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
