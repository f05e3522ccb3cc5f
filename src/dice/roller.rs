//! Abstractions for rolling dice using various means.

use std::collections::HashMap;
use core::iter::Peekable;

use fastrand::Rng;

use super::{Dice, Rolled};
use crate::{
	config::Limits,
	error::{DeterministicKind, Error},
};

/// Rolls dice - what else is there to say?
pub trait Roller {
	/// Rolls a single die.
	#[must_use]
	fn roll_die(&mut self, sides: u32) -> u32;

	/// Rolls a full set of dice.
	fn roll<'d>(&mut self, dice: &'d Dice) -> Rolled<'d> {
		let faces = (0..dice.count).map(|_| self.roll_die(dice.sides)).collect::<Vec<_>>();
		Rolled::from_dice_and_faces(dice, faces)
	}
}

impl<R: Roller + ?Sized> Roller for &mut R {
	#[inline]
	fn roll_die(&mut self, sides: u32) -> u32 {
		(**self).roll_die(sides)
	}

	#[inline]
	fn roll<'d>(&mut self, dice: &'d Dice) -> Rolled<'d> {
		(**self).roll(dice)
	}
}

/// Generates rolls with uniformly random values using [fastrand].
///
/// # Examples
///
/// ## Default fastrand roller
/// ```
/// use dicetray::dice::{roller::{FastRand as FastRandRoller, Roller}, Dice};
///
/// let mut roller = FastRandRoller::default();
///
/// let dice = Dice::new(4, 6);
/// let rolled = roller.roll(&dice);
/// assert!(rolled.faces.iter().all(|face| (1..=6).contains(face)));
/// ```
///
/// ## Manually seeded fastrand roller
/// ```
/// use dicetray::dice::{roller::{FastRand as FastRandRoller, Roller}, Dice};
///
/// let dice = Dice::new(4, 6);
/// let first = FastRandRoller::with_seed(0x750c38d574400).roll(&dice);
/// let second = FastRandRoller::with_seed(0x750c38d574400).roll(&dice);
/// assert_eq!(first, second);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FastRand(Rng);

impl FastRand {
	/// Creates a new fastrand roller that uses the given RNG instance to generate rolls.
	#[must_use]
	#[inline]
	pub const fn new(rng: Rng) -> Self {
		Self(rng)
	}

	/// Creates a new fastrand roller that uses a pre-seeded RNG instance to generate rolls.
	#[must_use]
	#[inline]
	pub fn with_seed(seed: u64) -> Self {
		Self(Rng::with_seed(seed))
	}
}

impl Roller for FastRand {
	/// Rolls a single die using the [`fastrand::Rng`] the roller was created with.
	#[inline]
	fn roll_die(&mut self, sides: u32) -> u32 {
		if sides > 0 {
			self.0.u32(1..=sides)
		} else {
			0
		}
	}
}

/// Generates rolls that always have their max value.
///
/// # Examples
/// ```
/// use dicetray::dice::{roller::{Max as MaxRoller, Roller}, Dice};
///
/// let mut roller = MaxRoller;
///
/// let dice = Dice::new(4, 6);
/// let rolled = roller.roll(&dice);
/// assert!(rolled.faces.iter().all(|&face| face == 6));
///
/// let dice = Dice::new(2, 20);
/// let rolled = roller.roll(&dice);
/// assert!(rolled.faces.iter().all(|&face| face == 20));
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Max;

impl Roller for Max {
	/// Rolls a single die, always with the max value (same as the number of sides).
	#[inline]
	fn roll_die(&mut self, sides: u32) -> u32 {
		sides
	}
}

/// Generates rolls from an iterator of values. Mainly useful for testing purposes.
///
/// # Examples
/// ```
/// use dicetray::dice::{roller::{Iter as IterRoller, Roller}, Dice};
///
/// let mut roller = IterRoller::new(vec![1, 2, 3, 4, 10]);
/// let dice = Dice::new(5, 6);
/// assert_eq!(roller.roll(&dice).faces, vec![1, 2, 3, 4, 10]);
/// ```
#[derive(Debug, Clone)]
pub struct Iter<I: Iterator<Item = u32>>(Peekable<I>);

impl<I: Iterator<Item = u32>> Iter<I> {
	/// Checks whether the iterator still has values available.
	#[inline]
	pub fn can_roll(&mut self) -> bool {
		self.0.peek().is_some()
	}

	/// Creates a new roller that uses the given iterator to provide roll values.
	#[must_use]
	#[inline]
	pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
		Self(iter.into_iter().peekable())
	}
}

impl<I: Iterator<Item = u32>> Roller for Iter<I> {
	/// Rolls a die with the value from the next iteration.
	///
	/// # Panics
	/// If the iterator has finished, this will panic.
	#[inline]
	#[expect(
		clippy::expect_used,
		reason = "Mostly for testing, otherwise manual checking of can_roll() is expected"
	)]
	fn roll_die(&mut self, _sides: u32) -> u32 {
		self.0.next().expect("iterator is finished")
	}
}

/// Replays pre-programmed faces for specific dice, falling back to a counter-derived sequence for everything else.
///
/// Faces are looked up by the normalized notation of the dice being rolled (e.g. `3D6`). When a table entry has fewer
/// faces than there are dice, its values are reused cyclically. Dice without an entry roll `(counter % sides) + 1` for
/// every die, and the counter advances once per set of dice rolled.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use dicetray::{config::Limits, dice::{roller::{Replay, Roller}, Dice}};
///
/// let table = HashMap::from([("2d8".to_owned(), vec![5, 7]), ("3D6".to_owned(), vec![3])]);
/// let mut replay = Replay::from_table(table, &Limits::default())?;
///
/// assert_eq!(replay.roll(&Dice::new(3, 6)).faces, vec![3, 3, 3]);
/// assert_eq!(replay.roll(&Dice::new(2, 8)).faces, vec![5, 7]);
///
/// // No entry for 2D4, so the counter (now at 2) decides
/// assert_eq!(replay.roll(&Dice::new(2, 4)).faces, vec![3, 3]);
/// assert_eq!(replay.roll(&Dice::new(2, 4)).faces, vec![4, 4]);
/// # Ok::<(), dicetray::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replay {
	/// Pre-programmed faces keyed by normalized dice notation
	table: HashMap<String, Vec<u32>>,

	/// Number of dice sets rolled so far
	counter: u64,
}

impl Replay {
	/// Creates a replay roller from a table of notation to faces, checking every entry.
	///
	/// Keys are normalized (whitespace removed, upper-cased) so `"3d6"` and `" 3D6"` refer to the same dice.
	///
	/// # Errors
	/// If a key isn't a bare dice term within `limits`, [`DeterministicKind::InvalidNotation`] is returned.
	/// If a key's faces are empty or any face is outside `1..=sides`, [`DeterministicKind::InvalidValues`] is returned.
	pub fn from_table(table: HashMap<String, Vec<u32>>, limits: &Limits) -> Result<Self, Error> {
		let mut normalized = HashMap::with_capacity(table.len());

		for (notation, faces) in table {
			let dice = Dice::parse_with_limits(&notation, limits)
				.map_err(|_err| DeterministicKind::InvalidNotation(notation.clone()))?;
			let key = dice.to_string();

			if faces.is_empty() || faces.iter().any(|face| !(1..=dice.sides).contains(face)) {
				return Err(DeterministicKind::InvalidValues(key).into());
			}

			normalized.insert(key, faces);
		}

		Ok(Self {
			table: normalized,
			counter: 0,
		})
	}

	/// Computes the faces the next roll of the given dice would produce, without advancing the counter.
	#[must_use]
	pub fn peek(&self, dice: &Dice) -> Vec<u32> {
		let count = dice.count as usize;

		match self.table.get(&dice.to_string()) {
			Some(values) => values.iter().copied().cycle().take(count).collect(),
			None => {
				let face = self
					.counter
					.checked_rem(u64::from(dice.sides))
					.and_then(|rem| u32::try_from(rem).ok())
					.map_or(0, |rem| rem.saturating_add(1));
				vec![face; count]
			}
		}
	}

	/// Number of dice sets rolled since this roller was created
	#[must_use]
	#[inline]
	pub const fn counter(&self) -> u64 {
		self.counter
	}

	/// Checks whether the table holds pre-programmed faces for the given notation.
	/// Any spelling that parses to the same dice term matches, regardless of configured limits.
	#[must_use]
	pub fn has_entry(&self, notation: &str) -> bool {
		let unbounded = Limits {
			max_dice_count: u32::MAX,
			max_dice_sides: u32::MAX,
			max_expr_length: usize::MAX,
		};
		Dice::parse_with_limits(notation, &unbounded).is_ok_and(|dice| self.table.contains_key(&dice.to_string()))
	}
}

impl Roller for Replay {
	/// Rolls a single die as a one-die set (`1D<sides>`).
	fn roll_die(&mut self, sides: u32) -> u32 {
		let dice = Dice::new(1, sides);
		self.roll(&dice).faces.first().copied().unwrap_or(0)
	}

	fn roll<'d>(&mut self, dice: &'d Dice) -> Rolled<'d> {
		let faces = self.peek(dice);
		self.counter = self.counter.wrapping_add(1);
		Rolled::from_dice_and_faces(dice, faces)
	}
}
