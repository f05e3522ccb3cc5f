//! All functionality for directly creating dice, rolling them, and working with their resulting rolls.
//!
//! This is the home of the dice "primitives". For using as part of a larger expression, see [`Expr::Dice`].
//!
//! [`Expr::Dice`]: crate::expr::Expr::Dice

pub mod roller;

use std::borrow::Cow;
use core::{fmt, str::FromStr};

pub use self::roller::Roller;
use crate::{
	config::Limits,
	error::{Error, RollKind},
	expr::Describe,
	parse::{self, Token},
};

/// A set of one or more rollable dice with a specific number of sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Dice {
	/// Number of dice to roll
	pub count: u32,

	/// Number of sides for each die
	pub sides: u32,
}

impl Dice {
	/// Creates a new set of dice with a given count and number of sides.
	#[must_use]
	pub const fn new(count: u32, sides: u32) -> Self {
		Self { count, sides }
	}

	/// Parses a single bare dice term (such as `3d6`) using the given limits.
	///
	/// # Errors
	/// If the notation can't be tokenized or exceeds the limits, the corresponding error is returned. If it tokenizes
	/// to anything other than exactly one dice term, [`Error::Format`] is returned.
	///
	/// # Examples
	/// ```
	/// use dicetray::{config::Limits, Dice, Error};
	///
	/// assert_eq!(Dice::parse_with_limits(" 4d8 ", &Limits::default())?, Dice::new(4, 8));
	/// assert!(matches!(Dice::parse_with_limits("4d8+1", &Limits::default()), Err(Error::Format(..))));
	/// # Ok::<(), dicetray::Error>(())
	/// ```
	pub fn parse_with_limits(notation: &str, limits: &Limits) -> Result<Self, Error> {
		match parse::tokenize(notation, limits)?.as_slice() {
			[Token::Dice(dice)] => Ok(*dice),
			_ => Err(Error::Format(notation.to_owned())),
		}
	}

	/// Smallest possible total from rolling the dice
	#[must_use]
	#[inline]
	pub fn min_total(&self) -> u64 {
		u64::from(self.count)
	}

	/// Largest possible total from rolling the dice
	#[must_use]
	#[inline]
	pub fn max_total(&self) -> u64 {
		u64::from(self.count).saturating_mul(u64::from(self.sides))
	}
}

impl fmt::Display for Dice {
	/// Formats the dice in normalized notation, such as `3D6`.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}D{}", self.count, self.sides)
	}
}

impl FromStr for Dice {
	type Err = Error;

	/// Parses a single bare dice term using the default [`Limits`].
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse_with_limits(s, &Limits::default())
	}
}

/// Representation of the result from rolling [`Dice`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Rolled<'a> {
	/// Face value of each individual die, in roll order
	pub faces: Vec<u32>,

	/// Dice that were rolled to produce this
	pub dice: Cow<'a, Dice>,
}

impl Rolled<'_> {
	/// Calculates the total of all face values.
	///
	/// # Errors
	/// If the sum doesn't fit in a `u64`, [`RollKind::Overflow`] is returned.
	///
	/// # Examples
	/// ```
	/// use dicetray::dice::{roller::{FastRand as FastRandRoller, Roller}, Dice};
	///
	/// let dice = Dice::new(4, 8);
	/// let rolled = FastRandRoller::default().roll(&dice);
	/// let total = rolled.total()?;
	/// assert_eq!(total, rolled.faces.iter().map(|&face| u64::from(face)).sum());
	/// # Ok::<(), dicetray::Error>(())
	/// ```
	pub fn total(&self) -> Result<u64, Error> {
		self.faces.iter().try_fold(0_u64, |sum, &face| {
			sum.checked_add(u64::from(face)).ok_or(Error::Roll(RollKind::Overflow))
		})
	}

	/// Moves all of self's owned data into a new instance and clones any unowned data in order to create a `'static`
	/// instance of self.
	#[must_use]
	pub fn into_owned(self) -> Rolled<'static> {
		Rolled {
			faces: self.faces,
			dice: Cow::Owned(self.dice.into_owned()),
		}
	}

	/// Creates a new rolled set of dice from a given set of dice and an iterator of face values.
	#[must_use]
	pub fn from_dice_and_faces(dice: &Dice, faces: impl IntoIterator<Item = u32>) -> Rolled<'_> {
		Rolled {
			faces: faces.into_iter().collect(),
			dice: Cow::Borrowed(dice),
		}
	}
}

impl Describe for Rolled<'_> {
	/// Builds a string of the dice the roll is from and a list of all of the individual faces.
	///
	/// If `list_limit` is specified and there are more faces than it, the list is truncated and appended with
	/// "X more..." (where X is the remaining face count past the max).
	///
	/// # Examples
	/// ```
	/// use dicetray::{dice::{Dice, Rolled}, expr::Describe};
	///
	/// let dice = Dice::new(4, 6);
	/// let rolled = Rolled::from_dice_and_faces(&dice, [6, 2, 5, 3]);
	///
	/// assert_eq!(rolled.describe(None), "4D6[6, 2, 5, 3]");
	/// assert_eq!(rolled.describe(Some(2)), "4D6[6, 2, 2 more...]");
	/// ```
	fn describe(&self, list_limit: Option<usize>) -> String {
		let list_limit = list_limit.unwrap_or(usize::MAX);
		let truncated = self.faces.len().saturating_sub(list_limit);

		format!(
			"{}[{}{}]",
			self.dice,
			self.faces
				.iter()
				.take(list_limit)
				.map(ToString::to_string)
				.collect::<Vec<_>>()
				.join(", "),
			if truncated > 0 {
				format!(", {truncated} more...")
			} else {
				String::new()
			}
		)
	}
}

impl fmt::Display for Rolled<'_> {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output is equivalent to calling [`Self::describe(None)`].
	///
	/// [`Self::describe(None)`]: Self::describe()
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.describe(None))
	}
}
