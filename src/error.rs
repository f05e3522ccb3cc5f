//! Error types for every stage of rolling an expression.
//!
//! All failures surface as a single [`Error`], with one variant per category. Categories that have more than one way
//! to fail carry a kind enum describing exactly what went wrong.

use core::fmt;

/// An error resulting from tokenizing, validating, or evaluating a dice expression
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
	/// The expression contains something that isn't a dice term, number, operator, or parenthesis.
	///
	/// `position` is the character offset into the normalized expression (whitespace removed, upper-cased).
	/// Empty input is reported at position 0 with empty `text`.
	///
	/// # Examples
	/// ```
	/// use dicetray::{Engine, Error, RollOptions};
	///
	/// let engine = Engine::default();
	/// let err = engine.roll("3D6 + x", RollOptions::default()).unwrap_err();
	/// assert_eq!(err, Error::Tokenization { position: 4, text: "X".to_owned() });
	/// ```
	#[error("unable to tokenize {text:?} at position {position}")]
	Tokenization {
		/// Character offset of the offending text
		position: usize,

		/// Offending text
		text: String,
	},

	/// The tokens don't form a well-structured expression.
	#[error("invalid expression: {0}")]
	Validation(#[from] ValidationKind),

	/// The dice can't be rolled as specified, or the arithmetic on the results failed.
	#[error("roll error: {0}")]
	Roll(#[from] RollKind),

	/// The input exceeded one of the configured size bounds.
	#[error("{limit} exceeds the maximum of {max_allowed}")]
	LimitExceeded {
		/// Bound that was exceeded
		limit: Limit,

		/// Largest permitted value for the bound
		max_allowed: u64,
	},

	/// Deterministic mode was misconfigured or used while disabled.
	#[error("deterministic mode error: {0}")]
	Deterministic(#[from] DeterministicKind),

	/// A detailed roll was requested for something other than a single dice term.
	#[error("{0:?} is not a single dice term (e.g. 3D6)")]
	Format(String),
}

/// Structural problems found in a token sequence
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ValidationKind {
	/// There were no tokens at all.
	#[error("empty expression")]
	EmptyTokens,

	/// A closing parenthesis has no opening partner, or an opening one is never closed.
	#[error("unbalanced parentheses")]
	UnbalancedParentheses,

	/// A pair of parentheses encloses nothing.
	#[error("empty parentheses")]
	EmptyParentheses,

	/// Two operators, or two values, are adjacent.
	#[error("invalid token sequence")]
	InvalidTokenSequence,

	/// An operator has no right-hand operand.
	#[error("missing operand")]
	MissingOperand,

	/// An operator has no left-hand operand.
	#[error("invalid operator placement")]
	InvalidOperatorPlacement,
}

/// Problems with dice parameters or with the arithmetic performed on rolls
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RollKind {
	/// The number of dice is zero or above the configured maximum.
	#[error("dice count {count} is outside 1..={max}")]
	InvalidDiceCount {
		/// Requested number of dice
		count: u64,

		/// Configured maximum number of dice
		max: u32,
	},

	/// The number of sides is zero or above the configured maximum.
	#[error("dice sides {sides} is outside 1..={max}")]
	InvalidDiceSides {
		/// Requested number of sides
		sides: u64,

		/// Configured maximum number of sides
		max: u32,
	},

	/// The right-hand side of a division evaluated to zero.
	///
	/// # Examples
	/// ```
	/// use dicetray::{error::RollKind, Engine, Error, RollOptions};
	///
	/// let engine = Engine::default();
	/// let err = engine.roll("5/0", RollOptions::default()).unwrap_err();
	/// assert_eq!(err, Error::Roll(RollKind::DivisionByZero));
	/// ```
	#[error("division by zero")]
	DivisionByZero,

	/// An intermediate or final value doesn't fit in an `i64`.
	#[error("integer overflow")]
	Overflow,
}

/// Misuse of deterministic mode
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DeterministicKind {
	/// A table key isn't plain dice notation within the configured limits.
	#[error("{0:?} is not valid dice notation")]
	InvalidNotation(String),

	/// The faces for a table key are empty or outside `1..=sides`.
	#[error("faces for {0} must be non-empty and within 1..=sides")]
	InvalidValues(String),

	/// A deterministic roll was requested while the mode is disabled.
	#[error("deterministic mode is not enabled")]
	ModeNotEnabled,
}

/// Configured size bounds that input can exceed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Limit {
	/// Length of the raw expression, in characters
	ExpressionLength,

	/// Value of a number literal
	NumberValue,
}

impl fmt::Display for Limit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::ExpressionLength => "expression length",
			Self::NumberValue => "number literal",
		})
	}
}
