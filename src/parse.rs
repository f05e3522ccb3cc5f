//! Tokenizing of raw dice expressions.
//!
//! Expressions are normalized (all whitespace removed, letters upper-cased) and then scanned into [`Token`]s by a
//! [chumsky] lexer. Dice parameters and number literals are checked against the configured [`Limits`] as they're
//! converted into tokens, so every token that comes out of [`tokenize()`] is within bounds.

use core::fmt;

use chumsky::prelude::*;

use crate::{
	config::Limits,
	dice::Dice,
	error::{Error, Limit, RollKind},
};

/// Arithmetic operators usable between terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "The grammar only has these four")]
pub enum Operator {
	/// `+`
	Add,

	/// `-`
	Sub,

	/// `*`
	Mul,

	/// `/` (rounded toward negative infinity)
	Div,
}

impl Operator {
	/// Symbol used for the operator in expressions
	#[must_use]
	pub const fn symbol(self) -> char {
		match self {
			Self::Add => '+',
			Self::Sub => '-',
			Self::Mul => '*',
			Self::Div => '/',
		}
	}

	/// Checks whether the operator binds tighter than addition and subtraction.
	#[must_use]
	pub const fn is_multiplicative(self) -> bool {
		matches!(self, Self::Mul | Self::Div)
	}
}

impl fmt::Display for Operator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.symbol())
	}
}

/// Individual lexical element of a dice expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "The grammar only has these five")]
pub enum Token {
	/// Dice term, such as `3D6`
	Dice(Dice),

	/// Non-negative number literal
	Number(i64),

	/// Arithmetic operator
	Operator(Operator),

	/// `(`
	LeftParen,

	/// `)`
	RightParen,
}

impl Token {
	/// Checks whether the token is a value on its own (a dice term or number).
	#[must_use]
	pub const fn is_value(&self) -> bool {
		matches!(self, Self::Dice(..) | Self::Number(..))
	}

	/// Checks whether the token is an operator.
	#[must_use]
	pub const fn is_operator(&self) -> bool {
		matches!(self, Self::Operator(..))
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Dice(dice) => write!(f, "{dice}"),
			Self::Number(val) => write!(f, "{val}"),
			Self::Operator(op) => write!(f, "{op}"),
			Self::LeftParen => f.write_str("("),
			Self::RightParen => f.write_str(")"),
		}
	}
}

/// Raw lexer output, before any bounds are applied
#[derive(Debug, Clone, PartialEq, Eq)]
enum Lexeme {
	/// Digits for the count and sides of a dice term
	Dice(String, String),

	/// Digits of a number literal
	Number(String),

	/// Operator symbol
	Operator(Operator),

	/// `(`
	LeftParen,

	/// `)`
	RightParen,

	/// Any character that doesn't start one of the above
	Unknown(char),
}

/// Strips all whitespace from an expression and upper-cases it.
///
/// Two expressions that normalize to the same string are the same expression.
///
/// # Examples
/// ```
/// assert_eq!(dicetray::parse::normalize(" (2d6 + 6) *5 "), "(2D6+6)*5");
/// ```
#[must_use]
pub fn normalize(expression: &str) -> String {
	expression
		.chars()
		.filter(|c| !c.is_whitespace())
		.flat_map(char::to_uppercase)
		.collect()
}

/// Generates a lexer that splits a normalized expression into lexemes and their spans.
/// It never fails: anything unrecognized comes out as [`Lexeme::Unknown`].
fn lexer<'src>() -> impl Parser<'src, &'src str, Vec<(Lexeme, SimpleSpan)>, extra::Err<Rich<'src, char>>> + Clone {
	let digits = text::digits(10).collect::<String>();

	// Dice must be tried before plain numbers, since both start with digits
	let dice = digits
		.clone()
		.then_ignore(just('D'))
		.then(digits.clone())
		.map(|(count, sides)| Lexeme::Dice(count, sides));
	let number = digits.map(Lexeme::Number);

	let symbol = choice((
		just('+').to(Lexeme::Operator(Operator::Add)),
		just('-').to(Lexeme::Operator(Operator::Sub)),
		just('*').to(Lexeme::Operator(Operator::Mul)),
		just('/').to(Lexeme::Operator(Operator::Div)),
		just('(').to(Lexeme::LeftParen),
		just(')').to(Lexeme::RightParen),
	));

	choice((dice, number, symbol, any().map(Lexeme::Unknown)))
		.map_with(|lexeme, e| (lexeme, e.span()))
		.repeated()
		.collect::<Vec<_>>()
		.then_ignore(end())
}

/// Converts an expression into tokens, checking character-level syntax and size limits.
///
/// # Errors
/// - [`Error::LimitExceeded`] if the expression is longer than [`Limits::max_expr_length`] characters, or a number
///   literal doesn't fit in an `i64`
/// - [`Error::Tokenization`] if the expression is empty or contains anything other than dice terms, numbers,
///   operators, and parentheses
/// - [`Error::Roll`] with [`RollKind::InvalidDiceCount`] or [`RollKind::InvalidDiceSides`] if a dice term is outside
///   the configured bounds
///
/// # Examples
/// ```
/// use dicetray::{config::Limits, parse::{tokenize, Operator, Token}, Dice};
///
/// let tokens = tokenize("1d20 + 5", &Limits::default())?;
/// assert_eq!(
/// 	tokens,
/// 	vec![Token::Dice(Dice::new(1, 20)), Token::Operator(Operator::Add), Token::Number(5)]
/// );
/// # Ok::<(), dicetray::Error>(())
/// ```
pub fn tokenize(expression: &str, limits: &Limits) -> Result<Vec<Token>, Error> {
	if expression.chars().count() > limits.max_expr_length {
		return Err(Error::LimitExceeded {
			limit: Limit::ExpressionLength,
			max_allowed: u64::try_from(limits.max_expr_length).unwrap_or(u64::MAX),
		});
	}

	let normalized = normalize(expression);
	if normalized.is_empty() {
		return Err(Error::Tokenization {
			position: 0,
			text: String::new(),
		});
	}

	let lexemes = lexer().parse(normalized.as_str()).into_result().map_err(|errs| {
		let offset = errs.first().map_or(0, |err| err.span().start);
		Error::Tokenization {
			position: char_position(&normalized, offset),
			text: normalized
				.get(offset..)
				.and_then(|rest| rest.chars().next())
				.map(String::from)
				.unwrap_or_default(),
		}
	})?;

	lexemes
		.into_iter()
		.map(|(lexeme, span)| match lexeme {
			Lexeme::Dice(count, sides) => dice_token(&count, &sides, limits),
			Lexeme::Number(digits) => digits.parse().map(Token::Number).map_err(|_err| Error::LimitExceeded {
				limit: Limit::NumberValue,
				max_allowed: i64::MAX.unsigned_abs(),
			}),
			Lexeme::Operator(op) => Ok(Token::Operator(op)),
			Lexeme::LeftParen => Ok(Token::LeftParen),
			Lexeme::RightParen => Ok(Token::RightParen),
			Lexeme::Unknown(found) => Err(Error::Tokenization {
				position: char_position(&normalized, span.start),
				text: found.to_string(),
			}),
		})
		.collect()
}

/// Builds a dice token from its digits, checking both against the limits.
fn dice_token(count: &str, sides: &str, limits: &Limits) -> Result<Token, Error> {
	// Digit runs too long for a u64 are certainly over any limit
	let count = count.parse::<u64>().unwrap_or(u64::MAX);
	let sides = sides.parse::<u64>().unwrap_or(u64::MAX);

	let count = u32::try_from(count)
		.ok()
		.filter(|count| (1..=limits.max_dice_count).contains(count))
		.ok_or(RollKind::InvalidDiceCount {
			count,
			max: limits.max_dice_count,
		})?;
	let sides = u32::try_from(sides)
		.ok()
		.filter(|sides| (1..=limits.max_dice_sides).contains(sides))
		.ok_or(RollKind::InvalidDiceSides {
			sides,
			max: limits.max_dice_sides,
		})?;

	Ok(Token::Dice(Dice::new(count, sides)))
}

/// Converts a byte offset into the normalized expression into a character offset.
fn char_position(normalized: &str, offset: usize) -> usize {
	normalized.get(..offset).map_or(offset, |head| head.chars().count())
}
