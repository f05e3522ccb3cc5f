//! AST-like data structures for evaluating full mathematical dice expressions and working with their results.

use core::{fmt, str::FromStr};

use crate::{
	config::Limits,
	dice::{Dice, Roller, Rolled},
	error::{Error, RollKind, ValidationKind},
	parse::{self, Operator, Token},
	validate::validate,
};

/// Generates an implementation of [`HasOpType`] for an enum type.
/// This is very tightly coupled with the expected variants: `Num`, `Dice`, `Add`, `Sub`, `Mul`, and `Div`.
macro_rules! op_type_impl {
	($name:ty) => {
		impl HasOpType for $name {
			fn op_type(&self) -> OpType {
				match self {
					Self::Num(..) | Self::Dice(..) => OpType::Value,
					Self::Add(..) | Self::Sub(..) => OpType::Additive,
					Self::Mul(..) | Self::Div(..) => OpType::Multiplicative,
				}
			}

			fn is_value(&self) -> bool {
				matches!(self, Self::Num(..) | Self::Dice(..))
			}

			fn is_additive(&self) -> bool {
				matches!(self, Self::Add(..) | Self::Sub(..))
			}

			fn is_multiplicative(&self) -> bool {
				matches!(self, Self::Mul(..) | Self::Div(..))
			}

			fn is_commutative(&self) -> bool {
				matches!(self, Self::Add(..) | Self::Mul(..))
			}
		}
	};
}

/// Individual elements of a full mathematical dice expression
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Expr {
	/// Standalone integer
	Num(i64),

	/// Dice literal
	Dice(Dice),

	/// Sum of two expressions
	Add(Box<Self>, Box<Self>),

	/// Difference of two expressions
	Sub(Box<Self>, Box<Self>),

	/// Product of two expressions
	Mul(Box<Self>, Box<Self>),

	/// Integer quotient of two expressions (rounded toward negative infinity)
	Div(Box<Self>, Box<Self>),
}

op_type_impl!(Expr);

impl Expr {
	/// Builds an expression tree from a token sequence, giving `*` and `/` precedence over `+` and `-` and
	/// associating operators of equal precedence left to right.
	///
	/// The tokens are expected to have passed [`validate()`]; anything malformed that reaches this point is still
	/// reported rather than mis-parsed.
	///
	/// # Errors
	/// If the tokens don't form a complete expression, an [`Error::Validation`] is returned.
	///
	/// # Examples
	/// ```
	/// use dicetray::{config::Limits, expr::Expr, parse::tokenize};
	///
	/// let tokens = tokenize("2+3*4", &Limits::default())?;
	/// let expr = Expr::from_tokens(&tokens)?;
	/// assert_eq!(
	/// 	expr,
	/// 	Expr::Add(
	/// 		Box::new(Expr::Num(2)),
	/// 		Box::new(Expr::Mul(Box::new(Expr::Num(3)), Box::new(Expr::Num(4)))),
	/// 	)
	/// );
	/// # Ok::<(), dicetray::Error>(())
	/// ```
	pub fn from_tokens(tokens: &[Token]) -> Result<Self, Error> {
		let mut stream = TokenStream { tokens, pos: 0 };
		let expr = stream.sum()?;

		match stream.peek() {
			None => Ok(expr),
			Some(Token::RightParen) => Err(ValidationKind::UnbalancedParentheses.into()),
			Some(..) => Err(ValidationKind::InvalidTokenSequence.into()),
		}
	}

	/// Evaluates the expression, rolling any dice it contains with the given roller. For most types of expressions,
	/// this will directly result in a 1:1 equivalent [`Evaled`], with the notable exception of [`Expr::Dice`]. For
	/// dice expressions, the dice they contain are rolled, resulting in an [`Evaled::Dice`] with the [`Rolled`] set of
	/// dice.
	///
	/// Dice are rolled in left-to-right order of their appearance in the expression.
	#[must_use]
	pub fn eval<R: Roller + ?Sized>(&self, roller: &mut R) -> Evaled<'_> {
		match self {
			Self::Num(x) => Evaled::Num(*x),
			Self::Dice(dice) => {
				let rolled = roller.roll(dice);
				tracing::trace!(dice = %dice, faces = ?rolled.faces, "rolled dice");
				Evaled::Dice(rolled)
			}

			Self::Add(a, b) => Evaled::Add(Box::new(a.eval(roller)), Box::new(b.eval(roller))),
			Self::Sub(a, b) => Evaled::Sub(Box::new(a.eval(roller)), Box::new(b.eval(roller))),
			Self::Mul(a, b) => Evaled::Mul(Box::new(a.eval(roller)), Box::new(b.eval(roller))),
			Self::Div(a, b) => Evaled::Div(Box::new(a.eval(roller)), Box::new(b.eval(roller))),
		}
	}

	/// Checks whether the expression is deterministic (will always yield the same value with every evaluation).
	/// A [`Self::Num`] will always return `true`, a [`Self::Dice`] will always return `false` unless the dice they
	/// contain only have one side, and all binary expressions forward the check to their children.
	#[must_use]
	pub fn is_deterministic(&self) -> bool {
		match self {
			Self::Num(..) => true,
			Self::Dice(dice) => dice.sides == 1,
			Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) | Self::Div(a, b) => {
				a.is_deterministic() && b.is_deterministic()
			}
		}
	}

	/// Combines two expressions with an operator.
	fn binary(op: Operator, a: Self, b: Self) -> Self {
		let (a, b) = (Box::new(a), Box::new(b));
		match op {
			Operator::Add => Self::Add(a, b),
			Operator::Sub => Self::Sub(a, b),
			Operator::Mul => Self::Mul(a, b),
			Operator::Div => Self::Div(a, b),
		}
	}
}

impl Describe for Expr {
	/// Builds a full usable expression string from the expressions. Operations are grouped with parentheses whenever
	/// the order of operations requires it. All strings output from this should result in the exact same expression
	/// layout when re-parsing them.
	///
	/// `list_limit` does not affect the output of this implementation in any way since there are no possible lists of
	/// elements included, so it is always safe to pass `None`.
	fn describe(&self, _list_limit: Option<usize>) -> String {
		match self {
			Self::Num(x) => x.to_string(),
			Self::Dice(dice) => dice.to_string(),

			Self::Add(a, b) => self.describe_binary_expr('+', a.as_ref(), b.as_ref(), None),
			Self::Sub(a, b) => self.describe_binary_expr('-', a.as_ref(), b.as_ref(), None),
			Self::Mul(a, b) => self.describe_binary_expr('*', a.as_ref(), b.as_ref(), None),
			Self::Div(a, b) => self.describe_binary_expr('/', a.as_ref(), b.as_ref(), None),
		}
	}
}

impl fmt::Display for Expr {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output of this implementation is equivalent to [`Self::describe(None)`].
	///
	/// [`Self::describe(None)`]: Self::describe()
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.describe(None))
	}
}

impl FromStr for Expr {
	type Err = Error;

	/// Tokenizes, validates, and builds an expression using the default [`Limits`].
	///
	/// # Examples
	/// ```
	/// use dicetray::expr::{Describe, Expr};
	///
	/// let expr: Expr = "( 2d6+6 ) * 5".parse()?;
	/// assert_eq!(expr.describe(None), "(2D6 + 6) * 5");
	/// # Ok::<(), dicetray::Error>(())
	/// ```
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let tokens = parse::tokenize(s, &Limits::default())?;
		validate(&tokens)?;
		Self::from_tokens(&tokens)
	}
}

/// Individual elements of an evaluated mathematical dice expression
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Evaled<'a> {
	/// Standalone integer
	Num(i64),

	/// Rolled dice
	Dice(Rolled<'a>),

	/// Sum of two expressions
	Add(Box<Self>, Box<Self>),

	/// Difference of two expressions
	Sub(Box<Self>, Box<Self>),

	/// Product of two expressions
	Mul(Box<Self>, Box<Self>),

	/// Integer quotient of two expressions (rounded toward negative infinity)
	Div(Box<Self>, Box<Self>),
}

op_type_impl!(Evaled<'_>);

impl Evaled<'_> {
	/// Calculates the final result of the evaluated expression and all of its children (if any).
	///
	/// # Errors
	/// If a divisor is zero, [`RollKind::DivisionByZero`] is returned. If any intermediate value overflows an `i64`,
	/// [`RollKind::Overflow`] is returned.
	pub fn calc(&self) -> Result<i64, Error> {
		match self {
			Self::Num(x) => Ok(*x),
			Self::Dice(rolled) => i64::try_from(rolled.total()?).map_err(|_err| Error::Roll(RollKind::Overflow)),

			Self::Add(a, b) => a.calc()?.checked_add(b.calc()?).ok_or(Error::Roll(RollKind::Overflow)),
			Self::Sub(a, b) => a.calc()?.checked_sub(b.calc()?).ok_or(Error::Roll(RollKind::Overflow)),
			Self::Mul(a, b) => a.calc()?.checked_mul(b.calc()?).ok_or(Error::Roll(RollKind::Overflow)),
			Self::Div(a, b) => floor_div(a.calc()?, b.calc()?),
		}
	}

	/// Moves all of self's owned data into a new instance and clones any unowned data in order to create a `'static`
	/// instance of self.
	#[must_use]
	pub fn into_owned(self) -> Evaled<'static> {
		match self {
			Self::Num(x) => Evaled::Num(x),
			Self::Dice(rolled) => Evaled::Dice(rolled.into_owned()),
			Self::Add(a, b) => Evaled::Add(Box::new(a.into_owned()), Box::new(b.into_owned())),
			Self::Sub(a, b) => Evaled::Sub(Box::new(a.into_owned()), Box::new(b.into_owned())),
			Self::Mul(a, b) => Evaled::Mul(Box::new(a.into_owned()), Box::new(b.into_owned())),
			Self::Div(a, b) => Evaled::Div(Box::new(a.into_owned()), Box::new(b.into_owned())),
		}
	}

	/// Collects every face rolled anywhere in the expression, in roll order.
	#[must_use]
	pub fn faces(&self) -> Vec<u32> {
		let mut faces = Vec::new();
		self.collect_faces(&mut faces);
		faces
	}

	/// Appends every face rolled in this expression to `faces`.
	fn collect_faces(&self, faces: &mut Vec<u32>) {
		match self {
			Self::Num(..) => {}
			Self::Dice(rolled) => faces.extend_from_slice(&rolled.faces),
			Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) | Self::Div(a, b) => {
				a.collect_faces(faces);
				b.collect_faces(faces);
			}
		}
	}
}

impl Describe for Evaled<'_> {
	/// Builds the expression string with every rolled dice set expanded into its individual faces.
	///
	/// # Examples
	/// ```
	/// use dicetray::{dice::roller::Iter as IterRoller, expr::{Describe, Expr}};
	///
	/// let expr: Expr = "(2d6+6)*5".parse()?;
	/// let evaled = expr.eval(&mut IterRoller::new([3, 4]));
	/// assert_eq!(evaled.describe(None), "(2D6[3, 4] + 6) * 5");
	/// assert_eq!(evaled.calc()?, 65);
	/// # Ok::<(), dicetray::Error>(())
	/// ```
	fn describe(&self, list_limit: Option<usize>) -> String {
		match self {
			Self::Num(x) => x.to_string(),
			Self::Dice(roll) => roll.describe(list_limit),

			Self::Add(a, b) => self.describe_binary_expr('+', a.as_ref(), b.as_ref(), list_limit),
			Self::Sub(a, b) => self.describe_binary_expr('-', a.as_ref(), b.as_ref(), list_limit),
			Self::Mul(a, b) => self.describe_binary_expr('*', a.as_ref(), b.as_ref(), list_limit),
			Self::Div(a, b) => self.describe_binary_expr('/', a.as_ref(), b.as_ref(), list_limit),
		}
	}
}

impl fmt::Display for Evaled<'_> {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output of this implementation is equivalent to [`Self::describe(None)`].
	///
	/// [`Self::describe(None)`]: Self::describe()
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.describe(None))
	}
}

/// Evaluates a validated token sequence by building its tree, rolling it, and totaling it.
///
/// # Errors
/// Any error from [`Expr::from_tokens()`] or [`Evaled::calc()`] is returned.
///
/// # Examples
/// ```
/// use dicetray::{config::Limits, dice::roller::Max as MaxRoller, expr::evaluate, parse::tokenize};
///
/// let tokens = tokenize("(2D6+6)*5", &Limits::default())?;
/// assert_eq!(evaluate(&tokens, &mut MaxRoller)?, 90);
/// # Ok::<(), dicetray::Error>(())
/// ```
pub fn evaluate<R: Roller + ?Sized>(tokens: &[Token], roller: &mut R) -> Result<i64, Error> {
	Expr::from_tokens(tokens)?.eval(roller).calc()
}

/// Divides, rounding the quotient toward negative infinity.
fn floor_div(a: i64, b: i64) -> Result<i64, Error> {
	if b == 0 {
		return Err(RollKind::DivisionByZero.into());
	}

	let quotient = a.checked_div(b).ok_or(RollKind::Overflow)?;
	let remainder = a.checked_rem(b).ok_or(RollKind::Overflow)?;
	let floored = if remainder != 0 && (remainder < 0) != (b < 0) {
		quotient.checked_sub(1).ok_or(RollKind::Overflow)?
	} else {
		quotient
	};

	Ok(floored)
}

/// Cursor over a token sequence for building expression trees
#[derive(Debug)]
struct TokenStream<'t> {
	/// Tokens being parsed
	tokens: &'t [Token],

	/// Index of the next unconsumed token
	pos: usize,
}

impl TokenStream<'_> {
	/// Looks at the next token without consuming it.
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos)
	}

	/// Consumes the next token.
	fn advance(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.pos).copied();
		if token.is_some() {
			self.pos = self.pos.saturating_add(1);
		}
		token
	}

	/// Consumes the next token if it's an operator matching the wanted precedence.
	fn next_operator(&mut self, multiplicative: bool) -> Option<Operator> {
		match self.peek() {
			Some(Token::Operator(op)) if op.is_multiplicative() == multiplicative => {
				let op = *op;
				self.pos = self.pos.saturating_add(1);
				Some(op)
			}
			_ => None,
		}
	}

	/// Parses additions and subtractions of products.
	fn sum(&mut self) -> Result<Expr, Error> {
		let mut lhs = self.product()?;
		while let Some(op) = self.next_operator(false) {
			let rhs = self.product()?;
			lhs = Expr::binary(op, lhs, rhs);
		}
		Ok(lhs)
	}

	/// Parses multiplications and divisions of atoms.
	fn product(&mut self) -> Result<Expr, Error> {
		let mut lhs = self.atom()?;
		while let Some(op) = self.next_operator(true) {
			let rhs = self.atom()?;
			lhs = Expr::binary(op, lhs, rhs);
		}
		Ok(lhs)
	}

	/// Parses a single value or parenthesized sub-expression.
	fn atom(&mut self) -> Result<Expr, Error> {
		match self.advance() {
			Some(Token::Number(x)) => Ok(Expr::Num(x)),
			Some(Token::Dice(dice)) => Ok(Expr::Dice(dice)),
			Some(Token::LeftParen) => {
				if self.peek() == Some(&Token::RightParen) {
					return Err(ValidationKind::EmptyParentheses.into());
				}
				let inner = self.sum()?;
				match self.advance() {
					Some(Token::RightParen) => Ok(inner),
					_ => Err(ValidationKind::UnbalancedParentheses.into()),
				}
			}
			Some(Token::Operator(..)) => Err(ValidationKind::InvalidOperatorPlacement.into()),
			Some(Token::RightParen) => Err(ValidationKind::UnbalancedParentheses.into()),
			None if self.pos == 0 => Err(ValidationKind::EmptyTokens.into()),
			None => Err(ValidationKind::MissingOperand.into()),
		}
	}
}

/// Operation type for an individual expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[expect(clippy::exhaustive_enums, reason = "The grammar only has these three")]
pub enum OpType {
	/// Single value, no operation
	Value,

	/// Additive operation (sum or difference)
	Additive,

	/// Multiplicative operation (product or quotient)
	Multiplicative,
}

/// Trait that offers [`OpType`]-related information
pub trait HasOpType {
	/// Gets the type of this expression.
	fn op_type(&self) -> OpType;

	/// Checks whether this expression is a single value.
	fn is_value(&self) -> bool;

	/// Checks whether this expression is an additive operation.
	fn is_additive(&self) -> bool;

	/// Checks whether this expression is a multiplicative operation.
	fn is_multiplicative(&self) -> bool;

	/// Checks whether this expression's operation gives the same result with its operands swapped.
	fn is_commutative(&self) -> bool;

	/// Checks whether this expression is a binary (additive or multiplicative) operation.
	fn is_binary(&self) -> bool {
		self.is_additive() || self.is_multiplicative()
	}
}

/// Trait to allow creation of expanded descriptions with an optional max number of individual listed results where
/// applicable
pub trait Describe {
	/// Builds a detailed expression string with additional information about non-deterministic elements.
	/// Any elements of the expression that can have a different result between multiple evaluations or multiple results
	/// should list all of the specific individual results that occurred (ideally, up to `list_limit` of them).
	#[must_use]
	fn describe(&self, list_limit: Option<usize>) -> String;
}

/// Trait for describing binary expressions with influence from own type.
/// Used for wrapping parentheses around parts of expressions based on [`OpType`] of self and the operands.
trait DescribeBinaryExpr: HasOpType + Describe {
	/// Builds a detailed description for a binary expression, adding parentheses wherever the operands would
	/// otherwise regroup when read back.
	fn describe_binary_expr(
		&self,
		op: char,
		a: &impl DescribeBinaryExpr,
		b: &impl DescribeBinaryExpr,
		list_limit: Option<usize>,
	) -> String {
		let wrap_a = self.is_multiplicative() && a.is_additive();
		let wrap_b = b.is_binary()
			&& ((self.is_multiplicative() && b.is_additive())
				|| (self.op_type() == b.op_type() && !(self.is_commutative() && b.is_commutative())));

		format!(
			"{} {} {}",
			if wrap_a {
				paren_wrap(a.describe(list_limit))
			} else {
				a.describe(list_limit)
			},
			op,
			if wrap_b {
				paren_wrap(b.describe(list_limit))
			} else {
				b.describe(list_limit)
			}
		)
	}
}

impl<T: HasOpType + Describe> DescribeBinaryExpr for T {}

/// Wraps a string in parentheses.
#[must_use]
fn paren_wrap(mut text: String) -> String {
	text.insert(0, '(');
	text.push(')');
	text
}
