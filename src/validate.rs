//! Structural checks on token sequences, run before anything is rolled.

use crate::{error::ValidationKind, parse::Token};

/// Checks that a token sequence forms a well-structured expression.
///
/// Values and operators must alternate, every parenthesis must be matched, and no parentheses may be empty.
/// Nothing is rolled here, so a rejected expression never consumes randomness or advances a deterministic counter.
///
/// # Errors
/// The first structural problem found is returned as a [`ValidationKind`]:
/// - [`ValidationKind::EmptyTokens`] if there are no tokens
/// - [`ValidationKind::UnbalancedParentheses`] if the nesting depth ever goes negative or doesn't end at zero
/// - [`ValidationKind::EmptyParentheses`] for `()`
/// - [`ValidationKind::InvalidTokenSequence`] for two adjacent operators, or a value directly followed by a value or
///   opening parenthesis
/// - [`ValidationKind::InvalidOperatorPlacement`] for an operator at the start or right after `(`
/// - [`ValidationKind::MissingOperand`] for an operator at the end or right before `)`
///
/// # Examples
/// ```
/// use dicetray::{config::Limits, error::ValidationKind, parse::tokenize, validate::validate};
///
/// let limits = Limits::default();
/// assert!(validate(&tokenize("(2D6+6)*5", &limits)?).is_ok());
/// assert_eq!(validate(&tokenize("(3D6", &limits)?), Err(ValidationKind::UnbalancedParentheses));
/// assert_eq!(validate(&tokenize("3D6)", &limits)?), Err(ValidationKind::UnbalancedParentheses));
/// assert_eq!(validate(&tokenize("3D6++2", &limits)?), Err(ValidationKind::InvalidTokenSequence));
/// # Ok::<(), dicetray::Error>(())
/// ```
pub fn validate(tokens: &[Token]) -> Result<(), ValidationKind> {
	let Some(last) = tokens.last() else {
		return Err(ValidationKind::EmptyTokens);
	};

	let mut depth: usize = 0;
	let mut prev: Option<&Token> = None;

	for token in tokens {
		match token {
			Token::Dice(..) | Token::Number(..) | Token::LeftParen => {
				if prev.is_some_and(|prev| prev.is_value() || *prev == Token::RightParen) {
					return Err(ValidationKind::InvalidTokenSequence);
				}
				if *token == Token::LeftParen {
					depth = depth.checked_add(1).ok_or(ValidationKind::UnbalancedParentheses)?;
				}
			}

			Token::RightParen => {
				depth = depth.checked_sub(1).ok_or(ValidationKind::UnbalancedParentheses)?;
				match prev {
					Some(Token::LeftParen) => return Err(ValidationKind::EmptyParentheses),
					Some(Token::Operator(..)) => return Err(ValidationKind::MissingOperand),
					_ => {}
				}
			}

			Token::Operator(..) => match prev {
				None | Some(Token::LeftParen) => return Err(ValidationKind::InvalidOperatorPlacement),
				Some(Token::Operator(..)) => return Err(ValidationKind::InvalidTokenSequence),
				Some(..) => {}
			},
		}

		prev = Some(token);
	}

	if last.is_operator() {
		return Err(ValidationKind::MissingOperand);
	}
	if depth != 0 {
		return Err(ValidationKind::UnbalancedParentheses);
	}

	Ok(())
}

/// Checks a token sequence the same way as [`validate()`], only reporting whether it passed.
#[must_use]
#[inline]
pub fn is_valid(tokens: &[Token]) -> bool {
	validate(tokens).is_ok()
}
