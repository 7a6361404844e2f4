use crate::text_pos::Point;

use super::Token;

/// First token whose span contains `point`.
pub(crate) fn find_current_token(
    tokens: &[Token],
    point: Point,
) -> Option<&Token> {
    tokens.iter().find(|token| token.span.contains_point(point))
}

/// Last token ending before `point`.
pub(crate) fn find_previous_token(
    tokens: &[Token],
    point: Point,
) -> Option<&Token> {
    tokens.iter().rev().find(|token| token.span.end < point)
}

#[cfg(test)]
#[path = "../../tests/src/completion/context_tests.rs"]
mod tests;
