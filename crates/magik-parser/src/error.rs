//! Syntax errors.

use magik_common::span::Span;
use thiserror::Error;

/// A syntax error. The parser records these and keeps going, so a file
/// with errors still has a complete, if partly `ERROR_NODE`, tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    /// Set when input ran out inside a `_method`, `_if`, `_loop` and so on.
    pub unclosed: Option<Unclosed>,
}

/// The opening keyword of a construct missing its `_end...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unclosed {
    /// `method`, `if`, `loop`, ...
    pub construct: String,
    pub opened: Span,
}

impl Unclosed {
    /// Editor note attached to the opening keyword.
    pub fn note(&self) -> String {
        format!("{} started here", self.construct)
    }
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            unclosed: None,
        }
    }

    pub fn unclosed(expected: &str, span: Span, construct: &str, opened: Span) -> Self {
        Self {
            message: format!("expected {expected}"),
            span,
            unclosed: Some(Unclosed {
                construct: construct.to_string(),
                opened,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unclosed_points_back_at_the_opening_keyword() {
        let err = ParseError::unclosed("`_endloop`", Span::new(40, 40), "loop", Span::new(3, 8));
        assert_eq!(err.to_string(), "expected `_endloop`");
        let unclosed = err.unclosed.unwrap();
        assert_eq!(unclosed.opened, Span::new(3, 8));
        assert_eq!(unclosed.note(), "loop started here");
    }
}
