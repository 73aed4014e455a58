//! Ошибки парсера.

use super::token::{Span, Token};
use thiserror::Error;

/// Ошибка разбора исходника шейдера.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at position {}: expected {expected}, found {found}", span.start)]
    UnexpectedToken {
        span: Span,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input at position {}: {message}", span.start)]
    UnexpectedEof { span: Span, message: String },

    /// Символ, с которого не начинается ни один токен.
    #[error("Lexer error at position {}: unexpected character", span.start)]
    LexerError { span: Span },

    /// `a < b < c`: сравнения не ассоциативны.
    #[error("Chained comparison at position {}: '{operator}' cannot follow another comparison", span.start)]
    ChainedComparison { span: Span, operator: String },

    /// Присваивание не в переменную: `v.x = 1;`, `m[0] = v;`, `f() = 1;`.
    #[error("Invalid assignment target at position {}: only plain variables can be assigned", span.start)]
    InvalidAssignmentTarget { span: Span },

    #[error("Invalid column index at position {}: {index}", span.start)]
    InvalidColumn { span: Span, index: i64 },
}

impl ParseError {
    /// "Неожиданный токен", а на конце ввода - "неожиданный конец".
    pub fn unexpected_token(span: Span, expected: impl Into<String>, found: &Token) -> Self {
        if matches!(found, Token::Eof) {
            return Self::UnexpectedEof {
                span,
                message: format!("expected {}", expected.into()),
            };
        }
        Self::UnexpectedToken {
            span,
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::UnexpectedEof { span, .. }
            | Self::LexerError { span }
            | Self::ChainedComparison { span, .. }
            | Self::InvalidAssignmentTarget { span }
            | Self::InvalidColumn { span, .. } => *span,
        }
    }
}
