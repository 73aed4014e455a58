//! Модуль парсера NLSL.
//!
//! Превращает исходный текст шейдера в синтаксическое дерево [`crate::ast`].
//! Семантика (типы, области видимости, перегрузки) здесь не проверяется.
//!
//! # Синтаксис
//!
//! ```text
//! // Uniform-переменные
//! uniform float gain;
//!
//! // Функции
//! float twice(float x) {
//!     return x * 2.0;
//! }
//!
//! // Точка входа шейдера
//! void main() {
//!     vec3 up = vec3(0.0, 1.0, 0.0);
//!     for (int i = 0; i < 3; i++) { ... }
//!     if (iGlobalTime > 1.0) { ... } else { ... }
//!     sd_FragHeight = twice(gain) * iFragCoord.y;
//! }
//! ```
//!
//! # Пример
//!
//! ```rust,ignore
//! use nlsl_lang::parser::parse;
//!
//! let program = parse("void main() { int x = 1; }").unwrap();
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::ParseError;
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Location, Span, Spanned, Token};

use crate::ast::Program;

/// Парсит исходный код шейдера в синтаксическое дерево.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new(source).parse_program()
}
