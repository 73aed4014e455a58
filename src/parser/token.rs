//! Токены и позиции для парсера NLSL.

use serde::{Deserialize, Serialize};

/// Позиция в исходном коде.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Начальная позиция (байт).
    pub start: usize,
    /// Конечная позиция (байт).
    pub end: usize,
}

impl Span {
    /// Создать новый Span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Объединить два Span.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Перевести начало Span в строку/колонку исходника.
    pub fn location(self, source: &str) -> Location {
        Location::of_offset(source, self.start)
    }
}

/// Человекочитаемая позиция: строка и колонка считаются с единицы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl Location {
    /// Позиция по байтовому смещению. Смещение за концом исходника обрезается.
    pub fn of_offset(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = source[line_start..offset].chars().count() + 1;

        Self {
            line,
            column: Some(column),
            offset: Some(offset),
        }
    }
}

/// Токен с позицией.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}

/// Типы токенов NLSL.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Целочисленный литерал (без десятичной точки)
    Int(i64),
    /// Литерал с плавающей точкой
    Float(f64),
    /// Идентификатор
    Ident(String),
    /// Имя типа (`int`, `vec3`, `void`, ...)
    TypeName(String),

    // Ключевые слова
    Uniform,
    If,
    Else,
    While,
    For,
    Return,

    /// Оператор или разделитель (`+`, `==`, `{`, `;`, ...)
    Punct(&'static str),

    /// Конец файла
    Eof,
}

impl Token {
    /// Проверить, является ли токен заданным оператором/разделителем.
    pub fn is_punct(&self, symbol: &str) -> bool {
        matches!(self, Token::Punct(p) if *p == symbol)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Int(n) => write!(f, "{}", n),
            Token::Float(n) => write!(f, "{}", n),
            Token::Ident(s) | Token::TypeName(s) => write!(f, "{}", s),
            Token::Uniform => write!(f, "uniform"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::For => write!(f, "for"),
            Token::Return => write!(f, "return"),
            Token::Punct(p) => write!(f, "{}", p),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_first_line() {
        let loc = Span::new(4, 7).location("int foo = 42;");
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, Some(5));
        assert_eq!(loc.offset, Some(4));
    }

    #[test]
    fn test_location_multiline() {
        let source = "void main() {\n  foo = 1;\n}";
        let offset = source.find("foo").unwrap();
        let loc = Location::of_offset(source, offset);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, Some(3));
    }
}
