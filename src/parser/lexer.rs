//! Лексер для NLSL.

use logos::Logos;

use super::error::ParseError;
use super::token::{Span, Spanned, Token};

/// Внутренние токены для logos.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")] // Пропускаем пробелы
#[logos(skip r"//[^\n]*")] // Пропускаем комментарии // до конца строки
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")] // и блочные комментарии
enum LogosToken {
    // Ключевые слова (до идентификаторов!)
    #[token("uniform")]
    Uniform,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("return")]
    Return,

    // Имена типов
    #[token("void", |lex| lex.slice().to_string())]
    #[token("int", |lex| lex.slice().to_string())]
    #[token("float", |lex| lex.slice().to_string())]
    #[token("vec2", |lex| lex.slice().to_string())]
    #[token("vec3", |lex| lex.slice().to_string())]
    #[token("vec4", |lex| lex.slice().to_string())]
    #[token("mat2", |lex| lex.slice().to_string())]
    #[token("mat3", |lex| lex.slice().to_string())]
    #[token("mat4", |lex| lex.slice().to_string())]
    TypeName(String),

    // Float: наличие десятичной точки отличает его от Int
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    // Integer
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    // Многосимвольные операторы
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("++")]
    Increment,
    #[token("--")]
    Decrement,

    // Односимвольные операторы
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Assign,

    // Разделители
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

/// Лексер NLSL с просмотром на один токен вперёд.
pub struct Lexer<'a> {
    logos: logos::Lexer<'a, LogosToken>,
    source: &'a str,
    peeked: Option<Spanned<Token>>,
}

impl<'a> Lexer<'a> {
    /// Создать новый лексер.
    pub fn new(source: &'a str) -> Self {
        Self {
            logos: LogosToken::lexer(source),
            source,
            peeked: None,
        }
    }

    /// Получить следующий токен.
    pub fn next_token(&mut self) -> Result<Spanned<Token>, ParseError> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }

        self.read_token()
    }

    /// Посмотреть на следующий токен без его потребления.
    pub fn peek_token(&mut self) -> Result<&Spanned<Token>, ParseError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.read_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Прочитать токен из logos.
    fn read_token(&mut self) -> Result<Spanned<Token>, ParseError> {
        match self.logos.next() {
            Some(Ok(logos_token)) => {
                let span = Span::new(self.logos.span().start, self.logos.span().end);
                Ok(Spanned::new(convert_token(logos_token), span))
            }
            Some(Err(())) => {
                let span = Span::new(self.logos.span().start, self.logos.span().end);
                Err(ParseError::LexerError { span })
            }
            None => {
                let pos = self.source.len();
                Ok(Spanned::new(Token::Eof, Span::new(pos, pos)))
            }
        }
    }
}

/// Конвертировать внутренний токен logos в публичный Token.
fn convert_token(logos_token: LogosToken) -> Token {
    match logos_token {
        LogosToken::Uniform => Token::Uniform,
        LogosToken::If => Token::If,
        LogosToken::Else => Token::Else,
        LogosToken::While => Token::While,
        LogosToken::For => Token::For,
        LogosToken::Return => Token::Return,
        LogosToken::TypeName(name) => Token::TypeName(name),
        LogosToken::Float(f) => Token::Float(f),
        LogosToken::Int(n) => Token::Int(n),
        LogosToken::Ident(s) => Token::Ident(s),
        // Операторы
        LogosToken::Eq => Token::Punct("=="),
        LogosToken::Ne => Token::Punct("!="),
        LogosToken::Le => Token::Punct("<="),
        LogosToken::Ge => Token::Punct(">="),
        LogosToken::Increment => Token::Punct("++"),
        LogosToken::Decrement => Token::Punct("--"),
        LogosToken::Plus => Token::Punct("+"),
        LogosToken::Minus => Token::Punct("-"),
        LogosToken::Star => Token::Punct("*"),
        LogosToken::Slash => Token::Punct("/"),
        LogosToken::Percent => Token::Punct("%"),
        LogosToken::Lt => Token::Punct("<"),
        LogosToken::Gt => Token::Punct(">"),
        LogosToken::Assign => Token::Punct("="),
        LogosToken::LParen => Token::Punct("("),
        LogosToken::RParen => Token::Punct(")"),
        LogosToken::LBrace => Token::Punct("{"),
        LogosToken::RBrace => Token::Punct("}"),
        LogosToken::LBracket => Token::Punct("["),
        LogosToken::RBracket => Token::Punct("]"),
        LogosToken::Semicolon => Token::Punct(";"),
        LogosToken::Comma => Token::Punct(","),
        LogosToken::Dot => Token::Punct("."),
    }
}
