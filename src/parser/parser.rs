//! Рекурсивный нисходящий парсер NLSL.

use super::error::ParseError;
use super::lexer::Lexer;
use super::token::{Span, Spanned, Token};
use crate::ast::{
    Assignment, Expr, ExprKind, FunctionDef, Item, NumberLiteral, Param, Program, Stmt,
    StmtKind, UnaryAssignment, UnaryOperator, UniformDecl, VariableRef,
};

/// Операторы сравнения. Сравнения не ассоциативны: `a < b < c` является ошибкой.
const COMPARISON_OPERATORS: [&str; 6] = ["==", "!=", "<", "<=", ">", ">="];
const ADDITIVE_OPERATORS: [&str; 2] = ["+", "-"];
const MULTIPLICATIVE_OPERATORS: [&str; 3] = ["*", "/", "%"];

/// Парсер NLSL.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Конец последнего прочитанного токена.
    last_end: usize,
}

impl<'a> Parser<'a> {
    /// Создать новый парсер.
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            last_end: 0,
        }
    }

    /// Распарсить программу целиком.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut items = Vec::new();

        loop {
            let token = self.lexer.peek_token()?.value.clone();
            match token {
                Token::Eof => break,
                Token::Uniform => items.push(Item::Uniform(self.parse_uniform()?)),
                Token::TypeName(_) => items.push(Item::Function(self.parse_function()?)),
                _ => {
                    let token = self.next()?;
                    return Err(ParseError::unexpected_token(
                        token.span,
                        "'uniform' or function definition",
                        &token.value,
                    ));
                }
            }
        }

        Ok(Program {
            items,
            span: Span::new(0, self.last_end),
        })
    }

    /// `uniform <type> <name>;`
    fn parse_uniform(&mut self) -> Result<UniformDecl, ParseError> {
        let start = self.next()?.span;
        let type_name = self.expect_type_name()?;
        let name = self.expect_ident()?;
        let end = self.expect_punct(";")?;

        Ok(UniformDecl {
            type_name,
            name,
            span: start.merge(end),
        })
    }

    /// `<type> <name>(<type> <name>, ...) { ... }`
    fn parse_function(&mut self) -> Result<FunctionDef, ParseError> {
        let start = self.lexer.peek_token()?.span;
        let return_type = self.expect_type_name()?;
        let name = self.expect_ident()?;
        self.expect_punct("(")?;

        let mut params = Vec::new();
        if !self.peek_is_punct(")")? {
            loop {
                let param_start = self.lexer.peek_token()?.span;
                let type_name = self.expect_type_name()?;
                let param_name = self.expect_ident()?;
                params.push(Param {
                    type_name,
                    name: param_name,
                    span: param_start.merge(self.last_span()),
                });
                if !self.eat_punct(",")? {
                    break;
                }
            }
        }
        self.expect_punct(")")?;

        let body = self.parse_block()?;

        Ok(FunctionDef {
            return_type,
            name,
            params,
            body,
            span: start.merge(self.last_span()),
        })
    }

    /// `{ statement* }`
    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect_punct("{")?;
        let mut statements = Vec::new();
        while !self.eat_punct("}")? {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    /// Распарсить одну инструкцию.
    pub fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let token = self.lexer.peek_token()?.clone();
        let start = token.span;

        match token.value {
            Token::If => self.parse_if(),
            Token::While => {
                self.next()?;
                let condition = self.parse_parenthesized()?;
                let body = self.parse_block()?;
                Ok(Stmt::new(
                    StmtKind::While { condition, body },
                    start.merge(self.last_span()),
                ))
            }
            Token::For => {
                self.next()?;
                self.expect_punct("(")?;
                let init = self.parse_simple_statement()?;
                self.expect_punct(";")?;
                let condition = self.parse_expr()?;
                self.expect_punct(";")?;
                let iterator = self.parse_simple_statement()?;
                self.expect_punct(")")?;
                let body = self.parse_block()?;
                Ok(Stmt::new(
                    StmtKind::For {
                        init: Box::new(init),
                        condition,
                        iterator: Box::new(iterator),
                        body,
                    },
                    start.merge(self.last_span()),
                ))
            }
            Token::Return => {
                self.next()?;
                let value = if self.peek_is_punct(";")? {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let end = self.expect_punct(";")?;
                Ok(Stmt::new(StmtKind::Return(value), start.merge(end)))
            }
            _ => {
                let mut statement = self.parse_simple_statement()?;
                let end = self.expect_punct(";")?;
                statement.span = statement.span.merge(end);
                Ok(statement)
            }
        }
    }

    /// `if (cond) { ... } [else { ... } | else if ...]`
    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.next()?.span;
        let condition = self.parse_parenthesized()?;
        let then_body = self.parse_block()?;

        let else_body = if matches!(self.lexer.peek_token()?.value, Token::Else) {
            self.next()?;
            if matches!(self.lexer.peek_token()?.value, Token::If) {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_body,
                else_body,
            },
            start.merge(self.last_span()),
        ))
    }

    /// Инструкция без завершающей `;`: объявление, присваивание, `++`/`--`
    /// или выражение. Используется и в заголовке `for`.
    fn parse_simple_statement(&mut self) -> Result<Stmt, ParseError> {
        let token = self.lexer.peek_token()?.clone();
        let start = token.span;

        match token.value {
            Token::TypeName(_) => {
                let type_name = self.expect_type_name()?;
                let name = self.expect_ident()?;
                self.expect_punct("=")?;
                let value = self.parse_expr()?;
                Ok(Stmt::new(
                    StmtKind::Assign(Assignment {
                        type_name: Some(type_name),
                        name,
                        value,
                    }),
                    start.merge(self.last_span()),
                ))
            }
            Token::Punct(p @ ("++" | "--")) => {
                self.next()?;
                let name = self.expect_ident()?;
                Ok(Stmt::new(
                    StmtKind::Unary(UnaryAssignment {
                        name,
                        operator: unary_operator(p),
                        prefix: true,
                    }),
                    start.merge(self.last_span()),
                ))
            }
            _ => {
                let expr = self.parse_expr()?;
                let target = match &expr.kind {
                    ExprKind::VarRef(VariableRef {
                        name,
                        column: None,
                        component: None,
                    }) => Some(name.clone()),
                    _ => None,
                };

                let next = self.lexer.peek_token()?.clone();
                match (target, &next.value) {
                    (Some(name), Token::Punct("=")) => {
                        self.next()?;
                        let value = self.parse_expr()?;
                        Ok(Stmt::new(
                            StmtKind::Assign(Assignment {
                                type_name: None,
                                name,
                                value,
                            }),
                            start.merge(self.last_span()),
                        ))
                    }
                    (Some(name), Token::Punct(p @ ("++" | "--"))) => {
                        self.next()?;
                        Ok(Stmt::new(
                            StmtKind::Unary(UnaryAssignment {
                                name,
                                operator: unary_operator(p),
                                prefix: false,
                            }),
                            start.merge(self.last_span()),
                        ))
                    }
                    (None, Token::Punct("=" | "++" | "--")) => {
                        Err(ParseError::InvalidAssignmentTarget { span: expr.span })
                    }
                    _ => {
                        let span = expr.span;
                        Ok(Stmt::new(StmtKind::Expr(expr), span))
                    }
                }
            }
        }
    }

    /// `( expr )`
    fn parse_parenthesized(&mut self) -> Result<Expr, ParseError> {
        self.expect_punct("(")?;
        let expr = self.parse_expr()?;
        self.expect_punct(")")?;
        Ok(expr)
    }

    /// Распарсить выражение.
    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_additive()?;
        match self.peek_operator(&COMPARISON_OPERATORS)? {
            Some(operator) => {
                self.next()?;
                let rhs = self.parse_additive()?;
                if let Some(chained) = self.peek_operator(&COMPARISON_OPERATORS)? {
                    let span = self.lexer.peek_token()?.span;
                    return Err(ParseError::ChainedComparison {
                        span,
                        operator: chained.to_string(),
                    });
                }
                Ok(binary(operator, lhs, rhs))
            }
            None => Ok(lhs),
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        while let Some(operator) = self.peek_operator(&ADDITIVE_OPERATORS)? {
            self.next()?;
            let rhs = self.parse_multiplicative()?;
            lhs = binary(operator, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        while let Some(operator) = self.peek_operator(&MULTIPLICATIVE_OPERATORS)? {
            self.next()?;
            let rhs = self.parse_unary()?;
            lhs = binary(operator, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.peek_is_punct("-")? {
            let start = self.next()?.span;
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(ExprKind::Negate(Box::new(operand)), span));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.next()?;
        let start = token.span;

        match token.value {
            Token::Int(n) => Ok(Expr::new(ExprKind::Number(NumberLiteral::Int(n)), start)),
            Token::Float(f) => Ok(Expr::new(ExprKind::Number(NumberLiteral::Float(f)), start)),
            Token::Punct("(") => {
                let mut expr = self.parse_expr()?;
                let end = self.expect_punct(")")?;
                expr.span = start.merge(end);
                Ok(expr)
            }
            // Конструкторы: vec3(...), mat2(...), float(...)
            Token::TypeName(name) => self.parse_call(name, start),
            Token::Ident(name) => {
                if self.peek_is_punct("(")? {
                    return self.parse_call(name, start);
                }

                let column = if self.eat_punct("[")? {
                    let negative = self.eat_punct("-")?;
                    let index = self.next()?;
                    let column = match index.value {
                        Token::Int(n) if !negative => n as usize,
                        Token::Int(n) => {
                            return Err(ParseError::InvalidColumn {
                                span: index.span,
                                index: -n,
                            })
                        }
                        other => {
                            return Err(ParseError::unexpected_token(
                                index.span,
                                "integer column index",
                                &other,
                            ))
                        }
                    };
                    self.expect_punct("]")?;
                    Some(column)
                } else {
                    None
                };

                let component = if self.eat_punct(".")? {
                    Some(self.expect_ident()?)
                } else {
                    None
                };

                Ok(Expr::new(
                    ExprKind::VarRef(VariableRef {
                        name,
                        column,
                        component,
                    }),
                    start.merge(self.last_span()),
                ))
            }
            other => Err(ParseError::unexpected_token(start, "expression", &other)),
        }
    }

    /// `name(arg, ...)` после прочитанного имени.
    fn parse_call(&mut self, name: String, start: Span) -> Result<Expr, ParseError> {
        self.expect_punct("(")?;
        let mut args = Vec::new();
        if !self.peek_is_punct(")")? {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat_punct(",")? {
                    break;
                }
            }
        }
        let end = self.expect_punct(")")?;
        Ok(Expr::new(ExprKind::Call { name, args }, start.merge(end)))
    }

    // === Вспомогательные функции ===

    fn next(&mut self) -> Result<Spanned<Token>, ParseError> {
        let token = self.lexer.next_token()?;
        if !matches!(token.value, Token::Eof) {
            self.last_end = token.span.end;
        }
        Ok(token)
    }

    fn last_span(&self) -> Span {
        Span::new(self.last_end, self.last_end)
    }

    fn peek_is_punct(&mut self, symbol: &str) -> Result<bool, ParseError> {
        Ok(self.lexer.peek_token()?.value.is_punct(symbol))
    }

    fn peek_operator(&mut self, operators: &[&'static str]) -> Result<Option<&'static str>, ParseError> {
        match self.lexer.peek_token()?.value {
            Token::Punct(p) if operators.contains(&p) => Ok(Some(p)),
            _ => Ok(None),
        }
    }

    fn eat_punct(&mut self, symbol: &str) -> Result<bool, ParseError> {
        if self.peek_is_punct(symbol)? {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_punct(&mut self, symbol: &str) -> Result<Span, ParseError> {
        let token = self.next()?;
        if token.value.is_punct(symbol) {
            Ok(token.span)
        } else {
            Err(ParseError::unexpected_token(
                token.span,
                format!("'{}'", symbol),
                &token.value,
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        let token = self.next()?;
        match token.value {
            Token::Ident(name) => Ok(name),
            other => Err(ParseError::unexpected_token(token.span, "identifier", &other)),
        }
    }

    fn expect_type_name(&mut self) -> Result<String, ParseError> {
        let token = self.next()?;
        match token.value {
            Token::TypeName(name) => Ok(name),
            other => Err(ParseError::unexpected_token(token.span, "type name", &other)),
        }
    }
}

fn binary(operator: &str, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span.merge(rhs.span);
    Expr::new(
        ExprKind::Binary {
            operator: operator.to_string(),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    )
}

fn unary_operator(symbol: &str) -> UnaryOperator {
    if symbol == "++" {
        UnaryOperator::Increment
    } else {
        UnaryOperator::Decrement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(source: &str) -> Stmt {
        Parser::new(source).parse_statement().unwrap()
    }

    #[test]
    fn test_parse_declaration() {
        let stmt = statement("int foo = 42;");
        match stmt.kind {
            StmtKind::Assign(a) => {
                assert_eq!(a.type_name.as_deref(), Some("int"));
                assert_eq!(a.name, "foo");
                assert_eq!(a.value.kind, ExprKind::Number(NumberLiteral::Int(42)));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unary_assignments() {
        for (source, op, prefix) in [
            ("foo++;", UnaryOperator::Increment, false),
            ("--foo;", UnaryOperator::Decrement, true),
        ] {
            match statement(source).kind {
                StmtKind::Unary(u) => {
                    assert_eq!(u.name, "foo");
                    assert_eq!(u.operator, op);
                    assert_eq!(u.prefix, prefix);
                }
                other => panic!("Expected unary assignment, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_precedence() {
        let expr = Parser::new("a + b * c < d").parse_expr().unwrap();
        let ExprKind::Binary { operator, lhs, .. } = expr.kind else {
            panic!("Expected binary expression");
        };
        assert_eq!(operator, "<");
        let ExprKind::Binary { operator, rhs, .. } = lhs.kind else {
            panic!("Expected addition");
        };
        assert_eq!(operator, "+");
        assert!(matches!(rhs.kind, ExprKind::Binary { ref operator, .. } if operator == "*"));
    }

    #[test]
    fn test_parse_column_and_component() {
        let expr = Parser::new("m[2].xy").parse_expr().unwrap();
        assert_eq!(
            expr.kind,
            ExprKind::VarRef(VariableRef {
                name: "m".to_string(),
                column: Some(2),
                component: Some("xy".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_if_else_chain() {
        let stmt = statement("if (a == 1) { b = 1; } else if (a > 1) { b = 2; } else { b = 3; }");
        let StmtKind::If { then_body, else_body, .. } = stmt.kind else {
            panic!("Expected if");
        };
        assert_eq!(then_body.len(), 1);
        let else_body = else_body.unwrap();
        assert_eq!(else_body.len(), 1);
        assert!(matches!(else_body[0].kind, StmtKind::If { else_body: Some(_), .. }));
    }

    #[test]
    fn test_parse_for() {
        let stmt = statement("for (int i = 0; i < 10; i++) { x = x + 1; }");
        let StmtKind::For { init, iterator, body, .. } = stmt.kind else {
            panic!("Expected for");
        };
        assert!(matches!(init.kind, StmtKind::Assign(_)));
        assert!(matches!(iterator.kind, StmtKind::Unary(_)));
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_parse_program() {
        let program = Parser::new(
            "uniform float gain;\n\
             float twice(float x) { return x * 2.0; }\n\
             void main() { sd_FragHeight = twice(gain); }",
        )
        .parse_program()
        .unwrap();
        assert_eq!(program.items.len(), 3);
        assert!(matches!(&program.items[0], Item::Uniform(u) if u.name == "gain"));
        assert!(matches!(&program.items[1], Item::Function(f) if f.params.len() == 1));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Parser::new("void main() { int x = ; }").parse_program().is_err());
        assert!(matches!(
            Parser::new("void main() {").parse_program(),
            Err(ParseError::UnexpectedEof { .. })
        ));
        assert!(matches!(
            Parser::new("void main() { v.x = 1.0; }").parse_program(),
            Err(ParseError::InvalidAssignmentTarget { .. })
        ));
        assert!(Parser::new("x = 1;").parse_program().is_err());
    }

    #[test]
    fn test_comparisons_do_not_chain() {
        let err = Parser::new("a < b < c").parse_expr().unwrap_err();
        assert_eq!(err.span().start, 6);
        assert!(matches!(err, ParseError::ChainedComparison { ref operator, .. } if operator == "<"));
        assert!(Parser::new("(a < b) == c").parse_expr().is_ok());
    }

    #[test]
    fn test_negative_column() {
        assert!(matches!(
            Parser::new("m[-1]").parse_expr(),
            Err(ParseError::InvalidColumn { index: -1, .. })
        ));
        assert!(Parser::new("m[x]").parse_expr().is_err());
    }
}
