//! Ошибки семантического компилятора.

use thiserror::Error;

use crate::ir::ScopeError;
use crate::parser::token::{Location, Span};
use crate::types::{Type, UnknownType};

/// Вид семантической ошибки.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerErrorKind {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("type mismatch for variable '{name}': {found} != {expected}")]
    TypeMismatch {
        name: String,
        expected: Type,
        found: Type,
    },

    #[error("type mismatch in return of '{function}': {found} != {expected}")]
    ReturnTypeMismatch {
        function: String,
        expected: Type,
        found: Type,
    },

    #[error("function '{function}' must return a value of type {expected}")]
    MissingReturnValue { function: String, expected: Type },

    #[error("unary assignments only exist for scalar types ('{name}' is {ty})")]
    NonScalarUnary { name: String, ty: Type },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("no function {name}({signature}) found. candidates are: {}", candidates.join(", "))]
    NoMatchingOverload {
        name: String,
        signature: String,
        candidates: Vec<String>,
    },

    #[error("function {name}({signature}) is already defined")]
    DuplicateFunction { name: String, signature: String },

    #[error("uniform '{0}' is already declared")]
    DuplicateUniform(String),

    #[error("variable '{0}' is already declared in this block")]
    Redeclaration(String),

    #[error("array access is only valid for mat2, mat3 or mat4, found {0}")]
    NotAMatrix(Type),

    #[error("column index out of bounds: {index} >= {columns} for {ty}")]
    ColumnOutOfBounds {
        index: usize,
        columns: usize,
        ty: Type,
    },

    #[error("invalid vector component: {ty}.{component}")]
    InvalidComponent { ty: Type, component: String },

    #[error("conditional must be a comparative expression")]
    NotACondition,

    #[error("type {0} can not be declared")]
    NotDeclarable(Type),

    #[error(transparent)]
    UnknownType(#[from] UnknownType),

    #[error(transparent)]
    Scope(#[from] ScopeError),
}

/// Семантическая ошибка с позицией узла, на котором она возникла.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}")]
pub struct CompilerError {
    pub kind: CompilerErrorKind,
    pub span: Span,
}

impl CompilerError {
    pub fn new(kind: impl Into<CompilerErrorKind>, span: Span) -> Self {
        Self {
            kind: kind.into(),
            span,
        }
    }

    /// Строка, колонка и смещение ошибки в исходном тексте.
    pub fn location(&self, source: &str) -> Location {
        self.span.location(source)
    }
}

pub type CompileResult<T> = Result<T, CompilerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CompilerError::new(
            CompilerErrorKind::TypeMismatch {
                name: "foo".to_string(),
                expected: Type::Int,
                found: Type::Float,
            },
            Span::new(0, 3),
        );
        assert_eq!(err.to_string(), "type mismatch for variable 'foo': float != int");

        let err = CompilerErrorKind::NoMatchingOverload {
            name: "vec2".to_string(),
            signature: "int".to_string(),
            candidates: vec!["vec2(float, float)".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no function vec2(int) found. candidates are: vec2(float, float)"
        );
    }

    #[test]
    fn test_location() {
        let source = "void main() {\n  x = 1;\n}";
        let err = CompilerError::new(CompilerErrorKind::UnknownVariable("x".to_string()), Span::new(16, 22));
        let loc = err.location(source);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, Some(3));
        assert_eq!(loc.offset, Some(16));
    }
}
