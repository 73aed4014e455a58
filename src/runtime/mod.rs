//! Среда выполнения скомпилированных шейдеров.
//!
//! - [`value`] - значения (`int`, `float`, векторы, матрицы)
//! - [`math`] - бинарные операции и встроенные функции
//! - [`code`] - исполняемое представление и интерпретатор
//! - [`shader`] - артефакт [`Shader`]: таблица uniform, привязка и запуск

pub mod code;
pub mod math;
pub mod shader;
pub mod value;

pub use shader::{Shader, UniformSlot};
pub use value::Val;

use thiserror::Error;

use crate::types::Type;

/// Ошибка привязки uniform или выполнения тела шейдера.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("unknown uniform '{0}'")]
    UnknownUniform(String),

    #[error("uniform '{name}' has type {expected}, got {found}")]
    UniformTypeMismatch {
        name: String,
        expected: Type,
        found: Type,
    },

    #[error("integer division by zero")]
    DivisionByZero,

    #[error("function '{0}' finished without returning a value")]
    MissingReturn(String),

    #[error("variable '{0}' read before assignment")]
    Unset(String),

    #[error("internal type fault: {0}")]
    TypeFault(String),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
