//! Общий тип ошибок библиотеки.

use thiserror::Error;

use crate::bundle::BundleError;
use crate::codegen::CodegenError;
use crate::compiler::{CompilerError, UnknownShaderKind};
use crate::engine::{EngineError, StageError};
use crate::parser::ParseError;
use crate::runtime::RuntimeError;
use crate::service::CompileFailure;

/// Основной тип `Result` для библиотеки.
pub type NlslResult<T> = Result<T, NlslError>;

/// Любая ошибка NLSL: от разбора исходника до такта движка.
#[derive(Error, Debug)]
pub enum NlslError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("compiler error: {0}")]
    Compiler(#[from] CompilerError),

    #[error("codegen error: {0}")]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Failure(#[from] CompileFailure),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("bundle error: {0}")]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    ShaderKind(#[from] UnknownShaderKind),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
