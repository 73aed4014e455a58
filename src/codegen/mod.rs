//! Генераторы кода.
//!
//! Каждый генератор - чистая функция от [`Program`]: состояние компилятора ему
//! не нужно. Все генераторы принимают один и тот же IR и отличаются только
//! понижением узлов.
//!
//! - [`lower`] - исполняемый артефакт [`crate::runtime::Shader`]
//! - [`glsl`] - текст GLSL для экспорта во внешние инструменты

pub mod glsl;
pub mod lower;

pub use glsl::GlslBackend;
pub use lower::LowerBackend;

use thiserror::Error;

use crate::ir::Program;

/// Ошибка генерации кода.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("program has no 'void main()' entry point")]
    MissingEntryPoint,

    #[error("unresolved reference to '{0}'")]
    UnresolvedReference(String),

    #[error("unresolved call {0}")]
    UnresolvedFunction(String),

    #[error("unknown vector component '{0}'")]
    UnknownComponent(String),

    #[error("unsupported construct: {0}")]
    Unsupported(String),
}

/// Целевой генератор кода.
pub trait Backend {
    /// Что получается на выходе.
    type Artifact;

    /// Короткое имя генератора для журналов и CLI.
    fn name(&self) -> &'static str;

    fn generate(&self, program: &Program) -> Result<Self::Artifact, CodegenError>;
}
