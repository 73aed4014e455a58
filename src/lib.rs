//! # NLSL
//!
//! Компилятор и среда исполнения шейдеров для дисплеев из актуаторов.
//!
//! Программа на NLSL (C-подобный язык в духе GLSL) описывает одну из трёх
//! стадий конвейера: `geometry` (позиция и нормаль каждого актуатора),
//! `fragment` (высота и угол) или `pixel` (цвет субпикселя).
//!
//! ## Основные модули
//!
//! - [`parser`] - лексер и парсер, строят [`ast::Program`]
//! - [`compiler`] - семантический компилятор: AST -> типизированный [`ir::Program`]
//! - [`codegen`] - генераторы кода: исполняемый [`runtime::Shader`] и GLSL
//! - [`runtime`] - значения, встроенные функции, интерпретатор шейдера
//! - [`engine`] - движок: такт по трём стадиям, горячая замена шейдеров
//! - [`bundle`] - загрузка наборов шейдеров из каталога или ZIP
//! - [`service`] - запрос на компиляцию со структурированной ошибкой
//!
//! ## Пример
//!
//! ```rust,ignore
//! use nlsl_lang::{compile_request, Engine, DeviceProfile, ShaderKind};
//! use nlsl_lang::arrangement::uniform_rect;
//!
//! let shader = compile_request(
//!     ShaderKind::Fragment,
//!     "void main() { sd_FragHeight = sin(iGlobalTime); sd_FragAngle = 0.0; }",
//! )?;
//!
//! let mut engine = Engine::new(DeviceProfile::default());
//! engine.set_arrangement(uniform_rect(10, 10, 1.0, 1.0));
//! engine.install(ShaderKind::Fragment, shader)?;
//! let frame = engine.execute()?;
//! ```

// === Язык ===
pub mod ast;
pub mod parser;
pub mod types;

// === Компиляция ===
pub mod codegen;
pub mod compiler;
pub mod ir;

// === Исполнение ===
pub mod arrangement;
pub mod engine;
pub mod runtime;

// === Внешние интерфейсы ===
pub mod bundle;
pub mod error;
pub mod service;

// === Re-exports для удобства ===
pub use arrangement::Fragment;
pub use bundle::{Bundle, BundleError};
pub use codegen::{Backend, CodegenError, GlslBackend, LowerBackend};
pub use compiler::{compile, CompilerError, ShaderKind};
pub use engine::{DeviceProfile, Engine, Frame, FragmentState, StageError};
pub use error::{NlslError, NlslResult};
pub use parser::{parse, ParseError};
pub use runtime::{RuntimeError, Shader, Val};
pub use service::{compile_request, CompileFailure};
pub use types::Type;
