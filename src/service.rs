//! Запрос на компиляцию: `(вид шейдера, исходник) -> артефакт`.
//!
//! Точка входа для внешних клиентов (редактор, сервис). Ошибки любого этапа
//! сводятся к структуре [`CompileFailure`], которая сериализуется в JSON:
//!
//! ```json
//! {"kind": "compiler", "reason": "unknown variable 'x'", "location": {"line": 2, "column": 5, "offset": 18}}
//! ```

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codegen::{Backend, CodegenError, GlslBackend, LowerBackend};
use crate::compiler::{compile, CompilerError, ShaderKind};
use crate::ir::Program;
use crate::parser::{parse, Location, ParseError};
use crate::runtime::Shader;

/// Этап, на котором компиляция не удалась.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Parse,
    Compiler,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Parse => "parse",
            FailureKind::Compiler => "compiler",
        })
    }
}

/// Структурированная ошибка компиляции с позицией в исходнике.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind} error at line {}: {reason}", .location.line)]
pub struct CompileFailure {
    pub kind: FailureKind,
    pub reason: String,
    pub location: Location,
}

impl CompileFailure {
    pub fn parse(error: &ParseError, source: &str) -> Self {
        Self {
            kind: FailureKind::Parse,
            reason: error.to_string(),
            location: error.span().location(source),
        }
    }

    pub fn compiler(error: &CompilerError, source: &str) -> Self {
        Self {
            kind: FailureKind::Compiler,
            reason: error.to_string(),
            location: error.location(source),
        }
    }

    /// Ошибка генерации кода относится ко всей программе: позиция - первая строка.
    pub fn codegen(error: &CodegenError) -> Self {
        Self {
            kind: FailureKind::Compiler,
            reason: error.to_string(),
            location: Location {
                line: 1,
                column: None,
                offset: None,
            },
        }
    }
}

/// Запрос в сериализованном виде.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRequest {
    pub kind: ShaderKind,
    pub source: String,
}

impl CompileRequest {
    pub fn new(kind: ShaderKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn execute(&self) -> Result<Shader, CompileFailure> {
        compile_request(self.kind, &self.source)
    }
}

/// Разобрать и проверить исходник, не генерируя код.
pub fn check(kind: ShaderKind, source: &str) -> Result<Program, CompileFailure> {
    let ast = parse(source).map_err(|e| CompileFailure::parse(&e, source))?;
    compile(&ast, kind).map_err(|e| CompileFailure::compiler(&e, source))
}

/// Полный путь от исходника до артефакта выбранного генератора.
pub fn compile_with<B: Backend>(
    backend: &B,
    kind: ShaderKind,
    source: &str,
) -> Result<B::Artifact, CompileFailure> {
    let program = check(kind, source)?;
    let artifact = backend
        .generate(&program)
        .map_err(|e| CompileFailure::codegen(&e))?;
    debug!("compiled {kind} shader with the {} backend", backend.name());
    Ok(artifact)
}

/// Скомпилировать исходник в исполняемый шейдер.
pub fn compile_request(kind: ShaderKind, source: &str) -> Result<Shader, CompileFailure> {
    compile_with(&LowerBackend, kind, source)
}

/// Скомпилировать исходник в текст GLSL.
pub fn compile_glsl(kind: ShaderKind, source: &str) -> Result<String, CompileFailure> {
    compile_with(&GlslBackend, kind, source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let shader = compile_request(
            ShaderKind::Fragment,
            "void main() { sd_FragHeight = 1.0; sd_FragAngle = 0.0; }",
        )
        .unwrap();
        assert_eq!(shader.kind(), ShaderKind::Fragment);
    }

    #[test]
    fn test_parse_failure() {
        let failure = compile_request(ShaderKind::Pixel, "void main() {\n  float x = ;\n}").unwrap_err();
        assert_eq!(failure.kind, FailureKind::Parse);
        assert_eq!(failure.location.line, 2);
        assert!(failure.location.column.is_some());
    }

    #[test]
    fn test_compiler_failure() {
        let source = "void main() {\n    x = 1;\n}";
        let failure = compile_request(ShaderKind::Pixel, source).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Compiler);
        assert!(failure.reason.contains("unknown variable"), "{}", failure.reason);
        assert_eq!(failure.location.line, 2);
        assert_eq!(failure.location.column, Some(5));
    }

    #[test]
    fn test_codegen_failure() {
        let failure = compile_request(ShaderKind::Pixel, "float f() { return 1.0; }").unwrap_err();
        assert_eq!(failure.kind, FailureKind::Compiler);
        assert!(failure.reason.contains("main"));
        assert_eq!(failure.location.line, 1);
        assert_eq!(failure.location.offset, None);
    }

    #[test]
    fn test_failure_json() {
        let failure = compile_request(ShaderKind::Fragment, "void main() {\n    x = 1;\n}").unwrap_err();
        let json: serde_json::Value = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "compiler");
        assert_eq!(json["location"]["line"], 2);
        assert_eq!(json["location"]["column"], 5);
        assert_eq!(json["location"]["offset"], 18);
        assert!(json["reason"].as_str().unwrap().contains("unknown variable"));
    }

    #[test]
    fn test_request_round_trip() {
        let request: CompileRequest = serde_json::from_str(
            r#"{"kind": "geometry", "source": "void main() { sd_FragCoord = iFragCoord; sd_FragNormal = iFragNormal; }"}"#,
        )
        .unwrap();
        assert_eq!(request.kind, ShaderKind::Geometry);
        let shader = request.execute().unwrap();
        assert!(shader.known_uniforms().contains("iFragID"));
    }

    #[test]
    fn test_glsl_request() {
        let text = compile_glsl(
            ShaderKind::Fragment,
            "void main() { sd_FragHeight = 1.0; sd_FragAngle = 0.0; }",
        )
        .unwrap();
        assert!(text.contains("void main()"));
    }
}
