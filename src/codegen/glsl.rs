//! Экспорт IR в текст GLSL.
//!
//! Результат предназначен для внешних инструментов и не исполняется
//! рантаймом. Семантика NLSL сохраняется явными преобразованиями:
//! `vec * vec` превращается в `dot`, смешанная скалярная арифметика получает
//! `float(...)`, вещественный `%` превращается в `mod`, целый `%` вызывает
//! евклидов `nlsl_imod`.

use log::debug;

use crate::ir::{Category, Expr, Function, Literal, Operator, Program, Statement, ValueKind};
use crate::types::Type;

use super::{Backend, CodegenError};

const INDENT: &str = "    ";

/// Встроенные функции с перегрузкой для `int`, которой нет в GLSL.
const INT_PROMOTING: [&str; 6] = ["sin", "cos", "tan", "sqrt", "ceil", "floor"];

const INT_MOD: &str = "nlsl_imod";

/// Евклидов остаток для `int`: `%` в GLSL не определён для отрицательных операндов.
const INT_MOD_DEFINITION: &str = "int nlsl_imod(int a, int b) {
    int m = abs(b);
    return a - m * int(floor(float(a) / float(m)));
}";

/// Генератор исходного текста GLSL.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlslBackend;

impl Backend for GlslBackend {
    type Artifact = String;

    fn name(&self) -> &'static str {
        "glsl"
    }

    fn generate(&self, program: &Program) -> Result<String, CodegenError> {
        if program.main().is_none() {
            return Err(CodegenError::MissingEntryPoint);
        }

        let mut out = String::new();
        line(&mut out, 0, &format!("// {} shader", program.kind));

        let (outputs, inputs): (Vec<_>, Vec<_>) = program
            .uniforms
            .values()
            .partition(|u| program.kind.outputs().contains(&u.name.as_str()));
        for uniform in &inputs {
            line(&mut out, 0, &format!("uniform {} {};", uniform.ty, uniform.name));
        }
        for output in &outputs {
            line(&mut out, 0, &format!("{} {};", output.ty, output.name));
        }

        let functions: Vec<&Function> = program.user_functions().collect();
        let mut definitions = String::new();
        for function in &functions {
            definitions.push('\n');
            line(&mut definitions, 0, &format!("{} {{", prototype(function)));
            block(&mut definitions, 1, &function.body)?;
            line(&mut definitions, 0, "}");
        }

        out.push('\n');
        if definitions.contains(&format!("{INT_MOD}(")) {
            line(&mut out, 0, INT_MOD_DEFINITION);
            out.push('\n');
        }
        for function in &functions {
            line(&mut out, 0, &format!("{};", prototype(function)));
        }
        out.push_str(&definitions);

        debug!("emitted {} bytes of GLSL for {} shader", out.len(), program.kind);
        Ok(out)
    }
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

fn prototype(function: &Function) -> String {
    let params: Vec<String> = function
        .params
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect();
    format!("{} {}({})", function.return_type, function.name, params.join(", "))
}

fn block(out: &mut String, depth: usize, body: &[Statement]) -> Result<(), CodegenError> {
    for statement in body {
        emit_statement(out, depth, statement)?;
    }
    Ok(())
}

fn emit_statement(out: &mut String, depth: usize, statement: &Statement) -> Result<(), CodegenError> {
    match statement {
        Statement::If(node) => {
            line(out, depth, &format!("if ({}) {{", expr(&node.condition)));
            block(out, depth + 1, &node.then_body)?;
            if node.else_body.is_empty() {
                line(out, depth, "}");
            } else {
                line(out, depth, "} else {");
                block(out, depth + 1, &node.else_body)?;
                line(out, depth, "}");
            }
        }
        Statement::While(node) => {
            line(out, depth, &format!("while ({}) {{", expr(&node.condition)));
            block(out, depth + 1, &node.body)?;
            line(out, depth, "}");
        }
        Statement::For(node) => {
            line(
                out,
                depth,
                &format!(
                    "for ({}; {}; {}) {{",
                    simple(&node.init)?,
                    expr(&node.condition),
                    simple(&node.iterator)?
                ),
            );
            block(out, depth + 1, &node.body)?;
            line(out, depth, "}");
        }
        other => line(out, depth, &format!("{};", simple(other)?)),
    }
    Ok(())
}

/// Инструкция без блока и без завершающей `;`.
fn simple(statement: &Statement) -> Result<String, CodegenError> {
    match statement {
        Statement::Assignment(a) if a.initial => {
            Ok(format!("{} {} = {}", a.value.ty(), a.name, expr(&a.value)))
        }
        Statement::Assignment(a) => Ok(format!("{} = {}", a.name, expr(&a.value))),
        Statement::Return(ret) => Ok(match &ret.value {
            Some(value) => format!("return {}", expr(value)),
            None => "return".to_string(),
        }),
        Statement::Expression(e) => Ok(expr(e)),
        Statement::If(_) | Statement::While(_) | Statement::For(_) => {
            Err(CodegenError::Unsupported("control flow in a for header".to_string()))
        }
    }
}

fn float_literal(v: f64) -> String {
    let text = format!("{v:?}");
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}

/// Операнд, приведённый к `float`, если он целый.
fn as_float(e: &Expr) -> String {
    if e.ty() == Type::Int {
        format!("float({})", expr(e))
    } else {
        expr(e)
    }
}

fn expr(e: &Expr) -> String {
    match e {
        Expr::Value(value) => match &value.value {
            ValueKind::Literal(Literal::Int(v)) => v.to_string(),
            ValueKind::Literal(Literal::Float(v)) => float_literal(*v),
            ValueKind::Reference(name) => name.clone(),
        },
        Expr::ComponentAccess(access) => format!("{}.{}", expr(&access.value), access.component),
        Expr::MatrixColumnAccess(access) => format!("{}[{}]", expr(&access.value), access.index),
        Expr::Negate(inner) => format!("(-{})", expr(inner)),
        Expr::FunctionCall(call) => {
            let args: Vec<String> = call
                .args
                .iter()
                .map(|a| {
                    // sin(int) и подобные в GLSL требуют float
                    if INT_PROMOTING.contains(&call.name.as_str()) {
                        as_float(a)
                    } else {
                        expr(a)
                    }
                })
                .collect();
            format!("{}({})", call.name, args.join(", "))
        }
        Expr::Operation(op) => {
            let (a, b) = (&*op.a, &*op.b);
            let symbol = op.operator().symbol();
            match op.category {
                Category::VectorVector if op.operator() == Operator::Mul => {
                    format!("dot({}, {})", expr(a), expr(b))
                }
                Category::ScalarArith
                    if a.ty() == Type::Int && b.ty() == Type::Int && op.operator() == Operator::Mod =>
                {
                    format!("{INT_MOD}({}, {})", expr(a), expr(b))
                }
                Category::ScalarArith if a.ty() == Type::Int && b.ty() == Type::Int => {
                    format!("({} {} {})", expr(a), symbol, expr(b))
                }
                Category::ScalarArith | Category::VectorScalar | Category::MatrixScalar
                    if op.operator() == Operator::Mod =>
                {
                    format!("mod({}, {})", as_float(a), as_float(b))
                }
                Category::Comparison if a.ty().is_vector() => vector_comparison(op.operator(), a, b),
                Category::Comparison if a.ty() == b.ty() => {
                    format!("({} {} {})", expr(a), symbol, expr(b))
                }
                Category::ScalarArith
                | Category::VectorScalar
                | Category::MatrixScalar
                | Category::Comparison => format!("({} {} {})", as_float(a), symbol, as_float(b)),
                _ => format!("({} {} {})", expr(a), symbol, expr(b)),
            }
        }
    }
}

fn vector_comparison(operator: Operator, a: &Expr, b: &Expr) -> String {
    let function = match operator {
        Operator::Eq => return format!("({} == {})", expr(a), expr(b)),
        Operator::Ne => return format!("({} != {})", expr(a), expr(b)),
        Operator::Lt => "lessThan",
        Operator::Le => "lessThanEqual",
        Operator::Gt => "greaterThan",
        _ => "greaterThanEqual",
    };
    format!("all({function}({}, {}))", expr(a), expr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, ShaderKind};
    use crate::parser::parse;

    fn glsl(kind: ShaderKind, source: &str) -> String {
        let program = compile(&parse(source).unwrap(), kind).unwrap();
        GlslBackend.generate(&program).unwrap()
    }

    #[test]
    fn test_header_and_functions() {
        let text = glsl(
            ShaderKind::Fragment,
            "uniform float gain;
             float twice(float x) { return x * 2.0; }
             void main() { sd_FragHeight = twice(gain); sd_FragAngle = 0.0; }",
        );
        assert!(text.starts_with("// fragment shader\n"));
        assert!(text.contains("uniform float gain;\n"));
        assert!(text.contains("uniform vec3 iFragCoord;\n"));
        assert!(text.contains("\nfloat sd_FragHeight;\n"));
        assert!(text.contains("float twice(float x);\n"));
        assert!(text.contains("float twice(float x) {\n    return (x * 2.0);\n}\n"));
        assert!(text.contains("    sd_FragHeight = twice(gain);\n"));
    }

    #[test]
    fn test_semantic_rewrites() {
        let text = glsl(
            ShaderKind::Pixel,
            "void main() {
                 vec2 a = iPixelCoord;
                 float d = a * a;
                 float m = 7.5 % 2;
                 int i = 7 % 2;
                 float s = sin(1);
                 if (a < iPixelResolution) { d = d + 1; }
                 for (int k = 0; k < 3; k++) { d = d - 1.0; }
                 sd_PixelColor = vec4(a, d, 1.0);
             }",
        );
        assert!(text.contains("float d = dot(a, a);"));
        assert!(text.contains("float m = mod(7.5, float(2));"));
        assert!(text.contains("int i = nlsl_imod(7, 2);"));
        assert!(text.contains("int nlsl_imod(int a, int b) {"));
        assert!(text.contains("float s = sin(float(1));"));
        assert!(text.contains("if (all(lessThan(a, iPixelResolution))) {"));
        assert!(text.contains("d = (d + float(1));"));
        assert!(text.contains("for (int k = 0; (k < 3); k = (k + 1)) {"));
    }

    #[test]
    fn test_int_modulo_is_euclidean() {
        let text = glsl(
            ShaderKind::Fragment,
            "void main() { int r = -7 % 4; sd_FragHeight = float(r); sd_FragAngle = 0.0; }",
        );
        assert!(text.contains("int r = nlsl_imod(-7, 4);"));
        let helper = text.find("int nlsl_imod(int a, int b) {").unwrap();
        assert!(helper < text.find("void main();").unwrap());
        assert!(text.contains("return a - m * int(floor(float(a) / float(m)));"));

        let plain = glsl(
            ShaderKind::Fragment,
            "void main() { sd_FragHeight = 1.0; sd_FragAngle = 0.0; }",
        );
        assert!(!plain.contains("nlsl_imod"));
    }

    #[test]
    fn test_requires_main() {
        let program = compile(&parse("float f() { return 1.0; }").unwrap(), ShaderKind::Pixel).unwrap();
        assert_eq!(GlslBackend.generate(&program), Err(CodegenError::MissingEntryPoint));
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(0.25), "0.25");
        assert_eq!(float_literal(1e21), "1e21");
    }
}
