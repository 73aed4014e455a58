//! Встроенные uniform-переменные и функции.
//!
//! Набор встроенных uniform зависит от вида шейдера ([`ShaderKind`]);
//! встроенные функции общие для всех видов и реализуются рантаймом
//! ([`crate::runtime::math`]).

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ir::{Function, Parameter};
use crate::types::Type;

/// Вид шейдера: роль программы в конвейере.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderKind {
    Geometry,
    Fragment,
    Pixel,
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 3] = [ShaderKind::Geometry, ShaderKind::Fragment, ShaderKind::Pixel];

    pub fn name(self) -> &'static str {
        match self {
            ShaderKind::Geometry => "geometry",
            ShaderKind::Fragment => "fragment",
            ShaderKind::Pixel => "pixel",
        }
    }

    /// Встроенные uniform этого вида, включая выходные переменные.
    pub fn builtin_uniforms(self) -> &'static [(&'static str, Type)] {
        match self {
            ShaderKind::Geometry => GEOMETRY_UNIFORMS,
            ShaderKind::Fragment => FRAGMENT_UNIFORMS,
            ShaderKind::Pixel => PIXEL_UNIFORMS,
        }
    }

    /// Выходные переменные, которые шейдер обязан установить.
    pub fn outputs(self) -> &'static [&'static str] {
        match self {
            ShaderKind::Geometry => &[FRAG_COORD_OUT, FRAG_NORMAL_OUT],
            ShaderKind::Fragment => &[FRAG_HEIGHT_OUT, FRAG_ANGLE_OUT],
            ShaderKind::Pixel => &[PIXEL_COLOR_OUT],
        }
    }

    pub fn is_builtin_uniform(self, name: &str) -> bool {
        self.builtin_uniforms().iter().any(|(n, _)| *n == name)
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shader kind '{0}' (expected geometry, fragment or pixel)")]
pub struct UnknownShaderKind(pub String);

impl FromStr for ShaderKind {
    type Err = UnknownShaderKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "geometry" => Ok(ShaderKind::Geometry),
            "fragment" => Ok(ShaderKind::Fragment),
            "pixel" => Ok(ShaderKind::Pixel),
            other => Err(UnknownShaderKind(other.to_string())),
        }
    }
}

// === Имена встроенных uniform ===

pub const GLOBAL_TIME: &str = "iGlobalTime";
pub const RESOLUTION: &str = "iResolution";
pub const FRAG_COUNT: &str = "iFragCount";
pub const FRAG_ID: &str = "iFragID";
pub const FRAG_COORD: &str = "iFragCoord";
pub const FRAG_NORMAL: &str = "iFragNormal";
pub const PIXEL_COORD: &str = "iPixelCoord";
pub const PIXEL_RESOLUTION: &str = "iPixelResolution";

pub const FRAG_COORD_OUT: &str = "sd_FragCoord";
pub const FRAG_NORMAL_OUT: &str = "sd_FragNormal";
pub const FRAG_HEIGHT_OUT: &str = "sd_FragHeight";
pub const FRAG_ANGLE_OUT: &str = "sd_FragAngle";
pub const PIXEL_COLOR_OUT: &str = "sd_PixelColor";

const GEOMETRY_UNIFORMS: &[(&str, Type)] = &[
    (GLOBAL_TIME, Type::Float),
    (RESOLUTION, Type::Vec3),
    (FRAG_COUNT, Type::Int),
    (FRAG_ID, Type::Int),
    (FRAG_COORD, Type::Vec3),
    (FRAG_NORMAL, Type::Vec3),
    (FRAG_COORD_OUT, Type::Vec3),
    (FRAG_NORMAL_OUT, Type::Vec3),
];

const FRAGMENT_UNIFORMS: &[(&str, Type)] = &[
    (GLOBAL_TIME, Type::Float),
    (FRAG_COORD, Type::Vec3),
    (FRAG_NORMAL, Type::Vec3),
    (FRAG_HEIGHT_OUT, Type::Float),
    (FRAG_ANGLE_OUT, Type::Float),
];

const PIXEL_UNIFORMS: &[(&str, Type)] = &[
    (GLOBAL_TIME, Type::Float),
    (FRAG_COORD, Type::Vec3),
    (FRAG_NORMAL, Type::Vec3),
    (PIXEL_COORD, Type::Vec2),
    (PIXEL_RESOLUTION, Type::Vec2),
    (PIXEL_COLOR_OUT, Type::Vec4),
];

// === Встроенные функции ===

/// Встроенная функция, реализуемая рантаймом.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Int,
    Float,
    Sin,
    Cos,
    Tan,
    Sqrt,
    Ceil,
    Floor,
    Abs,
    Length,
    Normalize,
    Dot,
    Min,
    Max,
    Clamp,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "vec2" => Builtin::Vec2,
            "vec3" => Builtin::Vec3,
            "vec4" => Builtin::Vec4,
            "mat2" => Builtin::Mat2,
            "mat3" => Builtin::Mat3,
            "mat4" => Builtin::Mat4,
            "int" => Builtin::Int,
            "float" => Builtin::Float,
            "sin" => Builtin::Sin,
            "cos" => Builtin::Cos,
            "tan" => Builtin::Tan,
            "sqrt" => Builtin::Sqrt,
            "ceil" => Builtin::Ceil,
            "floor" => Builtin::Floor,
            "abs" => Builtin::Abs,
            "length" => Builtin::Length,
            "normalize" => Builtin::Normalize,
            "dot" => Builtin::Dot,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "clamp" => Builtin::Clamp,
            _ => return None,
        };
        Some(builtin)
    }
}

fn builtin(name: &str, params: &[Type], return_type: Type) -> Function {
    const NAMES: [&str; 16] = [
        "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p",
    ];
    Function {
        name: name.to_string(),
        params: params
            .iter()
            .zip(NAMES)
            .map(|(ty, n)| Parameter {
                name: n.to_string(),
                ty: *ty,
            })
            .collect(),
        return_type,
        body: Vec::new(),
        builtin: true,
    }
}

/// Все встроенные функции; перегрузки идут в порядке объявления.
pub static BUILTIN_FUNCTIONS: LazyLock<Vec<Function>> = LazyLock::new(|| {
    use Type::{Float, Int, Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

    let mut f = vec![
        builtin("vec2", &[Float, Float], Vec2),
        builtin("vec3", &[Float, Float, Float], Vec3),
        builtin("vec3", &[Vec2, Float], Vec3),
        builtin("vec4", &[Float, Float, Float, Float], Vec4),
        builtin("vec4", &[Vec2, Float, Float], Vec4),
        builtin("vec4", &[Vec3, Float], Vec4),
        builtin("mat2", &[Float; 4], Mat2),
        builtin("mat2", &[Vec2; 2], Mat2),
        builtin("mat3", &[Float; 9], Mat3),
        builtin("mat3", &[Vec3; 3], Mat3),
        builtin("mat4", &[Float; 16], Mat4),
        builtin("mat4", &[Vec4; 4], Mat4),
        builtin("int", &[Float], Int),
        builtin("float", &[Int], Float),
    ];

    for name in ["sin", "cos", "tan", "sqrt", "ceil", "floor"] {
        f.push(builtin(name, &[Float], Float));
        f.push(builtin(name, &[Int], Float));
    }

    f.push(builtin("abs", &[Int], Int));
    f.push(builtin("abs", &[Float], Float));
    for v in [Vec2, Vec3, Vec4] {
        f.push(builtin("abs", &[v], v));
        f.push(builtin("length", &[v], Float));
        f.push(builtin("normalize", &[v], v));
        f.push(builtin("dot", &[v, v], Float));
    }

    for name in ["min", "max"] {
        f.push(builtin(name, &[Float, Float], Float));
        for v in [Vec2, Vec3, Vec4] {
            f.push(builtin(name, &[v, v], v));
            f.push(builtin(name, &[v, Float], v));
        }
    }

    f.push(builtin("clamp", &[Float, Float, Float], Float));
    for v in [Vec2, Vec3, Vec4] {
        f.push(builtin("clamp", &[v, v, v], v));
        f.push(builtin("clamp", &[v, Float, Float], v));
    }

    f
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_kind_names() {
        for kind in ShaderKind::ALL {
            assert_eq!(kind.name().parse::<ShaderKind>().unwrap(), kind);
        }
        assert!("color".parse::<ShaderKind>().is_err());
    }

    #[test]
    fn test_outputs_are_builtin_uniforms() {
        for kind in ShaderKind::ALL {
            for output in kind.outputs() {
                assert!(kind.is_builtin_uniform(output), "{kind}: {output}");
            }
        }
        assert!(!ShaderKind::Fragment.is_builtin_uniform(FRAG_ID));
    }

    #[test]
    fn test_every_builtin_function_has_runtime_implementation() {
        for function in BUILTIN_FUNCTIONS.iter() {
            assert!(Builtin::from_name(&function.name).is_some(), "{}", function.name);
            assert!(function.is_builtin());
        }
    }

    #[test]
    fn test_no_duplicate_builtin_overloads() {
        let mut seen = std::collections::HashSet::new();
        for function in BUILTIN_FUNCTIONS.iter() {
            let key = format!("{}({})", function.name, function.param_signature());
            assert!(seen.insert(key.clone()), "duplicate {key}");
        }
    }
}
