//! Система типов NLSL.
//!
//! Типы закрыты и не параметризуются: скаляры, векторы и квадратные матрицы
//! фиксированного размера. `Bool` существует только как тип результата
//! сравнений и не может быть объявлен в исходном коде.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Тип значения NLSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Void,
    Bool,
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl Type {
    /// Имя типа так, как оно пишется в исходном коде.
    pub fn name(self) -> &'static str {
        match self {
            Type::Void => "void",
            Type::Bool => "bool",
            Type::Int => "int",
            Type::Float => "float",
            Type::Vec2 => "vec2",
            Type::Vec3 => "vec3",
            Type::Vec4 => "vec4",
            Type::Mat2 => "mat2",
            Type::Mat3 => "mat3",
            Type::Mat4 => "mat4",
        }
    }

    /// Скаляр (int или float).
    pub fn is_scalar(self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_vector(self) -> bool {
        self.vector_len().is_some()
    }

    pub fn is_matrix(self) -> bool {
        self.matrix_size().is_some()
    }

    /// Количество компонент вектора.
    pub fn vector_len(self) -> Option<usize> {
        match self {
            Type::Vec2 => Some(2),
            Type::Vec3 => Some(3),
            Type::Vec4 => Some(4),
            _ => None,
        }
    }

    /// Размер стороны квадратной матрицы (= число колонок).
    pub fn matrix_size(self) -> Option<usize> {
        match self {
            Type::Mat2 => Some(2),
            Type::Mat3 => Some(3),
            Type::Mat4 => Some(4),
            _ => None,
        }
    }

    /// Тип колонки матрицы.
    pub fn column_type(self) -> Option<Type> {
        self.matrix_size().and_then(Type::vector_of)
    }

    /// Вектор заданной длины.
    pub fn vector_of(len: usize) -> Option<Type> {
        match len {
            2 => Some(Type::Vec2),
            3 => Some(Type::Vec3),
            4 => Some(Type::Vec4),
            _ => None,
        }
    }

    /// Типы, которые можно объявить в исходном коде (переменные, параметры, uniform).
    pub fn is_declarable(self) -> bool {
        !matches!(self, Type::Void | Type::Bool)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Неизвестное имя типа.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type '{0}'")]
pub struct UnknownType(pub String);

impl FromStr for Type {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "void" => Ok(Type::Void),
            "int" => Ok(Type::Int),
            "float" => Ok(Type::Float),
            "vec2" => Ok(Type::Vec2),
            "vec3" => Ok(Type::Vec3),
            "vec4" => Ok(Type::Vec4),
            "mat2" => Ok(Type::Mat2),
            "mat3" => Ok(Type::Mat3),
            "mat4" => Ok(Type::Mat4),
            other => Err(UnknownType(other.to_string())),
        }
    }
}

/// Сигнатура списка типов через запятую: `"vec2, float"`.
pub fn join_types(types: impl IntoIterator<Item = Type>) -> String {
    types
        .into_iter()
        .map(Type::name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_names() {
        assert_eq!("vec3".parse::<Type>().unwrap(), Type::Vec3);
        assert_eq!("mat2".parse::<Type>().unwrap(), Type::Mat2);
        assert!("bool".parse::<Type>().is_err());
        assert!("double".parse::<Type>().is_err());
    }

    #[test]
    fn test_shapes() {
        assert_eq!(Type::Mat3.column_type(), Some(Type::Vec3));
        assert_eq!(Type::Vec4.vector_len(), Some(4));
        assert!(Type::Float.is_scalar());
        assert!(!Type::Vec2.is_scalar());
        assert!(!Type::Void.is_declarable());
    }

    #[test]
    fn test_join_types() {
        assert_eq!(join_types([Type::Vec2, Type::Float]), "vec2, float");
        assert_eq!(join_types([]), "");
    }
}
