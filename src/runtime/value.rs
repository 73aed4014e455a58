//! Значения времени выполнения.
//!
//! Векторы и матрицы хранятся как массивы `f64`; матрицы по колонкам
//! (column-major): элемент колонки `c` и строки `r` матрицы `n×n` лежит по
//! индексу `c * n + r`.

use std::fmt;

use serde::Serialize;

use crate::types::Type;

/// Значение шейдера во время выполнения.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Val {
    Bool(bool),
    Int(i64),
    Float(f64),
    Vec2([f64; 2]),
    Vec3([f64; 3]),
    Vec4([f64; 4]),
    Mat2([f64; 4]),
    Mat3([f64; 9]),
    Mat4([f64; 16]),
}

impl Val {
    pub fn ty(&self) -> Type {
        match self {
            Val::Bool(_) => Type::Bool,
            Val::Int(_) => Type::Int,
            Val::Float(_) => Type::Float,
            Val::Vec2(_) => Type::Vec2,
            Val::Vec3(_) => Type::Vec3,
            Val::Vec4(_) => Type::Vec4,
            Val::Mat2(_) => Type::Mat2,
            Val::Mat3(_) => Type::Mat3,
            Val::Mat4(_) => Type::Mat4,
        }
    }

    /// Значение по умолчанию для пользовательского uniform:
    /// `1` и `1.0` для скаляров, нули для векторов и матриц.
    pub fn default_for(ty: Type) -> Option<Val> {
        match ty {
            Type::Int => Some(Val::Int(1)),
            Type::Float => Some(Val::Float(1.0)),
            Type::Vec2 => Some(Val::Vec2([0.0; 2])),
            Type::Vec3 => Some(Val::Vec3([0.0; 3])),
            Type::Vec4 => Some(Val::Vec4([0.0; 4])),
            Type::Mat2 => Some(Val::Mat2([0.0; 4])),
            Type::Mat3 => Some(Val::Mat3([0.0; 9])),
            Type::Mat4 => Some(Val::Mat4([0.0; 16])),
            Type::Void | Type::Bool => None,
        }
    }

    /// Собрать значение типа `ty` из компонент. Скаляры принимают ровно одну
    /// компоненту; `int` отбрасывает дробную часть.
    pub fn from_components(ty: Type, components: &[f64]) -> Option<Val> {
        fn array<const N: usize>(components: &[f64]) -> Option<[f64; N]> {
            components.try_into().ok()
        }
        match ty {
            Type::Int => match components {
                [v] => Some(Val::Int(*v as i64)),
                _ => None,
            },
            Type::Float => match components {
                [v] => Some(Val::Float(*v)),
                _ => None,
            },
            Type::Vec2 => array(components).map(Val::Vec2),
            Type::Vec3 => array(components).map(Val::Vec3),
            Type::Vec4 => array(components).map(Val::Vec4),
            Type::Mat2 => array(components).map(Val::Mat2),
            Type::Mat3 => array(components).map(Val::Mat3),
            Type::Mat4 => array(components).map(Val::Mat4),
            Type::Void | Type::Bool => None,
        }
    }

    /// Компоненты вектора или матрицы.
    pub fn components(&self) -> Option<&[f64]> {
        match self {
            Val::Vec2(v) => Some(v),
            Val::Vec3(v) => Some(v),
            Val::Vec4(v) => Some(v),
            Val::Mat2(m) => Some(m),
            Val::Mat3(m) => Some(m),
            Val::Mat4(m) => Some(m),
            Val::Bool(_) | Val::Int(_) | Val::Float(_) => None,
        }
    }

    /// Скаляр как `f64` (с продвижением `int`).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Val::Int(v) => Some(*v as f64),
            Val::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Val::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Тот же тип с другими компонентами.
    pub fn with_components(&self, components: &[f64]) -> Option<Val> {
        Val::from_components(self.ty(), components)
    }

    /// Покомпонентное преобразование вещественных данных.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Option<Val> {
        match self {
            Val::Float(v) => Some(Val::Float(f(*v))),
            other => {
                let mapped: Vec<f64> = other.components()?.iter().map(|c| f(*c)).collect();
                other.with_components(&mapped)
            }
        }
    }

    /// Все компоненты в виде одного списка (скаляр даёт одну компоненту).
    pub fn flatten_into(&self, out: &mut Vec<f64>) -> bool {
        match self {
            Val::Int(_) | Val::Float(_) => {
                out.extend(self.as_f64());
                true
            }
            other => match other.components() {
                Some(c) => {
                    out.extend_from_slice(c);
                    true
                }
                None => false,
            },
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Bool(b) => write!(f, "{b}"),
            Val::Int(v) => write!(f, "{v}"),
            Val::Float(v) => write!(f, "{v:?}"),
            other => {
                let parts: Vec<String> = other
                    .components()
                    .unwrap_or_default()
                    .iter()
                    .map(|c| format!("{c:?}"))
                    .collect();
                write!(f, "{}({})", other.ty(), parts.join(", "))
            }
        }
    }
}
