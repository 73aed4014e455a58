//! Встроенные функции и бинарные операции над значениями.

use crate::compiler::Builtin;
use crate::ir::{Category, Operator};
use crate::types::Type;

use super::value::Val;
use super::RuntimeError;

fn fault(message: impl Into<String>) -> RuntimeError {
    RuntimeError::TypeFault(message.into())
}

fn scalar(val: &Val) -> Result<f64, RuntimeError> {
    val.as_f64().ok_or_else(|| fault(format!("expected scalar, found {}", val.ty())))
}

fn components(val: &Val) -> Result<&[f64], RuntimeError> {
    val.components()
        .ok_or_else(|| fault(format!("expected vector or matrix, found {}", val.ty())))
}

fn rebuild(like: &Val, data: &[f64]) -> Result<Val, RuntimeError> {
    like.with_components(data)
        .ok_or_else(|| fault(format!("can not build {} from {} components", like.ty(), data.len())))
}

/// Покомпонентная операция над двумя векторами или вектором и скаляром.
fn zip_with(a: &Val, b: &Val, f: impl Fn(f64, f64) -> f64) -> Result<Val, RuntimeError> {
    let lhs = components(a)?;
    let data: Vec<f64> = match b.as_f64() {
        Some(s) => lhs.iter().map(|x| f(*x, s)).collect(),
        None => {
            let rhs = components(b)?;
            if rhs.len() != lhs.len() {
                return Err(fault(format!("{} and {} differ in size", a.ty(), b.ty())));
            }
            lhs.iter().zip(rhs).map(|(x, y)| f(*x, *y)).collect()
        }
    };
    rebuild(a, &data)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Вещественный остаток с тем же знаком, что и делитель.
fn float_mod(x: f64, y: f64) -> f64 {
    x - y * (x / y).floor()
}

// === Бинарные операции ===

/// Вычислить бинарную операцию. Порядок операндов буквальный: у
/// коммутативных операций вектор или матрица может стоять справа.
pub fn binary(category: Category, operator: Operator, a: &Val, b: &Val) -> Result<Val, RuntimeError> {
    match category {
        Category::ScalarArith => scalar_arith(operator, a, b),
        Category::Comparison => compare(operator, a, b),
        Category::VectorVector => match operator {
            Operator::Mul => Ok(Val::Float(dot(components(a)?, components(b)?))),
            Operator::Add => zip_with(a, b, |x, y| x + y),
            Operator::Sub => zip_with(a, b, |x, y| x - y),
            Operator::Div => zip_with(a, b, |x, y| x / y),
            other => Err(fault(format!("{} on vectors", other.symbol()))),
        },
        Category::VectorScalar | Category::MatrixScalar => {
            let (shape, s) = if a.as_f64().is_some() { (b, a) } else { (a, b) };
            match operator {
                Operator::Mul => zip_with(shape, s, |x, y| x * y),
                Operator::Add => zip_with(shape, s, |x, y| x + y),
                Operator::Sub => zip_with(shape, s, |x, y| x - y),
                Operator::Div => zip_with(shape, s, |x, y| x / y),
                Operator::Mod => zip_with(shape, s, float_mod),
                other => Err(fault(format!("{} with scalar", other.symbol()))),
            }
        }
        Category::MatrixMatrix => {
            let (m, n) = (components(a)?, components(b)?);
            let size = side(m.len())?;
            let mut out = vec![0.0; m.len()];
            for col in 0..size {
                for row in 0..size {
                    out[col * size + row] = (0..size).map(|k| m[k * size + row] * n[col * size + k]).sum();
                }
            }
            rebuild(a, &out)
        }
        Category::MatrixVector => {
            let (m, v) = (components(a)?, components(b)?);
            let size = side(m.len())?;
            let out: Vec<f64> = (0..size)
                .map(|row| (0..size).map(|k| m[k * size + row] * v[k]).sum())
                .collect();
            rebuild(b, &out)
        }
    }
}

fn side(len: usize) -> Result<usize, RuntimeError> {
    match len {
        4 => Ok(2),
        9 => Ok(3),
        16 => Ok(4),
        other => Err(fault(format!("{other} is not a square matrix size"))),
    }
}

fn scalar_arith(operator: Operator, a: &Val, b: &Val) -> Result<Val, RuntimeError> {
    if let (Val::Int(x), Val::Int(y)) = (a, b) {
        let (x, y) = (*x, *y);
        let value = match operator {
            Operator::Add => x.wrapping_add(y),
            Operator::Sub => x.wrapping_sub(y),
            Operator::Mul => x.wrapping_mul(y),
            Operator::Div | Operator::Mod if y == 0 => return Err(RuntimeError::DivisionByZero),
            Operator::Div => x.wrapping_div(y),
            Operator::Mod => x.wrapping_rem_euclid(y),
            other => return Err(fault(format!("{} is not arithmetic", other.symbol()))),
        };
        return Ok(Val::Int(value));
    }

    let (x, y) = (scalar(a)?, scalar(b)?);
    let value = match operator {
        Operator::Add => x + y,
        Operator::Sub => x - y,
        Operator::Mul => x * y,
        Operator::Div => x / y,
        Operator::Mod => float_mod(x, y),
        other => return Err(fault(format!("{} is not arithmetic", other.symbol()))),
    };
    Ok(Val::Float(value))
}

fn compare(operator: Operator, a: &Val, b: &Val) -> Result<Val, RuntimeError> {
    fn holds(operator: Operator, x: f64, y: f64) -> bool {
        match operator {
            Operator::Eq => x == y,
            Operator::Ne => x != y,
            Operator::Lt => x < y,
            Operator::Le => x <= y,
            Operator::Gt => x > y,
            Operator::Ge => x >= y,
            _ => false,
        }
    }

    if !operator.is_comparison() {
        return Err(fault(format!("{} is not a comparison", operator.symbol())));
    }
    let result = match (a, b) {
        (Val::Int(x), Val::Int(y)) => match operator {
            Operator::Eq => x == y,
            Operator::Ne => x != y,
            Operator::Lt => x < y,
            Operator::Le => x <= y,
            Operator::Gt => x > y,
            _ => x >= y,
        },
        _ if a.as_f64().is_some() => holds(operator, scalar(a)?, scalar(b)?),
        _ => {
            let (lhs, rhs) = (components(a)?, components(b)?);
            match operator {
                // вектор не равен, если отличается хотя бы одна компонента
                Operator::Ne => lhs.iter().zip(rhs).any(|(x, y)| x != y),
                _ => lhs.iter().zip(rhs).all(|(x, y)| holds(operator, *x, *y)),
            }
        }
    };
    Ok(Val::Bool(result))
}

/// Унарный минус.
pub fn negate(val: &Val) -> Result<Val, RuntimeError> {
    match val {
        Val::Int(v) => Ok(Val::Int(v.wrapping_neg())),
        other => other
            .map(|x| -x)
            .ok_or_else(|| fault(format!("can not negate {}", other.ty()))),
    }
}

// === Встроенные функции ===

/// Вызвать встроенную функцию. Перегрузка уже проверена компилятором.
pub fn call_builtin(builtin: Builtin, args: &[Val]) -> Result<Val, RuntimeError> {
    match builtin {
        Builtin::Vec2 | Builtin::Vec3 | Builtin::Vec4 | Builtin::Mat2 | Builtin::Mat3 | Builtin::Mat4 => {
            let ty = match builtin {
                Builtin::Vec2 => Type::Vec2,
                Builtin::Vec3 => Type::Vec3,
                Builtin::Vec4 => Type::Vec4,
                Builtin::Mat2 => Type::Mat2,
                Builtin::Mat3 => Type::Mat3,
                _ => Type::Mat4,
            };
            let mut data = Vec::with_capacity(16);
            for arg in args {
                if !arg.flatten_into(&mut data) {
                    return Err(fault(format!("can not use {} in {ty} constructor", arg.ty())));
                }
            }
            Val::from_components(ty, &data)
                .ok_or_else(|| fault(format!("{ty} constructor got {} components", data.len())))
        }
        Builtin::Int => Ok(Val::Int(scalar(arg(args, 0)?)? as i64)),
        Builtin::Float => Ok(Val::Float(scalar(arg(args, 0)?)?)),
        Builtin::Sin => unary_float(args, f64::sin),
        Builtin::Cos => unary_float(args, f64::cos),
        Builtin::Tan => unary_float(args, f64::tan),
        Builtin::Sqrt => unary_float(args, f64::sqrt),
        Builtin::Ceil => unary_float(args, f64::ceil),
        Builtin::Floor => unary_float(args, f64::floor),
        Builtin::Abs => match arg(args, 0)? {
            Val::Int(v) => Ok(Val::Int(v.wrapping_abs())),
            other => other
                .map(f64::abs)
                .ok_or_else(|| fault(format!("abs of {}", other.ty()))),
        },
        Builtin::Length => {
            let v = components(arg(args, 0)?)?;
            Ok(Val::Float(dot(v, v).sqrt()))
        }
        Builtin::Normalize => {
            let value = arg(args, 0)?;
            let v = components(value)?;
            let length = dot(v, v).sqrt();
            if length == 0.0 {
                return Ok(*value);
            }
            value
                .map(|x| x / length)
                .ok_or_else(|| fault("normalize of non-vector"))
        }
        Builtin::Dot => Ok(Val::Float(dot(components(arg(args, 0)?)?, components(arg(args, 1)?)?))),
        Builtin::Min => pairwise(args, f64::min),
        Builtin::Max => pairwise(args, f64::max),
        Builtin::Clamp => {
            let (value, lo, hi) = (arg(args, 0)?, arg(args, 1)?, arg(args, 2)?);
            if let Val::Float(x) = value {
                return Ok(Val::Float(x.max(scalar(lo)?).min(scalar(hi)?)));
            }
            let lower = zip_with(value, lo, f64::max)?;
            zip_with(&lower, hi, f64::min)
        }
    }
}

fn arg(args: &[Val], index: usize) -> Result<&Val, RuntimeError> {
    args.get(index)
        .ok_or_else(|| fault(format!("missing argument {}", index + 1)))
}

fn unary_float(args: &[Val], f: fn(f64) -> f64) -> Result<Val, RuntimeError> {
    Ok(Val::Float(f(scalar(arg(args, 0)?)?)))
}

fn pairwise(args: &[Val], f: fn(f64, f64) -> f64) -> Result<Val, RuntimeError> {
    let (a, b) = (arg(args, 0)?, arg(args, 1)?);
    if let Val::Float(x) = a {
        return Ok(Val::Float(f(*x, scalar(b)?)));
    }
    zip_with(a, b, f)
}
