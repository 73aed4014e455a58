//! Статические таблицы компилятора: операции, компоненты векторов и
//! колонки матриц.
//!
//! Ключ таблицы операций записан в том порядке типов, в котором операция
//! определена. Нестрогие операции дополнительно находятся по сигнатуре с
//! типами в обратном лексическом порядке (`vec > mat > int > float`), поэтому
//! их ключи записываются именно в этом порядке.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::ir::{Category, Operator, Signature};
use crate::types::Type;

/// Правило бинарной операции.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpRule {
    pub category: Category,
    /// Строгая операция находится только при буквальном порядке операндов.
    pub strict: bool,
}

const VECTORS: [Type; 3] = [Type::Vec2, Type::Vec3, Type::Vec4];
const MATRICES: [Type; 3] = [Type::Mat2, Type::Mat3, Type::Mat4];
const SCALARS: [Type; 2] = [Type::Int, Type::Float];
const SCALAR_PAIRS: [(Type, Type); 3] = [
    (Type::Int, Type::Float),
    (Type::Int, Type::Int),
    (Type::Float, Type::Float),
];
const ARITHMETIC: [Operator; 5] = [
    Operator::Add,
    Operator::Sub,
    Operator::Mul,
    Operator::Div,
    Operator::Mod,
];
const COMPARISONS: [Operator; 6] = [
    Operator::Eq,
    Operator::Ne,
    Operator::Lt,
    Operator::Le,
    Operator::Gt,
    Operator::Ge,
];

/// Таблица всех допустимых бинарных операций.
pub static OPERATIONS: LazyLock<HashMap<Signature, OpRule>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    let mut add = |operator, lhs, rhs, category, strict| {
        m.insert(Signature::new(operator, lhs, rhs), OpRule { category, strict });
    };

    for (vector, matrix) in VECTORS.into_iter().zip(MATRICES) {
        add(Operator::Mul, matrix, matrix, Category::MatrixMatrix, false);
        add(Operator::Mul, matrix, vector, Category::MatrixVector, true);
        for scalar in SCALARS {
            add(Operator::Mul, matrix, scalar, Category::MatrixScalar, false);
        }
    }

    for vector in VECTORS {
        for scalar in SCALARS {
            add(Operator::Mul, vector, scalar, Category::VectorScalar, false);
            add(Operator::Add, vector, scalar, Category::VectorScalar, false);
            add(Operator::Sub, vector, scalar, Category::VectorScalar, true);
            add(Operator::Div, vector, scalar, Category::VectorScalar, true);
            add(Operator::Mod, vector, scalar, Category::VectorScalar, true);
        }
        // vec * vec: скалярное произведение
        add(Operator::Mul, vector, vector, Category::VectorVector, false);
        add(Operator::Add, vector, vector, Category::VectorVector, false);
        add(Operator::Sub, vector, vector, Category::VectorVector, true);
        add(Operator::Div, vector, vector, Category::VectorVector, true);
        for operator in COMPARISONS {
            add(operator, vector, vector, Category::Comparison, false);
        }
    }

    for (lhs, rhs) in SCALAR_PAIRS {
        for operator in ARITHMETIC {
            add(operator, lhs, rhs, Category::ScalarArith, false);
        }
        for operator in COMPARISONS {
            add(operator, lhs, rhs, Category::Comparison, false);
        }
    }

    m
});

/// Найти правило для сигнатуры. Сначала ищется буквальный порядок типов,
/// затем обратный лексический, но только среди нестрогих операций.
pub fn resolve_operation(signature: Signature) -> Option<OpRule> {
    if let Some(rule) = OPERATIONS.get(&signature) {
        return Some(*rule);
    }
    OPERATIONS
        .get(&signature.canonical())
        .filter(|rule| !rule.strict)
        .copied()
}

/// Компоненты векторов: результат и типы, к которым компонента применима.
pub static VECTOR_COMPONENTS: LazyLock<HashMap<&'static str, (Type, &'static [Type])>> =
    LazyLock::new(|| {
        let mut m: HashMap<&'static str, (Type, &'static [Type])> = HashMap::new();
        m.insert("x", (Type::Float, &[Type::Vec4, Type::Vec3, Type::Vec2]));
        m.insert("y", (Type::Float, &[Type::Vec4, Type::Vec3, Type::Vec2]));
        m.insert("z", (Type::Float, &[Type::Vec4, Type::Vec3]));
        m.insert("w", (Type::Float, &[Type::Vec4]));
        m.insert("xy", (Type::Vec2, &[Type::Vec4, Type::Vec3]));
        m.insert("xyz", (Type::Vec3, &[Type::Vec4]));
        m
    });

/// Тип компоненты `component` у значения типа `ty`.
pub fn component_type(ty: Type, component: &str) -> Option<Type> {
    VECTOR_COMPONENTS
        .get(component)
        .filter(|(_, valid_on)| valid_on.contains(&ty))
        .map(|(result, _)| *result)
}

/// Индексы компонент вектора, которые выбирает имя компоненты.
pub fn component_indices(component: &str) -> Option<&'static [usize]> {
    match component {
        "x" => Some(&[0]),
        "y" => Some(&[1]),
        "z" => Some(&[2]),
        "w" => Some(&[3]),
        "xy" => Some(&[0, 1]),
        "xyz" => Some(&[0, 1, 2]),
        _ => None,
    }
}

/// Число колонок и тип колонки матрицы.
pub fn matrix_columns(ty: Type) -> Option<(usize, Type)> {
    Some((ty.matrix_size()?, ty.column_type()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Type; 8] = [
        Type::Int,
        Type::Float,
        Type::Vec2,
        Type::Vec3,
        Type::Vec4,
        Type::Mat2,
        Type::Mat3,
        Type::Mat4,
    ];
    const ALL_OPERATORS: [Operator; 11] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Mod,
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
    ];

    #[test]
    fn test_non_strict_operations_resolve_in_any_order() {
        for (signature, rule) in OPERATIONS.iter() {
            if rule.strict {
                continue;
            }
            let swapped = Signature::new(signature.operator, signature.rhs, signature.lhs);
            assert_eq!(resolve_operation(*signature), Some(*rule), "{signature}");
            assert_eq!(resolve_operation(swapped), Some(*rule), "{swapped}");
        }
    }

    #[test]
    fn test_strict_operations_only_in_declared_order() {
        for (signature, rule) in OPERATIONS.iter() {
            if !rule.strict || signature.lhs == signature.rhs {
                continue;
            }
            let swapped = Signature::new(signature.operator, signature.rhs, signature.lhs);
            assert_eq!(resolve_operation(*signature), Some(*rule), "{signature}");
            assert_eq!(resolve_operation(swapped), None, "{swapped}");
        }
    }

    #[test]
    fn test_every_pair_resolves_deterministically() {
        for operator in ALL_OPERATORS {
            for lhs in ALL {
                for rhs in ALL {
                    let signature = Signature::new(operator, lhs, rhs);
                    if let Some(rule) = resolve_operation(signature) {
                        assert_eq!(rule.category == Category::Comparison, operator.is_comparison());
                    }
                }
            }
        }
    }

    #[test]
    fn test_specific_operations() {
        let mat_vec = Signature::new(Operator::Mul, Type::Mat4, Type::Vec4);
        assert_eq!(resolve_operation(mat_vec).map(|r| r.category), Some(Category::MatrixVector));
        let vec_mat = Signature::new(Operator::Mul, Type::Vec4, Type::Mat4);
        assert_eq!(resolve_operation(vec_mat), None);
        let float_minus_vec = Signature::new(Operator::Sub, Type::Float, Type::Vec3);
        assert_eq!(resolve_operation(float_minus_vec), None);
        let float_times_vec = Signature::new(Operator::Mul, Type::Float, Type::Vec3);
        assert_eq!(
            resolve_operation(float_times_vec).map(|r| r.category),
            Some(Category::VectorScalar)
        );
        let mismatched = Signature::new(Operator::Add, Type::Vec2, Type::Vec3);
        assert_eq!(resolve_operation(mismatched), None);
    }

    #[test]
    fn test_components() {
        assert_eq!(component_type(Type::Vec2, "x"), Some(Type::Float));
        assert_eq!(component_type(Type::Vec2, "z"), None);
        assert_eq!(component_type(Type::Vec3, "xy"), Some(Type::Vec2));
        assert_eq!(component_type(Type::Vec4, "xyz"), Some(Type::Vec3));
        assert_eq!(component_type(Type::Vec3, "xyz"), None);
        assert_eq!(component_type(Type::Float, "x"), None);
        assert_eq!(component_type(Type::Vec4, "rgba"), None);
        for component in VECTOR_COMPONENTS.keys() {
            assert!(component_indices(component).is_some());
        }
    }

    #[test]
    fn test_matrix_columns() {
        assert_eq!(matrix_columns(Type::Mat3), Some((3, Type::Vec3)));
        assert_eq!(matrix_columns(Type::Vec3), None);
    }
}
