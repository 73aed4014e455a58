//! Промежуточное представление (IR) шейдера.
//!
//! В отличие от синтаксического дерева IR полностью типизирован: тип каждого
//! узла известен в момент его создания и больше не меняется. IR строится
//! компилятором ([`crate::compiler`]) и потребляется генераторами кода
//! ([`crate::codegen`]).

pub mod program;
pub mod scope;

pub use program::{Program, Uniform};
pub use scope::{ScopeArena, ScopeError, ScopeId};

use std::fmt;

use crate::types::{join_types, Type};

// === Значения ===

/// Числовой литерал.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
}

/// Содержимое [`Value`]: литерал или ссылка на переменную.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Literal(Literal),
    Reference(String),
}

/// Типизированный литерал или ссылка на переменную. Дочерних узлов нет.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub ty: Type,
    pub value: ValueKind,
}

impl Value {
    pub fn int(value: i64) -> Self {
        Self {
            ty: Type::Int,
            value: ValueKind::Literal(Literal::Int(value)),
        }
    }

    pub fn float(value: f64) -> Self {
        Self {
            ty: Type::Float,
            value: ValueKind::Literal(Literal::Float(value)),
        }
    }

    pub fn reference(name: impl Into<String>, ty: Type) -> Self {
        Self {
            ty,
            value: ValueKind::Reference(name.into()),
        }
    }

    /// Флаг `ref`: значение ссылается на переменную.
    pub fn is_ref(&self) -> bool {
        matches!(self.value, ValueKind::Reference(_))
    }

    /// Имя переменной, если это ссылка.
    pub fn name(&self) -> Option<&str> {
        match &self.value {
            ValueKind::Reference(name) => Some(name),
            ValueKind::Literal(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            ValueKind::Literal(Literal::Int(v)) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            ValueKind::Literal(Literal::Float(v)) => Some(v),
            _ => None,
        }
    }
}

/// Доступ к компоненте вектора: `v.xy`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentAccess {
    pub ty: Type,
    pub value: Box<Expr>,
    pub component: String,
}

/// Доступ к колонке матрицы: `m[1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixColumnAccess {
    pub ty: Type,
    pub value: Box<Expr>,
    pub index: usize,
}

// === Операции ===

/// Категория бинарной операции. Определяет тип результата.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    ScalarArith,
    VectorVector,
    VectorScalar,
    MatrixMatrix,
    MatrixVector,
    MatrixScalar,
    Comparison,
}

/// Оператор в исходном коде.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            "%" => Operator::Mod,
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Eq | Operator::Ne | Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge
        )
    }
}

/// Сигнатура операции в порядке операндов из исходника: `"* mat4 vec4"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub operator: Operator,
    pub lhs: Type,
    pub rhs: Type,
}

impl Signature {
    pub fn new(operator: Operator, lhs: Type, rhs: Type) -> Self {
        Self { operator, lhs, rhs }
    }

    /// Та же сигнатура с типами в обратном лексическом порядке.
    pub fn canonical(self) -> Self {
        if self.lhs.name() >= self.rhs.name() {
            self
        } else {
            Self::new(self.operator, self.rhs, self.lhs)
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.operator.symbol(), self.lhs, self.rhs)
    }
}

/// Бинарная операция. Операции категории [`Category::Comparison`] являются
/// условиями и имеют тип `bool`.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub category: Category,
    pub a: Box<Expr>,
    pub b: Box<Expr>,
    pub signature: Signature,
}

impl Operation {
    pub fn operator(&self) -> Operator {
        self.signature.operator
    }

    /// Тип результата выводится из категории и сигнатуры.
    pub fn ty(&self) -> Type {
        let Signature { operator, lhs, rhs } = self.signature;
        match self.category {
            Category::ScalarArith => {
                if lhs == Type::Float || rhs == Type::Float {
                    Type::Float
                } else {
                    Type::Int
                }
            }
            Category::VectorVector if operator == Operator::Mul => Type::Float,
            Category::VectorVector | Category::MatrixMatrix => lhs,
            Category::VectorScalar => pick(lhs, rhs, Type::is_vector),
            Category::MatrixScalar => pick(lhs, rhs, Type::is_matrix),
            Category::MatrixVector => pick(lhs, rhs, Type::is_vector),
            Category::Comparison => Type::Bool,
        }
    }

    pub fn is_condition(&self) -> bool {
        self.category == Category::Comparison
    }
}

fn pick(lhs: Type, rhs: Type, predicate: fn(Type) -> bool) -> Type {
    if predicate(lhs) {
        lhs
    } else {
        rhs
    }
}

/// Вызов функции с уже разрешённой перегрузкой.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub ty: Type,
}

impl FunctionCall {
    /// Сигнатура аргументов места вызова: `"vec2, float"`.
    pub fn arg_signature(&self) -> String {
        join_types(self.args.iter().map(Expr::ty))
    }
}

/// Выражение IR.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Value(Value),
    ComponentAccess(ComponentAccess),
    MatrixColumnAccess(MatrixColumnAccess),
    Operation(Operation),
    /// Унарный минус; тип совпадает с типом операнда.
    Negate(Box<Expr>),
    FunctionCall(FunctionCall),
}

impl Expr {
    pub fn ty(&self) -> Type {
        match self {
            Expr::Value(v) => v.ty,
            Expr::ComponentAccess(c) => c.ty,
            Expr::MatrixColumnAccess(m) => m.ty,
            Expr::Operation(op) => op.ty(),
            Expr::Negate(inner) => inner.ty(),
            Expr::FunctionCall(call) => call.ty,
        }
    }

    /// Является ли выражение условием (операцией сравнения).
    pub fn is_condition(&self) -> bool {
        matches!(self, Expr::Operation(op) if op.is_condition())
    }

    /// Есть ли в поддереве значение, удовлетворяющее предикату.
    pub fn any_value(&self, predicate: &mut dyn FnMut(&Value) -> bool) -> bool {
        match self {
            Expr::Value(v) => predicate(v),
            Expr::ComponentAccess(c) => c.value.any_value(predicate),
            Expr::MatrixColumnAccess(m) => m.value.any_value(predicate),
            Expr::Operation(op) => op.a.any_value(predicate) || op.b.any_value(predicate),
            Expr::Negate(inner) => inner.any_value(predicate),
            Expr::FunctionCall(call) => call.args.iter().any(|a| a.any_value(predicate)),
        }
    }
}

// === Инструкции ===

/// Присваивание. `initial` истинно только для объявления с явным типом.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableAssignment {
    pub name: String,
    pub value: Expr,
    pub initial: bool,
}

impl VariableAssignment {
    pub fn is_initial_declaration(&self) -> bool {
        self.initial
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Expr,
    pub then_body: Vec<Statement>,
    pub else_body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub init: Box<Statement>,
    pub condition: Expr,
    pub iterator: Box<Statement>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: Expr,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub value: Option<Expr>,
}

/// Инструкция IR.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assignment(VariableAssignment),
    If(If),
    For(For),
    While(While),
    Return(Return),
    Expression(Expr),
}

impl Statement {
    /// Есть ли в инструкции (рекурсивно) значение, удовлетворяющее предикату.
    pub fn any_value(&self, predicate: &mut dyn FnMut(&Value) -> bool) -> bool {
        let any_in = |body: &[Statement], predicate: &mut dyn FnMut(&Value) -> bool| {
            body.iter().any(|s| s.any_value(predicate))
        };
        match self {
            Statement::Assignment(a) => a.value.any_value(predicate),
            Statement::If(node) => {
                node.condition.any_value(predicate)
                    || any_in(&node.then_body, predicate)
                    || any_in(&node.else_body, predicate)
            }
            Statement::For(node) => {
                node.init.any_value(predicate)
                    || node.condition.any_value(predicate)
                    || node.iterator.any_value(predicate)
                    || any_in(&node.body, predicate)
            }
            Statement::While(node) => {
                node.condition.any_value(predicate) || any_in(&node.body, predicate)
            }
            Statement::Return(ret) => ret
                .value
                .as_ref()
                .is_some_and(|v| v.any_value(predicate)),
            Statement::Expression(expr) => expr.any_value(predicate),
        }
    }

    /// Присваивает ли инструкция (рекурсивно) переменной с этим именем.
    pub fn assigns(&self, name: &str) -> bool {
        let in_body = |body: &[Statement]| body.iter().any(|s| s.assigns(name));
        match self {
            Statement::Assignment(a) => a.name == name,
            Statement::If(node) => in_body(&node.then_body) || in_body(&node.else_body),
            Statement::For(node) => {
                node.init.assigns(name) || node.iterator.assigns(name) || in_body(&node.body)
            }
            Statement::While(node) => in_body(&node.body),
            Statement::Return(_) | Statement::Expression(_) => false,
        }
    }
}

// === Функции ===

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

/// Функция: пользовательская или встроенная (без тела).
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: Type,
    pub body: Vec<Statement>,
    pub builtin: bool,
}

impl Function {
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// Сигнатура параметров для разрешения перегрузок: `"vec2, float"`.
    pub fn param_signature(&self) -> String {
        join_types(self.params.iter().map(|p| p.ty))
    }

    /// Полная сигнатура для сообщений: `"vec3 = f(vec2, float)"`.
    pub fn signature(&self) -> String {
        format!("{} = f({})", self.return_type, self.param_signature())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(category: Category, operator: Operator, lhs: Type, rhs: Type) -> Operation {
        Operation {
            category,
            a: Box::new(Expr::Value(Value::reference("a", lhs))),
            b: Box::new(Expr::Value(Value::reference("b", rhs))),
            signature: Signature::new(operator, lhs, rhs),
        }
    }

    #[test]
    fn test_operation_result_types() {
        assert_eq!(op(Category::ScalarArith, Operator::Add, Type::Int, Type::Int).ty(), Type::Int);
        assert_eq!(op(Category::ScalarArith, Operator::Div, Type::Int, Type::Float).ty(), Type::Float);
        assert_eq!(op(Category::VectorVector, Operator::Mul, Type::Vec3, Type::Vec3).ty(), Type::Float);
        assert_eq!(op(Category::VectorVector, Operator::Add, Type::Vec3, Type::Vec3).ty(), Type::Vec3);
        assert_eq!(op(Category::VectorScalar, Operator::Mul, Type::Float, Type::Vec2).ty(), Type::Vec2);
        assert_eq!(op(Category::MatrixVector, Operator::Mul, Type::Mat4, Type::Vec4).ty(), Type::Vec4);
        assert_eq!(op(Category::MatrixScalar, Operator::Mul, Type::Int, Type::Mat3).ty(), Type::Mat3);
        assert_eq!(op(Category::Comparison, Operator::Lt, Type::Int, Type::Float).ty(), Type::Bool);
    }

    #[test]
    fn test_signature_display_and_canonical() {
        let sig = Signature::new(Operator::Mul, Type::Float, Type::Vec3);
        assert_eq!(sig.to_string(), "* float vec3");
        assert_eq!(sig.canonical().to_string(), "* vec3 float");
        let sig = Signature::new(Operator::Sub, Type::Int, Type::Float);
        assert_eq!(sig.canonical().to_string(), "- int float");
    }

    #[test]
    fn test_value_ref_flag() {
        assert!(!Value::int(42).is_ref());
        assert_eq!(Value::int(42).as_int(), Some(42));
        let r = Value::reference("foo", Type::Float);
        assert!(r.is_ref());
        assert_eq!(r.name(), Some("foo"));
    }

    #[test]
    fn test_function_signatures() {
        let f = Function {
            name: "vec3".to_string(),
            params: vec![
                Parameter { name: "xy".to_string(), ty: Type::Vec2 },
                Parameter { name: "z".to_string(), ty: Type::Float },
            ],
            return_type: Type::Vec3,
            body: Vec::new(),
            builtin: true,
        };
        assert_eq!(f.param_signature(), "vec2, float");
        assert_eq!(f.signature(), "vec3 = f(vec2, float)");
    }
}
