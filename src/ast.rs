//! Синтаксическое дерево NLSL.
//!
//! Дерево не типизировано: имена типов хранятся так, как они записаны в
//! исходнике, а проверка типов и разрешение имён выполняются компилятором
//! ([`crate::compiler`]). Каждый узел несёт свой [`Span`] для сообщений об ошибках.

use crate::parser::token::Span;

/// Корень: последовательность определений верхнего уровня.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
    pub span: Span,
}

/// Определение верхнего уровня.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Uniform(UniformDecl),
    Function(FunctionDef),
}

/// `uniform <type> <name>;`
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDecl {
    pub type_name: String,
    pub name: String,
    pub span: Span,
}

/// Определение функции.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub return_type: String,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Параметр функции.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub type_name: String,
    pub name: String,
    pub span: Span,
}

/// Инструкция с позицией.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `[type] name = expr`
    Assign(Assignment),
    /// `name++`, `--name`, ...
    Unary(UnaryAssignment),
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    For {
        init: Box<Stmt>,
        condition: Expr,
        iterator: Box<Stmt>,
        body: Vec<Stmt>,
    },
    Return(Option<Expr>),
    Expr(Expr),
}

/// Присваивание. `type_name` задан только у объявления.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub type_name: Option<String>,
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Increment,
    Decrement,
}

impl UnaryOperator {
    /// Бинарный оператор, в который раскрывается `++`/`--`.
    pub fn binary_symbol(self) -> &'static str {
        match self {
            UnaryOperator::Increment => "+",
            UnaryOperator::Decrement => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryAssignment {
    pub name: String,
    pub operator: UnaryOperator,
    pub prefix: bool,
}

/// Выражение с позицией.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(NumberLiteral),
    VarRef(VariableRef),
    /// Бинарное выражение; `operator` хранится как символ (`"*"`, `"<="`, ...).
    Binary {
        operator: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Negate(Box<Expr>),
}

/// Числовой литерал: без десятичной точки это `Int`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberLiteral {
    Int(i64),
    Float(f64),
}

/// Ссылка на переменную с необязательным доступом к колонке и компоненте:
/// `m[1].xy`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef {
    pub name: String,
    pub column: Option<usize>,
    pub component: Option<String>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}
