//! Семантический компилятор NLSL.
//!
//! Обходит синтаксическое дерево ([`crate::ast`]), разрешает области
//! видимости, выводит типы, разрешает операторы и перегрузки функций и строит
//! типизированную программу [`crate::ir::Program`]. Любое семантическое
//! нарушение прерывает компиляцию с [`CompilerError`], несущей позицию узла.
//!
//! Перед обходом пользовательского кода программа заполняется встроенными
//! uniform для вида шейдера ([`ShaderKind`]) и встроенными функциями.
//!
//! # Правила продвижения чисел
//!
//! Операторы продвигают `int` до `float` (`1 + 2.0` имеет тип `float`), а
//! связывания (объявление, присваивание, `return`, аргументы вызова) требуют
//! точного совпадения типов: `float x = 1;` является ошибкой.

pub mod builtins;
pub mod error;
pub mod tables;

pub use builtins::{Builtin, ShaderKind, UnknownShaderKind, BUILTIN_FUNCTIONS};
pub use error::{CompileResult, CompilerError, CompilerErrorKind};

use log::{debug, trace};

use crate::ast::{self, ExprKind, Item, NumberLiteral, StmtKind};
use crate::ir::{
    Category, ComponentAccess, Expr, For, Function, FunctionCall, If, Literal,
    MatrixColumnAccess, Operation, Operator, Parameter, Program, Return, ScopeId, Signature,
    Statement, Uniform, Value, ValueKind, VariableAssignment, While,
};
use crate::parser::token::Span;
use crate::types::{join_types, Type};

/// Скомпилировать синтаксическое дерево в IR для шейдера вида `kind`.
pub fn compile(program: &ast::Program, kind: ShaderKind) -> CompileResult<Program> {
    Transformer::new(kind).transform(program)
}

/// Функция, тело которой сейчас компилируется.
struct FunctionContext<'a> {
    name: &'a str,
    return_type: Type,
}

/// Преобразователь синтаксического дерева в IR.
#[derive(Debug, Clone, Copy)]
pub struct Transformer {
    kind: ShaderKind,
}

impl Transformer {
    pub fn new(kind: ShaderKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    /// Построить программу IR.
    pub fn transform(&self, root: &ast::Program) -> CompileResult<Program> {
        let mut program = Program::new(self.kind);
        for (name, ty) in self.kind.builtin_uniforms() {
            let uniform = Uniform {
                name: name.to_string(),
                ty: *ty,
            };
            program
                .register_uniform(uniform)
                .map_err(|e| CompilerError::new(e, root.span))?;
        }
        for function in BUILTIN_FUNCTIONS.iter() {
            program.register_function(function.clone());
        }

        for item in &root.items {
            match item {
                Item::Uniform(decl) => self.transform_uniform(decl, &mut program)?,
                Item::Function(def) => self.transform_function(def, &mut program)?,
            }
        }

        debug!(
            "compiled {} shader: {} uniforms, {} user functions",
            self.kind,
            program.uniforms.len(),
            program.user_functions().count()
        );
        Ok(program)
    }

    fn transform_uniform(&self, decl: &ast::UniformDecl, program: &mut Program) -> CompileResult<()> {
        let ty = declarable_type(&decl.type_name, decl.span)?;
        if program.uniforms.contains_key(&decl.name) {
            return Err(CompilerError::new(
                CompilerErrorKind::DuplicateUniform(decl.name.clone()),
                decl.span,
            ));
        }
        trace!("uniform {} {}", ty, decl.name);
        program
            .register_uniform(Uniform {
                name: decl.name.clone(),
                ty,
            })
            .map_err(|e| CompilerError::new(e, decl.span))
    }

    fn transform_function(&self, def: &ast::FunctionDef, program: &mut Program) -> CompileResult<()> {
        let return_type = parse_type(&def.return_type, def.span)?;
        if return_type == Type::Bool {
            return Err(CompilerError::new(CompilerErrorKind::NotDeclarable(return_type), def.span));
        }

        let scope = program.scopes.branch(program.root());
        let mut params = Vec::with_capacity(def.params.len());
        for param in &def.params {
            let ty = declarable_type(&param.type_name, param.span)?;
            if program.scopes.contains_local(scope, &param.name) {
                return Err(CompilerError::new(
                    CompilerErrorKind::Redeclaration(param.name.clone()),
                    param.span,
                ));
            }
            program
                .scopes
                .register(scope, &param.name, ty)
                .map_err(|e| CompilerError::new(e, param.span))?;
            params.push(Parameter {
                name: param.name.clone(),
                ty,
            });
        }

        let context = FunctionContext {
            name: &def.name,
            return_type,
        };
        let body = self.transform_block(&def.body, scope, program, &context)?;

        let function = Function {
            name: def.name.clone(),
            params,
            return_type,
            body,
            builtin: false,
        };
        let signature = function.param_signature();
        if program.find_function(&function.name, &signature).is_some() {
            return Err(CompilerError::new(
                CompilerErrorKind::DuplicateFunction {
                    name: function.name,
                    signature,
                },
                def.span,
            ));
        }
        trace!("function {}", function.signature());
        program.register_function(function);
        Ok(())
    }

    fn transform_block(
        &self,
        body: &[ast::Stmt],
        scope: ScopeId,
        program: &mut Program,
        context: &FunctionContext<'_>,
    ) -> CompileResult<Vec<Statement>> {
        body.iter()
            .map(|stmt| self.transform_statement(stmt, scope, program, context))
            .collect()
    }

    fn transform_statement(
        &self,
        stmt: &ast::Stmt,
        scope: ScopeId,
        program: &mut Program,
        context: &FunctionContext<'_>,
    ) -> CompileResult<Statement> {
        stacker::maybe_grow(64 * 1024, 1024 * 1024, || match &stmt.kind {
            StmtKind::Assign(assignment) => {
                self.transform_assignment(assignment, stmt.span, scope, program)
            }
            StmtKind::Unary(unary) => self.transform_unary(unary, stmt.span, scope, program),
            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                let condition = self.transform_condition(condition, scope, program)?;
                let then_scope = program.scopes.branch(scope);
                let then_body = self.transform_block(then_body, then_scope, program, context)?;
                let else_body = match else_body {
                    Some(body) => {
                        let else_scope = program.scopes.branch(scope);
                        self.transform_block(body, else_scope, program, context)?
                    }
                    None => Vec::new(),
                };
                Ok(Statement::If(If {
                    condition,
                    then_body,
                    else_body,
                }))
            }
            StmtKind::While { condition, body } => {
                let condition = self.transform_condition(condition, scope, program)?;
                let body_scope = program.scopes.branch(scope);
                let body = self.transform_block(body, body_scope, program, context)?;
                Ok(Statement::While(While { condition, body }))
            }
            StmtKind::For {
                init,
                condition,
                iterator,
                body,
            } => {
                let for_scope = program.scopes.branch(scope);
                let init = self.transform_statement(init, for_scope, program, context)?;
                let condition = self.transform_condition(condition, for_scope, program)?;
                let iterator = self.transform_statement(iterator, for_scope, program, context)?;
                let body = self.transform_block(body, for_scope, program, context)?;
                Ok(Statement::For(For {
                    init: Box::new(init),
                    condition,
                    iterator: Box::new(iterator),
                    body,
                }))
            }
            StmtKind::Return(value) => self.transform_return(value.as_ref(), stmt.span, scope, program, context),
            StmtKind::Expr(expr) => Ok(Statement::Expression(self.transform_expr(expr, scope, program)?)),
        })
    }

    fn transform_assignment(
        &self,
        assignment: &ast::Assignment,
        span: Span,
        scope: ScopeId,
        program: &mut Program,
    ) -> CompileResult<Statement> {
        let name = &assignment.name;
        let value = self.transform_expr(&assignment.value, scope, program)?;
        let found = value.ty();

        let initial = match &assignment.type_name {
            Some(type_name) => {
                let expected = declarable_type(type_name, span)?;
                if found != expected {
                    return Err(type_mismatch(name, expected, found, span));
                }
                if program.scopes.contains_local(scope, name) {
                    return Err(CompilerError::new(
                        CompilerErrorKind::Redeclaration(name.clone()),
                        span,
                    ));
                }
                program
                    .scopes
                    .register(scope, name, expected)
                    .map_err(|e| CompilerError::new(e, span))?;
                true
            }
            None => {
                let expected = program.scopes.get(scope, name).ok_or_else(|| {
                    CompilerError::new(CompilerErrorKind::UnknownVariable(name.clone()), span)
                })?;
                if found != expected {
                    return Err(type_mismatch(name, expected, found, span));
                }
                false
            }
        };

        Ok(Statement::Assignment(VariableAssignment {
            name: name.clone(),
            value,
            initial,
        }))
    }

    /// `x++` раскрывается в `x = x + 1`.
    fn transform_unary(
        &self,
        unary: &ast::UnaryAssignment,
        span: Span,
        scope: ScopeId,
        program: &mut Program,
    ) -> CompileResult<Statement> {
        let name = &unary.name;
        let ty = program.scopes.get(scope, name).ok_or_else(|| {
            CompilerError::new(CompilerErrorKind::UnknownVariable(name.clone()), span)
        })?;
        if !ty.is_scalar() {
            return Err(CompilerError::new(
                CompilerErrorKind::NonScalarUnary {
                    name: name.clone(),
                    ty,
                },
                span,
            ));
        }

        let operator = match unary.operator {
            ast::UnaryOperator::Increment => Operator::Add,
            ast::UnaryOperator::Decrement => Operator::Sub,
        };
        let value = Expr::Operation(Operation {
            category: Category::ScalarArith,
            a: Box::new(Expr::Value(Value::reference(name.clone(), ty))),
            b: Box::new(Expr::Value(Value::int(1))),
            signature: Signature::new(operator, ty, Type::Int),
        });

        Ok(Statement::Assignment(VariableAssignment {
            name: name.clone(),
            value,
            initial: false,
        }))
    }

    fn transform_return(
        &self,
        value: Option<&ast::Expr>,
        span: Span,
        scope: ScopeId,
        program: &mut Program,
        context: &FunctionContext<'_>,
    ) -> CompileResult<Statement> {
        let value = value
            .map(|expr| self.transform_expr(expr, scope, program))
            .transpose()?;
        let found = value.as_ref().map_or(Type::Void, Expr::ty);

        if found != context.return_type {
            let kind = if value.is_none() {
                CompilerErrorKind::MissingReturnValue {
                    function: context.name.to_string(),
                    expected: context.return_type,
                }
            } else {
                CompilerErrorKind::ReturnTypeMismatch {
                    function: context.name.to_string(),
                    expected: context.return_type,
                    found,
                }
            };
            return Err(CompilerError::new(kind, span));
        }

        Ok(Statement::Return(Return { value }))
    }

    fn transform_condition(
        &self,
        expr: &ast::Expr,
        scope: ScopeId,
        program: &mut Program,
    ) -> CompileResult<Expr> {
        let condition = self.transform_expr(expr, scope, program)?;
        if !condition.is_condition() {
            return Err(CompilerError::new(CompilerErrorKind::NotACondition, expr.span));
        }
        Ok(condition)
    }

    /// Выражения не объявляют переменных, поэтому область не меняется.
    pub fn transform_expr(
        &self,
        expr: &ast::Expr,
        scope: ScopeId,
        program: &mut Program,
    ) -> CompileResult<Expr> {
        stacker::maybe_grow(64 * 1024, 1024 * 1024, || match &expr.kind {
            ExprKind::Number(NumberLiteral::Int(v)) => Ok(Expr::Value(Value::int(*v))),
            ExprKind::Number(NumberLiteral::Float(v)) => Ok(Expr::Value(Value::float(*v))),
            ExprKind::VarRef(var) => transform_varref(var, expr.span, scope, program),
            ExprKind::Binary { operator, lhs, rhs } => {
                let a = self.transform_expr(lhs, scope, program)?;
                let b = self.transform_expr(rhs, scope, program)?;
                binary_operation(operator, a, b, expr.span)
            }
            ExprKind::Call { name, args } => self.transform_call(name, args, expr.span, scope, program),
            ExprKind::Negate(inner) => {
                let value = self.transform_expr(inner, scope, program)?;
                negate(value, expr.span)
            }
        })
    }

    fn transform_call(
        &self,
        name: &str,
        args: &[ast::Expr],
        span: Span,
        scope: ScopeId,
        program: &mut Program,
    ) -> CompileResult<Expr> {
        if program.candidates(name).is_empty() {
            return Err(CompilerError::new(
                CompilerErrorKind::UnknownFunction(name.to_string()),
                span,
            ));
        }

        let args = args
            .iter()
            .map(|arg| self.transform_expr(arg, scope, program))
            .collect::<CompileResult<Vec<_>>>()?;
        let signature = join_types(args.iter().map(Expr::ty));

        let Some(function) = program.find_function(name, &signature) else {
            let candidates = program
                .candidates(name)
                .iter()
                .map(|f| format!("{}({})", name, f.param_signature()))
                .collect();
            return Err(CompilerError::new(
                CompilerErrorKind::NoMatchingOverload {
                    name: name.to_string(),
                    signature,
                    candidates,
                },
                span,
            ));
        };

        Ok(Expr::FunctionCall(FunctionCall {
            name: name.to_string(),
            args,
            ty: function.return_type,
        }))
    }
}

fn parse_type(name: &str, span: Span) -> CompileResult<Type> {
    name.parse::<Type>().map_err(|e| CompilerError::new(e, span))
}

fn declarable_type(name: &str, span: Span) -> CompileResult<Type> {
    let ty = parse_type(name, span)?;
    if !ty.is_declarable() {
        return Err(CompilerError::new(CompilerErrorKind::NotDeclarable(ty), span));
    }
    Ok(ty)
}

fn type_mismatch(name: &str, expected: Type, found: Type, span: Span) -> CompilerError {
    CompilerError::new(
        CompilerErrorKind::TypeMismatch {
            name: name.to_string(),
            expected,
            found,
        },
        span,
    )
}

fn transform_varref(
    var: &ast::VariableRef,
    span: Span,
    scope: ScopeId,
    program: &Program,
) -> CompileResult<Expr> {
    let mut ty = program.scopes.get(scope, &var.name).ok_or_else(|| {
        CompilerError::new(CompilerErrorKind::UnknownVariable(var.name.clone()), span)
    })?;
    let mut result = Expr::Value(Value::reference(var.name.clone(), ty));

    if let Some(index) = var.column {
        let (columns, column_type) = tables::matrix_columns(ty)
            .ok_or_else(|| CompilerError::new(CompilerErrorKind::NotAMatrix(ty), span))?;
        if index >= columns {
            return Err(CompilerError::new(
                CompilerErrorKind::ColumnOutOfBounds { index, columns, ty },
                span,
            ));
        }
        ty = column_type;
        result = Expr::MatrixColumnAccess(MatrixColumnAccess {
            ty,
            value: Box::new(result),
            index,
        });
    }

    if let Some(component) = &var.component {
        let component_type = tables::component_type(ty, component).ok_or_else(|| {
            CompilerError::new(
                CompilerErrorKind::InvalidComponent {
                    ty,
                    component: component.clone(),
                },
                span,
            )
        })?;
        result = Expr::ComponentAccess(ComponentAccess {
            ty: component_type,
            value: Box::new(result),
            component: component.clone(),
        });
    }

    Ok(result)
}

/// Разрешить бинарный оператор по таблице операций. Узел сохраняет
/// буквальный порядок операндов и сигнатуру.
fn binary_operation(symbol: &str, a: Expr, b: Expr, span: Span) -> CompileResult<Expr> {
    let operator = Operator::from_symbol(symbol).ok_or_else(|| {
        CompilerError::new(CompilerErrorKind::InvalidOperation(symbol.to_string()), span)
    })?;
    let signature = Signature::new(operator, a.ty(), b.ty());
    let rule = tables::resolve_operation(signature).ok_or_else(|| {
        CompilerError::new(CompilerErrorKind::InvalidOperation(signature.to_string()), span)
    })?;

    Ok(Expr::Operation(Operation {
        category: rule.category,
        a: Box::new(a),
        b: Box::new(b),
        signature,
    }))
}

/// Унарный минус. Минус перед числовым литералом сворачивается в литерал.
fn negate(value: Expr, span: Span) -> CompileResult<Expr> {
    let ty = value.ty();
    if let Expr::Value(Value {
        value: ValueKind::Literal(literal),
        ..
    }) = &value
    {
        let folded = match *literal {
            Literal::Int(v) => Value::int(v.wrapping_neg()),
            Literal::Float(v) => Value::float(-v),
        };
        return Ok(Expr::Value(folded));
    }
    if !(ty.is_scalar() || ty.is_vector() || ty.is_matrix()) {
        return Err(CompilerError::new(
            CompilerErrorKind::InvalidOperation(format!("- {ty}")),
            span,
        ));
    }
    Ok(Expr::Negate(Box::new(value)))
}
