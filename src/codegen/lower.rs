//! Понижение IR в исполняемый [`Shader`].
//!
//! Имена переменных заменяются на слоты: параметры и локальные переменные
//! нумеруются в кадре функции, uniform - в таблице шейдера. Вложенные блоки
//! повторяют области видимости компилятора, поэтому затенение работает так же.

use std::collections::HashMap;

use log::debug;

use crate::compiler::{tables, Builtin};
use crate::ir::{Expr, Function, Literal, Program, Statement, ValueKind};
use crate::runtime::code::{Code, CompiledFunction, Instr, Place};
use crate::runtime::{Shader, UniformSlot, Val};
use crate::types::Type;

use super::{Backend, CodegenError};

/// Генератор исполняемого артефакта.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowerBackend;

impl Backend for LowerBackend {
    type Artifact = Shader;

    fn name(&self) -> &'static str {
        "lower"
    }

    fn generate(&self, program: &Program) -> Result<Shader, CodegenError> {
        let slots: Vec<UniformSlot> = program
            .uniforms
            .values()
            .map(|u| UniformSlot {
                name: u.name.clone(),
                ty: u.ty,
                builtin: program.kind.is_builtin_uniform(&u.name),
            })
            .collect();
        let uniforms: HashMap<String, usize> = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.name.clone(), i))
            .collect();

        let user: Vec<&Function> = program.user_functions().collect();
        let functions: HashMap<(String, String), usize> = user
            .iter()
            .enumerate()
            .map(|(i, f)| ((f.name.clone(), f.param_signature()), i))
            .collect();

        let main = program.main().ok_or(CodegenError::MissingEntryPoint)?;
        let entry = functions
            .get(&(main.name.clone(), main.param_signature()))
            .copied()
            .ok_or(CodegenError::MissingEntryPoint)?;

        let compiled = user
            .iter()
            .map(|f| FunctionLowering::new(&uniforms, &functions).lower(f))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "lowered {} shader: {} uniform slots, {} functions",
            program.kind,
            slots.len(),
            compiled.len()
        );
        Ok(Shader::new(program.kind, slots, compiled, entry))
    }
}

/// Состояние понижения одной функции.
struct FunctionLowering<'a> {
    uniforms: &'a HashMap<String, usize>,
    functions: &'a HashMap<(String, String), usize>,
    frames: Vec<HashMap<String, usize>>,
    next_slot: usize,
}

impl<'a> FunctionLowering<'a> {
    fn new(
        uniforms: &'a HashMap<String, usize>,
        functions: &'a HashMap<(String, String), usize>,
    ) -> Self {
        Self {
            uniforms,
            functions,
            frames: vec![HashMap::new()],
            next_slot: 0,
        }
    }

    fn lower(mut self, function: &Function) -> Result<CompiledFunction, CodegenError> {
        for param in &function.params {
            self.declare(&param.name);
        }
        let body = self.lower_block(&function.body)?;
        Ok(CompiledFunction {
            name: function.name.clone(),
            arity: function.params.len(),
            locals: self.next_slot,
            returns_value: function.return_type != Type::Void,
            body,
        })
    }

    /// Новый слот в текущем блоке. Слоты не переиспользуются.
    fn declare(&mut self, name: &str) -> Place {
        let slot = self.next_slot;
        self.next_slot += 1;
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), slot);
        }
        Place::Local(slot)
    }

    fn resolve(&self, name: &str) -> Result<Place, CodegenError> {
        if let Some(slot) = self.frames.iter().rev().find_map(|f| f.get(name)) {
            return Ok(Place::Local(*slot));
        }
        self.uniforms
            .get(name)
            .map(|i| Place::Uniform(*i))
            .ok_or_else(|| CodegenError::UnresolvedReference(name.to_string()))
    }

    fn scoped<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CodegenError>,
    ) -> Result<T, CodegenError> {
        self.frames.push(HashMap::new());
        let result = f(self);
        self.frames.pop();
        result
    }

    fn lower_block(&mut self, body: &[Statement]) -> Result<Vec<Instr>, CodegenError> {
        body.iter().map(|s| self.lower_statement(s)).collect()
    }

    fn lower_statement(&mut self, statement: &Statement) -> Result<Instr, CodegenError> {
        match statement {
            Statement::Assignment(assignment) => {
                let value = self.lower_expr(&assignment.value)?;
                let place = if assignment.initial {
                    self.declare(&assignment.name)
                } else {
                    self.resolve(&assignment.name)?
                };
                Ok(Instr::Store(place, value))
            }
            Statement::If(node) => {
                let condition = self.lower_expr(&node.condition)?;
                let then_body = self.scoped(|l| l.lower_block(&node.then_body))?;
                let else_body = self.scoped(|l| l.lower_block(&node.else_body))?;
                Ok(Instr::If {
                    condition,
                    then_body,
                    else_body,
                })
            }
            Statement::While(node) => {
                let condition = self.lower_expr(&node.condition)?;
                let body = self.scoped(|l| l.lower_block(&node.body))?;
                Ok(Instr::Loop {
                    init: None,
                    condition,
                    iterator: None,
                    body,
                })
            }
            Statement::For(node) => self.scoped(|l| {
                let init = l.lower_statement(&node.init)?;
                let condition = l.lower_expr(&node.condition)?;
                let iterator = l.lower_statement(&node.iterator)?;
                let body = l.lower_block(&node.body)?;
                Ok(Instr::Loop {
                    init: Some(Box::new(init)),
                    condition,
                    iterator: Some(Box::new(iterator)),
                    body,
                })
            }),
            Statement::Return(ret) => {
                let value = ret.value.as_ref().map(|e| self.lower_expr(e)).transpose()?;
                Ok(Instr::Return(value))
            }
            Statement::Expression(expr) => Ok(Instr::Eval(self.lower_expr(expr)?)),
        }
    }

    fn lower_expr(&mut self, expr: &Expr) -> Result<Code, CodegenError> {
        stacker::maybe_grow(64 * 1024, 1024 * 1024, || match expr {
            Expr::Value(value) => match &value.value {
                ValueKind::Literal(Literal::Int(v)) => Ok(Code::Const(Val::Int(*v))),
                ValueKind::Literal(Literal::Float(v)) => Ok(Code::Const(Val::Float(*v))),
                ValueKind::Reference(name) => Ok(Code::Load(self.resolve(name)?)),
            },
            Expr::ComponentAccess(access) => {
                let indices = tables::component_indices(&access.component)
                    .ok_or_else(|| CodegenError::UnknownComponent(access.component.clone()))?;
                Ok(Code::Component {
                    value: Box::new(self.lower_expr(&access.value)?),
                    indices,
                })
            }
            Expr::MatrixColumnAccess(access) => Ok(Code::Column {
                value: Box::new(self.lower_expr(&access.value)?),
                index: access.index,
            }),
            Expr::Operation(op) => Ok(Code::Binary {
                category: op.category,
                operator: op.operator(),
                a: Box::new(self.lower_expr(&op.a)?),
                b: Box::new(self.lower_expr(&op.b)?),
            }),
            Expr::Negate(inner) => Ok(Code::Negate(Box::new(self.lower_expr(inner)?))),
            Expr::FunctionCall(call) => {
                let args = call
                    .args
                    .iter()
                    .map(|a| self.lower_expr(a))
                    .collect::<Result<Vec<_>, _>>()?;
                let signature = call.arg_signature();
                if let Some(function) = self.functions.get(&(call.name.clone(), signature.clone())) {
                    return Ok(Code::Call {
                        function: *function,
                        args,
                    });
                }
                match Builtin::from_name(&call.name) {
                    Some(builtin) => Ok(Code::Builtin { builtin, args }),
                    None => Err(CodegenError::UnresolvedFunction(format!(
                        "{}({})",
                        call.name, signature
                    ))),
                }
            }
        })
    }
}
