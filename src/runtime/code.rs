//! Исполняемое представление шейдера и его интерпретатор.
//!
//! Код получается понижением IR ([`crate::codegen::lower`]): имена
//! переменных заменены на индексы слотов, перегрузки на индексы функций,
//! а встроенные функции на [`Builtin`]. Типы уже проверены, поэтому
//! интерпретатор не делает повторной проверки, а несоответствие значений
//! считается внутренней ошибкой ([`RuntimeError::TypeFault`]).

use crate::compiler::Builtin;
use crate::ir::{Category, Operator};

use super::math;
use super::value::Val;
use super::RuntimeError;

/// Место хранения переменной.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    /// Локальный слот кадра функции (параметры занимают первые слоты).
    Local(usize),
    /// Слот uniform-переменной шейдера.
    Uniform(usize),
}

/// Выражение.
#[derive(Debug, Clone, PartialEq)]
pub enum Code {
    Const(Val),
    Load(Place),
    Component {
        value: Box<Code>,
        indices: &'static [usize],
    },
    Column {
        value: Box<Code>,
        index: usize,
    },
    Binary {
        category: Category,
        operator: Operator,
        a: Box<Code>,
        b: Box<Code>,
    },
    Negate(Box<Code>),
    Call {
        function: usize,
        args: Vec<Code>,
    },
    Builtin {
        builtin: Builtin,
        args: Vec<Code>,
    },
}

/// Инструкция.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Store(Place, Code),
    If {
        condition: Code,
        then_body: Vec<Instr>,
        else_body: Vec<Instr>,
    },
    /// `while` и `for`: у `while` нет инициализации и итератора.
    Loop {
        init: Option<Box<Instr>>,
        condition: Code,
        iterator: Option<Box<Instr>>,
        body: Vec<Instr>,
    },
    Return(Option<Code>),
    Eval(Code),
}

/// Пользовательская функция после понижения.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub name: String,
    pub arity: usize,
    /// Общее число локальных слотов, включая параметры.
    pub locals: usize,
    pub returns_value: bool,
    pub body: Vec<Instr>,
}

/// Результат выполнения инструкции.
enum Flow {
    Next,
    Return(Option<Val>),
}

/// Интерпретатор одного запуска шейдера.
pub(crate) struct Evaluator<'a> {
    pub functions: &'a [CompiledFunction],
    pub uniforms: &'a mut [Option<Val>],
    pub uniform_names: &'a [String],
}

impl Evaluator<'_> {
    /// Вызвать функцию с уже вычисленными аргументами.
    pub fn call(&mut self, index: usize, args: Vec<Val>) -> Result<Option<Val>, RuntimeError> {
        let functions = self.functions;
        let function = functions
            .get(index)
            .ok_or_else(|| RuntimeError::TypeFault(format!("no function #{index}")))?;

        let mut frame: Vec<Option<Val>> = vec![None; function.locals.max(args.len())];
        for (slot, value) in frame.iter_mut().zip(args) {
            *slot = Some(value);
        }

        match self.exec_block(&function.body, &mut frame)? {
            Flow::Return(value) => Ok(value),
            Flow::Next if function.returns_value => {
                Err(RuntimeError::MissingReturn(function.name.clone()))
            }
            Flow::Next => Ok(None),
        }
    }

    fn exec_block(&mut self, body: &[Instr], frame: &mut [Option<Val>]) -> Result<Flow, RuntimeError> {
        for instr in body {
            if let Flow::Return(value) = self.exec(instr, frame)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn exec(&mut self, instr: &Instr, frame: &mut [Option<Val>]) -> Result<Flow, RuntimeError> {
        stacker::maybe_grow(64 * 1024, 1024 * 1024, || match instr {
            Instr::Store(place, code) => {
                let value = self.eval(code, frame)?;
                self.store(*place, value, frame)?;
                Ok(Flow::Next)
            }
            Instr::If {
                condition,
                then_body,
                else_body,
            } => {
                if self.condition(condition, frame)? {
                    self.exec_block(then_body, frame)
                } else {
                    self.exec_block(else_body, frame)
                }
            }
            Instr::Loop {
                init,
                condition,
                iterator,
                body,
            } => {
                if let Some(init) = init {
                    if let Flow::Return(value) = self.exec(init, frame)? {
                        return Ok(Flow::Return(value));
                    }
                }
                while self.condition(condition, frame)? {
                    if let Flow::Return(value) = self.exec_block(body, frame)? {
                        return Ok(Flow::Return(value));
                    }
                    if let Some(iterator) = iterator {
                        self.exec(iterator, frame)?;
                    }
                }
                Ok(Flow::Next)
            }
            Instr::Return(value) => {
                let value = value.as_ref().map(|code| self.eval(code, frame)).transpose()?;
                Ok(Flow::Return(value))
            }
            // вызов void-функции допустим только как инструкция
            Instr::Eval(Code::Call { function, args }) => {
                let args = self.eval_args(args, frame)?;
                self.call(*function, args)?;
                Ok(Flow::Next)
            }
            Instr::Eval(code) => {
                self.eval(code, frame)?;
                Ok(Flow::Next)
            }
        })
    }

    fn condition(&mut self, code: &Code, frame: &mut [Option<Val>]) -> Result<bool, RuntimeError> {
        let value = self.eval(code, frame)?;
        value
            .as_bool()
            .ok_or_else(|| RuntimeError::TypeFault(format!("condition evaluated to {}", value.ty())))
    }

    fn store(&mut self, place: Place, value: Val, frame: &mut [Option<Val>]) -> Result<(), RuntimeError> {
        let slot = match place {
            Place::Local(i) => frame.get_mut(i),
            Place::Uniform(i) => self.uniforms.get_mut(i),
        };
        let slot = slot.ok_or_else(|| RuntimeError::TypeFault(format!("no slot for {place:?}")))?;
        *slot = Some(value);
        Ok(())
    }

    fn load(&self, place: Place, frame: &[Option<Val>]) -> Result<Val, RuntimeError> {
        let slot = match place {
            Place::Local(i) => frame.get(i),
            Place::Uniform(i) => self.uniforms.get(i),
        };
        match slot {
            Some(Some(value)) => Ok(*value),
            Some(None) => {
                let name = match place {
                    Place::Uniform(i) => self.uniform_names.get(i).cloned(),
                    Place::Local(i) => Some(format!("local #{i}")),
                };
                Err(RuntimeError::Unset(name.unwrap_or_default()))
            }
            None => Err(RuntimeError::TypeFault(format!("no slot for {place:?}"))),
        }
    }

    fn eval(&mut self, code: &Code, frame: &mut [Option<Val>]) -> Result<Val, RuntimeError> {
        stacker::maybe_grow(64 * 1024, 1024 * 1024, || match code {
            Code::Const(value) => Ok(*value),
            Code::Load(place) => self.load(*place, frame),
            Code::Component { value, indices } => {
                let value = self.eval(value, frame)?;
                let components = value
                    .components()
                    .ok_or_else(|| RuntimeError::TypeFault(format!("component of {}", value.ty())))?;
                let picked: Vec<f64> = indices
                    .iter()
                    .map(|i| components.get(*i).copied())
                    .collect::<Option<_>>()
                    .ok_or_else(|| RuntimeError::TypeFault(format!("component out of {}", value.ty())))?;
                match picked.as_slice() {
                    [single] => Ok(Val::Float(*single)),
                    many => many_components(many),
                }
            }
            Code::Column { value, index } => {
                let value = self.eval(value, frame)?;
                let column_type = value
                    .ty()
                    .column_type()
                    .ok_or_else(|| RuntimeError::TypeFault(format!("column of {}", value.ty())))?;
                let size = column_type.vector_len().unwrap_or_default();
                let data = value.components().unwrap_or_default();
                data.get(index * size..(index + 1) * size)
                    .and_then(|column| Val::from_components(column_type, column))
                    .ok_or_else(|| RuntimeError::TypeFault(format!("column {index} of {}", value.ty())))
            }
            Code::Binary {
                category,
                operator,
                a,
                b,
            } => {
                let a = self.eval(a, frame)?;
                let b = self.eval(b, frame)?;
                math::binary(*category, *operator, &a, &b)
            }
            Code::Negate(inner) => {
                let value = self.eval(inner, frame)?;
                math::negate(&value)
            }
            Code::Call { function, args } => {
                let args = self.eval_args(args, frame)?;
                self.call(*function, args)?
                    .ok_or_else(|| RuntimeError::TypeFault("void function used as a value".to_string()))
            }
            Code::Builtin { builtin, args } => {
                let args = self.eval_args(args, frame)?;
                math::call_builtin(*builtin, &args)
            }
        })
    }

    fn eval_args(&mut self, args: &[Code], frame: &mut [Option<Val>]) -> Result<Vec<Val>, RuntimeError> {
        args.iter().map(|arg| self.eval(arg, frame)).collect()
    }
}

fn many_components(components: &[f64]) -> Result<Val, RuntimeError> {
    let ty = crate::types::Type::vector_of(components.len())
        .ok_or_else(|| RuntimeError::TypeFault(format!("{} components", components.len())))?;
    Val::from_components(ty, components)
        .ok_or_else(|| RuntimeError::TypeFault(format!("{} components", components.len())))
}
