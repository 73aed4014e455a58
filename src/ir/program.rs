//! Корневой узел IR: функции, uniform-переменные и корневая область.

use std::collections::BTreeMap;

use crate::compiler::ShaderKind;
use crate::types::Type;

use super::scope::{ScopeArena, ScopeError, ScopeId};
use super::{Function, Statement};

/// Uniform-переменная: внешне привязываемое значение.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uniform {
    pub name: String,
    pub ty: Type,
}

/// Полностью разрешённая программа.
#[derive(Debug, Clone)]
pub struct Program {
    /// Вид шейдера, для которого программа скомпилирована.
    pub kind: ShaderKind,
    pub scopes: ScopeArena,
    /// Перегрузки по имени в порядке регистрации.
    pub functions: BTreeMap<String, Vec<Function>>,
    pub uniforms: BTreeMap<String, Uniform>,
}

impl Program {
    pub fn new(kind: ShaderKind) -> Self {
        Self {
            kind,
            scopes: ScopeArena::new(),
            functions: BTreeMap::new(),
            uniforms: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> ScopeId {
        self.scopes.root()
    }

    /// Регистрирует uniform в таблице и в корневой области.
    pub fn register_uniform(&mut self, uniform: Uniform) -> Result<(), ScopeError> {
        let root = self.scopes.root();
        self.scopes.register(root, &uniform.name, uniform.ty)?;
        self.uniforms.insert(uniform.name.clone(), uniform);
        Ok(())
    }

    pub fn register_function(&mut self, function: Function) {
        self.functions
            .entry(function.name.clone())
            .or_default()
            .push(function);
    }

    /// Все перегрузки функции с данным именем.
    pub fn candidates(&self, name: &str) -> &[Function] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Поиск перегрузки по сигнатуре параметров.
    pub fn find_function(&self, name: &str, param_signature: &str) -> Option<&Function> {
        self.candidates(name)
            .iter()
            .find(|f| f.param_signature() == param_signature)
    }

    /// Пользовательские (не встроенные) функции.
    pub fn user_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values().flatten().filter(|f| !f.builtin)
    }

    /// Точка входа `void main()`.
    pub fn main(&self) -> Option<&Function> {
        self.find_function("main", "")
            .filter(|f| !f.builtin && f.return_type == Type::Void)
    }

    /// Uniform-переменные, на которые ссылается код пользовательских функций.
    pub fn used_uniforms(&self) -> Vec<&Uniform> {
        let bodies: Vec<&Statement> = self.user_functions().flat_map(|f| &f.body).collect();
        self.uniforms
            .values()
            .filter(|uniform| {
                let mut references = |v: &super::Value| {
                    v.name() == Some(uniform.name.as_str()) && v.ty == uniform.ty
                };
                bodies
                    .iter()
                    .any(|s| s.any_value(&mut references) || s.assigns(&uniform.name))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Expr, Value, VariableAssignment};

    fn main_with(body: Vec<Statement>) -> Function {
        Function {
            name: "main".to_string(),
            params: Vec::new(),
            return_type: Type::Void,
            body,
            builtin: false,
        }
    }

    #[test]
    fn test_register_uniform_visible_in_root() {
        let mut program = Program::new(ShaderKind::Fragment);
        program
            .register_uniform(Uniform { name: "gain".to_string(), ty: Type::Float })
            .unwrap();
        assert_eq!(program.scopes.get(program.root(), "gain"), Some(Type::Float));
        assert!(program.uniforms.contains_key("gain"));
    }

    #[test]
    fn test_overloads_kept_in_order() {
        let mut program = Program::new(ShaderKind::Fragment);
        program.register_function(main_with(Vec::new()));
        let mut other = main_with(Vec::new());
        other.params.push(crate::ir::Parameter { name: "x".to_string(), ty: Type::Int });
        program.register_function(other);

        assert_eq!(program.candidates("main").len(), 2);
        assert!(program.main().is_some());
        assert!(program.find_function("main", "int").is_some());
        assert!(program.candidates("missing").is_empty());
    }

    #[test]
    fn test_used_uniforms() {
        let mut program = Program::new(ShaderKind::Fragment);
        for (name, ty) in [("gain", Type::Float), ("unused", Type::Vec2), ("out", Type::Vec4)] {
            program
                .register_uniform(Uniform { name: name.to_string(), ty })
                .unwrap();
        }
        program.register_function(main_with(vec![
            Statement::Assignment(VariableAssignment {
                name: "x".to_string(),
                value: Expr::Value(Value::reference("gain", Type::Float)),
                initial: true,
            }),
            Statement::Assignment(VariableAssignment {
                name: "out".to_string(),
                value: Expr::Value(Value::reference("v", Type::Vec4)),
                initial: false,
            }),
        ]));

        let used: Vec<&str> = program.used_uniforms().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(used, vec!["gain", "out"]);
    }
}
