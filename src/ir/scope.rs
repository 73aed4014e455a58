//! Области видимости переменных.
//!
//! Области хранятся в арене и ссылаются на родителя по индексу. `branch`
//! создаёт дочернюю область (новый лексический блок), `clone_scope` копирует
//! только локальный уровень, разделяя с оригиналом ссылку на родителя.

use std::collections::HashMap;

use thiserror::Error;

use crate::types::Type;

/// Индекс области в [`ScopeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("variable '{0}' can not be of type void")]
    VoidBinding(String),
}

#[derive(Debug, Clone, Default)]
struct Frame {
    parent: Option<ScopeId>,
    locals: HashMap<String, Type>,
}

/// Арена областей видимости одной компиляции.
#[derive(Debug, Clone)]
pub struct ScopeArena {
    frames: Vec<Frame>,
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeArena {
    /// Создать арену с единственной корневой областью.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    /// Корневая область.
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Новая дочерняя область.
    pub fn branch(&mut self, parent: ScopeId) -> ScopeId {
        self.frames.push(Frame {
            parent: Some(parent),
            locals: HashMap::new(),
        });
        ScopeId(self.frames.len() - 1)
    }

    /// Копия локального уровня с тем же родителем.
    pub fn clone_scope(&mut self, scope: ScopeId) -> ScopeId {
        let frame = self.frames[scope.0].clone();
        self.frames.push(frame);
        ScopeId(self.frames.len() - 1)
    }

    /// Тип переменной; поиск идёт вверх по цепочке родителей.
    pub fn get(&self, scope: ScopeId, name: &str) -> Option<Type> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = &self.frames[id.0];
            if let Some(ty) = frame.locals.get(name) {
                return Some(*ty);
            }
            current = frame.parent;
        }
        None
    }

    pub fn contains(&self, scope: ScopeId, name: &str) -> bool {
        self.get(scope, name).is_some()
    }

    /// Объявлена ли переменная именно в этой области (без родителей).
    pub fn contains_local(&self, scope: ScopeId, name: &str) -> bool {
        self.frames[scope.0].locals.contains_key(name)
    }

    /// Зарегистрировать переменную в области.
    pub fn register(&mut self, scope: ScopeId, name: &str, ty: Type) -> Result<(), ScopeError> {
        if ty == Type::Void {
            return Err(ScopeError::VoidBinding(name.to_string()));
        }
        self.frames[scope.0].locals.insert(name.to_string(), ty);
        Ok(())
    }

    /// Количество созданных областей.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        arena.register(root, "foo", Type::Float).unwrap();
        let child = arena.branch(root);
        arena.register(child, "bar", Type::Int).unwrap();

        assert_eq!(arena.get(child, "foo"), Some(Type::Float));
        assert_eq!(arena.get(child, "bar"), Some(Type::Int));
        assert_eq!(arena.get(root, "bar"), None);
    }

    #[test]
    fn test_shadowing() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        arena.register(root, "x", Type::Float).unwrap();
        let child = arena.branch(root);
        arena.register(child, "x", Type::Vec2).unwrap();

        assert_eq!(arena.get(child, "x"), Some(Type::Vec2));
        assert_eq!(arena.get(root, "x"), Some(Type::Float));
    }

    #[test]
    fn test_clone_copies_local_level_only() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        arena.register(root, "global", Type::Int).unwrap();
        let child = arena.branch(root);
        arena.register(child, "local", Type::Float).unwrap();

        let copy = arena.clone_scope(child);
        arena.register(copy, "extra", Type::Vec3).unwrap();
        arena.register(root, "late", Type::Mat2).unwrap();

        assert_eq!(arena.get(copy, "local"), Some(Type::Float));
        assert_eq!(arena.get(copy, "late"), Some(Type::Mat2));
        assert!(!arena.contains(child, "extra"));
    }

    #[test]
    fn test_void_binding_rejected() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        assert_eq!(
            arena.register(root, "nothing", Type::Void),
            Err(ScopeError::VoidBinding("nothing".to_string()))
        );
        assert!(!arena.contains(root, "nothing"));
    }
}
