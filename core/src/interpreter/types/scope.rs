//! Lexical scopes and bindings

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::values::Value;
use crate::parser::ast::{DeclarationKind, NodeId};

/// A scope's id is its depth in the scope stack when it was opened
pub type ScopeId = usize;

/// A named storage cell owned by one scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub name: String,
    pub kind: DeclarationKind,
    pub value: Value,
    pub declared_by: NodeId,
    pub initialized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub bindings: IndexMap<String, Binding>,
}

impl Scope {
    fn new(id: ScopeId, parent: Option<ScopeId>) -> Self {
        Self {
            id,
            parent,
            bindings: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

/// The live chain of scopes, global scope first.
///
/// Never empty: the global scope is created with the stack and cannot be
/// popped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(0, None)],
        }
    }

    /// Number of live scopes, including the global scope
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current(&self) -> &Scope {
        &self.scopes[self.scopes.len() - 1]
    }

    pub fn current_id(&self) -> ScopeId {
        self.current().id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn global(&self) -> &Scope {
        &self.scopes[0]
    }

    /// Open a child of the current scope and return `(id, parent id)`
    pub fn push(&mut self) -> (ScopeId, ScopeId) {
        let parent = self.current_id();
        let id = self.scopes.len();
        self.scopes.push(Scope::new(id, Some(parent)));
        (id, parent)
    }

    /// Discard the innermost scope and all of its bindings. The global scope
    /// is never popped.
    pub fn pop(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Add a binding to the current scope. Returns `false` if the name is
    /// already declared in that exact scope.
    pub fn declare(&mut self, binding: Binding) -> bool {
        let last = self.scopes.len() - 1;
        let scope = &mut self.scopes[last];
        if scope.contains(&binding.name) {
            return false;
        }
        scope.bindings.insert(binding.name.clone(), binding);
        true
    }

    /// Innermost binding for `name` and the id of the scope holding it
    pub fn lookup(&self, name: &str) -> Option<(&Binding, ScopeId)> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).map(|b| (b, scope.id)))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<(&mut Binding, ScopeId)> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| {
                let id = scope.id;
                scope.bindings.get_mut(name).map(|b| (b, id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(name: &str, value: f64) -> Binding {
        Binding {
            name: name.to_string(),
            kind: DeclarationKind::Let,
            value: Value::Number(value),
            declared_by: NodeId(1),
            initialized: true,
        }
    }

    #[test]
    fn test_shadowing_and_pop() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.declare(binding("x", 1.0)));
        assert_eq!(scopes.push(), (1, 0));
        assert!(scopes.declare(binding("x", 2.0)));

        let (found, id) = scopes.lookup("x").unwrap();
        assert_eq!(found.value, Value::Number(2.0));
        assert_eq!(id, 1);

        scopes.pop();
        let (found, id) = scopes.lookup("x").unwrap();
        assert_eq!(found.value, Value::Number(1.0));
        assert_eq!(id, 0);
    }

    #[test]
    fn test_redeclare_in_same_scope_rejected() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.declare(binding("x", 1.0)));
        assert!(!scopes.declare(binding("x", 2.0)));
        assert_eq!(scopes.global().get("x").unwrap().value, Value::Number(1.0));
    }

    #[test]
    fn test_global_scope_cannot_be_popped() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.pop().is_none());
        assert_eq!(scopes.depth(), 1);
    }
}
