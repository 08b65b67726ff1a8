// ABOUTME: Environment module for managing variable bindings and scopes

use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment with a parent
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Defines a binding in THIS scope (doesn't walk parent chain), shadowing
    /// any same-named binding visible through the parent chain.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Looks up a name in this scope and parent scopes recursively.
    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Ok(value.clone());
        }

        if let Some(ref parent) = self.parent {
            return parent.get(name);
        }

        Err(RuntimeError::undefined_variable(name))
    }

    /// Assigns to an existing binding in the nearest enclosing scope that
    /// already defines `name`. Never creates a new binding.
    pub fn set(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }

        if let Some(ref parent) = self.parent {
            return parent.set(name, value);
        }

        Err(RuntimeError::undefined_variable(name))
    }
}

/// Walks to the outermost ancestor of `env` (used to install globals such as `clock`).
pub fn root(env: &Rc<Environment>) -> Rc<Environment> {
    let mut current = Rc::clone(env);
    while let Some(parent) = current.parent.clone() {
        current = parent;
    }
    current
}
