//! Lexical environments: a chain of name → value maps.
//!
//! A new environment is created on entry to a block, a function call, and a
//! bound-method invocation.  The `enclosing` link is set at construction and
//! never mutated, so the chain is a tree of parent pointers shared through
//! `Rc` — closures keep their defining environment alive, and no cycle can
//! form.
//!
//! Lookup comes in two flavours matching the resolver's dual path:
//! name-based (`get`/`assign`, used for globals) and distance-based
//! (`get_at`/`assign_at`, used when the resolver recorded a hop distance).

use crate::error::{LoxError, Result};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// A root environment with no parent (the global scope).
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A child environment whose lookups fall through to `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this environment, shadowing any enclosing binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Name-based lookup walking the chain outward.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Name-based assignment walking the chain outward.  Assignment never
    /// creates a binding; the name must already exist somewhere.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Walk exactly `distance` enclosing links from `env`.
    ///
    /// The distance comes from the resolver, whose scope stack mirrors the
    /// evaluator's environment chain; a missing ancestor means the two
    /// disagreed, which is an internal error, not a user one.
    fn ancestor(env: &Rc<RefCell<Environment>>, distance: usize) -> Result<Rc<RefCell<Environment>>> {
        let mut current: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let next = current
                .borrow()
                .enclosing
                .as_ref()
                .map(Rc::clone)
                .ok_or_else(|| {
                    LoxError::Internal(format!(
                        "environment chain shorter than resolved distance {}",
                        distance
                    ))
                })?;

            current = next;
        }

        Ok(current)
    }

    /// Read the binding exactly `distance` hops up the chain.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Value> {
        let scope = Self::ancestor(env, distance)?;
        let value = scope.borrow().values.get(name).cloned();

        value.ok_or_else(|| LoxError::runtime(line, format!("Undefined variable '{}'.", name)))
    }

    /// Write the binding exactly `distance` hops up the chain.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let scope = Self::ancestor(env, distance)?;
        let mut scope = scope.borrow_mut();

        if scope.values.contains_key(name) {
            scope.values.insert(name.to_string(), value);
            Ok(())
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }
}
