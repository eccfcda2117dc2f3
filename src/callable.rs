//! User-defined functions (closures) and the native-function surface.
//!
//! A [`LoxFunction`] pairs a declaration's parameter list and body with the
//! environment that was current at its definition site — that shared
//! reference is what makes it a closure.  [`LoxFunction::bind`] produces a
//! bound method: the same function rebound over a fresh environment whose
//! sole binding is `this`.
//!
//! Native functions are plain `fn` pointers carried inline in
//! [`Value::NativeFunction`]; hosts pre-bind them into the global scope
//! before execution.  The one shipped here is `clock`.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use log::debug;

use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::parser::Stmt;
use crate::token::Token;
use crate::value::Value;

/// A user-defined function value.
#[derive(Debug)]
pub struct LoxFunction {
    pub name: String,
    pub params: Vec<Token>,

    /// Shared so that binding a method does not copy its body.
    pub body: Rc<Vec<Stmt>>,

    /// The environment captured at the definition site.
    pub closure: Rc<RefCell<Environment>>,

    /// `init` methods always yield the instance, never a plain value.
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Rebind this function as a method of `instance`: a fresh environment
    /// defining only `this` is spliced between the closure and the call
    /// frame.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        debug!("Binding method '{}' to instance", self.name);

        let mut env = Environment::with_enclosing(Rc::clone(&self.closure));
        env.define("this", Value::Instance(instance));

        LoxFunction {
            name: self.name.clone(),
            params: self.params.clone(),
            body: Rc::clone(&self.body),
            closure: Rc::new(RefCell::new(env)),
            is_initializer: self.is_initializer,
        }
    }
}

/// The `clock` native: zero arity, seconds since the Unix epoch as a number.
pub fn clock() -> Value {
    Value::NativeFunction {
        name: "clock".to_string(),
        arity: 0,
        func: |_args: &[Value]| {
            let seconds: f64 = Utc::now().timestamp_millis() as f64 / 1000.0;

            Ok(Value::Number(seconds))
        },
    }
}
