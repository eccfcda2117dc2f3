//! The tree-walking evaluator.
//!
//! Statement execution returns a [`Flow`] — an explicit non-local control
//! signal instead of host-level unwinding.  Every composite construct
//! inspects the signal: blocks and branches stop at the first non-`Normal`
//! flow and propagate it unchanged; `while` consumes `Break` and propagates
//! `Return`; the function-call boundary consumes `Return` and nothing else.
//! A `Break` reaching a function boundary would mean the resolver's static
//! checks were bypassed, so it surfaces as an internal error rather than a
//! user-visible one.
//!
//! Runtime errors (type/arity/lookup violations) are [`LoxError::Runtime`]
//! values carrying the originating source line; they unwind the active
//! call/block chain via `?` and abort the current run only.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::callable::{clock, LoxFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::parser::{Expr, LiteralValue, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Outcome of executing a statement.
#[derive(Debug)]
pub enum Flow {
    /// Fall through to the next statement.
    Normal,

    /// A `break` looking for its enclosing loop.
    Break,

    /// A `return` carrying its value up to the call boundary.
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,

    /// The resolver's side table: expression-node id → hop distance.
    /// Consumed read-only; merged across runs by [`add_locals`](Self::add_locals).
    locals: HashMap<usize, usize>,

    /// Line-oriented sink for `print` output.
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter printing to stdout, with the native functions
    /// pre-bound into the global scope.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter printing to an arbitrary sink (used by tests and
    /// embedders).
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");
        globals.borrow_mut().define("clock", clock());

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Merge a resolver side table for the statements about to run.  Node
    /// ids are session-unique, so tables from successive interactive lines
    /// never collide.
    pub fn add_locals(&mut self, locals: HashMap<usize, usize>) {
        self.locals.extend(locals);
    }

    /// Interprets a list of statements (a "program").
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}

                // the resolver rejects top-level break/return statically
                flow => {
                    return Err(LoxError::Internal(format!(
                        "control-flow signal {:?} escaped to top level",
                        flow
                    )));
                }
            }
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    // ─────────────────────── statement execution ───────────────────────

    /// Executes a single statement, yielding its control-flow outcome.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)?;
                self.output.flush()?;

                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                debug!("Defining variable '{}'", name.lexeme);

                let value = self.evaluate(initializer)?; // Empty ⇒ Nil

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(Flow::Normal)
            }

            Stmt::Fun { name, params, body } => {
                debug!("Defining function '{}'", name.lexeme);

                // capture the *current* environment: this is the closure
                let function = LoxFunction {
                    name: name.lexeme.clone(),
                    params: params.clone(),
                    body: Rc::new(body.clone()),
                    closure: Rc::clone(&self.environment),
                    is_initializer: false,
                };

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Function(Rc::new(function)));

                Ok(Flow::Normal)
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.execute_class(name, superclass.as_ref(), methods)?;

                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let child = Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(statements, Rc::new(RefCell::new(child)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else {
                    self.execute(else_branch)
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");

                while is_truthy(&self.evaluate(condition)?) {
                    match self.execute(body)? {
                        Flow::Normal => {}

                        // break ends the loop and is consumed here
                        Flow::Break => break,

                        // return belongs to an enclosing call boundary
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }

            Stmt::Break { .. } => Ok(Flow::Break),

            Stmt::Empty => Ok(Flow::Normal),
        }
    }

    /// Execute `statements` in `environment`, restoring the previous
    /// environment afterwards whether the block completed, signalled, or
    /// failed.  Bindings made inside do not leak outward.
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut outcome = Ok(Flow::Normal);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}

                // stop at the first signal or error and propagate it
                other => {
                    outcome = other;
                    break;
                }
            }
        }

        self.environment = previous;

        outcome
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Stmt],
    ) -> Result<()> {
        let superclass = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(parent) => Some(parent),

                _ => {
                    let line = match expr {
                        Expr::Variable { name, .. } => name.line,
                        _ => name.line,
                    };

                    return Err(LoxError::runtime(line, "Superclass must be a class."));
                }
            },

            None => None,
        };

        // the name exists (as nil) while the class body is built, so local
        // classes behave like other declarations
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        // methods close over an environment carrying 'super' when inheriting
        let method_closure = match &superclass {
            Some(parent) => {
                let mut env = Environment::with_enclosing(Rc::clone(&self.environment));
                env.define("super", Value::Class(Rc::clone(parent)));

                Rc::new(RefCell::new(env))
            }

            None => Rc::clone(&self.environment),
        };

        let mut method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for method in methods {
            if let Stmt::Fun {
                name: method_name,
                params,
                body,
            } = method
            {
                let function = LoxFunction {
                    name: method_name.lexeme.clone(),
                    params: params.clone(),
                    body: Rc::new(body.clone()),
                    closure: Rc::clone(&method_closure),
                    is_initializer: method_name.lexeme == "init",
                };

                method_map.insert(method_name.lexeme.clone(), Rc::new(function));
            }
        }

        let class = LoxClass::new(name.lexeme.clone(), superclass, method_map);

        self.environment.borrow_mut().assign(
            &name.lexeme,
            Value::Class(Rc::new(class)),
            name.line,
        )?;

        Ok(())
    }

    // ─────────────────────── expression evaluation ───────────────────────

    /// Evaluates an expression and returns a [`Value`].
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::Str(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Variable { name, id } => self.look_up_variable(name, *id),

            Expr::Assign { name, value, id } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => self.globals.borrow_mut().assign(
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_value = self.evaluate(callee)?;

                // arguments are evaluated left-to-right before the call
                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.invoke_callable(callee_value, paren, args)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),

                _ => Err(LoxError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value = self.evaluate(value)?;

                    instance.borrow_mut().set(name, value.clone());

                    Ok(value)
                }

                _ => Err(LoxError::runtime(name.line, "Only instances have fields.")),
            },

            Expr::This { keyword, id } => self.look_up_variable(keyword, *id),

            Expr::Super {
                keyword,
                method,
                id,
            } => self.evaluate_super(keyword, method, *id),

            // defensive: an absent expression evaluates to nil
            Expr::Empty => Ok(Value::Nil),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operand must be a number.",
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right))),

            _ => Err(LoxError::Internal(format!(
                "invalid unary operator '{}'",
                operator.lexeme
            ))),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        // and/or short-circuit: the deciding operand is returned and the
        // other side is never evaluated
        if operator.token_type == TokenType::OR {
            let left = self.evaluate(left)?;

            return if is_truthy(&left) {
                Ok(left)
            } else {
                self.evaluate(right)
            };
        }

        if operator.token_type == TokenType::AND {
            let left = self.evaluate(left)?;

            return if is_truthy(&left) {
                self.evaluate(right)
            } else {
                Ok(left)
            };
        }

        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),

                // a number/string mix coerces the number to its display text
                (Value::Number(a), Value::Str(b)) => {
                    Ok(Value::Str(format!("{}{}", Value::Number(a), b)))
                }

                (Value::Str(a), Value::Number(b)) => {
                    Ok(Value::Str(format!("{}{}", a, Value::Number(b))))
                }

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be numbers or strings.",
                )),
            },

            TokenType::MINUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => Err(self.number_operands_error(operator)),
            },

            TokenType::STAR => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                _ => Err(self.number_operands_error(operator)),
            },

            TokenType::SLASH => match (left, right) {
                (Value::Number(a), Value::Number(b)) => {
                    if b == 0.0 {
                        Err(LoxError::runtime(operator.line, "Division by zero."))
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }

                _ => Err(self.number_operands_error(operator)),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            TokenType::GREATER => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
                _ => Err(self.number_operands_error(operator)),
            },

            TokenType::GREATER_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),
                _ => Err(self.number_operands_error(operator)),
            },

            TokenType::LESS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
                _ => Err(self.number_operands_error(operator)),
            },

            TokenType::LESS_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
                _ => Err(self.number_operands_error(operator)),
            },

            _ => Err(LoxError::Internal(format!(
                "invalid binary operator '{}'",
                operator.lexeme
            ))),
        }
    }

    fn number_operands_error(&self, operator: &Token) -> LoxError {
        LoxError::runtime(operator.line, "Operands must be numbers.")
    }

    /// The dual-path lookup: a recorded hop distance wins; otherwise the
    /// name is assumed global and read dynamically from the root.  Globals
    /// may legitimately be defined after the point where a forward reference
    /// to them was resolved (top-level mutual recursion).
    fn look_up_variable(&self, name: &Token, id: usize) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::get_at(&self.environment, distance, &name.lexeme, name.line)
            }

            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }

    fn evaluate_super(&mut self, keyword: &Token, method: &Token, id: usize) -> Result<Value> {
        let distance = *self
            .locals
            .get(&id)
            .ok_or_else(|| LoxError::Internal("unresolved 'super' reference".to_string()))?;

        let superclass = Environment::get_at(&self.environment, distance, "super", keyword.line)?;

        // 'this' is always bound one scope inside 'super'
        let object = Environment::get_at(&self.environment, distance - 1, "this", keyword.line)?;

        let (Value::Class(superclass), Value::Instance(instance)) = (superclass, object) else {
            return Err(LoxError::Internal(
                "'super' lookup found non-class or non-instance bindings".to_string(),
            ));
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),

            None => Err(LoxError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    // ─────────────────────────── call boundary ───────────────────────────

    /// Invokes a callable value: native function, user function, or class
    /// constructor.  Argument count must match the declared arity exactly.
    fn invoke_callable(&mut self, callee: Value, paren: &Token, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                self.check_arity(arity, args.len(), paren)?;

                func(&args).map_err(|message| LoxError::runtime(paren.line, message))
            }

            Value::Function(function) => {
                debug!("Calling function '{}'", function.name);

                self.check_arity(function.arity(), args.len(), paren)?;
                self.call_function(&function, args, paren)
            }

            Value::Class(class) => {
                debug!("Constructing instance of '{}'", class.name);

                self.check_arity(class.arity(), args.len(), paren)?;

                let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(&class))));

                // init runs bound to the new instance; its return value is
                // discarded and the instance is always yielded
                if let Some(init) = class.find_method("init") {
                    let bound = init.bind(Rc::clone(&instance));
                    self.call_function(&bound, args, paren)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }

    fn check_arity(&self, arity: usize, got: usize, paren: &Token) -> Result<()> {
        if arity == got {
            Ok(())
        } else {
            Err(LoxError::runtime(
                paren.line,
                format!("Expected {} arguments but got {}.", arity, got),
            ))
        }
    }

    /// The function-call boundary: binds parameters in a fresh environment
    /// chained to the closure, runs the body, and consumes a `Return`
    /// signal.  Nothing else is consumed here.
    fn call_function(
        &mut self,
        function: &LoxFunction,
        args: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        let mut frame = Environment::with_enclosing(Rc::clone(&function.closure));

        for (param, arg) in function.params.iter().zip(args) {
            frame.define(&param.lexeme, arg);
        }

        let flow = self.execute_block(&function.body, Rc::new(RefCell::new(frame)))?;

        match flow {
            Flow::Return(value) => {
                if function.is_initializer {
                    // an early 'return;' in init still yields the instance
                    Environment::get_at(&function.closure, 0, "this", paren.line)
                } else {
                    Ok(value)
                }
            }

            Flow::Normal => {
                if function.is_initializer {
                    Environment::get_at(&function.closure, 0, "this", paren.line)
                } else {
                    Ok(Value::Nil)
                }
            }

            // statically impossible: the resolver rejects 'break' outside a
            // loop, and loops consume it before it reaches this boundary
            Flow::Break => Err(LoxError::Internal(
                "'break' signal escaped a function boundary".to_string(),
            )),
        }
    }
}

/// nil and false are falsy; every other value is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}
