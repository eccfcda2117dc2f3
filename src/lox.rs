//! A `Lox` value is one interpreter session: it owns the evaluator (so
//! globals and definitions persist across `run` calls, which is what makes
//! the REPL work) and threads the expression-node id counter through
//! successive parses so resolver side tables from different sources never
//! collide.
//!
//! Each `run` drives the full pipeline: scan → parse → resolve → interpret.
//! The three front-end passes all run to completion and accumulate their
//! errors; execution is attempted only when every accumulator is empty.

use std::io::Write;

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// How a run failed.  Static errors (scan + parse + resolve, merged in
/// pipeline order) mean execution never started; a runtime error aborted an
/// execution in progress.
#[derive(Debug)]
pub enum RunError {
    Static(Vec<LoxError>),
    Runtime(LoxError),
}

pub struct Lox {
    interpreter: Interpreter,

    /// Next expression-node id, carried across runs.
    next_id: usize,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    pub fn new() -> Self {
        Lox {
            interpreter: Interpreter::new(),
            next_id: 0,
        }
    }

    /// A session whose `print` output goes to `output` instead of stdout.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Lox {
            interpreter: Interpreter::with_output(output),
            next_id: 0,
        }
    }

    /// Run one source text through the whole pipeline.  State mutated by a
    /// successful (or partially executed) run persists into the next call.
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        info!("Running {} byte(s) of source", source.len());

        let scanner = Scanner::new(source.as_bytes());
        let (tokens, mut errors) = scanner.scan_all();

        let mut parser = Parser::new(&tokens, self.next_id);
        let (statements, parse_errors) = parser.parse();
        self.next_id = parser.next_id();

        errors.extend(parse_errors);

        // the resolver always runs, even over a partially recovered tree,
        // so semantic errors surface alongside syntax errors
        let (locals, resolve_errors) = Resolver::new().resolve(&statements);

        errors.extend(resolve_errors);

        if !errors.is_empty() {
            debug!("Skipping execution: {} static error(s)", errors.len());

            return Err(RunError::Static(errors));
        }

        self.interpreter.add_locals(locals);

        self.interpreter
            .interpret(&statements)
            .map_err(RunError::Runtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_errors_skip_execution() {
        let mut lox = Lox::new();

        // a syntax error and a semantic error in one source: both reported
        let result = lox.run("var x = ;\nreturn 1;");

        match result {
            Err(RunError::Static(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected static errors, got {:?}", other.err()),
        }
    }

    #[test]
    fn session_state_persists_across_runs() {
        let mut lox = Lox::new();

        lox.run("var answer = 42;").unwrap();
        lox.run("answer = answer + 1;").unwrap();

        // a runtime error in one run does not clear earlier definitions
        assert!(matches!(
            lox.run("answer / 0;"),
            Err(RunError::Runtime(_))
        ));
        lox.run("print answer;").unwrap();
    }
}
