//! The tree-walking evaluator.
//!
//! `execute` parses then runs; `run` takes a pre-parsed program. Both
//! have `_context` variants that observe a cancellation token at every
//! statement boundary and in every blocking select.

pub mod call;
pub mod cancel;
pub mod chan;
pub mod env;
pub mod errors;
mod expr;
pub mod registry;
mod stmt;
pub mod value;

mod operators;
mod unary_operators;

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::ast::Stmt;
use crate::parser;

use cancel::CancelToken;
use env::{Env, ImportFn};
use errors::{EvalError, EvalResult};
use value::Value;

/// Recognized execution options.
#[derive(Clone, Default)]
pub struct Options {
    /// When true, host panics during native calls are not caught.
    pub debug: bool,
    /// Resolver for local imports; installed into the environment at run
    /// start so nested frames inherit it.
    pub import: Option<ImportFn>,
}

/// Internal control signals. Only errors cross the embedder boundary;
/// `break`/`continue`/`return` are consumed by the constructs that own
/// them.
pub(crate) enum Flow {
    Break,
    Continue,
    Return(Value),
    Err(EvalError),
}

impl From<EvalError> for Flow {
    fn from(e: EvalError) -> Self {
        Flow::Err(e)
    }
}

pub(crate) type Exec<T> = Result<T, Flow>;

/// The run context: one evaluation in one environment.
pub(crate) struct Interp {
    pub(crate) cancel: CancelToken,
    pub(crate) options: Options,
    pub(crate) env: Env,
    /// Receiver for the next call, set by method member access.
    pub(crate) recv: Option<Value>,
    /// Names of script-declared types in this run, carried into closures.
    pub(crate) script_types: Vec<String>,
}

impl Interp {
    /// Run `f` with a fresh child scope, restoring the previous
    /// environment before any result or signal propagates.
    pub(crate) fn in_child_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.env.clone();
        self.env = saved.new_child();
        let result = f(self);
        self.env = saved;
        result
    }
}

/// Parse and run a script.
pub fn execute(env: &Env, options: &Options, source: &str) -> EvalResult {
    execute_context(CancelToken::never(), env, options, source)
}

/// Parse and run a script under a cancellation token.
pub fn execute_context(
    cancel: CancelToken,
    env: &Env,
    options: &Options,
    source: &str,
) -> EvalResult {
    let program = parser::parse(source).map_err(EvalError::from)?;
    run_context(cancel, env, options, &program)
}

/// Run a pre-parsed program.
pub fn run(env: &Env, options: &Options, program: &Stmt) -> EvalResult {
    run_context(CancelToken::never(), env, options, program)
}

/// Run a pre-parsed program under a cancellation token.
pub fn run_context(
    cancel: CancelToken,
    env: &Env,
    options: &Options,
    program: &Stmt,
) -> EvalResult {
    if let Some(resolver) = &options.import {
        env.set_import(resolver.clone());
    }
    let mut interp = Interp {
        cancel,
        options: options.clone(),
        env: env.clone(),
        recv: None,
        script_types: Vec::new(),
    };
    debug!("run program");
    match interp.run_stmt(program) {
        Ok(value) => Ok(value),
        Err(Flow::Return(value)) => Ok(value),
        Err(Flow::Break) => Err(errors::internal(
            "unexpected break statement",
            program.pos,
        )),
        Err(Flow::Continue) => Err(errors::internal(
            "unexpected continue statement",
            program.pos,
        )),
        Err(Flow::Err(e)) => Err(e),
    }
}
