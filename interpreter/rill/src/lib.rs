//! Rill — an embeddable, dynamically-typed scripting language.
//!
//! Scripts are parsed to an AST and executed by a tree-walking evaluator
//! against a lexically-scoped environment. Hosts expose functions, types,
//! and values to scripts through [`Env`] and the package registry, and
//! call script-defined functions back through [`call_value`].
//!
//! # Quick start
//!
//! ```
//! use rill::{execute, Env, Options, Value};
//!
//! let env = Env::new();
//! let result = execute(&env, &Options::default(), "var a = 1; var b = 2; a + b");
//! assert_eq!(result.unwrap(), Value::Int(3));
//! ```
//!
//! Executions can be cancelled cooperatively:
//!
//! ```
//! use rill::{execute_context, CancelSource, Env, Options};
//!
//! let (mut source, token) = CancelSource::new();
//! source.cancel();
//! let err = execute_context(token, &Env::new(), &Options::default(), "for { }");
//! assert!(err.unwrap_err().is_interrupt());
//! ```

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod packages;
pub mod parser;

pub use eval::call::{
    call_value, Callable, NativeCall, NativeFn, ParamType, RetType, ScriptFn,
};
pub use eval::cancel::{CancelSource, CancelToken};
pub use eval::chan::Channel;
pub use eval::env::{Env, ImportFn};
pub use eval::errors::{ErrorKind, EvalError, EvalResult};
pub use eval::registry::{register_package, register_package_types};
pub use eval::value::{
    FieldDef, Indexable, MapKey, Opaque, Record, TypeDesc, TypeOrigin, Value,
};
pub use eval::{execute, execute_context, run, run_context, Options};
pub use parser::{parse, ParseError};
