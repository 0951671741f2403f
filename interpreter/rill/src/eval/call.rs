//! The call bridge.
//!
//! Callables are tagged at construction: `Callable::Script` carries a
//! closure over its defining frame, `Callable::Native` carries a declared
//! signature (coercion targets, variadic element type, return shape) and
//! the host function itself. The bridge converts script call sites into
//! invocations of either, and `ScriptFn::invoke` is the canonical shape
//! through which native code calls back into script functions.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use tracing::trace;

use crate::ast::{Expr, ExprKind, Pos, Stmt};

use super::cancel::CancelToken;
use super::env::Env;
use super::errors::{self, ErrorKind, EvalError};
use super::value::Value;
use super::{Exec, Flow, Interp, Options};

/// A callable value.
#[derive(Clone)]
pub enum Callable {
    Native(Arc<NativeFn>),
    Script(Arc<ScriptFn>),
}

impl Callable {
    pub fn native(func: NativeFn) -> Callable {
        Callable::Native(Arc::new(func))
    }

    pub fn script(func: ScriptFn) -> Callable {
        Callable::Script(Arc::new(func))
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Native(f) => &f.name,
            Callable::Script(f) => &f.name,
        }
    }

    /// Identity comparison.
    pub fn same(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Arc::ptr_eq(a, b),
            (Callable::Script(a), Callable::Script(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Display for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callable::Native(n) => write!(f, "<native {}>", n.name),
            Callable::Script(s) if s.name.is_empty() => write!(f, "<func>"),
            Callable::Script(s) => write!(f, "<func {}>", s.name),
        }
    }
}

/// Declared parameter type of a native function; the coercion target for
/// arguments at that slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    /// No coercion; the value is passed as-is.
    Any,
    Bool,
    Int,
    Float,
    Str,
    Seq,
    Map,
    Chan,
    Func,
    /// Pointer parameter; accepts `&x` references and participates in
    /// out-parameter write-back.
    Ref,
    Record,
    Type,
}

impl ParamType {
    pub fn name(self) -> &'static str {
        match self {
            ParamType::Any => "any",
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Str => "string",
            ParamType::Seq => "sequence",
            ParamType::Map => "map",
            ParamType::Chan => "channel",
            ParamType::Func => "func",
            ParamType::Ref => "reference",
            ParamType::Record => "record",
            ParamType::Type => "type",
        }
    }
}

/// Declared return slot of a native function. The first `Error` slot is
/// the call-error index consulted by the error-propagating call form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetType {
    Value,
    Error,
}

/// Arguments handed to a native function.
pub struct NativeCall {
    pub cancel: CancelToken,
    pub args: Vec<Value>,
}

type NativeImpl = Box<dyn Fn(&NativeCall) -> Result<Vec<Value>, EvalError> + Send + Sync>;

/// A host function with a declared signature.
pub struct NativeFn {
    pub name: String,
    /// Fixed parameter types.
    pub params: Vec<ParamType>,
    /// Element type of the variadic tail, when variadic.
    pub variadic: Option<ParamType>,
    /// Declared return shape.
    pub returns: Vec<RetType>,
    func: NativeImpl,
}

impl NativeFn {
    /// Fixed-arity function returning a single value.
    pub fn new(
        name: impl Into<String>,
        params: Vec<ParamType>,
        func: impl Fn(&NativeCall) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        NativeFn {
            name: name.into(),
            params,
            variadic: None,
            returns: vec![RetType::Value],
            func: Box::new(move |call| func(call).map(|v| vec![v])),
        }
    }

    /// Fixed-arity function with an error-shaped second return slot, the
    /// `(T, error)` shape the propagating call form understands.
    pub fn fallible(
        name: impl Into<String>,
        params: Vec<ParamType>,
        func: impl Fn(&NativeCall) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        NativeFn {
            name: name.into(),
            params,
            variadic: None,
            returns: vec![RetType::Value, RetType::Error],
            func: Box::new(move |call| {
                Ok(match func(call) {
                    Ok(value) => vec![value, Value::Nil],
                    Err(message) => vec![Value::Nil, Value::string(message)],
                })
            }),
        }
    }

    /// Variadic function: `params` are the fixed slots, `elem` the tail
    /// element type. The tail arrives flattened after the fixed args.
    pub fn variadic(
        name: impl Into<String>,
        params: Vec<ParamType>,
        elem: ParamType,
        func: impl Fn(&NativeCall) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        NativeFn {
            name: name.into(),
            params,
            variadic: Some(elem),
            returns: vec![RetType::Value],
            func: Box::new(move |call| func(call).map(|v| vec![v])),
        }
    }

    /// Fully general constructor: explicit return shape, multi-value
    /// result vector.
    pub fn raw(
        name: impl Into<String>,
        params: Vec<ParamType>,
        variadic: Option<ParamType>,
        returns: Vec<RetType>,
        func: impl Fn(&NativeCall) -> Result<Vec<Value>, EvalError> + Send + Sync + 'static,
    ) -> Self {
        NativeFn {
            name: name.into(),
            params,
            variadic,
            returns,
            func: Box::new(func),
        }
    }

    /// Index of the first error-shaped return slot.
    pub(crate) fn error_index(&self) -> Option<usize> {
        self.returns.iter().position(|r| *r == RetType::Error)
    }

    /// Call the host function and validate the declared return shape.
    pub fn invoke(&self, call: &NativeCall) -> Result<Vec<Value>, EvalError> {
        let rvs = (self.func)(call)?;
        if rvs.len() != self.returns.len() {
            return Err(EvalError::new(
                ErrorKind::Internal,
                format!(
                    "native function {} returned {} values but declares {}",
                    self.name,
                    rvs.len(),
                    self.returns.len()
                ),
            ));
        }
        Ok(rvs)
    }
}

/// A script closure: parameter list, body, and the defining frame.
pub struct ScriptFn {
    /// Empty for anonymous functions.
    pub name: String,
    /// Receiver type name for methods. The receiver does not count
    /// toward the parameter list; it arrives separately and binds `self`.
    pub receiver: Option<String>,
    pub params: Vec<String>,
    pub variadic: bool,
    pub body: Arc<Stmt>,
    /// The defining environment frame (the capture).
    pub env: Env,
    pub options: Options,
    /// Script-declared type names in scope at the definition site.
    pub script_types: Vec<String>,
    pub pos: Pos,
}

impl ScriptFn {
    /// Invoke the closure: the canonical entry native code uses.
    ///
    /// `args` must match the parameter count exactly; for variadic
    /// functions the final argument is the tail, already packed as one
    /// sequence and bound without per-element unwrapping.
    pub fn invoke(
        &self,
        cancel: &CancelToken,
        recv: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        if args.len() != self.params.len() {
            return Err(errors::arity_mismatch(
                self.params.len(),
                args.len(),
                self.pos,
            ));
        }
        let child = self.env.new_child();
        if let Some(receiver) = recv {
            child.define("self", receiver);
        }
        for (param, arg) in self.params.iter().zip(args) {
            child.define(param, arg);
        }

        let mut interp = Interp {
            cancel: cancel.clone(),
            options: self.options.clone(),
            env: child,
            recv: None,
            script_types: self.script_types.clone(),
        };
        match interp.run_stmt(&self.body) {
            Ok(value) => Ok(value),
            Err(Flow::Return(value)) => Ok(value),
            Err(Flow::Break) => Err(errors::internal("unexpected break statement", self.pos)),
            Err(Flow::Continue) => Err(errors::internal(
                "unexpected continue statement",
                self.pos,
            )),
            Err(Flow::Err(e)) => Err(e.at_call_site(self.pos)),
        }
    }
}

/// Coerce an argument to a declared native parameter type.
fn convert_value(value: Value, want: ParamType, pos: Pos) -> Result<Value, EvalError> {
    let mismatch = |got: &Value| {
        errors::type_error(
            format!(
                "function wants argument type {} but received type {}",
                want.name(),
                got.kind_name()
            ),
            pos,
        )
    };
    match want {
        ParamType::Any => Ok(value),
        ParamType::Ref => match value {
            Value::Ref(_) => Ok(value),
            other => Err(mismatch(&other)),
        },
        _ => {
            let value = value.unwrap_ref();
            match (want, value) {
                (ParamType::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
                (ParamType::Int, Value::Int(n)) => Ok(Value::Int(n)),
                (ParamType::Int, Value::Float(f)) => Ok(Value::Int(f.trunc() as i64)),
                (ParamType::Float, Value::Float(f)) => Ok(Value::Float(f)),
                (ParamType::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
                (ParamType::Str, Value::Str(s)) => Ok(Value::Str(s)),
                (ParamType::Str, Value::Seq(items)) => {
                    // byte sequence to string
                    let mut bytes = Vec::with_capacity(items.read().len());
                    for item in items.read().iter() {
                        match item.unwrap_ref() {
                            Value::Int(n) if (0..=255).contains(&n) => bytes.push(n as u8),
                            other => return Err(mismatch(&other)),
                        }
                    }
                    String::from_utf8(bytes)
                        .map(Value::string)
                        .map_err(|_| errors::type_error("invalid utf-8 byte sequence", pos))
                }
                (ParamType::Seq, Value::Seq(items)) => Ok(Value::Seq(items)),
                (ParamType::Seq, Value::Str(s)) => {
                    // string to byte sequence
                    Ok(Value::seq(
                        s.as_bytes().iter().map(|b| Value::Int(*b as i64)).collect(),
                    ))
                }
                (ParamType::Map, Value::Map(entries)) => Ok(Value::Map(entries)),
                (ParamType::Chan, Value::Chan(ch)) => Ok(Value::Chan(ch)),
                (ParamType::Func, Value::Func(c)) => Ok(Value::Func(c)),
                (ParamType::Record, Value::Record(r)) => Ok(Value::Record(r)),
                (ParamType::Type, Value::Type(t)) => Ok(Value::Type(t)),
                (_, other) => Err(mismatch(&other)),
            }
        }
    }
}

/// Collapse a return vector: zero values to nil, one value to itself,
/// several to a sequence.
fn collapse(mut rvs: Vec<Value>) -> Value {
    match rvs.len() {
        0 => Value::Nil,
        1 => rvs.pop().expect("one return value"),
        _ => Value::seq(rvs),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during native call".to_string()
    }
}

impl Interp {
    /// Direction 1: a script call site invokes a callable value.
    pub(crate) fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        variadic_call: bool,
        propagate: bool,
        spawn: bool,
        pos: Pos,
    ) -> Exec<Value> {
        // A stale receiver from an earlier member access must not leak
        // into this call.
        self.recv = None;
        let callee_val = self.eval_expr(callee)?;
        let recv = self.recv.take();
        let callable = match callee_val.unwrap_ref() {
            Value::Func(callable) => callable,
            other => {
                return Err(Flow::Err(errors::type_error(
                    format!("cannot call type {}", other.kind_name()),
                    pos,
                )))
            }
        };

        // Evaluate argument expressions left-to-right.
        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push(self.eval_expr(arg)?);
        }

        // The spread argument must be a sequence.
        let spread = if variadic_call {
            let Some(last) = evaluated.pop() else {
                return Err(Flow::Err(errors::arity_mismatch(1, 0, pos)));
            };
            match last.unwrap_ref() {
                Value::Seq(_) => Some(last.unwrap_ref()),
                other => {
                    return Err(Flow::Err(EvalError::at(
                        ErrorKind::Arity,
                        format!(
                            "call is variadic but last parameter is of type {}",
                            other.kind_name()
                        ),
                        pos,
                    )))
                }
            }
        } else {
            None
        };

        match callable {
            Callable::Script(func) => {
                self.call_script(func, recv, evaluated, spread, args.len(), spawn, pos)
            }
            Callable::Native(func) => self.call_native(
                func, args, evaluated, spread, variadic_call, propagate, spawn, pos,
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn call_script(
        &mut self,
        func: Arc<ScriptFn>,
        recv: Option<Value>,
        mut evaluated: Vec<Value>,
        spread: Option<Value>,
        arg_count: usize,
        spawn: bool,
        pos: Pos,
    ) -> Exec<Value> {
        let n = func.params.len();
        let recv = if func.receiver.is_some() { recv } else { None };

        let argv = if func.variadic {
            let fixed = n - 1;
            match spread {
                Some(tail) => {
                    // Spread call: the sequence passes through as the tail.
                    if evaluated.len() != fixed {
                        return Err(Flow::Err(errors::arity_mismatch(n, arg_count, pos)));
                    }
                    evaluated.push(tail);
                    evaluated
                }
                None => {
                    if evaluated.len() < fixed {
                        return Err(Flow::Err(errors::arity_mismatch(n, arg_count, pos)));
                    }
                    let tail = evaluated.split_off(fixed);
                    evaluated.push(Value::seq(tail));
                    evaluated
                }
            }
        } else {
            if spread.is_some() {
                return Err(Flow::Err(EvalError::at(
                    ErrorKind::Arity,
                    "call is variadic but function is not",
                    pos,
                )));
            }
            if evaluated.len() != n {
                return Err(Flow::Err(errors::arity_mismatch(n, arg_count, pos)));
            }
            evaluated
        };

        trace!(name = %func.name, args = argv.len(), spawn, "call script function");

        if spawn {
            let cancel = self.cancel.clone();
            thread::spawn(move || {
                let _ = func.invoke(&cancel, recv, argv);
            });
            return Ok(Value::Nil);
        }

        func.invoke(&self.cancel, recv, argv)
            .map_err(|e| Flow::Err(e.at_call_site(pos)))
    }

    #[allow(clippy::too_many_arguments)]
    fn call_native(
        &mut self,
        func: Arc<NativeFn>,
        arg_exprs: &[Expr],
        evaluated: Vec<Value>,
        spread: Option<Value>,
        variadic_call: bool,
        propagate: bool,
        spawn: bool,
        pos: Pos,
    ) -> Exec<Value> {
        let fixed = func.params.len();
        let arg_count = arg_exprs.len();

        let mut argv = Vec::with_capacity(evaluated.len());
        match (func.variadic, variadic_call) {
            (None, false) => {
                if evaluated.len() != fixed {
                    return Err(Flow::Err(errors::arity_mismatch(fixed, arg_count, pos)));
                }
                for (value, want) in evaluated.into_iter().zip(func.params.iter()) {
                    argv.push(convert_value(value, *want, pos)?);
                }
            }
            (None, true) => {
                return Err(Flow::Err(EvalError::at(
                    ErrorKind::Arity,
                    "call is variadic but function is not",
                    pos,
                )));
            }
            (Some(elem), false) => {
                if evaluated.len() < fixed {
                    return Err(Flow::Err(errors::arity_mismatch(fixed, arg_count, pos)));
                }
                let mut values = evaluated.into_iter();
                for want in &func.params {
                    let value = values.next().expect("length checked");
                    argv.push(convert_value(value, *want, pos)?);
                }
                for value in values {
                    argv.push(convert_value(value, elem, pos)?);
                }
            }
            (Some(elem), true) => {
                if evaluated.len() != fixed {
                    return Err(Flow::Err(errors::arity_mismatch(fixed + 1, arg_count, pos)));
                }
                for (value, want) in evaluated.into_iter().zip(func.params.iter()) {
                    argv.push(convert_value(value, *want, pos)?);
                }
                let tail = spread.expect("spread checked");
                let Value::Seq(items) = tail else {
                    unreachable!("spread is a sequence")
                };
                for value in items.read().iter() {
                    argv.push(convert_value(value.clone(), elem, pos)?);
                }
            }
        }

        // Out-parameters: `&ident` passed to a pointer slot writes the
        // post-call cell value back into the caller's binding.
        let mut writebacks = Vec::new();
        if !variadic_call {
            for (i, expr) in arg_exprs.iter().enumerate().take(fixed) {
                if func.params.get(i) != Some(&ParamType::Ref) {
                    continue;
                }
                if let ExprKind::Addr(inner) = &expr.kind {
                    if let ExprKind::Ident(name) = &inner.kind {
                        writebacks.push((i, name.clone()));
                    }
                }
            }
        }

        trace!(name = %func.name, args = argv.len(), spawn, "call native function");

        let call = NativeCall {
            cancel: self.cancel.clone(),
            args: argv,
        };

        if spawn {
            thread::spawn(move || {
                let _ = func.invoke(&call);
            });
            return Ok(Value::Nil);
        }

        let rvs = if self.options.debug {
            func.invoke(&call)
        } else {
            match catch_unwind(AssertUnwindSafe(|| func.invoke(&call))) {
                Ok(result) => result,
                Err(payload) => Err(errors::host_panic(panic_message(payload), pos)),
            }
        };
        let rvs = rvs.map_err(|e| Flow::Err(e.with_pos(pos)))?;

        for (slot, name) in writebacks {
            if let Some(Value::Ref(cell)) = call.args.get(slot) {
                let value = cell.read().clone();
                self.assign_ident(&name, value);
            }
        }

        // Error-return extraction.
        if propagate {
            if let Some(idx) = func.error_index() {
                let err_val = rvs
                    .get(idx)
                    .cloned()
                    .unwrap_or(Value::Nil);
                if !err_val.is_nil() {
                    return Err(Flow::Err(errors::user_throw(err_val.to_string(), pos)));
                }
                let rest: Vec<Value> = rvs
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, v)| (i != idx).then_some(v))
                    .collect();
                return Ok(collapse(rest));
            }
        }
        Ok(collapse(rvs))
    }
}

/// Call a callable value from host code.
///
/// Script functions receive the variadic tail packed automatically;
/// native functions are coerced against their declared signature.
pub fn call_value(
    cancel: &CancelToken,
    func: &Value,
    args: Vec<Value>,
) -> Result<Value, EvalError> {
    match func.unwrap_ref() {
        Value::Func(Callable::Script(f)) => {
            let argv = if f.variadic {
                let fixed = f.params.len() - 1;
                if args.len() < fixed {
                    return Err(errors::arity_mismatch(f.params.len(), args.len(), f.pos));
                }
                let mut argv = args;
                let tail = argv.split_off(fixed);
                argv.push(Value::seq(tail));
                argv
            } else {
                args
            };
            f.invoke(cancel, None, argv)
        }
        Value::Func(Callable::Native(f)) => {
            let fixed = f.params.len();
            if (f.variadic.is_none() && args.len() != fixed)
                || (f.variadic.is_some() && args.len() < fixed)
            {
                return Err(errors::arity_mismatch(fixed, args.len(), Pos::default()));
            }
            let mut argv = Vec::with_capacity(args.len());
            let mut values = args.into_iter();
            for want in &f.params {
                let value = values.next().expect("length checked");
                argv.push(convert_value(value, *want, Pos::default())?);
            }
            if let Some(elem) = f.variadic {
                for value in values {
                    argv.push(convert_value(value, elem, Pos::default())?);
                }
            }
            let call = NativeCall {
                cancel: cancel.clone(),
                args: argv,
            };
            Ok(collapse(f.invoke(&call)?))
        }
        other => Err(EvalError::new(
            ErrorKind::Type,
            format!("cannot call type {}", other.kind_name()),
        )),
    }
}
