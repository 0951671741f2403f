//! The `math` package.

use crate::eval::call::{NativeFn, ParamType};
use crate::eval::errors::{ErrorKind, EvalError};
use crate::eval::value::Value;

use super::{symbol, want_float};

pub(crate) fn symbols() -> Vec<(String, Value)> {
    let mut table = vec![
        ("pi".to_string(), Value::Float(std::f64::consts::PI)),
        ("e".to_string(), Value::Float(std::f64::consts::E)),
        symbol(NativeFn::new("abs", vec![ParamType::Any], |call| {
            match call.args[0].unwrap_ref() {
                Value::Int(n) => Ok(Value::Int(n.wrapping_abs())),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => Err(EvalError::new(
                    ErrorKind::Type,
                    format!("abs expects number, received {}", other.kind_name()),
                )),
            }
        })),
        symbol(NativeFn::new("floor", vec![ParamType::Float], |call| {
            Ok(Value::Float(want_float(&call.args[0], "floor")?.floor()))
        })),
        symbol(NativeFn::new("ceil", vec![ParamType::Float], |call| {
            Ok(Value::Float(want_float(&call.args[0], "ceil")?.ceil()))
        })),
        symbol(NativeFn::new("sqrt", vec![ParamType::Float], |call| {
            Ok(Value::Float(want_float(&call.args[0], "sqrt")?.sqrt()))
        })),
        symbol(NativeFn::new(
            "pow",
            vec![ParamType::Float, ParamType::Float],
            |call| {
                let base = want_float(&call.args[0], "pow")?;
                let exp = want_float(&call.args[1], "pow")?;
                Ok(Value::Float(base.powf(exp)))
            },
        )),
    ];
    table.push(symbol(NativeFn::variadic(
        "min",
        vec![],
        ParamType::Any,
        |call| extremum(call.args.as_slice(), "min", |a, b| a < b),
    )));
    table.push(symbol(NativeFn::variadic(
        "max",
        vec![],
        ParamType::Any,
        |call| extremum(call.args.as_slice(), "max", |a, b| a > b),
    )));
    table
}

fn extremum(
    args: &[Value],
    what: &str,
    wins: impl Fn(f64, f64) -> bool,
) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::new(
            ErrorKind::Arity,
            format!("{what} expects at least 1 argument"),
        ));
    }
    let mut best = args[0].unwrap_ref();
    let mut best_key = want_float(&best, what)?;
    for arg in &args[1..] {
        let key = want_float(arg, what)?;
        if wins(key, best_key) {
            best = arg.unwrap_ref();
            best_key = key;
        }
    }
    Ok(best)
}
