//! Built-in bindings and standard packages.
//!
//! `define_core` installs the always-available functions directly into an
//! environment; `register_std` publishes the `strings` and `math`
//! packages through the process-wide registry, where scripts reach them
//! with `import`.

mod math;
mod strings;

use crate::eval::call::{Callable, NativeFn, ParamType};
use crate::eval::env::Env;
use crate::eval::errors::{ErrorKind, EvalError};
use crate::eval::registry::register_package;
use crate::eval::value::{TypeDesc, TypeOrigin, Value};

/// Wrap a native function as a package symbol.
pub(crate) fn symbol(func: NativeFn) -> (String, Value) {
    (func.name.clone(), Value::Func(Callable::native(func)))
}

pub(crate) fn want_str(value: &Value, what: &str) -> Result<String, EvalError> {
    match value.unwrap_ref() {
        Value::Str(s) => Ok(s.to_string()),
        other => Err(EvalError::new(
            ErrorKind::Type,
            format!("{what} expects string, received {}", other.kind_name()),
        )),
    }
}

pub(crate) fn want_int(value: &Value, what: &str) -> Result<i64, EvalError> {
    match value.unwrap_ref() {
        Value::Int(n) => Ok(n),
        other => Err(EvalError::new(
            ErrorKind::Type,
            format!("{what} expects int, received {}", other.kind_name()),
        )),
    }
}

pub(crate) fn want_float(value: &Value, what: &str) -> Result<f64, EvalError> {
    match value.unwrap_ref() {
        Value::Float(f) => Ok(f),
        Value::Int(n) => Ok(n as f64),
        other => Err(EvalError::new(
            ErrorKind::Type,
            format!("{what} expects number, received {}", other.kind_name()),
        )),
    }
}

/// Register the standard packages into the global registry.
pub fn register_std() {
    register_package("strings", strings::symbols());
    register_package("math", math::symbols());
}

/// Define the core bindings in an environment.
pub fn define_core(env: &Env) {
    for name in ["bool", "int", "float", "string", "sequence", "map", "channel"] {
        env.define_type(name, TypeDesc::new(name, TypeOrigin::Builtin, Vec::new()));
    }

    env.define_native(NativeFn::variadic("print", vec![], ParamType::Any, |call| {
        print!("{}", join_args(&call.args));
        Ok(Value::Nil)
    }));
    env.define_native(NativeFn::variadic(
        "println",
        vec![],
        ParamType::Any,
        |call| {
            println!("{}", join_args(&call.args));
            Ok(Value::Nil)
        },
    ));

    env.define_native(NativeFn::new("len", vec![ParamType::Any], |call| {
        match call.args[0].unwrap_ref() {
            Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
            Value::Seq(items) => Ok(Value::Int(items.read().len() as i64)),
            Value::Map(entries) => Ok(Value::Int(entries.read().len() as i64)),
            other => Err(EvalError::new(
                ErrorKind::Type,
                format!("cannot get length of {}", other.kind_name()),
            )),
        }
    }));

    env.define_native(NativeFn::new("str", vec![ParamType::Any], |call| {
        Ok(Value::string(call.args[0].unwrap_ref().to_string()))
    }));

    env.define_native(NativeFn::new("int", vec![ParamType::Any], |call| {
        match call.args[0].unwrap_ref() {
            Value::Int(n) => Ok(Value::Int(n)),
            Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
            Value::Bool(b) => Ok(Value::Int(i64::from(b))),
            Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                EvalError::new(ErrorKind::Type, format!("cannot parse '{s}' as int"))
            }),
            other => Err(EvalError::new(
                ErrorKind::Type,
                format!("cannot convert {} to int", other.kind_name()),
            )),
        }
    }));

    env.define_native(NativeFn::new("float", vec![ParamType::Any], |call| {
        match call.args[0].unwrap_ref() {
            Value::Float(f) => Ok(Value::Float(f)),
            Value::Int(n) => Ok(Value::Float(n as f64)),
            Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                EvalError::new(ErrorKind::Type, format!("cannot parse '{s}' as float"))
            }),
            other => Err(EvalError::new(
                ErrorKind::Type,
                format!("cannot convert {} to float", other.kind_name()),
            )),
        }
    }));

    env.define_native(NativeFn::new("bool", vec![ParamType::Any], |call| {
        Ok(Value::Bool(call.args[0].is_truthy()))
    }));

    env.define_native(NativeFn::new("type_of", vec![ParamType::Any], |call| {
        match call.args[0].unwrap_ref() {
            Value::Record(r) => Ok(Value::string(r.type_desc().name().to_string())),
            other => Ok(Value::string(other.kind_name())),
        }
    }));

    env.define_native(NativeFn::new("keys", vec![ParamType::Map], |call| {
        match call.args[0].unwrap_ref() {
            Value::Map(entries) => Ok(Value::seq(
                entries.read().keys().map(|k| k.to_value()).collect(),
            )),
            other => Err(EvalError::new(
                ErrorKind::Type,
                format!("keys expects map, received {}", other.kind_name()),
            )),
        }
    }));

    env.define_native(NativeFn::variadic("range", vec![], ParamType::Int, |call| {
        let bounds: Vec<i64> = call
            .args
            .iter()
            .map(|v| want_int(v, "range"))
            .collect::<Result<_, _>>()?;
        let (start, stop, step) = match bounds.as_slice() {
            [stop] => (0, *stop, 1),
            [start, stop] => (*start, *stop, 1),
            [start, stop, step] if *step != 0 => (*start, *stop, *step),
            [_, _, _] => {
                return Err(EvalError::new(ErrorKind::Type, "range step cannot be zero"))
            }
            _ => {
                return Err(EvalError::new(
                    ErrorKind::Arity,
                    format!("range expects 1 to 3 arguments but received {}", call.args.len()),
                ))
            }
        };
        let mut items = Vec::new();
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            items.push(Value::Int(i));
            i += step;
        }
        Ok(Value::seq(items))
    }));
}

fn join_args(args: &[Value]) -> String {
    args.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::call::call_value;
    use crate::eval::cancel::CancelToken;

    fn core_env() -> Env {
        let env = Env::new();
        define_core(&env);
        env
    }

    #[test]
    fn len_counts_elements() {
        let env = core_env();
        let len = env.lookup("len").expect("core binding");
        let cancel = CancelToken::never();
        assert_eq!(
            call_value(&cancel, &len, vec![Value::string("héllo")]).expect("len"),
            Value::Int(5)
        );
        assert_eq!(
            call_value(&cancel, &len, vec![Value::seq(vec![Value::Nil])]).expect("len"),
            Value::Int(1)
        );
    }

    #[test]
    fn conversions() {
        let env = core_env();
        let cancel = CancelToken::never();
        let int = env.lookup("int").expect("core binding");
        assert_eq!(
            call_value(&cancel, &int, vec![Value::string("12")]).expect("int"),
            Value::Int(12)
        );
        assert_eq!(
            call_value(&cancel, &int, vec![Value::Float(3.7)]).expect("int"),
            Value::Int(3)
        );
        let float = env.lookup("float").expect("core binding");
        assert_eq!(
            call_value(&cancel, &float, vec![Value::Int(2)]).expect("float"),
            Value::Float(2.0)
        );
    }

    #[test]
    fn range_shapes() {
        let env = core_env();
        let cancel = CancelToken::never();
        let range = env.lookup("range").expect("core binding");
        assert_eq!(
            call_value(&cancel, &range, vec![Value::Int(3)]).expect("range"),
            Value::seq(vec![Value::Int(0), Value::Int(1), Value::Int(2)])
        );
        assert_eq!(
            call_value(&cancel, &range, vec![Value::Int(2), Value::Int(5)]).expect("range"),
            Value::seq(vec![Value::Int(2), Value::Int(3), Value::Int(4)])
        );
    }
}
