//! The `strings` package.

use crate::eval::call::{NativeFn, ParamType};
use crate::eval::value::Value;

use super::{symbol, want_int, want_str};

pub(crate) fn symbols() -> Vec<(String, Value)> {
    vec![
        symbol(NativeFn::new("upper", vec![ParamType::Str], |call| {
            Ok(Value::string(
                want_str(&call.args[0], "upper")?.to_uppercase(),
            ))
        })),
        symbol(NativeFn::new("lower", vec![ParamType::Str], |call| {
            Ok(Value::string(
                want_str(&call.args[0], "lower")?.to_lowercase(),
            ))
        })),
        symbol(NativeFn::new(
            "contains",
            vec![ParamType::Str, ParamType::Str],
            |call| {
                let haystack = want_str(&call.args[0], "contains")?;
                let needle = want_str(&call.args[1], "contains")?;
                Ok(Value::Bool(haystack.contains(&needle)))
            },
        )),
        symbol(NativeFn::new(
            "has_prefix",
            vec![ParamType::Str, ParamType::Str],
            |call| {
                let s = want_str(&call.args[0], "has_prefix")?;
                let prefix = want_str(&call.args[1], "has_prefix")?;
                Ok(Value::Bool(s.starts_with(&prefix)))
            },
        )),
        symbol(NativeFn::new(
            "has_suffix",
            vec![ParamType::Str, ParamType::Str],
            |call| {
                let s = want_str(&call.args[0], "has_suffix")?;
                let suffix = want_str(&call.args[1], "has_suffix")?;
                Ok(Value::Bool(s.ends_with(&suffix)))
            },
        )),
        symbol(NativeFn::new(
            "index",
            vec![ParamType::Str, ParamType::Str],
            |call| {
                let s = want_str(&call.args[0], "index")?;
                let needle = want_str(&call.args[1], "index")?;
                Ok(Value::Int(match s.find(&needle) {
                    Some(byte) => s[..byte].chars().count() as i64,
                    None => -1,
                }))
            },
        )),
        symbol(NativeFn::new(
            "split",
            vec![ParamType::Str, ParamType::Str],
            |call| {
                let s = want_str(&call.args[0], "split")?;
                let sep = want_str(&call.args[1], "split")?;
                let parts = if sep.is_empty() {
                    s.chars().map(|c| Value::string(c.to_string())).collect()
                } else {
                    s.split(&sep).map(Value::string).collect()
                };
                Ok(Value::seq(parts))
            },
        )),
        symbol(NativeFn::new(
            "join",
            vec![ParamType::Seq, ParamType::Str],
            |call| {
                let Value::Seq(items) = call.args[0].unwrap_ref() else {
                    return Ok(Value::Nil);
                };
                let sep = want_str(&call.args[1], "join")?;
                let parts: Vec<String> =
                    items.read().iter().map(|item| item.to_string()).collect();
                Ok(Value::string(parts.join(&sep)))
            },
        )),
        symbol(NativeFn::new(
            "replace",
            vec![ParamType::Str, ParamType::Str, ParamType::Str],
            |call| {
                let s = want_str(&call.args[0], "replace")?;
                let old = want_str(&call.args[1], "replace")?;
                let new = want_str(&call.args[2], "replace")?;
                Ok(Value::string(s.replace(&old, &new)))
            },
        )),
        symbol(NativeFn::new("trim_space", vec![ParamType::Str], |call| {
            Ok(Value::string(
                want_str(&call.args[0], "trim_space")?.trim().to_string(),
            ))
        })),
        symbol(NativeFn::new(
            "repeat",
            vec![ParamType::Str, ParamType::Int],
            |call| {
                let s = want_str(&call.args[0], "repeat")?;
                let n = want_int(&call.args[1], "repeat")?.max(0) as usize;
                Ok(Value::string(s.repeat(n)))
            },
        )),
    ]
}
