//! Binary operator evaluation.
//!
//! Numeric operators follow the usual tower: two ints stay int, any
//! float operand widens both to float. `+` also concatenates strings and
//! sequences. Operands are unwrapped one reference layer first.

use crate::ast::{BinaryOp, Pos};

use super::errors::{self, EvalError};
use super::value::Value;

pub(crate) fn eval_binary(
    op: BinaryOp,
    lhs: Value,
    rhs: Value,
    pos: Pos,
) -> Result<Value, EvalError> {
    let lhs = lhs.unwrap_ref();
    let rhs = rhs.unwrap_ref();
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(lhs == rhs)),
        BinaryOp::NotEq => return Ok(Value::Bool(lhs != rhs)),
        _ => {}
    }

    match (op, lhs, rhs) {
        (BinaryOp::Add, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(b))),
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            Ok(Value::string(format!("{a}{b}")))
        }
        (BinaryOp::Add, Value::Seq(a), Value::Seq(b)) => {
            let mut items = a.read().clone();
            items.extend(b.read().iter().cloned());
            Ok(Value::seq(items))
        }
        (BinaryOp::Sub, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(b))),
        (BinaryOp::Mul, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(b))),
        (BinaryOp::Div, Value::Int(a), Value::Int(b)) => {
            if b == 0 {
                return Err(errors::type_error("division by zero", pos));
            }
            Ok(Value::Int(a.wrapping_div(b)))
        }
        (BinaryOp::Mod, Value::Int(a), Value::Int(b)) => {
            if b == 0 {
                return Err(errors::type_error("modulo by zero", pos));
            }
            Ok(Value::Int(a.wrapping_rem(b)))
        }
        (BinaryOp::Pow, Value::Int(a), Value::Int(b)) => {
            if b >= 0 {
                match u32::try_from(b) {
                    Ok(exp) => Ok(Value::Int(a.wrapping_pow(exp))),
                    Err(_) => Ok(Value::Float((a as f64).powf(b as f64))),
                }
            } else {
                Ok(Value::Float((a as f64).powf(b as f64)))
            }
        }

        (BinaryOp::BitAnd, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a & b)),
        (BinaryOp::BitOr, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a | b)),
        (BinaryOp::BitXor, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a ^ b)),
        (BinaryOp::Shl, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_shl(b as u32))),
        (BinaryOp::Shr, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_shr(b as u32))),

        (BinaryOp::Lt, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a < b)),
        (BinaryOp::LtEq, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a <= b)),
        (BinaryOp::Gt, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a > b)),
        (BinaryOp::GtEq, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a >= b)),

        (BinaryOp::Lt, Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a < b)),
        (BinaryOp::LtEq, Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a <= b)),
        (BinaryOp::Gt, Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a > b)),
        (BinaryOp::GtEq, Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a >= b)),

        // Mixed numeric operands widen to float.
        (op, lhs, rhs) => {
            if let (Some(a), Some(b)) = (as_float(&lhs), as_float(&rhs)) {
                return eval_float(op, a, b, pos);
            }
            Err(errors::type_error(
                format!(
                    "invalid operation {} on {} and {}",
                    op,
                    lhs.kind_name(),
                    rhs.kind_name()
                ),
                pos,
            ))
        }
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn eval_float(op: BinaryOp, a: f64, b: f64, pos: Pos) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::Div => Ok(Value::Float(a / b)),
        BinaryOp::Mod => Ok(Value::Float(a % b)),
        BinaryOp::Pow => Ok(Value::Float(a.powf(b))),
        BinaryOp::Lt => Ok(Value::Bool(a < b)),
        BinaryOp::LtEq => Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => Ok(Value::Bool(a > b)),
        BinaryOp::GtEq => Ok(Value::Bool(a >= b)),
        other => Err(errors::type_error(
            format!("invalid operation {other} on float and float"),
            pos,
        )),
    }
}
