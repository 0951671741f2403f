//! Unary operator evaluation.

use crate::ast::{Pos, UnaryOp};

use super::errors::{self, EvalError};
use super::value::Value;

pub(crate) fn eval_unary(op: UnaryOp, value: Value, pos: Pos) -> Result<Value, EvalError> {
    let value = value.unwrap_ref();
    match (op, value) {
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        // `!` applies truthiness, so it works on any value.
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::BitNot, Value::Int(n)) => Ok(Value::Int(!n)),
        (op, value) => Err(errors::type_error(
            format!("invalid operation {} on {}", op, value.kind_name()),
            pos,
        )),
    }
}
