//! Expression evaluation, plus the write-mode dispatcher for assignment
//! targets.

use rustc_hash::FxHashMap;

use crate::ast::{BinaryOp, Expr, ExprKind, Pos};

use super::call::{Callable, ScriptFn};
use super::chan::Channel;
use super::errors::{self};
use super::operators::eval_binary;
use super::unary_operators::eval_unary;
use super::value::{MapKey, Record, Value};
use super::{Exec, Flow, Interp};

impl Interp {
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Exec<Value> {
        let pos = expr.pos;
        match &expr.kind {
            ExprKind::Nil => Ok(Value::Nil),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::Str(s) => Ok(Value::string(s.clone())),

            ExprKind::Ident(name) => self
                .env
                .lookup(name)
                .map_err(|e| Flow::Err(e.with_pos(pos))),

            ExprKind::Seq(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Ok(Value::seq(values))
            }

            ExprKind::Map(entries) => {
                let mut map = FxHashMap::default();
                for (key_expr, value_expr) in entries {
                    let key = self.eval_expr(key_expr)?;
                    let key = MapKey::from_value(&key, key_expr.pos)?;
                    let value = self.eval_expr(value_expr)?;
                    map.insert(key, value);
                }
                Ok(Value::map(map))
            }

            ExprKind::Record { type_name, fields } => {
                let desc = self
                    .env
                    .lookup_type(type_name)
                    .map_err(|e| Flow::Err(e.with_pos(pos)))?;
                let mut values = FxHashMap::default();
                for (name, value_expr) in fields {
                    if !desc.has_field(name) {
                        return Err(Flow::Err(errors::type_error(
                            format!("no field '{}' on type {}", name, desc.name()),
                            value_expr.pos,
                        )));
                    }
                    values.insert(name.clone(), self.eval_expr(value_expr)?);
                }
                Ok(Value::Record(Record::new(desc, values)))
            }

            ExprKind::Member { expr, name } => {
                let base = self.eval_expr(expr)?.unwrap_ref();
                self.eval_member(base, name, pos)
            }

            ExprKind::Index { expr, index } => {
                let base = self.eval_expr(expr)?.unwrap_ref();
                let idx = self.eval_expr(index)?.unwrap_ref();
                eval_index(base, idx, pos).map_err(Flow::Err)
            }

            ExprKind::Slice { expr, from, to } => {
                let base = self.eval_expr(expr)?.unwrap_ref();
                let from = match from {
                    Some(e) => Some(self.eval_expr(e)?),
                    None => None,
                };
                let to = match to {
                    Some(e) => Some(self.eval_expr(e)?),
                    None => None,
                };
                eval_slice(base, from, to, pos).map_err(Flow::Err)
            }

            ExprKind::Addr(inner) => {
                let value = match &inner.kind {
                    ExprKind::Ident(name) => self
                        .env
                        .lookup(name)
                        .map_err(|e| Flow::Err(e.with_pos(pos)))?,
                    _ => self.eval_expr(inner)?,
                };
                Ok(Value::reference(value))
            }

            ExprKind::Deref(inner) => match self.eval_expr(inner)? {
                Value::Ref(cell) => Ok(cell.read().clone()),
                other => Err(Flow::Err(errors::type_error(
                    format!("cannot dereference type {}", other.kind_name()),
                    pos,
                ))),
            },

            ExprKind::Unary { op, expr } => {
                let value = self.eval_expr(expr)?;
                eval_unary(*op, value, pos).map_err(Flow::Err)
            }

            ExprKind::Binary { op, lhs, rhs } => match op {
                BinaryOp::And => {
                    let left = self.eval_expr(lhs)?;
                    if !left.is_truthy() {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(self.eval_expr(rhs)?.is_truthy()))
                }
                BinaryOp::Or => {
                    let left = self.eval_expr(lhs)?;
                    if left.is_truthy() {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(self.eval_expr(rhs)?.is_truthy()))
                }
                _ => {
                    let left = self.eval_expr(lhs)?;
                    let right = self.eval_expr(rhs)?;
                    eval_binary(*op, left, right, pos).map_err(Flow::Err)
                }
            },

            ExprKind::Ternary { cond, then, els } => {
                if self.eval_expr(cond)?.is_truthy() {
                    self.eval_expr(then)
                } else {
                    self.eval_expr(els)
                }
            }

            ExprKind::Paren(inner) => self.eval_expr(inner),

            ExprKind::Func(decl) => {
                let func = ScriptFn {
                    name: decl.name.clone(),
                    receiver: decl.receiver.clone(),
                    params: decl.params.clone(),
                    variadic: decl.variadic,
                    body: decl.body.clone(),
                    env: self.env.clone(),
                    options: self.options.clone(),
                    script_types: self.script_types.clone(),
                    pos: decl.pos,
                };
                let value = Value::Func(Callable::script(func));
                if !decl.name.is_empty() {
                    match &decl.receiver {
                        // Methods install under "Type.name"; plain named
                        // functions under their own name.
                        Some(receiver) => self
                            .env
                            .define(&format!("{receiver}.{}", decl.name), value.clone()),
                        None => self.env.define(&decl.name, value.clone()),
                    }
                }
                Ok(value)
            }

            ExprKind::Call {
                callee,
                args,
                variadic,
                propagate,
            } => self.eval_call(callee, args, *variadic, *propagate, false, pos),

            ExprKind::ChanSend { chan, value } => {
                let channel = match self.eval_expr(chan)?.unwrap_ref() {
                    Value::Chan(channel) => channel,
                    other => {
                        return Err(Flow::Err(errors::type_error(
                            format!("send to non-chan type {}", other.kind_name()),
                            pos,
                        )))
                    }
                };
                let value = self.eval_expr(value)?;
                channel.send(&self.cancel, value, pos)?;
                Ok(Value::Nil)
            }

            ExprKind::MakeChan { size } => {
                let capacity = match size {
                    Some(e) => match self.eval_expr(e)?.unwrap_ref() {
                        Value::Int(n) if n >= 0 => n as usize,
                        other => {
                            return Err(Flow::Err(errors::type_error(
                                format!("channel size must be int, not {}", other.kind_name()),
                                pos,
                            )))
                        }
                    },
                    None => 0,
                };
                Ok(Value::Chan(Channel::new(capacity)))
            }

            ExprKind::Make { type_name } => {
                let desc = self
                    .env
                    .lookup_type(type_name)
                    .map_err(|e| Flow::Err(e.with_pos(pos)))?;
                Ok(Value::Record(Record::new(desc, FxHashMap::default())))
            }
        }
    }

    fn eval_member(&mut self, base: Value, name: &str, pos: Pos) -> Exec<Value> {
        match base {
            Value::Module(module) => module
                .lookup(name)
                .or_else(|_| module.lookup_type(name).map(Value::Type))
                .map_err(|e| Flow::Err(e.with_pos(pos))),

            Value::Record(record) => {
                if let Some(value) = record.get(name) {
                    return Ok(value);
                }
                let key = format!("{}.{}", record.type_desc().name(), name);
                match self.env.lookup(&key) {
                    Ok(value @ Value::Func(_)) => {
                        self.recv = Some(Value::Record(record));
                        Ok(value)
                    }
                    _ => Err(Flow::Err(errors::type_error(
                        format!(
                            "no member '{}' on type {}",
                            name,
                            record.type_desc().name()
                        ),
                        pos,
                    ))),
                }
            }

            Value::Map(entries) => Ok(entries
                .read()
                .get(&MapKey::Str(name.into()))
                .cloned()
                .unwrap_or(Value::Nil)),

            Value::Type(desc) => {
                let key = format!("{}.{}", desc.name(), name);
                self.env
                    .lookup(&key)
                    .map_err(|_| {
                        Flow::Err(errors::type_error(
                            format!("no member '{}' on type {}", name, desc.name()),
                            pos,
                        ))
                    })
            }

            other => Err(Flow::Err(errors::type_error(
                format!("cannot access member '{}' of {}", name, other.kind_name()),
                pos,
            ))),
        }
    }

    /// Resolve an assignable expression and perform the write.
    pub(crate) fn assign_to(&mut self, target: &Expr, value: Value) -> Exec<()> {
        let pos = target.pos;
        match &target.kind {
            ExprKind::Ident(name) => {
                self.assign_ident(name, value);
                Ok(())
            }

            ExprKind::Member { expr, name } => {
                let base = self.eval_expr(expr)?.unwrap_ref();
                match base {
                    Value::Record(record) => {
                        record.set(name, value, pos).map_err(Flow::Err)
                    }
                    Value::Module(module) => {
                        module.define(name, value);
                        Ok(())
                    }
                    Value::Map(entries) => {
                        entries.write().insert(MapKey::Str(name.as_str().into()), value);
                        Ok(())
                    }
                    other => Err(Flow::Err(errors::type_error(
                        format!("cannot assign member of {}", other.kind_name()),
                        pos,
                    ))),
                }
            }

            ExprKind::Index { expr, index } => {
                let base = self.eval_expr(expr)?.unwrap_ref();
                let idx = self.eval_expr(index)?.unwrap_ref();
                match base {
                    Value::Seq(items) => {
                        let i = match idx {
                            Value::Int(i) => i,
                            other => {
                                return Err(Flow::Err(errors::type_error(
                                    format!(
                                        "sequence index must be int, not {}",
                                        other.kind_name()
                                    ),
                                    pos,
                                )))
                            }
                        };
                        let mut items = items.write();
                        let len = items.len() as i64;
                        if i >= 0 && i < len {
                            items[i as usize] = value;
                            Ok(())
                        } else if i == len {
                            // Writing one past the end appends.
                            items.push(value);
                            Ok(())
                        } else {
                            Err(Flow::Err(errors::type_error("index out of range", pos)))
                        }
                    }
                    Value::Map(entries) => {
                        let key = MapKey::from_value(&idx, pos)?;
                        entries.write().insert(key, value);
                        Ok(())
                    }
                    other => Err(Flow::Err(errors::type_error(
                        format!("cannot assign into type {}", other.kind_name()),
                        pos,
                    ))),
                }
            }

            ExprKind::Deref(inner) => match self.eval_expr(inner)? {
                Value::Ref(cell) => {
                    *cell.write() = value;
                    Ok(())
                }
                other => Err(Flow::Err(errors::type_error(
                    format!("cannot dereference type {}", other.kind_name()),
                    pos,
                ))),
            },

            ExprKind::Paren(inner) => self.assign_to(inner, value),

            _ => Err(Flow::Err(errors::type_error(
                "invalid assignment target",
                pos,
            ))),
        }
    }

    /// Assign to an identifier: reuse the nearest existing binding, or
    /// create one in the innermost frame when undeclared.
    pub(crate) fn assign_ident(&mut self, name: &str, value: Value) {
        if self.env.assign(name, value.clone()).is_err() {
            self.env.define(name, value);
        }
    }
}

fn eval_index(base: Value, idx: Value, pos: Pos) -> Result<Value, super::errors::EvalError> {
    match base {
        Value::Seq(items) => {
            let i = match idx {
                Value::Int(i) => i,
                other => {
                    return Err(errors::type_error(
                        format!("sequence index must be int, not {}", other.kind_name()),
                        pos,
                    ))
                }
            };
            let items = items.read();
            if i < 0 || i as usize >= items.len() {
                return Err(errors::type_error("index out of range", pos));
            }
            Ok(items[i as usize].clone())
        }
        Value::Map(entries) => {
            let key = MapKey::from_value(&idx, pos)?;
            Ok(entries.read().get(&key).cloned().unwrap_or(Value::Nil))
        }
        Value::Str(s) => {
            let i = match idx {
                Value::Int(i) => i,
                other => {
                    return Err(errors::type_error(
                        format!("string index must be int, not {}", other.kind_name()),
                        pos,
                    ))
                }
            };
            match s.chars().nth(i.max(0) as usize) {
                Some(c) if i >= 0 => Ok(Value::string(c.to_string())),
                _ => Err(errors::type_error("index out of range", pos)),
            }
        }
        other => Err(errors::type_error(
            format!("cannot index type {}", other.kind_name()),
            pos,
        )),
    }
}

fn eval_slice(
    base: Value,
    from: Option<Value>,
    to: Option<Value>,
    pos: Pos,
) -> Result<Value, super::errors::EvalError> {
    let bound = |value: Option<Value>,
                 default: usize,
                 len: usize|
     -> Result<usize, super::errors::EvalError> {
        match value {
            None => Ok(default),
            Some(v) => match v.unwrap_ref() {
                Value::Int(n) if n >= 0 && n as usize <= len => Ok(n as usize),
                Value::Int(_) => Err(errors::type_error("index out of range", pos)),
                other => Err(errors::type_error(
                    format!("slice bound must be int, not {}", other.kind_name()),
                    pos,
                )),
            },
        }
    };
    match base {
        Value::Seq(items) => {
            let items = items.read();
            let len = items.len();
            let from = bound(from, 0, len)?;
            let to = bound(to, len, len)?;
            if from > to {
                return Err(errors::type_error("index out of range", pos));
            }
            Ok(Value::seq(items[from..to].to_vec()))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len();
            let from = bound(from, 0, len)?;
            let to = bound(to, len, len)?;
            if from > to {
                return Err(errors::type_error("index out of range", pos));
            }
            Ok(Value::string(chars[from..to].iter().collect::<String>()))
        }
        other => Err(errors::type_error(
            format!("cannot slice type {}", other.kind_name()),
            pos,
        )),
    }
}
