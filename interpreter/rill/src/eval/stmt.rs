//! Statement evaluation.
//!
//! Every step first observes the cancellation token; loops re-check at
//! each iteration head. Child scopes are bracketed so the previous
//! environment is restored before any result or control signal
//! propagates.

use crate::ast::{Expr, ExprKind, Pos, Stmt, StmtKind, SwitchCase};

use super::errors::{self};
use super::registry;
use super::value::{FieldDef, MapKey, TypeDesc, TypeOrigin, Value};
use super::{Exec, Flow, Interp};

/// Module values are value-like under assignment: binding one binds a
/// deep copy.
fn copy_on_assign(value: Value) -> Value {
    match value {
        Value::Module(m) => Value::Module(m.deep_copy()),
        other => other,
    }
}

fn default_alias(path: &str) -> String {
    path.rsplit(['/', '.'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(path)
        .to_string()
}

impl Interp {
    pub(crate) fn run_stmt(&mut self, stmt: &Stmt) -> Exec<Value> {
        if self.cancel.is_cancelled() {
            return Err(Flow::Err(errors::interrupt()));
        }
        let pos = stmt.pos;
        match &stmt.kind {
            StmtKind::Stmts(stmts) => {
                let mut last = Value::Nil;
                for stmt in stmts {
                    last = self.run_stmt(stmt)?;
                }
                Ok(last)
            }

            StmtKind::Expr(expr) => self.eval_expr(expr),

            StmtKind::Break => Err(Flow::Break),
            StmtKind::Continue => Err(Flow::Continue),

            StmtKind::Return(exprs) => {
                let value = match exprs.len() {
                    0 => Value::Nil,
                    1 => self.eval_expr(&exprs[0])?,
                    _ => {
                        let mut values = Vec::with_capacity(exprs.len());
                        for expr in exprs {
                            values.push(self.eval_expr(expr)?);
                        }
                        Value::seq(values)
                    }
                };
                Err(Flow::Return(value))
            }

            StmtKind::Throw(expr) => {
                let value = self.eval_expr(expr)?;
                Err(Flow::Err(errors::user_throw(value.to_string(), pos)))
            }

            StmtKind::Var { names, exprs } => {
                let mut rvs = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    rvs.push(copy_on_assign(self.eval_expr(expr)?));
                }
                if names.len() < rvs.len() {
                    return Err(Flow::Err(errors::unassigned_rhs(pos)));
                }
                if rvs.len() == 1 && names.len() > 1 {
                    // One sequence destructures element-wise.
                    if let Value::Seq(items) = rvs[0].unwrap_ref() {
                        let items = items.read().clone();
                        if !items.is_empty() {
                            for (name, item) in names.iter().zip(items.iter()) {
                                self.env.define(name, item.unwrap_ref());
                            }
                            // The statement's value is the last element of
                            // the full sequence, bound or not.
                            return Ok(items[items.len() - 1].clone());
                        }
                    }
                }
                for (name, value) in names.iter().zip(rvs.iter()) {
                    self.env.define(name, value.clone());
                }
                Ok(rvs.last().cloned().unwrap_or(Value::Nil))
            }

            StmtKind::Lets { lhss, rhss } => self.run_lets(lhss, rhss, pos),

            StmtKind::If {
                cond,
                then,
                elifs,
                els,
            } => {
                let value = self.in_child_scope(|i| i.eval_expr(cond))?;
                if value.is_truthy() {
                    return self.in_child_scope(|i| i.run_stmt(then));
                }
                for (elif_cond, elif_body) in elifs {
                    let value = self.in_child_scope(|i| i.eval_expr(elif_cond))?;
                    if value.is_truthy() {
                        return self.in_child_scope(|i| i.run_stmt(elif_body));
                    }
                }
                if let Some(els) = els {
                    return self.in_child_scope(|i| i.run_stmt(els));
                }
                Ok(Value::Nil)
            }

            StmtKind::Try {
                body,
                catch_name,
                catch,
                finally,
            } => {
                let result = self.in_child_scope(|i| i.run_stmt(body));
                // Interrupt bypasses catch; control signals are not
                // error-shaped and pass through untouched.
                let mut outcome = match result {
                    Err(Flow::Err(e)) if !e.is_interrupt() => match catch {
                        Some(catch_body) => self.in_child_scope(|i| {
                            if let Some(name) = catch_name {
                                i.env.define(name, Value::string(e.message.clone()));
                            }
                            i.run_stmt(catch_body)
                        }),
                        None => Err(Flow::Err(e)),
                    },
                    other => other,
                };
                if let Some(finally_body) = finally {
                    let finally_result = self.in_child_scope(|i| i.run_stmt(finally_body));
                    if finally_result.is_err() {
                        outcome = finally_result;
                    }
                }
                outcome
            }

            StmtKind::Loop { cond, body } => {
                let saved = self.env.clone();
                self.env = saved.new_child();
                let result = self.run_loop(cond.as_ref(), body);
                self.env = saved;
                result
            }

            StmtKind::ForIn { names, iter, body } => {
                let iterable = self.eval_expr(iter)?.unwrap_ref();
                let saved = self.env.clone();
                self.env = saved.new_child();
                let result = self.run_for_in(names, iterable, body, pos);
                self.env = saved;
                result
            }

            StmtKind::CFor {
                init,
                cond,
                post,
                body,
            } => {
                let saved = self.env.clone();
                self.env = saved.new_child();
                let result = self.run_cfor(
                    init.as_deref(),
                    cond.as_ref(),
                    post.as_deref(),
                    body,
                );
                self.env = saved;
                result
            }

            StmtKind::Module { name, body } => {
                let saved = self.env.clone();
                self.env = saved.new_module(name);
                let result = self.run_stmt(body);
                self.env = saved;
                result?;
                Ok(Value::Nil)
            }

            StmtKind::Switch {
                expr,
                cases,
                default,
            } => {
                let saved = self.env.clone();
                self.env = saved.new_child();
                let result = self.run_switch(expr, cases, default.as_deref());
                self.env = saved;
                result
            }

            StmtKind::Go(expr) => {
                let ExprKind::Call {
                    callee,
                    args,
                    variadic,
                    propagate,
                } = &expr.kind
                else {
                    return Err(Flow::Err(errors::internal(
                        "go requires a function call",
                        pos,
                    )));
                };
                self.eval_call(callee, args, *variadic, *propagate, true, expr.pos)?;
                Ok(Value::Nil)
            }

            StmtKind::Delete { item, key } => {
                let item_val = self.eval_expr(item)?.unwrap_ref();
                let key_val = match key {
                    Some(k) => Some(self.eval_expr(k)?.unwrap_ref()),
                    None => None,
                };
                match item_val {
                    Value::Str(name) => {
                        if matches!(key_val, Some(Value::Bool(true))) {
                            self.env.delete_global(&name);
                        } else {
                            self.env.delete(&name);
                        }
                        Ok(Value::Nil)
                    }
                    Value::Map(entries) => {
                        let Some(key_val) = key_val else {
                            return Err(Flow::Err(errors::type_error(
                                "second argument to delete cannot be nil for map",
                                pos,
                            )));
                        };
                        let key = MapKey::from_value(&key_val, pos)?;
                        entries.write().remove(&key);
                        Ok(Value::Nil)
                    }
                    other => Err(Flow::Err(errors::type_error(
                        format!(
                            "first argument to delete cannot be type {}",
                            other.kind_name()
                        ),
                        pos,
                    ))),
                }
            }

            StmtKind::Close(expr) => match self.eval_expr(expr)?.unwrap_ref() {
                Value::Chan(channel) => {
                    channel.close();
                    Ok(Value::Nil)
                }
                other => Err(Flow::Err(errors::type_error(
                    format!("type cannot be {} for close", other.kind_name()),
                    pos,
                ))),
            },

            StmtKind::Chan { lhs, ok, rhs } => self.run_chan(lhs, ok.as_ref(), rhs, pos),

            StmtKind::Struct { name, fields } => {
                let mut defs = Vec::with_capacity(fields.len());
                for field in fields {
                    let ty = match &field.type_name {
                        Some(type_name) => self.env.lookup_type(type_name).ok(),
                        None => None,
                    };
                    defs.push(FieldDef {
                        name: field.name.clone(),
                        ty,
                    });
                }
                let desc = TypeDesc::new(name.clone(), TypeOrigin::Script, defs);
                self.env.define_type(name, desc);
                self.script_types.push(name.clone());
                Ok(Value::Nil)
            }

            StmtKind::Import { path, alias, local } => {
                let pack = if *local {
                    let Some(resolver) = self.env.import_resolver() else {
                        return Err(Flow::Err(errors::import_unavailable(pos)));
                    };
                    resolver(path).map_err(|e| Flow::Err(e.with_pos(pos)))?
                } else {
                    let Some(symbols) = registry::package_symbols(path) else {
                        return Err(Flow::Err(errors::package_not_found(path, pos)));
                    };
                    let pack = self.env.new_child();
                    for (name, value) in symbols {
                        pack.define(&name, value);
                    }
                    for (name, desc) in registry::package_type_table(path) {
                        pack.define_type(&name, desc);
                    }
                    pack
                };
                let alias = alias.clone().unwrap_or_else(|| default_alias(path));
                self.env.define(&alias, Value::Module(pack));
                Ok(Value::Nil)
            }
        }
    }

    fn run_lets(&mut self, lhss: &[Expr], rhss: &[Expr], pos: Pos) -> Exec<Value> {
        // Two targets against one index expression is the map-ok form:
        // nil binds (nil, false), anything else (value, true).
        if lhss.len() == 2 && rhss.len() == 1 {
            if let ExprKind::Index { .. } = &rhss[0].kind {
                let value = self.eval_expr(&rhss[0])?.unwrap_ref();
                let ok = !value.is_nil();
                let bound = if ok { value } else { Value::Nil };
                self.assign_to(&lhss[0], bound.clone())?;
                self.assign_to(&lhss[1], Value::Bool(ok))?;
                return Ok(bound);
            }
        }

        let mut rvs = Vec::with_capacity(rhss.len());
        for expr in rhss {
            rvs.push(copy_on_assign(self.eval_expr(expr)?));
        }
        if lhss.len() < rvs.len() {
            return Err(Flow::Err(errors::unassigned_rhs(pos)));
        }
        if rvs.len() == 1 && lhss.len() > 1 {
            if let Value::Seq(items) = rvs[0].unwrap_ref() {
                let items = items.read().clone();
                if !items.is_empty() {
                    for (lhs, item) in lhss.iter().zip(items.iter()) {
                        self.assign_to(lhs, item.unwrap_ref())?;
                    }
                    // As with `var`, the last element of the full sequence
                    // is the statement's value.
                    return Ok(items[items.len() - 1].clone());
                }
            }
        }
        for (lhs, value) in lhss.iter().zip(rvs.iter()) {
            self.assign_to(lhs, value.clone())?;
        }
        Ok(rvs.last().cloned().unwrap_or(Value::Nil))
    }

    fn run_loop(&mut self, cond: Option<&Expr>, body: &Stmt) -> Exec<Value> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(Flow::Err(errors::interrupt()));
            }
            if let Some(cond) = cond {
                if !self.eval_expr(cond)?.is_truthy() {
                    break;
                }
            }
            match self.run_stmt(body) {
                Ok(_) | Err(Flow::Continue) => {}
                Err(Flow::Break) => break,
                Err(flow) => return Err(flow),
            }
        }
        Ok(Value::Nil)
    }

    fn run_cfor(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        post: Option<&Stmt>,
        body: &Stmt,
    ) -> Exec<Value> {
        if let Some(init) = init {
            self.run_stmt(init)?;
        }
        loop {
            if self.cancel.is_cancelled() {
                return Err(Flow::Err(errors::interrupt()));
            }
            if let Some(cond) = cond {
                if !self.eval_expr(cond)?.is_truthy() {
                    break;
                }
            }
            match self.run_stmt(body) {
                // The post statement runs after `continue` too.
                Ok(_) | Err(Flow::Continue) => {}
                Err(Flow::Break) => break,
                Err(flow) => return Err(flow),
            }
            if let Some(post) = post {
                self.run_stmt(post)?;
            }
        }
        Ok(Value::Nil)
    }

    fn run_for_in(
        &mut self,
        names: &[String],
        iterable: Value,
        body: &Stmt,
        pos: Pos,
    ) -> Exec<Value> {
        match iterable {
            Value::Seq(items) => {
                let snapshot = items.read().clone();
                for item in snapshot {
                    if self.cancel.is_cancelled() {
                        return Err(Flow::Err(errors::interrupt()));
                    }
                    self.env.define(&names[0], item.unwrap_ref());
                    match self.run_stmt(body) {
                        Ok(_) | Err(Flow::Continue) => {}
                        Err(Flow::Break) => return Ok(Value::Nil),
                        Err(flow) => return Err(flow),
                    }
                }
                Ok(Value::Nil)
            }

            Value::Map(entries) => {
                let snapshot: Vec<(MapKey, Value)> = entries
                    .read()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                for (key, value) in snapshot {
                    if self.cancel.is_cancelled() {
                        return Err(Flow::Err(errors::interrupt()));
                    }
                    self.env.define(&names[0], key.to_value());
                    if let Some(value_name) = names.get(1) {
                        self.env.define(value_name, value);
                    }
                    match self.run_stmt(body) {
                        Ok(_) | Err(Flow::Continue) => {}
                        Err(Flow::Break) => return Ok(Value::Nil),
                        Err(flow) => return Err(flow),
                    }
                }
                Ok(Value::Nil)
            }

            Value::Chan(channel) => loop {
                let received = channel.recv(&self.cancel).map_err(Flow::Err)?;
                let Some(value) = received else {
                    // Channel closed and drained.
                    return Ok(Value::Nil);
                };
                self.env.define(&names[0], value.unwrap_ref());
                match self.run_stmt(body) {
                    Ok(_) | Err(Flow::Continue) => {}
                    Err(Flow::Break) => return Ok(Value::Nil),
                    Err(flow) => return Err(flow),
                }
            },

            Value::Foreign(foreign) => {
                let Some(indexable) = foreign.as_indexable() else {
                    return Err(Flow::Err(errors::not_iterable(foreign.type_name(), pos)));
                };
                for i in 0..indexable.len() {
                    if self.cancel.is_cancelled() {
                        return Err(Flow::Err(errors::interrupt()));
                    }
                    let item = indexable.index(i).map_err(|e| Flow::Err(e.with_pos(pos)))?;
                    self.env.define(&names[0], item.unwrap_ref());
                    match self.run_stmt(body) {
                        Ok(_) | Err(Flow::Continue) => {}
                        Err(Flow::Break) => return Ok(Value::Nil),
                        Err(flow) => return Err(flow),
                    }
                }
                Ok(Value::Nil)
            }

            other => Err(Flow::Err(errors::not_iterable(other.kind_name(), pos))),
        }
    }

    fn run_switch(
        &mut self,
        expr: &Expr,
        cases: &[SwitchCase],
        default: Option<&Stmt>,
    ) -> Exec<Value> {
        let value = self.eval_expr(expr)?;
        for case in cases {
            for case_expr in &case.exprs {
                let case_value = self.eval_expr(case_expr)?;
                if case_value == value {
                    return self.run_stmt(&case.body);
                }
            }
        }
        match default {
            Some(default) => self.run_stmt(default),
            None => Ok(Value::Nil),
        }
    }

    /// `lhs [, ok] <- rhs`: receive when the right side is a channel,
    /// send when the left side is. The source runtime dispatches on the
    /// runtime kind the same way.
    fn run_chan(
        &mut self,
        lhs: &Expr,
        ok: Option<&Expr>,
        rhs: &Expr,
        pos: Pos,
    ) -> Exec<Value> {
        let rhs_val = self.eval_expr(rhs)?.unwrap_ref();
        if let Value::Chan(channel) = &rhs_val {
            let channel = channel.clone();
            return match channel.recv(&self.cancel).map_err(Flow::Err)? {
                Some(value) => {
                    if let Some(ok_target) = ok {
                        self.assign_to(ok_target, Value::Bool(true))?;
                    }
                    let value = value.unwrap_ref();
                    self.assign_to(lhs, value.clone())?;
                    Ok(value)
                }
                None => {
                    if let Some(ok_target) = ok {
                        self.assign_to(ok_target, Value::Bool(false))?;
                    }
                    self.assign_to(lhs, Value::Nil)?;
                    Ok(Value::Nil)
                }
            };
        }

        let lhs_val = self.eval_expr(lhs)?.unwrap_ref();
        if let Value::Chan(channel) = lhs_val {
            if ok.is_some() {
                return Err(Flow::Err(errors::type_error(
                    "cannot send with an ok target",
                    pos,
                )));
            }
            channel.send(&self.cancel, rhs_val, pos)?;
            return Ok(Value::Nil);
        }

        Err(Flow::Err(errors::type_error(
            format!("receive from non-chan type {}", rhs_val.kind_name()),
            pos,
        )))
    }
}
