//! AST node kinds the evaluator dispatches on.
//!
//! The tree is produced by the parser and never mutated afterwards;
//! function bodies are shared behind `Arc` so closures can carry them
//! across threads.

use std::fmt;
use std::sync::Arc;

/// Source position (1-based line and column).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub fn new(line: u32, col: u32) -> Self {
        Pos { line, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A statement with its source position.
#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Pos,
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: Pos) -> Self {
        Stmt { kind, pos }
    }
}

/// Statement kinds.
#[derive(Clone, Debug)]
pub enum StmtKind {
    /// A sequence of statements (block body, program).
    Stmts(Vec<Stmt>),
    /// Expression evaluated for its value / side effects.
    Expr(Expr),
    /// `var a, b = e1, e2` — always binds in the innermost frame.
    Var { names: Vec<String>, exprs: Vec<Expr> },
    /// `a, b[i], c.d = e1, e2, e3` — assignment to resolvable targets.
    Lets { lhss: Vec<Expr>, rhss: Vec<Expr> },
    /// `break` out of the enclosing loop.
    Break,
    /// `continue` with the enclosing loop.
    Continue,
    /// `return e1, e2, ...`.
    Return(Vec<Expr>),
    /// `throw e` — raises the string-coerced value as a user error.
    Throw(Expr),
    /// `if cond { .. } else if cond { .. } else { .. }`.
    If {
        cond: Expr,
        then: Box<Stmt>,
        elifs: Vec<(Expr, Stmt)>,
        els: Option<Box<Stmt>>,
    },
    /// `try { .. } catch e { .. } finally { .. }`.
    Try {
        body: Box<Stmt>,
        catch_name: Option<String>,
        catch: Option<Box<Stmt>>,
        finally: Option<Box<Stmt>>,
    },
    /// `for { .. }` / `for cond { .. }` — while-style loop.
    Loop { cond: Option<Expr>, body: Box<Stmt> },
    /// `for x in xs { .. }` / `for k, v in m { .. }`.
    ForIn {
        names: Vec<String>,
        iter: Expr,
        body: Box<Stmt>,
    },
    /// `for init; cond; post { .. }`.
    CFor {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Box<Stmt>,
    },
    /// `module Name { .. }` — named child environment bound in the parent.
    Module { name: String, body: Box<Stmt> },
    /// `switch e { case a, b: .. default: .. }`.
    Switch {
        expr: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Box<Stmt>>,
    },
    /// `go f(args)` — spawn the call on a fresh task.
    Go(Expr),
    /// `delete(name)` / `delete(name, true)` / `delete(m, k)`.
    Delete { item: Expr, key: Option<Expr> },
    /// `close(ch)`.
    Close(Expr),
    /// `lhs [, ok] <- rhs` — channel receive, or send when `lhs` is the
    /// channel (dispatched at runtime).
    Chan {
        lhs: Expr,
        ok: Option<Expr>,
        rhs: Expr,
    },
    /// `struct Name { field, field: type }` — declares a type descriptor.
    Struct { name: String, fields: Vec<FieldDecl> },
    /// `import a/b.c as d` or `import "path" as d`.
    Import {
        path: String,
        alias: Option<String>,
        local: bool,
    },
}

/// One `case exprs: stmt` arm of a switch.
#[derive(Clone, Debug)]
pub struct SwitchCase {
    pub exprs: Vec<Expr>,
    pub body: Stmt,
}

/// A field in a struct declaration: name plus optional type name.
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: String,
    pub type_name: Option<String>,
}

/// An expression with its source position.
#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Pos,
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Pos) -> Self {
        Expr { kind, pos }
    }
}

/// Expression kinds.
#[derive(Clone, Debug)]
pub enum ExprKind {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    /// `[a, b, c]`.
    Seq(Vec<Expr>),
    /// `{"k": v, ...}`.
    Map(Vec<(Expr, Expr)>),
    /// `Type{field: e, ...}` — record literal.
    Record {
        type_name: String,
        fields: Vec<(String, Expr)>,
    },
    /// `e.name`.
    Member { expr: Box<Expr>, name: String },
    /// `e[i]`.
    Index { expr: Box<Expr>, index: Box<Expr> },
    /// `e[from:to]`.
    Slice {
        expr: Box<Expr>,
        from: Option<Box<Expr>>,
        to: Option<Box<Expr>>,
    },
    /// `&e` — one-cell writable reference.
    Addr(Box<Expr>),
    /// `*e`.
    Deref(Box<Expr>),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `cond ? a : b`.
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        els: Box<Expr>,
    },
    /// Function literal (named or anonymous, possibly with a receiver type).
    Func(Arc<FuncDecl>),
    /// `f(a, b)`, `f(xs...)`, `f(a)?`.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        /// `f(xs...)` — the last argument spreads.
        variadic: bool,
        /// `f(a)?` — consult the call-error slot and raise or strip.
        propagate: bool,
    },
    /// `ch <- v` — channel send.
    ChanSend { chan: Box<Expr>, value: Box<Expr> },
    /// `make(chan)` / `make(chan, n)`.
    MakeChan { size: Option<Box<Expr>> },
    /// `make(Type)` — record with nil fields.
    Make { type_name: String },
    Paren(Box<Expr>),
}

/// A function literal: `func [Recv.]name(params[...]) { body }`.
#[derive(Clone, Debug)]
pub struct FuncDecl {
    /// Empty for anonymous functions.
    pub name: String,
    /// Receiver type name for `func Type.method(..)`.
    pub receiver: Option<String>,
    pub params: Vec<String>,
    pub variadic: bool,
    pub body: Arc<Stmt>,
    pub pos: Pos,
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        };
        f.write_str(s)
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "^",
        };
        f.write_str(s)
    }
}
