//! Centralized error type and constructors for the evaluator.
//!
//! Every failure carries a kind from the fixed taxonomy, the source
//! position of the statement or expression that raised it (when known),
//! a message, and optionally the error it was layered on top of.

use std::fmt;

use crate::ast::Pos;
use crate::parser::ParseError;

/// Error taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source failed to lex or parse.
    Parse,
    /// Name lookup or assignment against an undeclared binding.
    NotDeclared,
    /// Operand or argument of the wrong kind.
    Type,
    /// Wrong number of arguments or binding targets.
    Arity,
    /// `for ... in` over a non-iterable value.
    NotIterable,
    /// Local import requested with no resolver configured.
    ImportUnavailable,
    /// Registry import of an unknown package.
    PackageNotFound,
    /// Host-level unwinding captured during a native call.
    HostPanic,
    /// Script-raised error (`throw`, or `?` on a failed native call).
    Throw,
    /// Cancellation observed; bypasses `catch`.
    Interrupt,
    /// Evaluator invariant violation.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Parse => "parse error",
            ErrorKind::NotDeclared => "undeclared name",
            ErrorKind::Type => "type error",
            ErrorKind::Arity => "arity mismatch",
            ErrorKind::NotIterable => "not iterable",
            ErrorKind::ImportUnavailable => "import unavailable",
            ErrorKind::PackageNotFound => "package not found",
            ErrorKind::HostPanic => "host panic",
            ErrorKind::Throw => "error",
            ErrorKind::Interrupt => "interrupted",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(s)
    }
}

/// Evaluation failure.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: ErrorKind,
    pub pos: Option<Pos>,
    pub message: String,
    pub cause: Option<Box<EvalError>>,
}

impl EvalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            pos: None,
            message: message.into(),
            cause: None,
        }
    }

    pub fn at(kind: ErrorKind, message: impl Into<String>, pos: Pos) -> Self {
        EvalError {
            kind,
            pos: Some(pos),
            message: message.into(),
            cause: None,
        }
    }

    /// Attach a position if none is set yet.
    #[must_use]
    pub fn with_pos(mut self, pos: Pos) -> Self {
        if self.pos.is_none() {
            self.pos = Some(pos);
        }
        self
    }

    /// Layer a call-site position on top: the new frame leads, the
    /// original error becomes the cause.
    #[must_use]
    pub fn at_call_site(self, pos: Pos) -> Self {
        if self.pos == Some(pos) {
            return self;
        }
        EvalError {
            kind: self.kind,
            pos: Some(pos),
            message: self.message.clone(),
            cause: Some(Box::new(self)),
        }
    }

    pub fn is_interrupt(&self) -> bool {
        self.kind == ErrorKind::Interrupt
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(pos) = self.pos {
            write!(f, " (at {pos})")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|e| e as _)
    }
}

impl From<ParseError> for EvalError {
    fn from(e: ParseError) -> Self {
        EvalError::at(ErrorKind::Parse, e.message, e.pos)
    }
}

// Constructors. Cold: errors are off the hot dispatch path.

#[cold]
pub fn not_declared(name: &str) -> EvalError {
    EvalError::new(ErrorKind::NotDeclared, format!("undefined symbol '{name}'"))
}

#[cold]
pub fn type_error(message: impl Into<String>, pos: Pos) -> EvalError {
    EvalError::at(ErrorKind::Type, message, pos)
}

#[cold]
pub fn arity_mismatch(wants: usize, received: usize, pos: Pos) -> EvalError {
    EvalError::at(
        ErrorKind::Arity,
        format!("function wants {wants} arguments but received {received}"),
        pos,
    )
}

#[cold]
pub fn unassigned_rhs(pos: Pos) -> EvalError {
    EvalError::at(ErrorKind::Arity, "unassigned right-hand values", pos)
}

#[cold]
pub fn not_iterable(kind: &str, pos: Pos) -> EvalError {
    EvalError::at(
        ErrorKind::NotIterable,
        format!("for cannot loop over type {kind}"),
        pos,
    )
}

#[cold]
pub fn import_unavailable(pos: Pos) -> EvalError {
    EvalError::at(
        ErrorKind::ImportUnavailable,
        "cannot import local packages",
        pos,
    )
}

#[cold]
pub fn package_not_found(name: &str, pos: Pos) -> EvalError {
    EvalError::at(
        ErrorKind::PackageNotFound,
        format!("package not found: {name}"),
        pos,
    )
}

#[cold]
pub fn host_panic(message: impl Into<String>, pos: Pos) -> EvalError {
    EvalError::at(ErrorKind::HostPanic, message, pos)
}

#[cold]
pub fn user_throw(message: impl Into<String>, pos: Pos) -> EvalError {
    EvalError::at(ErrorKind::Throw, message, pos)
}

#[cold]
pub fn interrupt() -> EvalError {
    EvalError::new(ErrorKind::Interrupt, "execution interrupted")
}

#[cold]
pub fn internal(message: impl Into<String>, pos: Pos) -> EvalError {
    EvalError::at(ErrorKind::Internal, message, pos)
}

/// Result alias used across the evaluator.
pub type EvalResult = Result<crate::eval::value::Value, EvalError>;
