//! The dynamic value domain.
//!
//! All heap-backed values go through the factory methods on `Value`, so
//! every container is an `Arc`-shared cell that can cross the threads
//! spawned by `go` statements. Equality is structural for containers and
//! records, identity for channels, callables, modules, and foreign
//! values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::ast::Pos;

use super::call::Callable;
use super::chan::Channel;
use super::env::Env;
use super::errors::{self, EvalError};

/// A script value.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    /// Ordered mutable sequence.
    Seq(Arc<RwLock<Vec<Value>>>),
    /// Mapping over hashable scalar keys.
    Map(Arc<RwLock<FxHashMap<MapKey, Value>>>),
    /// Typed channel.
    Chan(Channel),
    /// Instance of a declared type.
    Record(Record),
    /// A type descriptor as a first-class value.
    Type(TypeDesc),
    /// Native function or script closure.
    Func(Callable),
    /// A module environment as a first-class value.
    Module(Env),
    /// One-cell writable reference produced by `&expr`.
    Ref(Arc<RwLock<Value>>),
    /// Opaque host value.
    Foreign(Arc<dyn Opaque>),
}

/// Map keys are restricted to the hashable scalar kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
}

impl MapKey {
    pub fn from_value(value: &Value, pos: Pos) -> Result<MapKey, EvalError> {
        match value.unwrap_ref() {
            Value::Bool(b) => Ok(MapKey::Bool(b)),
            Value::Int(n) => Ok(MapKey::Int(n)),
            Value::Str(s) => Ok(MapKey::Str(s)),
            other => Err(errors::type_error(
                format!("cannot use type {} as map key", other.kind_name()),
                pos,
            )),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Bool(b) => Value::Bool(*b),
            MapKey::Int(n) => Value::Int(*n),
            MapKey::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(b) => write!(f, "{b}"),
            MapKey::Int(n) => write!(f, "{n}"),
            MapKey::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Where a type descriptor came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeOrigin {
    Builtin,
    Host,
    Script,
}

/// A named field in a type layout.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: String,
    pub ty: Option<TypeDesc>,
}

/// Immutable type descriptor: kind, optional field layout, origin.
#[derive(Clone)]
pub struct TypeDesc(Arc<TypeInner>);

struct TypeInner {
    name: String,
    origin: TypeOrigin,
    fields: Vec<FieldDef>,
}

impl TypeDesc {
    pub fn new(name: impl Into<String>, origin: TypeOrigin, fields: Vec<FieldDef>) -> Self {
        TypeDesc(Arc::new(TypeInner {
            name: name.into(),
            origin,
            fields,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn origin(&self) -> TypeOrigin {
        self.0.origin
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.0.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.0.fields.iter().any(|f| f.name == name)
    }

    pub fn same(&self, other: &TypeDesc) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDesc({})", self.0.name)
    }
}

/// An instance of a declared type: descriptor plus field cells.
#[derive(Clone)]
pub struct Record(Arc<RecordInner>);

struct RecordInner {
    ty: TypeDesc,
    fields: RwLock<FxHashMap<String, Value>>,
}

impl Record {
    /// Build a record with every declared field present; fields missing
    /// from `given` start as nil.
    pub fn new(ty: TypeDesc, given: FxHashMap<String, Value>) -> Self {
        let mut fields = FxHashMap::default();
        for decl in ty.fields() {
            fields.insert(decl.name.clone(), Value::Nil);
        }
        for (name, value) in given {
            fields.insert(name, value);
        }
        Record(Arc::new(RecordInner {
            ty,
            fields: RwLock::new(fields),
        }))
    }

    pub fn type_desc(&self) -> &TypeDesc {
        &self.0.ty
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.fields.read().get(name).cloned()
    }

    /// Set a declared field. Undeclared fields are rejected.
    pub fn set(&self, name: &str, value: Value, pos: Pos) -> Result<(), EvalError> {
        if !self.0.ty.has_field(name) {
            return Err(errors::type_error(
                format!("no field '{}' on type {}", name, self.0.ty.name()),
                pos,
            ));
        }
        self.0.fields.write().insert(name.to_string(), value);
        Ok(())
    }

    pub fn same(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Opaque host value carried through the interpreter untouched.
pub trait Opaque: Any + Send + Sync {
    fn type_name(&self) -> &str;

    /// Optional index capability: values exposing it can drive `for`.
    fn as_indexable(&self) -> Option<&dyn Indexable> {
        None
    }
}

/// Index capability for foreign values.
pub trait Indexable {
    fn len(&self) -> i64;
    fn index(&self, i: i64) -> Result<Value, EvalError>;
}

fn same_ptr<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::Str(Arc::from(s.into()))
    }

    pub fn seq(items: Vec<Value>) -> Value {
        Value::Seq(Arc::new(RwLock::new(items)))
    }

    pub fn map(entries: FxHashMap<MapKey, Value>) -> Value {
        Value::Map(Arc::new(RwLock::new(entries)))
    }

    pub fn reference(inner: Value) -> Value {
        Value::Ref(Arc::new(RwLock::new(inner)))
    }

    pub fn foreign(value: impl Opaque + 'static) -> Value {
        Value::Foreign(Arc::new(value))
    }

    /// Unwrap one layer of reference indirection, the analog of the
    /// source runtime's single interface/pointer unwrap step.
    pub fn unwrap_ref(&self) -> Value {
        match self {
            Value::Ref(cell) => cell.read().clone(),
            other => other.clone(),
        }
    }

    /// Truthiness: nil is false; bool is itself; zero numbers, empty
    /// strings and empty containers are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self.unwrap_ref() {
            Value::Nil => false,
            Value::Bool(b) => b,
            Value::Int(n) => n != 0,
            Value::Float(f) => f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Seq(items) => !items.read().is_empty(),
            Value::Map(entries) => !entries.read().is_empty(),
            _ => true,
        }
    }

    /// The kind tag name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Chan(_) => "channel",
            Value::Record(_) => "record",
            Value::Type(_) => "type",
            Value::Func(_) => "func",
            Value::Module(_) => "module",
            Value::Ref(_) => "reference",
            Value::Foreign(_) => "foreign",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.unwrap_ref(), Value::Nil)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&self.unwrap_ref(), &other.unwrap_ref()) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Map(a), Value::Map(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Value::Chan(a), Value::Chan(b)) => a.same(b),
            (Value::Record(a), Value::Record(b)) => {
                if a.same(b) {
                    return true;
                }
                if !a.type_desc().same(b.type_desc()) {
                    return false;
                }
                a.type_desc()
                    .fields()
                    .iter()
                    .all(|f| a.get(&f.name) == b.get(&f.name))
            }
            (Value::Type(a), Value::Type(b)) => a.same(b),
            (Value::Func(a), Value::Func(b)) => a.same(b),
            (Value::Module(a), Value::Module(b)) => a.same(b),
            (Value::Foreign(a), Value::Foreign(b)) => same_ptr(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Chan(_) => write!(f, "<channel>"),
            Value::Record(r) => {
                write!(f, "{} {{", r.type_desc().name())?;
                for (i, field) in r.type_desc().fields().iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    let value = r.get(&field.name).unwrap_or(Value::Nil);
                    write!(f, " {}: {}", field.name, value)?;
                }
                write!(f, " }}")
            }
            Value::Type(t) => write!(f, "<type {}>", t.name()),
            Value::Func(c) => write!(f, "{c}"),
            Value::Module(m) => match m.module_name() {
                Some(name) => write!(f, "<module {name}>"),
                None => write!(f, "<module>"),
            },
            Value::Ref(cell) => write!(f, "&{}", cell.read()),
            Value::Foreign(v) => write!(f, "<{}>", v.type_name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
