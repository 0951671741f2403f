//! Lexically-scoped environments.
//!
//! An `Env` is a cheap handle on one frame: name→value and name→type
//! tables, a parent link, an optional module name, and an optional import
//! resolver. Frames are shared across the threads spawned by `go`
//! statements and are not internally synchronized beyond per-table locks;
//! scripts that share mutable bindings across tasks must coordinate
//! externally ("frames are mutator-owned").
//!
//! Parent links are strong: a closure keeps its whole defining chain
//! alive. A binding that captures its own frame forms a cycle and is not
//! reclaimed; embedders that generate such closures in a loop should
//! scope them inside child environments they drop.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::call::NativeFn;
use super::errors::{self, EvalError};
use super::value::{TypeDesc, Value};

/// Host-supplied resolver for local imports: package name to a fresh
/// environment holding the package's symbols.
pub type ImportFn = Arc<dyn Fn(&str) -> Result<Env, EvalError> + Send + Sync>;

/// Handle on an environment frame.
#[derive(Clone)]
pub struct Env(Arc<EnvInner>);

struct EnvInner {
    values: RwLock<FxHashMap<String, Value>>,
    types: RwLock<FxHashMap<String, TypeDesc>>,
    parent: Option<Env>,
    module_name: Option<String>,
    import: RwLock<Option<ImportFn>>,
}

impl Env {
    /// Create a root frame.
    pub fn new() -> Self {
        Env::make(None, None)
    }

    fn make(parent: Option<Env>, module_name: Option<String>) -> Self {
        Env(Arc::new(EnvInner {
            values: RwLock::new(FxHashMap::default()),
            types: RwLock::new(FxHashMap::default()),
            parent,
            module_name,
            import: RwLock::new(None),
        }))
    }

    /// Create a scoped child frame.
    pub fn new_child(&self) -> Env {
        Env::make(Some(self.clone()), None)
    }

    /// Create a named child frame and bind it in this frame under the
    /// module's name.
    pub fn new_module(&self, name: &str) -> Env {
        let module = Env::make(Some(self.clone()), Some(name.to_string()));
        self.define(name, Value::Module(module.clone()));
        module
    }

    pub fn module_name(&self) -> Option<&str> {
        self.0.module_name.as_deref()
    }

    /// Identity comparison.
    pub fn same(&self, other: &Env) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Bind a name in this frame.
    pub fn define(&self, name: &str, value: Value) {
        self.0.values.write().insert(name.to_string(), value);
    }

    /// Bind a type descriptor in this frame.
    pub fn define_type(&self, name: &str, desc: TypeDesc) {
        self.0.types.write().insert(name.to_string(), desc);
    }

    /// Bind a native function under its declared name.
    pub fn define_native(&self, func: NativeFn) {
        let name = func.name.clone();
        self.define(&name, Value::Func(super::call::Callable::native(func)));
    }

    /// Assign to an existing binding, walking frames outward.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), EvalError> {
        let mut frame = self.clone();
        loop {
            {
                let mut values = frame.0.values.write();
                if let Some(slot) = values.get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
            }
            match &frame.0.parent {
                Some(parent) => {
                    let parent = parent.clone();
                    frame = parent;
                }
                None => return Err(errors::not_declared(name)),
            }
        }
    }

    /// Look up a name, walking frames outward.
    pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        let mut frame = self.clone();
        loop {
            if let Some(value) = frame.0.values.read().get(name) {
                return Ok(value.clone());
            }
            match &frame.0.parent {
                Some(parent) => {
                    let parent = parent.clone();
                    frame = parent;
                }
                None => return Err(errors::not_declared(name)),
            }
        }
    }

    /// Look up a type descriptor, walking frames outward.
    pub fn lookup_type(&self, name: &str) -> Result<TypeDesc, EvalError> {
        let mut frame = self.clone();
        loop {
            if let Some(desc) = frame.0.types.read().get(name) {
                return Ok(desc.clone());
            }
            match &frame.0.parent {
                Some(parent) => {
                    let parent = parent.clone();
                    frame = parent;
                }
                None => return Err(errors::not_declared(name)),
            }
        }
    }

    /// Remove a binding from this frame only.
    pub fn delete(&self, name: &str) {
        self.0.values.write().remove(name);
    }

    /// Remove a binding from the root frame.
    pub fn delete_global(&self, name: &str) {
        self.root().0.values.write().remove(name);
    }

    fn root(&self) -> Env {
        let mut frame = self.clone();
        while let Some(parent) = &frame.0.parent {
            let parent = parent.clone();
            frame = parent;
        }
        frame
    }

    /// Install the host import resolver on this frame.
    pub fn set_import(&self, resolver: ImportFn) {
        *self.0.import.write() = Some(resolver);
    }

    /// Find the nearest import resolver, walking frames outward.
    pub fn import_resolver(&self) -> Option<ImportFn> {
        let mut frame = self.clone();
        loop {
            if let Some(resolver) = frame.0.import.read().clone() {
                return Some(resolver);
            }
            match &frame.0.parent {
                Some(parent) => {
                    let parent = parent.clone();
                    frame = parent;
                }
                None => return None,
            }
        }
    }

    /// Recursive copy of this frame's bindings. Used when a module value
    /// is assigned: modules are value-like under assignment.
    pub fn deep_copy(&self) -> Env {
        let copy = Env::make(self.0.parent.clone(), self.0.module_name.clone());
        {
            let mut values = copy.0.values.write();
            for (name, value) in self.0.values.read().iter() {
                let value = match value {
                    Value::Module(m) => Value::Module(m.deep_copy()),
                    other => other.clone(),
                };
                values.insert(name.clone(), value);
            }
        }
        {
            let mut types = copy.0.types.write();
            for (name, desc) in self.0.types.read().iter() {
                types.insert(name.clone(), desc.clone());
            }
        }
        *copy.0.import.write() = self.0.import.read().clone();
        copy
    }

    /// Names bound directly in this frame.
    pub fn names(&self) -> Vec<String> {
        self.0.values.read().keys().cloned().collect()
    }

    /// Types bound directly in this frame.
    pub fn type_names(&self) -> Vec<String> {
        self.0.types.read().keys().cloned().collect()
    }
}

impl Default for Env {
    fn default() -> Self {
        Env::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup() {
        let env = Env::new();
        env.define("x", Value::Int(42));
        assert_eq!(env.lookup("x").expect("bound"), Value::Int(42));
        assert!(env.lookup("y").is_err());
    }

    #[test]
    fn child_sees_parent_and_shadows() {
        let parent = Env::new();
        parent.define("x", Value::Int(1));
        let child = parent.new_child();
        assert_eq!(child.lookup("x").expect("inherited"), Value::Int(1));
        child.define("x", Value::Int(2));
        assert_eq!(child.lookup("x").expect("shadowed"), Value::Int(2));
        assert_eq!(parent.lookup("x").expect("unchanged"), Value::Int(1));
    }

    #[test]
    fn assign_walks_to_defining_frame() {
        let parent = Env::new();
        parent.define("x", Value::Int(1));
        let child = parent.new_child();
        child.assign("x", Value::Int(5)).expect("assign");
        assert_eq!(parent.lookup("x").expect("bound"), Value::Int(5));
        assert!(child.assign("missing", Value::Nil).is_err());
    }

    #[test]
    fn delete_is_frame_local() {
        let parent = Env::new();
        parent.define("x", Value::Int(1));
        let child = parent.new_child();
        child.define("x", Value::Int(2));
        child.delete("x");
        assert_eq!(child.lookup("x").expect("parent binding"), Value::Int(1));
        child.delete_global("x");
        assert!(child.lookup("x").is_err());
    }

    #[test]
    fn module_binds_in_parent() {
        let env = Env::new();
        let module = env.new_module("m");
        module.define("v", Value::Int(3));
        match env.lookup("m").expect("module bound") {
            Value::Module(m) => {
                assert_eq!(m.lookup("v").expect("module member"), Value::Int(3));
            }
            other => panic!("expected module, got {other:?}"),
        }
    }

    #[test]
    fn deep_copy_detaches_bindings() {
        let env = Env::new();
        let module = env.new_module("m");
        module.define("v", Value::Int(1));
        let copy = module.deep_copy();
        copy.define("v", Value::Int(9));
        assert_eq!(module.lookup("v").expect("original"), Value::Int(1));
        assert_eq!(copy.lookup("v").expect("copy"), Value::Int(9));
    }

    #[test]
    fn import_resolver_inherited() {
        let env = Env::new();
        env.set_import(Arc::new(|_name| Ok(Env::new())));
        let child = env.new_child().new_child();
        assert!(child.import_resolver().is_some());
    }
}
