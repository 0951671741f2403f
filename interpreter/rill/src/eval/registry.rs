//! Process-wide package registry.
//!
//! Hosts register packages before the first execution; the import
//! statement consults the registry for non-local package names.

use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::value::{TypeDesc, Value};

type SymbolTable = FxHashMap<String, Value>;
type TypeTable = FxHashMap<String, TypeDesc>;

fn packages() -> &'static RwLock<FxHashMap<String, SymbolTable>> {
    static PACKAGES: OnceLock<RwLock<FxHashMap<String, SymbolTable>>> = OnceLock::new();
    PACKAGES.get_or_init(|| RwLock::new(FxHashMap::default()))
}

fn package_types() -> &'static RwLock<FxHashMap<String, TypeTable>> {
    static TYPES: OnceLock<RwLock<FxHashMap<String, TypeTable>>> = OnceLock::new();
    TYPES.get_or_init(|| RwLock::new(FxHashMap::default()))
}

/// Register (or extend) a package's symbols.
pub fn register_package(name: &str, symbols: impl IntoIterator<Item = (String, Value)>) {
    let mut all = packages().write();
    let table = all.entry(name.to_string()).or_default();
    for (symbol, value) in symbols {
        table.insert(symbol, value);
    }
}

/// Register (or extend) a package's type descriptors.
pub fn register_package_types(name: &str, types: impl IntoIterator<Item = (String, TypeDesc)>) {
    let mut all = package_types().write();
    let table = all.entry(name.to_string()).or_default();
    for (type_name, desc) in types {
        table.insert(type_name, desc);
    }
}

/// Snapshot a registered package's symbols, if present.
pub(crate) fn package_symbols(name: &str) -> Option<SymbolTable> {
    packages().read().get(name).cloned()
}

/// Snapshot a registered package's types (empty when none registered).
pub(crate) fn package_type_table(name: &str) -> TypeTable {
    package_types().read().get(name).cloned().unwrap_or_default()
}
