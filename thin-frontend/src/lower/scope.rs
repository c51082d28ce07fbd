//! Name scopes used during lowering
//!
//! Identifiers resolve against three tiers: the current function's argument
//! and local slots, then global variables, then functions and imports. Both
//! scopes live only for one compilation.

use std::collections::HashMap;

/// What a global name is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalSymbol {
    /// Four-byte cell in the data segment
    Variable { address: u32 },
    Function { id: u32, arity: usize },
}

/// Import registered for a name that is called but never defined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSymbol {
    pub id: u32,
    pub arity: usize,
}

#[derive(Debug, Default)]
pub struct GlobalScope {
    symbols: HashMap<String, GlobalSymbol>,
    imports: HashMap<String, ImportSymbol>,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`; returns false if the name is already taken
    pub fn declare(&mut self, name: &str, symbol: GlobalSymbol) -> bool {
        if self.symbols.contains_key(name) {
            return false;
        }
        self.symbols.insert(name.to_string(), symbol);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<GlobalSymbol> {
        self.symbols.get(name).copied()
    }

    pub fn declare_import(&mut self, name: &str, import: ImportSymbol) {
        self.imports.insert(name.to_string(), import);
    }

    pub fn import(&self, name: &str) -> Option<ImportSymbol> {
        self.imports.get(name).copied()
    }
}

/// Argument and local slots of one function
///
/// Arguments occupy slots `0..arg_count`; locals follow in first-use order.
#[derive(Debug, Default)]
pub struct FunctionScope {
    slots: HashMap<String, u32>,
    arg_count: u32,
    local_count: u32,
}

impl FunctionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next argument slot; returns false on a duplicate name
    pub fn add_argument(&mut self, name: &str) -> bool {
        if self.slots.contains_key(name) {
            return false;
        }
        self.slots.insert(name.to_string(), self.arg_count);
        self.arg_count += 1;
        true
    }

    pub fn slot(&self, name: &str) -> Option<u32> {
        self.slots.get(name).copied()
    }

    /// Slot for `name`, allocating a new local on first use
    pub fn slot_or_allocate(&mut self, name: &str) -> u32 {
        if let Some(slot) = self.slot(name) {
            return slot;
        }
        let slot = self.arg_count + self.local_count;
        self.local_count += 1;
        self.slots.insert(name.to_string(), slot);
        slot
    }

    pub fn arg_count(&self) -> u32 {
        self.arg_count
    }

    pub fn local_count(&self) -> u32 {
        self.local_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_scope() {
        let mut scope = GlobalScope::new();
        assert!(scope.declare("x", GlobalSymbol::Variable { address: 4 }));
        assert!(scope.declare("main", GlobalSymbol::Function { id: 0, arity: 0 }));
        assert!(!scope.declare("x", GlobalSymbol::Function { id: 1, arity: 2 }));

        assert_eq!(scope.lookup("x"), Some(GlobalSymbol::Variable { address: 4 }));
        assert_eq!(scope.lookup("main"), Some(GlobalSymbol::Function { id: 0, arity: 0 }));
        assert_eq!(scope.lookup("y"), None);

        scope.declare_import("write", ImportSymbol { id: 0, arity: 1 });
        assert_eq!(scope.import("write"), Some(ImportSymbol { id: 0, arity: 1 }));
        assert_eq!(scope.lookup("write"), None);
    }

    #[test]
    fn test_locals_follow_arguments() {
        let mut scope = FunctionScope::new();
        assert!(scope.add_argument("a"));
        assert!(scope.add_argument("b"));
        assert!(!scope.add_argument("a"));

        assert_eq!(scope.slot_or_allocate("t"), 2);
        assert_eq!(scope.slot_or_allocate("b"), 1);
        assert_eq!(scope.slot_or_allocate("u"), 3);
        assert_eq!(scope.slot_or_allocate("t"), 2);
        assert_eq!(scope.arg_count(), 2);
        assert_eq!(scope.local_count(), 2);
    }
}
