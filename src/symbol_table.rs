//! One flat name table for the whole unit. The language has no block
//! scoping, so there is no scope stack to push or pop; if blocks ever grow
//! their own scopes this becomes a stack of maps with outward lookup

use crate::Type;
use indexmap::IndexMap;

#[derive(PartialEq, Clone, Copy, Debug, Default)]
pub struct SymbolInfo {
    pub initialized: bool,
    pub ty: Option<Type>,
}

/// insertion order is kept so walking the table is deterministic
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, SymbolInfo>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// insert with initialized = false; a second declaration is left to the
    /// analyzer to report and changes nothing here
    pub fn declare(&mut self, name: &str) {
        if !self.symbols.contains_key(name) {
            self.symbols.insert(name.to_string(), SymbolInfo::default());
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// mark initialized and record the first known type. Assigning to an
    /// undeclared name is a semantic error at the analyzer level, never an
    /// implicit declaration, so an unknown name is a no-op here
    pub fn assign(&mut self, name: &str, ty: Option<Type>) {
        if let Some(info) = self.symbols.get_mut(name) {
            info.initialized = true;
            if info.ty.is_none() {
                info.ty = ty;
            }
        }
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.symbols.get(name).map(|info| info.initialized).unwrap_or(false)
    }

    pub fn get_type(&self, name: &str) -> Option<Type> {
        self.symbols.get(name).and_then(|info| info.ty)
    }
}
