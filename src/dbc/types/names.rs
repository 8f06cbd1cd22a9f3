//! Name interner.
//!
//! Every node, message, signal and attribute name seen while parsing is stored once and
//! referred to by a small [`Symbol`] handle. Comparing two handles replaces comparing two
//! strings; the original spelling stays retrievable through [`Interner::resolve`].

use std::collections::HashMap;

/// Handle to an interned name. Only meaningful for the [`Interner`] that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Position of the name in the interner's table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Default, Clone, Debug)]
pub struct Interner {
    names: Vec<Box<str>>,
    index: HashMap<Box<str>, Symbol>,
}

impl Interner {
    /// Returns the symbol for `name`, creating it on first use. Names are case-sensitive.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&sym) = self.index.get(name) {
            return sym;
        }
        let sym: Symbol = Symbol(self.names.len() as u32);
        self.names.push(name.into());
        self.index.insert(name.into(), sym);
        sym
    }

    /// Looks a name up without creating it.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.index.get(name).copied()
    }

    /// Original spelling of `sym`, or `""` for a handle issued by another interner.
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.names.get(sym.index()).map(|s| &**s).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
