use super::Stack;
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Symbol table
///
/// Declarations are appended and never removed; leaving a block only
/// deactivates its entries. Addresses already baked into emitted
/// instructions stay valid, and the final dump remains complete.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SymKind {
    Const,
    Var,
    Procedure,
}

impl std::fmt::Display for SymKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SymKind::Const => write!(f, "const"),
            SymKind::Var => write!(f, "var"),
            SymKind::Procedure => write!(f, "procedure"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymKind,
    /// Constant value; zero for anything else.
    pub value: i64,
    /// Nesting depth at declaration.
    pub level: usize,
    /// Frame offset for a var, word address of the entry point for a
    /// procedure, zero for a const.
    pub address: usize,
    pub active: bool,
}

#[derive(Debug)]
pub struct SymbolTable {
    entries: Stack<SymbolEntry>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            entries: Stack::new("SYMBOL TABLE FULL"),
        }
    }

    /// Declare a name at the given level. Redeclaring a name that is
    /// active at the same level is an error; shadowing an outer
    /// declaration is not.
    pub fn declare(
        &mut self,
        name: &str,
        kind: SymKind,
        value: i64,
        level: usize,
        address: usize,
    ) -> Result<()> {
        for entry in self.entries.iter() {
            if entry.active && entry.level == level && entry.name == name {
                return Err(error!(DuplicateIdent));
            }
        }
        self.entries.push(SymbolEntry {
            name: name.to_string(),
            kind,
            value,
            level,
            address,
            active: true,
        })
    }

    /// Newest-first lookup over active entries; an inner declaration
    /// hides an outer one without removing it.
    pub fn resolve(&self, name: &str) -> Result<&SymbolEntry> {
        for entry in self.entries.iter().rev() {
            if entry.active && entry.name == name {
                return Ok(entry);
            }
        }
        Err(error!(UndeclaredIdent))
    }

    /// Deactivate every entry declared at `level`.
    pub fn close_scope(&mut self, level: usize) {
        for index in 0..self.entries.len() {
            if let Some(entry) = self.entries.get_mut(index) {
                if entry.level == level {
                    entry.active = false;
                }
            }
        }
    }

    pub fn entries(&self) -> std::slice::Iter<'_, SymbolEntry> {
        self.entries.iter()
    }
}
