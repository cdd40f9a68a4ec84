//! Name interning for symbols and functions.
//!
//! Symbols are looked up by name through an explicit table built as they are
//! declared, never by walking expressions.

use dashu::rational::RBig;
use hashbrown::HashMap;

use crate::shape::Shape;

/// What the arena knows about a declared symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    /// Display name.
    pub name: String,
    /// Declared shape.
    pub shape: Shape,
    /// Fixed numeric value, for named constants. Such symbols are always known.
    pub value: Option<RBig>,
}

impl SymbolInfo {
    /// Returns the tensor rank of the symbol.
    #[must_use]
    pub fn rank(&self) -> u8 {
        self.shape.rank()
    }

    /// Returns true if the symbol carries a fixed value.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.value.is_some()
    }
}

/// A table of named entries with dense `u32` ids.
///
/// Ids are assigned in declaration order and never reused.
#[derive(Debug)]
pub struct NameTable<T> {
    ids: HashMap<String, u32>,
    entries: Vec<T>,
}

impl<T> Default for NameTable<T> {
    fn default() -> Self {
        Self {
            ids: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<T> NameTable<T> {
    /// Creates a new empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `name`, inserting `make()` if it is new.
    ///
    /// The second component is true when the entry was created by this call.
    pub fn get_or_insert_with(&mut self, name: &str, make: impl FnOnce() -> T) -> (u32, bool) {
        if let Some(&id) = self.ids.get(name) {
            return (id, false);
        }
        let id = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        self.ids.insert(name.to_string(), id);
        self.entries.push(make());
        (id, true)
    }

    /// Gets the id registered for `name`.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    /// Gets an entry by id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&T> {
        self.entries.get(id as usize)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Symbol table: names to [`SymbolInfo`].
pub type SymbolTable = NameTable<SymbolInfo>;
