//! Type-safe expression handles.
//!
//! Handles are 32-bit indices into the arena. Because the arena hash-conses
//! every node, two handles from the same arena are equal exactly when the
//! expressions are structurally equal, so handles double as the structural
//! equality, hashing and ordering the solver needs for set semantics.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A handle to an expression in the arena.
///
/// Handles order by interning time. Within one arena this order is fixed by
/// the sequence of constructor calls, which is what keeps every search over
/// symbol sets reproducible.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprHandle(u32);

/// An ordered set of handles, iterated in interning order.
pub type HandleSet = BTreeSet<ExprHandle>;

/// An ordered map keyed by handles, iterated in interning order.
pub type HandleMap<V> = BTreeMap<ExprHandle, V>;

impl ExprHandle {
    /// Creates a new handle from an index.
    ///
    /// This is primarily for internal use by the arena.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this handle.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ExprHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl fmt::Display for ExprHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
