//! # tensolve-core
//!
//! Core expression storage for the tensolve equation solver.
//!
//! This crate provides:
//! - Arena-allocated expression storage with hash-consing
//! - Type-safe expression handles
//! - Tensor shapes checked when a node is created
//! - A symbol table with explicit by-name lookup
//!
//! ## Design Principles
//!
//! - **Hash-Consing**: every structurally unique expression is stored once,
//!   so handle equality is structural equality
//! - **Immutable Nodes**: transformations intern new nodes, nothing is
//!   rewritten in place
//! - **Shape Safety**: a node whose operand ranks do not fit its kind is
//!   rejected by [`ExprArena::intern`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod display;
pub mod expr;
pub mod handle;
pub mod intern;
pub mod shape;

use thiserror::Error;

pub use arena::ExprArena;
pub use display::ExprDisplay;
pub use expr::{ExprNode, FunctionId, Operator, SymbolId};
pub use handle::{ExprHandle, HandleMap, HandleSet};
pub use intern::SymbolInfo;
pub use shape::Shape;

/// Errors raised while building expressions.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExprError {
    /// Operand shapes do not fit together.
    #[error("shape mismatch in {context}: {left} against {right}")]
    ShapeMismatch {
        /// Where the mismatch was found.
        context: &'static str,
        /// Shape accumulated so far.
        left: Shape,
        /// Shape that did not fit.
        right: Shape,
    },

    /// An inverse was requested that has no defined value.
    #[error("no inverse exists for {0}")]
    NotInvertible(String),

    /// Wrong number of operands.
    #[error("`{op}` takes {expected} operand(s), got {found}")]
    Arity {
        /// Operator name.
        op: &'static str,
        /// Expected operand count.
        expected: usize,
        /// Supplied operand count.
        found: usize,
    },

    /// The operator is not defined for this operand shape.
    #[error("`{op}` is not defined for a {shape}")]
    InvalidOperand {
        /// Operator name.
        op: &'static str,
        /// Offending shape.
        shape: Shape,
    },

    /// A symbol name was reused with another rank.
    #[error("symbol `{name}` was declared as a {declared}, not a {requested}")]
    Redeclared {
        /// Symbol name.
        name: String,
        /// Shape it was first declared with.
        declared: Shape,
        /// Shape requested now.
        requested: Shape,
    },

    /// A symbol id that the arena never handed out.
    #[error("unknown symbol id {0}")]
    UnknownSymbol(SymbolId),
}
