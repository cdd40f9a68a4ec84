//! # tensolve-tensor
//!
//! Algebra over tensor expressions stored in a [`tensolve_core::ExprArena`].
//!
//! This crate provides:
//! - Canonical constructors for sums, ordered products, powers and operators
//! - Distribution of products over sums that keeps factor order
//! - Substitution and sub-product replacement
//! - Structural queries: free symbols, polynomial degree, node count
//! - Splitting a product around the factor that holds a symbol
//! - Common subexpression elimination
//!
//! All functions take the arena by `&mut` and return new handles; nothing
//! is rewritten in place.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod build;
pub mod coeff;
pub mod cse;
pub mod expand;
pub mod query;
pub mod subst;

#[cfg(test)]
mod proptests;

pub use build::{add, apply, function, inner, inverse, mul, neg, pow, rebuild, sub, transpose};
pub use coeff::{coefficient_split, linear_coefficient, CoefficientSplit, Side};
pub use cse::{cse, CseResult};
pub use expand::expand;
pub use query::{atoms, atoms_of_all, contains, degree, node_count};
pub use subst::{replace, substitute, substitute_all};

/// Result alias for expression algebra.
pub type Result<T> = std::result::Result<T, tensolve_core::ExprError>;
