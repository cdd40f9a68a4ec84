//! # Tensolve
//!
//! Symbolic solving of linear equation systems over scalars, vectors and
//! matrices, where products do not commute and division means multiplying
//! by an inverse on the correct side.
//!
//! ## Features
//!
//! - **Hash-Consed Expressions**: every distinct tensor expression is stored
//!   once, so equal handles mean equal expressions
//! - **Shape Checking**: ranks are inferred and checked as nodes are built
//! - **Ordered Algebra**: canonical sums and products that only reorder
//!   scalar factors
//! - **Solving Strategies**: single-equation isolation, ordered elimination,
//!   permutation search, progressive and assumption-driven solving
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tensolve::prelude::*;
//!
//! let mut arena = ExprArena::new();
//! let q = arena.symbol("q", 1)?;
//! let r = arena.symbol("r", 1)?;
//! let a = arena.symbol("A", 2)?;
//!
//! // A·q - r = 0
//! let aq = mul(&mut arena, &[a, q])?;
//! let e = sub(&mut arena, aq, r)?;
//! let q_value = solve(&mut arena, Equation::new(e), q)?; // inv(A)*r
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use tensolve_core as core;
pub use tensolve_solve as solver;
pub use tensolve_tensor as tensor;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tensolve_core::{ExprArena, ExprHandle, ExprNode, HandleSet, Operator, Shape};
    pub use tensolve_solve::{
        assume_solve, branching_solve, eliminate, forward, search, solve, Equation, Resolution,
        SolutionMap, SolveError, SolverConfig,
    };
    pub use tensolve_tensor::{add, expand, inverse, mul, neg, pow, sub, substitute, transpose};
}
