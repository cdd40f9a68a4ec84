//! Linear solving of tensor equation systems.
//!
//! This crate provides strategies for systems of equations `eᵢ = 0` over
//! scalars, vectors and matrices whose product does not commute:
//!
//! - **Isolation**: [`solve`] one unknown from one linear equation
//! - **Elimination**: [`eliminate`] unknowns in a fixed order, using the
//!   products that are zero as constraints
//! - **Permutation search**: [`search`] over elimination orders, pruning
//!   blocked prefixes and ranking the distinct results by size
//! - **Progressive solving**: [`forward`] solves whatever holds a single
//!   unknown, until nothing changes
//! - **Assumptions**: [`assume_solve`] treats one unknown as known when
//!   progressive solving stalls; [`branching_solve`] tries every minimal set
//!   of assumptions from [`build_stack`]
//!
//! Isolation failures (`NonLinear`, `NotInvertible`, `Unsupported`) are
//! local: the strategies log them and try the next equation or order.
//!
//! # Example
//!
//! ```ignore
//! use tensolve_core::{ExprArena, HandleSet};
//! use tensolve_solve::{forward, Equation};
//! use tensolve_tensor::{add, mul, sub};
//!
//! let mut arena = ExprArena::new();
//! let q = arena.symbol("q", 1)?;
//! let r = arena.symbol("r", 1)?;
//! let s = arena.symbol("s", 1)?;
//! let delta = arena.symbol("delta", 0)?;
//!
//! // s + q = 0, delta·r - q = 0
//! let e1 = add(&mut arena, &[s, q])?;
//! let dr = mul(&mut arena, &[delta, r])?;
//! let e2 = sub(&mut arena, dr, q)?;
//!
//! let knowns: HandleSet = [delta, r].into_iter().collect();
//! let map = forward(&mut arena, &[Equation::new(e1), Equation::new(e2)], &knowns, false)?;
//! println!("{}", map.display(&arena)); // {q: delta*r, s: -delta*r}
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod assume;
pub mod branching;
pub mod config;
pub mod eliminate;
pub mod error;
pub mod forward;
pub mod isolate;
pub mod permute;
pub mod search;
pub mod system;

#[cfg(test)]
mod proptests;

pub use assume::assume_solve;
pub use branching::{branching_solve, build_stack};
pub use config::{AssumptionPolicy, SolverConfig};
pub use eliminate::{eliminate, Elimination};
pub use error::SolveError;
pub use forward::forward;
pub use isolate::solve;
pub use permute::Permutations;
pub use search::{
    search, search_with, solve_update, CancelFlag, LogProgress, NoProgress, Progress,
    SearchSolution,
};
pub use system::{equations, unknowns, Equation, Resolution, SolutionDisplay, SolutionMap};
