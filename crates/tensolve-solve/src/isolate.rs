//! Linear isolation of one unknown from one equation.
//!
//! The isolator peels the equation from the outside in, carrying a
//! right-hand side that starts at zero:
//!
//! - a product `L·core·R` becomes `core = L⁻¹·rhs·R⁻¹`, so coefficients are
//!   always divided out on the side they multiply from;
//! - a sum moves its variable-free addends across, and a remainder of the
//!   form `Σ cᵢ·x` (or `Σ x·cᵢ`) is divided by `Σ cᵢ` on that side;
//! - `inv(e) = rhs` becomes `e = inv(rhs)` and `T(e) = rhs` becomes
//!   `e = T(rhs)`.

use tensolve_core::{ExprArena, ExprHandle, ExprNode, Operator};
use tensolve_tensor::{
    add, coefficient_split, contains, degree, expand, inverse, linear_coefficient, mul, sub,
    transpose, Side,
};
use tracing::trace;

use crate::{Equation, SolveError};

/// Solves `equation = 0` for `variable`.
///
/// # Errors
///
/// - [`SolveError::NotASymbol`] if `variable` is not a symbol.
/// - [`SolveError::RankMismatch`] if the ranks of variable and equation differ.
/// - [`SolveError::NonLinear`] if the equation is not of degree one in it.
/// - [`SolveError::NotInvertible`] if a coefficient cannot be divided out.
/// - [`SolveError::Unsupported`] if no reduction rule applies.
pub fn solve(
    arena: &mut ExprArena,
    equation: Equation,
    variable: ExprHandle,
) -> Result<ExprHandle, SolveError> {
    let expr = equation.expr();
    if !arena.is_symbol(variable) {
        return Err(SolveError::NotASymbol(arena.display(variable).to_string()));
    }
    let (var_shape, eq_shape) = (arena.shape(variable), arena.shape(expr));
    if var_shape.rank() != eq_shape.rank() {
        return Err(SolveError::RankMismatch {
            name: arena.display(variable).to_string(),
            variable: var_shape,
            equation: eq_shape,
        });
    }
    match degree(arena, expr, variable) {
        Some(1) => {}
        Some(0) => return Err(unsupported(arena, expr, variable)),
        _ => return Err(SolveError::NonLinear(arena.display(variable).to_string())),
    }

    let start = numerator(arena, expr, variable).unwrap_or(expr);
    let zero = arena.zero();
    isolate(arena, start, variable, zero)
}

fn unsupported(arena: &ExprArena, expr: ExprHandle, variable: ExprHandle) -> SolveError {
    SolveError::Unsupported {
        name: arena.display(variable).to_string(),
        expr: arena.display(expr).to_string(),
    }
}

/// For `n · inv(c)` with a scalar `c` free of the variable, only `n = 0`
/// matters.
fn numerator(arena: &ExprArena, expr: ExprHandle, variable: ExprHandle) -> Option<ExprHandle> {
    let ExprNode::Mul(args) = arena.get(expr) else {
        return None;
    };
    let [a, b] = args.as_slice() else {
        return None;
    };
    let is_denominator = |h: ExprHandle| {
        arena
            .get(h)
            .operand_of(Operator::Inverse)
            .is_some_and(|inner| arena.shape(inner[0]).is_scalar())
            && !contains(arena, h, variable)
    };
    if is_denominator(*b) && contains(arena, *a, variable) {
        Some(*a)
    } else if is_denominator(*a) && contains(arena, *b, variable) {
        Some(*b)
    } else {
        None
    }
}

fn isolate(
    arena: &mut ExprArena,
    expr: ExprHandle,
    variable: ExprHandle,
    rhs: ExprHandle,
) -> Result<ExprHandle, SolveError> {
    if expr == variable {
        return Ok(rhs);
    }
    let expr = expand(arena, expr)?;
    if expr == variable {
        return Ok(rhs);
    }
    trace!(
        lhs = %arena.display(expr),
        rhs = %arena.display(rhs),
        "isolating"
    );

    let node = arena.get(expr).clone();
    match node {
        ExprNode::Mul(_) => {
            let Some(split) = coefficient_split(arena, expr, variable)? else {
                return Err(SolveError::NonLinear(arena.display(variable).to_string()));
            };
            let left = inverse(arena, split.left)?;
            let right = inverse(arena, split.right)?;
            let rhs = mul(arena, &[left, rhs, right])?;
            isolate(arena, split.core, variable, rhs)
        }
        ExprNode::Add(terms) => {
            let (with, without): (Vec<ExprHandle>, Vec<ExprHandle>) = terms
                .iter()
                .copied()
                .partition(|&t| contains(arena, t, variable));
            let moved = add(arena, &without)?;
            let rhs = sub(arena, rhs, moved)?;
            match with.as_slice() {
                [] => Err(unsupported(arena, expr, variable)),
                [single] => isolate(arena, *single, variable, rhs),
                _ => divide_by_coefficient(arena, &with, variable, rhs),
            }
        }
        ExprNode::Operator {
            op: Operator::Inverse,
            args,
        } => {
            let rhs = inverse(arena, rhs)?;
            isolate(arena, args[0], variable, rhs)
        }
        ExprNode::Operator {
            op: Operator::Transpose,
            args,
        } => {
            let rhs = transpose(arena, rhs)?;
            isolate(arena, args[0], variable, rhs)
        }
        _ => Err(unsupported(arena, expr, variable)),
    }
}

/// Handles `Σ cᵢ·x = rhs` (or `Σ x·cᵢ = rhs`).
fn divide_by_coefficient(
    arena: &mut ExprArena,
    terms: &[ExprHandle],
    variable: ExprHandle,
    rhs: ExprHandle,
) -> Result<ExprHandle, SolveError> {
    let lhs = add(arena, terms)?;
    let Some((side, coeff)) = linear_coefficient(arena, terms, variable)? else {
        return Err(unsupported(arena, lhs, variable));
    };

    let rebuilt = match side {
        Side::Left => mul(arena, &[coeff, variable])?,
        Side::Right => mul(arena, &[variable, coeff])?,
    };
    if expand(arena, rebuilt)? != expand(arena, lhs)? {
        return Err(unsupported(arena, lhs, variable));
    }

    let inv = inverse(arena, coeff)?;
    let solved = match side {
        Side::Left => mul(arena, &[inv, rhs])?,
        Side::Right => mul(arena, &[rhs, inv])?,
    };
    Ok(solved)
}
