//! Structural queries.

use rustc_hash::FxHashSet;
use tensolve_core::{ExprArena, ExprHandle, ExprNode, HandleSet, Operator};

use crate::build::small_integer;

/// Returns the symbols occurring in `expr`, in interning order.
#[must_use]
pub fn atoms(arena: &ExprArena, expr: ExprHandle) -> HandleSet {
    atoms_of_all(arena, [expr])
}

/// Returns the union of the symbols of all `exprs`.
#[must_use]
pub fn atoms_of_all(arena: &ExprArena, exprs: impl IntoIterator<Item = ExprHandle>) -> HandleSet {
    let mut out = HandleSet::new();
    let mut seen: FxHashSet<ExprHandle> = FxHashSet::default();
    let mut stack: Vec<ExprHandle> = exprs.into_iter().collect();
    while let Some(h) = stack.pop() {
        if !seen.insert(h) {
            continue;
        }
        match arena.get(h) {
            ExprNode::Symbol(_) => {
                out.insert(h);
            }
            node => stack.extend(node.children()),
        }
    }
    out
}

/// Returns true if `symbol` occurs anywhere in `expr`.
#[must_use]
pub fn contains(arena: &ExprArena, expr: ExprHandle, symbol: ExprHandle) -> bool {
    if expr == symbol {
        return true;
    }
    arena
        .get(expr)
        .children()
        .iter()
        .any(|&c| contains(arena, c, symbol))
}

/// Counts the nodes of `expr` as a tree, shared subexpressions once per
/// occurrence.
#[must_use]
pub fn node_count(arena: &ExprArena, expr: ExprHandle) -> usize {
    1 + arena
        .get(expr)
        .children()
        .iter()
        .map(|&c| node_count(arena, c))
        .sum::<usize>()
}

/// Polynomial degree of `expr` in `var`.
///
/// Derivatives, transpose and the inverse of a matrix pass the degree of
/// their operand through; an inner product adds the degrees of both sides.
/// Returns `None` when `expr` is not polynomial in `var`: `var` under a
/// named function, in an exponent, inside a scalar inverse, or raised to a
/// negative or fractional power.
#[must_use]
pub fn degree(arena: &ExprArena, expr: ExprHandle, var: ExprHandle) -> Option<u32> {
    if expr == var {
        return Some(1);
    }
    if !contains(arena, expr, var) {
        return Some(0);
    }
    match arena.get(expr) {
        ExprNode::Number(_) | ExprNode::Symbol(_) => Some(0),
        ExprNode::Add(args) => args
            .iter()
            .try_fold(0, |acc, &a| degree(arena, a, var).map(|d| acc.max(d))),
        ExprNode::Mul(args) => args
            .iter()
            .try_fold(0u32, |acc, &a| degree(arena, a, var)?.checked_add(acc)),
        ExprNode::Pow { base, exp } => {
            if contains(arena, *exp, var) {
                return None;
            }
            let k = small_integer(arena.as_number(*exp)?)?;
            let k = u32::try_from(k).ok()?;
            degree(arena, *base, var)?.checked_mul(k)
        }
        ExprNode::Operator { op, args } => match op {
            Operator::Function(_) => None,
            Operator::Inverse if arena.shape(args[0]).is_scalar() => None,
            Operator::Inner => {
                let left = degree(arena, args[0], var)?;
                left.checked_add(degree(arena, args[1], var)?)
            }
            _ => degree(arena, args[0], var),
        },
    }
}
