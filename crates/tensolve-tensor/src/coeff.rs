//! Splitting products around the factor that holds a symbol.

use tensolve_core::{ExprArena, ExprHandle, ExprNode};

use crate::build::{add, mul};
use crate::query::contains;
use crate::Result;

/// A product written as `left · core · right`, where `core` is the only
/// factor that contains the symbol of interest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoefficientSplit {
    /// Product of the factors before the core.
    pub left: ExprHandle,
    /// The factor holding the symbol.
    pub core: ExprHandle,
    /// Product of the factors after the core.
    pub right: ExprHandle,
}

/// Which side of a symbol its coefficient sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// `c · x`
    Left,
    /// `x · c`
    Right,
}

/// Splits `product` around the single factor that contains `var`.
///
/// When that factor is a scalar it commutes with everything else, so the
/// whole remainder goes to `left` and `right` is `1`.
///
/// Returns `Ok(None)` if `product` is not a product, or if `var` occurs in
/// no factor or in more than one.
///
/// # Errors
///
/// Propagates errors from rebuilding the partial products.
pub fn coefficient_split(
    arena: &mut ExprArena,
    product: ExprHandle,
    var: ExprHandle,
) -> Result<Option<CoefficientSplit>> {
    let ExprNode::Mul(args) = arena.get(product).clone() else {
        return Ok(None);
    };
    let mut holders = args
        .iter()
        .enumerate()
        .filter(|&(_, &a)| contains(arena, a, var))
        .map(|(i, _)| i);
    let (Some(k), None) = (holders.next(), holders.next()) else {
        return Ok(None);
    };
    let core = args[k];

    if arena.shape(core).is_scalar() {
        let others: Vec<ExprHandle> = args
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != k)
            .map(|(_, &a)| a)
            .collect();
        let left = mul(arena, &others)?;
        let right = arena.one();
        return Ok(Some(CoefficientSplit { left, core, right }));
    }

    let left = mul(arena, &args[..k])?;
    let right = mul(arena, &args[k + 1..])?;
    Ok(Some(CoefficientSplit { left, core, right }))
}

/// Collects the coefficient of `var` in a sum whose every addend is linear
/// in `var` with the coefficient on one common side.
///
/// For `A·x + B·x` this gives `(Left, A + B)`; for `x·A + x·B` it gives
/// `(Right, A + B)`. Returns `Ok(None)` when the addends do not share a side
/// or some addend is not of the form `c·x` / `x·c`.
///
/// # Errors
///
/// Propagates errors from building the coefficient sum.
pub fn linear_coefficient(
    arena: &mut ExprArena,
    terms: &[ExprHandle],
    var: ExprHandle,
) -> Result<Option<(Side, ExprHandle)>> {
    let one = arena.one();
    let mut lefts = Vec::with_capacity(terms.len());
    let mut rights = Vec::with_capacity(terms.len());
    for &t in terms {
        if t == var {
            lefts.push(one);
            rights.push(one);
            continue;
        }
        let Some(split) = coefficient_split(arena, t, var)? else {
            return Ok(None);
        };
        if split.core != var {
            return Ok(None);
        }
        lefts.push(split.left);
        rights.push(split.right);
    }

    let (side, coeffs) = if rights.iter().all(|&r| r == one) {
        (Side::Left, lefts)
    } else if lefts.iter().all(|&l| l == one) {
        (Side::Right, rights)
    } else {
        return Ok(None);
    };
    // a bare `x` next to `A·x` would need an identity matrix
    let shape = arena.shape(coeffs[0]);
    if coeffs.iter().any(|&c| arena.shape(c) != shape) {
        return Ok(None);
    }
    Ok(Some((side, add(arena, &coeffs)?)))
}
