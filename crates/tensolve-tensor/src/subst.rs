//! Substitution and replacement.

use dashu::rational::RBig;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tensolve_core::{ExprArena, ExprError, ExprHandle, ExprNode};

use crate::build::{mul, rebuild};
use crate::Result;

/// Replaces every occurrence of `symbol` in `expr` by `value`.
///
/// The literal zero may stand in for a symbol of any shape.
///
/// # Errors
///
/// Returns [`ExprError::ShapeMismatch`] if `value` has another shape than
/// `symbol`, and propagates errors from rebuilding (for instance a
/// substituted zero under an inverse).
pub fn substitute(
    arena: &mut ExprArena,
    expr: ExprHandle,
    symbol: ExprHandle,
    value: ExprHandle,
) -> Result<ExprHandle> {
    let mut map = FxHashMap::default();
    map.insert(symbol, value);
    substitute_all(arena, expr, &map)
}

/// Simultaneously replaces every key of `map` by its value.
///
/// # Errors
///
/// See [`substitute`].
pub fn substitute_all(
    arena: &mut ExprArena,
    expr: ExprHandle,
    map: &FxHashMap<ExprHandle, ExprHandle>,
) -> Result<ExprHandle> {
    for (&symbol, &value) in map {
        let (left, right) = (arena.shape(symbol), arena.shape(value));
        if left != right && !arena.is_zero(value) {
            return Err(ExprError::ShapeMismatch {
                context: "substitution",
                left,
                right,
            });
        }
    }
    let mut cache = FxHashMap::default();
    subst_cached(arena, expr, map, &mut cache)
}

fn subst_cached(
    arena: &mut ExprArena,
    expr: ExprHandle,
    map: &FxHashMap<ExprHandle, ExprHandle>,
    cache: &mut FxHashMap<ExprHandle, ExprHandle>,
) -> Result<ExprHandle> {
    if let Some(&value) = map.get(&expr) {
        return Ok(value);
    }
    if let Some(&done) = cache.get(&expr) {
        return Ok(done);
    }
    let children = arena.get(expr).children();
    if children.is_empty() {
        return Ok(expr);
    }
    let mut rebuilt: SmallVec<[ExprHandle; 4]> = SmallVec::with_capacity(children.len());
    for &c in &children {
        rebuilt.push(subst_cached(arena, c, map, cache)?);
    }
    let out = if rebuilt == children {
        expr
    } else {
        rebuild(arena, expr, &rebuilt)?
    };
    cache.insert(expr, out);
    Ok(out)
}

/// Replaces occurrences of the subexpression `target` by `replacement`.
///
/// Besides exact matches, a product target also matches inside a larger
/// product that holds all of its scalar factors and its non-scalar factors
/// as one contiguous run: replacing `A·q` by `0` in `δ·B·A·q` gives `0`.
///
/// # Errors
///
/// Propagates errors from rebuilding.
pub fn replace(
    arena: &mut ExprArena,
    expr: ExprHandle,
    target: ExprHandle,
    replacement: ExprHandle,
) -> Result<ExprHandle> {
    let mut cache = FxHashMap::default();
    replace_cached(arena, expr, target, replacement, &mut cache)
}

fn replace_cached(
    arena: &mut ExprArena,
    expr: ExprHandle,
    target: ExprHandle,
    replacement: ExprHandle,
    cache: &mut FxHashMap<ExprHandle, ExprHandle>,
) -> Result<ExprHandle> {
    if expr == target {
        return Ok(replacement);
    }
    if let Some(&done) = cache.get(&expr) {
        return Ok(done);
    }
    let children = arena.get(expr).children();
    let mut rebuilt: SmallVec<[ExprHandle; 4]> = SmallVec::with_capacity(children.len());
    for &c in &children {
        rebuilt.push(replace_cached(arena, c, target, replacement, cache)?);
    }
    let mut out = if rebuilt == children {
        expr
    } else {
        rebuild(arena, expr, &rebuilt)?
    };
    if out == target {
        out = replacement;
    } else if let Some(h) = replace_in_product(arena, out, target, replacement)? {
        out = h;
    }
    cache.insert(expr, out);
    Ok(out)
}

/// Factors of a canonical product, split by kind.
struct Parts {
    coeff: RBig,
    scalars: Vec<ExprHandle>,
    chain: Vec<ExprHandle>,
}

fn parts(arena: &ExprArena, args: &[ExprHandle]) -> Parts {
    let mut p = Parts {
        coeff: RBig::ONE,
        scalars: Vec::new(),
        chain: Vec::new(),
    };
    for &a in args {
        if let Some(n) = arena.as_number(a) {
            p.coeff = &p.coeff * n;
        } else if arena.shape(a).is_scalar() {
            p.scalars.push(a);
        } else {
            p.chain.push(a);
        }
    }
    p
}

fn find_run(haystack: &[ExprHandle], needle: &[ExprHandle]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn replace_in_product(
    arena: &mut ExprArena,
    expr: ExprHandle,
    target: ExprHandle,
    replacement: ExprHandle,
) -> Result<Option<ExprHandle>> {
    let (ExprNode::Mul(outer), ExprNode::Mul(inner)) =
        (arena.get(expr).clone(), arena.get(target).clone())
    else {
        return Ok(None);
    };
    let outer = parts(arena, &outer);
    let inner = parts(arena, &inner);
    if inner.coeff.is_zero() {
        return Ok(None);
    }

    let mut remaining = outer.scalars;
    for s in &inner.scalars {
        match remaining.iter().position(|x| x == s) {
            Some(pos) => {
                remaining.remove(pos);
            }
            None => return Ok(None),
        }
    }
    let Some(at) = find_run(&outer.chain, &inner.chain) else {
        return Ok(None);
    };

    let coeff = arena.number(&outer.coeff / &inner.coeff);
    let mut factors = Vec::with_capacity(outer.chain.len() + remaining.len() + 2);
    factors.push(coeff);
    factors.extend(remaining);
    factors.extend_from_slice(&outer.chain[..at]);
    factors.push(replacement);
    factors.extend_from_slice(&outer.chain[at + inner.chain.len()..]);
    mul(arena, &factors).map(Some)
}
