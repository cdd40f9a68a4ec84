//! Distribution of products over sums.
//!
//! Expansion keeps the order of non-scalar factors, so `A·(q + r)` becomes
//! `A·q + A·r` and never `q·A + r·A`.

use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};
use tensolve_core::{ExprArena, ExprHandle, ExprNode};

use crate::build::{add, apply, mul, pow, small_integer};
use crate::Result;

/// Integral powers of sums up to this exponent are multiplied out.
const MAX_EXPANDED_POWER: i64 = 8;

/// Fully distributes products over sums, recursively.
///
/// Operator operands are expanded too, and transposes of sums are split.
///
/// # Errors
///
/// Propagates errors from the canonical constructors.
pub fn expand(arena: &mut ExprArena, expr: ExprHandle) -> Result<ExprHandle> {
    let mut cache = FxHashMap::default();
    expand_cached(arena, expr, &mut cache)
}

fn expand_cached(
    arena: &mut ExprArena,
    expr: ExprHandle,
    cache: &mut FxHashMap<ExprHandle, ExprHandle>,
) -> Result<ExprHandle> {
    if let Some(&done) = cache.get(&expr) {
        return Ok(done);
    }
    let node = arena.get(expr).clone();
    let out = match node {
        ExprNode::Number(_) | ExprNode::Symbol(_) => expr,
        ExprNode::Add(args) => {
            let mut terms = Vec::with_capacity(args.len());
            for &t in &args {
                terms.push(expand_cached(arena, t, cache)?);
            }
            add(arena, &terms)?
        }
        ExprNode::Mul(args) => {
            let mut factors = Vec::with_capacity(args.len());
            for &f in &args {
                factors.push(expand_cached(arena, f, cache)?);
            }
            distribute(arena, &factors)?
        }
        ExprNode::Pow { base, exp } => {
            let b = expand_cached(arena, base, cache)?;
            let e = expand_cached(arena, exp, cache)?;
            let k = arena.as_number(e).and_then(small_integer);
            match k {
                Some(k)
                    if (2..=MAX_EXPANDED_POWER).contains(&k)
                        && matches!(arena.get(b), ExprNode::Add(_)) =>
                {
                    let n = usize::try_from(k).unwrap_or(0);
                    distribute(arena, &vec![b; n])?
                }
                _ => pow(arena, b, e)?,
            }
        }
        ExprNode::Operator { op, args } => {
            let mut operands: SmallVec<[ExprHandle; 2]> = SmallVec::new();
            for &a in &args {
                operands.push(expand_cached(arena, a, cache)?);
            }
            let applied = apply(arena, op, &operands)?;
            // transpose/inverse may have produced a fresh product or sum
            if applied != expr && !matches!(arena.get(applied), ExprNode::Operator { .. }) {
                expand_cached(arena, applied, cache)?
            } else {
                applied
            }
        }
    };
    cache.insert(expr, out);
    Ok(out)
}

/// Multiplies out a list of already expanded factors.
fn distribute(arena: &mut ExprArena, factors: &[ExprHandle]) -> Result<ExprHandle> {
    let mut products: Vec<SmallVec<[ExprHandle; 4]>> = vec![SmallVec::new()];
    for &f in factors {
        let terms: SmallVec<[ExprHandle; 4]> = match arena.get(f) {
            ExprNode::Add(args) => args.clone(),
            _ => smallvec![f],
        };
        let mut next = Vec::with_capacity(products.len() * terms.len());
        for p in &products {
            for &t in &terms {
                let mut q = p.clone();
                q.push(t);
                next.push(q);
            }
        }
        products = next;
    }

    let mut terms = Vec::with_capacity(products.len());
    for p in products {
        terms.push(mul(arena, &p)?);
    }
    add(arena, &terms)
}
