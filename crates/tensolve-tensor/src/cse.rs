//! Common subexpression elimination over a batch of expressions.

use rustc_hash::FxHashMap;
use tensolve_core::{ExprArena, ExprHandle};

use crate::build::rebuild;
use crate::Result;

/// Output of [`cse`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CseResult {
    /// Temporaries in dependency order: each definition only refers to
    /// temporaries listed before it.
    pub replacements: Vec<(ExprHandle, ExprHandle)>,
    /// The input expressions rewritten in terms of the temporaries.
    pub exprs: Vec<ExprHandle>,
}

/// Pulls subexpressions that occur more than once across `exprs` into fresh
/// symbols named `{prefix}{n}`.
///
/// # Errors
///
/// Propagates errors from rebuilding the rewritten expressions.
pub fn cse(arena: &mut ExprArena, exprs: &[ExprHandle], prefix: &str) -> Result<CseResult> {
    let mut counts: FxHashMap<ExprHandle, usize> = FxHashMap::default();
    for &e in exprs {
        count(arena, e, &mut counts);
    }

    let mut out = CseResult::default();
    let mut memo: FxHashMap<ExprHandle, ExprHandle> = FxHashMap::default();
    for &e in exprs {
        let h = extract(arena, e, &counts, prefix, &mut memo, &mut out.replacements)?;
        out.exprs.push(h);
    }
    Ok(out)
}

/// Counts occurrences; the children of a repeated node are only counted
/// through its first occurrence.
fn count(arena: &ExprArena, expr: ExprHandle, counts: &mut FxHashMap<ExprHandle, usize>) {
    if arena.get(expr).is_atom() {
        return;
    }
    let seen = counts.entry(expr).or_insert(0);
    *seen += 1;
    if *seen > 1 {
        return;
    }
    for c in arena.get(expr).children() {
        count(arena, c, counts);
    }
}

fn extract(
    arena: &mut ExprArena,
    expr: ExprHandle,
    counts: &FxHashMap<ExprHandle, usize>,
    prefix: &str,
    memo: &mut FxHashMap<ExprHandle, ExprHandle>,
    replacements: &mut Vec<(ExprHandle, ExprHandle)>,
) -> Result<ExprHandle> {
    if let Some(&done) = memo.get(&expr) {
        return Ok(done);
    }
    let children = arena.get(expr).children();
    if children.is_empty() {
        return Ok(expr);
    }
    let mut rewritten = Vec::with_capacity(children.len());
    for &c in &children {
        rewritten.push(extract(arena, c, counts, prefix, memo, replacements)?);
    }
    let body = if rewritten.as_slice() == children.as_slice() {
        expr
    } else {
        rebuild(arena, expr, &rewritten)?
    };
    let out = if counts.get(&expr).copied().unwrap_or(0) > 1 {
        let temp = arena.fresh_symbol(prefix, arena.shape(expr));
        replacements.push((temp, body));
        temp
    } else {
        body
    };
    memo.insert(expr, out);
    Ok(out)
}
