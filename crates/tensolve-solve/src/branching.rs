//! Assumption stacks and the branching solver.

use tensolve_core::{ExprArena, ExprHandle, HandleSet};
use tracing::{debug, debug_span, info};

use crate::system::unknowns;
use crate::{assume_solve, forward, Equation, SolutionMap, SolveError, SolverConfig};

/// Enumerates, breadth first, sets of unknowns that let [`forward`] resolve
/// the whole system once assumed known.
///
/// Level one holds one set per unknown left unresolved by a plain forward
/// solve. Each further level extends every set that still leaves some
/// unknown free by one of those free unknowns. Sets that leave nothing
/// free are complete; they come first in the result, followed by the sets
/// still pending when `levels` (default: the number of unknowns) ran out.
///
/// A system that forward solving resolves alone yields one empty set.
///
/// # Errors
///
/// Returns [`SolveError::NotASymbol`] if a known is not a symbol.
pub fn build_stack(
    arena: &mut ExprArena,
    equations: &[Equation],
    knowns: &HandleSet,
    levels: Option<usize>,
) -> Result<Vec<Vec<ExprHandle>>, SolveError> {
    let all = unknowns(arena, equations, knowns)?;
    let levels = levels.unwrap_or(all.len());
    let _span = debug_span!("build_stack", unknowns = all.len(), levels).entered();

    let initial = forward(arena, equations, knowns, false)?;
    let mut pending: Vec<Vec<ExprHandle>> = initial.unresolved_symbols().map(|u| vec![u]).collect();
    if pending.is_empty() {
        return Ok(vec![Vec::new()]);
    }

    let mut complete: Vec<Vec<ExprHandle>> = Vec::new();
    let mut seen: Vec<HandleSet> = pending.iter().map(|s| s.iter().copied().collect()).collect();
    let mut level = 1;
    while level < levels && !pending.is_empty() {
        let mut next = Vec::new();
        for stack in pending {
            let mut trial = knowns.clone();
            trial.extend(stack.iter().copied());
            let map = forward(arena, equations, &trial, false)?;
            let free: Vec<ExprHandle> = map.unresolved_symbols().collect();
            if free.is_empty() {
                complete.push(stack);
                continue;
            }
            for u in free {
                let key: HandleSet = stack.iter().copied().chain([u]).collect();
                if seen.contains(&key) {
                    continue;
                }
                seen.push(key);
                let mut grown = stack.clone();
                grown.push(u);
                next.push(grown);
            }
        }
        debug!(level, complete = complete.len(), pending = next.len(), "stack level");
        pending = next;
        level += 1;
    }

    complete.extend(pending);
    Ok(complete)
}

/// Runs [`assume_solve`] once per assumption set from [`build_stack`] and
/// returns the distinct fully resolved maps, in stack order.
///
/// # Errors
///
/// Returns [`SolveError::NotASymbol`] if a known is not a symbol.
pub fn branching_solve(
    arena: &mut ExprArena,
    equations: &[Equation],
    knowns: &HandleSet,
    config: &SolverConfig,
) -> Result<Vec<SolutionMap>, SolveError> {
    let stacks = build_stack(arena, equations, knowns, config.levels)?;
    let _span = debug_span!("branching_solve", stacks = stacks.len()).entered();

    let mut out: Vec<SolutionMap> = Vec::new();
    for stack in &stacks {
        let map = assume_solve(arena, equations, knowns, stack, config)?;
        if map.is_resolved() && !out.contains(&map) {
            out.push(map);
        }
    }
    info!(solutions = out.len(), "branching solve finished");
    Ok(out)
}
