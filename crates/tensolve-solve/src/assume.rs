//! Assumption-escalating solver.

use rustc_hash::FxHashMap;
use tensolve_core::{ExprArena, ExprError, ExprHandle, HandleSet};
use tensolve_tensor::{contains, expand, substitute, substitute_all};
use tracing::{debug, debug_span, info};

use crate::system::{check_symbols, unknowns};
use crate::{forward, AssumptionPolicy, Equation, Resolution, SolutionMap, SolveError, SolverConfig};

/// Runs [`forward`] repeatedly, assuming one unknown known at a time
/// whenever it stalls.
///
/// Each round:
///
/// 1. solves the working equations with the given knowns;
/// 2. if nothing new came out, retries the input equations once per
///    candidate assumption, `priority` entries first and then the other
///    unknowns in interning order;
/// 3. if still nothing, and the explosion budget allows, substitutes every
///    solution into every working equation.
///
/// New solutions are substituted into the working equations, which keep
/// their old members, so a symbol solved in one round drops out of the
/// equations the next round solves. The result may be partial. Solutions
/// are not closed: one may mention another solved symbol.
///
/// # Errors
///
/// Returns [`SolveError::NotASymbol`] for a malformed known or priority
/// entry. Isolation failures never surface.
pub fn assume_solve(
    arena: &mut ExprArena,
    equations: &[Equation],
    knowns: &HandleSet,
    priority: &[ExprHandle],
    config: &SolverConfig,
) -> Result<SolutionMap, SolveError> {
    check_symbols(arena, priority)?;
    let all_unknowns = unknowns(arena, equations, knowns)?;
    let _span = debug_span!("assume_solve", unknowns = all_unknowns.len()).entered();

    let mut result = SolutionMap::unresolved(all_unknowns.iter().copied());
    let mut working: Vec<ExprHandle> = Vec::with_capacity(equations.len());
    for eq in equations {
        let e = expand(arena, eq.expr())?;
        if !working.contains(&e) {
            working.push(e);
        }
    }
    let mut budget = config.explode_budget;

    while result.unresolved_symbols().next().is_some() {
        let found = forward_or_stall(arena, &wrap(&working), knowns)?;
        let mut gained = merge(&mut result, &found);

        if gained.is_empty() {
            gained = assume(arena, equations, knowns, &mut result, priority, config)?;
        }

        if gained.is_empty() {
            if budget == 0 {
                debug!("stalled");
                break;
            }
            budget -= 1;
            let grown = explode(arena, &mut working, &result)?;
            debug!(equations = grown, "exploded");
            continue;
        }

        add_new_equations(arena, &mut working, &result, &gained)?;
    }
    Ok(result)
}

fn wrap(exprs: &[ExprHandle]) -> Vec<Equation> {
    exprs.iter().copied().map(Equation::new).collect()
}

/// [`forward`], with a local failure counted as a round that solved nothing.
fn forward_or_stall(
    arena: &mut ExprArena,
    equations: &[Equation],
    knowns: &HandleSet,
) -> Result<SolutionMap, SolveError> {
    match forward(arena, equations, knowns, false) {
        Ok(map) => Ok(map),
        Err(err) if err.is_local() => {
            debug!(%err, "forward failed");
            Ok(SolutionMap::new())
        }
        Err(err) => Err(err),
    }
}

/// Copies the solved entries of `found` that `result` lacks.
fn merge(result: &mut SolutionMap, found: &SolutionMap) -> Vec<ExprHandle> {
    let mut gained = Vec::new();
    for (symbol, resolution) in found.iter() {
        let Some(value) = resolution.solved() else {
            continue;
        };
        if result.get(symbol).is_some_and(Resolution::is_resolved) {
            continue;
        }
        result.insert(symbol, Resolution::Solved(value));
        gained.push(symbol);
    }
    gained
}

/// One round of single-symbol assumptions over the input equations.
fn assume(
    arena: &mut ExprArena,
    equations: &[Equation],
    knowns: &HandleSet,
    result: &mut SolutionMap,
    priority: &[ExprHandle],
    config: &SolverConfig,
) -> Result<Vec<ExprHandle>, SolveError> {
    let mut candidates: Vec<ExprHandle> = priority.to_vec();
    for u in result.unresolved_symbols() {
        if !candidates.contains(&u) {
            candidates.push(u);
        }
    }

    let mut gained = Vec::new();
    for candidate in candidates {
        if result.get(candidate).is_some_and(Resolution::is_resolved) {
            continue;
        }
        let mut trial = knowns.clone();
        trial.insert(candidate);
        let found = forward_or_stall(arena, equations, &trial)?;
        let new = merge(result, &found);
        if !new.is_empty() {
            info!(
                assumed = %arena.display(candidate),
                solved = new.len(),
                "assumption made progress"
            );
            gained.extend(new);
            if config.assumption_policy == AssumptionPolicy::FirstSuccess {
                break;
            }
        }
    }
    Ok(gained)
}

/// Substitutes every solution into every working equation and appends the
/// new non-zero results. Returns how many were added.
fn explode(
    arena: &mut ExprArena,
    working: &mut Vec<ExprHandle>,
    result: &SolutionMap,
) -> Result<usize, SolveError> {
    let values: FxHashMap<ExprHandle, ExprHandle> = result
        .iter()
        .filter_map(|(k, r)| r.solved().map(|v| (k, v)))
        .collect();
    if values.is_empty() {
        return Ok(0);
    }
    let mut added = 0;
    for i in 0..working.len() {
        let e = match substitute_all(arena, working[i], &values) {
            Ok(e) => e,
            Err(ExprError::NotInvertible(_)) => continue,
            Err(err) => return Err(err.into()),
        };
        let e = expand(arena, e)?;
        if !arena.is_zero(e) && !working.contains(&e) {
            working.push(e);
            added += 1;
        }
    }
    Ok(added)
}

/// Substitutes each newly solved symbol into the working equations that
/// hold it, appending the results.
fn add_new_equations(
    arena: &mut ExprArena,
    working: &mut Vec<ExprHandle>,
    result: &SolutionMap,
    gained: &[ExprHandle],
) -> Result<(), SolveError> {
    for &symbol in gained {
        let Some(value) = result.solution(symbol) else {
            continue;
        };
        let holders: Vec<ExprHandle> = working
            .iter()
            .copied()
            .filter(|&e| contains(arena, e, symbol))
            .collect();
        for eq in holders {
            let e = match substitute(arena, eq, symbol, value) {
                Ok(e) => e,
                Err(ExprError::NotInvertible(_)) => continue,
                Err(err) => return Err(err.into()),
            };
            let e = expand(arena, e)?;
            if !arena.is_zero(e) && !working.contains(&e) {
                working.push(e);
            }
        }
    }
    Ok(())
}
