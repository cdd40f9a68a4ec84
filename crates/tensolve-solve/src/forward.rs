//! Progressive solving: isolate whatever is currently solvable.

use rustc_hash::FxHashMap;
use tensolve_core::{ExprArena, ExprHandle, HandleSet};
use tensolve_tensor::{atoms, expand, substitute_all};
use tracing::{debug, debug_span, trace};

use crate::system::unknowns;
use crate::{solve, Equation, Resolution, SolutionMap, SolveError};

/// Solves the equations that hold exactly one unknown, repeating until a
/// pass finishes no equation.
///
/// Without `branching`, a solved unknown counts as known for the rest of the
/// same pass, and each solution has the solutions found before it
/// substituted in. With `branching`, every equation of a pass that isolates
/// the same unknown contributes a candidate, and solved unknowns are
/// retired only once the pass ends.
///
/// Unknowns no equation determined stay [`Resolution::Unresolved`]. An
/// equation whose solution becomes singular once earlier solutions are
/// substituted is skipped like any other failed isolation.
///
/// # Errors
///
/// Returns [`SolveError::NotASymbol`] if a known is not a symbol, and
/// propagates failures other than the local isolation errors.
pub fn forward(
    arena: &mut ExprArena,
    equations: &[Equation],
    knowns: &HandleSet,
    branching: bool,
) -> Result<SolutionMap, SolveError> {
    let mut remaining = unknowns(arena, equations, knowns)?;
    let mut map = SolutionMap::unresolved(remaining.iter().copied());
    let _span = debug_span!("forward", unknowns = remaining.len(), branching).entered();

    let mut active: Vec<ExprHandle> = equations.iter().map(|e| e.expr()).collect();
    let mut closed: FxHashMap<ExprHandle, ExprHandle> = FxHashMap::default();

    while !remaining.is_empty() {
        let mut finished = vec![false; active.len()];
        let mut retired = Vec::new();

        for (i, &eq) in active.iter().enumerate() {
            let unknown = {
                let mut free = atoms(arena, eq).into_iter().filter(|a| remaining.contains(a));
                match (free.next(), free.next()) {
                    (None, _) => {
                        finished[i] = true;
                        continue;
                    }
                    (Some(u), None) => u,
                    _ => continue,
                }
            };

            let value = match settle(arena, eq, unknown, &closed, branching) {
                Ok(v) => v,
                Err(err) if err.is_local() => {
                    trace!(equation = %arena.display(eq), %err, "skipped");
                    continue;
                }
                Err(err) => return Err(err),
            };
            finished[i] = true;

            if branching {
                let known = map.get(unknown).is_some_and(|r| r.values().contains(&value));
                if !known {
                    map.push_candidate(unknown, value);
                }
                retired.push(unknown);
            } else {
                debug!(
                    symbol = %arena.display(unknown),
                    value = %arena.display(value),
                    "solved"
                );
                map.insert(unknown, Resolution::Solved(value));
                closed.insert(unknown, value);
                remaining.remove(&unknown);
            }
        }

        for u in retired {
            remaining.remove(&u);
        }
        if !finished.iter().any(|&f| f) {
            break;
        }
        let mut flags = finished.into_iter();
        active.retain(|_| !flags.next().unwrap_or(false));
    }
    Ok(map)
}

/// Isolates `unknown` from `eq` and brings the value to expanded form,
/// with the closed solutions substituted unless branching.
fn settle(
    arena: &mut ExprArena,
    eq: ExprHandle,
    unknown: ExprHandle,
    closed: &FxHashMap<ExprHandle, ExprHandle>,
    branching: bool,
) -> Result<ExprHandle, SolveError> {
    let value = solve(arena, Equation::new(eq), unknown)?;
    let value = if branching {
        value
    } else {
        substitute_all(arena, value, closed)?
    };
    Ok(expand(arena, value)?)
}
