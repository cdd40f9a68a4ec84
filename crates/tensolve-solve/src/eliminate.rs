//! Ordered elimination.

use rustc_hash::FxHashMap;
use tensolve_core::{ExprArena, ExprError, ExprHandle, ExprNode, HandleSet, Operator};
use tensolve_tensor::{atoms, contains, expand, replace, substitute, substitute_all};
use tracing::{debug, debug_span, trace};

use crate::system::{check_symbols, unknowns};
use crate::{solve, Equation, Resolution, SolutionMap, SolveError, SolverConfig};

/// Outcome of one elimination order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Elimination {
    /// Every unknown was determined.
    Solved(SolutionMap),
    /// No remaining equation determines this symbol.
    Blocked(ExprHandle),
}

impl Elimination {
    /// Converts a blocked elimination into [`SolveError::Unsolvable`].
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::Unsolvable`] naming the blocking symbol.
    pub fn into_result(self, arena: &ExprArena) -> Result<SolutionMap, SolveError> {
        match self {
            Elimination::Solved(map) => Ok(map),
            Elimination::Blocked(symbol) => {
                Err(SolveError::Unsolvable(arena.display(symbol).to_string()))
            }
        }
    }
}

/// Eliminates the unknowns of `equations` one at a time.
///
/// Unknowns are taken in `order` first, then the rest in interning order.
/// Each one is isolated from the first equation that holds it and no
/// symbol eliminated before; the solution is substituted into every
/// equation, and equations that were products or inner products at the
/// start are used as known zeros to simplify the reduced set.
///
/// With `config.multiple_sols` every equation that yields a new solution
/// contributes a candidate; otherwise the solutions are closed by back
/// substitution so that none mentions another unknown.
///
/// # Errors
///
/// - [`SolveError::NotASymbol`], [`SolveError::RepeatedSymbol`] or
///   [`SolveError::KnownInOrder`] for a malformed order or knowns.
/// - [`SolveError::NotInvertible`] if back substitution hits a singular
///   inverse.
/// - [`SolveError::Expr`] for any other failure while rebuilding.
pub fn eliminate(
    arena: &mut ExprArena,
    equations: &[Equation],
    knowns: &HandleSet,
    order: &[ExprHandle],
    config: &SolverConfig,
) -> Result<Elimination, SolveError> {
    check_symbols(arena, order)?;
    let mut seen = HandleSet::new();
    for &sym in order {
        if knowns.contains(&sym) || arena.is_constant(sym) {
            return Err(SolveError::KnownInOrder(arena.display(sym).to_string()));
        }
        if !seen.insert(sym) {
            return Err(SolveError::RepeatedSymbol(arena.display(sym).to_string()));
        }
    }

    let mut queue: Vec<ExprHandle> = order.to_vec();
    queue.extend(
        unknowns(arena, equations, knowns)?
            .into_iter()
            .filter(|u| !seen.contains(u)),
    );

    let _span = debug_span!("eliminate", unknowns = queue.len()).entered();

    let constraints: Vec<ExprHandle> = equations
        .iter()
        .map(|e| e.expr())
        .filter(|&e| is_constraint(arena, e))
        .collect();
    let mut active: Vec<ExprHandle> = equations.iter().map(|e| e.expr()).collect();
    let mut eliminated = HandleSet::new();
    let mut solved: Vec<(ExprHandle, Vec<ExprHandle>)> = Vec::with_capacity(queue.len());

    for &unknown in &queue {
        let found = isolate_from(arena, &active, unknown, &eliminated, config.multiple_sols)?;
        if found.is_empty() {
            debug!(symbol = %arena.display(unknown), "blocked");
            return Ok(Elimination::Blocked(unknown));
        }

        let mut reduced = Vec::new();
        for &value in &found {
            trace!(
                symbol = %arena.display(unknown),
                value = %arena.display(value),
                "eliminating"
            );
            for eq in reduce(arena, &active, unknown, value, &constraints)? {
                if !reduced.contains(&eq) {
                    reduced.push(eq);
                }
            }
        }
        if config.sub_all {
            active = reduced;
        } else {
            for eq in reduced {
                if !active.contains(&eq) {
                    active.push(eq);
                }
            }
        }

        eliminated.insert(unknown);
        solved.push((unknown, found));
    }

    let mut map = SolutionMap::new();
    if config.multiple_sols {
        for (unknown, found) in solved {
            map.insert(unknown, Resolution::Candidates(found));
        }
        return Ok(Elimination::Solved(map));
    }

    // Later solutions never mention earlier unknowns, so closing from the
    // back needs one pass.
    let mut closed: FxHashMap<ExprHandle, ExprHandle> = FxHashMap::default();
    for (unknown, found) in solved.into_iter().rev() {
        let value = substitute_all(arena, found[0], &closed)?;
        let value = expand(arena, value)?;
        closed.insert(unknown, value);
        map.insert(unknown, Resolution::Solved(value));
    }
    Ok(Elimination::Solved(map))
}

/// Products and inner products that are zero in the input.
fn is_constraint(arena: &ExprArena, expr: ExprHandle) -> bool {
    match arena.get(expr) {
        ExprNode::Mul(_) => true,
        ExprNode::Operator { op, .. } => *op == Operator::Inner,
        _ => false,
    }
}

/// Solutions for `unknown` from equations that no longer hold an
/// eliminated symbol.
fn isolate_from(
    arena: &mut ExprArena,
    active: &[ExprHandle],
    unknown: ExprHandle,
    eliminated: &HandleSet,
    multiple: bool,
) -> Result<Vec<ExprHandle>, SolveError> {
    let mut found = Vec::new();
    for &eq in active {
        if !contains(arena, eq, unknown) {
            continue;
        }
        if atoms(arena, eq).iter().any(|a| eliminated.contains(a)) {
            continue;
        }
        match solve(arena, Equation::new(eq), unknown) {
            Ok(value) => {
                let value = expand(arena, value)?;
                if !found.contains(&value) {
                    found.push(value);
                }
                if !multiple {
                    break;
                }
            }
            Err(err) if err.is_local() => {
                trace!(equation = %arena.display(eq), %err, "skipped");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(found)
}

/// Substitutes `unknown = value` into every active equation.
///
/// Equations whose substitution hits a singular inverse are dropped, as are
/// equations that reduce to zero.
fn reduce(
    arena: &mut ExprArena,
    active: &[ExprHandle],
    unknown: ExprHandle,
    value: ExprHandle,
    constraints: &[ExprHandle],
) -> Result<Vec<ExprHandle>, SolveError> {
    let mut out = Vec::with_capacity(active.len());
    for &eq in active {
        let reduced = match substitute(arena, eq, unknown, value) {
            Ok(r) => r,
            Err(ExprError::NotInvertible(_)) => continue,
            Err(err) => return Err(err.into()),
        };
        let reduced = expand(arena, reduced)?;
        let reduced = apply_constraints(arena, reduced, constraints)?;
        if !arena.is_zero(reduced) && !out.contains(&reduced) {
            out.push(reduced);
        }
    }
    Ok(out)
}

/// Replaces every constraint occurring in `eq` by zero.
fn apply_constraints(
    arena: &mut ExprArena,
    eq: ExprHandle,
    constraints: &[ExprHandle],
) -> Result<ExprHandle, SolveError> {
    if constraints.contains(&eq) {
        return Ok(eq);
    }
    let zero = arena.zero();
    let mut current = eq;
    for &c in constraints {
        match replace(arena, current, c, zero) {
            Ok(r) => current = r,
            Err(ExprError::NotInvertible(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }
    if current == eq {
        Ok(eq)
    } else {
        Ok(expand(arena, current)?)
    }
}
