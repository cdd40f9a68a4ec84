//! Permutation search over elimination orders.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tensolve_core::{ExprArena, ExprHandle, HandleSet};
use tensolve_tensor::atoms_of_all;
use tracing::{debug, info, info_span};

use crate::config::progress_every;
use crate::permute::Permutations;
use crate::system::unknowns;
use crate::{eliminate, Elimination, Equation, SolutionMap, SolveError, SolverConfig};

/// A solution found by [`search`], with the order that produced it first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchSolution {
    /// The solutions.
    pub map: SolutionMap,
    /// Elimination order prefix that produced them.
    pub order: Vec<ExprHandle>,
}

/// Observer of a running [`search`].
pub trait Progress {
    /// Called after each order, with the number of orders tried so far, the
    /// number there are, and the number of distinct solutions found.
    fn order_tested(&mut self, tested: usize, total: usize, found: usize) {
        let _ = (tested, total, found);
    }

    /// Polled before each order; returning true stops the search, which
    /// then returns what it has found.
    fn should_stop(&self) -> bool {
        false
    }
}

/// Ignores progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Reports progress as `tracing` events at a fixed stride.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress {
    interval: usize,
}

impl LogProgress {
    /// Uses the interval of `config`.
    #[must_use]
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            interval: config.progress_interval,
        }
    }
}

impl Progress for LogProgress {
    fn order_tested(&mut self, tested: usize, total: usize, found: usize) {
        if tested % progress_every(self.interval, total) == 0 {
            info!(tested, total, found, "search progress");
        }
    }
}

/// A shareable cancellation switch.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a flag that is not set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Progress for CancelFlag {
    fn should_stop(&self) -> bool {
        self.is_cancelled()
    }
}

/// [`search_with`] without a progress observer.
///
/// # Errors
///
/// See [`search_with`].
pub fn search(
    arena: &mut ExprArena,
    equations: &[Equation],
    knowns: &HandleSet,
    config: &SolverConfig,
) -> Result<Vec<SearchSolution>, SolveError> {
    search_with(arena, equations, knowns, config, &mut NoProgress)
}

/// Runs [`eliminate`] over every ordering of `config.levels` unknowns.
///
/// Orders are enumerated lexicographically over the unknowns in interning
/// order. When an order is blocked on a symbol inside its prefix, every
/// order sharing the prefix up to that symbol is skipped. Solutions equal
/// to an earlier one are dropped; the rest are returned smallest first,
/// ties kept in discovery order. The search stops after
/// `config.num_sols` solutions, or when `progress` asks it to.
///
/// # Errors
///
/// Returns [`SolveError::NotASymbol`] if a known is not a symbol, or a
/// failure other than the local isolation errors.
pub fn search_with(
    arena: &mut ExprArena,
    equations: &[Equation],
    knowns: &HandleSet,
    config: &SolverConfig,
    progress: &mut dyn Progress,
) -> Result<Vec<SearchSolution>, SolveError> {
    let symbols: Vec<ExprHandle> = unknowns(arena, equations, knowns)?.into_iter().collect();
    let mut perms = Permutations::new(symbols.len(), config.levels_for(symbols.len()));
    let total = perms.total();
    let _span = info_span!("search", unknowns = symbols.len(), total).entered();

    let mut found: Vec<SearchSolution> = Vec::new();
    let mut tested = 0;
    loop {
        if progress.should_stop() {
            info!(tested, found = found.len(), "search cancelled");
            break;
        }
        let Some(indices) = perms.advance() else {
            break;
        };
        let order: Vec<ExprHandle> = indices.iter().map(|&i| symbols[i]).collect();
        tested += 1;

        match eliminate(arena, equations, knowns, &order, config) {
            Ok(Elimination::Solved(map)) => {
                if found.iter().all(|s| s.map != map) {
                    debug!(solution = %map.display(arena), "accepted");
                    found.push(SearchSolution { map, order });
                }
            }
            Ok(Elimination::Blocked(symbol)) => {
                if let Some(position) = order.iter().position(|&o| o == symbol) {
                    perms.prune(position);
                }
            }
            Err(err) if err.is_local() => debug!(%err, "order failed"),
            Err(err) => return Err(err),
        }

        progress.order_tested(tested, total, found.len());
        if config.num_sols.is_some_and(|n| found.len() >= n) {
            break;
        }
    }

    found.sort_by_cached_key(|s| s.map.size(arena));
    Ok(found)
}

/// Solves for the symbols that `after` introduces, treating every symbol of
/// `before` and `extra_knowns` as known.
///
/// All equations are searched together, `after` first, and the best
/// `config.num_sols` solutions (one by default) are returned.
///
/// # Errors
///
/// See [`search_with`].
pub fn solve_update(
    arena: &mut ExprArena,
    before: &[Equation],
    after: &[Equation],
    extra_knowns: &HandleSet,
    config: &SolverConfig,
) -> Result<Vec<SearchSolution>, SolveError> {
    let mut knowns = atoms_of_all(arena, before.iter().map(|e| e.expr()));
    knowns.extend(extra_knowns.iter().copied());
    let equations: Vec<Equation> = after.iter().chain(before).copied().collect();

    let mut all = config.clone();
    all.num_sols = None;
    let mut solutions = search(arena, &equations, &knowns, &all)?;
    solutions.truncate(config.num_sols.unwrap_or(1));
    Ok(solutions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensolve_tensor::{add, mul, sub};

    struct Chain {
        arena: ExprArena,
        q: ExprHandle,
        s: ExprHandle,
        eqs: Vec<Equation>,
        knowns: HandleSet,
    }

    // s + q = 0, delta·r - q = 0 with delta and r known
    fn chain() -> Chain {
        let mut arena = ExprArena::new();
        let q = arena.symbol("q", 1).unwrap();
        let r = arena.symbol("r", 1).unwrap();
        let s = arena.symbol("s", 1).unwrap();
        let delta = arena.symbol("delta", 0).unwrap();
        let e1 = add(&mut arena, &[s, q]).unwrap();
        let dr = mul(&mut arena, &[delta, r]).unwrap();
        let e2 = sub(&mut arena, dr, q).unwrap();
        Chain {
            arena,
            q,
            s,
            eqs: vec![Equation::new(e1), Equation::new(e2)],
            knowns: [delta, r].into_iter().collect(),
        }
    }

    #[test]
    fn test_orders_agree() {
        let Chain {
            mut arena,
            q,
            s,
            eqs,
            knowns,
        } = chain();
        let found = search(&mut arena, &eqs, &knowns, &SolverConfig::default()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].order, vec![q, s]);
        assert!(found[0].map.is_resolved());
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(usize, usize, usize)>,
        stop_after: Option<usize>,
    }

    impl Progress for Recorder {
        fn order_tested(&mut self, tested: usize, total: usize, found: usize) {
            self.calls.push((tested, total, found));
        }

        fn should_stop(&self) -> bool {
            self.stop_after.is_some_and(|n| self.calls.len() >= n)
        }
    }

    #[test]
    fn test_progress_and_cancellation() {
        let Chain {
            mut arena,
            eqs,
            knowns,
            ..
        } = chain();
        let mut all = Recorder::default();
        search_with(&mut arena, &eqs, &knowns, &SolverConfig::default(), &mut all).unwrap();
        assert_eq!(all.calls, vec![(1, 2, 1), (2, 2, 1)]);

        let mut one = Recorder {
            stop_after: Some(1),
            ..Recorder::default()
        };
        let found = search_with(&mut arena, &eqs, &knowns, &SolverConfig::default(), &mut one).unwrap();
        assert_eq!(one.calls.len(), 1);
        assert_eq!(found.len(), 1);

        let flag = CancelFlag::new();
        flag.cancel();
        let mut observer = flag.clone();
        let found = search_with(&mut arena, &eqs, &knowns, &SolverConfig::default(), &mut observer).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_num_sols_and_update() {
        let Chain {
            mut arena,
            q,
            eqs,
            knowns,
            ..
        } = chain();
        let config = SolverConfig::default().with_num_sols(1);
        let found = search(&mut arena, &eqs, &knowns, &config).unwrap();
        assert_eq!(found.len(), 1);

        // u - q = 0 added to the solved system: q becomes known
        let u = arena.symbol("u", 1).unwrap();
        let e3 = sub(&mut arena, u, q).unwrap();
        let updated = solve_update(
            &mut arena,
            &eqs,
            &[Equation::new(e3)],
            &HandleSet::new(),
            &SolverConfig::default(),
        )
        .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].map.solution(u), Some(q));
        assert_eq!(updated[0].map.len(), 1);
    }

    #[test]
    fn test_log_progress_stride() {
        let config = SolverConfig::default().with_progress_interval(3);
        let mut log = LogProgress::new(&config);
        for tested in 1..=7 {
            log.order_tested(tested, 100, 0);
        }
        assert!(!log.should_stop());
    }
}
