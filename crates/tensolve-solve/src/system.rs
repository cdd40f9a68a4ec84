//! Equations, symbol classification and solution maps.

use std::fmt;

use tensolve_core::{ExprArena, ExprHandle, HandleMap, HandleSet, Shape};
use tensolve_tensor::{atoms_of_all, cse, node_count, CseResult};

use crate::SolveError;

/// An expression read as `expr = 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Equation(ExprHandle);

impl Equation {
    /// Wraps an expression.
    #[must_use]
    pub const fn new(expr: ExprHandle) -> Self {
        Self(expr)
    }

    /// The expression that equals zero.
    #[must_use]
    pub const fn expr(self) -> ExprHandle {
        self.0
    }

    /// Shape of the equation.
    #[must_use]
    pub fn shape(self, arena: &ExprArena) -> Shape {
        arena.shape(self.0)
    }
}

impl From<ExprHandle> for Equation {
    fn from(expr: ExprHandle) -> Self {
        Self(expr)
    }
}

/// Wraps a list of expressions as equations.
#[must_use]
pub fn equations(exprs: &[ExprHandle]) -> Vec<Equation> {
    exprs.iter().copied().map(Equation::new).collect()
}

/// Checks that every known is a symbol.
///
/// # Errors
///
/// Returns [`SolveError::NotASymbol`] for the first offending entry.
pub fn check_symbols<'a>(
    arena: &ExprArena,
    symbols: impl IntoIterator<Item = &'a ExprHandle>,
) -> Result<(), SolveError> {
    for &h in symbols {
        if !arena.is_symbol(h) {
            return Err(SolveError::NotASymbol(arena.display(h).to_string()));
        }
    }
    Ok(())
}

/// Returns the unknowns of `equations`: every symbol that is neither known
/// nor a fixed-value constant, in interning order.
///
/// # Errors
///
/// Returns [`SolveError::NotASymbol`] if a known is not a symbol.
pub fn unknowns(
    arena: &ExprArena,
    equations: &[Equation],
    knowns: &HandleSet,
) -> Result<HandleSet, SolveError> {
    check_symbols(arena, knowns)?;
    Ok(atoms_of_all(arena, equations.iter().map(|e| e.expr()))
        .into_iter()
        .filter(|h| !knowns.contains(h) && !arena.is_constant(*h))
        .collect())
}

/// What is known about one unknown.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// No equation determined it.
    Unresolved,
    /// A single solution.
    Solved(ExprHandle),
    /// Every solution found, in discovery order.
    Candidates(Vec<ExprHandle>),
}

impl Resolution {
    /// Returns true unless unresolved or an empty candidate list.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        match self {
            Resolution::Unresolved => false,
            Resolution::Solved(_) => true,
            Resolution::Candidates(c) => !c.is_empty(),
        }
    }

    /// Returns the single solution, if there is one.
    #[must_use]
    pub fn solved(&self) -> Option<ExprHandle> {
        match self {
            Resolution::Solved(h) => Some(*h),
            _ => None,
        }
    }

    /// All expressions held by this entry.
    #[must_use]
    pub fn values(&self) -> &[ExprHandle] {
        match self {
            Resolution::Unresolved => &[],
            Resolution::Solved(h) => std::slice::from_ref(h),
            Resolution::Candidates(c) => c,
        }
    }
}

/// Unknown → solution map.
///
/// Keys iterate in interning order, so two maps compare equal exactly when
/// they hold the same solutions, whatever order produced them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SolutionMap {
    entries: HandleMap<Resolution>,
}

impl SolutionMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map with every symbol unresolved.
    #[must_use]
    pub fn unresolved(symbols: impl IntoIterator<Item = ExprHandle>) -> Self {
        Self {
            entries: symbols
                .into_iter()
                .map(|s| (s, Resolution::Unresolved))
                .collect(),
        }
    }

    /// Sets the entry for `symbol`.
    pub fn insert(&mut self, symbol: ExprHandle, resolution: Resolution) {
        self.entries.insert(symbol, resolution);
    }

    /// Appends a candidate solution for `symbol`.
    pub fn push_candidate(&mut self, symbol: ExprHandle, value: ExprHandle) {
        let entry = self
            .entries
            .entry(symbol)
            .or_insert(Resolution::Candidates(Vec::new()));
        match entry {
            Resolution::Candidates(values) => values.push(value),
            other => *other = Resolution::Candidates(vec![value]),
        }
    }

    /// Gets the entry for `symbol`.
    #[must_use]
    pub fn get(&self, symbol: ExprHandle) -> Option<&Resolution> {
        self.entries.get(&symbol)
    }

    /// Gets the single solution for `symbol`.
    #[must_use]
    pub fn solution(&self, symbol: ExprHandle) -> Option<ExprHandle> {
        self.get(symbol).and_then(Resolution::solved)
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (ExprHandle, &Resolution)> {
        self.entries.iter().map(|(&k, v)| (k, v))
    }

    /// Symbols with at least one solution.
    pub fn solved_symbols(&self) -> impl Iterator<Item = ExprHandle> + '_ {
        self.iter().filter(|(_, r)| r.is_resolved()).map(|(k, _)| k)
    }

    /// Symbols without a solution.
    pub fn unresolved_symbols(&self) -> impl Iterator<Item = ExprHandle> + '_ {
        self.iter().filter(|(_, r)| !r.is_resolved()).map(|(k, _)| k)
    }

    /// Returns true if every entry is resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.entries.values().all(Resolution::is_resolved)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total node count of every solution expression.
    #[must_use]
    pub fn size(&self, arena: &ExprArena) -> usize {
        self.entries
            .values()
            .flat_map(Resolution::values)
            .map(|&v| node_count(arena, v))
            .sum()
    }

    /// Pulls subexpressions shared between solutions into temporaries named
    /// `{prefix}{n}`.
    ///
    /// Returns the temporaries in dependency order and the rewritten map.
    ///
    /// # Errors
    ///
    /// Propagates errors from rebuilding the expressions.
    pub fn cse(
        &self,
        arena: &mut ExprArena,
        prefix: &str,
    ) -> Result<(Vec<(ExprHandle, ExprHandle)>, SolutionMap), SolveError> {
        let slots: Vec<(ExprHandle, usize)> = self
            .iter()
            .flat_map(|(k, r)| r.values().iter().enumerate().map(move |(i, _)| (k, i)))
            .collect();
        let exprs: Vec<ExprHandle> = self
            .entries
            .values()
            .flat_map(|r| r.values().iter().copied())
            .collect();

        let CseResult {
            replacements,
            exprs: rewritten,
        } = cse(arena, &exprs, prefix)?;

        let mut out = self.clone();
        for ((symbol, i), value) in slots.into_iter().zip(rewritten) {
            if let Some(entry) = out.entries.get_mut(&symbol) {
                match entry {
                    Resolution::Solved(h) => *h = value,
                    Resolution::Candidates(c) => c[i] = value,
                    Resolution::Unresolved => {}
                }
            }
        }
        Ok((replacements, out))
    }

    /// Renders the map with symbol names.
    #[must_use]
    pub fn display<'a>(&'a self, arena: &'a ExprArena) -> SolutionDisplay<'a> {
        SolutionDisplay { map: self, arena }
    }
}

/// Borrowing wrapper that formats a [`SolutionMap`].
pub struct SolutionDisplay<'a> {
    map: &'a SolutionMap,
    arena: &'a ExprArena,
}

impl fmt::Display for SolutionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, r)) in self.map.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: ", self.arena.display(k))?;
            match r {
                Resolution::Unresolved => write!(f, "?")?,
                Resolution::Solved(v) => write!(f, "{}", self.arena.display(*v))?,
                Resolution::Candidates(vs) => {
                    write!(f, "[")?;
                    for (j, v) in vs.iter().enumerate() {
                        if j > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", self.arena.display(*v))?;
                    }
                    write!(f, "]")?;
                }
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashu::integer::IBig;
    use dashu::rational::RBig;
    use tensolve_tensor::{inverse, mul, transpose};

    #[test]
    fn test_unknowns_skip_knowns_and_constants() {
        let mut arena = ExprArena::new();
        let q = arena.symbol("q", 1).unwrap();
        let r = arena.symbol("r", 1).unwrap();
        let delta = arena.symbol("delta", 0).unwrap();
        let two = arena.integer(2);
        let k = arena.constant("k", 0, RBig::from(IBig::from(2))).unwrap();
        let dr = mul(&mut arena, &[k, delta, two, r]).unwrap();
        let e = tensolve_tensor::sub(&mut arena, dr, q).unwrap();

        let knowns: HandleSet = [delta].into_iter().collect();
        let found = unknowns(&arena, &[Equation::new(e)], &knowns).unwrap();
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![q, r]);

        let bad: HandleSet = [two].into_iter().collect();
        assert!(matches!(
            unknowns(&arena, &[Equation::new(e)], &bad),
            Err(SolveError::NotASymbol(_))
        ));
    }

    #[test]
    fn test_map_equality_and_resolution() {
        let mut arena = ExprArena::new();
        let q = arena.symbol("q", 1).unwrap();
        let s = arena.symbol("s", 1).unwrap();

        let mut a = SolutionMap::unresolved([q, s]);
        assert!(!a.is_resolved());
        a.insert(q, Resolution::Solved(s));
        let mut b = SolutionMap::unresolved([s, q]);
        b.insert(q, Resolution::Solved(s));
        assert_eq!(a, b);
        assert_eq!(a.solved_symbols().collect::<Vec<_>>(), vec![q]);
        assert_eq!(a.unresolved_symbols().collect::<Vec<_>>(), vec![s]);

        let mut c = SolutionMap::new();
        c.push_candidate(q, s);
        c.push_candidate(q, q);
        assert_eq!(c.get(q).map(|r| r.values().len()), Some(2));
        assert!(c.is_resolved());
    }

    #[test]
    fn test_cse_over_solutions() {
        let mut arena = ExprArena::new();
        let q = arena.symbol("q", 1).unwrap();
        let r = arena.symbol("r", 1).unwrap();
        let s = arena.symbol("s", 1).unwrap();
        let delta = arena.symbol("delta", 0).unwrap();
        let st = transpose(&mut arena, s).unwrap();
        let dot = mul(&mut arena, &[st, q]).unwrap();
        let inv = inverse(&mut arena, dot).unwrap();
        let v1 = mul(&mut arena, &[inv, r]).unwrap();
        let v2 = mul(&mut arena, &[inv, s]).unwrap();

        let mut map = SolutionMap::new();
        map.insert(q, Resolution::Solved(v1));
        map.insert(delta, Resolution::Solved(v2));
        let (temps, rewritten) = map.cse(&mut arena, "x").unwrap();
        assert!(!temps.is_empty());
        assert_eq!(rewritten.len(), 2);
        assert_ne!(rewritten.solution(q), Some(v1));
        assert_eq!(map.display(&arena).to_string().matches(':').count(), 2);
    }
}
