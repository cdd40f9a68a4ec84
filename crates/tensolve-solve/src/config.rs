//! Solver configuration.

/// How the assumption-escalating solver treats a round of assumptions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AssumptionPolicy {
    /// Stop at the first assumption that solves anything new.
    #[default]
    FirstSuccess,
    /// Try every candidate assumption in the round and keep all gains.
    AllCandidates,
}

/// Configuration shared by the solving strategies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// Length of the orders enumerated by the permutation search, and depth
    /// of the assumption stacks. `None` uses the number of unknowns.
    pub levels: Option<usize>,
    /// Stop the permutation search after this many distinct solutions.
    pub num_sols: Option<usize>,
    /// Collect every solution an equation set offers for each unknown.
    pub multiple_sols: bool,
    /// Replace the active equations by the reduced ones after each
    /// elimination step, instead of appending them.
    pub sub_all: bool,
    /// How many times the assumption solver may substitute every known
    /// solution into every equation when it stalls.
    pub explode_budget: usize,
    /// Assumption round policy.
    pub assumption_policy: AssumptionPolicy,
    /// Emit a progress event every this many orders; `0` picks a tenth of
    /// the total.
    pub progress_interval: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            levels: None,
            num_sols: None,
            multiple_sols: false,
            sub_all: true,
            explode_budget: 1,
            assumption_policy: AssumptionPolicy::FirstSuccess,
            progress_interval: 0,
        }
    }
}

impl SolverConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits order length and assumption depth.
    #[must_use]
    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Stops the search after `n` distinct solutions.
    #[must_use]
    pub fn with_num_sols(mut self, n: usize) -> Self {
        self.num_sols = Some(n);
        self
    }

    /// Enables or disables candidate collection.
    #[must_use]
    pub fn with_multiple_sols(mut self, on: bool) -> Self {
        self.multiple_sols = on;
        self
    }

    /// Chooses between replacing and appending reduced equations.
    #[must_use]
    pub fn with_sub_all(mut self, on: bool) -> Self {
        self.sub_all = on;
        self
    }

    /// Sets the explosion budget.
    #[must_use]
    pub fn with_explode_budget(mut self, budget: usize) -> Self {
        self.explode_budget = budget;
        self
    }

    /// Sets the assumption round policy.
    #[must_use]
    pub fn with_assumption_policy(mut self, policy: AssumptionPolicy) -> Self {
        self.assumption_policy = policy;
        self
    }

    /// Sets the progress interval.
    #[must_use]
    pub fn with_progress_interval(mut self, every: usize) -> Self {
        self.progress_interval = every;
        self
    }

    /// Resolves `levels` against the number of unknowns.
    #[must_use]
    pub fn levels_for(&self, unknowns: usize) -> usize {
        self.levels.map_or(unknowns, |l| l.min(unknowns))
    }

    /// Resolves `progress_interval` against the number of orders to test.
    #[must_use]
    pub fn progress_every(&self, total: usize) -> usize {
        progress_every(self.progress_interval, total)
    }
}

pub(crate) fn progress_every(interval: usize, total: usize) -> usize {
    match interval {
        0 if total > 10 => total / 10,
        0 => 2,
        n => n,
    }
}
