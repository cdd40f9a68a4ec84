//! Lexicographic k-permutations with prefix pruning.

/// Enumerates the ordered selections of `k` distinct indices out of `n`,
/// in lexicographic order.
///
/// Unlike an [`Iterator`], the enumerator can be told that every
/// permutation sharing the current prefix up to some position is
/// uninteresting, see [`Permutations::prune`].
#[derive(Clone, Debug)]
pub struct Permutations {
    stack: Vec<usize>,
    used: Vec<bool>,
    len: usize,
    started: bool,
    done: bool,
}

impl Permutations {
    /// Creates an enumerator over permutations of length `k` drawn from
    /// `0..n`. A `k` above `n` is clamped to `n`.
    #[must_use]
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            stack: Vec::with_capacity(k.min(n)),
            used: vec![false; n],
            len: k.min(n),
            started: false,
            done: false,
        }
    }

    /// Length of each permutation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the permutations are empty sequences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of permutations, `n! / (n - k)!`, saturating at `usize::MAX`.
    #[must_use]
    pub fn total(&self) -> usize {
        let n = self.used.len();
        (n - self.len + 1..=n).fold(1usize, usize::saturating_mul)
    }

    /// Moves to the next permutation and returns it.
    pub fn advance(&mut self) -> Option<&[usize]> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            self.fill();
            return Some(&self.stack);
        }
        while let Some(last) = self.stack.pop() {
            self.used[last] = false;
            if let Some(next) = self.next_unused(last + 1) {
                self.stack.push(next);
                self.used[next] = true;
                self.fill();
                return Some(&self.stack);
            }
        }
        self.done = true;
        None
    }

    /// Skips every remaining permutation whose first `position + 1` entries
    /// equal those of the current one.
    pub fn prune(&mut self, position: usize) {
        while self.stack.len() > position + 1 {
            if let Some(dropped) = self.stack.pop() {
                self.used[dropped] = false;
            }
        }
    }

    /// Restarts the enumeration from the first permutation.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.used.fill(false);
        self.started = false;
        self.done = false;
    }

    fn next_unused(&self, from: usize) -> Option<usize> {
        (from..self.used.len()).find(|&i| !self.used[i])
    }

    fn fill(&mut self) {
        while self.stack.len() < self.len {
            let Some(i) = self.next_unused(0) else {
                return;
            };
            self.stack.push(i);
            self.used[i] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(p: &mut Permutations) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        while let Some(perm) = p.advance() {
            out.push(perm.to_vec());
        }
        out
    }

    #[test]
    fn test_lexicographic_order() {
        let mut p = Permutations::new(3, 2);
        assert_eq!(p.total(), 6);
        assert_eq!(
            collect(&mut p),
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 2],
                vec![2, 0],
                vec![2, 1],
            ]
        );
        assert!(p.advance().is_none());
    }

    #[test]
    fn test_full_length_and_clamping() {
        let mut p = Permutations::new(4, 9);
        assert_eq!(p.len(), 4);
        assert_eq!(p.total(), 24);
        let all = collect(&mut p);
        assert_eq!(all.len(), 24);
        assert_eq!(all[0], vec![0, 1, 2, 3]);
        assert_eq!(all[23], vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_empty_selection() {
        let mut p = Permutations::new(3, 0);
        assert!(p.is_empty());
        assert_eq!(p.total(), 1);
        assert_eq!(collect(&mut p), vec![Vec::<usize>::new()]);

        let mut none = Permutations::new(0, 0);
        assert_eq!(collect(&mut none), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_prune_skips_prefix() {
        let mut p = Permutations::new(3, 3);
        assert_eq!(p.advance(), Some(&[0, 1, 2][..]));
        p.prune(0);
        assert_eq!(p.advance(), Some(&[1, 0, 2][..]));
        p.prune(1);
        assert_eq!(p.advance(), Some(&[1, 2, 0][..]));
        assert_eq!(collect(&mut p), vec![vec![2, 0, 1], vec![2, 1, 0]]);
    }

    #[test]
    fn test_reset() {
        let mut p = Permutations::new(2, 2);
        let first = collect(&mut p);
        p.reset();
        assert_eq!(collect(&mut p), first);
    }

    #[test]
    fn test_total_saturates() {
        assert_eq!(Permutations::new(40, 40).total(), usize::MAX);
    }
}
