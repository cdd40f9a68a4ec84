//! Property-based tests for the solving strategies.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use tensolve_core::{ExprArena, ExprHandle, HandleSet};
    use tensolve_tensor::{add, expand, mul, sub, substitute};

    use crate::{forward, search, solve, Equation, Permutations, SolverConfig};

    struct Pool {
        arena: ExprArena,
        scalars: Vec<ExprHandle>,
        vectors: Vec<ExprHandle>,
        matrices: Vec<ExprHandle>,
    }

    fn pool() -> Pool {
        let mut arena = ExprArena::new();
        let scalars = ["a", "b"].iter().map(|n| arena.symbol(n, 0).unwrap()).collect();
        let vectors = ["p", "q", "r", "x0", "x1", "x2", "x3"]
            .iter()
            .map(|n| arena.symbol(n, 1).unwrap())
            .collect();
        let matrices = ["A", "B", "C"]
            .iter()
            .map(|n| arena.symbol(n, 2).unwrap())
            .collect();
        Pool {
            arena,
            scalars,
            vectors,
            matrices,
        }
    }

    proptest! {
        #[test]
        fn isolated_solution_satisfies_the_equation(
            coeff in prop_oneof![(-4i64..=-1i64), (1i64..=4i64)],
            scalar in prop::option::of(0usize..2),
            ms in prop::collection::vec(0usize..3, 0..3),
            rhs in prop::collection::vec((0usize..3, 1usize..3), 1..3),
        ) {
            let mut p = pool();
            let x = p.vectors[3];

            let mut factors = vec![p.arena.integer(coeff)];
            factors.extend(scalar.map(|s| p.scalars[s]));
            factors.extend(ms.iter().map(|&m| p.matrices[m]));
            factors.push(x);
            let lhs = mul(&mut p.arena, &factors).unwrap();

            let mut terms = Vec::new();
            for &(m, v) in &rhs {
                terms.push(mul(&mut p.arena, &[p.matrices[m], p.vectors[v]]).unwrap());
            }
            let rhs = add(&mut p.arena, &terms).unwrap();
            let e = sub(&mut p.arena, lhs, rhs).unwrap();

            let value = solve(&mut p.arena, Equation::new(e), x).unwrap();
            let back = substitute(&mut p.arena, e, x, value).unwrap();
            let back = expand(&mut p.arena, back).unwrap();
            prop_assert!(p.arena.is_zero(back), "residual {}", p.arena.display(back));
        }

        #[test]
        fn forward_and_search_agree_on_chains(ms in prop::collection::vec(0usize..3, 1..4)) {
            // x0 = p, x_i = M_i·x_{i-1}
            let mut p = pool();
            let source = p.vectors[0];
            let xs: Vec<ExprHandle> = p.vectors[3..=3 + ms.len()].to_vec();
            let mut eqs = vec![Equation::new(sub(&mut p.arena, xs[0], source).unwrap())];
            for (i, &m) in ms.iter().enumerate() {
                let step = mul(&mut p.arena, &[p.matrices[m], xs[i]]).unwrap();
                eqs.push(Equation::new(sub(&mut p.arena, xs[i + 1], step).unwrap()));
            }
            let mut knowns: HandleSet = p.matrices.iter().copied().collect();
            knowns.insert(source);

            let progressive = forward(&mut p.arena, &eqs, &knowns, false).unwrap();
            prop_assert!(progressive.is_resolved());

            let found = search(&mut p.arena, &eqs, &knowns, &SolverConfig::default()).unwrap();
            prop_assert_eq!(found.len(), 1);
            prop_assert_eq!(&found[0].map, &progressive);
        }

        #[test]
        fn permutations_are_distinct_and_counted(n in 0usize..6, k in 0usize..6) {
            let mut perms = Permutations::new(n, k);
            let total = perms.total();
            let mut seen = Vec::new();
            while let Some(perm) = perms.advance() {
                let mut sorted = perm.to_vec();
                sorted.sort_unstable();
                sorted.dedup();
                prop_assert_eq!(sorted.len(), perm.len());
                prop_assert!(!seen.contains(&perm.to_vec()));
                seen.push(perm.to_vec());
            }
            prop_assert_eq!(seen.len(), total);
            let mut ordered = seen.clone();
            ordered.sort();
            prop_assert_eq!(ordered, seen);
        }
    }
}
