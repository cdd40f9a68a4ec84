//! Property-based tests for the canonical constructors.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use tensolve_core::{ExprArena, ExprHandle};

    use crate::{add, expand, inverse, mul, neg, sub, substitute, transpose};

    struct Pool {
        arena: ExprArena,
        scalars: Vec<ExprHandle>,
        vectors: Vec<ExprHandle>,
        matrices: Vec<ExprHandle>,
    }

    fn pool() -> Pool {
        let mut arena = ExprArena::new();
        let scalars = ["a", "b", "c"]
            .iter()
            .map(|n| arena.symbol(n, 0).unwrap())
            .collect();
        let vectors = ["p", "q", "r"]
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

    // A term c · s · M₁ · … · v: coefficient, scalar index, matrix indices, vector index
    fn term() -> impl Strategy<Value = (i64, usize, Vec<usize>, usize)> {
        (
            prop_oneof![(-5i64..=-1i64), (1i64..=5i64)],
            0usize..3,
            prop::collection::vec(0usize..3, 0..3),
            0usize..3,
        )
    }

    fn build_term(p: &mut Pool, (c, s, ms, v): &(i64, usize, Vec<usize>, usize)) -> ExprHandle {
        let mut factors = vec![p.arena.integer(*c), p.scalars[*s]];
        factors.extend(ms.iter().map(|&m| p.matrices[m]));
        factors.push(p.vectors[*v]);
        mul(&mut p.arena, &factors).unwrap()
    }

    fn build_sum(p: &mut Pool, terms: &[(i64, usize, Vec<usize>, usize)]) -> ExprHandle {
        let hs: Vec<_> = terms.iter().map(|t| build_term(p, t)).collect();
        add(&mut p.arena, &hs).unwrap()
    }

    proptest! {
        #[test]
        fn sum_is_order_independent(terms in prop::collection::vec(term(), 1..6)) {
            let mut p = pool();
            let forward = build_sum(&mut p, &terms);
            let mut reversed = terms.clone();
            reversed.reverse();
            let backward = build_sum(&mut p, &reversed);
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn difference_with_itself_is_zero(terms in prop::collection::vec(term(), 1..6)) {
            let mut p = pool();
            let e = build_sum(&mut p, &terms);
            let d = sub(&mut p.arena, e, e).unwrap();
            prop_assert!(p.arena.is_zero(d));
        }

        #[test]
        fn scalar_factors_commute(order in Just(vec![0usize, 1, 2]).prop_shuffle(), k in 1i64..4) {
            let mut p = pool();
            let two = p.arena.integer(k);
            let sorted = mul(&mut p.arena, &[two, p.scalars[0], p.scalars[1], p.scalars[2]]).unwrap();
            let mut shuffled: Vec<_> = order.iter().map(|&i| p.scalars[i]).collect();
            shuffled.insert(1, two);
            let other = mul(&mut p.arena, &shuffled).unwrap();
            prop_assert_eq!(sorted, other);
        }

        #[test]
        fn transpose_is_an_involution(terms in prop::collection::vec(term(), 1..5)) {
            let mut p = pool();
            let e = build_sum(&mut p, &terms);
            let t = transpose(&mut p.arena, e).unwrap();
            let tt = transpose(&mut p.arena, t).unwrap();
            prop_assert_eq!(tt, e);
        }

        #[test]
        fn matrix_inverse_is_an_involution(ms in prop::collection::vec(0usize..3, 1..4)) {
            let mut p = pool();
            let factors: Vec<_> = ms.iter().map(|&m| p.matrices[m]).collect();
            let chain = mul(&mut p.arena, &factors).unwrap();
            let inv = inverse(&mut p.arena, chain).unwrap();
            let back = inverse(&mut p.arena, inv).unwrap();
            prop_assert_eq!(back, chain);

            let ident = mul(&mut p.arena, &[inv, chain]).unwrap();
            prop_assert!(p.arena.is_one(ident));
        }

        #[test]
        fn expansion_distributes(
            left in prop::collection::vec(term(), 1..4),
            m in 0usize..3,
        ) {
            let mut p = pool();
            let sum = build_sum(&mut p, &left);
            let lhs = mul(&mut p.arena, &[p.matrices[m], sum]).unwrap();
            let lhs = expand(&mut p.arena, lhs).unwrap();

            let mut terms = Vec::new();
            for t in &left {
                let h = build_term(&mut p, t);
                terms.push(mul(&mut p.arena, &[p.matrices[m], h]).unwrap());
            }
            let rhs = add(&mut p.arena, &terms).unwrap();
            let rhs = expand(&mut p.arena, rhs).unwrap();
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn substituting_a_symbol_for_itself_is_identity(
            terms in prop::collection::vec(term(), 1..5),
            v in 0usize..3,
        ) {
            let mut p = pool();
            let e = build_sum(&mut p, &terms);
            let sym = p.vectors[v];
            let same = substitute(&mut p.arena, e, sym, sym).unwrap();
            prop_assert_eq!(same, e);

            let minus = neg(&mut p.arena, sym).unwrap();
            let flipped = substitute(&mut p.arena, e, sym, minus).unwrap();
            let back = substitute(&mut p.arena, flipped, sym, minus).unwrap();
            prop_assert_eq!(expand(&mut p.arena, back).unwrap(), expand(&mut p.arena, e).unwrap());
        }
    }
}
