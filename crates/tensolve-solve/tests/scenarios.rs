use tensolve_core::{ExprArena, ExprHandle, HandleSet};
use tensolve_solve::{
    assume_solve, branching_solve, eliminate, forward, search, search_with, solve_update,
    Elimination, Equation, Permutations, Progress, Resolution, SolverConfig,
};
use tensolve_tensor::{add, expand, inverse, mul, neg, sub, transpose};

struct Symbols {
    arena: ExprArena,
    q: ExprHandle,
    r: ExprHandle,
    s: ExprHandle,
    delta: ExprHandle,
}

fn symbols() -> Symbols {
    let mut arena = ExprArena::new();
    let q = arena.symbol("q", 1).expect("q");
    let r = arena.symbol("r", 1).expect("r");
    let s = arena.symbol("s", 1).expect("s");
    let delta = arena.symbol("delta", 0).expect("delta");
    Symbols {
        arena,
        q,
        r,
        s,
        delta,
    }
}

#[test]
fn forward_closes_a_triangular_system() {
    let Symbols {
        mut arena,
        q,
        r,
        s,
        delta,
    } = symbols();
    // s + q = 0, delta·r - q = 0
    let e1 = add(&mut arena, &[s, q]).expect("e1");
    let dr = mul(&mut arena, &[delta, r]).expect("dr");
    let e2 = sub(&mut arena, dr, q).expect("e2");
    let eqs = [Equation::new(e1), Equation::new(e2)];
    let knowns: HandleSet = [delta, r].into_iter().collect();

    let map = forward(&mut arena, &eqs, &knowns, false).expect("forward");
    let ndr = neg(&mut arena, dr).expect("-dr");
    assert_eq!(map.solution(q), Some(dr));
    assert_eq!(map.solution(s), Some(ndr));
    assert_eq!(map.len(), 2);

    let found = search(&mut arena, &eqs, &knowns, &SolverConfig::default()).expect("search");
    assert!(found.iter().any(|f| f.map == map));
}

#[test]
fn assumptions_unlock_a_stalled_system() {
    let Symbols {
        mut arena,
        q,
        r,
        s,
        delta,
    } = symbols();
    // r - s - delta·q = 0, T(s)·r = 0
    let dq = mul(&mut arena, &[delta, q]).expect("dq");
    let rs = sub(&mut arena, r, s).expect("r - s");
    let e1 = sub(&mut arena, rs, dq).expect("e1");
    let st = transpose(&mut arena, s).expect("T(s)");
    let e2 = mul(&mut arena, &[st, r]).expect("e2");
    let eqs = [Equation::new(e1), Equation::new(e2)];
    let knowns: HandleSet = [s, q].into_iter().collect();

    // nothing holds a single unknown that can be isolated
    let stalled = forward(&mut arena, &eqs, &knowns, false).expect("forward");
    assert!(!stalled.is_resolved());

    let map = assume_solve(&mut arena, &eqs, &knowns, &[], &SolverConfig::default())
        .expect("assume_solve");
    let expected_r = add(&mut arena, &[dq, s]).expect("r");
    assert_eq!(map.solution(r), Some(expected_r));

    let ss = mul(&mut arena, &[st, s]).expect("T(s)·s");
    let sq = mul(&mut arena, &[st, q]).expect("T(s)·q");
    let nss = neg(&mut arena, ss).expect("-T(s)·s");
    let inv = inverse(&mut arena, sq).expect("inv");
    let expected_delta = mul(&mut arena, &[nss, inv]).expect("delta");
    assert_eq!(map.solution(delta), Some(expected_delta));
    assert!(map.is_resolved());
}

#[test]
fn branching_solve_returns_distinct_complete_maps() {
    let Symbols {
        mut arena,
        q,
        r,
        s,
        delta,
    } = symbols();
    let dq = mul(&mut arena, &[delta, q]).expect("dq");
    let rs = sub(&mut arena, r, s).expect("r - s");
    let e1 = sub(&mut arena, rs, dq).expect("e1");
    let st = transpose(&mut arena, s).expect("T(s)");
    let e2 = mul(&mut arena, &[st, r]).expect("e2");
    let eqs = [Equation::new(e1), Equation::new(e2)];
    let knowns: HandleSet = [s, q].into_iter().collect();

    let maps = branching_solve(&mut arena, &eqs, &knowns, &SolverConfig::default())
        .expect("branching_solve");
    assert!(!maps.is_empty());
    for (i, map) in maps.iter().enumerate() {
        assert!(map
            .iter()
            .all(|(_, entry)| !matches!(entry, Resolution::Unresolved)));
        assert!(maps[i + 1..].iter().all(|other| other != map));
    }
}

/// A system of four vector unknowns with 24 elimination orders.
fn ladder(arena: &mut ExprArena) -> (Vec<Equation>, HandleSet) {
    let p = arena.symbol("p", 1).expect("p");
    let a = arena.symbol("A", 2).expect("A");
    let b = arena.symbol("B", 2).expect("B");
    let xs: Vec<ExprHandle> = (0..4)
        .map(|i| arena.symbol(&format!("x{i}"), 1).expect("x"))
        .collect();

    let mut eqs = Vec::new();
    // x0 + x1 = p, x1 = A·p, x2 = B·x0, x3 + x2 = x1
    let e = add(arena, &[xs[0], xs[1]]).expect("sum");
    eqs.push(sub(arena, e, p).expect("e0"));
    let e = mul(arena, &[a, p]).expect("A·p");
    eqs.push(sub(arena, xs[1], e).expect("e1"));
    let e = mul(arena, &[b, xs[0]]).expect("B·x0");
    eqs.push(sub(arena, xs[2], e).expect("e2"));
    let e = add(arena, &[xs[3], xs[2]]).expect("sum");
    eqs.push(sub(arena, e, xs[1]).expect("e3"));

    let knowns: HandleSet = [p, a, b].into_iter().collect();
    (eqs.into_iter().map(Equation::new).collect(), knowns)
}

#[test]
fn search_ranks_and_covers_every_order() {
    let mut arena = ExprArena::new();
    let (eqs, knowns) = ladder(&mut arena);
    let config = SolverConfig::default();
    let found = search(&mut arena, &eqs, &knowns, &config).expect("search");
    assert!(!found.is_empty());

    let sizes: Vec<usize> = found.iter().map(|f| f.map.size(&arena)).collect();
    assert!(sizes.windows(2).all(|w| w[0] <= w[1]));

    let unknowns: Vec<ExprHandle> = tensolve_solve::unknowns(&arena, &eqs, &knowns)
        .expect("unknowns")
        .into_iter()
        .collect();
    let mut perms = Permutations::new(unknowns.len(), unknowns.len());
    while let Some(indices) = perms.advance() {
        let order: Vec<ExprHandle> = indices.iter().map(|&i| unknowns[i]).collect();
        if let Elimination::Solved(map) =
            eliminate(&mut arena, &eqs, &knowns, &order, &config).expect("eliminate")
        {
            assert!(found.iter().any(|f| f.map == map));
        }
    }
}

struct CancelAfter {
    limit: usize,
    calls: Vec<(usize, usize, usize)>,
}

impl Progress for CancelAfter {
    fn order_tested(&mut self, tested: usize, total: usize, found: usize) {
        self.calls.push((tested, total, found));
    }

    fn should_stop(&self) -> bool {
        self.calls.len() >= self.limit
    }
}

#[test]
fn cancelled_search_keeps_what_it_found() {
    let mut arena = ExprArena::new();
    let (eqs, knowns) = ladder(&mut arena);
    let config = SolverConfig::default();
    let full = search(&mut arena, &eqs, &knowns, &config).expect("search");

    let mut observer = CancelAfter {
        limit: 5,
        calls: Vec::new(),
    };
    let partial =
        search_with(&mut arena, &eqs, &knowns, &config, &mut observer).expect("search_with");

    assert_eq!(observer.calls.len(), 5);
    let &(tested, total, found) = observer.calls.last().expect("progress");
    assert_eq!(tested, 5);
    assert_eq!(total, 24);
    assert_eq!(found, partial.len());
    for solution in &partial {
        assert!(full.iter().any(|f| f.map == solution.map));
    }
}

#[test]
fn update_solves_only_the_new_symbols() {
    let Symbols {
        mut arena,
        q,
        r,
        s,
        delta,
    } = symbols();
    // before: s + q = 0; after: u - delta·q - r = 0
    let before = add(&mut arena, &[s, q]).expect("before");
    let u = arena.symbol("u", 1).expect("u");
    let dq = mul(&mut arena, &[delta, q]).expect("dq");
    let rhs = add(&mut arena, &[dq, r]).expect("rhs");
    let after = sub(&mut arena, u, rhs).expect("after");

    let extra: HandleSet = [delta, r].into_iter().collect();
    let solutions = solve_update(
        &mut arena,
        &[Equation::new(before)],
        &[Equation::new(after)],
        &extra,
        &SolverConfig::default(),
    )
    .expect("solve_update");

    assert_eq!(solutions.len(), 1);
    let map = &solutions[0].map;
    assert_eq!(map.len(), 1);
    assert_eq!(map.solution(u), Some(rhs));
}

#[test]
fn singular_substitution_does_not_abort_the_solvers() {
    let mut arena = ExprArena::new();
    let p = arena.symbol("p", 1).expect("p");
    let d = arena.symbol("d", 0).expect("d");
    let v = arena.symbol("v", 1).expect("v");
    // d = 0, d·v - p = 0: v = inv(d)·p turns singular once d is known
    let dv = mul(&mut arena, &[d, v]).expect("dv");
    let e2 = sub(&mut arena, dv, p).expect("e2");
    let eqs = [Equation::new(d), Equation::new(e2)];
    let knowns: HandleSet = [p].into_iter().collect();
    let config = SolverConfig::default();

    let map = forward(&mut arena, &eqs, &knowns, false).expect("forward");
    assert!(map.solution(d).is_some_and(|z| arena.is_zero(z)));
    assert_eq!(map.get(v), Some(&Resolution::Unresolved));

    let map = assume_solve(&mut arena, &eqs, &knowns, &[], &config).expect("assume_solve");
    assert!(map.solution(d).is_some_and(|z| arena.is_zero(z)));
    assert_eq!(map.get(v), Some(&Resolution::Unresolved));

    let maps = branching_solve(&mut arena, &eqs, &knowns, &config).expect("branching_solve");
    assert!(maps.is_empty());

    let found = search(&mut arena, &eqs, &knowns, &config).expect("search");
    assert!(found.is_empty());
}

#[test]
fn multiple_solutions_are_kept_in_expanded_form() {
    let mut arena = ExprArena::new();
    let (eqs, knowns) = ladder(&mut arena);
    let config = SolverConfig::default().with_multiple_sols(true);
    let found = search(&mut arena, &eqs, &knowns, &config).expect("search");
    assert!(!found.is_empty());

    for solution in &found {
        for (_, resolution) in solution.map.iter() {
            for &value in resolution.values() {
                assert_eq!(expand(&mut arena, value).expect("expand"), value);
            }
        }
    }
}

#[test]
fn appending_reduced_equations_matches_replacing_them() {
    let Symbols {
        mut arena,
        q,
        r,
        s,
        delta,
    } = symbols();
    let e1 = add(&mut arena, &[s, q]).expect("e1");
    let dr = mul(&mut arena, &[delta, r]).expect("dr");
    let e2 = sub(&mut arena, dr, q).expect("e2");
    let eqs = [Equation::new(e1), Equation::new(e2)];
    let knowns: HandleSet = [delta, r].into_iter().collect();

    let replace = SolverConfig::default();
    let append = SolverConfig::default().with_sub_all(false);
    for order in [vec![q, s], vec![s, q]] {
        let replaced = eliminate(&mut arena, &eqs, &knowns, &order, &replace)
            .expect("eliminate")
            .into_result(&arena)
            .expect("solved");
        let appended = eliminate(&mut arena, &eqs, &knowns, &order, &append)
            .expect("eliminate")
            .into_result(&arena)
            .expect("solved");
        assert_eq!(replaced, appended);
        assert_eq!(appended.solution(q), Some(dr));
    }
}

#[test]
fn solved_symbols_do_not_reuse_their_equation() {
    let Symbols {
        mut arena,
        q,
        r,
        s,
        delta,
    } = symbols();
    // s + q = 0, delta·r - q = 0
    let e1 = add(&mut arena, &[s, q]).expect("e1");
    let dr = mul(&mut arena, &[delta, r]).expect("dr");
    let e2 = sub(&mut arena, dr, q).expect("e2");
    let eqs = [Equation::new(e1), Equation::new(e2)];
    let knowns: HandleSet = [delta, r].into_iter().collect();

    // appending keeps s + q active after q is eliminated; it must not
    // yield s = -q
    let config = SolverConfig::default()
        .with_sub_all(false)
        .with_multiple_sols(true);
    let map = eliminate(&mut arena, &eqs, &knowns, &[q, s], &config)
        .expect("eliminate")
        .into_result(&arena)
        .expect("solved");

    let ns = neg(&mut arena, s).expect("-s");
    let ndr = neg(&mut arena, dr).expect("-dr");
    assert_eq!(map.get(q), Some(&Resolution::Candidates(vec![ns, dr])));
    assert_eq!(map.get(s), Some(&Resolution::Candidates(vec![ndr])));
}

#[test]
fn blocked_prefixes_cut_the_search() {
    let mut arena = ExprArena::new();
    let p = arena.symbol("p", 1).expect("p");
    let q = arena.symbol("q", 1).expect("q");
    let w = arena.symbol("w", 1).expect("w");
    let delta = arena.symbol("delta", 0).expect("delta");
    // q = p, T(w)·p = delta: no equation determines the column w
    let e1 = sub(&mut arena, q, p).expect("e1");
    let tw = transpose(&mut arena, w).expect("T(w)");
    let wp = mul(&mut arena, &[tw, p]).expect("T(w)·p");
    let e2 = sub(&mut arena, wp, delta).expect("e2");
    let eqs = [Equation::new(e1), Equation::new(e2)];
    let knowns: HandleSet = [p].into_iter().collect();

    let mut observer = CancelAfter {
        limit: usize::MAX,
        calls: Vec::new(),
    };
    let found = search_with(
        &mut arena,
        &eqs,
        &knowns,
        &SolverConfig::default(),
        &mut observer,
    )
    .expect("search_with");

    // the order starting (w, delta) is never tried once w alone is blocked
    assert!(found.is_empty());
    assert_eq!(observer.calls.len(), 5);
    assert_eq!(observer.calls.last(), Some(&(5, 6, 0)));
}
