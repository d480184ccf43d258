//! Randomized laws of the automaton operations.

use numaut::alphabet::Alphabet;
use numaut::table::TransitionTable;
use numaut::{ArithOp, Automaton, BoolOp, Machine, Operand, Registry};
use proptest::prelude::*;

/// Builds a machine over `coords` from `(from, symbol, to)` edges.
fn build(coords: Vec<Vec<i32>>, outputs: Vec<i32>, edges: &[(u32, usize, u32)]) -> Machine {
    let alphabet = Alphabet::new(coords).unwrap();
    let arity = alphabet.arity();
    let mut table = TransitionTable::with_states(alphabet.size(), outputs.len());
    for (from, symbol, to) in edges {
        table.get_transition_mut(*from, *symbol).insert(*to);
    }
    Machine::new(alphabet, vec![None; arity], outputs, table, 0).unwrap()
}

/// Every word over `values` (one coordinate) of length at most `max_len`.
fn words(values: &[i32], max_len: usize) -> Vec<Vec<Vec<i32>>> {
    let mut all = vec![Vec::new()];
    let mut layer: Vec<Vec<Vec<i32>>> = vec![Vec::new()];
    for _ in 0..max_len {
        layer = layer
            .iter()
            .flat_map(|w| {
                values.iter().map(move |v| {
                    let mut next = w.clone();
                    next.push(vec![*v]);
                    next
                })
            })
            .collect();
        all.extend(layer.iter().cloned());
    }
    all
}

prop_compose! {
    fn arb_nfa()(n in 1usize..6)(
        n in Just(n),
        outputs in prop::collection::vec(0..2i32, n),
        edges in prop::collection::vec((0..n as u32, 0usize..2, 0..n as u32), 0..14),
    ) -> Machine {
        build(vec![vec![0, 1]], outputs, &edges)
    }
}

prop_compose! {
    fn arb_pair_nfa()(n in 1usize..5)(
        n in Just(n),
        outputs in prop::collection::vec(0..2i32, n),
        edges in prop::collection::vec((0..n as u32, 0usize..4, 0..n as u32), 0..16),
    ) -> Machine {
        build(vec![vec![0, 1], vec![0, 1]], outputs, &edges)
    }
}

fn bool_op() -> impl Strategy<Value = BoolOp> {
    prop_oneof![
        Just(BoolOp::And),
        Just(BoolOp::Or),
        Just(BoolOp::Xor),
        Just(BoolOp::Imply),
        Just(BoolOp::Iff),
    ]
}

fn apply(a: Automaton, b: Automaton, op: BoolOp) -> Automaton {
    match op {
        BoolOp::And => a.and(b),
        BoolOp::Or => a.or(b),
        BoolOp::Xor => a.xor(b),
        BoolOp::Imply => a.imply(b),
        BoolOp::Iff => a.iff(b),
    }
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_minimize_preserves_language(m in arb_nfa()) {
        let mut minimal = m.clone();
        minimal.minimize();
        prop_assert!(minimal.table().is_deterministic());
        for w in words(&[0, 1], 5) {
            prop_assert_eq!(minimal.accepts(&w).unwrap(), m.accepts(&w).unwrap(), "word {:?}", w);
        }
    }

    #[test]
    fn prop_minimize_idempotent(m in arb_nfa()) {
        let mut once = m;
        once.minimize();
        let mut twice = once.clone();
        twice.minimize();
        prop_assert_eq!(once.n_states(), twice.n_states());
    }

    #[test]
    fn prop_boolean_laws(a in arb_nfa(), b in arb_nfa(), op in bool_op()) {
        let a = Automaton::Machine(a).bound(&["x"]).unwrap();
        let b = Automaton::Machine(b).bound(&["x"]).unwrap();
        let result = apply(a.clone(), b.clone(), op);
        for w in words(&[0, 1], 4) {
            let expected = op.eval(a.accepts(&w).unwrap(), b.accepts(&w).unwrap());
            prop_assert_eq!(result.accepts(&w).unwrap(), expected, "{:?} on {:?}", op, w);
        }
    }

    #[test]
    fn prop_forall_holds_for_every_y(m in arb_pair_nfa()) {
        let bound = Automaton::Machine(m).bound(&["x", "y"]).unwrap();
        let mut forall = bound.clone();
        forall.forall(&["y"]).unwrap();
        for w in words(&[0, 1], 3) {
            let every = words(&[0, 1], w.len()).into_iter().filter(|y| y.len() == w.len()).all(|y| {
                let pairs: Vec<Vec<i32>> = w.iter().zip(&y).map(|(x, y)| vec![x[0], y[0]]).collect();
                bound.accepts(&pairs).unwrap()
            });
            prop_assert_eq!(forall.accepts(&w).unwrap(), every, "word {:?}", w);
        }
    }

    #[test]
    fn prop_exists_projects(m in arb_pair_nfa()) {
        let bound = Automaton::Machine(m).bound(&["x", "y"]).unwrap();
        let mut exists = bound.clone();
        exists.quantify(&["y"]).unwrap();
        for w in words(&[0, 1], 3) {
            let witness = words(&[0, 1], w.len()).into_iter().filter(|y| y.len() == w.len()).any(|y| {
                let pairs: Vec<Vec<i32>> = w.iter().zip(&y).map(|(x, y)| vec![x[0], y[0]]).collect();
                bound.accepts(&pairs).unwrap()
            });
            prop_assert_eq!(exists.accepts(&w).unwrap(), witness, "word {:?}", w);
        }
    }

    #[test]
    fn prop_write_parse_round_trip(m in arb_nfa()) {
        let mut a = Automaton::Machine(m);
        let text = a.to_text().unwrap();
        let parsed = Automaton::parse(&text, &mut Registry::default()).unwrap();
        for w in words(&[0, 1], 5) {
            prop_assert_eq!(parsed.accepts(&w).unwrap(), a.accepts(&w).unwrap(), "{}", text);
        }
    }

    #[test]
    fn prop_addition(a in 0u64..500, b in 0u64..500) {
        let mut registry = Registry::default();
        for name in &["msd_2", "lsd_2", "msd_10"] {
            let ns = registry.get(name).unwrap();
            let sum = ns.arithmetic(&Operand::from("a"), &Operand::from("b"), &Operand::from("c"), ArithOp::Plus).unwrap();
            prop_assert!(sum.accepts_values(&[("a", a), ("b", b), ("c", a + b)]).unwrap());
            prop_assert!(!sum.accepts_values(&[("a", a), ("b", b), ("c", a + b + 1)]).unwrap());
        }
    }

    #[test]
    fn prop_leading_zeros_do_not_matter(x in 0u64..200, k in 0i64..20) {
        let mut registry = Registry::default();
        let ns = registry.get("msd_2").unwrap();
        let shifted = ns.arithmetic(&Operand::from("x"), &Operand::Const(k), &Operand::from("y"), ArithOp::Plus).unwrap();
        let m = shifted.as_machine().unwrap();
        let y = x + k as u64;
        let word = m.encode_values(&[("x", x), ("y", y)]).unwrap();
        let mut padded = vec![vec![0; m.arity()]];
        padded.extend(word.iter().cloned());
        prop_assert!(shifted.accepts(&word).unwrap());
        prop_assert!(shifted.accepts(&padded).unwrap());
    }
}
