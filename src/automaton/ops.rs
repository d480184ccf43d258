use std::time::Instant;

use super::product::ProductOp;
use super::{Automaton, BoolOp, CompareOp, Machine};
use crate::common::{StateId, StateSet};
use crate::error::{Error, Result};
use crate::table::Transition;

impl Machine {
    /// Sends every missing transition to one new rejecting sink state.
    pub fn totalize(&mut self) {
        if self.table.is_total() {
            return;
        }
        let states_before = self.n_states();
        let sink = self.table.push_state();
        self.outputs.push(0);
        for row in self.table.states_mut() {
            for tr in row.iter_mut() {
                if tr.is_empty() {
                    *tr = Transition::simple(sink);
                }
            }
        }
        self.canonized = false;
        tracing::debug!(states_before, states = self.n_states(), "totalized");
    }

    pub fn not(&mut self) -> Result<()> {
        let start = Instant::now();
        let states_before = self.n_states();
        self.ensure_deterministic();
        self.totalize();
        for o in self.outputs.iter_mut() {
            *o = (*o == 0) as i32;
        }
        self.minimize();
        self.apply_all_representations()?;
        tracing::debug!(
            states_before,
            states = self.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "negated"
        );
        Ok(())
    }

    /// The automaton reading words backwards.
    pub fn reverse(&mut self) -> Result<()> {
        if !self.is_boolean() {
            return Err(Error::InvalidOperation(
                "cannot reverse an automaton with output".to_string(),
            ));
        }
        let start = Instant::now();
        let states_before = self.n_states();
        let finals = StateSet::new((0..self.n_states() as StateId).filter(|s| self.outputs[*s as usize] != 0));
        self.table = self.table.reverse();
        for o in self.outputs.iter_mut() {
            *o = 0;
        }
        self.outputs[self.initial as usize] = 1;
        self.determinize_from(finals);
        self.minimize();
        tracing::debug!(
            states_before,
            states = self.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "reversed"
        );
        Ok(())
    }

    /// Restricts every coordinate whose numeration system has several
    /// representations of a value to the valid representations.
    pub(crate) fn apply_all_representations(&mut self) -> Result<()> {
        let mut restrictions = Vec::new();
        for (i, numeration) in self.numerations.iter().enumerate() {
            let numeration = match numeration {
                Some(n) => n,
                None => continue,
            };
            if let Some(Automaton::Machine(rep)) = numeration.all_representations() {
                if rep.arity() != 1 {
                    return Err(Error::InvalidOperation(format!(
                        "representations of {} must have one coordinate",
                        numeration.name()
                    )));
                }
                let mut rep = rep.clone();
                rep.numerations[0] = Some(numeration.clone());
                restrictions.push((i, rep));
            }
        }
        if restrictions.is_empty() {
            return Ok(());
        }
        let unlabeled = !self.is_bound();
        if unlabeled {
            self.label_fresh();
        }
        for (i, mut rep) in restrictions {
            rep.set_labels(vec![self.labels[i].clone()]);
            let mut product = self.cross_product(&rep, ProductOp::Bool(BoolOp::And))?;
            product.minimize();
            *self = product;
        }
        if unlabeled {
            self.unlabel();
        }
        Ok(())
    }

    /// Turns an automaton with output into the automaton accepting where
    /// `output op value`.
    pub fn compare_constant(&mut self, value: i32, op: CompareOp) {
        self.ensure_deterministic();
        for o in self.outputs.iter_mut() {
            *o = op.eval(*o, value) as i32;
        }
        self.canonized = false;
        self.minimize();
    }
}

/// `f` tells how a boolean operator treats the machine operand once the other
/// one is a constant.
fn with_constant<F: Fn(bool) -> bool>(mut automaton: Automaton, f: F) -> Result<Automaton> {
    match (f(false), f(true)) {
        (false, true) => Ok(automaton),
        (true, false) => {
            automaton.not()?;
            Ok(automaton)
        }
        (value, _) => Ok(Automaton::Trivial(value)),
    }
}

impl Automaton {
    fn boolean(self, other: Automaton, op: BoolOp) -> Result<Automaton> {
        match (self, other) {
            (Automaton::Trivial(a), Automaton::Trivial(b)) => Ok(Automaton::Trivial(op.eval(a, b))),
            (Automaton::Trivial(a), machine) => with_constant(machine, |b| op.eval(a, b)),
            (machine, Automaton::Trivial(b)) => with_constant(machine, |a| op.eval(a, b)),
            (Automaton::Machine(mut left), Automaton::Machine(mut right)) => {
                let start = Instant::now();
                left.ensure_deterministic();
                right.ensure_deterministic();
                if op != BoolOp::And {
                    left.totalize();
                    right.totalize();
                }
                let mut product = left.cross_product(&right, ProductOp::Bool(op))?;
                product.minimize();
                if op != BoolOp::And {
                    product.apply_all_representations()?;
                }
                tracing::debug!(
                    ?op,
                    left = left.n_states(),
                    right = right.n_states(),
                    states = product.n_states(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "computed boolean operation"
                );
                Ok(Automaton::Machine(product))
            }
        }
    }

    pub fn and(self, other: Automaton) -> Result<Automaton> {
        self.boolean(other, BoolOp::And)
    }

    pub fn or(self, other: Automaton) -> Result<Automaton> {
        self.boolean(other, BoolOp::Or)
    }

    pub fn xor(self, other: Automaton) -> Result<Automaton> {
        self.boolean(other, BoolOp::Xor)
    }

    pub fn imply(self, other: Automaton) -> Result<Automaton> {
        self.boolean(other, BoolOp::Imply)
    }

    pub fn iff(self, other: Automaton) -> Result<Automaton> {
        self.boolean(other, BoolOp::Iff)
    }

    /// Whether both automata accept the same words, reading coordinates in
    /// order and ignoring labels.
    pub fn equivalent(&self, other: &Automaton) -> Result<bool> {
        let (left, right) = match (self, other) {
            (Automaton::Machine(a), Automaton::Machine(b)) => {
                if a.arity() != b.arity() {
                    return Err(Error::InvalidOperation(format!(
                        "cannot compare automata of arity {} and {}",
                        a.arity(),
                        b.arity()
                    )));
                }
                let mut a = a.clone();
                let mut b = b.clone();
                a.label_fresh();
                b.set_labels(a.labels.clone());
                (Automaton::Machine(a), Automaton::Machine(b))
            }
            _ => (self.clone(), other.clone()),
        };
        Ok(left.xor(right)?.is_empty())
    }

    pub fn not(&mut self) -> Result<()> {
        match self {
            Automaton::Trivial(value) => {
                *value = !*value;
                Ok(())
            }
            Automaton::Machine(m) => m.not(),
        }
    }

    /// Reverses the words read; a no-op on the trivial automata.
    pub fn reverse(&mut self) -> Result<()> {
        match self {
            Automaton::Trivial(_) => Ok(()),
            Automaton::Machine(m) => m.reverse(),
        }
    }

    pub fn minimize(&mut self) {
        if let Automaton::Machine(m) = self {
            m.minimize();
        }
    }

    pub fn totalize(&mut self) {
        if let Automaton::Machine(m) = self {
            m.totalize();
        }
    }

    /// Compares the outputs of two automata with output along the same input:
    /// accepts where `self(x) op other(x)`.
    pub fn compare(&self, other: &Automaton, op: CompareOp) -> Result<Automaton> {
        let start = Instant::now();
        let mut left = self.machine()?.clone();
        let mut right = other.machine()?.clone();
        left.ensure_deterministic();
        right.ensure_deterministic();
        let mut product = left.cross_product(&right, ProductOp::Compare(op))?;
        product.minimize();
        tracing::debug!(
            ?op,
            states = product.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "compared automata with output"
        );
        Ok(Automaton::Machine(product))
    }

    /// Accepts where the output compares to `value` by `op`.
    pub fn compare_constant(&mut self, value: i32, op: CompareOp) -> Result<()> {
        self.machine_mut()?.compare_constant(value, op);
        Ok(())
    }

    /// Overlays automata over the same coordinates into one automaton with
    /// output: 1 where `self` accepts and `k + 1` where the k-th of `others`
    /// accepts, later automata taking precedence; 0 elsewhere.
    pub fn combine(&self, others: Vec<Automaton>) -> Result<Automaton> {
        let start = Instant::now();
        let mut first = self.machine()?.clone();
        for o in first.outputs.iter_mut() {
            *o = (*o != 0) as i32;
        }
        first.ensure_deterministic();
        first.label_fresh();
        for (k, other) in others.into_iter().enumerate() {
            let mut next = match other {
                Automaton::Machine(m) => m,
                Automaton::Trivial(_) => {
                    return Err(Error::InvalidOperation("cannot combine a true or false automaton".to_string()))
                }
            };
            if next.arity() != first.arity() {
                return Err(Error::InvalidOperation(format!(
                    "combined automata must have the same arity ({} and {})",
                    first.arity(),
                    next.arity()
                )));
            }
            for o in next.outputs.iter_mut() {
                *o = (*o != 0) as i32;
            }
            next.ensure_deterministic();
            next.set_labels(first.labels.clone());
            first.totalize();
            next.totalize();
            first = first.cross_product(&next, ProductOp::Combine(k as i32 + 1))?;
        }
        first.minimize();
        first.unlabel();
        tracing::debug!(
            states = first.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "combined"
        );
        Ok(Automaton::Machine(first))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{machine_1d, word};
    use super::*;
    use crate::common::Name;

    fn labeled(mut m: Machine, label: &str) -> Automaton {
        m.set_labels(vec![Name::from(label)]);
        Automaton::Machine(m)
    }

    /// Words over {0,1} ending in 1.
    fn ends_with_one() -> Machine {
        machine_1d(&[0, 1], vec![0, 1], &[(0, 0, 0), (0, 1, 1), (1, 0, 0), (1, 1, 1)])
    }

    /// Words over {0,1} starting with 1.
    fn starts_with_one() -> Machine {
        machine_1d(&[0, 1], vec![0, 1], &[(0, 1, 1), (1, 0, 1), (1, 1, 1)])
    }

    #[test]
    fn test_boolean_laws() {
        let words: Vec<Vec<i32>> = vec![vec![], vec![0], vec![1], vec![0, 1], vec![1, 0], vec![1, 1], vec![0, 0]];
        let ops: Vec<(BoolOp, fn(bool, bool) -> bool)> = vec![
            (BoolOp::And, |a, b| a && b),
            (BoolOp::Or, |a, b| a || b),
            (BoolOp::Xor, |a, b| a != b),
            (BoolOp::Imply, |a, b| !a || b),
            (BoolOp::Iff, |a, b| a == b),
        ];
        for (op, f) in ops {
            let a = labeled(ends_with_one(), "x");
            let b = labeled(starts_with_one(), "x");
            let r = a.clone().boolean(b.clone(), op).unwrap();
            for w in &words {
                let w = word(w);
                let expected = f(a.accepts(&w).unwrap(), b.accepts(&w).unwrap());
                assert_eq!(r.accepts(&w).unwrap(), expected, "{:?} on {:?}", op, w);
            }
        }
    }

    #[test]
    fn test_trivial_short_circuits() {
        let a = labeled(ends_with_one(), "x");
        assert!(matches!(a.clone().and(Automaton::trivial(false)).unwrap(), Automaton::Trivial(false)));
        assert!(matches!(Automaton::trivial(true).or(a.clone()).unwrap(), Automaton::Trivial(true)));
        assert_eq!(Automaton::trivial(true).and(a.clone()).unwrap().n_states(), a.n_states());
        let negated = Automaton::trivial(true).xor(a.clone()).unwrap();
        assert!(negated.accepts(&word(&[1, 0])).unwrap());
        assert!(!negated.accepts(&word(&[0, 1])).unwrap());
        assert!(matches!(
            Automaton::trivial(false).imply(Automaton::trivial(false)).unwrap(),
            Automaton::Trivial(true)
        ));
    }

    #[test]
    fn test_not() {
        let mut a = Automaton::Machine(starts_with_one());
        a.not().unwrap();
        assert!(a.accepts(&word(&[])).unwrap());
        assert!(a.accepts(&word(&[0, 1])).unwrap());
        assert!(!a.accepts(&word(&[1, 0])).unwrap());
        let mut t = Automaton::trivial(true);
        t.not().unwrap();
        assert!(t.is_empty());
    }

    /// s0 -1-> {s1 (accepting), s2 (rejecting)}
    fn split_on_one() -> Machine {
        machine_1d(&[0, 1], vec![0, 1, 0], &[(0, 1, 1), (0, 1, 2)])
    }

    #[test]
    fn test_not_nondeterministic() {
        let mut a = Automaton::Machine(split_on_one());
        a.not().unwrap();
        assert!(!a.accepts(&word(&[1])).unwrap());
        assert!(a.accepts(&word(&[])).unwrap());
        assert!(a.accepts(&word(&[0])).unwrap());
        assert!(a.accepts(&word(&[1, 1])).unwrap());

        let same = labeled(split_on_one(), "x").xor(labeled(split_on_one(), "x")).unwrap();
        assert!(same.is_empty());
        let or = labeled(split_on_one(), "x").or(labeled(ends_with_one(), "x")).unwrap();
        assert!(or.accepts(&word(&[1])).unwrap());
        assert!(!or.accepts(&word(&[1, 0])).unwrap());
    }

    #[test]
    fn test_compare_nondeterministic() {
        let mut ne = Automaton::Machine(split_on_one());
        ne.compare_constant(1, CompareOp::Ne).unwrap();
        assert!(!ne.accepts(&word(&[1])).unwrap());
        assert!(ne.accepts(&word(&[])).unwrap());

        let ones = machine_1d(&[0, 1], vec![1], &[(0, 0, 0), (0, 1, 0)]);
        let lt = labeled(split_on_one(), "n").compare(&labeled(ones, "n"), CompareOp::Lt).unwrap();
        assert!(!lt.accepts(&word(&[1])).unwrap());
        assert!(lt.accepts(&word(&[])).unwrap());
    }

    #[test]
    fn test_equivalent() {
        // s0 -1-> {s1, s2}, both accepting and looping
        let nfa = machine_1d(&[0, 1], vec![0, 1, 1], &[(0, 1, 1), (0, 1, 2), (1, 0, 1), (1, 1, 1), (2, 0, 2), (2, 1, 2)]);
        let a = Automaton::Machine(starts_with_one());
        assert!(a.equivalent(&Automaton::Machine(nfa)).unwrap());
        assert!(!a.equivalent(&Automaton::Machine(ends_with_one())).unwrap());
        assert!(a.equivalent(&labeled(starts_with_one(), "y")).unwrap());

        let mut negated = a.clone();
        negated.not().unwrap();
        negated.not().unwrap();
        assert!(negated.equivalent(&a).unwrap());

        let empty = Automaton::Machine(machine_1d(&[0, 1], vec![0], &[(0, 0, 0)]));
        assert!(empty.equivalent(&Automaton::trivial(false)).unwrap());
        assert!(!a.equivalent(&Automaton::trivial(true)).unwrap());

        let pair = crate::alphabet::Alphabet::new(vec![vec![0, 1], vec![0, 1]]).unwrap();
        let table = crate::table::TransitionTable::with_states(pair.size(), 1);
        let wide = Automaton::Machine(Machine::new(pair, vec![None, None], vec![1], table, 0).unwrap());
        assert!(matches!(a.equivalent(&wide), Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_totalize_idempotent() {
        let mut m = starts_with_one();
        m.totalize();
        assert_eq!(m.n_states(), 3);
        assert!(m.table().is_total());
        m.totalize();
        assert_eq!(m.n_states(), 3);
    }

    #[test]
    fn test_reverse() {
        let mut a = Automaton::Machine(ends_with_one());
        a.reverse().unwrap();
        assert!(a.accepts(&word(&[1, 0, 0])).unwrap());
        assert!(!a.accepts(&word(&[0, 1])).unwrap());
        let mut dfao = Automaton::Machine(machine_1d(&[0, 1], vec![0, 2], &[(0, 1, 1)]));
        assert!(matches!(dfao.reverse(), Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_compare_outputs() {
        // left outputs the last digit + 1, right outputs 1 everywhere
        let left = machine_1d(&[0, 1], vec![1, 2], &[(0, 0, 0), (0, 1, 1), (1, 0, 0), (1, 1, 1)]);
        let right = machine_1d(&[0, 1], vec![1], &[(0, 0, 0), (0, 1, 0)]);
        let left = labeled(left, "n");
        let right = labeled(right, "n");
        let gt = left.compare(&right, CompareOp::Gt).unwrap();
        assert!(gt.accepts(&word(&[0, 1])).unwrap());
        assert!(!gt.accepts(&word(&[1, 0])).unwrap());

        let mut eq = left.clone();
        eq.compare_constant(2, CompareOp::Eq).unwrap();
        assert!(eq.accepts(&word(&[1])).unwrap());
        assert!(!eq.accepts(&word(&[])).unwrap());
    }

    #[test]
    fn test_combine() {
        let a = Automaton::Machine(starts_with_one());
        let b = Automaton::Machine(ends_with_one());
        let c = a.combine(vec![b]).unwrap();
        assert!(c.labels().is_empty());
        assert_eq!(c.output(&word(&[1, 0])).unwrap(), 1);
        assert_eq!(c.output(&word(&[1, 1])).unwrap(), 2);
        assert_eq!(c.output(&word(&[0, 1])).unwrap(), 2);
        assert_eq!(c.output(&word(&[0, 0])).unwrap(), 0);
    }
}
