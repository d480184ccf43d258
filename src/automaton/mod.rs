//! Finite automata over tuples of integers.
//!
//! An [`Automaton`] is either one of the two trivial automata (the universal
//! and the empty predicate, with no coordinates at all) or a [`Machine`]: a
//! possibly nondeterministic automaton whose states carry an integer output.
//! Output 0 means rejecting; any other value means accepting, or is the value
//! produced by an automaton with output.

use std::fmt;
use std::rc::Rc;

use crate::alphabet::{Alphabet, Symbol};
use crate::common::{iterate_digits_lsd, Name, StateId, StateSet};
use crate::error::{Error, Result};
use crate::table::{Transition, TransitionTable};

mod canonical;
mod determinize;
mod dot;
mod minimize;
mod ops;
mod parse;
mod product;
mod quantify;

pub use self::product::{BoolOp, CompareOp};

/// How a coordinate is read as a number.
pub struct Numeration {
    name: String,
    msd: bool,
    all_representations: Option<Automaton>,
}

impl Numeration {
    pub fn new(name: String, msd: bool, all_representations: Option<Automaton>) -> Self {
        Numeration {
            name,
            msd,
            all_representations,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_msd(&self) -> bool {
        self.msd
    }

    /// One-coordinate automaton of the valid representations, if the system
    /// admits words that are not representations.
    #[inline]
    pub fn all_representations(&self) -> Option<&Automaton> {
        self.all_representations.as_ref()
    }

    /// The base `k` of a `msd_k` / `lsd_k` system.
    pub fn base(&self) -> Option<u64> {
        let (_, base) = self.name.split_once('_')?;
        base.parse().ok().filter(|b| *b > 1)
    }
}

impl fmt::Debug for Numeration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone)]
pub enum Automaton {
    Trivial(bool),
    Machine(Machine),
}

#[derive(Debug, Clone)]
pub struct Machine {
    pub(crate) alphabet: Alphabet,
    pub(crate) numerations: Vec<Option<Rc<Numeration>>>,
    /// Empty while the coordinates are unbound.
    pub(crate) labels: Vec<Name>,
    pub(crate) initial: StateId,
    pub(crate) outputs: Vec<i32>,
    pub(crate) table: TransitionTable<Transition>,
    pub(crate) canonized: bool,
    pub(crate) label_sorted: bool,
}

impl Machine {
    /// Builds an automaton from its parts, checking that they fit together.
    pub fn new(
        alphabet: Alphabet,
        numerations: Vec<Option<Rc<Numeration>>>,
        outputs: Vec<i32>,
        table: TransitionTable<Transition>,
        initial: StateId,
    ) -> Result<Self> {
        if numerations.len() != alphabet.arity() {
            return Err(Error::InvalidOperation(format!(
                "{} numerations given for {} coordinates",
                numerations.len(),
                alphabet.arity()
            )));
        }
        if table.alphabet_size() != alphabet.size() {
            return Err(Error::InvalidOperation("transition table does not match the alphabet".to_string()));
        }
        let n = outputs.len();
        if table.n_states() != n || initial as usize >= n {
            return Err(Error::InvalidOperation("transition table does not match the states".to_string()));
        }
        if table.states().flatten().any(|t| t.states.iter().any(|s| *s as usize >= n)) {
            return Err(Error::InvalidOperation("transition to an undeclared state".to_string()));
        }
        for (i, numeration) in numerations.iter().enumerate() {
            if let Some(numeration) = numeration {
                let values = alphabet.coord(i);
                if !values.contains(&0) || !values.contains(&1) {
                    return Err(Error::Encoding(format!(
                        "coordinate {} is read in {} but its alphabet lacks 0 or 1",
                        i,
                        numeration.name()
                    )));
                }
            }
        }
        Ok(Machine::from_raw(alphabet, numerations, outputs, table, initial))
    }

    pub(crate) fn from_raw(
        alphabet: Alphabet,
        numerations: Vec<Option<Rc<Numeration>>>,
        outputs: Vec<i32>,
        table: TransitionTable<Transition>,
        initial: StateId,
    ) -> Self {
        debug_assert_eq!(table.n_states(), outputs.len());
        debug_assert_eq!(numerations.len(), alphabet.arity());
        Machine {
            alphabet,
            numerations,
            labels: Vec::new(),
            initial,
            outputs,
            table,
            canonized: false,
            label_sorted: false,
        }
    }

    #[inline]
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    #[inline]
    pub fn numerations(&self) -> &[Option<Rc<Numeration>>] {
        &self.numerations
    }

    #[inline]
    pub fn labels(&self) -> &[Name] {
        &self.labels
    }

    #[inline]
    pub fn initial(&self) -> StateId {
        self.initial
    }

    #[inline]
    pub fn outputs(&self) -> &[i32] {
        &self.outputs
    }

    #[inline]
    pub fn table(&self) -> &TransitionTable<Transition> {
        &self.table
    }

    #[inline]
    pub fn n_states(&self) -> usize {
        self.outputs.len()
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.alphabet.arity()
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.labels.len() == self.alphabet.arity()
    }

    #[inline]
    pub fn is_canonized(&self) -> bool {
        self.canonized
    }

    /// True if every output is 0 or 1.
    pub fn is_boolean(&self) -> bool {
        self.outputs.iter().all(|o| *o == 0 || *o == 1)
    }

    pub(crate) fn set_labels(&mut self, labels: Vec<Name>) {
        debug_assert_eq!(labels.len(), self.arity());
        self.labels = labels;
        self.label_sorted = false;
    }

    pub(crate) fn unlabel(&mut self) {
        self.labels.clear();
        self.label_sorted = false;
    }

    /// Gives every coordinate a fresh helper label.
    pub(crate) fn label_fresh(&mut self) {
        let labels = (0..self.arity()).map(|_| Name::new_tmp()).collect();
        self.set_labels(labels);
    }

    fn run(&self, word: &[Vec<i32>]) -> Result<StateSet> {
        let mut current = StateSet::singleton(self.initial);
        for tuple in word {
            let symbol = self.alphabet.encode(tuple)?;
            current = self.step(&current, symbol);
            if current.is_empty() {
                break;
            }
        }
        Ok(current)
    }

    pub(crate) fn step(&self, states: &StateSet, symbol: Symbol) -> StateSet {
        StateSet::new(
            states
                .iter()
                .flat_map(|s| self.table.get_transition(s, symbol).states.iter().copied()),
        )
    }

    /// States reachable from `from` by reading zero or more times `symbol`.
    pub(crate) fn closure(&self, from: StateId, symbol: Symbol) -> StateSet {
        let mut seen = vec![false; self.n_states()];
        let mut stack = vec![from];
        seen[from as usize] = true;
        while let Some(s) = stack.pop() {
            for d in &self.table.get_transition(s, symbol).states {
                if !seen[*d as usize] {
                    seen[*d as usize] = true;
                    stack.push(*d);
                }
            }
        }
        StateSet::new((0..self.n_states() as StateId).filter(|s| seen[*s as usize]))
    }

    pub fn accepts(&self, word: &[Vec<i32>]) -> Result<bool> {
        Ok(self.run(word)?.iter().any(|s| self.outputs[s as usize] != 0))
    }

    /// Output after reading `word`; 0 when the run dies.
    pub fn output(&self, word: &[Vec<i32>]) -> Result<i32> {
        let states = self.run(word)?;
        match states.inner() {
            [] => Ok(0),
            [s] => Ok(self.outputs[*s as usize]),
            _ => Err(Error::InvalidOperation(
                "output of a nondeterministic automaton is not defined".to_string(),
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        let mut seen = vec![false; self.n_states()];
        let mut stack = vec![self.initial];
        seen[self.initial as usize] = true;
        while let Some(s) = stack.pop() {
            if self.outputs[s as usize] != 0 {
                return false;
            }
            for tr in self.table.get_state(s) {
                for d in &tr.states {
                    if !seen[*d as usize] {
                        seen[*d as usize] = true;
                        stack.push(*d);
                    }
                }
            }
        }
        true
    }

    /// The word spelling the given values, one per labeled coordinate, each in
    /// the base of its `msd_k` / `lsd_k` numeration and zero-padded to a
    /// common length.
    pub fn encode_values(&self, values: &[(&str, u64)]) -> Result<Vec<Vec<i32>>> {
        if !self.is_bound() {
            return Err(Error::Unbound("the automaton has unlabeled coordinates".to_string()));
        }
        let mut columns = Vec::with_capacity(self.arity());
        for (i, label) in self.labels.iter().enumerate() {
            let value = values
                .iter()
                .find(|(name, _)| Name::from(*name) == *label)
                .map(|(_, v)| *v)
                .ok_or_else(|| Error::Unbound(format!("no value given for {}", label)))?;
            let numeration = self.numerations[i]
                .as_ref()
                .ok_or_else(|| Error::InvalidOperation(format!("coordinate {} is not arithmetic", label)))?;
            let base = numeration.base().ok_or_else(|| {
                Error::InvalidOperation(format!("{} is not a base-k numeration system", numeration.name()))
            })?;
            let digits: Vec<u64> = iterate_digits_lsd(value, base).collect();
            columns.push((digits, numeration.is_msd()));
        }
        let width = columns.iter().map(|(d, _)| d.len()).max().unwrap_or(0);
        let mut word = vec![Vec::with_capacity(columns.len()); width];
        for (digits, msd) in &columns {
            for (t, row) in word.iter_mut().enumerate() {
                let position = if *msd { width - 1 - t } else { t };
                row.push(digits.get(position).copied().unwrap_or(0) as i32);
            }
        }
        Ok(word)
    }
}

impl Automaton {
    #[inline]
    pub fn trivial(value: bool) -> Self {
        Automaton::Trivial(value)
    }

    #[inline]
    pub fn is_trivial(&self) -> bool {
        matches!(self, Automaton::Trivial(_))
    }

    pub fn as_machine(&self) -> Option<&Machine> {
        match self {
            Automaton::Trivial(_) => None,
            Automaton::Machine(m) => Some(m),
        }
    }

    pub fn machine(&self) -> Result<&Machine> {
        self.as_machine()
            .ok_or_else(|| Error::InvalidOperation("the automaton is true or false".to_string()))
    }

    pub fn machine_mut(&mut self) -> Result<&mut Machine> {
        match self {
            Automaton::Trivial(_) => Err(Error::InvalidOperation("the automaton is true or false".to_string())),
            Automaton::Machine(m) => Ok(m),
        }
    }

    pub fn arity(&self) -> usize {
        self.as_machine().map(Machine::arity).unwrap_or(0)
    }

    pub fn n_states(&self) -> usize {
        self.as_machine().map(Machine::n_states).unwrap_or(1)
    }

    pub fn labels(&self) -> &[Name] {
        self.as_machine().map(Machine::labels).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Automaton::Trivial(value) => !value,
            Automaton::Machine(m) => m.is_empty(),
        }
    }

    pub fn accepts(&self, word: &[Vec<i32>]) -> Result<bool> {
        match self {
            Automaton::Trivial(value) => Ok(*value),
            Automaton::Machine(m) => m.accepts(word),
        }
    }

    pub fn output(&self, word: &[Vec<i32>]) -> Result<i32> {
        match self {
            Automaton::Trivial(value) => Ok(*value as i32),
            Automaton::Machine(m) => m.output(word),
        }
    }

    /// Accepts the labeled values written in their coordinates' numerations.
    pub fn accepts_values(&self, values: &[(&str, u64)]) -> Result<bool> {
        match self {
            Automaton::Trivial(value) => Ok(*value),
            Automaton::Machine(m) => m.accepts(&m.encode_values(values)?),
        }
    }
}

impl From<Machine> for Automaton {
    fn from(machine: Machine) -> Self {
        Automaton::Machine(machine)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a machine over one coordinate from `(state, symbol value, dest)` edges.
    pub(crate) fn machine_1d(values: &[i32], outputs: Vec<i32>, edges: &[(StateId, i32, StateId)]) -> Machine {
        let alphabet = Alphabet::new(vec![values.to_vec()]).unwrap();
        let mut table = TransitionTable::with_states(alphabet.size(), outputs.len());
        for (from, value, to) in edges {
            let symbol = alphabet.encode(&[*value]).unwrap();
            table.get_transition_mut(*from, symbol).insert(*to);
        }
        Machine::new(alphabet, vec![None], outputs, table, 0).unwrap()
    }

    pub(crate) fn word(digits: &[i32]) -> Vec<Vec<i32>> {
        digits.iter().map(|d| vec![*d]).collect()
    }

    #[test]
    fn test_accepts_nondeterministic() {
        /*
            s0 -0,1-> s0, s0 -1-> s1 -0-> s2(acc)
         */
        let m = machine_1d(&[0, 1], vec![0, 0, 1], &[(0, 0, 0), (0, 1, 0), (0, 1, 1), (1, 0, 2)]);
        assert!(m.accepts(&word(&[1, 0])).unwrap());
        assert!(m.accepts(&word(&[0, 1, 1, 0])).unwrap());
        assert!(!m.accepts(&word(&[1, 1])).unwrap());
        assert!(!m.accepts(&word(&[])).unwrap());
        assert!(matches!(m.accepts(&word(&[2])), Err(Error::Encoding(_))));
        assert!(!m.is_empty());
    }

    #[test]
    fn test_is_empty() {
        let m = machine_1d(&[0, 1], vec![0, 1], &[(0, 0, 0)]);
        assert!(m.is_empty());
        assert!(Automaton::trivial(false).is_empty());
        assert!(!Automaton::trivial(true).is_empty());
    }

    #[test]
    fn test_output() {
        let m = machine_1d(&[0, 1], vec![0, 5], &[(0, 1, 1), (1, 1, 1)]);
        assert_eq!(m.output(&word(&[1, 1])).unwrap(), 5);
        assert_eq!(m.output(&word(&[])).unwrap(), 0);
        assert_eq!(m.output(&word(&[0])).unwrap(), 0);
    }

    #[test]
    fn test_new_rejects_bad_parts() {
        let alphabet = Alphabet::new(vec![vec![0, 1]]).unwrap();
        let table = TransitionTable::new(2, vec![Transition::simple(3), Transition::empty()]);
        assert!(Machine::new(alphabet.clone(), vec![None], vec![0], table, 0).is_err());
        let table = TransitionTable::with_states(2, 1);
        assert!(Machine::new(alphabet, vec![], vec![0], table, 0).is_err());
    }

    #[test]
    fn test_encode_values() {
        let numeration = Rc::new(Numeration::new("msd_2".to_string(), true, None));
        let lsd = Rc::new(Numeration::new("lsd_3".to_string(), false, None));
        let alphabet = Alphabet::new(vec![vec![0, 1], vec![0, 1, 2]]).unwrap();
        let table = TransitionTable::with_states(alphabet.size(), 1);
        let mut m = Machine::new(alphabet, vec![Some(numeration), Some(lsd)], vec![0], table, 0).unwrap();
        assert!(matches!(m.encode_values(&[]), Err(Error::Unbound(_))));
        m.set_labels(vec![Name::from("a"), Name::from("b")]);
        // a = 6 = 110 (msd_2), b = 5 = 21 (lsd_3)
        let w = m.encode_values(&[("a", 6), ("b", 5)]).unwrap();
        assert_eq!(w, vec![vec![1, 2], vec![1, 1], vec![0, 0]]);
        assert!(m.encode_values(&[("a", 6)]).is_err());
    }
}
