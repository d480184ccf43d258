use std::collections::VecDeque;

use super::{Automaton, Machine};
use crate::alphabet::same_values;
use crate::common::{Name, StateId};
use crate::error::{Error, Result};
use crate::table::{Transition, TransitionTable};

impl Machine {
    /// Renumbers states in breadth-first order from the initial state
    /// (symbols in increasing order) and drops unreachable states.
    pub fn canonize(&mut self) {
        if self.canonized {
            return;
        }
        let n = self.n_states();
        let mut index: Vec<Option<StateId>> = vec![None; n];
        let mut order = Vec::with_capacity(n);
        let mut queue = VecDeque::new();
        index[self.initial as usize] = Some(0);
        order.push(self.initial);
        queue.push_back(self.initial);
        while let Some(s) = queue.pop_front() {
            for tr in self.table.get_state(s) {
                for d in &tr.states {
                    if index[*d as usize].is_none() {
                        index[*d as usize] = Some(order.len() as StateId);
                        order.push(*d);
                        queue.push_back(*d);
                    }
                }
            }
        }

        let mut table = TransitionTable::with_states(self.alphabet.size(), order.len());
        for (new, old) in order.iter().enumerate() {
            for (symbol, tr) in self.table.get_state(*old).iter().enumerate() {
                let states = tr.states.iter().filter_map(|d| index[*d as usize]).collect();
                *table.get_transition_mut(new as StateId, symbol) = Transition::new(states);
            }
        }
        self.outputs = order.iter().map(|s| self.outputs[*s as usize]).collect();
        self.table = table;
        self.initial = 0;
        self.canonized = true;
    }

    /// Reorders coordinates so that labels are in increasing order.
    pub fn sort_labels(&mut self) {
        if self.label_sorted || !self.is_bound() {
            return;
        }
        let mut order: Vec<usize> = (0..self.arity()).collect();
        order.sort_by(|a, b| self.labels[*a].cmp(&self.labels[*b]));
        if order.iter().enumerate().all(|(i, o)| i == *o) {
            self.label_sorted = true;
            return;
        }
        // permutation[old] = new
        let mut permutation = vec![0; order.len()];
        for (new, old) in order.iter().enumerate() {
            permutation[*old] = new;
        }
        let (alphabet, map) = self.alphabet.permute(&permutation);
        let map: Vec<_> = map.into_iter().map(Some).collect();
        self.table = self.table.remap_symbols(alphabet.size(), &map);
        self.alphabet = alphabet;
        self.labels = order.iter().map(|i| self.labels[*i].clone()).collect();
        self.numerations = order.iter().map(|i| self.numerations[*i].clone()).collect();
        self.label_sorted = true;
    }

    /// Labels the coordinates in order. Coordinates given the same label are
    /// merged into one that only reads tuples where they agree.
    pub fn bind(&mut self, labels: &[Name]) -> Result<()> {
        if labels.len() != self.arity() {
            return Err(Error::InvalidOperation(format!(
                "binding {} labels to an automaton of arity {}",
                labels.len(),
                self.arity()
            )));
        }
        for (i, label) in labels.iter().enumerate() {
            for j in (i + 1)..labels.len() {
                if labels[j] == *label && !same_values(self.alphabet.coord(i), self.alphabet.coord(j)) {
                    return Err(Error::Alignment(format!(
                        "coordinates labeled {} have different alphabets",
                        label
                    )));
                }
            }
        }
        self.set_labels(labels.to_vec());
        let mut merged = false;
        while let Some(group) = self.first_repeated_label() {
            let first = group[0];
            let (alphabet, map) = self.alphabet.merge_coords(&group);
            self.table = self.table.remap_symbols(alphabet.size(), &map);
            self.alphabet = alphabet;
            for i in group[1..].iter().rev() {
                if self.numerations[first].is_none() {
                    self.numerations[first] = self.numerations[*i].clone();
                }
                self.labels.remove(*i);
                self.numerations.remove(*i);
            }
            merged = true;
        }
        if merged {
            self.minimize();
        }
        Ok(())
    }

    fn first_repeated_label(&self) -> Option<Vec<usize>> {
        for (i, label) in self.labels.iter().enumerate() {
            let group: Vec<usize> = (i..self.labels.len()).filter(|j| self.labels[*j] == *label).collect();
            if group.len() > 1 {
                return Some(group);
            }
        }
        None
    }
}

impl Automaton {
    pub fn canonize(&mut self) {
        if let Automaton::Machine(m) = self {
            m.canonize();
        }
    }

    pub fn sort_labels(&mut self) {
        if let Automaton::Machine(m) = self {
            m.sort_labels();
        }
    }

    /// Binds labels to the coordinates; the trivial automata take no labels.
    pub fn bind<N: Into<Name> + Clone>(&mut self, labels: &[N]) -> Result<()> {
        let labels: Vec<Name> = labels.iter().cloned().map(Into::into).collect();
        match self {
            Automaton::Trivial(_) if labels.is_empty() => Ok(()),
            Automaton::Trivial(_) => Err(Error::InvalidOperation(
                "cannot bind labels to a true or false automaton".to_string(),
            )),
            Automaton::Machine(m) => m.bind(&labels),
        }
    }

    /// A copy with the given labels.
    pub fn bound<N: Into<Name> + Clone>(&self, labels: &[N]) -> Result<Automaton> {
        let mut copy = self.clone();
        copy.bind(labels)?;
        Ok(copy)
    }
}
