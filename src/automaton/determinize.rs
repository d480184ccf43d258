use std::time::Instant;

use hashbrown::HashMap;

use super::Machine;
use crate::common::{StateId, StateSet};
use crate::table::{Transition, TransitionTable};

impl Machine {
    /// Subset construction starting from the set `init`.
    ///
    /// Only subsets reachable from `init` become states; an empty destination
    /// subset produces no transition. A new state accepts (output 1) iff one of
    /// its members has a nonzero output.
    pub(crate) fn determinize_from(&mut self, init: StateSet) {
        let start = Instant::now();
        let states_before = self.n_states();
        let asize = self.alphabet.size();

        let mut map: HashMap<StateSet, StateId> = HashMap::new();
        let mut sets = vec![init.clone()];
        map.insert(init, 0);
        let mut table: TransitionTable<Transition> = TransitionTable::with_states(asize, 1);

        let mut current = 0;
        while current < sets.len() {
            let set = sets[current].clone();
            for a in 0..asize {
                let dest = self.step(&set, a);
                if dest.is_empty() {
                    continue;
                }
                let id = match map.get(&dest) {
                    Some(id) => *id,
                    None => {
                        let id = table.push_state();
                        map.insert(dest.clone(), id);
                        sets.push(dest);
                        id
                    }
                };
                *table.get_transition_mut(current as StateId, a) = Transition::simple(id);
            }
            current += 1;
        }

        self.outputs = sets
            .iter()
            .map(|set| set.iter().any(|s| self.outputs[s as usize] != 0) as i32)
            .collect();
        self.table = table;
        self.initial = 0;
        self.canonized = false;
        tracing::debug!(
            states_before,
            states = self.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "determinized"
        );
    }

    /// Makes the automaton deterministic, keeping outputs if it already is.
    pub(crate) fn ensure_deterministic(&mut self) {
        if !self.table.is_deterministic() {
            self.determinize_from(StateSet::singleton(self.initial));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{machine_1d, word};
    use super::*;

    #[test]
    fn test_determinize_simple() {
        /*
            s0 -1-> s1 -1--> s2
            /\
            \/01
         */
        let mut m = machine_1d(&[0, 1], vec![0, 0, 1], &[(0, 0, 0), (0, 1, 0), (0, 1, 1), (1, 1, 2)]);
        let original = m.clone();
        m.ensure_deterministic();
        assert!(m.table().is_deterministic());
        assert_eq!(m.n_states(), 3);
        for w in &[vec![1, 1], vec![0, 1, 1], vec![1], vec![1, 1, 0], vec![1, 0, 1, 1]] {
            assert_eq!(m.accepts(&word(w)).unwrap(), original.accepts(&word(w)).unwrap());
        }
    }

    #[test]
    fn test_determinize_from_set() {
        let mut m = machine_1d(&[0, 1], vec![0, 0, 3], &[(0, 0, 2), (1, 1, 2)]);
        m.determinize_from(StateSet::new(vec![0, 1]));
        assert_eq!(m.n_states(), 2);
        assert_eq!(m.outputs(), &[0, 1]);
        assert!(m.accepts(&word(&[0])).unwrap());
        assert!(m.accepts(&word(&[1])).unwrap());
        assert!(!m.accepts(&word(&[1, 1])).unwrap());
    }

    #[test]
    fn test_deterministic_keeps_outputs() {
        let mut m = machine_1d(&[0, 1], vec![0, 7], &[(0, 1, 1)]);
        m.ensure_deterministic();
        assert_eq!(m.outputs(), &[0, 7]);
    }
}
