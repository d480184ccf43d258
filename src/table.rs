use smallvec::{smallvec, SmallVec};

use crate::alphabet::Symbol;
use crate::common::StateId;

/// Destinations of one (state, symbol) pair. Empty means no transition;
/// more than one destination makes the automaton nondeterministic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transition {
    pub states: SmallVec<[StateId; 2]>,
}

impl Transition {
    #[inline]
    pub fn empty() -> Transition {
        Transition {
            states: Default::default(),
        }
    }

    #[inline]
    pub fn simple(state_id: StateId) -> Transition {
        Transition {
            states: smallvec![state_id],
        }
    }

    pub fn new(states: SmallVec<[StateId; 2]>) -> Transition {
        Transition { states }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline]
    pub fn is_simple(&self, state_id: StateId) -> bool {
        self.states.len() == 1 && self.states[0] == state_id
    }

    /// Adds a destination unless it is already present.
    #[inline]
    pub fn insert(&mut self, state_id: StateId) {
        if !self.states.contains(&state_id) {
            self.states.push(state_id);
        }
    }

    pub fn extend(&mut self, other: &Transition) {
        for s in &other.states {
            self.insert(*s);
        }
    }
}

/// Dense state × symbol table, one row of `alphabet_size` cells per state.
#[derive(Debug, Clone)]
pub struct TransitionTable<T: Default + Clone> {
    alphabet_size: usize,
    transitions: Vec<T>,
}

impl<T: Default + Clone> TransitionTable<T> {
    pub fn new(alphabet_size: usize, transitions: Vec<T>) -> Self {
        assert!(alphabet_size > 0);
        assert_eq!(transitions.len() % alphabet_size, 0);
        TransitionTable {
            alphabet_size,
            transitions,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.transitions.len()
    }

    #[inline]
    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    #[inline]
    pub fn n_states(&self) -> usize {
        self.transitions.len() / self.alphabet_size
    }

    #[inline]
    pub fn get_transition(&self, state: StateId, symbol: Symbol) -> &T {
        &self.transitions[state as usize * self.alphabet_size + symbol]
    }

    #[inline]
    pub fn get_transition_mut(&mut self, state: StateId, symbol: Symbol) -> &mut T {
        &mut self.transitions[state as usize * self.alphabet_size + symbol]
    }

    #[inline]
    pub fn get_state(&self, state: StateId) -> &[T] {
        let start = state as usize * self.alphabet_size;
        &self.transitions[start..start + self.alphabet_size]
    }

    #[inline]
    pub fn get_state_mut(&mut self, state: StateId) -> &mut [T] {
        let start = state as usize * self.alphabet_size;
        &mut self.transitions[start..start + self.alphabet_size]
    }

    pub fn states(&self) -> impl Iterator<Item = &[T]> {
        self.transitions.chunks(self.alphabet_size)
    }

    pub fn states_mut(&mut self) -> impl Iterator<Item = &mut [T]> {
        self.transitions.chunks_mut(self.alphabet_size)
    }

    /// Appends a state with no transitions and returns its id.
    pub fn push_state(&mut self) -> StateId {
        let id = self.n_states() as StateId;
        self.transitions.resize(self.transitions.len() + self.alphabet_size, T::default());
        id
    }
}

impl TransitionTable<Transition> {
    /// A table of `n_states` states without transitions.
    pub fn with_states(alphabet_size: usize, n_states: usize) -> Self {
        TransitionTable::new(alphabet_size, vec![Transition::empty(); alphabet_size * n_states])
    }

    /// Moves every transition on symbol `x` to symbol `map[x]` in a table over
    /// `alphabet_size` symbols. Transitions that land on the same symbol are
    /// merged; symbols mapped to `None` are dropped.
    pub fn remap_symbols(&self, alphabet_size: usize, map: &[Option<Symbol>]) -> TransitionTable<Transition> {
        assert_eq!(map.len(), self.alphabet_size);
        let mut table = TransitionTable::with_states(alphabet_size, self.n_states());
        for (idx, state) in self.states().enumerate() {
            let row = table.get_state_mut(idx as StateId);
            for (symbol, tr) in state.iter().enumerate() {
                if tr.is_empty() {
                    continue;
                }
                if let Some(target) = map[symbol] {
                    row[target].extend(tr);
                }
            }
        }
        table
    }

    /// The table with every edge turned around.
    pub fn reverse(&self) -> TransitionTable<Transition> {
        let mut table = TransitionTable::with_states(self.alphabet_size, self.n_states());
        for (idx, state) in self.states().enumerate() {
            for (symbol, tr) in state.iter().enumerate() {
                for dest in &tr.states {
                    table.get_transition_mut(*dest, symbol).insert(idx as StateId);
                }
            }
        }
        table
    }

    pub fn is_deterministic(&self) -> bool {
        self.transitions.iter().all(|t| t.states.len() <= 1)
    }

    pub fn is_total(&self) -> bool {
        self.transitions.iter().all(|t| !t.is_empty())
    }

    /// Number of (tail, symbol, head) edges.
    pub fn n_edges(&self) -> usize {
        self.transitions.iter().map(|t| t.states.len()).sum()
    }
}
