use std::time::Instant;

use super::Machine;
use crate::common::StateId;
use crate::partition::{Marks, Partition};
use crate::table::{Transition, TransitionTable};

/// Deterministic automaton flattened into parallel edge arrays.
struct Edges {
    tails: Vec<usize>,
    labels: Vec<usize>,
    heads: Vec<usize>,
}

impl Edges {
    fn len(&self) -> usize {
        self.tails.len()
    }
}

/// `adjacent[offsets[s]..offsets[s + 1]]` lists the edges whose `ends[e] == s`.
fn make_adjacent(n_states: usize, ends: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let mut offsets = vec![0; n_states + 1];
    for e in ends {
        offsets[*e + 1] += 1;
    }
    for s in 0..n_states {
        offsets[s + 1] += offsets[s];
    }
    let mut fill = offsets.clone();
    let mut adjacent = vec![0; ends.len()];
    for (t, e) in ends.iter().enumerate() {
        adjacent[fill[*e]] = t;
        fill[*e] += 1;
    }
    (adjacent, offsets)
}

/// States reachable from `roots` following edges from `from` ends to `to` ends.
fn reach(n_states: usize, roots: &[usize], from: &[usize], to: &[usize]) -> Vec<bool> {
    let (adjacent, offsets) = make_adjacent(n_states, from);
    let mut seen = vec![false; n_states];
    let mut stack = Vec::new();
    for r in roots {
        if !seen[*r] {
            seen[*r] = true;
            stack.push(*r);
        }
    }
    while let Some(s) = stack.pop() {
        for t in &adjacent[offsets[s]..offsets[s + 1]] {
            let d = to[*t];
            if !seen[d] {
                seen[d] = true;
                stack.push(d);
            }
        }
    }
    seen
}

impl Machine {
    /// Minimizes the automaton by partition refinement.
    ///
    /// A nondeterministic automaton is determinized first (outputs become 0/1).
    /// States unreachable from the initial state are dropped; when all outputs
    /// are 0/1, so are states from which no accepting state is reachable.
    /// States are distinguished by their output value, so automata with output
    /// stay automata with output. The result is canonized.
    pub fn minimize(&mut self) {
        let start = Instant::now();
        let states_before = self.n_states();
        self.ensure_deterministic();

        let mut edges = Edges {
            tails: Vec::new(),
            labels: Vec::new(),
            heads: Vec::new(),
        };
        for (q, row) in self.table.states().enumerate() {
            for (a, tr) in row.iter().enumerate() {
                if let Some(d) = tr.states.first() {
                    edges.tails.push(q);
                    edges.labels.push(a);
                    edges.heads.push(*d as usize);
                }
            }
        }

        let n = self.n_states();
        let mut keep = reach(n, &[self.initial as usize], &edges.tails, &edges.heads);
        if self.is_boolean() {
            let finals: Vec<usize> = (0..n).filter(|s| keep[*s] && self.outputs[*s] != 0).collect();
            let live = reach(n, &finals, &edges.heads, &edges.tails);
            for (k, l) in keep.iter_mut().zip(live) {
                *k = *k && l;
            }
            if !keep[self.initial as usize] {
                self.table = TransitionTable::with_states(self.alphabet.size(), 1);
                self.outputs = vec![0];
                self.initial = 0;
                self.canonized = true;
                tracing::debug!(states_before, states = 1, "minimized to the empty language");
                return;
            }
        }

        // compact states and edges
        let mut index = vec![usize::MAX; n];
        let mut outputs = Vec::new();
        for s in 0..n {
            if keep[s] {
                index[s] = outputs.len();
                outputs.push(self.outputs[s]);
            }
        }
        let mut trimmed = Edges {
            tails: Vec::new(),
            labels: Vec::new(),
            heads: Vec::new(),
        };
        for t in 0..edges.len() {
            if keep[edges.tails[t]] && keep[edges.heads[t]] {
                trimmed.tails.push(index[edges.tails[t]]);
                trimmed.labels.push(edges.labels[t]);
                trimmed.heads.push(index[edges.heads[t]]);
            }
        }
        let edges = trimmed;
        let n = outputs.len();
        let m = edges.len();

        let mut blocks = Partition::from_keys(&outputs);
        let mut cords = Partition::from_keys(&edges.labels);
        let mut marks = Marks::new(n.max(m));
        let (incoming, offsets) = make_adjacent(n, &edges.heads);

        let mut b = 0;
        let mut c = 0;
        while c < cords.sets {
            for i in cords.set_range(c) {
                blocks.mark(edges.tails[cords.elements[i]], &mut marks);
            }
            blocks.split(&mut marks);
            c += 1;
            while b < blocks.sets {
                for i in blocks.set_range(b) {
                    let s = blocks.elements[i];
                    for t in &incoming[offsets[s]..offsets[s + 1]] {
                        cords.mark(*t, &mut marks);
                    }
                }
                cords.split(&mut marks);
                b += 1;
            }
        }

        let mut table = TransitionTable::with_states(self.alphabet.size(), blocks.sets);
        let mut block_outputs = vec![0; blocks.sets];
        for set in 0..blocks.sets {
            block_outputs[set] = outputs[blocks.elements[blocks.first[set]]];
        }
        for t in 0..m {
            let tail = edges.tails[t];
            let set = blocks.set_of[tail];
            if blocks.elements[blocks.first[set]] == tail {
                let head = blocks.set_of[edges.heads[t]];
                *table.get_transition_mut(set as StateId, edges.labels[t]) = Transition::simple(head as StateId);
            }
        }
        self.initial = blocks.set_of[index[self.initial as usize]] as StateId;
        self.outputs = block_outputs;
        self.table = table;
        self.canonized = false;
        self.canonize();

        tracing::debug!(
            states_before,
            states = self.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "minimized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{machine_1d, word};
    use super::*;

    #[test]
    fn test_minimize_one_then_anything() {
        /*
            accepts 1(0|1)*, with a redundant accepting copy

            s0 -1-> s1 -0-> s2 -0,1-> s2
                     \-1-> s1
         */
        let mut m = machine_1d(&[0, 1], vec![0, 1, 1], &[(0, 1, 1), (1, 0, 2), (1, 1, 1), (2, 0, 2), (2, 1, 2)]);
        m.minimize();
        assert_eq!(m.n_states(), 2);
        assert!(m.accepts(&word(&[1, 0])).unwrap());
        assert!(m.accepts(&word(&[1, 1])).unwrap());
        assert!(!m.accepts(&word(&[0])).unwrap());
        assert!(!m.accepts(&word(&[0, 1])).unwrap());
        assert!(m.is_canonized());
        assert_eq!(m.initial(), 0);
    }

    #[test]
    fn test_minimize_idempotent() {
        let mut m = machine_1d(
            &[0, 1],
            vec![0, 1, 0, 1],
            &[(0, 0, 1), (0, 1, 2), (1, 0, 3), (1, 1, 0), (2, 0, 3), (2, 1, 0), (3, 0, 1), (3, 1, 2)],
        );
        m.minimize();
        let n = m.n_states();
        m.minimize();
        assert_eq!(m.n_states(), n);
    }

    #[test]
    fn test_minimize_drops_dead_states() {
        let mut m = machine_1d(&[0, 1], vec![0, 1, 0], &[(0, 0, 1), (0, 1, 2), (2, 0, 2), (2, 1, 2)]);
        m.minimize();
        assert_eq!(m.n_states(), 2);
        assert!(m.accepts(&word(&[0])).unwrap());
        assert!(!m.accepts(&word(&[1])).unwrap());
    }

    #[test]
    fn test_minimize_empty_language() {
        let mut m = machine_1d(&[0, 1], vec![0, 0], &[(0, 0, 1), (1, 1, 0)]);
        m.minimize();
        assert_eq!(m.n_states(), 1);
        assert!(m.is_empty());
    }

    #[test]
    fn test_minimize_keeps_outputs() {
        /*
            Thue–Morse parity: output 2 after an odd number of ones, 3 otherwise,
            with a duplicated odd state
         */
        let mut m = machine_1d(
            &[0, 1],
            vec![3, 2, 2],
            &[(0, 0, 0), (0, 1, 1), (1, 0, 2), (1, 1, 0), (2, 0, 1), (2, 1, 0)],
        );
        m.minimize();
        assert_eq!(m.n_states(), 2);
        assert_eq!(m.output(&word(&[1, 0, 0])).unwrap(), 2);
        assert_eq!(m.output(&word(&[1, 0, 1])).unwrap(), 3);
    }

    #[test]
    fn test_minimize_nondeterministic() {
        let mut m = machine_1d(&[0, 1], vec![0, 1], &[(0, 0, 0), (0, 1, 0), (0, 1, 1)]);
        m.minimize();
        assert!(m.table().is_deterministic());
        assert_eq!(m.n_states(), 2);
        assert!(m.accepts(&word(&[0, 1])).unwrap());
        assert!(!m.accepts(&word(&[1, 0])).unwrap());
    }
}
