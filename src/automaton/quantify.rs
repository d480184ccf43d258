use std::time::Instant;

use super::{Automaton, Machine};
use crate::common::{Name, StateId, StateSet};
use crate::error::{Error, Result};

enum Orientation {
    Msd,
    Lsd,
}

impl Machine {
    /// The shared orientation of the coordinates, if all of them are
    /// arithmetic and agree.
    fn orientation(&self) -> Option<Orientation> {
        let mut msd = None;
        for numeration in &self.numerations {
            let n = numeration.as_ref()?.is_msd();
            match msd {
                Some(m) if m != n => return None,
                _ => msd = Some(n),
            }
        }
        match msd? {
            true => Some(Orientation::Msd),
            false => Some(Orientation::Lsd),
        }
    }

    /// Drops the coordinates at `indices`; transitions that become identical
    /// are merged.
    fn project(&mut self, indices: &[usize]) {
        let (alphabet, projection) = self.alphabet.remove_coords(indices);
        let map: Vec<_> = projection.into_iter().map(Some).collect();
        self.table = self.table.remap_symbols(alphabet.size(), &map);
        self.alphabet = alphabet;
        let mut i = 0;
        self.labels.retain(|_| {
            i += 1;
            !indices.contains(&(i - 1))
        });
        let mut i = 0;
        self.numerations.retain(|_| {
            i += 1;
            !indices.contains(&(i - 1))
        });
        self.canonized = false;
    }

    /// Makes `0x` read like `x` by letting the initial state absorb leading
    /// all-zero symbols.
    pub(crate) fn fix_leading_zeros(&mut self) {
        let zero = match self.alphabet.zero_symbol() {
            Some(zero) => zero,
            None => return,
        };
        let start = Instant::now();
        self.table.get_transition_mut(self.initial, zero).insert(self.initial);
        let init = self.closure(self.initial, zero);
        self.determinize_from(init);
        self.minimize();
        tracing::debug!(
            states = self.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fixed leading zeros"
        );
    }

    /// Makes `x0` read like `x`: a state from which all-zero symbols lead to
    /// an accepting state becomes accepting.
    pub(crate) fn fix_trailing_zeros(&mut self) {
        let zero = match self.alphabet.zero_symbol() {
            Some(zero) => zero,
            None => return,
        };
        let start = Instant::now();
        let mut changed = true;
        while changed {
            changed = false;
            for q in 0..self.n_states() {
                if self.outputs[q] != 0 {
                    continue;
                }
                let reaches = self
                    .table
                    .get_transition(q as StateId, zero)
                    .states
                    .iter()
                    .any(|d| self.outputs[*d as usize] != 0);
                if reaches {
                    self.outputs[q] = 1;
                    changed = true;
                }
            }
        }
        self.canonized = false;
        self.minimize();
        tracing::debug!(
            states = self.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fixed trailing zeros"
        );
    }

    fn label_indices(&self, labels: &[Name]) -> Result<Vec<usize>> {
        if !self.is_bound() {
            return Err(Error::Unbound("quantifying over unlabeled coordinates".to_string()));
        }
        let mut indices = Vec::with_capacity(labels.len());
        for label in labels {
            let i = self
                .labels
                .iter()
                .position(|l| l == label)
                .ok_or_else(|| Error::Unbound(format!("{} is not a free variable", label)))?;
            if !indices.contains(&i) {
                indices.push(i);
            }
        }
        Ok(indices)
    }
}

impl Automaton {
    /// Existential quantification over the coordinates with the given labels.
    ///
    /// Quantifying every coordinate leaves the true automaton if the language
    /// was nonempty, the false one otherwise. When all remaining coordinates
    /// are numbers read in the same direction, the result is fixed so that
    /// zero padding does not change acceptance.
    pub fn quantify<N: Into<Name> + Clone>(&mut self, labels: &[N]) -> Result<()> {
        let labels: Vec<Name> = labels.iter().cloned().map(Into::into).collect();
        let m = match self {
            Automaton::Trivial(_) => return Ok(()),
            Automaton::Machine(m) => m,
        };
        if labels.is_empty() {
            return Ok(());
        }
        let start = Instant::now();
        let states_before = m.n_states();
        let indices = m.label_indices(&labels)?;
        if indices.len() == m.arity() {
            *self = Automaton::Trivial(!m.is_empty());
            return Ok(());
        }
        m.project(&indices);
        m.minimize();
        match m.orientation() {
            Some(Orientation::Msd) => m.fix_leading_zeros(),
            Some(Orientation::Lsd) => m.fix_trailing_zeros(),
            None => {}
        }
        tracing::debug!(
            states_before,
            states = m.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "quantified"
        );
        Ok(())
    }

    /// Universal quantification: `not exists not`.
    pub fn forall<N: Into<Name> + Clone>(&mut self, labels: &[N]) -> Result<()> {
        self.not()?;
        self.quantify(labels)?;
        self.not()
    }

    /// States reachable from the initial state reading only all-zero symbols.
    pub fn zero_closure(&self) -> Option<StateSet> {
        let m = self.as_machine()?;
        let zero = m.alphabet.zero_symbol()?;
        Some(m.closure(m.initial, zero))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::alphabet::Alphabet;
    use crate::automaton::Numeration;
    use crate::table::{Transition, TransitionTable};

    fn numeration(msd: bool) -> Option<Rc<Numeration>> {
        let name = if msd { "msd_2" } else { "lsd_2" };
        Some(Rc::new(Numeration::new(name.to_string(), msd, None)))
    }

    /// Over (x, y) in {0,1}^2, accepts exactly the two-letter word `ab`.
    fn two_letters(msd: bool, a: [i32; 2], b: [i32; 2]) -> Automaton {
        let alphabet = Alphabet::new(vec![vec![0, 1], vec![0, 1]]).unwrap();
        let mut table = TransitionTable::with_states(alphabet.size(), 3);
        let a = alphabet.encode(&a).unwrap();
        let b = alphabet.encode(&b).unwrap();
        *table.get_transition_mut(0, a) = Transition::simple(1);
        *table.get_transition_mut(1, b) = Transition::simple(2);
        let mut m = Machine::new(alphabet, vec![numeration(msd), numeration(msd)], vec![0, 0, 1], table, 0).unwrap();
        m.set_labels(vec![Name::from("x"), Name::from("y")]);
        Automaton::Machine(m)
    }

    /// x = 2 and y = 0, both unpadded.
    fn x_is_two(msd: bool) -> Automaton {
        if msd {
            two_letters(true, [1, 0], [0, 0])
        } else {
            two_letters(false, [0, 0], [1, 0])
        }
    }

    #[test]
    fn test_quantify_all_is_trivial() {
        let mut a = x_is_two(true);
        a.quantify(&["x", "y"]).unwrap();
        assert!(matches!(a, Automaton::Trivial(true)));
    }

    #[test]
    fn test_quantify_unknown_label() {
        let mut a = x_is_two(true);
        assert!(matches!(a.quantify(&["z"]), Err(Error::Unbound(_))));
    }

    #[test]
    fn test_leading_zero_fixup() {
        // exists y: x = 2 & y = 0; the word "10" must also be read as "010"
        let mut a = x_is_two(true);
        a.quantify(&["y"]).unwrap();
        assert_eq!(a.arity(), 1);
        for w in &[vec![1, 0], vec![0, 1, 0], vec![0, 0, 0, 1, 0]] {
            let w: Vec<Vec<i32>> = w.iter().map(|d| vec![*d]).collect();
            assert!(a.accepts(&w).unwrap());
        }
        assert!(!a.accepts(&[vec![1]]).unwrap());
    }

    #[test]
    fn test_trailing_zero_fixup() {
        // exists y: x = 1 & y = 2 in lsd; the only witness pads x to "10",
        // and the unpadded "1" must be accepted as well
        let mut a = two_letters(false, [1, 0], [0, 1]);
        a.quantify(&["y"]).unwrap();
        assert_eq!(a.arity(), 1);
        assert!(a.accepts(&[vec![1]]).unwrap());
        assert!(a.accepts(&[vec![1], vec![0]]).unwrap());
        assert!(!a.accepts(&[vec![0]]).unwrap());
        assert!(!a.accepts(&[vec![1], vec![1]]).unwrap());
    }

    #[test]
    fn test_zero_closure() {
        let a = x_is_two(true);
        assert_eq!(a.zero_closure().unwrap().inner(), &[0]);
    }
}
