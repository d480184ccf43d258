//! Numeration systems: how natural numbers are written as words, and the
//! automata for addition, order and equality that define arithmetic on them.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use hashbrown::HashMap;

use crate::alphabet::{same_values, Alphabet};
use crate::automaton::{Automaton, Machine, Numeration};
use crate::common::StateId;
use crate::error::{Error, Result};
use crate::regex::MAX_SYMBOLS;
use crate::table::{Transition, TransitionTable};

pub use self::registry::Registry;
pub use self::synth::{ArithOp, Operand};

mod registry;
mod synth;

pub struct NumberSystem {
    numeration: Rc<Numeration>,
    alphabet: Vec<i32>,
    /// (a, b, c) with c = a + b
    addition: Automaton,
    /// (a, b) with a < b
    less_than: Automaton,
    equality: Automaton,
    constants: RefCell<HashMap<u64, Automaton>>,
    multiplications: RefCell<HashMap<u64, Automaton>>,
    divisions: RefCell<HashMap<u64, Automaton>>,
}

fn split_name(name: &str) -> Option<(bool, &str)> {
    let (prefix, base) = name.split_once('_')?;
    match prefix {
        "msd" => Some((true, base)),
        "lsd" => Some((false, base)),
        _ => None,
    }
}

/// Loads `<name><suffix>`, or the reversed `<complement><suffix>`.
fn load_library(
    registry: &mut Registry,
    name: &str,
    complement: &str,
    suffix: &str,
) -> Result<Option<Automaton>> {
    let direct: Option<PathBuf> = registry.config().custom_base_file(&format!("{}{}", name, suffix));
    if let Some(path) = direct {
        return Ok(Some(Automaton::from_file(path, registry)?));
    }
    let reversed: Option<PathBuf> = registry.config().custom_base_file(&format!("{}{}", complement, suffix));
    if let Some(path) = reversed {
        let mut automaton = Automaton::from_file(path, registry)?;
        automaton.reverse()?;
        return Ok(Some(automaton));
    }
    Ok(None)
}

fn tag_all(automaton: &mut Automaton, numeration: &Rc<Numeration>) -> Result<()> {
    let m = automaton.machine_mut()?;
    for n in m.numerations.iter_mut() {
        *n = Some(numeration.clone());
    }
    Ok(())
}

/// Two-state carry automaton of base-`n` addition, most significant digit first.
/// State `c` expects the digits read so far to carry `c` out of the current
/// position; the next state is the carry coming in from below.
fn base_addition(n: i32, numeration: &Rc<Numeration>) -> Result<Machine> {
    let symbols = (n as usize).checked_pow(3).filter(|s| *s <= MAX_SYMBOLS);
    if symbols.is_none() {
        return Err(Error::Encoding(format!(
            "the addition of base {} needs more than {} symbols",
            n, MAX_SYMBOLS
        )));
    }
    let digits: Vec<i32> = (0..n).collect();
    let alphabet = Alphabet::new(vec![digits.clone(), digits.clone(), digits])?;
    let mut table = TransitionTable::with_states(alphabet.size(), 2);
    for a in 0..n {
        for b in 0..n {
            for s in 0..n {
                let symbol = alphabet.encode(&[a, b, s])?;
                for carry_out in 0..2 {
                    for carry_in in 0..2 {
                        if a + b + carry_in == s + n * carry_out {
                            table
                                .get_transition_mut(carry_out as StateId, symbol)
                                .insert(carry_in as StateId);
                        }
                    }
                }
            }
        }
    }
    Machine::new(alphabet, vec![Some(numeration.clone()); 3], vec![1, 0], table, 0)
}

/// Lexicographic order of words over the sorted alphabet, most significant
/// digit first.
fn lexicographic_less_than(alphabet: &[i32], numeration: &Rc<Numeration>) -> Result<Machine> {
    let mut sorted = alphabet.to_vec();
    sorted.sort_unstable();
    let alphabet = Alphabet::new(vec![sorted.clone(), sorted.clone()])?;
    let mut table = TransitionTable::with_states(alphabet.size(), 2);
    for (i, a) in sorted.iter().enumerate() {
        for (j, b) in sorted.iter().enumerate() {
            let symbol = alphabet.encode(&[*a, *b])?;
            if i == j {
                *table.get_transition_mut(0, symbol) = Transition::simple(0);
            } else if i < j {
                *table.get_transition_mut(0, symbol) = Transition::simple(1);
            }
            *table.get_transition_mut(1, symbol) = Transition::simple(1);
        }
    }
    Machine::new(alphabet, vec![Some(numeration.clone()); 2], vec![0, 1], table, 0)
}

fn diagonal(alphabet: &[i32], numeration: &Rc<Numeration>) -> Result<Machine> {
    let alphabet = Alphabet::new(vec![alphabet.to_vec(), alphabet.to_vec()])?;
    let mut table = TransitionTable::with_states(alphabet.size(), 1);
    for v in alphabet.coord(0).to_vec() {
        *table.get_transition_mut(0, alphabet.encode(&[v, v])?) = Transition::simple(0);
    }
    Machine::new(alphabet, vec![Some(numeration.clone()); 2], vec![1], table, 0)
}

impl NumberSystem {
    /// Builds the system `msd_<base>` or `lsd_<base>` from the custom bases
    /// directory, falling back to plain base-k arithmetic for numeric bases.
    pub(crate) fn load(name: &str, registry: &mut Registry) -> Result<NumberSystem> {
        let start = Instant::now();
        let undefined = || Error::UndefinedNumberSystem(name.to_string());
        let (msd, base) = split_name(name).ok_or_else(undefined)?;
        let complement = format!("{}_{}", if msd { "lsd" } else { "msd" }, base);

        let all_representations = load_library(registry, name, &complement, ".txt")?;
        let numeration = Rc::new(Numeration::new(name.to_string(), msd, all_representations));

        let mut addition = match load_library(registry, name, &complement, "_addition.txt")? {
            Some(automaton) => automaton,
            None => {
                let n: i32 = base.parse().ok().filter(|n| *n > 1).ok_or_else(undefined)?;
                let mut automaton = Automaton::Machine(base_addition(n, &numeration)?);
                if !msd {
                    automaton.reverse()?;
                }
                automaton
            }
        };
        let alphabet = {
            let m = addition.machine().map_err(|_| undefined())?;
            if m.arity() != 3 {
                return Err(Error::InvalidOperation(format!("the addition of {} must have 3 inputs", name)));
            }
            let first = m.alphabet().coord(0).to_vec();
            if !first.contains(&0) || !first.contains(&1) {
                return Err(Error::InvalidOperation(format!("the digits of {} must include 0 and 1", name)));
            }
            if !m.alphabet().coords().iter().all(|c| same_values(c, &first)) {
                return Err(Error::InvalidOperation(format!(
                    "all inputs of the addition of {} must have the same alphabet",
                    name
                )));
            }
            first
        };
        tag_all(&mut addition, &numeration)?;

        let mut less_than = match load_library(registry, name, &complement, "_less_than.txt")? {
            Some(automaton) => automaton,
            None => {
                let mut automaton = Automaton::Machine(lexicographic_less_than(&alphabet, &numeration)?);
                if !msd {
                    automaton.reverse()?;
                }
                automaton
            }
        };
        {
            let m = less_than.machine().map_err(|_| undefined())?;
            if m.arity() != 2 || !m.alphabet().coords().iter().all(|c| same_values(c, &alphabet)) {
                return Err(Error::InvalidOperation(format!(
                    "the less-than of {} must have 2 inputs over the digits of its addition",
                    name
                )));
            }
        }
        tag_all(&mut less_than, &numeration)?;

        let mut equality = Automaton::Machine(diagonal(&alphabet, &numeration)?);

        for automaton in [&mut addition, &mut less_than, &mut equality] {
            automaton.machine_mut()?.apply_all_representations()?;
        }

        tracing::debug!(
            system = name,
            addition = addition.n_states(),
            less_than = less_than.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded number system"
        );
        Ok(NumberSystem {
            numeration,
            alphabet,
            addition,
            less_than,
            equality,
            constants: RefCell::new(HashMap::new()),
            multiplications: RefCell::new(HashMap::new()),
            divisions: RefCell::new(HashMap::new()),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.numeration.name()
    }

    #[inline]
    pub fn is_msd(&self) -> bool {
        self.numeration.is_msd()
    }

    pub fn numeration(&self) -> Rc<Numeration> {
        self.numeration.clone()
    }

    /// The digits of the system.
    #[inline]
    pub fn alphabet(&self) -> &[i32] {
        &self.alphabet
    }

    pub fn addition(&self) -> &Automaton {
        &self.addition
    }

    pub fn less_than(&self) -> &Automaton {
        &self.less_than
    }

    pub fn equality(&self) -> &Automaton {
        &self.equality
    }

    /// Two-state automaton over the digits from its `(from, digit, to)` edges.
    fn digits_automaton(&self, edges: &[(StateId, i32, StateId)], outputs: [i32; 2]) -> Result<Automaton> {
        let alphabet = Alphabet::new(vec![self.alphabet.clone()])?;
        let mut table = TransitionTable::with_states(alphabet.size(), 2);
        for (from, digit, to) in edges {
            *table.get_transition_mut(*from, alphabet.encode(&[*digit])?) = Transition::simple(*to);
        }
        let mut m = Machine::new(alphabet, vec![Some(self.numeration())], outputs.to_vec(), table, 0)?;
        m.minimize();
        Ok(Automaton::Machine(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Name;

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("msd_10"), Some((true, "10")));
        assert_eq!(split_name("lsd_fib"), Some((false, "fib")));
        assert_eq!(split_name("msd10"), None);
        assert_eq!(split_name("xsd_2"), None);
    }

    #[test]
    fn test_base_addition_msd() {
        let mut registry = Registry::default();
        let ns = registry.get("msd_2").unwrap();
        let mut add = ns.addition().clone();
        add.bind(&["a", "b", "c"]).unwrap();
        assert!(add.accepts_values(&[("a", 3), ("b", 5), ("c", 8)]).unwrap());
        assert!(!add.accepts_values(&[("a", 3), ("b", 5), ("c", 9)]).unwrap());
        assert!(add.accepts_values(&[("a", 0), ("b", 0), ("c", 0)]).unwrap());
    }

    #[test]
    fn test_base_addition_lsd() {
        let mut registry = Registry::default();
        let ns = registry.get("lsd_3").unwrap();
        assert!(!ns.is_msd());
        assert_eq!(ns.alphabet(), &[0, 1, 2]);
        let mut add = ns.addition().clone();
        add.bind(&["a", "b", "c"]).unwrap();
        assert!(add.accepts_values(&[("a", 17), ("b", 25), ("c", 42)]).unwrap());
        assert!(!add.accepts_values(&[("a", 17), ("b", 25), ("c", 41)]).unwrap());
    }

    #[test]
    fn test_base_too_large() {
        let mut registry = Registry::default();
        assert!(matches!(registry.get("msd_1000"), Err(Error::Encoding(_))));
        assert!(!registry.is_loaded("msd_1000"));
        assert!(registry.get("msd_16").is_ok());
    }

    #[test]
    fn test_less_than_and_equality() {
        let mut registry = Registry::default();
        for name in &["msd_2", "lsd_2", "msd_10"] {
            let ns = registry.get(name).unwrap();
            let mut lt = ns.less_than().clone();
            lt.bind(&["a", "b"]).unwrap();
            assert!(lt.accepts_values(&[("a", 2), ("b", 3)]).unwrap(), "{}", name);
            assert!(!lt.accepts_values(&[("a", 3), ("b", 2)]).unwrap(), "{}", name);
            assert!(!lt.accepts_values(&[("a", 3), ("b", 3)]).unwrap(), "{}", name);
            let mut eq = ns.equality().clone();
            eq.bind(&[Name::from("a"), Name::from("b")]).unwrap();
            assert!(eq.accepts_values(&[("a", 7), ("b", 7)]).unwrap());
            assert!(!eq.accepts_values(&[("a", 7), ("b", 6)]).unwrap());
        }
    }

    #[test]
    fn test_custom_system_from_files() {
        let dir = std::env::temp_dir().join("numaut-custom-bases");
        std::fs::create_dir_all(&dir).unwrap();
        let addition = "{0,1} {0,1} {0,1}\n\
                        0 1\n0 0 0 -> 0\n0 1 1 -> 0\n1 0 1 -> 0\n0 0 1 -> 1\n\
                        1 0\n1 1 0 -> 0\n0 1 0 -> 1\n1 0 0 -> 1\n1 1 1 -> 1\n";
        std::fs::write(dir.join("msd_two_addition.txt"), addition).unwrap();
        std::fs::write(dir.join("msd_two.txt"), "{0,1}\n0 1\n* -> 0\n").unwrap();
        let mut registry = Registry::new(crate::config::Config::with_custom_bases(&dir));

        let ns = registry.get("msd_two").unwrap();
        assert!(ns.numeration().all_representations().is_some());
        // 3 + 7 = 10
        let sum = vec![vec![0, 0, 1], vec![0, 1, 0], vec![1, 1, 1], vec![1, 1, 0]];
        assert!(ns.addition().accepts(&sum).unwrap());
        assert!(!ns.addition().accepts(&sum[1..]).unwrap());
        assert!(ns.less_than().accepts(&[vec![0, 1], vec![1, 0]]).unwrap());

        // the lsd system is read from the same files, reversed
        let lsd = registry.get("lsd_two").unwrap();
        let reversed: Vec<Vec<i32>> = sum.iter().rev().cloned().collect();
        assert!(lsd.addition().accepts(&reversed).unwrap());
        assert!(!lsd.addition().accepts(&sum).unwrap());
    }

    #[test]
    fn test_representations_restrict_results() {
        let dir = std::env::temp_dir().join("numaut-no-double-one");
        std::fs::create_dir_all(&dir).unwrap();
        let addition = "{0,1} {0,1} {0,1}\n\
                        0 1\n0 0 0 -> 0\n0 1 1 -> 0\n1 0 1 -> 0\n0 0 1 -> 1\n\
                        1 0\n1 1 0 -> 0\n0 1 0 -> 1\n1 0 0 -> 1\n1 1 1 -> 1\n";
        std::fs::write(dir.join("msd_fibish_addition.txt"), addition).unwrap();
        // words without two consecutive ones
        std::fs::write(dir.join("msd_fibish.txt"), "{0,1}\n0 1\n0 -> 0\n1 -> 1\n1 1\n0 -> 0\n").unwrap();
        let mut registry = Registry::new(crate::config::Config::with_custom_bases(&dir));

        let ns = registry.get("msd_fibish").unwrap();
        // 1 + 1 = 2 is written without "11", 1 + 2 = 3 is not
        assert!(ns.addition().accepts(&[vec![0, 0, 1], vec![1, 1, 0]]).unwrap());
        assert!(!ns.addition().accepts(&[vec![0, 1, 1], vec![1, 0, 1]]).unwrap());
        assert!(!ns.less_than().accepts(&[vec![1, 1], vec![0, 1], vec![0, 0]]).unwrap());

        let starts_with_zero = "msd_fibish\n0 0\n0 -> 1\n1 1\n* -> 1\n";
        let starts_with_one = "msd_fibish\n0 0\n1 -> 1\n1 1\n* -> 1\n";
        let w = |digits: &[i32]| -> Vec<Vec<i32>> { digits.iter().map(|d| vec![*d]).collect() };

        let mut not = Automaton::parse(starts_with_zero, &mut registry).unwrap();
        not.not().unwrap();
        assert!(not.accepts(&w(&[1, 0, 1])).unwrap());
        assert!(!not.accepts(&w(&[1, 1])).unwrap());
        assert!(!not.accepts(&w(&[1, 0, 1, 1])).unwrap());

        let a = Automaton::parse(starts_with_zero, &mut registry).unwrap().bound(&["x"]).unwrap();
        let b = Automaton::parse(starts_with_one, &mut registry).unwrap().bound(&["x"]).unwrap();
        let or = a.or(b).unwrap();
        assert!(or.accepts(&w(&[0, 1, 0])).unwrap());
        assert!(or.accepts(&w(&[1, 0, 0, 1])).unwrap());
        assert!(!or.accepts(&w(&[0, 1, 1])).unwrap());
        assert!(!or.accepts(&w(&[1, 1, 0])).unwrap());
    }
}
