//! Regular expressions over the symbols of an alphabet.
//!
//! Over one coordinate the letters are the digits `0`..`9`; over several
//! coordinates a letter is a tuple `[1,0,-1]`. Both forms accept `.` (any
//! letter), `|`, postfix `*`, `+` and `?`, parentheses and `()` for the empty
//! word. Classes such as `[12]`, `[1-3]` and `[^4]` select digits of a
//! one-coordinate alphabet. Letters outside the alphabet match nothing.

use std::rc::Rc;
use std::time::Instant;

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, one_of};
use nom::combinator::{map, opt, verify};
use nom::multi::{many0, many1, separated_nonempty_list};
use nom::sequence::{delimited, pair, separated_pair};

use crate::alphabet::{Alphabet, Symbol};
use crate::automaton::{Automaton, Machine, Numeration};
use crate::common::StateId;
use crate::error::{Error, Result};
use crate::parser::{integer, parse_line, NomResult};
use crate::table::TransitionTable;

/// Largest symbol space a regular expression may range over.
pub const MAX_SYMBOLS: usize = (1 << 16) - 1;

#[derive(Debug, Clone, PartialEq)]
enum Letter {
    Value(i32),
    Any,
    Class { negated: bool, ranges: Vec<(i32, i32)> },
    Tuple(Vec<i32>),
}

#[derive(Debug, Clone, PartialEq)]
enum Regex {
    Epsilon,
    Letter(Letter),
    Concat(Vec<Regex>),
    Alt(Vec<Regex>),
    Star(Box<Regex>),
    Plus(Box<Regex>),
    Optional(Box<Regex>),
}

fn digit(input: &str) -> NomResult<i32> {
    map(one_of("0123456789"), |c: char| c as i32 - '0' as i32)(input)
}

fn class(input: &str) -> NomResult<Letter> {
    let item = alt((separated_pair(digit, char('-'), digit), map(digit, |d| (d, d))));
    map(
        delimited(char('['), pair(opt(char('^')), many1(item)), char(']')),
        |(negated, ranges)| Letter::Class {
            negated: negated.is_some(),
            ranges,
        },
    )(input)
}

fn tuple_letter(input: &str) -> NomResult<Letter> {
    map(
        delimited(
            char('['),
            verify(separated_nonempty_list(char(','), integer), |v: &Vec<i32>| v.len() > 1),
            char(']'),
        ),
        Letter::Tuple,
    )(input)
}

fn atom(input: &str) -> NomResult<Regex> {
    alt((
        map(tag("()"), |_| Regex::Epsilon),
        delimited(char('('), alternation, char(')')),
        map(char('.'), |_| Regex::Letter(Letter::Any)),
        map(tuple_letter, Regex::Letter),
        map(class, Regex::Letter),
        map(digit, |d| Regex::Letter(Letter::Value(d))),
    ))(input)
}

fn repetition(input: &str) -> NomResult<Regex> {
    map(pair(atom, many0(one_of("*+?"))), |(mut regex, ops)| {
        for op in ops {
            regex = match op {
                '*' => Regex::Star(Box::new(regex)),
                '+' => Regex::Plus(Box::new(regex)),
                _ => Regex::Optional(Box::new(regex)),
            };
        }
        regex
    })(input)
}

fn concatenation(input: &str) -> NomResult<Regex> {
    map(many1(repetition), |mut parts| match parts.len() {
        1 => parts.remove(0),
        _ => Regex::Concat(parts),
    })(input)
}

fn alternation(input: &str) -> NomResult<Regex> {
    map(separated_nonempty_list(char('|'), concatenation), |mut options| match options.len() {
        1 => options.remove(0),
        _ => Regex::Alt(options),
    })(input)
}

fn parse_regex(text: &str) -> Result<Regex> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    parse_line(alternation, &compact, 1)
}

/// Symbols of `alphabet` matched by `letter`.
fn resolve(letter: &Letter, alphabet: &Alphabet) -> Result<Vec<Symbol>> {
    let single = |what: &str| -> Result<()> {
        if alphabet.arity() != 1 {
            return Err(Error::Encoding(format!(
                "{} needs a one-coordinate alphabet, got {} coordinates",
                what,
                alphabet.arity()
            )));
        }
        Ok(())
    };
    let symbols = match letter {
        Letter::Any => (0..alphabet.size()).collect(),
        Letter::Value(v) => {
            single("a digit")?;
            alphabet.encode(&[*v]).ok().into_iter().collect()
        }
        Letter::Class { negated, ranges } => {
            single("a character class")?;
            (0..alphabet.size())
                .filter(|s| {
                    let v = alphabet.decode(*s)[0];
                    ranges.iter().any(|(lo, hi)| *lo <= v && v <= *hi) != *negated
                })
                .collect()
        }
        Letter::Tuple(values) => {
            if values.len() != alphabet.arity() {
                return Err(Error::Encoding(format!(
                    "letter of {} values over {} coordinates",
                    values.len(),
                    alphabet.arity()
                )));
            }
            alphabet.encode(values).ok().into_iter().collect()
        }
    };
    Ok(symbols)
}

struct Fragment {
    nullable: bool,
    first: Vec<usize>,
    last: Vec<usize>,
}

/// Position automaton: one state per letter occurrence plus the initial state.
struct Positions<'a> {
    alphabet: &'a Alphabet,
    symbols: Vec<Vec<Symbol>>,
    follow: Vec<Vec<usize>>,
}

impl<'a> Positions<'a> {
    fn add(&mut self, regex: &Regex) -> Result<Fragment> {
        let fragment = match regex {
            Regex::Epsilon => Fragment {
                nullable: true,
                first: Vec::new(),
                last: Vec::new(),
            },
            Regex::Letter(letter) => {
                let position = self.symbols.len();
                self.symbols.push(resolve(letter, self.alphabet)?);
                self.follow.push(Vec::new());
                Fragment {
                    nullable: false,
                    first: vec![position],
                    last: vec![position],
                }
            }
            Regex::Concat(parts) => {
                let mut acc = Fragment {
                    nullable: true,
                    first: Vec::new(),
                    last: Vec::new(),
                };
                for part in parts {
                    let next = self.add(part)?;
                    for l in &acc.last {
                        self.follow[*l].extend_from_slice(&next.first);
                    }
                    if acc.nullable {
                        acc.first.extend_from_slice(&next.first);
                    }
                    acc.last = if next.nullable {
                        acc.last.into_iter().chain(next.last).collect()
                    } else {
                        next.last
                    };
                    acc.nullable &= next.nullable;
                }
                acc
            }
            Regex::Alt(options) => {
                let mut acc = Fragment {
                    nullable: false,
                    first: Vec::new(),
                    last: Vec::new(),
                };
                for option in options {
                    let next = self.add(option)?;
                    acc.nullable |= next.nullable;
                    acc.first.extend(next.first);
                    acc.last.extend(next.last);
                }
                acc
            }
            Regex::Star(inner) | Regex::Plus(inner) => {
                let mut fragment = self.add(inner)?;
                for l in &fragment.last {
                    self.follow[*l].extend_from_slice(&fragment.first);
                }
                if let Regex::Star(_) = regex {
                    fragment.nullable = true;
                }
                fragment
            }
            Regex::Optional(inner) => {
                let mut fragment = self.add(inner)?;
                fragment.nullable = true;
                fragment
            }
        };
        Ok(fragment)
    }
}

fn compile(text: &str, alphabet: Alphabet, numerations: Vec<Option<Rc<Numeration>>>) -> Result<Automaton> {
    let start = Instant::now();
    let regex = parse_regex(text)?;
    let mut positions = Positions {
        alphabet: &alphabet,
        symbols: Vec::new(),
        follow: Vec::new(),
    };
    let fragment = positions.add(&regex)?;
    let Positions { symbols, follow, .. } = positions;

    let n = symbols.len();
    let mut table = TransitionTable::with_states(alphabet.size(), n + 1);
    let mut link = |from: StateId, to: usize| {
        for symbol in &symbols[to] {
            table.get_transition_mut(from, *symbol).insert(to as StateId + 1);
        }
    };
    for p in &fragment.first {
        link(0, *p);
    }
    for (q, next) in follow.iter().enumerate() {
        for p in next {
            link(q as StateId + 1, *p);
        }
    }
    let mut outputs = vec![0; n + 1];
    outputs[0] = fragment.nullable as i32;
    for l in &fragment.last {
        outputs[*l + 1] = 1;
    }

    let mut m = Machine::new(alphabet, numerations, outputs, table, 0)?;
    m.ensure_deterministic();
    m.minimize();
    tracing::debug!(
        regex = text,
        positions = n,
        states = m.n_states(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "compiled regular expression"
    );
    Ok(Automaton::Machine(m))
}

impl Automaton {
    /// One-coordinate automaton of a regular expression over the digits in
    /// `alphabet`, each between 0 and 9.
    pub fn from_regex(regex: &str, alphabet: &[i32], numeration: Option<Rc<Numeration>>) -> Result<Automaton> {
        if alphabet.is_empty() {
            return Err(Error::Encoding("empty alphabet".to_string()));
        }
        if let Some(v) = alphabet.iter().find(|v| !(0..=9).contains(*v)) {
            return Err(Error::Encoding(format!(
                "{} is not a digit; the alphabet of a regular expression must be a subset of 0..9",
                v
            )));
        }
        compile(regex, Alphabet::new(vec![alphabet.to_vec()])?, vec![numeration])
    }

    /// Automaton of a regular expression whose letters are tuples over
    /// several coordinates.
    pub fn from_vector_regex(
        regex: &str,
        coords: Vec<Vec<i32>>,
        numerations: Vec<Option<Rc<Numeration>>>,
    ) -> Result<Automaton> {
        let alphabet = Alphabet::new(coords)?;
        if alphabet.size() > MAX_SYMBOLS {
            return Err(Error::Encoding(format!(
                "alphabet of {} symbols exceeds the limit of {}",
                alphabet.size(),
                MAX_SYMBOLS
            )));
        }
        compile(regex, alphabet, numerations)
    }
}
