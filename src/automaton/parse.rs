//! Text format of automata.
//!
//! ```text
//! msd_2 {0, 1, 2}
//!
//! 0 0
//! 0 * -> 0
//! 1 2 -> 1
//!
//! 1 1
//! 0 0 -> 0 1
//! ```
//!
//! The first line declares the coordinates, each either a set of integers or
//! the name of a numeration system. Then every state is declared as
//! `<state> <output>`, followed by its transitions `<tuple> -> <states>`
//! where `*` matches every value of its coordinate. The first declared state
//! is the initial one. A file holding only `true` or `false` is one of the
//! trivial automata.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use hashbrown::HashMap;
use itertools::Itertools;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{char, space0, space1};
use nom::combinator::{map, verify};
use nom::multi::{many1, separated_list};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};

use super::{Automaton, Machine, Numeration};
use crate::alphabet::{Alphabet, Symbol};
use crate::common::StateId;
use crate::error::{Error, Result};
use crate::numeration::Registry;
use crate::parser::{integer, natural, parse_line, NomResult};
use crate::table::TransitionTable;

#[derive(Debug, PartialEq)]
enum Coordinate {
    Values(Vec<i32>),
    System(String),
}

/// Expands the short forms `msd`, `lsd5`, `fib` into full system names.
fn system_name(token: &str) -> String {
    if token == "msd" || token == "lsd" {
        return format!("{}_2", token);
    }
    if token.starts_with("msd_") || token.starts_with("lsd_") {
        return token.to_string();
    }
    let (prefix, rest) = token.split_at(token.len().min(3));
    if (prefix == "msd" || prefix == "lsd") && rest.chars().all(|c| c.is_ascii_digit()) {
        return format!("{}_{}", prefix, rest);
    }
    format!("msd_{}", token)
}

fn value_set(input: &str) -> NomResult<Vec<i32>> {
    delimited(
        pair(char('{'), space0),
        separated_list(tuple((space0, char(','), space0)), integer),
        pair(space0, char('}')),
    )(input)
}

fn system_token(input: &str) -> NomResult<String> {
    map(
        verify(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            |s: &str| s.starts_with(|c: char| c.is_ascii_alphabetic()),
        ),
        system_name,
    )(input)
}

fn header(input: &str) -> NomResult<Vec<Coordinate>> {
    many1(terminated(
        alt((map(value_set, Coordinate::Values), map(system_token, Coordinate::System))),
        space0,
    ))(input)
}

fn state(input: &str) -> NomResult<(u64, i32)> {
    map(tuple((natural, space1, integer, space0)), |(s, _, o, _)| (s, o))(input)
}

fn transition(input: &str) -> NomResult<(Vec<Option<i32>>, Vec<u64>)> {
    map(
        tuple((
            many1(terminated(alt((map(integer, Some), map(char('*'), |_| None))), space0)),
            preceded(tag("->"), many1(preceded(space0, natural))),
            space0,
        )),
        |(tuple, dests, _)| (tuple, dests),
    )(input)
}

struct PendingTransition {
    line: usize,
    from: StateId,
    symbols: Vec<Symbol>,
    dests: Vec<u64>,
}

impl Automaton {
    /// Reads an automaton in the text format. Numeration systems named in the
    /// header are looked up in `registry`.
    pub fn parse(text: &str, registry: &mut Registry) -> Result<Automaton> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        let (header_line, first) = lines.next().ok_or_else(|| Error::parse(1, "empty automaton description"))?;
        if first == "true" || first == "false" {
            if let Some((line, _)) = lines.next() {
                return Err(Error::parse(line, "unexpected content after a true/false automaton"));
            }
            return Ok(Automaton::Trivial(first == "true"));
        }

        let mut coords = Vec::new();
        let mut numerations: Vec<Option<Rc<Numeration>>> = Vec::new();
        for coordinate in parse_line(header, first, header_line)? {
            match coordinate {
                Coordinate::Values(values) => {
                    coords.push(values);
                    numerations.push(None);
                }
                Coordinate::System(name) => {
                    let system = registry.get(&name)?;
                    coords.push(system.alphabet().to_vec());
                    numerations.push(Some(system.numeration()));
                }
            }
        }
        let alphabet = Alphabet::new(coords).map_err(|e| Error::parse(header_line, e.to_string()))?;

        let mut ids: HashMap<u64, StateId> = HashMap::new();
        let mut outputs = Vec::new();
        let mut pending = Vec::new();
        for (line, text) in lines {
            if text.contains("->") {
                let (tuple, dests) = parse_line(transition, text, line)?;
                let from = match outputs.len() {
                    0 => return Err(Error::parse(line, "transition before any state")),
                    n => (n - 1) as StateId,
                };
                let symbols = alphabet
                    .expand_wildcards(&tuple)
                    .map_err(|e| Error::parse(line, e.to_string()))?;
                pending.push(PendingTransition {
                    line,
                    from,
                    symbols,
                    dests,
                });
            } else {
                let (name, output) = parse_line(state, text, line)?;
                if ids.insert(name, outputs.len() as StateId).is_some() {
                    return Err(Error::parse(line, format!("state {} is declared twice", name)));
                }
                outputs.push(output);
            }
        }
        if outputs.is_empty() {
            return Err(Error::parse(header_line, "no state is declared"));
        }

        let mut table = TransitionTable::with_states(alphabet.size(), outputs.len());
        for t in pending {
            for dest in &t.dests {
                let to = *ids
                    .get(dest)
                    .ok_or_else(|| Error::parse(t.line, format!("state {} is not declared", dest)))?;
                for symbol in &t.symbols {
                    table.get_transition_mut(t.from, *symbol).insert(to);
                }
            }
        }
        let machine = Machine::new(alphabet, numerations, outputs, table, 0)
            .map_err(|e| Error::parse(header_line, e.to_string()))?;
        Ok(Automaton::Machine(machine))
    }

    pub fn from_file<P: AsRef<Path>>(path: P, registry: &mut Registry) -> Result<Automaton> {
        let content = fs::read_to_string(path)?;
        Automaton::parse(&content, registry)
    }

    /// Writes the canonized automaton in the text format.
    pub fn write<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let m = match self {
            Automaton::Trivial(value) => {
                writeln!(out, "{}", value)?;
                return Ok(());
            }
            Automaton::Machine(m) => m,
        };
        m.canonize();
        let header = m
            .alphabet
            .coords()
            .iter()
            .zip(m.numerations.iter())
            .map(|(values, numeration)| match numeration {
                Some(n) => n.name().to_string(),
                None => format!("{{{}}}", values.iter().join(", ")),
            })
            .join(" ");
        writeln!(out, "{}", header)?;
        for (q, row) in m.table.states().enumerate() {
            writeln!(out)?;
            writeln!(out, "{} {}", q, m.outputs[q])?;
            for (symbol, tr) in row.iter().enumerate() {
                if tr.is_empty() {
                    continue;
                }
                writeln!(
                    out,
                    "{} -> {}",
                    m.alphabet.decode(symbol).iter().join(" "),
                    tr.states.iter().join(" ")
                )?;
            }
        }
        Ok(())
    }

    pub fn write_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let mut file = fs::File::create(path)?;
        self.write(&mut file)
    }

    pub fn to_text(&mut self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
