use std::fs::File;
use std::io::Write;
use std::path::Path;

use itertools::Itertools;

use super::{Automaton, Machine};
use crate::common::StateId;
use crate::error::Result;

impl Machine {
    /// A rejecting state other than the initial one that only loops on itself.
    fn sink(&self) -> Option<StateId> {
        (0..self.n_states() as StateId).find(|s| {
            *s != self.initial
                && self.outputs[*s as usize] == 0
                && self.table.get_state(*s).iter().all(|t| t.is_simple(*s))
        })
    }

    pub fn write_dot<W: Write>(&mut self, out: &mut W, remove_sink: bool) -> Result<()> {
        self.canonize();
        let sink = if remove_sink { self.sink() } else { None };
        let boolean = self.is_boolean();

        writeln!(out, "digraph G {{")?;
        writeln!(out, "rankdir = LR;")?;
        writeln!(out, "init [shape=point]")?;
        for (i, output) in self.outputs.iter().enumerate() {
            if Some(i as StateId) == sink {
                continue;
            }
            let shape = if *output != 0 { "doublecircle" } else { "circle" };
            let label = if boolean {
                i.to_string()
            } else {
                format!("{}/{}", i, output)
            };
            writeln!(out, "s{}[label=\"{}\",shape={}]", i, label, shape)?;
        }
        writeln!(out, "init -> s{}", self.initial)?;

        let symbol_strings: Vec<String> = (0..self.alphabet.size())
            .map(|symbol| match self.alphabet.decode(symbol).as_slice() {
                [value] => value.to_string(),
                values => format!("[{}]", values.iter().join(",")),
            })
            .collect();
        let mut pairs = Vec::new();
        for (i, row) in self.table.states().enumerate() {
            if Some(i as StateId) == sink {
                continue;
            }
            pairs.clear();
            for (symbol, target) in row.iter().enumerate() {
                for j in &target.states {
                    if Some(*j) != sink {
                        pairs.push((*j, symbol));
                    }
                }
            }
            pairs.sort_unstable();
            for (target, symbols) in &pairs.iter().group_by(|p| p.0) {
                let label = symbols.map(|p| &symbol_strings[p.1]).join(", ");
                writeln!(out, "s{} -> s{} [label=\"{}\"]", i, target, label)?;
            }
        }
        writeln!(out, "}}")?;
        Ok(())
    }
}

impl Automaton {
    /// Writes a GraphViz digraph; the trivial automata are a single state.
    pub fn write_dot<W: Write>(&mut self, out: &mut W, remove_sink: bool) -> Result<()> {
        match self {
            Automaton::Trivial(value) => {
                let shape = if *value { "doublecircle" } else { "circle" };
                writeln!(out, "digraph G {{\ninit [shape=point]\ns0[label=\"{}\",shape={}]\ninit -> s0\n}}", value, shape)?;
                Ok(())
            }
            Automaton::Machine(m) => m.write_dot(out, remove_sink),
        }
    }

    pub fn write_dot_file<P: AsRef<Path>>(&mut self, path: P, remove_sink: bool) -> Result<()> {
        let mut file = File::create(path)?;
        self.write_dot(&mut file, remove_sink)
    }
}
