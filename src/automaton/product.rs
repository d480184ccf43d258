use std::time::Instant;

use hashbrown::HashMap;

use super::Machine;
use crate::alphabet::{same_values, Alphabet};
use crate::common::StateId;
use crate::error::{Error, Result};
use crate::table::{Transition, TransitionTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
    Xor,
    Imply,
    Iff,
}

impl BoolOp {
    pub fn eval(self, a: bool, b: bool) -> bool {
        match self {
            BoolOp::And => a && b,
            BoolOp::Or => a || b,
            BoolOp::Xor => a != b,
            BoolOp::Imply => !a || b,
            BoolOp::Iff => a == b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Gt,
    Eq,
    Ne,
    Le,
    Ge,
}

impl CompareOp {
    pub fn eval<T: Ord>(self, a: T, b: T) -> bool {
        match self {
            CompareOp::Lt => a < b,
            CompareOp::Gt => a > b,
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Le => a <= b,
            CompareOp::Ge => a >= b,
        }
    }

    /// `a op b` iff `b op.flip() a`.
    pub fn flip(self) -> CompareOp {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Ge => CompareOp::Le,
            op => op,
        }
    }
}

/// How the outputs of a product state are derived from its two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProductOp {
    Bool(BoolOp),
    Compare(CompareOp),
    /// Output `index + 1` where the right operand accepts, the left output otherwise.
    Combine(i32),
}

impl ProductOp {
    fn output(self, left: i32, right: i32) -> i32 {
        match self {
            ProductOp::Bool(op) => op.eval(left != 0, right != 0) as i32,
            ProductOp::Compare(op) => op.eval(left, right) as i32,
            ProductOp::Combine(index) => {
                if right == 1 {
                    index + 1
                } else {
                    left
                }
            }
        }
    }
}

impl Machine {
    /// Product of two labeled automata over their aligned coordinates.
    ///
    /// Coordinates with the same label are unified (their alphabets must hold
    /// the same values); the other coordinates of `other` are appended after
    /// those of `self`. Only pairs reachable from the pair of initial states
    /// become states.
    pub(crate) fn cross_product(&self, other: &Machine, op: ProductOp) -> Result<Machine> {
        let start = Instant::now();
        if !self.is_bound() || !other.is_bound() {
            return Err(Error::Unbound("a product needs labeled coordinates".to_string()));
        }

        // shared[j] = coordinate of self carrying the label of coordinate j of other
        let mut shared: Vec<Option<usize>> = Vec::with_capacity(other.arity());
        for (j, label) in other.labels.iter().enumerate() {
            let i = self.labels.iter().position(|l| l == label);
            if let Some(i) = i {
                if !same_values(self.alphabet.coord(i), other.alphabet.coord(j)) {
                    return Err(Error::Alignment(format!("coordinates labeled {} have different alphabets", label)));
                }
            }
            shared.push(i);
        }

        let mut coords = self.alphabet.coords().to_vec();
        let mut labels = self.labels.clone();
        let mut numerations = self.numerations.clone();
        for (j, s) in shared.iter().enumerate() {
            match s {
                None => {
                    coords.push(other.alphabet.coord(j).to_vec());
                    labels.push(other.labels[j].clone());
                    numerations.push(other.numerations[j].clone());
                }
                Some(i) => {
                    if numerations[*i].is_none() {
                        numerations[*i] = other.numerations[j].clone();
                    }
                }
            }
        }
        let alphabet = Alphabet::new(coords)?;

        // joined[x * |B| + y] = product symbol of (x, y), None if they disagree
        let bsize = other.alphabet.size();
        let mut joined: Vec<Option<usize>> = Vec::with_capacity(self.alphabet.size() * bsize);
        for x in 0..self.alphabet.size() {
            let left = self.alphabet.decode(x);
            for y in 0..bsize {
                let right = other.alphabet.decode(y);
                let mut tuple = left.clone();
                let mut agree = true;
                for (j, s) in shared.iter().enumerate() {
                    match s {
                        Some(i) => agree &= tuple[*i] == right[j],
                        None => tuple.push(right[j]),
                    }
                }
                joined.push(if agree { Some(alphabet.encode(&tuple)?) } else { None });
            }
        }

        let mut table: TransitionTable<Transition> = TransitionTable::with_states(alphabet.size(), 1);
        let mut index: HashMap<(StateId, StateId), StateId> = HashMap::new();
        let mut pairs = vec![(self.initial, other.initial)];
        index.insert((self.initial, other.initial), 0);
        let mut outputs = Vec::new();
        let mut current = 0;
        while current < pairs.len() {
            let (p, q) = pairs[current];
            outputs.push(op.output(self.outputs[p as usize], other.outputs[q as usize]));
            for (x, left) in self.table.get_state(p).iter().enumerate() {
                if left.is_empty() {
                    continue;
                }
                for (y, right) in other.table.get_state(q).iter().enumerate() {
                    if right.is_empty() {
                        continue;
                    }
                    let z = match joined[x * bsize + y] {
                        Some(z) => z,
                        None => continue,
                    };
                    for d1 in &left.states {
                        for d2 in &right.states {
                            let id = match index.get(&(*d1, *d2)) {
                                Some(id) => *id,
                                None => {
                                    let id = table.push_state();
                                    index.insert((*d1, *d2), id);
                                    pairs.push((*d1, *d2));
                                    id
                                }
                            };
                            table.get_transition_mut(current as StateId, z).insert(id);
                        }
                    }
                }
            }
            current += 1;
        }

        let mut product = Machine::from_raw(alphabet, numerations, outputs, table, 0);
        product.labels = labels;
        tracing::debug!(
            left = self.n_states(),
            right = other.n_states(),
            states = product.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "computed cross product"
        );
        Ok(product)
    }
}
