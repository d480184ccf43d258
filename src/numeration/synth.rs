use std::cell::RefCell;
use std::time::Instant;

use hashbrown::HashMap;

use super::NumberSystem;
use crate::automaton::{Automaton, CompareOp};
use crate::common::Name;
use crate::error::{Error, Result};

/// A term of a relation: a free variable or a natural number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Var(Name),
    Const(i64),
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Var(Name::from(s))
    }
}

impl From<Name> for Operand {
    fn from(name: Name) -> Self {
        Operand::Var(name)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Const(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Plus,
    Minus,
    Times,
    Div,
}

fn natural(value: i64) -> Result<u64> {
    if value < 0 {
        return Err(Error::ArithmeticDomain(format!("{} is not a natural number", value)));
    }
    Ok(value as u64)
}

fn cached(cache: &RefCell<HashMap<u64, Automaton>>, n: u64) -> Option<Automaton> {
    cache.borrow().get(&n).cloned()
}

/// Operands as variables; every constant becomes a helper variable whose
/// value is fixed by an automaton returned alongside.
struct Terms {
    names: Vec<Name>,
    helpers: Vec<Name>,
    fixed: Vec<Automaton>,
}

impl NumberSystem {
    /// Accepts exactly the representation of `n`.
    pub fn constant(&self, n: u64) -> Result<Automaton> {
        if let Some(automaton) = cached(&self.constants, n) {
            return Ok(automaton);
        }
        let start = Instant::now();
        let mut automaton = match n {
            0 => self.digits_automaton(&[(0, 0, 0)], [1, 0])?,
            1 if self.is_msd() => self.digits_automaton(&[(0, 0, 0), (0, 1, 1)], [0, 1])?,
            1 => self.digits_automaton(&[(0, 1, 1), (1, 0, 1)], [0, 1])?,
            _ => {
                let half = n / 2;
                let (x, y, out) = (Name::new_tmp(), Name::new_tmp(), Name::new_tmp());
                let mut sum = self
                    .addition
                    .bound(&[&x, &y, &out])?
                    .and(self.constant(half)?.bound(&[&x])?)?
                    .and(self.constant(n - half)?.bound(&[&y])?)?;
                sum.quantify(&[x, y])?;
                sum.machine_mut()?.unlabel();
                sum
            }
        };
        automaton.machine_mut()?.apply_all_representations()?;
        tracing::debug!(
            system = self.name(),
            n,
            states = automaton.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built constant"
        );
        self.constants.borrow_mut().insert(n, automaton.clone());
        Ok(automaton)
    }

    /// Two coordinates `(x, y)` with `y = n * x`, for `n >= 1`.
    pub fn multiplication(&self, n: u64) -> Result<Automaton> {
        if n == 0 {
            return Err(Error::InvalidOperation("multiplication by 0 has no input coordinate".to_string()));
        }
        if let Some(automaton) = cached(&self.multiplications, n) {
            return Ok(automaton);
        }
        let start = Instant::now();
        let automaton = if n == 1 {
            self.equality.clone()
        } else {
            let half = n / 2;
            let (x, y) = (Name::new_tmp(), Name::new_tmp());
            let (a, b) = (Name::new_tmp(), Name::new_tmp());
            let mut product = self
                .addition
                .bound(&[&a, &b, &y])?
                .and(self.multiplication(half)?.bound(&[&x, &a])?)?
                .and(self.multiplication(n - half)?.bound(&[&x, &b])?)?;
            product.quantify(&[a, b])?;
            product.sort_labels();
            product.machine_mut()?.unlabel();
            product
        };
        tracing::debug!(
            system = self.name(),
            n,
            states = automaton.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built multiplication"
        );
        self.multiplications.borrow_mut().insert(n, automaton.clone());
        Ok(automaton)
    }

    /// Two coordinates `(x, y)` with `y = x / n` rounded down, for `n >= 1`:
    /// `x = n * y + r` with `r < n`.
    pub fn division(&self, n: u64) -> Result<Automaton> {
        if n == 0 {
            return Err(Error::ArithmeticDomain("division by 0".to_string()));
        }
        if let Some(automaton) = cached(&self.divisions, n) {
            return Ok(automaton);
        }
        let start = Instant::now();
        let automaton = if n == 1 {
            self.equality.clone()
        } else {
            let (x, y) = (Name::new_tmp(), Name::new_tmp());
            let (product, rest, divisor) = (Name::new_tmp(), Name::new_tmp(), Name::new_tmp());
            let mut quotient = self
                .multiplication(n)?
                .bound(&[&y, &product])?
                .and(self.addition.bound(&[&product, &rest, &x])?)?
                .and(self.less_than.bound(&[&rest, &divisor])?)?
                .and(self.constant(n)?.bound(&[&divisor])?)?;
            quotient.quantify(&[product, rest, divisor])?;
            quotient.sort_labels();
            quotient.machine_mut()?.unlabel();
            quotient
        };
        tracing::debug!(
            system = self.name(),
            n,
            states = automaton.n_states(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built division"
        );
        self.divisions.borrow_mut().insert(n, automaton.clone());
        Ok(automaton)
    }

    fn terms(&self, operands: &[&Operand]) -> Result<Terms> {
        let mut terms = Terms {
            names: Vec::with_capacity(operands.len()),
            helpers: Vec::new(),
            fixed: Vec::new(),
        };
        for operand in operands {
            match operand {
                Operand::Var(name) => terms.names.push(name.clone()),
                Operand::Const(value) => {
                    let helper = Name::new_tmp();
                    terms.fixed.push(self.constant(natural(*value)?)?.bound(&[&helper])?);
                    terms.names.push(helper.clone());
                    terms.helpers.push(helper);
                }
            }
        }
        Ok(terms)
    }

    /// Conjunction of `relation` with the automata fixing the constants, the
    /// helper variables quantified away.
    fn with_terms(relation: Automaton, terms: Terms) -> Result<Automaton> {
        let mut result = relation;
        for automaton in terms.fixed {
            result = result.and(automaton)?;
        }
        result.quantify(&terms.helpers)?;
        Ok(result)
    }

    fn compare_vars(&self, a: &Name, b: &Name, op: CompareOp) -> Result<Automaton> {
        let (template, labels, negate) = match op {
            CompareOp::Lt => (&self.less_than, [a, b], false),
            CompareOp::Gt => (&self.less_than, [b, a], false),
            CompareOp::Ge => (&self.less_than, [a, b], true),
            CompareOp::Le => (&self.less_than, [b, a], true),
            CompareOp::Eq => (&self.equality, [a, b], false),
            CompareOp::Ne => (&self.equality, [a, b], true),
        };
        let mut relation = template.bound(&labels)?;
        if negate {
            relation.not()?;
        }
        Ok(relation)
    }

    /// Accepts where `a op b`.
    pub fn comparison(&self, a: &Operand, b: &Operand, op: CompareOp) -> Result<Automaton> {
        if let (Operand::Const(x), Operand::Const(y)) = (a, b) {
            return Ok(Automaton::Trivial(op.eval(natural(*x)?, natural(*y)?)));
        }
        let terms = self.terms(&[a, b])?;
        let relation = self.compare_vars(&terms.names[0], &terms.names[1], op)?;
        NumberSystem::with_terms(relation, terms)
    }

    /// Accepts where `c = a op b`. Multiplication needs a constant factor and
    /// division a constant divisor.
    pub fn arithmetic(&self, a: &Operand, b: &Operand, c: &Operand, op: ArithOp) -> Result<Automaton> {
        if let (Operand::Const(x), Operand::Const(y), Operand::Const(z)) = (a, b, c) {
            let (x, y, z) = (natural(*x)?, natural(*y)?, natural(*z)?);
            let value = match op {
                ArithOp::Plus => x.checked_add(y),
                ArithOp::Minus => x.checked_sub(y),
                ArithOp::Times => x.checked_mul(y),
                ArithOp::Div if y == 0 => return Err(Error::ArithmeticDomain("division by 0".to_string())),
                ArithOp::Div => Some(x / y),
            };
            return Ok(Automaton::Trivial(value == Some(z)));
        }
        match op {
            ArithOp::Plus => {
                let terms = self.terms(&[a, b, c])?;
                let relation = self.addition.bound(&terms.names)?;
                NumberSystem::with_terms(relation, terms)
            }
            ArithOp::Minus => {
                let terms = self.terms(&[b, c, a])?;
                let relation = self.addition.bound(&terms.names)?;
                NumberSystem::with_terms(relation, terms)
            }
            ArithOp::Times => {
                let (factor, x) = match (a, b) {
                    (Operand::Const(k), x) | (x, Operand::Const(k)) => (natural(*k)?, x),
                    _ => {
                        return Err(Error::InvalidOperation(
                            "multiplication needs a constant operand".to_string(),
                        ))
                    }
                };
                if factor == 0 {
                    return self.comparison(c, &Operand::Const(0), CompareOp::Eq);
                }
                let terms = self.terms(&[x, c])?;
                let relation = self.multiplication(factor)?.bound(&terms.names)?;
                NumberSystem::with_terms(relation, terms)
            }
            ArithOp::Div => {
                let divisor = match b {
                    Operand::Const(k) => natural(*k)?,
                    Operand::Var(_) => {
                        return Err(Error::InvalidOperation("division needs a constant divisor".to_string()))
                    }
                };
                let relation = self.division(divisor)?;
                let terms = self.terms(&[a, c])?;
                let relation = relation.bound(&terms.names)?;
                NumberSystem::with_terms(relation, terms)
            }
        }
    }
}
