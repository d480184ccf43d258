//! Finite automata over tuples of integers, read as numbers in numeration
//! systems, with the operations needed to decide first-order predicates on
//! automatic sequences: boolean combinations, quantification, minimization
//! and the arithmetic relations of a numeration system.

pub mod alphabet;
pub mod automaton;
pub mod common;
pub mod config;
pub mod error;
pub mod numeration;
pub mod parser;
mod partition;
pub mod regex;
pub mod table;

pub use crate::automaton::{Automaton, BoolOp, CompareOp, Machine, Numeration};
pub use crate::common::Name;
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::numeration::{ArithOp, NumberSystem, Operand, Registry};
