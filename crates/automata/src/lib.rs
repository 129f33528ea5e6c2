//!
//! A crate containing the representation of finite automata, both
//! deterministic and nondeterministic, that is shared by all operations.
//!
//! This crate does not use unsafe code.

#![forbid(unsafe_code)]

mod automaton;
mod random_automaton;

pub mod test_utility;

pub use automaton::*;
pub use random_automaton::*;
