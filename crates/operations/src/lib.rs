//!
//! A crate containing the operations on finite automata: determinization,
//! minimization, union, intersection and concatenation.
//!
//! Every operation borrows its inputs and returns a new automaton. The
//! combinators always pass their result through [determinize] and then
//! [minimize].
//!
//! This crate does not use unsafe code.

#![forbid(unsafe_code)]

mod concatenation;
mod determinize;
mod disjoint_union;
mod error;
mod incoming_transitions;
mod intersection;
mod minimize;
mod union;

pub use concatenation::*;
pub use determinize::*;
pub use error::*;
pub use incoming_transitions::*;
pub use intersection::*;
pub use minimize::*;
pub use union::*;
