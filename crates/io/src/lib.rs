//!
//! A crate containing IO related functionality. This includes the reading
//! and writing of finite automata in the textual format with one line per
//! state.
//!

#![forbid(unsafe_code)]

mod line_iterator;

pub mod io_automaton;
