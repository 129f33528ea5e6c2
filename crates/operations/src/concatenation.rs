use log::debug;

use fsarust_automata::Automaton;
use fsarust_automata::EPSILON;

use crate::determinize;
use crate::disjoint_union::DisjointUnion;
use crate::minimize;
use crate::DeterminizeOptions;
use crate::OperationError;

/// Returns the minimal deterministic automaton accepting every word `uv`
/// where `u` is accepted by the left and `v` by the right operand.
pub fn concatenation(
    left: &Automaton,
    right: &Automaton,
    options: &DeterminizeOptions,
) -> Result<Automaton, OperationError> {
    let operands = DisjointUnion::new(left, right)?;
    let mut result = operands.merge();

    for state in operands.left().initial_states() {
        result.add_initial_state(*state);
    }

    for state in operands.right().final_states() {
        result.add_final_state(*state);
    }

    // Continue with the right operand after accepting in the left operand.
    for from in operands.left().final_states() {
        for to in operands.right().initial_states() {
            result.add_transition(*from, EPSILON, *to);
        }
    }

    debug!("Concatenation of {} and {} states", left.num_of_states(), right.num_of_states());
    minimize(&determinize(&result, options)?, options)
}
