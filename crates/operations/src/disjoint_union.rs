use log::trace;

use fsarust_automata::Automaton;
use fsarust_automata::AutomatonKind;
use fsarust_automata::StateIndex;

use crate::OperationError;

/// Two automata whose states occupy non-overlapping ranges of state indices.
///
/// The left operand keeps its indices, the right operand is renamed into the
/// range directly above the largest index of the left operand.
pub(crate) struct DisjointUnion {
    left: Automaton,
    right: Automaton,
}

impl DisjointUnion {
    pub fn new(left: &Automaton, right: &Automaton) -> Result<DisjointUnion, OperationError> {
        left.validate()?;
        right.validate()?;

        let offset = next_state(left)?;

        let mut right = right.clone();
        right.rename(offset)?;

        if let Some(state) = right.states().iter().find(|state| left.states().contains(*state)) {
            return Err(OperationError::IdCollision(*state));
        }

        trace!("Placed {} states of the right operand from {offset}", right.num_of_states());
        Ok(DisjointUnion {
            left: left.clone(),
            right,
        })
    }

    pub fn left(&self) -> &Automaton {
        &self.left
    }

    pub fn right(&self) -> &Automaton {
        &self.right
    }

    /// Returns a nondeterministic automaton with the symbols, states and
    /// transitions of both operands, but without initial or final states.
    pub fn merge(&self) -> Automaton {
        let mut result = Automaton::new(AutomatonKind::Nfa);

        for operand in [&self.left, &self.right] {
            for symbol in operand.alphabet() {
                result.add_symbol(symbol.clone());
            }

            for state in operand.states() {
                result.add_state(*state);
            }

            for (from, transitions) in operand.transitions() {
                for transition in transitions {
                    result.add_transition(*from, transition.symbol(), transition.to());
                }
            }
        }

        result
    }
}

/// Returns the smallest state index above all states of the automaton.
pub(crate) fn next_state(automaton: &Automaton) -> Result<StateIndex, OperationError> {
    match automaton.max_state() {
        Some(max) => max.checked_add(1).ok_or(OperationError::IdRangeExhausted(max)),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use test_log::test;

    use fsarust_automata::AutomatonError;

    use super::*;

    fn single_transition(from: StateIndex, to: StateIndex) -> Automaton {
        let mut automaton = Automaton::new(AutomatonKind::Dfa);
        automaton.add_symbol("a");
        automaton.add_initial_state(from);
        automaton.add_final_state(to);
        automaton.add_transition(from, "a", to);
        automaton
    }

    #[test]
    fn test_disjoint_ranges() {
        let left = single_transition(4, 2);
        let right = single_transition(0, 1);

        let operands = DisjointUnion::new(&left, &right).unwrap();

        assert_eq!(operands.left(), &left);
        assert_eq!(operands.right().states(), &BTreeSet::from([5, 6]));
        assert_eq!(operands.right().initial_states(), &BTreeSet::from([5]));

        let merged = operands.merge();
        assert_eq!(merged.states(), &BTreeSet::from([2, 4, 5, 6]));
        assert_eq!(merged.num_of_transitions(), 2);
        assert!(merged.initial_states().is_empty());
    }

    #[test]
    fn test_invalid_operand() {
        let left = single_transition(0, 1);
        let mut right = single_transition(0, 1);
        right.add_transition(1, "a", 9);

        assert!(matches!(
            DisjointUnion::new(&left, &right),
            Err(OperationError::Automaton(AutomatonError::DanglingTransition { .. }))
        ));
    }

    #[test]
    fn test_exhausted_range() {
        let left = single_transition(0, StateIndex::MAX);
        let right = single_transition(0, 1);

        assert!(matches!(
            DisjointUnion::new(&left, &right),
            Err(OperationError::IdRangeExhausted(max)) if max == StateIndex::MAX
        ));
    }
}
