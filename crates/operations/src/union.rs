use log::debug;

use fsarust_automata::Automaton;
use fsarust_automata::EPSILON;

use crate::determinize;
use crate::disjoint_union::next_state;
use crate::disjoint_union::DisjointUnion;
use crate::minimize;
use crate::DeterminizeOptions;
use crate::OperationError;

/// Returns the minimal deterministic automaton accepting the words accepted
/// by either operand.
pub fn union(left: &Automaton, right: &Automaton, options: &DeterminizeOptions) -> Result<Automaton, OperationError> {
    let operands = DisjointUnion::new(left, right)?;
    let mut result = operands.merge();

    for operand in [operands.left(), operands.right()] {
        for state in operand.final_states() {
            result.add_final_state(*state);
        }
    }

    // A fresh initial state that can silently move to every initial state.
    let initial = next_state(&result)?;
    result.add_initial_state(initial);

    let mut accepts_empty_word = false;
    for operand in [operands.left(), operands.right()] {
        for state in operand.initial_states() {
            result.add_transition(initial, EPSILON, *state);
            accepts_empty_word |= operand.is_final(*state);
        }
    }

    if accepts_empty_word {
        result.add_final_state(initial);
    }

    debug!("Union of {} and {} states", left.num_of_states(), right.num_of_states());
    minimize(&determinize(&result, options)?, options)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    use fsarust_automata::random_automaton;
    use fsarust_automata::test_utility::accepts;
    use fsarust_automata::test_utility::words_up_to;
    use fsarust_automata::AutomatonKind;

    use super::*;

    /// Accepts exactly the given word.
    fn word_automaton(word: &[&str]) -> Automaton {
        let mut automaton = Automaton::new(AutomatonKind::Dfa);
        automaton.add_initial_state(0);
        for (index, symbol) in word.iter().enumerate() {
            automaton.add_symbol(*symbol);
            automaton.add_state(index + 1);
            automaton.add_transition(index, *symbol, index + 1);
        }
        automaton.add_final_state(word.len());
        automaton
    }

    #[test]
    fn test_union_of_words() {
        let result = union(
            &word_automaton(&["a", "b"]),
            &word_automaton(&[]),
            &DeterminizeOptions::default(),
        )
        .unwrap();

        assert!(accepts::<&str>(&result, &[]));
        assert!(accepts(&result, &["a", "b"]));
        assert!(!accepts(&result, &["a"]));
        assert_eq!(result.num_of_states(), 3);
        assert!(result.is_final(0));
    }

    #[test]
    fn test_random_union() {
        let mut rng = StdRng::seed_from_u64(13);

        for _ in 0..20 {
            let left = random_automaton(&mut rng, AutomatonKind::Nfa, 5, 2, 3);
            let right = random_automaton(&mut rng, AutomatonKind::Dfa, 5, 3, 3);
            let result = union(&left, &right, &DeterminizeOptions::default()).unwrap();

            for word in words_up_to(result.alphabet(), 4) {
                assert_eq!(
                    accepts(&result, &word),
                    accepts(&left, &word) || accepts(&right, &word),
                    "word {word:?}"
                );
            }
        }
    }
}
