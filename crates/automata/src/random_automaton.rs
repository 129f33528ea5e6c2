use rand::Rng;

use crate::Automaton;
use crate::AutomatonKind;
use crate::EPSILON;

/// Generates an automaton with the desired number of states over the symbols
/// `a`, `b`, ... where every state has at most `outdegree` outgoing transitions.
///
/// A DFA has state 0 as its only initial state and at most one transition per
/// symbol. An NFA can have several initial states and epsilon transitions.
pub fn random_automaton<R: Rng>(
    rng: &mut R,
    kind: AutomatonKind,
    num_of_states: usize,
    num_of_symbols: u32,
    outdegree: usize,
) -> Automaton {
    let mut automaton = Automaton::new(kind);

    // Introduce lower case letters for the symbols.
    let symbols: Vec<String> = (0..num_of_symbols)
        .filter_map(|i| char::from_digit(i + 10, 36))
        .map(|c| c.to_string())
        .collect();

    for symbol in &symbols {
        automaton.add_symbol(symbol.clone());
    }

    for state in 0..num_of_states {
        automaton.add_state(state);

        if rng.random_bool(0.3) {
            automaton.add_final_state(state);
        }
    }

    if num_of_states == 0 {
        return automaton;
    }

    automaton.add_initial_state(0);

    if kind == AutomatonKind::Nfa && rng.random_bool(0.3) {
        automaton.add_initial_state(rng.random_range(0..num_of_states));
    }

    if symbols.is_empty() {
        return automaton;
    }

    for from in 0..num_of_states {
        for _ in 0..rng.random_range(0..=outdegree) {
            let to = rng.random_range(0..num_of_states);

            match kind {
                AutomatonKind::Dfa => {
                    let symbol = &symbols[rng.random_range(0..symbols.len())];
                    if automaton.successor(from, symbol).is_none() {
                        automaton.add_transition(from, symbol.clone(), to);
                    }
                }
                AutomatonKind::Nfa => {
                    if rng.random_bool(0.2) {
                        automaton.add_transition(from, EPSILON, to);
                    } else {
                        let symbol = &symbols[rng.random_range(0..symbols.len())];
                        automaton.add_transition(from, symbol.clone(), to);
                    }
                }
            }
        }
    }

    automaton
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    use super::*;

    #[test]
    fn test_random_automaton() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..20 {
            let dfa = random_automaton(&mut rng, AutomatonKind::Dfa, 10, 3, 3);
            assert_eq!(dfa.validate(), Ok(()));

            let nfa = random_automaton(&mut rng, AutomatonKind::Nfa, 10, 3, 3);
            assert_eq!(nfa.validate(), Ok(()));
        }
    }
}
