//! Helpers to check the language of automata in tests. These are not meant
//! to execute automata on real input.

use std::collections::BTreeSet;
use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::Automaton;
use crate::StateIndex;
use crate::Transition;
use crate::EPSILON;

/// Returns true iff the automaton accepts the given sequence of symbols.
pub fn accepts<S: AsRef<str>>(automaton: &Automaton, word: &[S]) -> bool {
    let mut current = epsilon_closure(automaton, automaton.initial_states().iter().copied());

    for symbol in word {
        let next: Vec<StateIndex> = current
            .iter()
            .flat_map(|state| automaton.outgoing_transitions(*state))
            .filter(|transition| transition.symbol() == symbol.as_ref())
            .map(Transition::to)
            .collect();

        current = epsilon_closure(automaton, next);
    }

    current.iter().any(|state| automaton.is_final(*state))
}

/// Returns all words over the given symbols, excluding epsilon, with a length
/// of at most `max_length`.
pub fn words_up_to<'a>(symbols: impl IntoIterator<Item = &'a String>, max_length: usize) -> Vec<Vec<String>> {
    let symbols: BTreeSet<&String> = symbols.into_iter().filter(|symbol| *symbol != EPSILON).collect();

    let mut result: Vec<Vec<String>> = vec![Vec::new()];
    let mut previous: Vec<Vec<String>> = vec![Vec::new()];

    for _ in 0..max_length {
        let mut next = Vec::new();
        for word in &previous {
            for symbol in &symbols {
                let mut extended = word.clone();
                extended.push((*symbol).clone());
                next.push(extended);
            }
        }

        result.extend(next.iter().cloned());
        previous = next;
    }

    result
}

/// Returns true iff both deterministic automata are equal up to renaming of
/// their states.
pub fn is_isomorphic(left: &Automaton, right: &Automaton) -> bool {
    if left.alphabet() != right.alphabet()
        || left.num_of_states() != right.num_of_states()
        || left.num_of_transitions() != right.num_of_transitions()
    {
        return false;
    }

    let (Some(left_initial), Some(right_initial)) = (left.initial_state(), right.initial_state()) else {
        return left.initial_states().is_empty() && right.initial_states().is_empty();
    };

    let mut forward: FxHashMap<StateIndex, StateIndex> = FxHashMap::default();
    let mut backward: FxHashMap<StateIndex, StateIndex> = FxHashMap::default();
    let mut queue = VecDeque::new();

    forward.insert(left_initial, right_initial);
    backward.insert(right_initial, left_initial);
    queue.push_back((left_initial, right_initial));

    while let Some((left_state, right_state)) = queue.pop_front() {
        if left.is_final(left_state) != right.is_final(right_state)
            || left.outgoing_transitions(left_state).count() != right.outgoing_transitions(right_state).count()
        {
            return false;
        }

        for transition in left.outgoing_transitions(left_state) {
            let Some(right_to) = right.successor(right_state, transition.symbol()) else {
                return false;
            };

            match (forward.get(&transition.to()), backward.get(&right_to)) {
                (None, None) => {
                    forward.insert(transition.to(), right_to);
                    backward.insert(right_to, transition.to());
                    queue.push_back((transition.to(), right_to));
                }
                (Some(mapped), Some(_)) if *mapped == right_to => {}
                _ => return false,
            }
        }
    }

    // States that cannot be reached are not compared.
    forward.len() == left.num_of_states()
}

fn epsilon_closure(automaton: &Automaton, states: impl IntoIterator<Item = StateIndex>) -> BTreeSet<StateIndex> {
    let mut closure: BTreeSet<StateIndex> = BTreeSet::new();
    let mut stack: Vec<StateIndex> = Vec::new();

    for state in states {
        if closure.insert(state) {
            stack.push(state);
        }
    }

    while let Some(state) = stack.pop() {
        for transition in automaton.outgoing_transitions(state).filter(|t| t.is_epsilon()) {
            if closure.insert(transition.to()) {
                stack.push(transition.to());
            }
        }
    }

    closure
}
