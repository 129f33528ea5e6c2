use std::collections::VecDeque;

use log::debug;
use log::trace;
use rustc_hash::FxHashSet;

use fsarust_automata::Automaton;
use fsarust_automata::AutomatonKind;
use fsarust_automata::StateIndex;

use crate::determinize;
use crate::DeterminizeOptions;
use crate::IncomingTransitions;
use crate::OperationError;

/// Returns the minimal deterministic automaton that accepts the same language,
/// numbered from 0 in breadth first order.
///
/// The input is determinized first. Afterwards the unreachable states, the
/// states from which no final state can be reached, and finally the
/// equivalent states are removed, strictly in that order.
pub fn minimize(automaton: &Automaton, options: &DeterminizeOptions) -> Result<Automaton, OperationError> {
    let start = std::time::Instant::now();

    let dfa = determinize(automaton, options)?;
    let reachable = remove_unreachable_states(&dfa);
    let useful = remove_useless_states(&reachable);
    let result = merge_equivalent_states(useful)?;

    debug!(
        "Minimized {} states into {} states in {:.3}s",
        dfa.num_of_states(),
        result.num_of_states(),
        start.elapsed().as_secs_f64()
    );
    Ok(result)
}

/// Keeps only the states reachable from the initial state.
fn remove_unreachable_states(automaton: &Automaton) -> Automaton {
    let Some(initial) = automaton.initial_state() else {
        return Automaton::empty_language(automaton.alphabet());
    };

    let mut explored: FxHashSet<StateIndex> = FxHashSet::default();
    let mut queue = VecDeque::from([initial]);
    explored.insert(initial);

    while let Some(state) = queue.pop_front() {
        for transition in automaton.outgoing_transitions(state) {
            if explored.insert(transition.to()) {
                queue.push_back(transition.to());
            }
        }
    }

    let mut result = Automaton::new(AutomatonKind::Dfa);
    for symbol in automaton.alphabet() {
        result.add_symbol(symbol.clone());
    }

    result.add_initial_state(initial);
    for state in automaton.states().iter().filter(|state| explored.contains(*state)) {
        result.add_state(*state);

        if automaton.is_final(*state) {
            result.add_final_state(*state);
        }

        for transition in automaton.outgoing_transitions(*state) {
            result.add_transition(*state, transition.symbol(), transition.to());
        }
    }

    trace!("Removed {} unreachable states", automaton.num_of_states() - result.num_of_states());
    result
}

/// Keeps only the states from which a final state can be reached. When the
/// initial state or all final states are removed the result is the canonical
/// automaton of the empty language.
fn remove_useless_states(automaton: &Automaton) -> Automaton {
    let incoming = IncomingTransitions::new(automaton);

    let mut explored: FxHashSet<StateIndex> = automaton.final_states().iter().copied().collect();
    let mut queue: VecDeque<StateIndex> = automaton.final_states().iter().copied().collect();

    while let Some(state) = queue.pop_front() {
        for predecessor in incoming.predecessors(state) {
            if explored.insert(predecessor) {
                queue.push_back(predecessor);
            }
        }
    }

    let initial_states: Vec<StateIndex> = automaton
        .initial_states()
        .iter()
        .copied()
        .filter(|state| explored.contains(state))
        .collect();

    if automaton.final_states().is_empty() || initial_states.is_empty() {
        debug!("The automaton accepts the empty language");
        return Automaton::empty_language(automaton.alphabet());
    }

    let mut result = Automaton::new(AutomatonKind::Dfa);
    for symbol in automaton.alphabet() {
        result.add_symbol(symbol.clone());
    }

    for state in initial_states {
        result.add_initial_state(state);
    }

    for state in automaton.states().iter().filter(|state| explored.contains(*state)) {
        result.add_state(*state);

        if automaton.is_final(*state) {
            result.add_final_state(*state);
        }

        for transition in automaton
            .outgoing_transitions(*state)
            .filter(|transition| explored.contains(&transition.to()))
        {
            result.add_transition(*state, transition.symbol(), transition.to());
        }
    }

    trace!("Removed {} useless states", automaton.num_of_states() - result.num_of_states());
    result
}

/// Merges all pairs of equivalent states by refining the table of pairs that
/// are possibly equivalent until it is stable.
///
/// The input must be deterministic, without unreachable and without useless
/// states.
fn merge_equivalent_states(mut automaton: Automaton) -> Result<Automaton, OperationError> {
    debug_assert_eq!(
        remove_useless_states(&remove_unreachable_states(&automaton)).num_of_states(),
        automaton.num_of_states(),
        "Equivalent states can only be merged after removing unreachable and useless states"
    );

    automaton.rename(0)?;
    let num_of_states = automaton.num_of_states();
    let initial = automaton.initial_state().unwrap_or_default();

    // Final states are never equivalent to non-final states.
    let mut equivalent = vec![vec![true; num_of_states]; num_of_states];
    for (i, row) in equivalent.iter_mut().enumerate() {
        for (j, entry) in row.iter_mut().enumerate() {
            *entry = automaton.is_final(i) == automaton.is_final(j);
        }
    }

    let mut changed = true;
    let mut iteration = 0;

    while changed {
        changed = false;

        for i in 0..num_of_states {
            for j in 0..i {
                if equivalent[i][j] && !has_equivalent_transitions(&automaton, &equivalent, i, j) {
                    equivalent[i][j] = false;
                    equivalent[j][i] = false;
                    changed = true;
                }
            }
        }

        iteration += 1;
        trace!("Iteration {iteration} of the equivalence refinement");

        debug_assert!(
            iteration <= num_of_states.max(1) + 1,
            "The refinement must stabilize within the number of states"
        );
    }

    // Every class is represented by its smallest member.
    let representative: Vec<StateIndex> = (0..num_of_states)
        .map(|i| (0..=i).find(|j| equivalent[i][*j]).unwrap_or(i))
        .collect();

    let mut result = Automaton::new(AutomatonKind::Dfa);
    for symbol in automaton.alphabet() {
        result.add_symbol(symbol.clone());
    }

    let initial = representative[initial];
    let mut explored: FxHashSet<StateIndex> = FxHashSet::from_iter([initial]);
    let mut queue = VecDeque::from([initial]);
    result.add_initial_state(initial);

    while let Some(state) = queue.pop_front() {
        if automaton.is_final(state) {
            result.add_final_state(state);
        }

        for transition in automaton.outgoing_transitions(state) {
            let to = representative[transition.to()];
            result.add_state(to);
            result.add_transition(state, transition.symbol(), to);

            if explored.insert(to) {
                queue.push_back(to);
            }
        }
    }

    result.rename(0)?;
    Ok(result)
}

/// Returns true iff both states have the same symbols on their outgoing
/// transitions and the destinations are pairwise marked equivalent.
fn has_equivalent_transitions(automaton: &Automaton, equivalent: &[Vec<bool>], i: StateIndex, j: StateIndex) -> bool {
    if automaton.outgoing_transitions(i).count() != automaton.outgoing_transitions(j).count() {
        return false;
    }

    automaton.outgoing_transitions(i).all(|transition| {
        automaton
            .successor(j, transition.symbol())
            .is_some_and(|to| equivalent[transition.to()][to])
    })
}
