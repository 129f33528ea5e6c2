use rustc_hash::FxHashMap;

use fsarust_automata::Automaton;
use fsarust_automata::StateIndex;
use fsarust_automata::Transition;

/// A struct containing the incoming transitions for every state. The state
/// of an incoming transition is its source.
pub struct IncomingTransitions {
    incoming_transitions: FxHashMap<StateIndex, Vec<Transition>>,
}

impl IncomingTransitions {
    pub fn new(automaton: &Automaton) -> IncomingTransitions {
        let mut incoming_transitions: FxHashMap<StateIndex, Vec<Transition>> = FxHashMap::default();

        for (from, transitions) in automaton.transitions() {
            for transition in transitions {
                incoming_transitions
                    .entry(transition.to())
                    .or_default()
                    .push(Transition::new(transition.symbol(), *from));
            }
        }

        // Sort the incoming transitions such that they are grouped per symbol.
        for transitions in incoming_transitions.values_mut() {
            transitions.sort_unstable();
        }

        IncomingTransitions { incoming_transitions }
    }

    /// Returns an iterator over the incoming transitions for the given state.
    pub fn incoming_transitions(&self, state: StateIndex) -> impl Iterator<Item = &Transition> {
        self.incoming_transitions.get(&state).into_iter().flatten()
    }

    /// Returns an iterator over the states with a transition to the given state.
    pub fn predecessors(&self, state: StateIndex) -> impl Iterator<Item = StateIndex> + '_ {
        self.incoming_transitions(state).map(Transition::to)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    use fsarust_automata::random_automaton;
    use fsarust_automata::AutomatonKind;

    use super::*;

    #[test]
    fn test_incoming_transitions() {
        let mut rng = StdRng::seed_from_u64(7);
        let automaton = random_automaton(&mut rng, AutomatonKind::Nfa, 10, 3, 3);
        let incoming = IncomingTransitions::new(&automaton);

        // Every outgoing transition occurs exactly once as an incoming transition.
        let mut count = 0;
        for state in automaton.states() {
            for transition in incoming.incoming_transitions(*state) {
                count += 1;
                assert!(automaton
                    .outgoing_transitions(transition.to())
                    .any(|outgoing| outgoing.symbol() == transition.symbol() && outgoing.to() == *state));
            }
        }

        assert_eq!(count, automaton.num_of_transitions());
    }
}
