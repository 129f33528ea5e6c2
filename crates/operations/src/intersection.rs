use std::collections::VecDeque;

use log::debug;
use rustc_hash::FxHashMap;

use fsarust_automata::Automaton;
use fsarust_automata::AutomatonKind;
use fsarust_automata::StateIndex;

use crate::determinize;
use crate::minimize;
use crate::DeterminizeOptions;
use crate::OperationError;

/// A state of the product automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct StatePair {
    left: StateIndex,
    right: StateIndex,
}

/// Returns the minimal deterministic automaton accepting the words accepted
/// by both operands. The operands are determinized before taking their product.
pub fn intersection(
    left: &Automaton,
    right: &Automaton,
    options: &DeterminizeOptions,
) -> Result<Automaton, OperationError> {
    left.validate()?;
    right.validate()?;

    let left = determinize(left, options)?;
    let right = determinize(right, options)?;

    let product = product_automaton(&left, &right);

    debug!(
        "Product of {} and {} states has {} states",
        left.num_of_states(),
        right.num_of_states(),
        product.num_of_states()
    );
    minimize(&determinize(&product, options)?, options)
}

/// Synchronized product of two deterministic automata, only containing the
/// pairs reachable from the pair of initial states.
fn product_automaton(left: &Automaton, right: &Automaton) -> Automaton {
    let mut alphabet = left.alphabet().clone();
    alphabet.extend(right.alphabet().iter().cloned());

    let (Some(left_initial), Some(right_initial)) = (left.initial_state(), right.initial_state()) else {
        return Automaton::empty_language(&alphabet);
    };

    let mut result = Automaton::new(AutomatonKind::Dfa);
    for symbol in alphabet {
        result.add_symbol(symbol);
    }

    let is_final = |pair: &StatePair| left.is_final(pair.left) && right.is_final(pair.right);

    let initial = StatePair {
        left: left_initial,
        right: right_initial,
    };

    let mut mapped: FxHashMap<StatePair, StateIndex> = FxHashMap::default();
    let mut queue: VecDeque<StatePair> = VecDeque::new();

    mapped.insert(initial, 0);
    result.add_initial_state(0);
    if is_final(&initial) {
        result.add_final_state(0);
    }
    queue.push_back(initial);

    while let Some(pair) = queue.pop_front() {
        let from = mapped[&pair];

        for symbol in left.alphabet() {
            let (Some(left_to), Some(right_to)) = (left.successor(pair.left, symbol), right.successor(pair.right, symbol))
            else {
                continue;
            };

            let next = StatePair {
                left: left_to,
                right: right_to,
            };

            let to = match mapped.get(&next) {
                Some(index) => *index,
                None => {
                    let index = mapped.len();
                    mapped.insert(next, index);
                    result.add_state(index);
                    if is_final(&next) {
                        result.add_final_state(index);
                    }
                    queue.push_back(next);
                    index
                }
            };

            result.add_transition(from, symbol.clone(), to);
        }
    }

    result
}
