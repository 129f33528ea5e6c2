use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;

use log::debug;
use log::trace;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

use fsarust_automata::Automaton;
use fsarust_automata::AutomatonKind;
use fsarust_automata::StateIndex;
use fsarust_automata::EPSILON;

use crate::OperationError;

/// Options that bound the resources used by the subset construction.
#[derive(Clone, Debug, Default)]
pub struct DeterminizeOptions {
    /// The maximum number of state sets that may be discovered, unbounded when `None`.
    pub max_states: Option<usize>,
}

impl DeterminizeOptions {
    fn check_limit(&self, num_of_states: usize) -> Result<(), OperationError> {
        match self.max_states {
            Some(limit) if num_of_states > limit => Err(OperationError::StateLimitExceeded { limit }),
            _ => Ok(()),
        }
    }
}

/// A set of states of the input automaton, which is a single state of the
/// deterministic automaton.
type StateSet = BTreeSet<StateIndex>;

/// The key of the memo table of the subset construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SubsetKey {
    states: StateSet,
    symbol: String,
}

/// Returns a deterministic automaton that accepts the same language.
///
/// The input is validated first. An automaton that is already deterministic
/// is returned as a copy.
pub fn determinize(automaton: &Automaton, options: &DeterminizeOptions) -> Result<Automaton, OperationError> {
    automaton.validate()?;

    if automaton.is_deterministic() {
        trace!("Automaton is already deterministic");
        return Ok(automaton.clone());
    }

    if automaton.initial_states().is_empty() {
        debug!("Automaton without initial states accepts the empty language");
        let mut alphabet = automaton.alphabet().clone();
        alphabet.remove(EPSILON);
        return Ok(Automaton::empty_language(&alphabet));
    }

    let start = std::time::Instant::now();

    let simplified = simplify_initial_states(automaton)?;
    let epsilon_free = remove_epsilon_transitions(&simplified);
    let memo = subset_construction(&epsilon_free, options)?;
    let result = normalize(&epsilon_free, &memo);

    debug!(
        "Determinized {} states into {} states in {:.3}s",
        automaton.num_of_states(),
        result.num_of_states(),
        start.elapsed().as_secs_f64()
    );
    Ok(result)
}

/// Introduces a fresh initial state with epsilon transitions to all initial
/// states when there is more than one.
fn simplify_initial_states(automaton: &Automaton) -> Result<Cow<'_, Automaton>, OperationError> {
    if automaton.initial_states().len() <= 1 {
        return Ok(Cow::Borrowed(automaton));
    }

    let max = automaton.max_state().unwrap_or_default();
    let fresh = max.checked_add(1).ok_or(OperationError::IdRangeExhausted(max))?;

    let mut result = Automaton::new(AutomatonKind::Nfa);
    for symbol in automaton.alphabet() {
        result.add_symbol(symbol.clone());
    }

    for state in automaton.states() {
        result.add_state(*state);
    }

    for state in automaton.final_states() {
        result.add_final_state(*state);
    }

    for (from, transitions) in automaton.transitions() {
        for transition in transitions {
            result.add_transition(*from, transition.symbol(), transition.to());
        }
    }

    result.add_initial_state(fresh);
    for initial in automaton.initial_states() {
        result.add_transition(fresh, EPSILON, *initial);
    }

    if automaton.initial_states().iter().any(|state| automaton.is_final(*state)) {
        result.add_final_state(fresh);
    }

    trace!("Introduced initial state {fresh}");
    Ok(Cow::Owned(result))
}

/// Replaces every state's transitions by the non-epsilon transitions of its
/// epsilon closure. A state whose closure contains a final state becomes final.
fn remove_epsilon_transitions(automaton: &Automaton) -> Automaton {
    let mut result = Automaton::new(AutomatonKind::Nfa);

    for symbol in automaton.alphabet().iter().filter(|symbol| *symbol != EPSILON) {
        result.add_symbol(symbol.clone());
    }

    for state in automaton.initial_states() {
        result.add_initial_state(*state);
    }

    for state in automaton.states() {
        result.add_state(*state);

        let closure = epsilon_closure(automaton, *state);
        for member in &closure {
            for transition in automaton.outgoing_transitions(*member).filter(|t| !t.is_epsilon()) {
                result.add_transition(*state, transition.symbol(), transition.to());
            }
        }

        if closure.iter().any(|member| automaton.is_final(*member)) {
            result.add_final_state(*state);
        }
    }

    result
}

/// Returns the states reachable from the given state by zero or more epsilon transitions.
fn epsilon_closure(automaton: &Automaton, state: StateIndex) -> StateSet {
    let mut closure = StateSet::from([state]);
    let mut stack = vec![state];

    while let Some(current) = stack.pop() {
        for transition in automaton.outgoing_transitions(current).filter(|t| t.is_epsilon()) {
            if closure.insert(transition.to()) {
                stack.push(transition.to());
            }
        }
    }

    closure
}

/// Explores the sets of states reachable from the initial state in breadth
/// first order and returns the successor of every discovered set per symbol.
/// Empty successor sets are not recorded.
fn subset_construction(
    automaton: &Automaton,
    options: &DeterminizeOptions,
) -> Result<FxHashMap<SubsetKey, StateSet>, OperationError> {
    let initial: StateSet = automaton.initial_states().clone();

    let mut memo: FxHashMap<SubsetKey, StateSet> = FxHashMap::default();
    let mut explored: FxHashSet<StateSet> = FxHashSet::default();
    let mut queue: VecDeque<StateSet> = VecDeque::new();

    options.check_limit(1)?;
    explored.insert(initial.clone());
    queue.push_back(initial);

    while let Some(current) = queue.pop_front() {
        // The successor for every symbol, ordered by symbol.
        let mut row: BTreeMap<&str, StateSet> = BTreeMap::new();
        for state in &current {
            for transition in automaton.outgoing_transitions(*state) {
                row.entry(transition.symbol()).or_default().insert(transition.to());
            }
        }

        for (symbol, successor) in row {
            if !explored.contains(&successor) {
                options.check_limit(explored.len() + 1)?;
                explored.insert(successor.clone());
                queue.push_back(successor.clone());
            }

            memo.insert(
                SubsetKey {
                    states: current.clone(),
                    symbol: symbol.to_string(),
                },
                successor,
            );
        }
    }

    debug!("Subset construction discovered {} state sets", explored.len());
    Ok(memo)
}

/// Numbers the discovered sets from 0 in breadth first order and builds the
/// deterministic automaton from the memo table.
fn normalize(automaton: &Automaton, memo: &FxHashMap<SubsetKey, StateSet>) -> Automaton {
    let mut result = Automaton::new(AutomatonKind::Dfa);
    for symbol in automaton.alphabet() {
        result.add_symbol(symbol.clone());
    }

    let initial: StateSet = automaton.initial_states().clone();

    let mut mapped: FxHashMap<StateSet, StateIndex> = FxHashMap::default();
    let mut queue: VecDeque<StateSet> = VecDeque::new();

    mapped.insert(initial.clone(), 0);
    result.add_initial_state(0);
    queue.push_back(initial);

    while let Some(current) = queue.pop_front() {
        let from = mapped[&current];
        result.add_state(from);

        if current.iter().any(|state| automaton.is_final(*state)) {
            result.add_final_state(from);
        }

        for symbol in automaton.alphabet() {
            let key = SubsetKey {
                states: current.clone(),
                symbol: symbol.clone(),
            };

            let Some(successor) = memo.get(&key) else {
                continue;
            };

            let next = mapped.len();
            let to = *mapped.entry(successor.clone()).or_insert_with(|| {
                queue.push_back(successor.clone());
                next
            });

            result.add_state(to);
            result.add_transition(from, symbol.clone(), to);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    use fsarust_automata::random_automaton;
    use fsarust_automata::test_utility::accepts;
    use fsarust_automata::test_utility::is_isomorphic;
    use fsarust_automata::test_utility::words_up_to;
    use fsarust_automata::AutomatonError;

    use super::*;
    use crate::minimize;

    #[test]
    fn test_epsilon_to_final_state() {
        let mut nfa = Automaton::new(AutomatonKind::Nfa);
        nfa.add_symbol("a");
        nfa.add_initial_state(0);
        nfa.add_final_state(1);
        nfa.add_transition(0, EPSILON, 1);

        let dfa = determinize(&nfa, &DeterminizeOptions::default()).unwrap();

        assert_eq!(dfa.validate(), Ok(()));
        assert_eq!(dfa.kind(), AutomatonKind::Dfa);
        assert!(!dfa.alphabet().contains(EPSILON));

        let initial = dfa.initial_state().unwrap();
        assert!(dfa.is_final(initial));
        assert!(accepts::<&str>(&dfa, &[]));
        assert!(!accepts(&dfa, &["a"]));
    }

    #[test]
    fn test_multiple_initial_states() {
        let mut nfa = Automaton::new(AutomatonKind::Nfa);
        nfa.add_symbol("a");
        nfa.add_symbol("b");
        nfa.add_initial_state(0);
        nfa.add_initial_state(2);
        nfa.add_final_state(1);
        nfa.add_final_state(2);
        nfa.add_transition(0, "a", 1);
        nfa.add_transition(2, "b", 2);

        let dfa = determinize(&nfa, &DeterminizeOptions::default()).unwrap();

        assert_eq!(dfa.initial_states().len(), 1);
        assert!(accepts::<&str>(&dfa, &[]));
        assert!(accepts(&dfa, &["a"]));
        assert!(accepts(&dfa, &["b", "b"]));
        assert!(!accepts(&dfa, &["a", "b"]));
    }

    #[test]
    fn test_subset_numbering() {
        // 0 -a-> {1, 2}, 1 -b-> 3, 2 -b-> 3
        let mut nfa = Automaton::new(AutomatonKind::Nfa);
        nfa.add_symbol("a");
        nfa.add_symbol("b");
        nfa.add_initial_state(0);
        nfa.add_state(1);
        nfa.add_state(2);
        nfa.add_final_state(3);
        nfa.add_transition(0, "a", 1);
        nfa.add_transition(0, "a", 2);
        nfa.add_transition(1, "b", 3);
        nfa.add_transition(2, "b", 3);

        let dfa = determinize(&nfa, &DeterminizeOptions::default()).unwrap();

        assert_eq!(dfa.states(), &BTreeSet::from([0, 1, 2]));
        assert_eq!(dfa.initial_states(), &BTreeSet::from([0]));
        assert_eq!(dfa.final_states(), &BTreeSet::from([2]));
        assert_eq!(dfa.successor(0, "a"), Some(1));
        assert_eq!(dfa.successor(1, "b"), Some(2));
        assert_eq!(dfa.num_of_transitions(), 2);
    }

    #[test]
    fn test_deterministic_is_identity() {
        let mut rng = StdRng::seed_from_u64(3);
        let dfa = random_automaton(&mut rng, AutomatonKind::Dfa, 8, 2, 3);

        assert_eq!(determinize(&dfa, &DeterminizeOptions::default()).unwrap(), dfa);
    }

    #[test]
    fn test_state_limit() {
        // The classic (a|b)*a(a|b)^n family needs 2^(n+1) subsets.
        let mut nfa = Automaton::new(AutomatonKind::Nfa);
        nfa.add_symbol("a");
        nfa.add_symbol("b");
        nfa.add_initial_state(0);
        nfa.add_transition(0, "a", 0);
        nfa.add_transition(0, "b", 0);
        nfa.add_transition(0, "a", 1);
        for state in 1..6 {
            nfa.add_state(state);
            nfa.add_transition(state, "a", state + 1);
            nfa.add_transition(state, "b", state + 1);
        }
        nfa.add_final_state(6);

        let options = DeterminizeOptions { max_states: Some(16) };
        assert_eq!(
            determinize(&nfa, &options),
            Err(OperationError::StateLimitExceeded { limit: 16 })
        );

        let dfa = determinize(&nfa, &DeterminizeOptions::default()).unwrap();
        assert_eq!(dfa.num_of_states(), 64);
    }

    #[test]
    fn test_no_initial_state() {
        let mut nfa = Automaton::new(AutomatonKind::Nfa);
        nfa.add_symbol("a");
        nfa.add_final_state(0);

        let dfa = determinize(&nfa, &DeterminizeOptions::default()).unwrap();
        assert_eq!(dfa, Automaton::empty_language(nfa.alphabet()));
    }

    #[test]
    fn test_invalid_input() {
        let mut nfa = Automaton::new(AutomatonKind::Nfa);
        nfa.add_symbol("a");
        nfa.add_initial_state(0);
        nfa.add_final_state(1);
        nfa.add_transition(0, "b", 1);

        let options = DeterminizeOptions::default();
        assert!(matches!(
            determinize(&nfa, &options),
            Err(OperationError::Automaton(AutomatonError::UnknownSymbol { from: 0, .. }))
        ));
        assert!(matches!(
            minimize(&nfa, &options),
            Err(OperationError::Automaton(AutomatonError::UnknownSymbol { .. }))
        ));

        // A DFA with a dangling transition is not passed through.
        let mut dfa = Automaton::new(AutomatonKind::Dfa);
        dfa.add_symbol("a");
        dfa.add_initial_state(0);
        dfa.add_transition(0, "a", 1);

        assert!(matches!(
            determinize(&dfa, &options),
            Err(OperationError::Automaton(AutomatonError::DanglingTransition { .. }))
        ));
    }

    #[test]
    fn test_random_determinize() {
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..20 {
            let nfa = random_automaton(&mut rng, AutomatonKind::Nfa, 6, 2, 3);
            let dfa = determinize(&nfa, &DeterminizeOptions::default()).unwrap();

            assert_eq!(dfa.validate(), Ok(()), "{dfa:?}");
            for word in words_up_to(nfa.alphabet(), 5) {
                assert_eq!(accepts(&nfa, &word), accepts(&dfa, &word), "word {word:?} of {nfa:?}");
            }

            let again = determinize(&dfa, &DeterminizeOptions::default()).unwrap();
            assert!(is_isomorphic(&dfa, &again));
        }
    }
}
