use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::fmt;

use log::trace;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use thiserror::Error;

/// The index for a state.
pub type StateIndex = usize;

/// The reserved symbol of transitions that do not consume any input.
pub const EPSILON: &str = "*";

/// Distinguishes automata that satisfy the deterministic invariants from
/// general nondeterministic automata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AutomatonKind {
    Nfa,
    Dfa,
}

impl fmt::Display for AutomatonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomatonKind::Nfa => write!(f, "NFA"),
            AutomatonKind::Dfa => write!(f, "DFA"),
        }
    }
}

/// An outgoing edge of a state, ordered by symbol first and destination second.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Transition {
    symbol: String,
    to: StateIndex,
}

impl Transition {
    pub fn new(symbol: impl Into<String>, to: StateIndex) -> Transition {
        Transition {
            symbol: symbol.into(),
            to,
        }
    }

    /// Returns the symbol that labels this transition.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the destination state.
    pub fn to(&self) -> StateIndex {
        self.to
    }

    /// Returns true iff this transition does not consume input.
    pub fn is_epsilon(&self) -> bool {
        self.symbol == EPSILON
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.symbol, self.to)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AutomatonError {
    #[error("Transition {from} --[{symbol}]-> {to} refers to a state that does not exist")]
    DanglingTransition {
        from: StateIndex,
        symbol: String,
        to: StateIndex,
    },

    #[error("State {0} is marked initial or final but is not a state of the automaton")]
    UnknownState(StateIndex),

    #[error("Symbol {symbol} used by state {from} is not part of the alphabet")]
    UnknownSymbol { from: StateIndex, symbol: String },

    #[error("A DFA must have exactly one initial state, found {0}")]
    InitialStateCount(usize),

    #[error("A DFA cannot contain epsilon transitions")]
    EpsilonInDfa,

    #[error("State {from} of a DFA has more than one transition on symbol {symbol}")]
    NonDeterministic { from: StateIndex, symbol: String },

    #[error("Renaming {num_of_states} states starting at {start} overflows the state index range")]
    StateIdOverflow { start: StateIndex, num_of_states: usize },
}

/// A finite automaton, either deterministic or nondeterministic.
///
/// All sets are ordered such that traversals, renumbering and the textual
/// output are reproducible.
#[derive(Clone, PartialEq, Eq)]
pub struct Automaton {
    kind: AutomatonKind,

    states: BTreeSet<StateIndex>,
    alphabet: BTreeSet<String>,

    initial_states: BTreeSet<StateIndex>,
    final_states: BTreeSet<StateIndex>,

    transitions: BTreeMap<StateIndex, BTreeSet<Transition>>,
}

impl Automaton {
    /// Creates an automaton of the given kind without any states.
    pub fn new(kind: AutomatonKind) -> Automaton {
        Automaton {
            kind,
            states: BTreeSet::new(),
            alphabet: BTreeSet::new(),
            initial_states: BTreeSet::new(),
            final_states: BTreeSet::new(),
            transitions: BTreeMap::new(),
        }
    }

    /// Returns the canonical automaton that accepts no word: a single
    /// non-final initial state without transitions.
    pub fn empty_language(alphabet: &BTreeSet<String>) -> Automaton {
        let mut automaton = Automaton::new(AutomatonKind::Dfa);
        automaton.alphabet = alphabet.clone();
        automaton.add_initial_state(0);
        automaton
    }

    pub fn kind(&self) -> AutomatonKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: AutomatonKind) {
        self.kind = kind;
    }

    /// Returns true iff the automaton is tagged as deterministic.
    pub fn is_deterministic(&self) -> bool {
        self.kind == AutomatonKind::Dfa
    }

    pub fn states(&self) -> &BTreeSet<StateIndex> {
        &self.states
    }

    pub fn alphabet(&self) -> &BTreeSet<String> {
        &self.alphabet
    }

    pub fn initial_states(&self) -> &BTreeSet<StateIndex> {
        &self.initial_states
    }

    pub fn final_states(&self) -> &BTreeSet<StateIndex> {
        &self.final_states
    }

    pub fn transitions(&self) -> &BTreeMap<StateIndex, BTreeSet<Transition>> {
        &self.transitions
    }

    /// Returns the single initial state of a deterministic automaton, or the
    /// smallest initial state otherwise.
    pub fn initial_state(&self) -> Option<StateIndex> {
        self.initial_states.first().copied()
    }

    /// Returns the outgoing transitions of the given state ordered by symbol.
    pub fn outgoing_transitions(&self, state: StateIndex) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions.get(&state).into_iter().flatten()
    }

    /// Returns the destination of the transition labelled with symbol, taking
    /// the smallest one when there are several.
    pub fn successor(&self, state: StateIndex, symbol: &str) -> Option<StateIndex> {
        self.outgoing_transitions(state)
            .find(|transition| transition.symbol() == symbol)
            .map(Transition::to)
    }

    pub fn is_initial(&self, state: StateIndex) -> bool {
        self.initial_states.contains(&state)
    }

    pub fn is_final(&self, state: StateIndex) -> bool {
        self.final_states.contains(&state)
    }

    /// Returns the largest state index, if there are any states.
    pub fn max_state(&self) -> Option<StateIndex> {
        self.states.last().copied()
    }

    pub fn num_of_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_of_transitions(&self) -> usize {
        self.transitions.values().map(BTreeSet::len).sum()
    }

    pub fn add_state(&mut self, state: StateIndex) {
        self.states.insert(state);
    }

    pub fn add_symbol(&mut self, symbol: impl Into<String>) {
        self.alphabet.insert(symbol.into());
    }

    /// Marks the state as initial, adding it to the states when necessary.
    pub fn add_initial_state(&mut self, state: StateIndex) {
        self.states.insert(state);
        self.initial_states.insert(state);
    }

    /// Marks the state as final, adding it to the states when necessary.
    pub fn add_final_state(&mut self, state: StateIndex) {
        self.states.insert(state);
        self.final_states.insert(state);
    }

    /// Adds the transition `from --[symbol]-> to`. The states are not added,
    /// see [Automaton::validate].
    pub fn add_transition(&mut self, from: StateIndex, symbol: impl Into<String>, to: StateIndex) {
        self.transitions
            .entry(from)
            .or_default()
            .insert(Transition::new(symbol, to));
    }

    /// Relabels the states to `start, start + 1, ...` in the order in which a
    /// breadth first search from the initial states visits them. States that
    /// cannot be reached follow in ascending order of their current index.
    pub fn rename(&mut self, start: StateIndex) -> Result<(), AutomatonError> {
        let order = self.breadth_first_order();

        if !order.is_empty() && start.checked_add(order.len() - 1).is_none() {
            return Err(AutomatonError::StateIdOverflow {
                start,
                num_of_states: order.len(),
            });
        }

        let mapping: FxHashMap<StateIndex, StateIndex> = order
            .iter()
            .enumerate()
            .map(|(position, state)| (*state, start + position))
            .collect();

        // Transitions to unknown states keep their destination.
        let rename = |state: StateIndex| mapping.get(&state).copied().unwrap_or(state);

        trace!("Renaming {} states starting at {start}", order.len());

        self.states = self.states.iter().map(|state| rename(*state)).collect();
        self.initial_states = self.initial_states.iter().map(|state| rename(*state)).collect();
        self.final_states = self.final_states.iter().map(|state| rename(*state)).collect();
        self.transitions = std::mem::take(&mut self.transitions)
            .into_iter()
            .map(|(from, transitions)| {
                (
                    rename(from),
                    transitions
                        .into_iter()
                        .map(|transition| Transition::new(transition.symbol, rename(transition.to)))
                        .collect(),
                )
            })
            .collect();

        Ok(())
    }

    /// Removes all states, symbols and transitions. The kind is retained.
    pub fn clear(&mut self) {
        self.states.clear();
        self.alphabet.clear();
        self.initial_states.clear();
        self.final_states.clear();
        self.transitions.clear();
    }

    /// Checks the structural invariants of the automaton, and additionally the
    /// deterministic invariants when it is tagged as a DFA.
    pub fn validate(&self) -> Result<(), AutomatonError> {
        if let Some(state) = self
            .initial_states
            .iter()
            .chain(self.final_states.iter())
            .find(|state| !self.states.contains(*state))
        {
            return Err(AutomatonError::UnknownState(*state));
        }

        for (from, transitions) in &self.transitions {
            for transition in transitions {
                if !self.states.contains(from) || !self.states.contains(&transition.to) {
                    return Err(AutomatonError::DanglingTransition {
                        from: *from,
                        symbol: transition.symbol.clone(),
                        to: transition.to,
                    });
                }

                if !transition.is_epsilon() && !self.alphabet.contains(&transition.symbol) {
                    return Err(AutomatonError::UnknownSymbol {
                        from: *from,
                        symbol: transition.symbol.clone(),
                    });
                }
            }
        }

        if self.is_deterministic() {
            if self.initial_states.len() != 1 {
                return Err(AutomatonError::InitialStateCount(self.initial_states.len()));
            }

            if self.alphabet.contains(EPSILON) {
                return Err(AutomatonError::EpsilonInDfa);
            }

            for (from, transitions) in &self.transitions {
                let mut seen: FxHashSet<&str> = FxHashSet::default();
                for transition in transitions {
                    if transition.is_epsilon() {
                        return Err(AutomatonError::EpsilonInDfa);
                    }

                    if !seen.insert(transition.symbol()) {
                        return Err(AutomatonError::NonDeterministic {
                            from: *from,
                            symbol: transition.symbol.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Returns all states, first the ones reachable from the initial states in
    /// breadth first order and then the remaining states in ascending order.
    fn breadth_first_order(&self) -> Vec<StateIndex> {
        let mut order: Vec<StateIndex> = Vec::with_capacity(self.states.len());
        let mut visited: FxHashSet<StateIndex> = FxHashSet::default();
        let mut queue: VecDeque<StateIndex> = VecDeque::new();

        for initial in &self.initial_states {
            if visited.insert(*initial) {
                order.push(*initial);
                queue.push_back(*initial);
            }
        }

        while let Some(state) = queue.pop_front() {
            for transition in self.outgoing_transitions(state) {
                if visited.insert(transition.to) {
                    order.push(transition.to);
                    queue.push_back(transition.to);
                }
            }
        }

        order.extend(self.states.iter().filter(|state| !visited.contains(*state)));
        order
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Kind: {}", self.kind)?;
        writeln!(f, "Number of states: {}", self.states.len())?;
        writeln!(f, "Number of symbols: {}", self.alphabet.len())?;
        write!(f, "Number of transitions: {}", self.num_of_transitions())
    }
}

impl fmt::Debug for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self)?;
        writeln!(f, "Alphabet: {:?}", self.alphabet)?;
        writeln!(f, "Initial states: {:?}", self.initial_states)?;
        writeln!(f, "Final states: {:?}", self.final_states)?;

        for (from, transitions) in &self.transitions {
            for transition in transitions {
                writeln!(f, "{from} --[{}]-> {}", transition.symbol, transition.to)?;
            }
        }

        Ok(())
    }
}
