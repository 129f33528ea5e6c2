use thiserror::Error;

use fsarust_automata::AutomatonError;
use fsarust_automata::StateIndex;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OperationError {
    #[error("Subset construction discovered more than {limit} states")]
    StateLimitExceeded { limit: usize },

    #[error("The state ranges of both operands overlap at state {0}")]
    IdCollision(StateIndex),

    #[error("No state index is available above {0}")]
    IdRangeExhausted(StateIndex),

    #[error(transparent)]
    Automaton(#[from] AutomatonError),
}
