use std::io;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;

use log::trace;
use regex::Regex;
use streaming_iterator::StreamingIterator;
use thiserror::Error;

use fsarust_automata::Automaton;
use fsarust_automata::AutomatonError;
use fsarust_automata::AutomatonKind;
use fsarust_automata::StateIndex;

use crate::line_iterator::LineIterator;

#[derive(Error, Debug)]
pub enum IOError {
    #[error("The file is empty")]
    EmptyFile,

    #[error("Unknown automaton kind {0}, expected DFA or NFA")]
    UnknownKind(String),

    #[error("Symbol {0} occurs more than once in the header")]
    DuplicateSymbol(String),

    #[error("Line {line}: invalid state line")]
    InvalidStateLine { line: usize },

    #[error("Line {line}: expected {expected} transition fields but found {found}")]
    FieldCount { line: usize, expected: usize, found: usize },

    #[error("Line {line}: invalid transition field {field}")]
    InvalidField { line: usize, field: String },

    #[error("Line {line}: invalid state index {text}")]
    InvalidIndex { line: usize, text: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Automaton(#[from] AutomatonError),
}

/// Loads a finite automaton in the textual format from the given reader.
///
/// The format consists of a header with the kind followed by the symbols:
///     `DFA a b`
///
/// And one line for every state with an optional marker (`>` initial, `<`
/// final, `<>` or `><` both), the state index and one field per symbol that
/// is either `-` or the destinations separated by `|`:
///     `<> 0 1 -`
///     `   1 0|1 1`
///
/// The result is validated, so a DFA has exactly one initial state and at
/// most one destination per symbol.
pub fn read_automaton(reader: impl Read) -> Result<Automaton, IOError> {
    let mut lines = LineIterator::new(reader);
    lines.advance();

    let Some(header) = lines.get().cloned() else {
        return Err(lines.take_error().map_or(IOError::EmptyFile, IOError::Io));
    };

    let mut tokens = header.split_whitespace();
    let kind = match tokens.next() {
        Some("DFA") => AutomatonKind::Dfa,
        Some("NFA") => AutomatonKind::Nfa,
        Some(token) => return Err(IOError::UnknownKind(token.to_string())),
        None => return Err(IOError::EmptyFile),
    };

    let mut automaton = Automaton::new(kind);
    let symbols: Vec<&str> = tokens.collect();
    for symbol in &symbols {
        if automaton.alphabet().contains(*symbol) {
            return Err(IOError::DuplicateSymbol(symbol.to_string()));
        }

        automaton.add_symbol(*symbol);
    }

    // Regex for <marker>? <state>: Nat <fields>
    let state_regex = Regex::new(r#"^\s*(<>|><|>|<)?\s*([0-9]+)(?:\s+(.*?))?\s*$"#)
        .expect("Regex compilation should not fail");

    // Regex for a field, either - or destinations separated by |
    let field_regex = Regex::new(r#"^(?:-|[0-9]+(?:\|[0-9]+)*)$"#).expect("Regex compilation should not fail");

    while let Some(line) = lines.next() {
        let line = line.clone();
        let line_number = lines.line_number();

        if line.trim().is_empty() {
            continue;
        }

        trace!("{}", line);

        let captures = state_regex
            .captures(&line)
            .ok_or(IOError::InvalidStateLine { line: line_number })?;

        let state = parse_index(&captures[2], line_number)?;
        automaton.add_state(state);

        match captures.get(1).map(|marker| marker.as_str()) {
            Some(">") => automaton.add_initial_state(state),
            Some("<") => automaton.add_final_state(state),
            Some(_) => {
                automaton.add_initial_state(state);
                automaton.add_final_state(state);
            }
            None => {}
        }

        let fields: Vec<&str> = captures
            .get(3)
            .map(|fields| fields.as_str().split_whitespace().collect())
            .unwrap_or_default();

        if fields.len() != symbols.len() {
            return Err(IOError::FieldCount {
                line: line_number,
                expected: symbols.len(),
                found: fields.len(),
            });
        }

        for (symbol, field) in symbols.iter().zip(fields) {
            if !field_regex.is_match(field) {
                return Err(IOError::InvalidField {
                    line: line_number,
                    field: field.to_string(),
                });
            }

            if field == "-" {
                continue;
            }

            for destination in field.split('|') {
                let to = parse_index(destination, line_number)?;
                automaton.add_state(to);
                automaton.add_transition(state, *symbol, to);

                trace!("Read transition {state} --[{symbol}]-> {to}");
            }
        }
    }

    if let Some(error) = lines.take_error() {
        return Err(error.into());
    }

    automaton.validate()?;
    Ok(automaton)
}

/// Writes the automaton in the textual format accepted by [read_automaton],
/// with the symbols and states in ascending order.
pub fn write_automaton(writer: &mut impl Write, automaton: &Automaton) -> Result<(), IOError> {
    let mut writer = BufWriter::new(writer);

    write!(writer, "{}", automaton.kind())?;
    for symbol in automaton.alphabet() {
        write!(writer, " {symbol}")?;
    }
    writeln!(writer)?;

    for state in automaton.states() {
        let marker = match (automaton.is_initial(*state), automaton.is_final(*state)) {
            (true, true) => "<>",
            (true, false) => " >",
            (false, true) => " <",
            (false, false) => "  ",
        };

        write!(writer, "{marker} {state}")?;

        for symbol in automaton.alphabet() {
            let destinations: Vec<String> = automaton
                .outgoing_transitions(*state)
                .filter(|transition| transition.symbol() == symbol)
                .map(|transition| transition.to().to_string())
                .collect();

            if destinations.is_empty() {
                write!(writer, " -")?;
            } else {
                write!(writer, " {}", destinations.join("|"))?;
            }
        }

        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

fn parse_index(text: &str, line: usize) -> Result<StateIndex, IOError> {
    text.parse().map_err(|_| IOError::InvalidIndex {
        line,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use indoc::indoc;
    use test_log::test;

    use super::*;

    #[test]
    fn test_reading_dfa() {
        let text = indoc! {"
            DFA a b
            >  0 1 -
             < 1 1 2
               2 - -
        "};

        let automaton = read_automaton(text.as_bytes()).unwrap();

        assert_eq!(automaton.kind(), AutomatonKind::Dfa);
        assert_eq!(automaton.states(), &BTreeSet::from([0, 1, 2]));
        assert_eq!(automaton.initial_states(), &BTreeSet::from([0]));
        assert_eq!(automaton.final_states(), &BTreeSet::from([1]));
        assert_eq!(automaton.successor(0, "a"), Some(1));
        assert_eq!(automaton.successor(1, "b"), Some(2));
        assert_eq!(automaton.num_of_transitions(), 3);
    }

    #[test]
    fn test_reading_nfa() {
        let text = indoc! {"
            NFA a *
            >< 0 0|1 2
            >  1 - -
               2 - 1
        "};

        let automaton = read_automaton(text.as_bytes()).unwrap();

        assert_eq!(automaton.kind(), AutomatonKind::Nfa);
        assert_eq!(automaton.initial_states(), &BTreeSet::from([0, 1]));
        assert_eq!(automaton.final_states(), &BTreeSet::from([0]));
        assert_eq!(automaton.num_of_transitions(), 4);
        assert!(automaton.outgoing_transitions(0).any(|t| t.is_epsilon() && t.to() == 2));
    }

    #[test]
    fn test_reading_invalid() {
        assert!(matches!(read_automaton("".as_bytes()), Err(IOError::EmptyFile)));
        assert!(matches!(
            read_automaton("ENFA a\n".as_bytes()),
            Err(IOError::UnknownKind(kind)) if kind == "ENFA"
        ));
        assert!(matches!(
            read_automaton("DFA a a\n".as_bytes()),
            Err(IOError::DuplicateSymbol(_))
        ));
        assert!(matches!(
            read_automaton("DFA a b\n> 0 1\n".as_bytes()),
            Err(IOError::FieldCount { line: 2, expected: 2, found: 1 })
        ));
        assert!(matches!(
            read_automaton("DFA a\n> x 1\n".as_bytes()),
            Err(IOError::InvalidStateLine { line: 2 })
        ));
        assert!(matches!(
            read_automaton("DFA a\n> 0 1|\n".as_bytes()),
            Err(IOError::InvalidField { line: 2, .. })
        ));
        assert!(matches!(
            read_automaton("DFA a\n> 0 0|1\n".as_bytes()),
            Err(IOError::Automaton(AutomatonError::NonDeterministic { .. }))
        ));
        assert!(matches!(
            read_automaton("DFA a\n  0 0\n".as_bytes()),
            Err(IOError::Automaton(AutomatonError::InitialStateCount(0)))
        ));
    }

    #[test]
    fn test_reading_without_symbols() {
        let automaton = read_automaton("DFA\n<> 0\n   1\n".as_bytes()).unwrap();

        assert!(automaton.alphabet().is_empty());
        assert_eq!(automaton.states(), &BTreeSet::from([0, 1]));
        assert_eq!(automaton.final_states(), &BTreeSet::from([0]));

        // The canonical empty language over no symbols is written without symbols.
        let mut output: Vec<u8> = Vec::new();
        write_automaton(&mut output, &Automaton::empty_language(&BTreeSet::new())).unwrap();
        assert_eq!(String::from_utf8(output.clone()).unwrap(), "DFA\n > 0\n");
        assert_eq!(
            read_automaton(&output[..]).unwrap(),
            Automaton::empty_language(&BTreeSet::new())
        );

        assert!(matches!(
            read_automaton("DFA\n> 0 1\n".as_bytes()),
            Err(IOError::FieldCount { line: 2, expected: 0, found: 1 })
        ));
    }

    #[test]
    fn test_writing_automaton() {
        let text = indoc! {"
            NFA a b
            <> 0 1|2 -
             < 1 - 0
               2 - -
        "};

        let automaton = read_automaton(text.as_bytes()).unwrap();

        let mut output: Vec<u8> = Vec::new();
        write_automaton(&mut output, &automaton).unwrap();

        assert_eq!(String::from_utf8(output.clone()).unwrap(), text);
        assert_eq!(read_automaton(&output[..]).unwrap(), automaton);
    }
}
