use std::fmt;
use std::fs::File;
use std::io::stdin;
use std::io::stdout;
use std::io::BufRead;
use std::io::BufWriter;
use std::process::ExitCode;

use anyhow::Context;
use clap::ArgAction;
use clap::ArgMatches;
use clap::CommandFactory;
use clap::FromArgMatches;
use log::debug;
use log::info;

use fsarust_automata::Automaton;
use fsarust_io::io_automaton::read_automaton;
use fsarust_io::io_automaton::write_automaton;
use fsarust_operations::concatenation;
use fsarust_operations::determinize;
use fsarust_operations::intersection;
use fsarust_operations::minimize;
use fsarust_operations::union;
use fsarust_operations::DeterminizeOptions;
use fsarust_utilities::Timing;

#[derive(clap::Parser, Debug)]
#[command(
    name = "fsaop",
    about = "Applies operations to finite automata, in the order given on the command line",
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, num_args = 2, value_names = ["LEFT", "RIGHT"], action = ArgAction::Append)]
    union: Vec<String>,

    #[arg(long, num_args = 2, value_names = ["LEFT", "RIGHT"], action = ArgAction::Append)]
    intersection: Vec<String>,

    #[arg(long, num_args = 2, value_names = ["LEFT", "RIGHT"], action = ArgAction::Append)]
    concatenation: Vec<String>,

    #[arg(long, num_args = 1, value_name = "FILE", action = ArgAction::Append)]
    determinization: Vec<String>,

    #[arg(long, num_args = 1, value_name = "FILE", action = ArgAction::Append)]
    minimization: Vec<String>,

    /// Aborts the subset construction after discovering this many states.
    #[arg(long)]
    max_states: Option<usize>,

    #[arg(long)]
    time: bool,
}

/// A single operation requested on the command line with its input files.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Operation {
    Union(String, String),
    Intersection(String, String),
    Concatenation(String, String),
    Determinization(String),
    Minimization(String),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Union(left, right) => write!(f, "union of {left} and {right}"),
            Operation::Intersection(left, right) => write!(f, "intersection of {left} and {right}"),
            Operation::Concatenation(left, right) => write!(f, "concatenation of {left} and {right}"),
            Operation::Determinization(input) => write!(f, "determinization of {input}"),
            Operation::Minimization(input) => write!(f, "minimization of {input}"),
        }
    }
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Operation::Union(..) => "union",
            Operation::Intersection(..) => "intersection",
            Operation::Concatenation(..) => "concatenation",
            Operation::Determinization(_) => "determinization",
            Operation::Minimization(_) => "minimization",
        }
    }

    fn perform(&self, options: &DeterminizeOptions) -> anyhow::Result<Automaton> {
        let result = match self {
            Operation::Union(left, right) => union(&load(left)?, &load(right)?, options)?,
            Operation::Intersection(left, right) => intersection(&load(left)?, &load(right)?, options)?,
            Operation::Concatenation(left, right) => concatenation(&load(left)?, &load(right)?, options)?,
            Operation::Determinization(input) => determinize(&load(input)?, options)?,
            Operation::Minimization(input) => minimize(&load(input)?, options)?,
        };

        Ok(result)
    }
}

/// Collects the requested operations sorted on their position in the
/// command line.
fn operations_in_order(matches: &ArgMatches) -> Vec<Operation> {
    let mut operations: Vec<(usize, Operation)> = Vec::new();

    for id in ["union", "intersection", "concatenation", "determinization", "minimization"] {
        let (Some(indices), Some(occurrences)) = (matches.indices_of(id), matches.get_occurrences::<String>(id)) else {
            continue;
        };

        let indices: Vec<usize> = indices.collect();
        let mut position = 0;

        for values in occurrences {
            let values: Vec<String> = values.cloned().collect();
            let index = indices.get(position).copied().unwrap_or_default();
            position += values.len();

            let operation = match (id, values.as_slice()) {
                ("union", [left, right]) => Operation::Union(left.clone(), right.clone()),
                ("intersection", [left, right]) => Operation::Intersection(left.clone(), right.clone()),
                ("concatenation", [left, right]) => Operation::Concatenation(left.clone(), right.clone()),
                ("determinization", [input]) => Operation::Determinization(input.clone()),
                ("minimization", [input]) => Operation::Minimization(input.clone()),
                _ => continue,
            };

            operations.push((index, operation));
        }
    }

    operations.sort_by_key(|(index, _)| *index);
    operations.into_iter().map(|(_, operation)| operation).collect()
}

fn load(path: &str) -> anyhow::Result<Automaton> {
    let file = File::open(path).with_context(|| format!("Cannot open {path}"))?;
    let automaton = read_automaton(file).with_context(|| format!("Cannot read automaton from {path}"))?;

    info!("Read {path}: {automaton}");
    Ok(automaton)
}

/// Asks for the file to write the result to, returns `None` for stdout.
fn prompt_output_path(operation: &Operation) -> anyhow::Result<Option<String>> {
    eprintln!("Enter the name of the file to save the result of the {operation}, or press enter to print to stdout:");

    let mut line = String::new();
    stdin().lock().read_line(&mut line)?;

    let path = line.trim();
    if path.is_empty() {
        Ok(None)
    } else {
        Ok(Some(path.to_string()))
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let options = DeterminizeOptions {
        max_states: cli.max_states,
    };

    let operations = operations_in_order(&matches);
    debug!("Performing {} operations", operations.len());

    let mut timing = Timing::new();
    for operation in &operations {
        let mut operation_time = timing.start(operation.name());
        let result = operation
            .perform(&options)
            .with_context(|| format!("The {operation} failed"))?;
        operation_time.finish();

        match prompt_output_path(operation)? {
            Some(path) => {
                let mut writer = BufWriter::new(File::create(&path).with_context(|| format!("Cannot create {path}"))?);
                write_automaton(&mut writer, &result)?;
            }
            None => write_automaton(&mut stdout(), &result)?,
        }
    }

    if cli.time {
        timing.print();
    }

    Ok(ExitCode::SUCCESS)
}
