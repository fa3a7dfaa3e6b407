//! Parser for the textual definition format.
//!
//! ```text
//! # Comments are allowed
//! ALPHABET: 0-1
//! STATES: q0 q1 q2
//! INITIAL_STATE: q0
//! FINAL_STATES: q2
//! TRANSITIONS:
//! q0 0 q0
//! q0 1 q1
//! q1 0-1 q2
//! ...
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Section names are case-insensitive and each
//! section may appear once. `FINAL_STATES` may be omitted or left empty, all other sections are
//! required. Every line after `TRANSITIONS:` is a transition, its middle field may be a list of
//! symbols and ranges (see [`crate::alphabet::expand_symbols`]), which yields one transition per symbol.

use std::{io::BufRead, path::Path};

use tracing::{debug, info, trace};

use crate::{
    alphabet::{expand_symbols, Symbol},
    error::{LoadError, MalformedDefinition},
    Definition, State, DFA,
};

/// The sections of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Section {
    Alphabet,
    States,
    InitialState,
    FinalStates,
    Transitions,
}

impl Section {
    fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_uppercase().as_str() {
            "ALPHABET" => Some(Section::Alphabet),
            "STATES" => Some(Section::States),
            "INITIAL_STATE" => Some(Section::InitialState),
            "FINAL_STATES" => Some(Section::FinalStates),
            "TRANSITIONS" => Some(Section::Transitions),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Section::Alphabet => "ALPHABET",
            Section::States => "STATES",
            Section::InitialState => "INITIAL_STATE",
            Section::FinalStates => "FINAL_STATES",
            Section::Transitions => "TRANSITIONS",
        }
    }
}

/// What the parser expects next. Before `TRANSITIONS:` every line is a section header, afterwards
/// every line is a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Headers,
    Transitions,
}

#[derive(Debug)]
struct Parser {
    mode: Mode,
    alphabet: Option<Vec<Symbol>>,
    states: Option<Vec<State>>,
    initial: Option<State>,
    finals: Option<Vec<State>>,
    transitions: Vec<(State, Symbol, State)>,
}

impl Parser {
    fn new() -> Self {
        Self {
            mode: Mode::Headers,
            alphabet: None,
            states: None,
            initial: None,
            finals: None,
            transitions: vec![],
        }
    }

    fn feed(&mut self, line: usize, content: &str) -> Result<(), MalformedDefinition> {
        let content = content.trim();
        if content.is_empty() || content.starts_with('#') {
            return Ok(());
        }

        match self.mode {
            Mode::Headers => self.header(line, content),
            Mode::Transitions => self.transition(line, content),
        }
    }

    fn header(&mut self, line: usize, content: &str) -> Result<(), MalformedDefinition> {
        let Some((key, value)) = content.split_once(':') else {
            return Err(MalformedDefinition::ExpectedSection {
                line,
                content: content.to_string(),
            });
        };
        let section = Section::parse(key).ok_or_else(|| MalformedDefinition::UnknownSection {
            line,
            section: key.trim().to_string(),
        })?;
        let value = value.trim();
        trace!("line {line}: section {} with value `{value}`", section.name());

        let duplicate = || MalformedDefinition::DuplicateSection {
            line,
            section: section.name().to_string(),
        };
        let empty = || MalformedDefinition::EmptySection {
            line,
            section: section.name().to_string(),
        };

        match section {
            Section::Alphabet => {
                if self.alphabet.is_some() {
                    return Err(duplicate());
                }
                let symbols = expand_symbols(value)
                    .map_err(|source| MalformedDefinition::SymbolList { line, source })?;
                self.alphabet = Some(symbols);
            }
            Section::States => {
                if self.states.is_some() {
                    return Err(duplicate());
                }
                if value.is_empty() {
                    return Err(empty());
                }
                self.states = Some(value.split_whitespace().map(str::to_string).collect());
            }
            Section::InitialState => {
                if self.initial.is_some() {
                    return Err(duplicate());
                }
                if value.is_empty() {
                    return Err(empty());
                }
                self.initial = Some(value.to_string());
            }
            Section::FinalStates => {
                if self.finals.is_some() {
                    return Err(duplicate());
                }
                self.finals = Some(value.split_whitespace().map(str::to_string).collect());
            }
            Section::Transitions => {
                if !value.is_empty() {
                    return Err(MalformedDefinition::InvalidTransition {
                        line,
                        content: value.to_string(),
                    });
                }
                self.mode = Mode::Transitions;
            }
        }
        Ok(())
    }

    fn transition(&mut self, line: usize, content: &str) -> Result<(), MalformedDefinition> {
        let [source, symbols, target] = content.split_whitespace().collect::<Vec<_>>()[..] else {
            return Err(MalformedDefinition::InvalidTransition {
                line,
                content: content.to_string(),
            });
        };
        let symbols = expand_symbols(symbols)
            .map_err(|source| MalformedDefinition::SymbolList { line, source })?;
        trace!("line {line}: {} transitions from {source} to {target}", symbols.len());
        self.transitions.extend(
            symbols
                .into_iter()
                .map(|symbol| (source.to_string(), symbol, target.to_string())),
        );
        Ok(())
    }

    fn finish(self) -> Result<Definition, MalformedDefinition> {
        let alphabet = self
            .alphabet
            .ok_or(MalformedDefinition::MissingSection(Section::Alphabet.name()))?;
        let states = self
            .states
            .ok_or(MalformedDefinition::MissingSection(Section::States.name()))?;
        let initial = self
            .initial
            .ok_or(MalformedDefinition::MissingSection(Section::InitialState.name()))?;
        if self.mode != Mode::Transitions {
            return Err(MalformedDefinition::MissingSection(Section::Transitions.name()));
        }

        Ok(Definition::default()
            .with_alphabet(alphabet)
            .with_states(states)
            .with_initial(initial)
            .with_finals(self.finals.unwrap_or_default())
            .with_transitions(self.transitions))
    }
}

/// Parses a definition from its textual form. The result is not validated yet, see
/// [`Definition::validate`].
pub fn parse_definition(input: &str) -> Result<Definition, MalformedDefinition> {
    let mut parser = Parser::new();
    for (i, line) in input.lines().enumerate() {
        parser.feed(i + 1, line)?;
    }
    parser.finish()
}

/// Reads a definition line by line from `read`.
pub fn read_definition<R: BufRead>(read: R) -> Result<Definition, LoadError> {
    let mut parser = Parser::new();
    for (i, line) in read.lines().enumerate() {
        parser.feed(i + 1, &line?)?;
    }
    Ok(parser.finish()?)
}

/// Reads the definition stored in the file at `path`.
pub fn load_definition<P: AsRef<Path>>(path: P) -> Result<Definition, LoadError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LoadError::NotFound(path.display().to_string()));
    }
    debug!("loading definition from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_definition(std::io::BufReader::new(file))
}

/// Reads and validates the definition stored in the file at `path`.
pub fn load_dfa<P: AsRef<Path>>(path: P) -> Result<DFA, LoadError> {
    let dfa = load_definition(path.as_ref())?.validate()?;
    info!(
        "loaded DFA with {} states over {} symbols from {}",
        dfa.size(),
        dfa.alphabet().size(),
        path.as_ref().display()
    );
    Ok(dfa)
}
