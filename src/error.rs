#![allow(missing_docs)]

use itertools::Itertools;
use thiserror::Error;

use crate::{alphabet::Symbol, State};

/// Errors that can occur while expanding a list of symbols and ranges such as `a-z, 0-9, _`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SymbolListError {
    #[error("invalid range `{0}-{1}`, start lies after end")]
    DescendingRange(Symbol, Symbol),
    #[error("symbol list does not contain any symbol")]
    Empty,
}

/// Structural problems in a textual definition, independent of what the definition means.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedDefinition {
    #[error("line {line}: section `{section}` is declared more than once")]
    DuplicateSection { line: usize, section: String },
    #[error("missing `{0}` section")]
    MissingSection(&'static str),
    #[error("line {line}: unknown section `{section}`")]
    UnknownSection { line: usize, section: String },
    #[error("line {line}: expected `SECTION: value`, found `{content}`")]
    ExpectedSection { line: usize, content: String },
    #[error("line {line}: expected `<source> <symbol-or-range> <destination>`, found `{content}`")]
    InvalidTransition { line: usize, content: String },
    #[error("line {line}: `{section}` requires a value")]
    EmptySection { line: usize, section: String },
    #[error("line {line}: {source}")]
    SymbolList {
        line: usize,
        #[source]
        source: SymbolListError,
    },
    #[error("no states are declared")]
    NoStates,
    #[error("the alphabet is empty")]
    EmptyAlphabet,
}

/// A single problem with a candidate definition, as detected by [`crate::Definition::validate`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error(transparent)]
    Malformed(#[from] MalformedDefinition),
    #[error("{role} `{state}` is not a declared state")]
    UndeclaredState { state: State, role: StateRole },
    #[error("transition `{origin} {symbol} {target}` uses symbol `{symbol}`, which is not in the alphabet")]
    UndeclaredSymbol {
        origin: State,
        symbol: Symbol,
        target: State,
    },
    #[error("missing transitions for {}", .missing.iter().map(|(q, a)| format!("({q}, {a})")).join(", "))]
    IncompleteTransitions { missing: Vec<(State, Symbol)> },
    #[error("conflicting transitions from `{state}` on `{symbol}`: to `{first}` and to `{second}`")]
    ConflictingTransition {
        state: State,
        symbol: Symbol,
        first: State,
        second: State,
    },
}

/// The place in which a state is referenced, used to point at the offending part of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateRole {
    Initial,
    Final,
    Source,
    Target,
}

impl std::fmt::Display for StateRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                StateRole::Initial => "initial state",
                StateRole::Final => "final state",
                StateRole::Source => "transition source",
                StateRole::Target => "transition target",
            }
        )
    }
}

/// Collects every [`DefinitionError`] that a single validation pass has found. The contained
/// list is never empty.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid definition: {}", .errors.iter().join("; "))]
pub struct InvalidDefinition {
    errors: Vec<DefinitionError>,
}

impl InvalidDefinition {
    pub(crate) fn new(errors: Vec<DefinitionError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self { errors }
    }

    /// Returns all problems in the order in which they were detected.
    pub fn errors(&self) -> &[DefinitionError] {
        &self.errors
    }

    /// Consumes `self` and returns the list of problems.
    pub fn into_errors(self) -> Vec<DefinitionError> {
        self.errors
    }
}

impl From<MalformedDefinition> for InvalidDefinition {
    fn from(value: MalformedDefinition) -> Self {
        Self::new(vec![value.into()])
    }
}

/// Raised when an input contains a symbol outside of the alphabet. Such an input is neither
/// accepted nor rejected, the execution stops at `position`.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("symbol `{symbol}` at position {position} is not in the alphabet")]
pub struct InvalidSymbolError {
    pub symbol: Symbol,
    pub position: usize,
}

/// Everything that can go wrong when obtaining an automaton from a textual definition.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read definition: {0}")]
    Io(#[from] std::io::Error),
    #[error("definition file not found: {0}")]
    NotFound(String),
    #[error("malformed definition: {0}")]
    Malformed(#[from] MalformedDefinition),
    #[error(transparent)]
    Invalid(#[from] InvalidDefinition),
}
