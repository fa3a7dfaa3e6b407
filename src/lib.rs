//! Library for defining, validating and executing deterministic finite automata (DFA).
//!
//! A DFA is built from a [`Definition`], which is the raw candidate as it is read from a textual
//! description or assembled by hand. Calling [`Definition::validate`] checks the candidate for
//! well-formedness in a single pass and either produces an immutable [`DFA`] or reports every problem
//! that was found at once. The central operation on a [`DFA`] is [`DFA::validate_string`], which runs
//! an input and reconstructs the exact sequence of states and edges that was traversed.
//!
//! For display purposes, the transitions between any two states are collapsed into [`EdgeGroup`]s whose
//! labels are compressed into ranges (see [`compress`]), and the whole automaton together with an optional
//! highlighted [`Trace`] can be turned into a [`Structure`], which in turn can be written in the DOT format
//! (see [`dot::Dottable`]).
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use dfa_trace::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::{expand_symbols, Alphabet, Symbol},
        automaton::{StateIndex, Trace, TransitionKey, DFA},
        compress::{compress_symbols, compress_tokens},
        definition::Definition,
        dot::{Dottable, ImageFormat, RenderOptions},
        error::{
            DefinitionError, InvalidDefinition, InvalidSymbolError, LoadError,
            MalformedDefinition, SymbolListError,
        },
        loader::{load_definition, load_dfa, parse_definition, read_definition},
        session::{Command, Outcome, Session, SessionError},
        structure::{EdgeGroup, Highlight, Structure},
        Map, Set, Show, State,
    };
}

/// Symbols, alphabets and the expansion of range notation into individual symbols.
pub mod alphabet;

/// The deterministic automaton itself and the execution of inputs on it.
#[allow(clippy::upper_case_acronyms)]
pub mod automaton;

/// Collapses sets of symbols into short, human readable labels.
pub mod compress;

/// The raw candidate definition and its validation.
pub mod definition;

/// Output in the DOT format of graphviz and rendering through the `dot` binary.
pub mod dot;

/// All errors that can occur while loading, validating and executing automata.
pub mod error;

/// Parsing of the textual definition format.
pub mod loader;

/// The context that an interactive front end operates on.
pub mod session;

/// The abstract description of an automaton that a renderer consumes.
pub mod structure;

pub use automaton::{Trace, DFA};
pub use definition::Definition;
pub use structure::{EdgeGroup, Structure};

use itertools::Itertools;

/// The name of a state. States carry no structure besides their name, two states are the
/// same if and only if their names coincide.
pub type State = String;

/// Helper trait which can be used to display states, transitions and such.
pub trait Show {
    /// Returns a human readable representation of `self`, for a state that should be its name
    /// and for a transition (q0, a, q1) it should be (q0, a, q1).
    fn show(&self) -> String;
}

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for String {
    fn show(&self) -> String {
        self.clone()
    }
}

impl Show for str {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl<S: Show, T: Show, U: Show> Show for (S, T, U) {
    fn show(&self) -> String {
        format!("({}, {}, {})", self.0.show(), self.1.show(), self.2.show())
    }
}

impl<S: Show> Show for [S] {
    fn show(&self) -> String {
        format!("[{}]", self.iter().map(Show::show).join(", "))
    }
}

impl<S: Show> Show for Vec<S> {
    fn show(&self) -> String {
        self.as_slice().show()
    }
}

impl<S: Show + ?Sized> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    /// Recognizes all words over `{0, 1}` that end in `1`.
    pub fn ends_in_one() -> DFA {
        Definition::default()
            .with_alphabet(['0', '1'])
            .with_states(["q0", "q1"])
            .with_initial("q0")
            .with_finals(["q1"])
            .with_transitions([
                ("q0", '0', "q0"),
                ("q0", '1', "q1"),
                ("q1", '0', "q0"),
                ("q1", '1', "q1"),
            ])
            .validate()
            .expect("definition is well-formed")
    }

    #[test]
    fn show_trace_edges() {
        let edges = vec![
            ("q0".to_string(), '1', "q1".to_string()),
            ("q1".to_string(), '0', "q0".to_string()),
        ];
        assert_eq!(edges.show(), "[(q0, 1, q1), (q1, 0, q0)]");
    }
}
