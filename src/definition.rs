use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    alphabet::{expand_symbols, Alphabet, Symbol},
    automaton::{StateIndex, TransitionKey, DFA},
    error::{
        DefinitionError, InvalidDefinition, MalformedDefinition, StateRole, SymbolListError,
    },
    Map, Set, State,
};

/// Helper struct for the construction of a [`DFA`]. It stores everything a definition consists of
/// without checking any of it. Transitions are kept as a list, which means a candidate may
/// define the same state and symbol more than once. All checks happen in [`Definition::validate`].
///
/// # Example
///
/// We want to create a DFA with two states `even` and `odd` over the alphabet `['a', 'b']`, that
/// accepts all words with an even number of `b`s.
/// ```
/// use dfa_trace::prelude::*;
///
/// let dfa = Definition::default()
///     .with_alphabet(['a', 'b'])
///     .with_states(["even", "odd"])
///     .with_initial("even")
///     .with_finals(["even"])
///     .with_transitions([
///         ("even", 'a', "even"),
///         ("even", 'b', "odd"),
///         ("odd", 'a', "odd"),
///         ("odd", 'b', "even"),
///     ])
///     .validate()
///     .unwrap();
/// assert!(dfa.accepts("abab").unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Definition {
    states: Vec<State>,
    alphabet: Vec<Symbol>,
    initial: Option<State>,
    finals: Vec<State>,
    transitions: Vec<(State, Symbol, State)>,
}

impl Definition {
    /// Creates a definition with the `count` states `q0` up to `q{count - 1}`.
    pub fn with_numbered_states(count: usize) -> Self {
        Self::default().with_states((0..count).map(|i| format!("q{i}")))
    }

    /// Adds the given symbols to the alphabet.
    pub fn with_alphabet<I: IntoIterator<Item = Symbol>>(mut self, symbols: I) -> Self {
        self.alphabet.extend(symbols);
        self
    }

    /// Declares the given states, in order.
    pub fn with_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<State>,
    {
        self.states.extend(states.into_iter().map(Into::into));
        self
    }

    /// Sets the initial state, replacing any previous one.
    pub fn with_initial<S: Into<State>>(mut self, state: S) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Marks the given states as accepting.
    pub fn with_finals<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<State>,
    {
        self.finals.extend(states.into_iter().map(Into::into));
        self
    }

    /// Adds a single transition.
    pub fn with_transition<S: Into<State>, T: Into<State>>(
        mut self,
        source: S,
        symbol: Symbol,
        target: T,
    ) -> Self {
        self.push_transition(source, symbol, target);
        self
    }

    /// Adds all given transitions, in order.
    pub fn with_transitions<I, S, T>(self, transitions: I) -> Self
    where
        I: IntoIterator<Item = (S, Symbol, T)>,
        S: Into<State>,
        T: Into<State>,
    {
        transitions
            .into_iter()
            .fold(self, |acc, (p, a, q)| acc.with_transition(p, a, q))
    }

    /// Adds one transition from `source` to `target` for every symbol that `symbols` denotes in
    /// range notation, see [`expand_symbols`].
    pub fn with_range_transition<S, T>(
        mut self,
        source: S,
        symbols: &str,
        target: T,
    ) -> Result<Self, SymbolListError>
    where
        S: Into<State>,
        T: Into<State>,
    {
        let (source, target) = (source.into(), target.into());
        for symbol in expand_symbols(symbols)? {
            self.push_transition(source.clone(), symbol, target.clone());
        }
        Ok(self)
    }

    /// Adds a single transition to `self` in place.
    pub fn push_transition<S: Into<State>, T: Into<State>>(
        &mut self,
        source: S,
        symbol: Symbol,
        target: T,
    ) {
        self.transitions.push((source.into(), symbol, target.into()));
    }

    /// Returns the declared states in order.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Returns the declared symbols in order.
    pub fn alphabet(&self) -> &[Symbol] {
        &self.alphabet
    }

    /// Returns the initial state if one is set.
    pub fn initial(&self) -> Option<&State> {
        self.initial.as_ref()
    }

    /// Returns the accepting states.
    pub fn finals(&self) -> &[State] {
        &self.finals
    }

    /// Returns all transitions in the order in which they were added.
    pub fn transitions(&self) -> &[(State, Symbol, State)] {
        &self.transitions
    }

    /// Checks `self` for well-formedness and turns it into a [`DFA`]. This is the only place in
    /// which the totality and determinism of the transition function are established.
    ///
    /// All problems are collected in a single pass, so that they can be fixed at once. The
    /// returned [`InvalidDefinition`] lists, in this order,
    /// - an empty set of states or an empty alphabet,
    /// - a missing or undeclared initial state and undeclared accepting states,
    /// - for each transition, in order, an undeclared source, target or symbol,
    /// - every state and symbol for which transitions to different targets exist,
    /// - all combinations of state and symbol that lack a transition, as one error.
    pub fn validate(self) -> Result<DFA, InvalidDefinition> {
        let mut errors: Vec<DefinitionError> = vec![];

        let states = self.states.into_iter().unique().collect_vec();
        let indices: Map<&str, StateIndex> = states
            .iter()
            .enumerate()
            .map(|(i, q)| (q.as_str(), StateIndex(i as u32)))
            .collect();
        let alphabet = Alphabet::from_iter(self.alphabet);
        debug!(
            "validating definition with {} states and {} symbols",
            states.len(),
            alphabet.size()
        );

        if states.is_empty() {
            errors.push(MalformedDefinition::NoStates.into());
        }
        if alphabet.is_empty() {
            errors.push(MalformedDefinition::EmptyAlphabet.into());
        }

        let undeclared = |state: &State, role: StateRole| DefinitionError::UndeclaredState {
            state: state.clone(),
            role,
        };

        let initial = match &self.initial {
            None => {
                errors.push(MalformedDefinition::MissingSection("INITIAL_STATE").into());
                None
            }
            Some(q) => match indices.get(q.as_str()) {
                Some(idx) => Some(*idx),
                None => {
                    errors.push(undeclared(q, StateRole::Initial));
                    None
                }
            },
        };

        let mut finals = Set::default();
        for q in self.finals.iter().unique() {
            match indices.get(q.as_str()) {
                Some(idx) => {
                    finals.insert(*idx);
                }
                None => errors.push(undeclared(q, StateRole::Final)),
            }
        }

        let mut table: Map<TransitionKey, StateIndex> = Map::default();
        let mut conflicts: Vec<(TransitionKey, StateIndex, StateIndex)> = vec![];
        for (source, symbol, target) in &self.transitions {
            trace!("checking transition {source} {symbol} {target}");
            let p = indices.get(source.as_str()).copied();
            let q = indices.get(target.as_str()).copied();
            if p.is_none() {
                errors.push(undeclared(source, StateRole::Source));
            }
            if q.is_none() {
                errors.push(undeclared(target, StateRole::Target));
            }
            if !alphabet.contains(*symbol) {
                errors.push(DefinitionError::UndeclaredSymbol {
                    origin: source.clone(),
                    symbol: *symbol,
                    target: target.clone(),
                });
                continue;
            }
            let (Some(p), Some(q)) = (p, q) else {
                continue;
            };

            let key = TransitionKey::new(p, *symbol);
            match table.get(&key).copied() {
                None => {
                    table.insert(key, q);
                }
                Some(existing) if existing != q => {
                    if !conflicts.iter().any(|(k, _, _)| *k == key) {
                        conflicts.push((key, existing, q));
                    }
                }
                Some(_) => trace!("ignoring repeated transition {source} {symbol} {target}"),
            }
        }

        errors.extend(
            conflicts
                .into_iter()
                .map(|(key, first, second)| DefinitionError::ConflictingTransition {
                    state: states[key.state.index()].clone(),
                    symbol: key.symbol,
                    first: states[first.index()].clone(),
                    second: states[second.index()].clone(),
                }),
        );

        let missing = states
            .iter()
            .enumerate()
            .flat_map(|(i, q)| {
                alphabet
                    .universe()
                    .filter(|a| !table.contains_key(&TransitionKey::new(StateIndex(i as u32), *a)))
                    .map(|a| (q.clone(), a))
                    .collect_vec()
            })
            .collect_vec();
        if !missing.is_empty() {
            errors.push(DefinitionError::IncompleteTransitions { missing });
        }

        match initial {
            Some(initial) if errors.is_empty() => {
                debug!("definition is well-formed");
                Ok(DFA::from_parts(states, alphabet, table, initial, finals))
            }
            _ => {
                debug!("definition has {} problems", errors.len());
                Err(InvalidDefinition::new(errors))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::StateRole, prelude::*};

    fn binary() -> Definition {
        Definition::default()
            .with_alphabet(['0', '1'])
            .with_states(["q0", "q1"])
            .with_initial("q0")
            .with_finals(["q1"])
    }

    #[test_log::test]
    fn reports_exactly_the_missing_pair() {
        let err = binary()
            .with_transitions([("q0", '0', "q0"), ("q0", '1', "q1"), ("q1", '0', "q0")])
            .validate()
            .unwrap_err();
        assert_eq!(
            err.errors(),
            [DefinitionError::IncompleteTransitions {
                missing: vec![("q1".to_string(), '1')]
            }]
        );
    }

    #[test]
    fn reports_all_missing_pairs_in_order() {
        let err = binary()
            .with_transition("q1", '0', "q0")
            .validate()
            .unwrap_err();
        assert_eq!(
            err.into_errors(),
            vec![DefinitionError::IncompleteTransitions {
                missing: vec![
                    ("q0".to_string(), '0'),
                    ("q0".to_string(), '1'),
                    ("q1".to_string(), '1')
                ]
            }]
        );
    }

    #[test]
    fn reports_undeclared_states_and_symbols() {
        let err = Definition::default()
            .with_alphabet(['a'])
            .with_states(["p"])
            .with_initial("x")
            .with_finals(["y", "p"])
            .with_transitions([("p", 'a', "p"), ("z", 'a', "p"), ("p", 'b', "p")])
            .validate()
            .unwrap_err();
        assert_eq!(
            err.errors(),
            [
                DefinitionError::UndeclaredState {
                    state: "x".into(),
                    role: StateRole::Initial
                },
                DefinitionError::UndeclaredState {
                    state: "y".into(),
                    role: StateRole::Final
                },
                DefinitionError::UndeclaredState {
                    state: "z".into(),
                    role: StateRole::Source
                },
                DefinitionError::UndeclaredSymbol {
                    origin: "p".into(),
                    symbol: 'b',
                    target: "p".into()
                },
            ]
        );
    }

    #[test]
    fn reports_conflicts_once() {
        let err = binary()
            .with_transitions([
                ("q0", '0', "q0"),
                ("q0", '0', "q1"),
                ("q0", '0', "q1"),
                ("q0", '1', "q1"),
                ("q1", '0', "q0"),
                ("q1", '1', "q1"),
            ])
            .validate()
            .unwrap_err();
        assert_eq!(
            err.errors(),
            [DefinitionError::ConflictingTransition {
                state: "q0".into(),
                symbol: '0',
                first: "q0".into(),
                second: "q1".into()
            }]
        );
    }

    #[test]
    fn repeated_identical_transitions_are_fine() {
        let dfa = binary()
            .with_range_transition("q0", "0-1", "q1")
            .unwrap()
            .with_range_transition("q1", "0-1", "q1")
            .unwrap()
            .with_transition("q0", '1', "q1")
            .validate()
            .unwrap();
        assert!(dfa.accepts("0").unwrap());
        assert!(!dfa.accepts("").unwrap());
    }

    #[test]
    fn empty_parts_are_malformed() {
        let err = Definition::default().validate().unwrap_err();
        assert_eq!(
            err.errors(),
            [
                DefinitionError::Malformed(MalformedDefinition::NoStates),
                DefinitionError::Malformed(MalformedDefinition::EmptyAlphabet),
                DefinitionError::Malformed(MalformedDefinition::MissingSection("INITIAL_STATE")),
            ]
        );
    }

    #[test]
    fn numbered_states() {
        let def = Definition::with_numbered_states(3);
        assert_eq!(def.states(), ["q0", "q1", "q2"]);
    }

    #[test]
    fn no_final_states_is_allowed() {
        let dfa = Definition::with_numbered_states(1)
            .with_alphabet(['a'])
            .with_initial("q0")
            .with_transition("q0", 'a', "q0")
            .validate()
            .unwrap();
        assert_eq!(dfa.final_states().count(), 0);
        assert!(!dfa.accepts("aaa").unwrap());
    }
}
