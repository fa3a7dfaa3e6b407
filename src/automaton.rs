use itertools::Itertools;
use tracing::trace;

use crate::{
    alphabet::{Alphabet, Symbol},
    compress::compress_symbols,
    error::InvalidSymbolError,
    structure::{EdgeGroup, Highlight, Structure},
    Map, Set, Show, State,
};

/// Points to a state of a [`DFA`]. Indices are assigned in the order in which the states
/// were declared, starting from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateIndex(pub(crate) u32);

impl StateIndex {
    /// Returns the position of the state in the declaration order.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// The key of the transition table: a state together with the symbol that is read in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionKey {
    /// The state in which the symbol is read.
    pub state: StateIndex,
    /// The symbol that is read.
    pub symbol: Symbol,
}

impl TransitionKey {
    /// Creates a new key.
    pub fn new(state: StateIndex, symbol: Symbol) -> Self {
        Self { state, symbol }
    }
}

/// A deterministic finite automaton (DFA). It consists of a finite set of states, an alphabet,
/// a transition function that assigns precisely one successor to every combination of state and
/// symbol, an initial state and a set of accepting (or final) states.
///
/// A `DFA` can only be obtained through [`crate::Definition::validate`], which guarantees that the
/// transition function is total. It is never modified afterwards and can be shared freely between
/// threads.
///
/// # Example
/// ```
/// use dfa_trace::prelude::*;
///
/// let dfa = Definition::default()
///     .with_alphabet(['0', '1'])
///     .with_states(["q0", "q1"])
///     .with_initial("q0")
///     .with_finals(["q1"])
///     .with_transitions([
///         ("q0", '0', "q0"),
///         ("q0", '1', "q1"),
///         ("q1", '0', "q0"),
///         ("q1", '1', "q1"),
///     ])
///     .validate()
///     .unwrap();
///
/// let trace = dfa.validate_string("101").unwrap();
/// assert!(trace.accepted());
/// assert_eq!(trace.path(), ["q0", "q1", "q0", "q1"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DFA {
    states: Vec<State>,
    indices: Map<State, StateIndex>,
    alphabet: Alphabet,
    transitions: Map<TransitionKey, StateIndex>,
    initial: StateIndex,
    finals: Set<StateIndex>,
}

impl DFA {
    /// Assembles a `DFA` from parts that have already been checked. The caller guarantees that
    /// `transitions` is defined for every state and every symbol of `alphabet`.
    pub(crate) fn from_parts(
        states: Vec<State>,
        alphabet: Alphabet,
        transitions: Map<TransitionKey, StateIndex>,
        initial: StateIndex,
        finals: Set<StateIndex>,
    ) -> Self {
        debug_assert_eq!(transitions.len(), states.len() * alphabet.size());
        let indices = states
            .iter()
            .enumerate()
            .map(|(i, q)| (q.clone(), StateIndex(i as u32)))
            .collect();
        Self {
            states,
            indices,
            alphabet,
            transitions,
            initial,
            finals,
        }
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Returns a reference to the alphabet.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Iterates over the names of all states in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &State> + '_ {
        self.states.iter()
    }

    /// Iterates over the indices of all states in declaration order.
    pub fn state_indices(&self) -> impl Iterator<Item = StateIndex> + '_ {
        (0..self.states.len() as u32).map(StateIndex)
    }

    /// Returns the name of the state with the given index.
    pub fn state_name(&self, idx: StateIndex) -> &State {
        &self.states[idx.index()]
    }

    /// Looks up the index of the state with the given name.
    pub fn state_index(&self, name: &str) -> Option<StateIndex> {
        self.indices.get(name).copied()
    }

    /// Returns the index of the initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Returns the name of the initial state.
    pub fn initial_state(&self) -> &State {
        self.state_name(self.initial)
    }

    /// Returns true if the state with the given index is accepting.
    pub fn is_final(&self, idx: StateIndex) -> bool {
        self.finals.contains(&idx)
    }

    /// Iterates over the names of all accepting states in declaration order.
    pub fn final_states(&self) -> impl Iterator<Item = &State> + '_ {
        self.state_indices()
            .filter(|q| self.is_final(*q))
            .map(|q| self.state_name(q))
    }

    /// Returns the successor of `state` on `symbol`, or `None` if `symbol` is not part of the
    /// alphabet.
    pub fn successor(&self, state: StateIndex, symbol: Symbol) -> Option<StateIndex> {
        self.transitions
            .get(&TransitionKey::new(state, symbol))
            .copied()
    }

    /// Iterates over all transitions as triples of source, symbol and target. Transitions are
    /// ordered by source and within each source by symbol.
    pub fn transitions(&self) -> impl Iterator<Item = (StateIndex, Symbol, StateIndex)> + '_ {
        self.state_indices().flat_map(move |q| {
            self.alphabet.universe().map(move |a| {
                let p = self
                    .successor(q, a)
                    .expect("transition function of a validated DFA is total");
                (q, a, p)
            })
        })
    }

    /// Runs `input` from the initial state and reconstructs the path that is taken. The returned
    /// [`Trace`] holds the sequence of visited states (starting with the initial state), the
    /// sequence of traversed edges and whether the input is accepted.
    ///
    /// If `input` contains a symbol that is not part of the alphabet, execution stops at the first
    /// such symbol and an [`InvalidSymbolError`] pointing to it is returned. Such an input is not
    /// rejected, it is invalid.
    pub fn validate_string(&self, input: &str) -> Result<Trace, InvalidSymbolError> {
        self.run(input.chars())
    }

    /// Like [`Self::validate_string`], but takes an arbitrary sequence of symbols.
    pub fn run<I>(&self, input: I) -> Result<Trace, InvalidSymbolError>
    where
        I: IntoIterator<Item = Symbol>,
    {
        let mut current = self.initial;
        let mut path = vec![current];
        let mut edges = vec![];

        for (position, symbol) in input.into_iter().enumerate() {
            if !self.alphabet.contains(symbol) {
                trace!("symbol {symbol} at position {position} is not in the alphabet, aborting");
                return Err(InvalidSymbolError { symbol, position });
            }
            let next = self
                .successor(current, symbol)
                .expect("transition function of a validated DFA is total");
            trace!(
                "{} --{symbol}--> {}",
                self.state_name(current),
                self.state_name(next)
            );
            edges.push((current, symbol, next));
            current = next;
            path.push(current);
        }

        Ok(Trace {
            accepted: self.is_final(current),
            path: path.into_iter().map(|q| self.state_name(q).clone()).collect(),
            edges: edges
                .into_iter()
                .map(|(p, a, q)| (self.state_name(p).clone(), a, self.state_name(q).clone()))
                .collect(),
        })
    }

    /// Returns true if `input` is accepted.
    pub fn accepts(&self, input: &str) -> Result<bool, InvalidSymbolError> {
        self.validate_string(input).map(|trace| trace.accepted())
    }

    /// Groups all transitions by their source and target and compresses the symbols of each
    /// group into a label, see [`crate::compress`]. Groups are ordered by the declaration order
    /// of their source, then by the name of their target and finally by their smallest symbol.
    pub fn edge_groups(&self) -> Vec<EdgeGroup> {
        let mut groups: Map<(StateIndex, StateIndex), Vec<Symbol>> = Map::default();
        for (p, a, q) in self.transitions() {
            groups.entry((p, q)).or_default().push(a);
        }

        groups
            .into_iter()
            .sorted_by(|((p, q), syms), ((pp, qq), other)| {
                p.cmp(pp)
                    .then_with(|| self.state_name(*q).cmp(self.state_name(*qq)))
                    .then_with(|| syms.iter().min().cmp(&other.iter().min()))
            })
            .map(|((p, q), symbols)| EdgeGroup {
                source: self.state_name(p).clone(),
                target: self.state_name(q).clone(),
                label: compress_symbols(symbols.iter().copied()),
                symbols,
            })
            .collect()
    }

    /// Builds the [`Structure`] that is handed to a renderer. If a `trace` is given, the states
    /// and edges it visits are highlighted.
    pub fn structure(&self, name: &str, trace: Option<&Trace>) -> Structure {
        Structure {
            name: name.to_string(),
            states: self.states.clone(),
            initial: self.initial_state().clone(),
            finals: self.final_states().cloned().collect(),
            edges: self.edge_groups(),
            highlight: trace.map(Highlight::from),
        }
    }

    /// Returns a string representation of the transition table. The initial state is marked
    /// with `->` and accepting states with `*`.
    pub fn transition_table(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("State".to_string()).chain(self.alphabet.universe().map(|a| a.show())),
        );
        for q in self.state_indices() {
            let marker = match (q == self.initial, self.is_final(q)) {
                (true, true) => "->*",
                (true, false) => "->",
                (false, true) => "*",
                (false, false) => "",
            };
            let mut row = vec![format!("{marker}{}", self.state_name(q))];
            row.extend(self.alphabet.universe().map(|a| {
                let p = self
                    .successor(q, a)
                    .expect("transition function of a validated DFA is total");
                self.state_name(p).clone()
            }));
            builder.push_record(row);
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

/// The result of running an input on a [`DFA`]. For an input of length `n`, the path consists of
/// `n + 1` states and there are `n` edges, where the `i`-th edge leads from the `i`-th to the
/// `i + 1`-th state of the path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Trace {
    accepted: bool,
    path: Vec<State>,
    edges: Vec<(State, Symbol, State)>,
}

impl Trace {
    /// Returns true if the run ended in an accepting state.
    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// Returns the visited states, starting with the initial state.
    pub fn path(&self) -> &[State] {
        &self.path
    }

    /// Returns the traversed edges as triples of source, symbol and target.
    pub fn edges(&self) -> &[(State, Symbol, State)] {
        &self.edges
    }

    /// Returns the state in which the run ended.
    pub fn reached(&self) -> &State {
        self.path
            .last()
            .expect("a trace always contains the initial state")
    }

    /// Decomposes `self` into acceptance, path and edges.
    pub fn into_parts(self) -> (bool, Vec<State>, Vec<(State, Symbol, State)>) {
        (self.accepted, self.path, self.edges)
    }
}

impl Show for Trace {
    fn show(&self) -> String {
        self.path.iter().join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use crate::{prelude::*, tests::ends_in_one};

    fn e(p: &str, a: char, q: &str) -> (State, Symbol, State) {
        (p.to_string(), a, q.to_string())
    }

    #[test_log::test]
    fn ends_in_one_accepts() {
        let dfa = ends_in_one();
        let trace = dfa.validate_string("101").unwrap();
        assert!(trace.accepted());
        assert_eq!(trace.path(), ["q0", "q1", "q0", "q1"]);
        assert_eq!(
            trace.edges(),
            [e("q0", '1', "q1"), e("q1", '0', "q0"), e("q0", '1', "q1")]
        );
        assert_eq!(trace.show(), "q0 -> q1 -> q0 -> q1");

        let trace = dfa.validate_string("10").unwrap();
        assert!(!trace.accepted());
        assert_eq!(trace.path(), ["q0", "q1", "q0"]);
        assert_eq!(trace.reached(), "q0");
    }

    #[test]
    fn empty_input_stays_initial() {
        let dfa = ends_in_one();
        let (accepted, path, edges) = dfa.validate_string("").unwrap().into_parts();
        assert!(!accepted);
        assert_eq!(path, vec!["q0".to_string()]);
        assert!(edges.is_empty());
    }

    #[test]
    fn invalid_symbol_is_an_error() {
        let dfa = ends_in_one();
        assert_eq!(
            dfa.validate_string("12"),
            Err(InvalidSymbolError {
                symbol: '2',
                position: 1
            })
        );
        assert_eq!(
            dfa.accepts("x1"),
            Err(InvalidSymbolError {
                symbol: 'x',
                position: 0
            })
        );
    }

    #[test]
    fn trace_lengths_and_determinism() {
        let dfa = ends_in_one();
        for input in ["", "0", "1", "0110", "1111111", "0101010101010"] {
            let trace = dfa.validate_string(input).unwrap();
            assert_eq!(trace.path().len(), input.len() + 1);
            assert_eq!(trace.edges().len(), input.len());
            assert_eq!(trace.accepted(), input.ends_with('1'));
            for (i, (p, _, q)) in trace.edges().iter().enumerate() {
                assert_eq!(p, &trace.path()[i]);
                assert_eq!(q, &trace.path()[i + 1]);
            }
            assert_eq!(dfa.validate_string(input).unwrap(), trace);
        }
    }

    #[test]
    fn accessors() {
        let dfa = ends_in_one();
        assert_eq!(dfa.size(), 2);
        assert_eq!(dfa.initial_state(), "q0");
        assert_eq!(dfa.final_states().collect::<Vec<_>>(), ["q1"]);
        let q1 = dfa.state_index("q1").unwrap();
        assert_eq!(dfa.successor(q1, '0'), dfa.state_index("q0"));
        assert_eq!(dfa.successor(q1, '2'), None);
        assert_eq!(dfa.transitions().count(), 4);
    }

    #[test]
    fn shared_between_threads() {
        let dfa = std::sync::Arc::new(ends_in_one());
        let handles = (0..4)
            .map(|_| {
                let dfa = std::sync::Arc::clone(&dfa);
                std::thread::spawn(move || dfa.accepts("0011").unwrap())
            })
            .collect::<Vec<_>>();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn groups_parallel_edges() {
        let dfa = Definition::default()
            .with_alphabet(expand_symbols("0-9, a").unwrap())
            .with_states(["s", "t"])
            .with_initial("s")
            .with_finals(["t"])
            .with_range_transition("s", "0-4", "s")
            .unwrap()
            .with_range_transition("s", "5-9", "t")
            .unwrap()
            .with_transition("s", 'a', "t")
            .with_range_transition("t", "0-9,a", "t")
            .unwrap()
            .validate()
            .unwrap();

        let groups = dfa
            .edge_groups()
            .into_iter()
            .map(|g| (g.source, g.target, g.label))
            .collect::<Vec<_>>();
        assert_eq!(
            groups,
            vec![
                ("s".to_string(), "s".to_string(), "0-4".to_string()),
                ("s".to_string(), "t".to_string(), "5-9,a".to_string()),
                ("t".to_string(), "t".to_string(), "0-9,a".to_string()),
            ]
        );
    }

    #[test]
    fn edge_groups_order_targets_by_name() {
        let dfa = Definition::default()
            .with_alphabet(['a', 'b', 'c'])
            .with_states(["s", "z", "m"])
            .with_initial("s")
            .with_transitions([("s", 'a', "z"), ("s", 'b', "m"), ("s", 'c', "s")])
            .with_range_transition("z", "a-c", "z")
            .unwrap()
            .with_range_transition("m", "a-c", "m")
            .unwrap()
            .validate()
            .unwrap();

        let groups = dfa
            .edge_groups()
            .into_iter()
            .map(|g| (g.source, g.target, g.label))
            .collect::<Vec<_>>();
        let expected = [
            ("s", "m", "b"),
            ("s", "s", "c"),
            ("s", "z", "a"),
            ("z", "z", "a-c"),
            ("m", "m", "a-c"),
        ]
        .map(|(p, q, l)| (p.to_string(), q.to_string(), l.to_string()));
        assert_eq!(groups, expected);
    }

    #[test]
    fn renders_transition_table() {
        let table = ends_in_one().transition_table();
        assert!(table.contains("->q0"));
        assert!(table.contains("*q1"));
        assert!(table.contains("State"));

        let row = table.lines().find(|line| line.contains("->q0")).unwrap();
        let cells = row
            .split('│')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect::<Vec<_>>();
        assert_eq!(cells, ["->q0", "q0", "q1"]);
    }
}
