use crate::{alphabet::Symbol, automaton::Trace, Set, State};

/// All transitions from `source` to `target`, summarized by a compressed label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeGroup {
    /// The state from which the transitions originate.
    pub source: State,
    /// The state to which the transitions lead.
    pub target: State,
    /// The symbols of the transitions in ascending order.
    pub symbols: Vec<Symbol>,
    /// The compressed label, see [`crate::compress::compress_symbols`].
    pub label: String,
}

impl EdgeGroup {
    /// Returns true if the group contains a transition from `source` to `target` on `symbol`.
    pub fn covers(&self, source: &str, symbol: Symbol, target: &str) -> bool {
        self.source == source && self.target == target && self.symbols.contains(&symbol)
    }
}

/// The part of a [`Structure`] that a renderer should emphasize, obtained from a [`Trace`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Highlight {
    /// The visited states.
    pub states: Set<State>,
    /// The traversed transitions as triples of source, symbol and target.
    pub edges: Set<(State, Symbol, State)>,
}

impl Highlight {
    /// Returns true if `state` was visited.
    pub fn contains_state(&self, state: &str) -> bool {
        self.states.contains(state)
    }

    /// Returns true if any transition of `group` was traversed.
    pub fn contains_group(&self, group: &EdgeGroup) -> bool {
        self.edges
            .iter()
            .any(|(p, a, q)| group.covers(p, *a, q))
    }
}

impl From<&Trace> for Highlight {
    fn from(trace: &Trace) -> Self {
        Self {
            states: trace.path().iter().cloned().collect(),
            edges: trace.edges().iter().cloned().collect(),
        }
    }
}

/// Abstract description of an automaton, consisting of its states, the accepting ones among them,
/// the grouped transitions and optionally a highlighted run. This is everything a renderer needs,
/// see [`crate::dot::Dottable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    /// A name for the automaton.
    pub name: String,
    /// All states in declaration order.
    pub states: Vec<State>,
    /// The initial state.
    pub initial: State,
    /// The accepting states in declaration order.
    pub finals: Vec<State>,
    /// All groups of transitions.
    pub edges: Vec<EdgeGroup>,
    /// The highlighted run, if any.
    pub highlight: Option<Highlight>,
}

impl Structure {
    /// Returns true if `state` is accepting.
    pub fn is_final(&self, state: &str) -> bool {
        self.finals.iter().any(|q| q == state)
    }

    /// Returns true if `state` is part of the highlighted run.
    pub fn is_highlighted_state(&self, state: &str) -> bool {
        self.highlight
            .as_ref()
            .is_some_and(|h| h.contains_state(state))
    }

    /// Returns true if some transition of `group` is part of the highlighted run.
    pub fn is_highlighted_group(&self, group: &EdgeGroup) -> bool {
        self.highlight
            .as_ref()
            .is_some_and(|h| h.contains_group(group))
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::ends_in_one;

    #[test]
    fn highlight_follows_trace() {
        let dfa = ends_in_one();
        let trace = dfa.validate_string("10").unwrap();
        let structure = dfa.structure("ends_in_one", Some(&trace));

        assert_eq!(structure.states, ["q0", "q1"]);
        assert_eq!(structure.finals, ["q1"]);
        assert!(structure.is_final("q1"));
        assert!(structure.is_highlighted_state("q0"));
        assert!(structure.is_highlighted_state("q1"));

        let highlighted = structure
            .edges
            .iter()
            .filter(|g| structure.is_highlighted_group(g))
            .map(|g| (g.source.as_str(), g.target.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(highlighted, [("q0", "q1"), ("q1", "q0")]);
    }

    #[test]
    fn static_structure_has_no_highlight() {
        let dfa = ends_in_one();
        let structure = dfa.structure("ends_in_one", None);
        assert!(structure.highlight.is_none());
        assert_eq!(structure.edges.len(), 4);
        assert!(!structure.is_highlighted_state("q0"));
        assert!(structure.edges.iter().all(|g| g.symbols.len() == 1));
    }
}
