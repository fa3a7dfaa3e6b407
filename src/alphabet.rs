use std::collections::BTreeSet;

use itertools::Itertools;
use tracing::trace;

use crate::{error::SymbolListError, Set, Show};

/// A single symbol of an alphabet. Symbols are ordered by their code point, this order is only
/// used for presentation and never influences the execution of an automaton.
pub type Symbol = char;

/// Represents a finite alphabet where each [`Symbol`] is a single `char`. The symbols are kept
/// sorted and free of duplicates, membership queries take expected constant time.
///
/// # Example
/// ```
/// use dfa_trace::prelude::*;
///
/// let alphabet = Alphabet::from_iter(['b', 'a', 'b']);
/// assert_eq!(alphabet.size(), 2);
/// assert_eq!(alphabet.universe().collect::<Vec<_>>(), vec!['a', 'b']);
/// assert!(alphabet.contains('a'));
/// assert!(!alphabet.contains('c'));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<Symbol>,
    lookup: Set<Symbol>,
}

impl Alphabet {
    /// Parses an alphabet given in range notation, see [`expand_symbols`].
    pub fn parse(input: &str) -> Result<Self, SymbolListError> {
        Ok(expand_symbols(input)?.into_iter().collect())
    }

    /// Returns the number of symbols.
    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if and only if the alphabet has no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns true if and only if `symbol` belongs to the alphabet.
    pub fn contains(&self, symbol: Symbol) -> bool {
        self.lookup.contains(&symbol)
    }

    /// Iterates over all symbols in ascending order.
    pub fn universe(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter().copied()
    }

    /// Returns the position of `symbol` in the ascending order of all symbols.
    pub fn position(&self, symbol: Symbol) -> Option<usize> {
        self.symbols.binary_search(&symbol).ok()
    }
}

impl FromIterator<Symbol> for Alphabet {
    fn from_iter<T: IntoIterator<Item = Symbol>>(iter: T) -> Self {
        let symbols: Vec<_> = iter.into_iter().unique().sorted().collect();
        let lookup = symbols.iter().copied().collect();
        Self { symbols, lookup }
    }
}

impl Show for Alphabet {
    fn show(&self) -> String {
        format!("{{{}}}", self.symbols.iter().join(", "))
    }
}

/// Expands a list of symbols and ranges into the individual symbols it denotes. This is the
/// inverse of [`crate::compress::compress_symbols`].
///
/// Commas and whitespace separate the parts of the list. A part consisting of exactly three
/// characters with a `-` in the middle, like `a-z`, is a range and denotes all symbols from the
/// first to the last character (both inclusive). Any other part denotes each of its characters,
/// so `abc` gives `a`, `b` and `c`, and a lone `-` is just the symbol `-`.
///
/// The result is sorted and free of duplicates.
///
/// # Example
/// ```
/// use dfa_trace::prelude::*;
///
/// assert_eq!(expand_symbols("0-3, _").unwrap(), vec!['0', '1', '2', '3', '_']);
/// assert!(expand_symbols("z-a").is_err());
/// ```
pub fn expand_symbols(input: &str) -> Result<Vec<Symbol>, SymbolListError> {
    let mut out = BTreeSet::new();

    for part in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
    {
        let chars = part.chars().collect_vec();
        match chars.as_slice() {
            [start, '-', end] => {
                if start > end {
                    return Err(SymbolListError::DescendingRange(*start, *end));
                }
                trace!("expanding range {start}-{end}");
                out.extend(*start..=*end);
            }
            _ => out.extend(chars),
        }
    }

    if out.is_empty() {
        return Err(SymbolListError::Empty);
    }
    Ok(out.into_iter().collect())
}
