//! Range compression turns the set of symbols on all transitions between one pair of states into a
//! short label. Maximal runs of consecutive symbols (by code point) that are at least
//! [`MIN_RANGE_LEN`] long are written as `first-last`, every other symbol stands for itself.
//!
//! ```
//! use dfa_trace::prelude::*;
//!
//! assert_eq!(compress_symbols(['3', '4']), "3,4");
//! assert_eq!(compress_symbols(['5', '3', '4']), "3-5");
//! assert_eq!(compress_symbols("abcxz0".chars()), "0,a-c,x,z");
//! ```

use itertools::Itertools;

use crate::alphabet::Symbol;

/// Runs shorter than this are emitted as individual symbols, as a range like `3-4` is not
/// shorter than `3,4`.
pub const MIN_RANGE_LEN: usize = 3;

/// Separator placed between the tokens of a compressed label.
pub const SEPARATOR: &str = ",";

/// Splits the sorted, duplicate-free `symbols` into maximal runs of consecutive code points.
/// Each run is given by its first and last symbol together with its length.
fn runs(symbols: &[Symbol]) -> Vec<(Symbol, Symbol, usize)> {
    let mut out: Vec<(Symbol, Symbol, usize)> = Vec::new();
    for &sym in symbols {
        match out.last_mut() {
            Some((_, last, len)) if (*last as u32) + 1 == sym as u32 => {
                *last = sym;
                *len += 1;
            }
            _ => out.push((sym, sym, 1)),
        }
    }
    out
}

/// Computes the tokens of the compressed label for the given symbols in ascending order.
/// Duplicates are ignored and an empty input gives no tokens.
pub fn compress_tokens<I>(symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = Symbol>,
{
    let sorted = symbols.into_iter().sorted().dedup().collect_vec();

    runs(&sorted)
        .into_iter()
        .flat_map(|(first, last, len)| {
            if len >= MIN_RANGE_LEN {
                vec![format!("{first}-{last}")]
            } else {
                (first..=last).map(|sym| sym.to_string()).collect()
            }
        })
        .collect()
}

/// Compresses the given symbols into a single label, see [`compress_tokens`]. The tokens are
/// joined with [`SEPARATOR`].
pub fn compress_symbols<I>(symbols: I) -> String
where
    I: IntoIterator<Item = Symbol>,
{
    compress_tokens(symbols).join(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::expand_symbols;

    #[test]
    fn two_element_runs_stay_apart() {
        assert_eq!(compress_symbols(['3', '4']), "3,4");
        assert_eq!(compress_symbols(['3', '4', '5']), "3-5");
        assert_eq!(compress_symbols(['a', 'b', 'd', 'e', 'f']), "a,b,d-f");
    }

    #[test]
    fn expanded_range_compresses_back() {
        let symbols = expand_symbols("a-z").unwrap();
        assert_eq!(compress_tokens(symbols), vec!["a-z".to_string()]);

        let symbols = expand_symbols("0-9, a-f, x").unwrap();
        assert_eq!(compress_symbols(symbols), "0-9,a-f,x");
    }

    #[test]
    fn order_and_duplicates_do_not_matter() {
        assert_eq!(compress_symbols("cbaabc".chars()), "a-c");
        assert_eq!(compress_symbols(['z', '0']), "0,z");
    }

    #[test]
    fn runs_are_maximal() {
        assert_eq!(
            runs(&['a', 'b', 'c', 'e']),
            vec![('a', 'c', 3), ('e', 'e', 1)]
        );
        assert!(runs(&[]).is_empty());
    }

    #[test]
    fn empty_input_gives_empty_label() {
        assert!(compress_tokens([]).is_empty());
        assert_eq!(compress_symbols([]), "");
    }
}
