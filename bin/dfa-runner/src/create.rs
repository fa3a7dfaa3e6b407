//! Interactive construction of an automaton, prompting for one part of the definition after another.

use std::io::{BufRead, Write};

use dfa_trace::prelude::*;
use tracing::debug;

/// Asks for the parts of a definition on `output` and reads the answers from `input`. Invalid
/// answers are reported and the question is repeated. Returns `Ok(None)` if `input` ends early.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> std::io::Result<Option<String>> {
        write!(self.output, "  >> {question}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn complain(&mut self, message: impl std::fmt::Display) -> std::io::Result<()> {
        writeln!(self.output, "  [!] {message}")
    }

    fn alphabet(&mut self) -> std::io::Result<Option<Vec<Symbol>>> {
        writeln!(self.output, "1: Define alphabet (examples: '0-1', 'a-z', 'a b c')")?;
        loop {
            let Some(answer) = self.ask("Alphabet")? else {
                return Ok(None);
            };
            match expand_symbols(&answer) {
                Ok(symbols) => {
                    writeln!(
                        self.output,
                        "  -> Alphabet set ({} symbols): {}",
                        symbols.len(),
                        symbols.show()
                    )?;
                    return Ok(Some(symbols));
                }
                Err(e) => self.complain(format!("Error parsing alphabet: {e}"))?,
            }
        }
    }

    fn state_count(&mut self) -> std::io::Result<Option<usize>> {
        writeln!(self.output, "2: Define states")?;
        loop {
            let Some(answer) = self.ask("Number of states (N)")? else {
                return Ok(None);
            };
            match answer.parse::<usize>() {
                Ok(n) if n > 0 => return Ok(Some(n)),
                Ok(_) => self.complain("Please enter a number greater than 0")?,
                Err(_) => self.complain("Invalid input. Please enter an integer")?,
            }
        }
    }

    fn initial(&mut self, states: &[State]) -> std::io::Result<Option<State>> {
        loop {
            let Some(answer) = self.ask("Initial state")? else {
                return Ok(None);
            };
            if states.contains(&answer) {
                return Ok(Some(answer));
            }
            self.complain(format!("State '{answer}' is not valid"))?;
        }
    }

    fn finals(&mut self, states: &[State]) -> std::io::Result<Option<Vec<State>>> {
        loop {
            let Some(answer) = self.ask("Final states (space separated)")? else {
                return Ok(None);
            };
            let finals: Vec<State> = answer.split_whitespace().map(str::to_string).collect();
            if finals.iter().all(|q| states.contains(q)) {
                return Ok(Some(finals));
            }
            self.complain("One or more states are invalid")?;
        }
    }

    fn transitions(
        &mut self,
        mut definition: Definition,
    ) -> std::io::Result<Option<Definition>> {
        writeln!(
            self.output,
            "4: Define transitions\n  Format: source input target (e.g., 'q0 0 q1', 'q0 a-z q1')\n  Type 'done' to finish"
        )?;
        loop {
            let Some(answer) = self.ask("Transition")? else {
                return Ok(None);
            };
            if answer.eq_ignore_ascii_case("done") {
                return Ok(Some(definition));
            }

            let [source, symbols, target] = answer.split_whitespace().collect::<Vec<_>>()[..]
            else {
                self.complain("Invalid format. Expected: <Source> <Input> <Target>")?;
                continue;
            };
            if !definition.states().iter().any(|q| q == source) {
                self.complain(format!("Source state '{source}' invalid"))?;
                continue;
            }
            if !definition.states().iter().any(|q| q == target) {
                self.complain(format!("Target state '{target}' invalid"))?;
                continue;
            }
            let symbols = match expand_symbols(symbols) {
                Ok(symbols) => symbols,
                Err(e) => {
                    self.complain(format!("Error parsing input range: {e}"))?;
                    continue;
                }
            };
            let unknown: Vec<Symbol> = symbols
                .iter()
                .filter(|a| !definition.alphabet().contains(a))
                .copied()
                .collect();
            if !unknown.is_empty() {
                self.complain(format!("Symbols {} not in alphabet", unknown.show()))?;
                continue;
            }
            debug!("adding {} transitions from {source} to {target}", symbols.len());
            for symbol in symbols {
                definition.push_transition(source, symbol, target);
            }
        }
    }

    /// Runs all prompts and returns the resulting (not yet validated) definition.
    pub fn definition(&mut self) -> std::io::Result<Option<Definition>> {
        let Some(alphabet) = self.alphabet()? else {
            return Ok(None);
        };
        let Some(count) = self.state_count()? else {
            return Ok(None);
        };
        let definition = Definition::with_numbered_states(count).with_alphabet(alphabet);
        writeln!(
            self.output,
            "  -> Generated states: {}",
            definition.states().join(", ")
        )?;

        writeln!(self.output, "3: Initial and final states")?;
        let states = definition.states().to_vec();
        let Some(initial) = self.initial(&states)? else {
            return Ok(None);
        };
        let Some(finals) = self.finals(&states)? else {
            return Ok(None);
        };

        self.transitions(definition.with_initial(initial).with_finals(finals))
    }
}
