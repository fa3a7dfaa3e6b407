use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    dot::{RenderError, RenderOptions},
    error::{InvalidSymbolError, LoadError},
    loader::load_dfa,
    Structure, Trace, DFA,
};

#[cfg(feature = "graphviz")]
use crate::dot::Dottable;

/// Errors that a [`Session`] reports back to its front end. None of them end the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An operation needs an automaton, but none is loaded.
    #[error("no automaton is loaded, use `load <path>` first")]
    NoAutomaton,
    /// The command is not known.
    #[error("unknown command `{0}`, type `help` for a list of commands")]
    UnknownCommand(String),
    /// The command requires an argument that was not given.
    #[error("`{0}` requires an argument")]
    MissingArgument(&'static str),
    /// Loading a definition failed.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// The input contains a symbol outside of the alphabet.
    #[error("invalid input: {0}")]
    InvalidSymbol(#[from] InvalidSymbolError),
    /// Writing a diagram failed.
    #[error("could not render diagram: {0}")]
    Render(#[from] RenderError),
    /// The crate was built without the `graphviz` feature.
    #[error("rendering is not available, enable the `graphviz` feature")]
    RenderingUnavailable,
    /// Reading the search directory or creating the session directory failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// The commands understood by a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `load <path>`: load and validate the definition stored at the given path.
    Load(String),
    /// `list`: show the definition files in the search directory.
    List,
    /// `structure`: describe the loaded automaton.
    Structure,
    /// `table`: show the transition table of the loaded automaton.
    Table,
    /// `validate <input>` or `run <input>`: run the input, an absent input is the empty word.
    Validate(String),
    /// `render [<input>]`: write a diagram of the automaton, highlighting the run on the input if given.
    Render(Option<String>),
    /// `help`: list the commands.
    Help,
    /// `exit` or `quit`: end the session.
    Exit,
}

/// Short description of all commands, as shown by `help`.
pub const HELP: &str = "\
load <path>       load a definition from a file
list              show the definitions available in the search directory
structure         show states, final states and grouped transitions
table             show the transition table
validate <input>  run an input (alias: run)
render [<input>]  write a diagram, highlighting the run on <input> if given
help              show this help
exit              leave (alias: quit)";

impl Command {
    /// Parses a line as typed into an interactive prompt. Everything after the command word
    /// (with surrounding whitespace removed) is its argument.
    pub fn parse(line: &str) -> Result<Self, SessionError> {
        let line = line.trim();
        let (word, argument) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, Some(rest.trim()).filter(|rest| !rest.is_empty())),
            None => (line, None),
        };

        match word.to_ascii_lowercase().as_str() {
            "load" => argument
                .map(|path| Command::Load(path.to_string()))
                .ok_or(SessionError::MissingArgument("load")),
            "list" | "ls" => Ok(Command::List),
            "structure" => Ok(Command::Structure),
            "table" => Ok(Command::Table),
            "validate" | "run" => Ok(Command::Validate(argument.unwrap_or_default().to_string())),
            "render" => Ok(Command::Render(argument.map(str::to_string))),
            "help" => Ok(Command::Help),
            "exit" | "quit" => Ok(Command::Exit),
            _ => Err(SessionError::UnknownCommand(word.to_string())),
        }
    }
}

/// The result of successfully executing a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An automaton with the given name was loaded.
    Loaded(String),
    /// The names of the definition files in the search directory.
    Listed(Vec<String>),
    /// The structure of the loaded automaton.
    Structure(Structure),
    /// The rendered transition table.
    Table(String),
    /// The trace of a run.
    Validated(Trace),
    /// A diagram was written to the given path.
    Rendered(PathBuf),
    /// The help text.
    Help(&'static str),
    /// The session should end.
    Exit,
}

/// An automaton together with the name under which it was loaded.
#[derive(Debug, Clone)]
struct Model {
    name: String,
    dfa: DFA,
}

/// Holds everything an interactive front end works with: the currently loaded automaton, the
/// directory into which diagrams are written and the number of trace diagrams written so far.
#[derive(Debug, Clone)]
pub struct Session {
    model: Option<Model>,
    assets_dir: PathBuf,
    session_dir: Option<PathBuf>,
    search_dir: Option<PathBuf>,
    options: RenderOptions,
    trace_count: usize,
}

impl Session {
    /// Creates a session that writes its diagrams into a fresh subdirectory of `assets_dir`.
    /// The subdirectory is only created once the first diagram is written.
    pub fn new<P: Into<PathBuf>>(assets_dir: P, options: RenderOptions) -> Self {
        Self {
            model: None,
            assets_dir: assets_dir.into(),
            session_dir: None,
            search_dir: None,
            options,
            trace_count: 0,
        }
    }

    /// Paths given to `load` that do not exist are additionally looked up in `dir`.
    pub fn with_search_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.search_dir = Some(dir.into());
        self
    }

    /// Replaces the loaded automaton.
    pub fn set_automaton<S: Into<String>>(&mut self, name: S, dfa: DFA) {
        let name = name.into();
        info!("using automaton {name} with {} states", dfa.size());
        self.model = Some(Model { name, dfa });
    }

    /// Returns the loaded automaton, if any.
    pub fn automaton(&self) -> Option<&DFA> {
        self.model.as_ref().map(|m| &m.dfa)
    }

    /// Returns the name of the loaded automaton, if any.
    pub fn name(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.name.as_str())
    }

    /// Returns the number of trace diagrams written so far.
    pub fn trace_count(&self) -> usize {
        self.trace_count
    }

    /// Returns the directory into which diagrams are written, if it was created already.
    pub fn session_dir(&self) -> Option<&Path> {
        self.session_dir.as_deref()
    }

    fn model(&self) -> Result<&Model, SessionError> {
        self.model.as_ref().ok_or(SessionError::NoAutomaton)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let direct = PathBuf::from(path);
        if direct.exists() {
            return direct;
        }
        match &self.search_dir {
            Some(dir) if dir.join(path).exists() => dir.join(path),
            _ => direct,
        }
    }

    /// Loads the definition at `path` and makes it the current automaton. The automaton is named
    /// after the file stem.
    pub fn load(&mut self, path: &str) -> Result<&DFA, SessionError> {
        let path = self.resolve(path);
        let dfa = load_dfa(&path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dfa".to_string());
        self.set_automaton(name, dfa);
        Ok(&self.model()?.dfa)
    }

    /// Lists the `.txt` files in the search directory, sorted by name. Without a search
    /// directory there is nothing to list.
    pub fn definitions(&self) -> Result<Vec<String>, SessionError> {
        let Some(dir) = &self.search_dir else {
            return Ok(vec![]);
        };
        let mut names = vec![];
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
                if let Some(name) = path.file_name() {
                    names.push(name.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        debug!("found {} definitions in {}", names.len(), dir.display());
        Ok(names)
    }

    /// Runs `input` on the loaded automaton.
    pub fn validate(&self, input: &str) -> Result<Trace, SessionError> {
        let trace = self.model()?.dfa.validate_string(input)?;
        debug!("input `{input}` is {}", if trace.accepted() { "accepted" } else { "rejected" });
        Ok(trace)
    }

    /// Describes the loaded automaton, highlighting the run on `input` if given.
    pub fn structure(&self, input: Option<&str>) -> Result<Structure, SessionError> {
        let model = self.model()?;
        let trace = input.map(|w| model.dfa.validate_string(w)).transpose()?;
        Ok(model.dfa.structure(&model.name, trace.as_ref()))
    }

    #[cfg(feature = "graphviz")]
    fn ensure_session_dir(&mut self) -> Result<PathBuf, SessionError> {
        if let Some(dir) = &self.session_dir {
            return Ok(dir.clone());
        }
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let dir = self.assets_dir.join(format!("session_{timestamp}"));
        std::fs::create_dir_all(&dir)?;
        info!("writing diagrams to {}", dir.display());
        self.session_dir = Some(dir.clone());
        Ok(dir)
    }

    /// Writes a diagram of the loaded automaton into the session directory. Without an input, the
    /// diagram is called `dfa_diagram`, otherwise the run on `input` is highlighted and the diagram
    /// is named after the input.
    #[cfg(feature = "graphviz")]
    pub fn render(&mut self, input: Option<&str>) -> Result<PathBuf, SessionError> {
        let structure = self.structure(input)?;
        let dir = self.ensure_session_dir()?;
        let stem = match input {
            None => "dfa_diagram".to_string(),
            Some(w) => trace_file_stem(w),
        };
        let path = structure.render_to_file(&dir.join(stem), &self.options)?;
        if input.is_some() {
            self.trace_count += 1;
        }
        info!("saved {}", path.display());
        Ok(path)
    }

    /// Rendering needs the `graphviz` feature, without it this always fails.
    #[cfg(not(feature = "graphviz"))]
    pub fn render(&mut self, _input: Option<&str>) -> Result<PathBuf, SessionError> {
        self.model()?;
        Err(SessionError::RenderingUnavailable)
    }

    /// Executes a single command.
    pub fn execute(&mut self, command: Command) -> Result<Outcome, SessionError> {
        debug!("executing {command:?}");
        match command {
            Command::Load(path) => {
                self.load(&path)?;
                Ok(Outcome::Loaded(self.model()?.name.clone()))
            }
            Command::List => self.definitions().map(Outcome::Listed),
            Command::Structure => self.structure(None).map(Outcome::Structure),
            Command::Table => Ok(Outcome::Table(self.model()?.dfa.transition_table())),
            Command::Validate(input) => self.validate(&input).map(Outcome::Validated),
            Command::Render(input) => self.render(input.as_deref()).map(Outcome::Rendered),
            Command::Help => Ok(Outcome::Help(HELP)),
            Command::Exit => Ok(Outcome::Exit),
        }
    }
}

/// File name for the diagram of the run on `input`. Characters that are not alphanumeric are
/// replaced by `_`.
pub fn trace_file_stem(input: &str) -> String {
    if input.is_empty() {
        return "trace_empty".to_string();
    }
    let sanitized: String = input
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("trace_{sanitized}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ends_in_one;

    fn demos() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("demos")
    }

    #[test]
    fn parse_commands() {
        assert_eq!(
            Command::parse("load  demos/a.txt ").unwrap(),
            Command::Load("demos/a.txt".into())
        );
        assert_eq!(Command::parse("STRUCTURE").unwrap(), Command::Structure);
        assert_eq!(
            Command::parse("run 0101").unwrap(),
            Command::Validate("0101".into())
        );
        assert_eq!(
            Command::parse("validate").unwrap(),
            Command::Validate(String::new())
        );
        assert_eq!(Command::parse("render").unwrap(), Command::Render(None));
        assert_eq!(
            Command::parse("render 11").unwrap(),
            Command::Render(Some("11".into()))
        );
        assert_eq!(Command::parse("quit").unwrap(), Command::Exit);
        assert!(matches!(
            Command::parse("load"),
            Err(SessionError::MissingArgument("load"))
        ));
        assert!(matches!(
            Command::parse("frobnicate 1"),
            Err(SessionError::UnknownCommand(cmd)) if cmd == "frobnicate"
        ));
    }

    #[test]
    fn nothing_loaded() {
        let mut session = Session::new(std::env::temp_dir(), RenderOptions::default());
        assert!(matches!(
            session.execute(Command::Validate("1".into())),
            Err(SessionError::NoAutomaton)
        ));
        assert!(matches!(
            session.execute(Command::Structure),
            Err(SessionError::NoAutomaton)
        ));
        assert!(matches!(
            session.execute(Command::Render(None)),
            Err(SessionError::NoAutomaton)
        ));
        assert_eq!(session.execute(Command::Exit).unwrap(), Outcome::Exit);
        assert!(session.session_dir().is_none());
    }

    #[test_log::test]
    fn load_from_search_dir() {
        let mut session =
            Session::new(std::env::temp_dir(), RenderOptions::default()).with_search_dir(demos());
        let outcome = session
            .execute(Command::Load("ends_in_one.txt".into()))
            .unwrap();
        assert_eq!(outcome, Outcome::Loaded("ends_in_one".into()));
        assert_eq!(session.name(), Some("ends_in_one"));

        let Outcome::Validated(trace) = session.execute(Command::Validate("101".into())).unwrap()
        else {
            panic!("expected a trace");
        };
        assert!(trace.accepted());
        assert!(matches!(
            session.execute(Command::Validate("12".into())),
            Err(SessionError::InvalidSymbol(InvalidSymbolError {
                symbol: '2',
                position: 1
            }))
        ));
    }

    #[test]
    fn list_definitions() {
        let mut session =
            Session::new(std::env::temp_dir(), RenderOptions::default()).with_search_dir(demos());
        assert_eq!(Command::parse("list").unwrap(), Command::List);
        assert_eq!(
            session.execute(Command::List).unwrap(),
            Outcome::Listed(vec![
                "divisible_by_three.txt".to_string(),
                "ends_in_one.txt".to_string(),
                "identifier.txt".to_string(),
            ])
        );

        let mut bare = Session::new(std::env::temp_dir(), RenderOptions::default());
        assert_eq!(bare.execute(Command::List).unwrap(), Outcome::Listed(vec![]));
    }

    #[test]
    fn load_missing_file() {
        let mut session = Session::new(std::env::temp_dir(), RenderOptions::default());
        assert!(matches!(
            session.execute(Command::Load("missing.txt".into())),
            Err(SessionError::Load(LoadError::NotFound(_)))
        ));
        assert!(session.automaton().is_none());
    }

    #[test]
    fn structure_with_highlight() {
        let mut session = Session::new(std::env::temp_dir(), RenderOptions::default());
        session.set_automaton("ends_in_one", ends_in_one());
        let structure = session.structure(Some("10")).unwrap();
        assert_eq!(structure.name, "ends_in_one");
        assert!(structure.highlight.is_some());
        assert!(session.structure(Some("3")).is_err());
    }

    #[test]
    fn trace_file_names() {
        assert_eq!(trace_file_stem("0101"), "trace_0101");
        assert_eq!(trace_file_stem("a b-c"), "trace_a_b_c");
        assert_eq!(trace_file_stem(""), "trace_empty");
    }

    #[cfg(feature = "graphviz")]
    #[test]
    fn failed_render_keeps_counter() {
        let assets = tempfile::tempdir().unwrap();
        let options = RenderOptions {
            dot_binary: "this-binary-does-not-exist".to_string(),
            ..Default::default()
        };
        let mut session = Session::new(assets.path(), options);
        session.set_automaton("ends_in_one", ends_in_one());

        assert!(matches!(
            session.execute(Command::Render(Some("1".into()))),
            Err(SessionError::Render(RenderError::Io(_)))
        ));
        assert_eq!(session.trace_count(), 0);
        let dir = session.session_dir().unwrap();
        assert!(dir.starts_with(assets.path()));
        assert!(dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("session_"));
    }
}
