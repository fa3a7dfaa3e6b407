use std::{
    io::{BufRead, Write},
    path::PathBuf,
    process::ExitCode,
};

use dfa_trace::{prelude::*, session::Command as SessionCommand};
use itertools::Itertools;
use owo_colors::OwoColorize;
use tracing::{debug, error, trace};
use tracing_subscriber::{filter, prelude::*};

use clap::{Arg, ArgMatches, Command};

mod create;

fn cli() -> clap::Command {
    Command::new("dfa-runner")
    .about("Validate input strings against deterministic finite automata and draw their runs")
    .subcommand_required(true)
    .arg(
        Arg::new("verbosity")
        .short('v')
        .long("verbosity")
        .global(true)
        .num_args(0..=1)
        .require_equals(true)
        .value_parser(["info", "debug", "trace"])
        .default_missing_value("info")
    )
    .arg(
        Arg::new("assets")
        .long("assets")
        .global(true)
        .value_name("DIR")
        .default_value("assets")
        .help("directory in which a folder for each session's diagrams is created")
    )
    .arg(
        Arg::new("format")
        .long("format")
        .global(true)
        .value_parser(["png", "svg", "pdf"])
        .default_value("png")
    )
    .arg(
        Arg::new("dot")
        .long("dot")
        .global(true)
        .env("DFA_DOT_BINARY")
        .value_name("BIN")
        .default_value("dot")
        .help("graphviz binary used for rendering")
    )
    .subcommand(
        Command::new("repl")
        .about("interactive session, optionally loading a definition first")
        .arg(Arg::new("file").value_name("FILE"))
    )
    .subcommand(
        Command::new("create")
        .about("define an automaton step by step and continue in an interactive session")
    )
    .subcommand(
        Command::new("check")
        .about("runs every given input on the automaton defined in FILE")
        .arg(Arg::new("file").value_name("FILE").required(true))
        .arg(Arg::new("inputs").value_name("INPUT").num_args(0..))
    )
    .subcommand(
        Command::new("dot")
        .about("prints the automaton defined in FILE in the DOT format")
        .arg(Arg::new("file").value_name("FILE").required(true))
        .arg(Arg::new("trace").long("trace").value_name("INPUT").help("highlight the run on INPUT"))
    )
}

fn setup_logging(matches: &ArgMatches) {
    let Ok(Some(verbosity)) = matches.try_get_one::<String>("verbosity") else {
        return;
    };

    let level = match verbosity.as_str() {
        "trace" => filter::LevelFilter::TRACE,
        "debug" => filter::LevelFilter::DEBUG,
        "info" => filter::LevelFilter::INFO,
        _ => unreachable!(),
    };

    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stdout_log.with_filter(level))
        .init();

    trace!("setup {level} logging");
}

/// Settings collected from the command line.
struct Config {
    assets: PathBuf,
    options: RenderOptions,
}

impl Config {
    fn from_matches(matches: &ArgMatches) -> Self {
        let mut options = RenderOptions::default();
        if let Some(format) = matches
            .get_one::<String>("format")
            .and_then(|f| f.parse().ok())
        {
            options.format = format;
        }
        if let Some(dot) = matches.get_one::<String>("dot") {
            options.dot_binary = dot.clone();
        }
        Self {
            assets: matches
                .get_one::<String>("assets")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("assets")),
            options,
        }
    }

    fn session(&self) -> Session {
        Session::new(&self.assets, self.options.clone()).with_search_dir("demos")
    }
}

fn verdict(accepted: bool) -> String {
    if accepted {
        "ACCEPTED".green().bold().to_string()
    } else {
        "REJECTED".red().bold().to_string()
    }
}

fn print_header(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!(" {}", title.to_uppercase());
    println!("{}", "=".repeat(60));
}

fn print_structure(structure: &Structure) {
    println!("States:       {}", structure.states.iter().join(", "));
    println!("Initial:      {}", structure.initial);
    println!("Final states: {}", structure.finals.iter().join(", "));
    println!("Transitions:");
    for group in &structure.edges {
        println!("  {} --[{}]--> {}", group.source, group.label, group.target);
    }
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Loaded(name) => println!("-> DFA `{name}` loaded successfully"),
        Outcome::Listed(names) if names.is_empty() => println!("No definitions found"),
        Outcome::Listed(names) => {
            println!("Available definitions:");
            for name in names {
                println!("  - {name}");
            }
        }
        Outcome::Structure(structure) => print_structure(structure),
        Outcome::Table(table) => println!("{table}"),
        Outcome::Validated(trace) => {
            println!("Result: {}", verdict(trace.accepted()));
            println!("Trace:  {}", trace.show());
        }
        Outcome::Rendered(path) => println!("-> Saved: {}", path.display()),
        Outcome::Help(help) => println!("{help}"),
        Outcome::Exit => println!("\nExiting runner..."),
    }
}

fn repl(mut session: Session) -> std::io::Result<()> {
    print_header("Simulation mode");
    match session.automaton() {
        Some(dfa) => println!("Alphabet: {}", dfa.alphabet().show()),
        None => match session.execute(SessionCommand::List) {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => println!("[ERROR] {e}"),
        },
    }
    println!("Type `help` for a list of commands, `exit` to quit");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("[{}] > ", session.trace_count() + 1);
        std::io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match SessionCommand::parse(&line).and_then(|command| session.execute(command)) {
            Ok(Outcome::Exit) => {
                print_outcome(&Outcome::Exit);
                break;
            }
            Ok(outcome) => print_outcome(&outcome),
            Err(SessionError::Load(LoadError::Invalid(invalid))) => {
                println!("[ERROR] invalid definition:");
                for e in invalid.errors() {
                    println!("  - {e}");
                }
            }
            Err(e) => println!("[ERROR] {e}"),
        }
    }
    Ok(())
}

fn check(file: &str, inputs: &[String]) -> Result<bool, LoadError> {
    let dfa = load_dfa(file)?;
    let mut all_valid = true;
    for input in inputs {
        match dfa.validate_string(input) {
            Ok(trace) => println!("{input:?}: {} ({})", verdict(trace.accepted()), trace.show()),
            Err(e) => {
                all_valid = false;
                println!("{input:?}: {e}");
            }
        }
    }
    Ok(all_valid)
}

fn dot(file: &str, trace: Option<&str>, options: &RenderOptions) -> Result<String, SessionError> {
    let dfa = load_dfa(file)?;
    let name = std::path::Path::new(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dfa".to_string());
    let trace = trace.map(|w| dfa.validate_string(w)).transpose()?;
    Ok(dfa
        .structure(&name, trace.as_ref())
        .dot_representation(options))
}

fn report(e: impl std::fmt::Display) -> ExitCode {
    error!("{e}");
    eprintln!("[ERROR] {e}");
    ExitCode::FAILURE
}

pub fn main() -> ExitCode {
    let matches = cli().get_matches();

    setup_logging(&matches);
    let config = Config::from_matches(&matches);

    match matches.subcommand() {
        Some(("repl", sub_matches)) => {
            print_header("DFA Simulation Runner");
            let mut session = config.session();
            if let Some(file) = sub_matches.get_one::<String>("file") {
                match session.execute(SessionCommand::Load(file.clone())) {
                    Ok(outcome) => print_outcome(&outcome),
                    Err(e) => return report(e),
                }
            }
            match repl(session) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => report(e),
            }
        }
        Some(("create", _)) => {
            print_header("Interactive creation mode");
            let stdin = std::io::stdin();
            let definition =
                match create::Prompter::new(stdin.lock(), std::io::stdout()).definition() {
                    Ok(Some(definition)) => definition,
                    Ok(None) => return report("input ended before the definition was complete"),
                    Err(e) => return report(e),
                };
            debug!("validating interactively created definition");
            let dfa = match definition.validate() {
                Ok(dfa) => dfa,
                Err(invalid) => {
                    for e in invalid.errors() {
                        eprintln!("  - {e}");
                    }
                    return report("the definition is invalid");
                }
            };
            println!("\n-> DFA created successfully");
            let mut session = config.session();
            session.set_automaton("interactive_model", dfa);
            match repl(session) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => report(e),
            }
        }
        Some(("check", sub_matches)) => {
            let file = sub_matches
                .get_one::<String>("file")
                .expect("FILE is a required argument");
            let inputs = sub_matches
                .get_many::<String>("inputs")
                .map(|inputs| inputs.cloned().collect_vec())
                .unwrap_or_default();
            match check(file, &inputs) {
                Ok(true) => ExitCode::SUCCESS,
                Ok(false) => ExitCode::FAILURE,
                Err(e) => report(e),
            }
        }
        Some(("dot", sub_matches)) => {
            let file = sub_matches
                .get_one::<String>("file")
                .expect("FILE is a required argument");
            let trace = sub_matches.get_one::<String>("trace").map(String::as_str);
            match dot(file, trace, &config.options) {
                Ok(dot) => {
                    println!("{dot}");
                    ExitCode::SUCCESS
                }
                Err(e) => report(e),
            }
        }
        _ => unreachable!(),
    }
}
