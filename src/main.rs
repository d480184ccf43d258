use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use structopt::StructOpt;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use numaut::{Automaton, Config, Registry};

#[derive(Debug, StructOpt)]
enum Command {
    /// Print the arity, labels and state count
    Info,
    Minimize {
        output: Option<PathBuf>,
    },
    Negate {
        output: Option<PathBuf>,
    },
    Reverse {
        output: Option<PathBuf>,
    },
    /// Write a GraphViz digraph
    Dot {
        output: Option<PathBuf>,
        #[structopt(long)]
        with_sink: bool,
    },
}

#[derive(Debug, StructOpt)]
struct Opts {
    #[structopt(long)]
    file: PathBuf,
    /// Directory of custom numeration systems
    #[structopt(long)]
    library: Option<PathBuf>,
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
    #[structopt(subcommand)]
    command: Command,
}

fn write_text(automaton: &mut Automaton, output: Option<PathBuf>) -> numaut::Result<()> {
    match output {
        Some(path) => automaton.write_file(path),
        None => automaton.write(&mut io::stdout().lock()),
    }
}

fn run(opts: Opts) -> numaut::Result<()> {
    let config = match opts.library {
        Some(dir) => Config::with_custom_bases(dir),
        None => Config::default(),
    };
    let mut registry = Registry::new(config);
    let mut automaton = Automaton::from_file(&opts.file, &mut registry)?;
    match opts.command {
        Command::Info => {
            let mut out = io::stdout().lock();
            writeln!(out, "arity: {}", automaton.arity())?;
            writeln!(out, "states: {}", automaton.n_states())?;
            if let Some(m) = automaton.as_machine() {
                writeln!(out, "deterministic: {}", m.table().is_deterministic())?;
                writeln!(out, "edges: {}", m.table().n_edges())?;
            }
            writeln!(out, "empty: {}", automaton.is_empty())?;
        }
        Command::Minimize { output } => {
            automaton.minimize();
            write_text(&mut automaton, output)?;
        }
        Command::Negate { output } => {
            automaton.not()?;
            write_text(&mut automaton, output)?;
        }
        Command::Reverse { output } => {
            automaton.reverse()?;
            write_text(&mut automaton, output)?;
        }
        Command::Dot { output, with_sink } => match output {
            Some(path) => automaton.write_dot_file(path, !with_sink)?,
            None => automaton.write_dot(&mut io::stdout().lock(), !with_sink)?,
        },
    }
    Ok(())
}

fn main() {
    let opts = Opts::from_args();
    let level = match opts.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        process::exit(1);
    }
    if let Err(e) = run(opts) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
