mod repl;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ghost_lang_interpreter::{Engine, EngineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Script to run. Starts the REPL when omitted.
    path: Option<PathBuf>,
    /// Extra directories searched for imports.
    #[arg(short = 'I', long = "include", env = "GHOST_PATH", value_delimiter = ':')]
    include: Vec<PathBuf>,
    /// Evaluate SOURCE, print the result and exit.
    #[arg(short, long, value_name = "SOURCE", conflicts_with = "path")]
    eval: Option<String>,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("GHOST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let engine = Engine::new(EngineConfig {
        search_paths: cli.include,
        ..EngineConfig::default()
    });

    match (cli.eval, cli.path) {
        (Some(source), _) => Ok(runner::evaluate(&engine, &source)),
        (None, Some(path)) => runner::execute(&engine, &path),
        (None, None) => {
            repl::start(engine)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
