mod cli;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::metadata::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Command};
use scaffolded::derivation::build_derivation;
use scaffolded::error_handling::report;
use scaffolded::grading::GradingData;
use scaffolded::grammar::Grammar;
use scaffolded::{generator, parser, problems};

// Environment variable holding a log filter directive, overriding the flags
const LOG_ENV: &str = "SCAFFOLDED_LOG";

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let fmt = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_file(false)
        .with_line_number(false);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter)
        .init();
}

fn load_grammar(file: &Path) -> Result<Grammar> {
    parser::parse_file(file).map_err(|errors| anyhow!("{}", report(&errors)))
}

fn read_data(data: Option<PathBuf>) -> Result<GradingData> {
    let json = match data {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?,
        None => {
            let mut json = String::new();
            std::io::stdin().read_to_string(&mut json).context("Could not read stdin")?;
            json
        }
    };
    GradingData::from_json(&json).context("Host data is not valid JSON")
}

fn problem(name: &str) -> Result<&'static dyn problems::Problem> {
    problems::lookup(name).ok_or_else(|| anyhow!("No problem named `{}` (see `scaffolded list`)", name))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Command::Generate { problem: name, data } => {
            let mut data = read_data(data)?;
            problem(&name)?.generate(&mut data)?;
            println!("{}", data.to_json()?);
        }
        Command::Grade { problem: name, data } => {
            let mut data = read_data(data)?;
            problem(&name)?
                .grade(&mut data)
                .with_context(|| format!("Grading {} failed", name))?;
            tracing::info!(score = data.score, "graded submission");
            println!("{}", data.to_json()?);
        }
        Command::Check { file, tokens } => {
            let grammar = load_grammar(&file)?;
            let record = build_derivation(&grammar, &tokens[..])
                .context("Sentence does not fit the grammar")?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Sample { file, start, amount } => {
            let grammar = load_grammar(&file)?;
            let start = start.unwrap_or_else(|| grammar.start_symbol.clone());
            for _ in 0..amount {
                let tokens = generator::generate_with_override(&grammar, &start)?;
                println!("{}", tokens.join(" | "));
            }
        }
        Command::List => {
            for problem in problems::all() {
                println!("{}\t{}", problem.name(), problem.statement());
            }
        }
    }

    Ok(())
}
