use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Log more (repeat for trace output)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a problem's generate phase on host data
    Generate {
        /// Name of the problem
        problem: String,

        /// Host data as JSON (default: stdin)
        #[arg(short, long, value_name = "FILE")]
        data: Option<PathBuf>
    },

    /// Run a problem's grade phase on host data
    Grade {
        /// Name of the problem
        problem: String,

        /// Host data as JSON (default: stdin)
        #[arg(short, long, value_name = "FILE")]
        data: Option<PathBuf>
    },

    /// Show which alternatives a sentence takes through a grammar
    Check {
        /// File containing the grammar
        file: PathBuf,

        /// The sentence, one token per argument
        tokens: Vec<String>
    },

    /// Print random sentences from a grammar
    Sample {
        /// File containing the grammar
        file: PathBuf,

        /// Start symbol (default: first in the file)
        #[arg(short, long, value_name = "SYMBOL")]
        start: Option<String>,

        /// Amount to generate
        #[arg(short = 'n', long, value_name = "AMOUNT", default_value_t = 1)]
        amount: u32
    },

    /// List the available problems
    List
}
