use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "refsearch")]
#[command(author, version, about = "Streaming reference search over source trees")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default .refsearch/config.toml in the current directory
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Find text occurrences of a pattern
    Literal {
        /// Text to search for
        pattern: String,

        /// Directory to search (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Only search files whose relative path matches this glob
        #[arg(short, long)]
        include: Option<String>,

        /// Match ASCII letters case-insensitively
        #[arg(long)]
        ignore_case: bool,

        /// Also report matches inside longer identifiers
        #[arg(long)]
        substring: bool,

        /// Print Prometheus metrics after the search
        #[arg(long)]
        metrics: bool,
    },
}
