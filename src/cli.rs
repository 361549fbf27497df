use crate::routers::Platform;
use clap::Parser;
use std::path::PathBuf;

/// A tool to extract normalized flow-spec rules and traffic counters from
/// router command output
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command-output capture to read (defaults to stdin)
    pub file: Option<PathBuf>,

    /// Router platform that produced the capture
    #[arg(short, long, value_enum)]
    pub platform: Platform,

    /// CLI command used to produce the capture, kept for traceability
    #[arg(short, long)]
    pub command: Option<String>,

    /// Print records as single-line JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,

    /// Print diagnostic information to stderr
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
