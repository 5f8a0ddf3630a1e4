use crate::commands;
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "songbook",
    version,
    about = "Statically generates a songbook website from a set of files containing labeled and tagged song lyrics"
)]
struct Cli {
    /// The directory containing songs, templates, etc.
    #[arg(long, global = true, default_value = ".")]
    source: PathBuf,

    /// Quiet mode: suppress non-critical warnings.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode: -v for progress messages, -vv for debugging output.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate the songbook website, replacing stale destination files.
    Build {
        /// The directory in which to generate the website
        /// (default: a site/ directory within the source directory).
        #[arg(long)]
        destination: Option<PathBuf>,

        /// Paths relative to the destination that shouldn't be cleared
        /// even if not overwritten. May be given multiple times.
        #[arg(long, action = ArgAction::Append)]
        keep: Vec<String>,
    },
    /// Parse and link the songbook, reporting diagnostics without
    /// writing any output.
    Check,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    crate::logging::init(cli.quiet, cli.verbose);

    let report = match &cli.command {
        Command::Build { destination, keep } => commands::build::run(&commands::build::BuildOptions {
            source: cli.source.clone(),
            destination: destination.clone(),
            keep: keep.clone(),
        })?,
        Command::Check => commands::check::run(&cli.source)?,
    };

    commands::print_report(&report, cli.json)
}
