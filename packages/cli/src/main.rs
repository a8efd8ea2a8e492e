mod commands;
mod files;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{apply, fragment, invert, ApplyArgs, FragmentArgs, InvertArgs};
use tracing_subscriber::EnvFilter;

/// Quire CLI - replay and inspect structured-document operation logs
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log editor activity to stderr (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply an operation log to a document
    Apply(ApplyArgs),

    /// Print the inverse of an operation log, in undo order
    Invert(InvertArgs),

    /// Extract the fragment between two points of a document
    Fragment(FragmentArgs),
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("{} cannot read the current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Apply(args) => apply(args, &cwd),
        Command::Invert(args) => invert(args),
        Command::Fragment(args) => fragment(args),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
