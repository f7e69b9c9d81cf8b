//! SP CLI - Simplate resource engine.
//!
//! Provides commands for:
//! - `check`: Compile simplate files and report their media types
//! - `negotiate`: Show which representation a request would be served

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, GlobalArgs, NegotiateArgs};
use output::Output;

/// SP - Simplate resource engine.
#[derive(Parser)]
#[command(name = "sp", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile simplate files and list their media types.
    Check(CheckArgs),
    /// Negotiate a representation for a request.
    Negotiate(NegotiateArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Check(args) => args.execute(&cli.global),
        Commands::Negotiate(args) => args.execute(&cli.global),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
