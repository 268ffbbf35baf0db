//! Texio CLI - Command-line interface
//!
//! Inspects texture files and URLs with the texio decoder pipeline.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::inspect::InspectArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "texio")]
#[command(version)]
#[command(about = "Decode DDS, SGI, TGA and common image textures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (RUST_LOG is honored otherwise)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to <config dir>/texio/config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a texture and print what the GPU upload would receive
    Inspect(InspectArgs),

    /// List registered decoders in dispatch order
    Decoders,

    /// Print the format suffix of a file name
    Suffix {
        /// File name or path
        name: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("texio=debug,texio_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Inspect(args) => {
            let config = commands::common::load_config(cli.config.as_deref())?;
            commands::inspect::run(&config, args)
        }
        Commands::Decoders => {
            let config = commands::common::load_config(cli.config.as_deref())?;
            commands::decoders::run(&config)
        }
        Commands::Suffix { name } => commands::suffix::run(&name),
    }
}
