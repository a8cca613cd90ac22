//! PoW Ledger CLI Application
//!
//! A command-line interface for validating, reconciling and demonstrating
//! ledger chains.

use clap::{Parser, Subcommand};
use pow_ledger::cli::{self, CliResult};
use pow_ledger::config::ChainConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A proof-of-work ledger with longest-chain consensus", long_about = None)]
struct Cli {
    /// Chain configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new key pair
    Keygen,

    /// Run two local nodes that mine, transact and reconcile
    Demo {
        /// Mining difficulty (leading zero hex characters)
        #[arg(short, long)]
        difficulty: Option<u32>,

        /// Directory to export both nodes' chains to
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Validate a chain file
    Validate {
        /// Chain file (JSON array of blocks)
        file: PathBuf,
    },

    /// Resolve a local chain against candidate chains
    Resolve {
        /// Local chain file
        local: PathBuf,

        /// Candidate chain files
        #[arg(required = true)]
        candidates: Vec<PathBuf>,

        /// Write the winning chain here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show an address's balance on a chain file
    Balance {
        /// Chain file
        file: PathBuf,

        /// Address (compressed public key hex)
        address: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> CliResult<ChainConfig> {
    match path {
        Some(path) => Ok(ChainConfig::from_file(path)?),
        None => Ok(ChainConfig::default()),
    }
}

fn main() -> CliResult<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Keygen => cli::cmd_keygen()?,

        Commands::Demo { difficulty, export } => {
            if let Some(difficulty) = difficulty {
                config.difficulty = difficulty;
                config.validate()?;
            }
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cli::cmd_demo(config, export.as_deref()))?;
        }

        Commands::Validate { file } => cli::cmd_validate(&file, &config)?,

        Commands::Resolve {
            local,
            candidates,
            output,
        } => cli::cmd_resolve(&local, &candidates, output.as_deref(), &config)?,

        Commands::Balance { file, address } => cli::cmd_balance(&file, &address, &config)?,
    }

    Ok(())
}
