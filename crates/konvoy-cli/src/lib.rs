//! konvoyctl library

pub mod commands;
pub mod error;
pub mod input;

pub use error::{Error, Result};

use clap::{Parser, Subcommand, ValueEnum};

/// Konvoy - service mesh proxy configuration
#[derive(Parser, Debug)]
#[command(name = "konvoyctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "KONVOY_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a dataplane into the resources its proxy would receive
    Generate(commands::generate::GenerateArgs),
    /// List the built-in profiles
    Profiles,
    /// Check a ProxyTemplate without compiling it
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Run the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Generate(args) => commands::generate::run(args),
            Commands::Profiles => commands::profiles::run(),
            Commands::Validate(args) => commands::validate::run(args),
        }
    }
}
