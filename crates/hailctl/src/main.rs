//! hailctl: Command-line interface for the Hail greeter service.
//!
//! Provides commands for exercising the service from the terminal.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Command-line interface for the Hail greeter service.
#[derive(Parser)]
#[command(name = "hailctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Hail server endpoint (e.g., http://localhost:50051)
    #[arg(short, long, env = "HAIL_ENDPOINT", default_value = "http://localhost:50051")]
    endpoint: String,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Send a SayHello request and print the reply
    Greet {
        /// Name to greet
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Greet { name } => commands::greet::run(&cli.endpoint, &name, cli.output).await?,
    }

    Ok(())
}
