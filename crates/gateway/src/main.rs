//! LedgerQL gateway
//!
//! Serves a GraphQL API over a ledger node's HTTP API.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledgerql_crypto::Keypair;
use ledgerql_gateway::logging::init_logging;
use ledgerql_gateway::{serve, CliOverrides, GatewayConfig};
use serde_json::json;

#[derive(Parser)]
#[command(name = "ledgerql-gateway")]
#[command(about = "GraphQL gateway for a ledger network")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "LEDGERQL_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: CliOverrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the GraphQL server (default)
    Serve,

    /// Generate a keypair for signing transactions
    Keygen,

    /// Print the GraphQL schema definition
    Schema {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = GatewayConfig::load(cli.config.as_deref(), &cli.overrides)?;
            init_logging(&config.log_level, config.log_format)?;
            serve(config).await
        }
        Commands::Keygen => print_keypair(),
        Commands::Schema { output } => print_schema(output),
    }
}

fn print_keypair() -> Result<()> {
    let keypair = Keypair::generate();
    let pair = json!({
        "public_key": keypair.public_key(),
        "private_key": keypair.private_key(),
    });
    println!("{}", serde_json::to_string_pretty(&pair)?);
    Ok(())
}

fn print_schema(output: Option<PathBuf>) -> Result<()> {
    let sdl = ledgerql_graphql::export_sdl();
    match output {
        Some(path) => std::fs::write(&path, sdl)
            .with_context(|| format!("failed to write schema to {}", path.display())),
        None => {
            print!("{sdl}");
            Ok(())
        }
    }
}
