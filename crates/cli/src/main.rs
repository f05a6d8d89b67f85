//! Order Hub CLI - Database migrations and test tooling.
//!
//! # Usage
//!
//! ```bash
//! # Run order database migrations
//! oh-cli migrate
//!
//! # Publish a JSON order document to the orders subject
//! oh-cli publish model.json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `publish` - Publish one order message

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "oh-cli")]
#[command(author, version, about = "Order Hub CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Publish a JSON order file once to the orders subject
    Publish {
        /// Path to the order document
        #[arg(default_value = "model.json")]
        file: PathBuf,

        /// NATS connection name for the publisher
        #[arg(long, default_value = "order-service-publisher")]
        client_id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Publish { file, client_id } => {
            commands::publish::run(&file, &client_id).await?;
        }
    }
    Ok(())
}
