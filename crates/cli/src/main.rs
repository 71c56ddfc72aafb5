//! TMC CLI - Operator tools for the order-management backend.
//!
//! # Usage
//!
//! ```bash
//! # Decode a bearer token and show who it belongs to
//! tmc-cli token inspect eyJhbGciOi...
//!
//! # Sign in and show the issued identity (password from TMC_PASSWORD)
//! tmc-cli login -e kari@example.no
//!
//! # List orders with a token (from TMC_TOKEN)
//! tmc-cli orders list
//! ```
//!
//! # Commands
//!
//! - `token inspect` - Decode a token locally, no backend call
//! - `login` - Exchange email and password for a token
//! - `orders list` - List the orders visible to a token

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tmc-cli")]
#[command(author, version, about = "TMC operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Sign in against the backend
    Login {
        /// Operator email address
        #[arg(short, long)]
        email: String,
    },
    /// Work with orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Decode a token and print its identity and expiry
    Inspect {
        /// Compact bearer token
        token: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders visible to `TMC_TOKEN`
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Token { action } => match action {
            TokenAction::Inspect { token } => commands::token::inspect(&token)?,
        },
        Commands::Login { email } => commands::backend::login(&email).await?,
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::backend::list_orders().await?,
        },
    }
    Ok(())
}
