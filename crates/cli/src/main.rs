//! Lendix CLI - Operator tools against the lending backend.
//!
//! # Usage
//!
//! ```bash
//! # Check that the backend answers
//! lendix-cli ping
//!
//! # Sign in and show the principal (password from LENDIX_PASSWORD)
//! LENDIX_PASSWORD=... lendix-cli whoami -u ana
//!
//! # List the credit catalog (token from LENDIX_TOKEN)
//! LENDIX_TOKEN=... lendix-cli credit-types
//! ```
//!
//! Every command reads the backend URL from `--api-url` or `LENDIX_API_URL`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use url::Url;

mod commands;

#[derive(Parser)]
#[command(name = "lendix-cli")]
#[command(author, version, about = "Lendix operator tools")]
struct Cli {
    /// Base URL of the lending backend
    #[arg(long, env = "LENDIX_API_URL", global = true)]
    api_url: Option<Url>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 15, global = true)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is reachable
    Ping,
    /// Sign in and print the principal's profile
    Whoami {
        /// Username to sign in as
        #[arg(short, long)]
        username: String,

        /// Password (prefer the environment variable)
        #[arg(long, env = "LENDIX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List the company's credit types
    CreditTypes {
        /// Bearer token of an existing session
        #[arg(long, env = "LENDIX_TOKEN", hide_env_values = true)]
        token: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let api_url = cli.api_url.ok_or(commands::CommandError::MissingApiUrl)?;
    let backend = commands::connect(&api_url, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Ping => commands::ping(&backend).await,
        Commands::Whoami { username, password } => {
            commands::whoami(&backend, &username, &SecretString::from(password)).await
        }
        Commands::CreditTypes { token } => {
            commands::credit_types(&backend, SecretString::from(token)).await
        }
    }
}
