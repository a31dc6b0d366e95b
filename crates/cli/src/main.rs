//! Stitchdesk CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! stchd-cli migrate
//!
//! # Create an admin tenant
//! stchd-cli admin create -p 08031234567 -n "Head Office"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create admin tenants

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stchd-cli")]
#[command(author, version, about = "Stitchdesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin tenants
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin tenant
    Create {
        /// Admin phone number (11 digits)
        #[arg(short, long)]
        phone: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin password (prompted for if omitted)
        #[arg(long)]
        password: Option<String>,
    },
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                phone,
                name,
                password,
            } => {
                commands::admin::create_tenant(&phone, &name, password.as_deref()).await?;
            }
        },
    }
    Ok(())
}
