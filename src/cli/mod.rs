use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::auth::PasswordHasher;
use crate::config::{AppConfig, DatabaseConfig};
use crate::database::DatabaseManager;
use crate::server;

#[derive(Parser)]
#[command(name = "activaciones-api")]
#[command(about = "Field activation registry API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply the embedded database migrations")]
    Migrate,

    #[command(about = "Check database connectivity")]
    CheckDb,

    #[command(about = "Check that the upload bucket is reachable")]
    CheckBucket,

    #[command(about = "Print a bcrypt hash for seeding accounts")]
    HashPassword {
        #[arg(help = "Plaintext password")]
        password: String,

        #[arg(long, default_value_t = 10, help = "bcrypt cost factor")]
        cost: u32,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = AppConfig::from_env().context("Invalid configuration")?;
            tracing::info!("Starting Activaciones API in {:?} mode", config.environment);
            server::serve(config).await
        }
        Commands::Migrate => {
            let database = DatabaseConfig::from_env().context("Invalid configuration")?;
            let pool = DatabaseManager::connect(&database).await?;
            DatabaseManager::run_migrations(&pool).await?;
            println!("Migrations applied");
            Ok(())
        }
        Commands::CheckDb => {
            let database = DatabaseConfig::from_env().context("Invalid configuration")?;
            let pool = DatabaseManager::connect(&database).await?;
            let now = DatabaseManager::server_time(&pool).await?;
            println!("Database connection OK (server time {})", now.to_rfc3339());
            Ok(())
        }
        Commands::CheckBucket => {
            let config = AppConfig::from_env().context("Invalid configuration")?;
            server::connect_storage(&config).await?;
            println!("Bucket {} is reachable", config.storage.bucket);
            Ok(())
        }
        Commands::HashPassword { password, cost } => {
            let hash = PasswordHasher::new(cost).hash(&password).await?;
            println!("{}", hash);
            Ok(())
        }
    }
}
