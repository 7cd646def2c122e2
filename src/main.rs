use clap::Parser;
use tracing_subscriber::EnvFilter;

use activaciones_api::cli::{self, Cli};
use activaciones_api::config::Environment;

const DEFAULT_FILTER: &str = "info,tower_http=info,sqlx=warn";

#[tokio::main]
async fn main() {
    // Load .env if present so local runs pick up DATABASE_URL, AWS_*, etc.
    let _ = dotenvy::dotenv();

    init_tracing();

    if let Err(e) = cli::run(Cli::parse()).await {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if Environment::from_env().is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}
