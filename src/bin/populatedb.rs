//! Populates a store with the fixture catalog.
//!
//! Usage:
//!   populatedb memory
//!   populatedb file:///var/lib/corner-store/catalog.json

use clap::Parser;
use corner_store::{LoggingConfig, init_logging, seed, shutdown_telemetry, store};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "populatedb", about = "Seed a Corner Store catalog with fixture data", version)]
struct SeedArgs {
    /// Store target: memory, file://PATH or a snapshot path
    target: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let logging_config = LoggingConfig::from_env().with_service_name("populatedb");
    let _guard = match init_logging(logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    info!("{}", seed::USAGE);
    let args = SeedArgs::parse();

    let store = match store::connect(&args.target).await {
        Ok(store) => store,
        Err(e) => {
            error!(store = %args.target, "failed to open store: {e}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = seed::populate(store.clone()).await;

    // Close even when seeding failed so a file store keeps what was written
    let closed = store.close().await;
    shutdown_telemetry();

    match (outcome, closed) {
        (Ok(report), Ok(())) => {
            info!(
                categories = report.categories.len(),
                products = report.products.len(),
                "seeding complete"
            );
            ExitCode::SUCCESS
        }
        (Err(e), _) => {
            error!("seeding failed: {e}");
            ExitCode::FAILURE
        }
        (Ok(_), Err(e)) => {
            error!("failed to close store: {e}");
            ExitCode::FAILURE
        }
    }
}
