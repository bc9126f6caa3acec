pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod repository;
pub mod seed;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod store;
pub mod validation;
pub mod views;

pub use config::{CliArgs, ServerConfig};
pub use error::{AppError, AppResult};
pub use logging::{LoggingConfig, init_logging, shutdown_telemetry};
pub use server::{build_router, run_server};
pub use shutdown::ShutdownCoordinator;
pub use state::AppState;
