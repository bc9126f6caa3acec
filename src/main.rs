use clap::Parser;
use corner_store::{
    CliArgs, LoggingConfig, ServerConfig, init_logging, run_server, shutdown_telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config)?;

    let cli = CliArgs::parse();
    let config = ServerConfig::from_args(cli)?;

    // Fail before binding anything
    config.validate()?;

    let result = run_server(config).await;

    // Ensure traces are flushed before exit
    shutdown_telemetry();

    if let Err(error) = &result {
        tracing::error!("server exited with error: {error:#}");
    }
    result
}
