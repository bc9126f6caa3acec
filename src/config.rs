use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_STORE_TARGET: &str = "memory";
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    /// Store connection target, see [`crate::store::connect`].
    pub store_target: String,
    pub templates_dir: Option<PathBuf>,
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            store_target: DEFAULT_STORE_TARGET.to_string(),
            templates_dir: None,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_HTTP_PORT))
}

impl ServerConfig {
    /// Resolves each setting as command line (or its env var), then config
    /// file, then default.
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            bind: cli_bind,
            store: cli_store,
            templates_dir: cli_templates_dir,
            shutdown_timeout_secs: cli_shutdown_timeout,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            bind: file_bind,
            store: file_store,
            templates_dir: file_templates_dir,
            shutdown_timeout_secs: file_shutdown_timeout,
        } = file_config;

        let bind_address = cli_bind.or(file_bind).unwrap_or_else(default_bind_address);

        let store_target = cli_store
            .or(file_store)
            .map(|target| target.trim().to_string())
            .unwrap_or_else(|| DEFAULT_STORE_TARGET.to_string());

        let templates_dir = cli_templates_dir.or(file_templates_dir);

        let shutdown_timeout_secs = cli_shutdown_timeout
            .or(file_shutdown_timeout)
            .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS);

        Ok(Self {
            bind_address,
            store_target,
            templates_dir,
            shutdown_timeout_secs,
        })
    }

    /// Fails fast on settings the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.store_target.is_empty(),
            "store target must not be empty"
        );
        if let Some(dir) = self.templates_dir.as_ref() {
            anyhow::ensure!(dir.exists(), "templates directory {:?} does not exist", dir);
            anyhow::ensure!(dir.is_dir(), "templates directory {:?} is not a directory", dir);
        }
        anyhow::ensure!(
            self.shutdown_timeout_secs > 0,
            "shutdown timeout must be at least one second"
        );
        Ok(())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "corner-store", about = "Corner Store catalog server", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML, JSON or TOML)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "CORNER_STORE_BIND",
        value_name = "ADDR",
        help = "HTTP bind address [default: 127.0.0.1:3000]"
    )]
    pub bind: Option<SocketAddr>,

    #[arg(
        long,
        env = "CORNER_STORE_DB",
        value_name = "TARGET",
        help = "Store target: memory, file://PATH or a snapshot path [default: memory]"
    )]
    pub store: Option<String>,

    #[arg(
        long,
        env = "CORNER_STORE_TEMPLATES",
        value_name = "DIR",
        help = "Directory of *.html templates overriding the built-in ones"
    )]
    pub templates_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "CORNER_STORE_SHUTDOWN_TIMEOUT",
        value_name = "SECS",
        help = "Seconds allowed for graceful shutdown [default: 30]",
        value_parser = clap::value_parser!(u64)
    )]
    pub shutdown_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    bind: Option<SocketAddr>,
    store: Option<String>,
    templates_dir: Option<PathBuf>,
    shutdown_timeout_secs: Option<u64>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        "toml" => toml::from_str(&contents)
            .with_context(|| format!("failed to parse TOML config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
