//! Graceful shutdown coordination
//!
//! 1. **Draining**: a signal (SIGINT/SIGTERM) or [`ShutdownCoordinator::trigger`]
//!    cancels the shared token; the HTTP server stops accepting connections
//!    and finishes in-flight requests.
//! 2. **Closing**: registered [`ShutdownHandler`]s run in order (the store
//!    connection is closed here), bounded by the configured timeout.
//!
//! ```rust,no_run
//! use corner_store::shutdown::{CompositeShutdownHandler, ShutdownCoordinator};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
//! let handlers = CompositeShutdownHandler::new();
//!
//! coordinator.shutdown_signal().await;
//! coordinator.run_handlers(&handlers).await?;
//! # Ok(())
//! # }
//! ```

use crate::store::DocumentStore;
use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use strum::Display;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ShutdownPhase {
    Running,
    /// No new connections; in-flight requests finishing
    Draining,
    /// Shutdown handlers running
    Closing,
    Complete,
    /// Handlers failed or exceeded the timeout
    Forced,
}

/// Coordinates graceful shutdown across server components
pub struct ShutdownCoordinator {
    timeout: Duration,
    phase: RwLock<ShutdownPhase>,
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            phase: RwLock::new(ShutdownPhase::Running),
            token: CancellationToken::new(),
        }
    }

    /// Token cancelled when shutdown begins.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn phase(&self) -> ShutdownPhase {
        *self.phase.read()
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Starts shutdown without an OS signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Resolves on SIGINT, SIGTERM or [`trigger`](Self::trigger), then enters draining.
    pub async fn shutdown_signal(&self) {
        tokio::select! {
            _ = wait_for_signal() => {}
            _ = self.token.cancelled() => {
                info!("shutdown requested, initiating graceful shutdown");
            }
        }
        self.token.cancel();
        *self.phase.write() = ShutdownPhase::Draining;
    }

    /// Runs `handler` within the shutdown timeout.
    pub async fn run_handlers(&self, handler: &dyn ShutdownHandler) -> Result<()> {
        *self.phase.write() = ShutdownPhase::Closing;
        info!(timeout_secs = self.timeout.as_secs(), "running shutdown handlers");

        let outcome = timeout(self.timeout, handler.shutdown())
            .await
            .context("shutdown handlers exceeded the timeout")
            .and_then(|result| result);

        match &outcome {
            Ok(()) => {
                *self.phase.write() = ShutdownPhase::Complete;
                info!("graceful shutdown completed");
            }
            Err(e) => {
                *self.phase.write() = ShutdownPhase::Forced;
                error!("graceful shutdown failed: {e:#}");
            }
        }
        outcome
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("received SIGTERM, initiating graceful shutdown");
        },
    }
}

/// A component released during shutdown
#[async_trait::async_trait]
pub trait ShutdownHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn shutdown(&self) -> Result<()>;
}

/// Closes the document store, writing its final snapshot.
pub struct StoreShutdownHandler {
    store: Arc<dyn DocumentStore>,
}

impl StoreShutdownHandler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl ShutdownHandler for StoreShutdownHandler {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn shutdown(&self) -> Result<()> {
        self.store
            .close()
            .await
            .context("failed to close document store")?;
        info!(backend = self.store.backend(), "document store closed");
        Ok(())
    }
}

/// Runs handlers in registration order; a failing handler does not stop the rest.
pub struct CompositeShutdownHandler {
    handlers: Vec<Box<dyn ShutdownHandler>>,
}

impl CompositeShutdownHandler {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn ShutdownHandler>) {
        self.handlers.push(handler);
    }
}

impl Default for CompositeShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ShutdownHandler for CompositeShutdownHandler {
    fn name(&self) -> &'static str {
        "composite"
    }

    async fn shutdown(&self) -> Result<()> {
        let mut failed = Vec::new();
        for handler in &self.handlers {
            if let Err(e) = handler.shutdown().await {
                error!(handler = handler.name(), "shutdown handler error: {e:#}");
                failed.push(handler.name());
            }
        }
        anyhow::ensure!(
            failed.is_empty(),
            "shutdown handlers failed: {}",
            failed.join(", ")
        );
        Ok(())
    }
}
