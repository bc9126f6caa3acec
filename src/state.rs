use crate::catalog::CatalogService;
use crate::config::ServerConfig;
use crate::store::{self, DocumentStore};
use crate::views::Views;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Shared application state: one store connection, the catalog over it and
/// the compiled templates.
pub struct AppState {
    config: Arc<ServerConfig>,
    store: Arc<dyn DocumentStore>,
    catalog: CatalogService,
    views: Views,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>, store: Arc<dyn DocumentStore>, views: Views) -> Self {
        let catalog = CatalogService::new(store.clone());
        Self {
            config,
            store,
            catalog,
            views,
        }
    }

    /// Opens the configured store and loads templates.
    pub async fn connect(config: Arc<ServerConfig>) -> Result<Self> {
        let store = store::connect(&config.store_target)
            .await
            .with_context(|| format!("failed to open store '{}'", config.store_target))?;
        let views = Views::load(config.templates_dir.as_deref())
            .context("failed to load templates")?;
        info!(
            backend = store.backend(),
            templates = config
                .templates_dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "embedded".to_string()),
            "application state ready"
        );
        Ok(Self::new(config, store, views))
    }

    pub fn config(&self) -> &Arc<ServerConfig> {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn views(&self) -> &Views {
        &self.views
    }
}
