//! Active rule catalog
//!
//! The catalog is immutable once built. Reloading builds a fresh catalog and
//! swaps the shared reference; readers holding the previous `Arc` keep a
//! consistent view until they drop it.

use std::sync::Arc;

use parking_lot::RwLock;
use shared::RuleCatalog;

use crate::config::CatalogConfig;
use crate::error::{AppError, AppResult};

pub struct CatalogStore {
    active: RwLock<Arc<RuleCatalog>>,
    config: CatalogConfig,
}

impl CatalogStore {
    pub fn new(catalog: RuleCatalog, config: CatalogConfig) -> Self {
        Self {
            active: RwLock::new(Arc::new(catalog)),
            config,
        }
    }

    /// Build the catalog described by `config` and hold it
    pub fn load(config: &CatalogConfig) -> AppResult<Self> {
        let catalog = Self::build(config)?;
        tracing::info!(
            rules = catalog.len(),
            version = catalog.version().unwrap_or("unversioned"),
            "Rule catalog loaded"
        );
        Ok(Self::new(catalog, config.clone()))
    }

    /// Built-in rules (when enabled) with the overlay file appended
    pub fn build(config: &CatalogConfig) -> AppResult<RuleCatalog> {
        let base = if config.include_builtin {
            RuleCatalog::builtin()?
        } else {
            RuleCatalog::default()
        };

        match &config.path {
            Some(path) => {
                let source = std::fs::read_to_string(path).map_err(|e| {
                    AppError::Configuration(format!("Cannot read rule catalog {}: {}", path, e))
                })?;
                let overlay = RuleCatalog::from_toml_str(&source)?;
                tracing::debug!(path = %path, rules = overlay.len(), "Appending catalog overlay");
                Ok(base.append(overlay)?)
            }
            None => Ok(base),
        }
    }

    /// Snapshot of the active catalog
    pub fn current(&self) -> Arc<RuleCatalog> {
        Arc::clone(&self.active.read())
    }

    /// Swap in a new catalog, returning the previous one
    pub fn replace(&self, catalog: RuleCatalog) -> Arc<RuleCatalog> {
        let mut active = self.active.write();
        std::mem::replace(&mut *active, Arc::new(catalog))
    }

    /// Rebuild from the configured sources
    pub fn reload(&self) -> AppResult<Arc<RuleCatalog>> {
        self.reload_with(|| Self::build(&self.config))
    }

    /// Append overlay rules to the active catalog
    pub fn append_toml(&self, source: &str) -> AppResult<Arc<RuleCatalog>> {
        self.reload_with(|| {
            let overlay = RuleCatalog::from_toml_str(source)?;
            Ok(self.current().append(overlay)?)
        })
    }

    /// Install the catalog produced by `build`. A failed build leaves the
    /// active catalog untouched.
    pub fn reload_with<F>(&self, build: F) -> AppResult<Arc<RuleCatalog>>
    where
        F: FnOnce() -> AppResult<RuleCatalog>,
    {
        match build() {
            Ok(catalog) => {
                tracing::info!(rules = catalog.len(), "Rule catalog replaced");
                self.replace(catalog);
                Ok(self.current())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Catalog reload rejected, keeping active catalog");
                Err(err)
            }
        }
    }
}
