use crate::api;
use crate::bootstrap::{self, BootstrapResources};
use crate::config::SpongebookConfig;
use crate::database::Database;
use anyhow::Result;

/// Bootstraps the backend once and hands out cloned handles to whichever
/// entrypoint (CLI or REST server) needs them.
pub struct SpongebookNode {
    config: SpongebookConfig,
    bootstrap: BootstrapResources,
}

impl SpongebookNode {
    pub fn start(config: SpongebookConfig) -> Result<Self> {
        let bootstrap = bootstrap::initialize(&config)?;

        tracing::info!(
            directories_created = ?bootstrap.directories_created,
            database_initialized = bootstrap.database_initialized,
            db_path = %config.paths.db_path.display(),
            "spongebook node initialized"
        );

        Ok(Self { config, bootstrap })
    }

    /// Runs the REST API server until shutdown.
    pub async fn run_http_server(&self) -> Result<()> {
        api::serve_http(self.config.clone(), self.database()).await
    }

    pub fn config(&self) -> &SpongebookConfig {
        &self.config
    }

    /// Returns a clone of the database handle.
    pub fn database(&self) -> Database {
        self.bootstrap.database.clone()
    }
}
