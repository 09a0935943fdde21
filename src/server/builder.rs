//! ServerBuilder for fluent API to build HTTP servers

use super::exposure::RestExposure;
use super::host::ProcessHost;
use crate::config::TablesConfig;
use crate::core::auth::ClaimsValidator;
use crate::core::runtime::ProcessRuntime;
use crate::process::{DownloadPolicy, ProcessRegistry, TableContext};
use crate::table::{LayoutXgen, TableRegistry, XgenBuilder};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the process host and its REST router
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config_file("tables.yaml")?
///     .with_runtime(ProcessTable::new().with_fn("models.pet.Paginate", paginate))
///     .with_claims_validator(validator)
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: TablesConfig,
    runtime: Option<Arc<dyn ProcessRuntime>>,
    claims: Option<Arc<dyn ClaimsValidator>>,
    xgen: Arc<dyn XgenBuilder>,
    custom_routes: Vec<Router>,
    cors: bool,
}

impl ServerBuilder {
    /// Create a new ServerBuilder with no tables
    pub fn new() -> Self {
        Self {
            config: TablesConfig::default(),
            runtime: None,
            claims: None,
            xgen: Arc::new(LayoutXgen),
            custom_routes: Vec::new(),
            cors: false,
        }
    }

    /// Use an already loaded configuration
    pub fn with_config(mut self, config: TablesConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a YAML file
    pub fn with_config_file(self, path: &str) -> Result<Self> {
        let config = TablesConfig::from_yaml_file(path)?;
        Ok(self.with_config(config))
    }

    /// Set the process runtime (required)
    pub fn with_runtime(mut self, runtime: impl ProcessRuntime + 'static) -> Self {
        self.runtime = Some(Arc::new(runtime));
        self
    }

    /// Set the bearer-token validator used by `download` (required)
    pub fn with_claims_validator(mut self, validator: impl ClaimsValidator + 'static) -> Self {
        self.claims = Some(Arc::new(validator));
        self
    }

    /// Replace the default settings builder used by `xgen`
    pub fn with_xgen(mut self, xgen: impl XgenBuilder + 'static) -> Self {
        self.xgen = Arc::new(xgen);
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Add a permissive CORS layer
    pub fn with_cors(mut self) -> Self {
        self.cors = true;
        self
    }

    /// Build the transport-agnostic host
    ///
    /// Registers every table operation, under the configured namespace when
    /// there is one.
    pub fn build_host(self) -> Result<ProcessHost> {
        let runtime = self
            .runtime
            .ok_or_else(|| anyhow::anyhow!("ProcessRuntime is required. Call .with_runtime()"))?;
        let claims = self.claims.ok_or_else(|| {
            anyhow::anyhow!("ClaimsValidator is required. Call .with_claims_validator()")
        })?;

        let tables = TableRegistry::from_config(&self.config)?;
        let registry = ProcessRegistry::with_table_operations(self.config.namespace.as_deref());

        tracing::info!(
            tables = tables.table_ids().len(),
            processes = registry.names().len(),
            "table processes registered"
        );

        let context = TableContext {
            tables: Arc::new(tables),
            runtime,
            claims,
            xgen: self.xgen,
            download: DownloadPolicy::from_config(&self.config.download),
        };

        Ok(ProcessHost::new(context, registry))
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let custom_routes = std::mem::take(&mut self.custom_routes);
        let cors = self.cors;
        let host = Arc::new(self.build_host()?);
        Ok(RestExposure::build_router(host, custom_routes, cors))
    }

    /// Serve the application with graceful shutdown
    ///
    /// Binds `addr`, serves until SIGTERM or Ctrl+C, then drains in-flight
    /// requests.
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
