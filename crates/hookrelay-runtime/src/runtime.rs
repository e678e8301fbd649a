//! Process orchestration: configuration → registry → dispatcher → gateway.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use hookrelay_runtime::HookRelayRuntime;
//!
//! // Auto-loads hookrelay.toml and HOOKRELAY_* from the environment
//! let runtime = HookRelayRuntime::builder().build()?;
//! runtime.run().await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use hookrelay_core::CancellationToken;
use hookrelay_framework::{Dispatcher, HandlerRegistry, PluginCatalog};
use hookrelay_transport::{Gateway, GatewayConfig, ListenerHandle};
use serde::Serialize;
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::{ConfigLoader, HookRelayConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

/// The hookrelay process.
///
/// Builds the handler registry once from the configured plugin list, then
/// serves the gateway until shutdown.
pub struct HookRelayRuntime {
    config: HookRelayConfig,
    catalog: PluginCatalog,
    shutdown: CancellationToken,
}

impl HookRelayRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Validates the configuration, initializes logging and discovers the
    /// plugins linked into the binary.
    pub fn from_config(config: HookRelayConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);

        let catalog = PluginCatalog::discovered();
        info!(
            log_level = %config.logging.level,
            available_plugins = ?catalog.names(),
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config,
            catalog,
            shutdown: CancellationToken::new(),
        })
    }

    /// Replaces the plugin catalog.
    pub fn with_catalog(mut self, catalog: PluginCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &HookRelayConfig {
        &self.config
    }

    /// Cancelling this token stops the listener and in-flight dispatches.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Loads, initializes and registers the configured plugins.
    pub async fn build_registry(&self) -> HandlerRegistry {
        HandlerRegistry::builder(self.config.dispatch.known_types())
            .catalog(self.catalog.clone())
            .plugin_configs(self.config.plugins.clone())
            .build(self.config.handlers.modules.as_slice())
            .await
    }

    /// Builds the registry and gateway without binding a socket.
    pub async fn gateway(&self) -> Gateway {
        let registry = Arc::new(self.build_registry().await);
        info!(
            active = registry.active_count(),
            configured = registry.states().len(),
            "Handler registry ready"
        );

        let dispatcher =
            Dispatcher::new(registry).with_handler_timeout(self.config.dispatch.handler_timeout());

        let server = &self.config.server;
        let gateway_config = GatewayConfig::default()
            .with_path(server.path.clone())
            .with_shared_secret(server.effective_secret().map(str::to_string))
            .with_request_timeout(self.config.dispatch.request_timeout());

        Gateway::with_shutdown(dispatcher, gateway_config, self.shutdown.clone())
    }

    /// Starts serving and returns the listener handle.
    pub async fn start(&self) -> RuntimeResult<ListenerHandle> {
        let gateway = self.gateway().await;
        let handle = gateway.listen(&self.config.server.bind_addr()).await?;
        info!(addr = %handle.local_addr(), "Webhook server started");
        Ok(handle)
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let handle = self.start().await?;

        tokio::select! {
            () = shutdown => {}
            () = self.shutdown.cancelled() => {}
        }

        info!("Stopping webhook server");
        handle.shutdown();
        handle.stopped().await;
        info!("Webhook server stopped");
        Ok(())
    }
}

impl std::fmt::Debug for HookRelayRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRelayRuntime")
            .field("bind_addr", &self.config.server.bind_addr())
            .field("modules", &self.config.handlers.modules)
            .field("catalog", &self.catalog.names())
            .finish()
    }
}

/// Waits for Ctrl+C or, on unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`HookRelayRuntime`] with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = HookRelayRuntime::builder()
///     .config_file("config/hookrelay.toml")
///     .profile("production")
///     .port(9000)
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a builder searching the current and user config directories.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new()
                .with_current_dir()
                .with_user_config_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Overrides one dotted configuration key.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    /// Overrides `server.port`.
    pub fn port(self, port: u16) -> Self {
        self.set("server.port", port)
    }

    /// Overrides `handlers.modules`.
    pub fn modules(self, modules: Vec<String>) -> Self {
        self.set("handlers.modules", modules)
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> RuntimeResult<HookRelayRuntime> {
        let config = self.config_loader.load()?;
        HookRelayRuntime::from_config(config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
