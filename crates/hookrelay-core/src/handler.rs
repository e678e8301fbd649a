//! The capability contract every plugin implements.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::event::{EventType, KnownTypes, WebhookEvent};
use crate::outcome::Status;

// ─── PluginLoadContext ────────────────────────────────────────────────────────

/// Context passed to [`WebhookHandler::init`].
///
/// Provides access to the plugin's configuration section (`plugins.<name>`)
/// or an empty JSON object when the section is absent.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(serde::Deserialize)]
/// struct MyConfig { endpoint: String }
///
/// async fn init(&mut self, ctx: &PluginLoadContext) -> Result<(), BoxError> {
///     let cfg: MyConfig = ctx.get_config()?;
///     self.endpoint = cfg.endpoint;
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct PluginLoadContext {
    plugin_name: String,
    plugin_config: Arc<Value>,
}

impl PluginLoadContext {
    /// Creates a context for `plugin_name` with its raw config section.
    pub fn new(plugin_name: impl Into<String>, plugin_config: Value) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            plugin_config: Arc::new(plugin_config),
        }
    }

    /// The configured plugin name.
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// The raw JSON config section.
    pub fn raw_config(&self) -> &Value {
        &self.plugin_config
    }

    /// Deserialise the plugin config section into `T`.
    ///
    /// Use `#[serde(default)]` on the struct to make all fields optional.
    pub fn get_config<T>(&self) -> serde_json::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        T::deserialize(self.plugin_config.as_ref())
    }
}

// ─── WebhookHandler ───────────────────────────────────────────────────────────

/// A webhook handler plugin.
///
/// The registry drives the lifecycle exactly once per plugin:
///
/// ```text
/// create() ──► init(ctx) ──► register(known) ──► handle(event)*
/// ```
///
/// `handle` reports its outcome by returning it; an `Err` is a fault and is
/// recorded under the plugin's name without affecting sibling handlers. A
/// panic anywhere inside `handle` is treated the same way.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Establishes required configuration. Called once, before `register`.
    async fn init(&mut self, _ctx: &PluginLoadContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Returns the subset of `known` this handler wants to receive.
    ///
    /// Types outside `known` are ignored by the registry.
    fn register(&self, known: &KnownTypes) -> Result<Vec<EventType>, BoxError>;

    /// Processes one event.
    ///
    /// `cancel` fires when the overall request deadline expires or the service
    /// shuts down; long-running handlers should stop early when it does.
    async fn handle(
        &self,
        event: &WebhookEvent,
        cancel: &CancellationToken,
    ) -> Result<Status, BoxError>;
}

/// A handler as produced by a plugin factory, before it is shared.
pub type BoxedHandler = Box<dyn WebhookHandler>;
