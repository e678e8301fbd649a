//! # hookrelay
//!
//! Receives 3scale webhook notifications over HTTP and fans each event out to
//! every handler registered for its type.
//!
//! ```text
//! ┌─────────┐     ┌────────────┐     ┌──────────────────────┐
//! │ Gateway │────▶│ Dispatcher │────▶│ handler "log"        │
//! │ (axum)  │     │            │────▶│ handler "sso"        │──▶ Keycloak
//! └─────────┘     └────────────┘────▶│ handler ...          │
//!                       │            └──────────────────────┘
//!                       ▼
//!              [{handler, status}, ...]  (one entry per handler, in order)
//! ```
//!
//! - **Gateway**: authenticates the request with the shared secret, decodes
//!   the JSON or XML body and extracts the `(action, type, object)` triple
//! - **Registry**: loads the configured plugins once at startup, records the
//!   load state of each and maps event types to handlers
//! - **Dispatcher**: runs the handlers in order; a failing, panicking or slow
//!   handler never prevents the others from running
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hookrelay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     HookRelayRuntime::builder()
//!         .modules(vec!["log".into(), "sso".into()])
//!         .build()?
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `builtin-plugins`: link the `log` and `sso` plugins (default)
//! - `toml-config`: load `hookrelay.toml` (default)
//! - `yaml-config`: load `hookrelay.yaml`
//! - `json-log`: JSON log output

pub use hookrelay_core as core;
pub use hookrelay_framework as framework;
pub use hookrelay_runtime as runtime;
pub use hookrelay_transport as transport;

/// Plugins bundled with hookrelay. Enabling a feature links the plugin, which
/// makes it available to `handlers.modules`.
pub mod plugins {
    #[cfg(feature = "plugin-log")]
    pub use hookrelay_plugin_log as log;
    #[cfg(feature = "plugin-sso")]
    pub use hookrelay_plugin_sso as sso;
}

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use hookrelay::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use hookrelay_runtime::{HookRelayConfig, HookRelayRuntime, RuntimeBuilder};

    // Plugin system
    pub use hookrelay_framework::{PluginCatalog, PluginDescriptor, define_plugin};

    // Handler contract
    pub use hookrelay_core::{
        BoxError, BoxedHandler, CancellationToken, EventType, KnownTypes, PluginLoadContext,
        Status, WebhookEvent, WebhookHandler,
    };

    // Embedding the gateway in another server
    pub use hookrelay_framework::{Dispatcher, HandlerRegistry};
    pub use hookrelay_transport::{Gateway, GatewayConfig};
}
