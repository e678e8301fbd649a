//! hookrelay Runtime - configuration, logging and process orchestration.
//!
//! This crate provides:
//! - Layered configuration (`hookrelay.toml`, `HOOKRELAY_*`, overrides)
//! - Logging setup from configuration
//! - [`HookRelayRuntime`], which builds the handler registry from the
//!   configured plugin list and serves the webhook gateway until shutdown
//!
//! ```ignore
//! use hookrelay_runtime::HookRelayRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     HookRelayRuntime::builder().build()?.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, HookRelayConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{HookRelayRuntime, RuntimeBuilder};

pub use tracing;
