//! Configuration for the hookrelay process.
//!
//! Layered loading (defaults, files, environment, overrides) lives in
//! [`loader`]; [`validate_config`] rejects settings the gateway cannot serve.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DispatchConfig, HandlersConfig, HookRelayConfig, LogFormat, LogLevel, LogOutput,
    LoggingConfig, ServerConfig, SpanEventConfig,
};
pub use validation::validate_config;
