//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use hookrelay_transport::TransportError;

/// Errors that can occur while starting or running the relay.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP listener could not be started.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
