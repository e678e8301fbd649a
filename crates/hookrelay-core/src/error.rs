//! Unified error types for the hookrelay core.
//!
//! Plugin-stage failures (load, init, register) never reach callers of the
//! dispatch engine: they are recorded in [`HandlerState`](crate::HandlerState).
//! Handler faults are recovered by the chain and surface only as data inside a
//! [`DispatchResult`](crate::DispatchResult). The routing errors below are the
//! gateway's responsibility.

use thiserror::Error;

/// Type-erased error returned by plugin code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Plugin lifecycle errors
// =============================================================================

/// Errors raised while bringing a plugin online.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The plugin could not be located or instantiated.
    #[error("{0}")]
    PluginLoad(String),

    /// The plugin's `init` failed.
    #[error("{0}")]
    PluginInit(String),

    /// The plugin's `register` failed.
    #[error("{0}")]
    PluginRegistration(String),
}

impl CoreError {
    /// Creates a load error.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::PluginLoad(msg.into())
    }

    /// Creates an init error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::PluginInit(msg.into())
    }

    /// Creates a registration error.
    pub fn registration(msg: impl Into<String>) -> Self {
        Self::PluginRegistration(msg.into())
    }
}

/// Result type for plugin lifecycle operations.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Routing errors
// =============================================================================

/// Why an event cannot be routed to the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The event type is not part of the known set.
    #[error("No such type '{0}'")]
    UnknownType(String),

    /// The type is known but no handler registered for it.
    #[error("No handlers to handle '{0}'")]
    NoHandler(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_error_messages() {
        assert_eq!(
            RouteError::UnknownType("plan".into()).to_string(),
            "No such type 'plan'"
        );
        assert_eq!(
            RouteError::NoHandler("user".into()).to_string(),
            "No handlers to handle 'user'"
        );
    }

    #[test]
    fn test_core_error_renders_bare_message() {
        assert_eq!(CoreError::init("Missing configuration").to_string(), "Missing configuration");
    }
}
