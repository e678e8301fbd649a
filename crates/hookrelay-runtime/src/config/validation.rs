//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{DispatchConfig, HookRelayConfig, ServerConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &HookRelayConfig) -> ConfigResult<()> {
    validate_server_config(&config.server)?;
    validate_dispatch_config(&config.dispatch)?;
    Ok(())
}

/// Validates the HTTP gateway settings.
fn validate_server_config(server: &ServerConfig) -> ConfigResult<()> {
    if server.host.trim().is_empty() {
        return Err(ConfigError::validation("Server host cannot be empty"));
    }
    if server.port == 0 {
        return Err(ConfigError::InvalidPort(server.port));
    }
    validate_path(&server.path)
}

/// Validates the webhook path.
///
/// `/` is reserved for the service description.
fn validate_path(path: &str) -> ConfigResult<()> {
    if !path.starts_with('/') {
        return Err(ConfigError::validation("Path must start with '/'"));
    }
    if path == "/" {
        return Err(ConfigError::validation(
            "Webhook path cannot be '/', it serves the service description",
        ));
    }
    if path.contains(['{', '}', '*', '?', '#']) {
        return Err(ConfigError::validation(format!(
            "Webhook path contains reserved characters: {path}"
        )));
    }
    Ok(())
}

/// Validates event types and deadlines.
fn validate_dispatch_config(dispatch: &DispatchConfig) -> ConfigResult<()> {
    if dispatch.event_types.is_empty() {
        return Err(ConfigError::validation(
            "At least one event type must be configured",
        ));
    }

    let mut seen = HashSet::new();
    for t in &dispatch.event_types {
        if t.trim().is_empty() {
            return Err(ConfigError::validation("Event types cannot be blank"));
        }
        if !seen.insert(t.as_str()) {
            return Err(ConfigError::DuplicateEventType(t.clone()));
        }
    }

    if dispatch.handler_timeout_ms == Some(0) {
        return Err(ConfigError::validation(
            "Handler timeout must be greater than 0",
        ));
    }
    if dispatch.request_timeout_ms == Some(0) {
        return Err(ConfigError::validation(
            "Request timeout must be greater than 0",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&HookRelayConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_port() {
        let mut config = HookRelayConfig::default();
        config.server.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidPort(0))
        ));
    }

    #[test]
    fn test_validate_path() {
        let mut config = HookRelayConfig::default();
        for bad in ["webhook", "/", "/hooks/{id}"] {
            config.server.path = bad.to_string();
            assert!(validate_config(&config).is_err(), "{bad} should be rejected");
        }
        config.server.path = "/hooks/3scale".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_event_types() {
        let mut config = HookRelayConfig::default();
        config.dispatch.event_types = vec![];
        assert!(validate_config(&config).is_err());

        config.dispatch.event_types = vec!["user".into(), "user".into()];
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::DuplicateEventType(t)) if t == "user"
        ));
    }

    #[test]
    fn test_validate_timeouts() {
        let mut config = HookRelayConfig::default();
        config.dispatch.handler_timeout_ms = Some(0);
        assert!(validate_config(&config).is_err());

        config.dispatch.handler_timeout_ms = Some(1000);
        config.dispatch.request_timeout_ms = Some(0);
        assert!(validate_config(&config).is_err());
    }
}
