//! Per-plugin load/init/registration record.

use serde::{Deserialize, Serialize};

/// Outcome of bringing one configured plugin online.
///
/// Stages that were never reached are absent (`None`), so a plugin that
/// failed `init` serialises as `{"loaded":true,"initialized":false,"error":"…"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerState {
    /// The plugin was found and instantiated.
    pub loaded: bool,
    /// `init` outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialized: Option<bool>,
    /// `register` outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<bool>,
    /// Message of the first failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HandlerState {
    /// The plugin could not be loaded.
    pub fn load_failed(error: impl Into<String>) -> Self {
        Self {
            loaded: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// The plugin loaded but `init` failed.
    pub fn init_failed(error: impl Into<String>) -> Self {
        Self {
            loaded: true,
            initialized: Some(false),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// `init` succeeded but `register` failed.
    pub fn registration_failed(error: impl Into<String>) -> Self {
        Self {
            loaded: true,
            initialized: Some(true),
            registered: Some(false),
            error: Some(error.into()),
        }
    }

    /// Every stage succeeded.
    pub fn registered() -> Self {
        Self {
            loaded: true,
            initialized: Some(true),
            registered: Some(true),
            error: None,
        }
    }

    /// Returns `true` when the plugin reached dispatch.
    pub fn is_active(&self) -> bool {
        self.registered == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_init_failure_shape() {
        let state = HandlerState::init_failed("Missing configuration");
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"loaded": true, "initialized": false, "error": "Missing configuration"})
        );
        assert!(!state.is_active());
    }

    #[test]
    fn test_registered_shape() {
        let state = HandlerState::registered();
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"loaded": true, "initialized": true, "registered": true})
        );
        assert!(state.is_active());
    }
}
