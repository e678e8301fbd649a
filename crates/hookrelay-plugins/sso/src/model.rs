//! Mapping of a 3scale application onto a Keycloak client representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Subset of Keycloak's `ClientRepresentation` written on create/update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRepresentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_authenticator_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_client: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uris: Option<Vec<String>>,
}

/// A client as returned by the clients search endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingClient {
    /// Keycloak's internal id, used in the admin URLs.
    pub id: String,
    #[serde(default)]
    pub client_id: Option<String>,
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Returns `true` when the application carries a `redirect_url` field, even an
/// empty one. Only OAuth-enabled applications do.
pub fn is_oauth_application(app: &Value) -> bool {
    app.get("redirect_url").is_some()
}

impl ClientRepresentation {
    /// Builds the payload from an application object.
    pub fn from_application(app: &Value) -> Self {
        let mut client = Self {
            client_id: app.get("application_id").and_then(text),
            name: app.get("name").and_then(text),
            description: app.get("description").and_then(text),
            ..Self::default()
        };

        // `keys.key` is a list when the application has several keys.
        let key = app.pointer("/keys/key").and_then(|key| match key {
            Value::Array(keys) => keys.first().and_then(text),
            other => text(other),
        });
        if let Some(secret) = key {
            client.secret = Some(secret);
            client.client_authenticator_type = Some("client-secret".to_string());
            client.public_client = Some(false);
        }

        if let Some(url) = app.get("redirect_url").and_then(text).filter(|u| !u.is_empty()) {
            client.redirect_uris = Some(vec![url]);
        }
        client
    }
}
