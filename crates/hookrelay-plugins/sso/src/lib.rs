//! The `sso` plugin: mirrors OAuth-enabled 3scale applications as clients of
//! a Red Hat SSO / Keycloak realm.
//!
//! | action               | effect                                   |
//! |----------------------|------------------------------------------|
//! | `created`, `updated` | create the client, or update it in place |
//! | `deleted`            | delete the matching client, if any       |
//!
//! ```toml
//! [handlers]
//! modules = ["sso"]
//!
//! [plugins.sso]
//! realm = "3scale"
//! hostname = "sso.example.com"
//! client_id = "admin-cli"
//! service_username = "sync"
//! service_password = "..."
//! # auth_realm = "master"
//! ```
//!
//! The legacy `SSO_*` environment variables map onto the same keys.

pub mod client;
pub mod config;
pub mod error;
pub mod model;

use async_trait::async_trait;
use hookrelay_core::{
    BoxError, BoxedHandler, CancellationToken, EventType, KnownTypes, PluginLoadContext, Status,
    WebhookEvent, WebhookHandler,
};
use hookrelay_framework::define_plugin;
use tracing::info;

pub use client::KeycloakClient;
pub use config::{SsoConfig, SsoSettings};
pub use error::SsoError;
pub use model::ClientRepresentation;

define_plugin! {
    /// Keycloak client synchronisation.
    pub static SSO_PLUGIN: {
        name: "sso",
        create: SsoHandler::create,
    }
}

const APPLICATION: &str = "application";

pub const NOT_OAUTH: &str = "No redirect_url found in app description (not OAuth ?)";
pub const NO_MATCHING_CLIENT: &str = "Nothing done, could not find a matching client.";

#[derive(Debug, Default)]
pub struct SsoHandler {
    client: Option<KeycloakClient>,
}

impl SsoHandler {
    pub fn create() -> Result<BoxedHandler, BoxError> {
        Ok(Box::new(Self::default()))
    }

    /// Builds an initialised handler directly from settings.
    pub fn with_config(config: SsoConfig) -> Result<Self, SsoError> {
        Ok(Self {
            client: Some(KeycloakClient::new(config)?),
        })
    }

    async fn sync_application(
        &self,
        client: &KeycloakClient,
        action: &str,
        app: &serde_json::Value,
    ) -> Result<Status, SsoError> {
        if !model::is_oauth_application(app) {
            info!("{NOT_OAUTH}. Skipping client creation");
            return Ok(Status::message(NOT_OAUTH));
        }
        let wanted = ClientRepresentation::from_application(app);
        let client_id = wanted.client_id.as_deref().unwrap_or_default();

        let token = client.authenticate().await?;
        let existing = client.find_client(&token, client_id).await?;

        match (action, existing) {
            ("created" | "updated", None) => {
                info!(client_id, "Could not find a client, creating it");
                client.create_client(&token, &wanted).await?;
                info!(client_id, "Client created");
                Ok(Status::Success)
            }
            ("created" | "updated", Some(found)) => {
                info!(client_id, id = %found.id, "Updating existing client");
                client.update_client(&token, &found.id, &wanted).await?;
                info!(client_id, "Client updated");
                Ok(Status::Success)
            }
            ("deleted", None) => {
                info!(client_id, "Could not find a matching client");
                Ok(Status::message(NO_MATCHING_CLIENT))
            }
            ("deleted", Some(found)) => {
                info!(client_id, id = %found.id, "Deleting client");
                client.delete_client(&token, &found.id).await?;
                info!(client_id, "Client deleted");
                Ok(Status::Success)
            }
            (other, _) => {
                info!(action = other, "Unknown action");
                Ok(Status::message(format!("Unknown action '{other}'")))
            }
        }
    }
}

#[async_trait]
impl WebhookHandler for SsoHandler {
    async fn init(&mut self, ctx: &PluginLoadContext) -> Result<(), BoxError> {
        let settings: SsoSettings = ctx.get_config()?;
        self.client = Some(KeycloakClient::new(SsoConfig::try_from(settings)?)?);
        Ok(())
    }

    fn register(&self, _known: &KnownTypes) -> Result<Vec<EventType>, BoxError> {
        Ok(vec![EventType::new(APPLICATION)])
    }

    async fn handle(
        &self,
        event: &WebhookEvent,
        _cancel: &CancellationToken,
    ) -> Result<Status, BoxError> {
        // Only reachable through a misconfigured registry.
        if event.event_type.as_str() != APPLICATION {
            return Ok(Status::Unknown);
        }
        let client = self.client.as_ref().ok_or(SsoError::MissingConfiguration)?;
        Ok(self
            .sync_application(client, &event.action, &event.object)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookrelay_framework::PluginCatalog;
    use serde_json::json;

    #[test]
    fn test_plugin_is_discoverable() {
        let catalog = PluginCatalog::discovered();
        assert!(catalog.get("sso").is_some());
    }

    #[tokio::test]
    async fn test_init_requires_configuration() {
        let mut handler = SsoHandler::create().unwrap();
        let err = handler
            .init(&PluginLoadContext::new("sso", json!({"realm": "3scale"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing configuration");
    }

    #[tokio::test]
    async fn test_init_reads_settings_section() {
        let mut handler = SsoHandler::default();
        let section = json!({
            "realm": "3scale",
            "hostname": "sso.example.com",
            "client_id": "admin-cli",
            "service_username": "svc",
            "service_password": 123,
            "accept_invalid_certs": "false",
            "timeout_ms": "500",
        });
        handler
            .init(&PluginLoadContext::new("sso", section))
            .await
            .unwrap();

        let config = handler.client.as_ref().unwrap().config();
        assert_eq!(config.service_password, "123");
        assert!(!config.accept_invalid_certs);
    }

    #[tokio::test]
    async fn test_registers_applications_only() {
        let handler = SsoHandler::default();
        let types = handler.register(&KnownTypes::default()).unwrap();
        assert_eq!(types, [EventType::new("application")]);
    }

    #[tokio::test]
    async fn test_non_oauth_application_is_skipped_without_network() {
        let config = SsoConfig::try_from(SsoSettings {
            realm: Some("3scale".into()),
            hostname: Some("127.0.0.1:9".into()),
            client_id: Some("admin-cli".into()),
            service_username: Some("svc".into()),
            service_password: Some("pw".into()),
            ..SsoSettings::default()
        })
        .unwrap();
        let handler = SsoHandler::with_config(config).unwrap();
        let event = WebhookEvent::new("created", "application", json!({"application_id": "a"}));

        let status = handler
            .handle(&event, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(status, Status::message(NOT_OAUTH));
    }

    #[tokio::test]
    async fn test_other_types_are_unknown() {
        let handler = SsoHandler::default();
        let event = WebhookEvent::new("created", "user", json!({}));
        let status = handler
            .handle(&event, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(status, Status::Unknown);
    }
}
