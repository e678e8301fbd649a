//! The `log` plugin: registers for every event type, logs the event and
//! reports `SUCCESS`.
//!
//! ```toml
//! [handlers]
//! modules = ["log"]
//!
//! [plugins.log]
//! include_object = true   # also log the event object
//! ```

use async_trait::async_trait;
use hookrelay_core::{
    BoxError, BoxedHandler, CancellationToken, EventType, KnownTypes, PluginLoadContext, Status,
    WebhookEvent, WebhookHandler,
};
use hookrelay_framework::define_plugin;
use serde::{Deserialize, Deserializer};
use tracing::info;

define_plugin! {
    /// Event logger.
    pub static LOG_PLUGIN: {
        name: "log",
        create: LogHandler::create,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    #[serde(deserialize_with = "flag")]
    pub include_object: bool,
}

/// Environment overrides arrive as text.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid boolean '{other}'"))),
        },
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            include_object: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct LogHandler {
    config: LogConfig,
}

impl LogHandler {
    pub fn create() -> Result<BoxedHandler, BoxError> {
        Ok(Box::new(Self::default()))
    }
}

#[async_trait]
impl WebhookHandler for LogHandler {
    async fn init(&mut self, ctx: &PluginLoadContext) -> Result<(), BoxError> {
        self.config = ctx.get_config()?;
        Ok(())
    }

    fn register(&self, known: &KnownTypes) -> Result<Vec<EventType>, BoxError> {
        Ok(known.iter().cloned().collect())
    }

    async fn handle(
        &self,
        event: &WebhookEvent,
        _cancel: &CancellationToken,
    ) -> Result<Status, BoxError> {
        if self.config.include_object {
            info!(
                action = %event.action,
                event_type = %event.event_type,
                object = %event.object,
                "--> WEBHOOK"
            );
        } else {
            info!(action = %event.action, event_type = %event.event_type, "--> WEBHOOK");
        }
        Ok(Status::Success)
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
        let desc = catalog.get("log").unwrap();
        assert!(desc.is_compatible());
        assert_eq!(desc.description, "Logs every webhook event it receives");
    }

    #[tokio::test]
    async fn test_registers_everything_and_succeeds() {
        let mut handler = LogHandler::create().unwrap();
        handler
            .init(&PluginLoadContext::new("log", json!({})))
            .await
            .unwrap();

        let known = KnownTypes::default();
        assert_eq!(handler.register(&known).unwrap(), known.as_slice());

        let event = WebhookEvent::new("created", "account", json!({"id": "7"}));
        let status = handler
            .handle(&event, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(status, Status::Success);
    }

    #[tokio::test]
    async fn test_config() {
        let mut handler = LogHandler::default();
        handler
            .init(&PluginLoadContext::new("log", json!({"include_object": false})))
            .await
            .unwrap();
        assert!(!handler.config.include_object);

        handler
            .init(&PluginLoadContext::new("log", json!({"include_object": "TRUE"})))
            .await
            .unwrap();
        assert!(handler.config.include_object);

        let bad = handler
            .init(&PluginLoadContext::new("log", json!({"include_object": "maybe"})))
            .await;
        assert!(bad.is_err());
    }
}
