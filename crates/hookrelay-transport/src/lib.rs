//! # hookrelay Transport
//!
//! The HTTP event gateway: receives 3scale webhook notifications, checks the
//! shared secret, decodes XML or JSON bodies into a
//! [`WebhookEvent`](hookrelay_core::WebhookEvent) and hands it to the
//! [`Dispatcher`](hookrelay_framework::Dispatcher).
//!
//! ```rust,ignore
//! let gateway = Gateway::with_shutdown(dispatcher, GatewayConfig::default(), token.clone());
//! let handle = gateway.listen("0.0.0.0:8080").await?;
//! // ...
//! token.cancel();
//! handle.stopped().await;
//! ```

pub mod error;
pub mod gateway;
pub mod payload;
pub mod server;

pub use error::{ErrorBody, GatewayError, TransportError, TransportResult};
pub use gateway::{DEFAULT_WEBHOOK_PATH, Gateway, GatewayConfig, SHARED_SECRET_PARAM};
pub use payload::{PayloadFormat, decode_body, extract_event, xml_to_json};
pub use server::ListenerHandle;
