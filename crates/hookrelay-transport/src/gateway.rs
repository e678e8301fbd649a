//! The HTTP surface in front of the dispatcher.
//!
//! ```text
//! GET  /          → service description and registry introspection
//! GET  <path>     → {"pong":"webhook"}
//! POST <path>     → validate, decode, dispatch, return the DispatchResult
//! *               → 404 {"status":404,"message":"Not found"}
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, Request, State},
    http::{HeaderMap, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use hookrelay_core::{CancellationToken, DispatchResult};
use hookrelay_framework::Dispatcher;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::payload::{decode_body, extract_event};

/// Default webhook path.
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";

/// Query parameter carrying the shared secret.
pub const SHARED_SECRET_PARAM: &str = "shared_secret";

/// Gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Path the webhook is served on.
    pub path: String,
    /// Expected `?shared_secret=`; `None` disables the check.
    pub shared_secret: Option<String>,
    /// Deadline for one whole dispatch; on expiry the chain is cancelled.
    pub request_timeout: Option<Duration>,
    /// Reported by `GET /`.
    pub name: String,
    /// Reported by `GET /`.
    pub description: String,
    /// Reported by `GET /` under `documentation`.
    pub documentation: Vec<(String, String)>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_WEBHOOK_PATH.to_string(),
            shared_secret: None,
            request_timeout: None,
            name: "hookrelay".to_string(),
            description: "Fans 3scale webhook events out to handler plugins".to_string(),
            documentation: vec![(
                "Repository".to_string(),
                env!("CARGO_PKG_REPOSITORY").to_string(),
            )],
        }
    }
}

impl GatewayConfig {
    /// Sets the webhook path, adding the leading `/` when missing.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    /// Sets the shared secret; an empty secret disables the check.
    pub fn with_shared_secret(mut self, secret: Option<String>) -> Self {
        self.shared_secret = secret.filter(|s| !s.is_empty());
        self
    }

    /// Sets the per-request dispatch deadline.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

struct GatewayState {
    dispatcher: Dispatcher,
    config: GatewayConfig,
    shutdown: CancellationToken,
}

/// The webhook gateway: owns the dispatcher and builds the axum [`Router`].
#[derive(Clone)]
pub struct Gateway {
    state: Arc<GatewayState>,
}

impl Gateway {
    /// Creates a gateway with its own shutdown token.
    pub fn new(dispatcher: Dispatcher, config: GatewayConfig) -> Self {
        Self::with_shutdown(dispatcher, config, CancellationToken::new())
    }

    /// Creates a gateway whose in-flight dispatches are cancelled by `shutdown`.
    pub fn with_shutdown(
        dispatcher: Dispatcher,
        config: GatewayConfig,
        shutdown: CancellationToken,
    ) -> Self {
        if config.shared_secret.is_none() {
            warn!("Authentication is DISABLED, set a shared secret to enable it");
        }
        Self {
            state: Arc::new(GatewayState {
                dispatcher,
                config,
                shutdown,
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.state.shutdown
    }

    /// URL path (with query) to configure on the 3scale side.
    pub fn webhook_url(&self) -> String {
        let config = &self.state.config;
        match &config.shared_secret {
            Some(secret) => format!(
                "{}?{SHARED_SECRET_PARAM}={}",
                config.path,
                urlencoding::encode(secret)
            ),
            None => config.path.clone(),
        }
    }

    /// Builds the router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(describe))
            .route(&self.state.config.path, get(ping).post(receive))
            .fallback(not_found)
            .method_not_allowed_fallback(not_found)
            .layer(middleware::from_fn(log_request))
            .with_state(Arc::clone(&self.state))
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("path", &self.state.config.path)
            .field("authenticated", &self.state.config.shared_secret.is_some())
            .field("dispatcher", &self.state.dispatcher)
            .finish()
    }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

async fn describe(State(state): State<Arc<GatewayState>>) -> Json<Value> {
    let registry = state.dispatcher.registry();

    let by_type: Map<String, Value> = registry
        .handlers_by_type()
        .into_iter()
        .map(|(t, names)| (t.to_string(), json!(names)))
        .collect();
    let states: Map<String, Value> = registry
        .states()
        .iter()
        .map(|(name, s)| (name.clone(), json!(s)))
        .collect();
    let documentation: Map<String, Value> = state
        .config
        .documentation
        .iter()
        .map(|(k, v)| (k.clone(), json!(v)))
        .collect();

    Json(json!({
        "name": state.config.name,
        "description": state.config.description,
        "endpoints": [
            { "url": state.config.path, "verbs": ["GET", "POST"] }
        ],
        "documentation": documentation,
        "handlersByType": by_type,
        "handlersState": states,
    }))
}

async fn ping() -> Json<Value> {
    Json(json!({ "pong": "webhook" }))
}

async fn receive(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DispatchResult>, GatewayError> {
    if let Some(secret) = &state.config.shared_secret
        && query.get(SHARED_SECRET_PARAM) != Some(secret)
    {
        return Err(GatewayError::WrongSharedSecret);
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let payload = decode_body(content_type, &body)?;
    let event = extract_event(&payload)?;
    debug!(action = %event.action, event_type = %event.event_type, "Webhook event received");

    let cancel = state.shutdown.child_token();
    let dispatch = state.dispatcher.dispatch(&event, &cancel);
    let outcome = match state.config.request_timeout {
        Some(limit) => {
            tokio::pin!(dispatch);
            tokio::select! {
                outcome = &mut dispatch => outcome,
                () = tokio::time::sleep(limit) => {
                    warn!(timeout_ms = limit.as_millis() as u64, "Dispatch deadline expired");
                    cancel.cancel();
                    dispatch.await
                }
            }
        }
        None => dispatch.await,
    };

    Ok(Json(outcome?))
}

async fn not_found() -> GatewayError {
    GatewayError::NotFound
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;
    let status = response.status().as_u16();
    info!(%method, %uri, status, "{method} {uri} => {status}");
    response
}
