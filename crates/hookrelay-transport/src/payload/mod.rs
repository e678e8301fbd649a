//! Request body decoding and envelope extraction.

mod xml;

pub use xml::xml_to_json;

use hookrelay_core::WebhookEvent;
use serde_json::Value;

use crate::error::GatewayError;

/// Wire format of a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Xml,
}

impl PayloadFormat {
    /// JSON when the content type says so or the body looks like an object;
    /// XML otherwise, which is what 3scale sends.
    pub fn detect(content_type: Option<&str>, body: &str) -> Self {
        let declared_json = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);
        if declared_json || body.trim_start().starts_with('{') {
            PayloadFormat::Json
        } else {
            PayloadFormat::Xml
        }
    }
}

/// Decodes a raw body into a JSON document.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> Result<Value, GatewayError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| GatewayError::MalformedPayload(format!("body is not UTF-8: {e}")))?;
    if text.trim().is_empty() {
        return Err(GatewayError::EmptyBody);
    }

    match PayloadFormat::detect(content_type, text) {
        PayloadFormat::Json => serde_json::from_str(text)
            .map_err(|e| GatewayError::MalformedPayload(format!("invalid JSON: {e}"))),
        PayloadFormat::Xml => xml_to_json(text),
    }
}

/// Pulls the `event` envelope out of a decoded document.
///
/// The event object is `event.object[<type>]`; a missing or `null` object is
/// rejected. A missing `action` is passed through as an empty string.
pub fn extract_event(payload: &Value) -> Result<WebhookEvent, GatewayError> {
    let event = payload
        .get("event")
        .filter(|e| e.is_object())
        .ok_or(GatewayError::MissingEvent)?;

    let action = event
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let event_type = event
        .get("type")
        .and_then(Value::as_str)
        .ok_or(GatewayError::MissingObject)?;
    let object = event
        .get("object")
        .and_then(|o| o.get(event_type))
        .filter(|o| !o.is_null())
        .ok_or(GatewayError::MissingObject)?;

    Ok(WebhookEvent::new(action, event_type, object.clone()))
}
