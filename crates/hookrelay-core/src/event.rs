//! Event identifiers and the normalised webhook event.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category of domain object an event describes (`application`, `user`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    /// Creates an event type from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EventType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// KnownTypes
// =============================================================================

/// The ordered, immutable set of event types the service accepts.
///
/// Fixed at startup. Cloning is cheap; clones share the same storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownTypes {
    types: Arc<[EventType]>,
}

impl KnownTypes {
    /// Type names accepted when nothing else is configured.
    pub const DEFAULT: [&'static str; 3] = ["application", "user", "account"];

    /// Builds the set from names, keeping the first occurrence of duplicates.
    pub fn new<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EventType>,
    {
        let mut out: Vec<EventType> = Vec::new();
        for t in types {
            let t = t.into();
            if !out.contains(&t) {
                out.push(t);
            }
        }
        Self { types: out.into() }
    }

    /// Returns `true` when `name` is a known type.
    pub fn contains(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.as_str() == name)
    }

    /// Iterates types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &EventType> {
        self.types.iter()
    }

    /// Returns the types as a slice.
    pub fn as_slice(&self) -> &[EventType] {
        &self.types
    }

    /// Number of known types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` when no type is known.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for KnownTypes {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

// =============================================================================
// WebhookEvent
// =============================================================================

/// One incoming notification: `action` applied to an `object` of `event_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// What happened (`created`, `updated`, `deleted`, ...).
    pub action: String,
    /// Category of the object.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// The object itself, as delivered by the event source.
    pub object: Value,
}

impl WebhookEvent {
    /// Creates a new event.
    pub fn new(action: impl Into<String>, event_type: impl Into<EventType>, object: Value) -> Self {
        Self {
            action: action.into(),
            event_type: event_type.into(),
            object,
        }
    }

    /// Looks up a string field of the object.
    pub fn object_str(&self, key: &str) -> Option<&str> {
        self.object.get(key).and_then(Value::as_str)
    }
}
