//! Handler outcomes and the aggregated dispatch result.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::BoxError;

/// What a handler reports after processing an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The side effect completed.
    Success,
    /// The handler has nothing to report.
    Unknown,
    /// Free-text outcome, usually describing why nothing (or something partial) was done.
    Message(String),
}

impl Status {
    /// Rendering of [`Status::Success`].
    pub const SUCCESS: &'static str = "SUCCESS";
    /// Rendering of [`Status::Unknown`].
    pub const UNKNOWN: &'static str = "UNKNOWN";

    /// Creates a free-text status.
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Returns `true` for [`Status::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str(Self::SUCCESS),
            Self::Unknown => f.write_str(Self::UNKNOWN),
            Self::Message(m) => f.write_str(m),
        }
    }
}

impl From<Option<Status>> for Status {
    fn from(status: Option<Status>) -> Self {
        status.unwrap_or(Self::Unknown)
    }
}

// =============================================================================
// HandlerFault
// =============================================================================

/// A handler failure caught at the chain's fault boundary.
#[derive(Debug, Error)]
pub enum HandlerFault {
    /// `handle` returned an error.
    #[error("{0}")]
    Raised(BoxError),

    /// `handle` panicked. Renders as the bare panic message, like a raised
    /// error, so a crash reads the same as a reported failure.
    #[error("{0}")]
    Panicked(String),

    /// `handle` did not finish within the per-handler deadline.
    #[error("handler timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// The dispatch was cancelled before or while this handler ran.
    #[error("dispatch cancelled")]
    Cancelled,
}

impl HandlerFault {
    /// Builds a [`HandlerFault::Panicked`] from a panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "handler panicked".to_string()
        };
        Self::Panicked(msg)
    }
}

impl From<BoxError> for HandlerFault {
    fn from(err: BoxError) -> Self {
        Self::Raised(err)
    }
}

/// Converts a handler outcome into its canonical string form.
///
/// Absent reports become `"UNKNOWN"`, faults become their human-readable
/// rendering and everything else passes through.
pub fn normalize(outcome: &Result<Status, HandlerFault>) -> String {
    match outcome {
        Ok(status) => status.to_string(),
        Err(fault) => fault.to_string(),
    }
}

// =============================================================================
// DispatchResult
// =============================================================================

/// One handler's normalised outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchEntry {
    /// Plugin name.
    pub name: String,
    /// Normalised status.
    pub result: String,
}

impl DispatchEntry {
    /// Creates an entry.
    pub fn new(name: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: result.into(),
        }
    }
}

/// Ordered outcomes of one dispatch, one entry per invoked handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchResult {
    entries: Vec<DispatchEntry>,
}

impl DispatchResult {
    /// Creates an empty result with room for `n` entries.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            entries: Vec::with_capacity(n),
        }
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: DispatchEntry) {
        self.entries.push(entry);
    }

    /// Entries in dispatch order.
    pub fn entries(&self) -> &[DispatchEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entry was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the result recorded for `name`.
    pub fn result_of(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.result.as_str())
    }

    /// Number of entries whose result is the success token.
    pub fn success_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.result == Status::SUCCESS)
            .count()
    }
}

impl IntoIterator for DispatchResult {
    type Item = DispatchEntry;
    type IntoIter = std::vec::IntoIter<DispatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_status() {
        assert_eq!(normalize(&Ok(Status::Success)), "SUCCESS");
        assert_eq!(normalize(&Ok(Status::from(None))), "UNKNOWN");
        assert_eq!(
            normalize(&Ok(Status::message("Nothing done"))),
            "Nothing done"
        );
    }

    #[test]
    fn test_normalize_faults() {
        let raised: BoxError = "boom".into();
        assert_eq!(normalize(&Err(HandlerFault::Raised(raised))), "boom");
        assert_eq!(
            normalize(&Err(HandlerFault::TimedOut(Duration::from_millis(250)))),
            "handler timed out after 250ms"
        );
        assert_eq!(normalize(&Err(HandlerFault::Cancelled)), "dispatch cancelled");
    }

    #[test]
    fn test_fault_from_panic_payloads() {
        let fault = HandlerFault::from_panic(Box::new("kaput"));
        assert_eq!(fault.to_string(), "kaput");
        let fault = HandlerFault::from_panic(Box::new(String::from("owned")));
        assert_eq!(fault.to_string(), "owned");
        let fault = HandlerFault::from_panic(Box::new(7_u8));
        assert_eq!(fault.to_string(), "handler panicked");
    }

    #[test]
    fn test_dispatch_result_serializes_as_array() {
        let mut result = DispatchResult::default();
        result.push(DispatchEntry::new("A", "SUCCESS"));
        result.push(DispatchEntry::new("B", "boom"));
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"[{"name":"A","result":"SUCCESS"},{"name":"B","result":"boom"}]"#
        );
        assert_eq!(result.result_of("B"), Some("boom"));
        assert_eq!(result.success_count(), 1);
    }
}
