//! Gateway and transport error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hookrelay_core::RouteError;
use serde::Serialize;
use thiserror::Error;

/// A request the gateway refuses to dispatch.
///
/// Every variant maps to one HTTP status; the `Display` text becomes the
/// `message` of the JSON error body.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Wrong shared secret")]
    WrongSharedSecret,

    #[error("No body sent")]
    EmptyBody,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("No event found in payload")]
    MissingEvent,

    #[error("No object found in payload")]
    MissingObject,

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("Not found")]
    NotFound,
}

impl GatewayError {
    /// HTTP status returned for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::WrongSharedSecret => StatusCode::FORBIDDEN,
            GatewayError::EmptyBody
            | GatewayError::MalformedPayload(_)
            | GatewayError::MissingEvent
            | GatewayError::MissingObject => StatusCode::BAD_REQUEST,
            GatewayError::Route(_) => StatusCode::PRECONDITION_FAILED,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            status: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Failure to bring the listener up.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;
