//! Errors raised while talking to the identity provider.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SsoError {
    #[error("Missing configuration")]
    MissingConfiguration,

    #[error("SSO request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Got a {status} response from SSO while {during}")]
    UnexpectedStatus { status: u16, during: &'static str },

    #[error("Too many matching clients ({0}). Refusing to do anything.")]
    TooManyClients(usize),
}

impl SsoError {
    pub(crate) fn status(status: reqwest::StatusCode, during: &'static str) -> Self {
        Self::UnexpectedStatus {
            status: status.as_u16(),
            during,
        }
    }
}
