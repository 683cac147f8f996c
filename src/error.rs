//! Error types for push-pilot

use thiserror::Error;

/// Errors produced by push-pilot
///
/// Only [`Error::Config`] and [`Error::Io`] are allowed to stop the process,
/// and only during startup. Everything raised while handling a delivery
/// is caught and logged by the webhook layer or the workflow executor.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing startup configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Webhook delivery failed signature verification
    #[error("signature verification failed: {0}")]
    Signature(String),

    /// Webhook body could not be decoded as the expected payload
    #[error("invalid payload: {0}")]
    Payload(String),

    /// App or installation authentication failed
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Structured failure returned by the repository API
    #[error("remote API error (status {status}): {message}")]
    RemoteApi {
        /// HTTP status code
        status: u16,
        /// Message from the API response body
        message: String,
    },

    /// Any other failure while talking to the remote (network, decode, ...)
    #[error("{0}")]
    Unknown(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using push-pilot's Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => Self::RemoteApi {
                status: source.status_code.as_u16(),
                message: source.message.clone(),
            },
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::RemoteApi {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => Self::Unknown(err.to_string()),
        }
    }
}
