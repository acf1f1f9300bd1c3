use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single provider round-trip.
///
/// The variant decides retry behavior: see [`LlmError::is_transient`].
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Rate limited by provider ({status}): {message}")]
    RateLimited { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request rejected by provider ({status}): {message}")]
    InvalidRequest { status: u16, message: String },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Rate-limit signals, connection failures and server-side API errors
    /// are worth another attempt. Everything else fails the call.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Connection(_) | Self::Api { .. } => true,
            Self::InvalidRequest { .. } | Self::Decode(_) | Self::Config(_) => false,
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let code = status.as_u16();
        if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited { status: code, message: body }
        } else if status.is_server_error() {
            Self::Api { status: code, message: body }
        } else {
            Self::InvalidRequest { status: code, message: body }
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            // connect, timeout, request and body errors
            Self::Connection(err.to_string())
        }
    }
}

/// Terminal outcome of a gateway call, after retries.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Model call failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: LlmError,
    },

    #[error("Model call rejected: {0}")]
    Rejected(#[source] LlmError),

    #[error("Invalid response shape: {reason}")]
    InvalidResponse { reason: String, content: String },
}

impl GatewayError {
    /// The provider error behind a retry or rejection, if any
    pub fn provider_error(&self) -> Option<&LlmError> {
        match self {
            Self::RetriesExhausted { source, .. } | Self::Rejected(source) => Some(source),
            Self::InvalidResponse { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
