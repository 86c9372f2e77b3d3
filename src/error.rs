use thiserror::Error;

// Import Axum types for HTTP response conversion
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// The custom error type for request-level failures.
///
/// Prompt and completion failures never reach this type. They stay inside the
/// persona pipeline as `PersonaError` and only drop that persona.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed JSON, a missing required field, or an unconvertible message.
    #[error("{0}")]
    Validation(String),

    /// The completion API credential could not be retrieved.
    #[error("Failed to get OpenAI API key: {0}")]
    UpstreamCredential(String),

    /// A configuration loading error.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A configuration value that loaded but makes no sense.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, Error>` to simplify function signatures.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::UpstreamCredential(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert custom Error to HTTP response
///
/// Clients only get the status code and a human-readable plain-text message.
/// CORS headers are added by the router layers, not here.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::info!(error = %self, "Request rejected");
        }
        (status, self.to_string()).into_response()
    }
}
