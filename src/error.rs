//! Error Handling Module
//!
//! A single error type covers configuration, hosted-platform failures, stream
//! decoding and tool dispatch. Every relay operation returns
//! `Result<_, RelayError>`.
//!
//! # Example
//!
//! ```rust,ignore
//! use stock_assistant_relay::error::RelayError;
//!
//! let error = RelayError::NotFound("No thread found".into());
//! assert_eq!(error.status_code(), Some(404));
//! ```

use thiserror::Error;

/// Errors produced while relaying a conversation to the hosted assistant.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The inbound request was rejected before any outbound call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport-level failure talking to the hosted platform
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The hosted platform answered with an error status or an `error` event
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A response or event payload could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The event stream broke mid-flight
    #[error("Stream error: {0}")]
    StreamError(String),

    /// The assistant asked for a function the dispatch table does not know
    #[error("Unknown tool call function: {0}")]
    UnknownTool(String),

    /// The assistant sent arguments a known tool cannot use
    #[error("Invalid arguments for tool {tool}: {reason}")]
    InvalidToolArguments { tool: String, reason: String },

    /// The inbound request was cancelled; no further work is performed
    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl RelayError {
    /// Upstream HTTP status associated with this error, when there is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            Self::AuthenticationError(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::RateLimitError(_) => Some(429),
            _ => None,
        }
    }

    /// Status code the relay answers its own caller with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::AuthenticationError(_) => 401,
            Self::NotFound(_) => 404,
            Self::RateLimitError(_) => 429,
            Self::ApiError { .. } | Self::HttpError(_) | Self::StreamError(_) => 502,
            _ => 500,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Message suitable for showing to the end user.
    ///
    /// Streamed error parts carry this text, so it stays free of the
    /// variant prefix for the cases where the raw upstream message is
    /// already descriptive.
    pub fn user_message(&self) -> String {
        match self {
            Self::ApiError { message, .. }
            | Self::AuthenticationError(message)
            | Self::RateLimitError(message)
            | Self::ConfigurationError(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}
