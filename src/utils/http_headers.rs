//! HTTP Headers Utility
//!
//! Header construction for Assistants API requests.

use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT,
};
use secrecy::ExposeSecret;

use crate::config::OpenAiConfig;
use crate::error::RelayError;

/// Beta header the Assistants endpoints require.
pub const ASSISTANTS_BETA: &str = "assistants=v2";

const RELAY_USER_AGENT: &str = concat!("stock-assistant-relay/", env!("CARGO_PKG_VERSION"));

/// HTTP header builder for API requests
#[derive(Debug, Default)]
pub struct HttpHeaderBuilder {
    headers: HeaderMap,
}

impl HttpHeaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add Bearer token authorization
    pub fn with_bearer_auth(mut self, token: &str) -> Result<Self, RelayError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            RelayError::ConfigurationError(format!("Invalid API key format: {e}"))
        })?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    pub fn with_json_content_type(mut self) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    pub fn with_event_stream_accept(mut self) -> Self {
        self.headers
            .insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Result<Self, RelayError> {
        self.headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| RelayError::ConfigurationError(format!("Invalid user agent: {e}")))?,
        );
        Ok(self)
    }

    /// Add a custom header
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, RelayError> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            RelayError::ConfigurationError(format!("Invalid header name '{name}': {e}"))
        })?;
        self.headers.insert(
            header_name,
            HeaderValue::from_str(value).map_err(|e| {
                RelayError::ConfigurationError(format!("Invalid header value for '{name}': {e}"))
            })?,
        );
        Ok(self)
    }

    /// Add a header only when a value is present
    pub fn with_optional_header(self, name: &str, value: Option<&str>) -> Result<Self, RelayError> {
        match value {
            Some(v) => self.with_header(name, v),
            None => Ok(self),
        }
    }

    pub fn build(self) -> HeaderMap {
        self.headers
    }
}

/// Headers for an Assistants API call.
pub fn assistants_headers(config: &OpenAiConfig, streaming: bool) -> Result<HeaderMap, RelayError> {
    let mut builder = HttpHeaderBuilder::new()
        .with_bearer_auth(config.api_key.expose_secret())?
        .with_json_content_type()
        .with_user_agent(RELAY_USER_AGENT)?
        .with_header("OpenAI-Beta", ASSISTANTS_BETA)?
        .with_optional_header("OpenAI-Organization", config.organization.as_deref())?
        .with_optional_header("OpenAI-Project", config.project.as_deref())?;
    if streaming {
        builder = builder.with_event_stream_accept();
    }
    Ok(builder.build())
}
