//! `OpenAI` Assistants API client
//!
//! Thin HTTP implementation of [`AssistantsApi`]. All thread, message and run
//! state stays on the hosted platform.

use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::{AssistantEventStream, AssistantsApi};
use crate::config::OpenAiConfig;
use crate::error::RelayError;
use crate::types::{
    CreateMessageRequest, CreateRunRequest, SubmitToolOutputsRequest, Thread, ThreadMessage,
};
use crate::utils::http_headers::assistants_headers;
use crate::utils::{cancellable, decode_event_stream, make_cancellable_stream};

/// `OpenAI` Assistants client
#[derive(Clone)]
pub struct OpenAiAssistantsClient {
    config: OpenAiConfig,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiAssistantsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiAssistantsClient")
            .field("config", &self.config)
            .finish()
    }
}

impl OpenAiAssistantsClient {
    pub fn new(config: OpenAiConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Build a client with a `reqwest::Client` configured from `config`.
    pub fn from_config(config: OpenAiConfig) -> Result<Self, RelayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http_client = builder.build().map_err(|e| {
            RelayError::ConfigurationError(format!("Failed to build HTTP client: {e}"))
        })?;
        Ok(Self::new(config, http_client))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        streaming: bool,
    ) -> Result<reqwest::Response, RelayError> {
        let url = self.url(path);
        let headers = assistants_headers(&self.config, streaming)?;
        let started = Instant::now();
        debug!(method = "POST", url = %url, streaming, "Request started");

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| RelayError::HttpError(format!("Failed to send request: {e}")))?;

        if !response.status().is_success() {
            let err = handle_response_error(response).await;
            error!(
                url = %url,
                status_code = ?err.status_code(),
                duration_ms = started.elapsed().as_millis() as u64,
                error = %err,
                "Request failed"
            );
            return Err(err);
        }

        debug!(
            url = %url,
            status_code = response.status().as_u16(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        Ok(response)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, RelayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(path, body, false).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| RelayError::ParseError(format!("Failed to parse response from {path}: {e}")))
    }

    async fn post_stream<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AssistantEventStream, RelayError> {
        let response = self.send(path, body, true).await?;
        Ok(decode_event_stream(response.bytes_stream()))
    }
}

/// Map a non-success response to an error.
async fn handle_response_error(response: reqwest::Response) -> RelayError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let details: Option<serde_json::Value> = serde_json::from_str(&error_text).ok();
    let message = details
        .as_ref()
        .and_then(|d| d.pointer("/error/message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or(error_text);

    match status.as_u16() {
        400 => RelayError::InvalidInput(format!("Bad request: {message}")),
        401 => RelayError::AuthenticationError(message),
        404 => RelayError::NotFound(message),
        429 => RelayError::RateLimitError(message),
        code => RelayError::ApiError {
            code,
            message: format!("Assistants API error {status}: {message}"),
            details,
        },
    }
}

#[async_trait]
impl AssistantsApi for OpenAiAssistantsClient {
    async fn create_thread(&self, cancel: &CancellationToken) -> Result<Thread, RelayError> {
        cancellable(cancel, self.post_json("threads", &serde_json::json!({}))).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: CreateMessageRequest,
        cancel: &CancellationToken,
    ) -> Result<ThreadMessage, RelayError> {
        let path = format!("threads/{thread_id}/messages");
        cancellable(cancel, self.post_json(&path, &request)).await
    }

    async fn create_run_stream(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
        cancel: &CancellationToken,
    ) -> Result<AssistantEventStream, RelayError> {
        let path = format!("threads/{thread_id}/runs");
        let stream = cancellable(cancel, self.post_stream(&path, &request)).await?;
        Ok(make_cancellable_stream(stream, cancel.clone()))
    }

    async fn submit_tool_outputs_stream(
        &self,
        thread_id: &str,
        run_id: &str,
        request: SubmitToolOutputsRequest,
        cancel: &CancellationToken,
    ) -> Result<AssistantEventStream, RelayError> {
        let path = format!("threads/{thread_id}/runs/{run_id}/submit_tool_outputs");
        let stream = cancellable(cancel, self.post_stream(&path, &request)).await?;
        Ok(make_cancellable_stream(stream, cancel.clone()))
    }
}
