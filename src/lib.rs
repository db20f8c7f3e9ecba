//! # Stock assistant relay
//!
//! A small HTTP relay between a browser chat page and a hosted assistant
//! that keeps threads, messages and runs server-side.
//!
#![deny(unsafe_code)]

//! ## Flow
//!
//! - `POST /api` resolves or creates a thread, appends the user message and
//!   starts a streamed run against the configured assistant.
//! - Run events are forwarded as `<code>:<json>` lines (see [`protocol`]).
//! - When the run asks for tool outputs, [`tools`] answers them locally and
//!   the outputs are submitted in one batch; the resumed stream is forwarded.
//! - A client that disconnects cancels all outbound work for its request.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stock_assistant_relay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RelayError> {
//!     let config = RelayConfig::from_env()?;
//!     let api = OpenAiAssistantsClient::from_config(config.openai.clone())?;
//!     let relay = AssistantRelay::new(Arc::new(api), config.assistant_id.clone());
//!     let state = AppState::new(relay, config.missing_keys());
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr)
//!         .await
//!         .map_err(|e| RelayError::ConfigurationError(e.to_string()))?;
//!     serve(listener, state, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod relay;
pub mod server_adapters;
pub mod tools;
pub mod types;
pub mod ui;
pub mod utils;

pub use error::RelayError;

/// Common imports
pub mod prelude {
    pub use crate::client::{AssistantEventStream, AssistantsApi, OpenAiAssistantsClient};
    pub use crate::config::{OpenAiConfig, RelayConfig};
    pub use crate::error::RelayError;
    pub use crate::logging::{LogFormat, init_logging};
    pub use crate::protocol::StreamPart;
    pub use crate::relay::{AssistantRelay, RelayRequest, RelaySession, RelayStream};
    pub use crate::server_adapters::ProtocolOptions;
    pub use crate::server_adapters::axum::{AppState, router, serve};
    pub use crate::tools::{StockTool, resolve_tool_calls};
}
