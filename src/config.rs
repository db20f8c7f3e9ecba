//! Relay configuration
//!
//! All settings come from environment-style key/value pairs. The two values
//! the chat depends on are the API credential and the assistant profile id;
//! both may be absent at startup and are reported through
//! [`RelayConfig::missing_keys`] instead of failing the process.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::RelayError;
use crate::logging::LogFormat;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const ASSISTANT_ID_VAR: &str = "ASSISTANT_ID";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const ORGANIZATION_VAR: &str = "OPENAI_ORGANIZATION";
pub const PROJECT_VAR: &str = "OPENAI_PROJECT";
pub const BIND_ADDR_VAR: &str = "RELAY_BIND_ADDR";
pub const LOG_FORMAT_VAR: &str = "RELAY_LOG_FORMAT";
pub const REQUEST_TIMEOUT_VAR: &str = "RELAY_REQUEST_TIMEOUT_SECS";
pub const MASK_ERRORS_VAR: &str = "RELAY_MASK_ERRORS";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Connection settings for the hosted Assistants API.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub organization: Option<String>,
    pub project: Option<String>,
    /// Connect timeout for outbound requests. Runs themselves are unbounded.
    pub connect_timeout: Option<Duration>,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            organization: None,
            project: None,
            connect_timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("has_api_key", &self.has_api_key())
            .field("base_url", &self.base_url)
            .field("has_organization", &self.organization.is_some())
            .field("has_project", &self.project.is_some())
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub openai: OpenAiConfig,
    /// Assistant profile every run is started against.
    pub assistant_id: Option<String>,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    /// Replace streamed error text with a generic message.
    pub mask_errors: bool,
}

impl RelayConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut openai = OpenAiConfig::new(get(API_KEY_VAR).unwrap_or_default());
        if let Some(base_url) = get(BASE_URL_VAR) {
            openai = openai.with_base_url(base_url);
        }
        if let Some(org) = get(ORGANIZATION_VAR) {
            openai = openai.with_organization(org);
        }
        if let Some(project) = get(PROJECT_VAR) {
            openai = openai.with_project(project);
        }
        if let Some(raw) = get(REQUEST_TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                RelayError::ConfigurationError(format!(
                    "{REQUEST_TIMEOUT_VAR} must be a whole number of seconds, got '{raw}'"
                ))
            })?;
            openai.connect_timeout = Some(Duration::from_secs(secs));
        }

        let bind_raw = get(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.trim().parse().map_err(|e| {
            RelayError::ConfigurationError(format!("Invalid {BIND_ADDR_VAR} '{bind_raw}': {e}"))
        })?;

        let log_format = match get(LOG_FORMAT_VAR) {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        let mask_errors = match get(MASK_ERRORS_VAR) {
            Some(raw) => parse_flag(MASK_ERRORS_VAR, &raw)?,
            None => false,
        };

        Ok(Self {
            openai,
            assistant_id: get(ASSISTANT_ID_VAR).map(|id| id.trim().to_string()),
            bind_addr,
            log_format,
            mask_errors,
        })
    }

    /// Required keys that are not configured, in display order.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.openai.has_api_key() {
            missing.push(API_KEY_VAR);
        }
        if self.assistant_id.is_none() {
            missing.push(ASSISTANT_ID_VAR);
        }
        missing
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, RelayError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RelayError::ConfigurationError(format!(
            "{key} must be a boolean, got '{raw}'"
        ))),
    }
}
