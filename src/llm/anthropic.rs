//! Anthropic Messages API client.

use super::{MessageRequest, MessageResponse, ModelClient, ModelError};
use crate::config::LlmSettings;
use crate::error::{is_transient_transport, Result, SyllabusError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Overloaded status used by the Anthropic API.
const STATUS_OVERLOADED: u16 = 529;

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

/// HTTP client for the Anthropic Messages endpoint.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    api_version: String,
}

impl AnthropicClient {
    /// Create a client with the given key and request timeout.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Create a client from settings, reading the key from `ANTHROPIC_API_KEY`.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            SyllabusError::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;
        Self::with_key(api_key, settings)
    }

    /// Create a client from settings with an explicit API key.
    pub fn with_key(api_key: impl Into<String>, settings: &LlmSettings) -> Result<Self> {
        let mut client = Self::new(api_key, Duration::from_secs(settings.timeout_secs))?;
        if let Some(base) = &settings.api_base {
            client.api_base = base.trim_end_matches('/').to_string();
        }
        client.api_version = settings.api_version.clone();
        Ok(client)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.api_base)
    }
}

/// Classify a failed HTTP status into a model error.
fn classify_status(status: StatusCode, body: &str) -> ModelError {
    let detail = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => {
            format!("{}: {}", parsed.error.kind, parsed.error.message)
        }
        _ => body.trim().chars().take(200).collect(),
    };
    let message = format!("HTTP {}: {}", status.as_u16(), detail);

    match status.as_u16() {
        408 | 429 | 500 | 502 | 503 | 504 | STATUS_OVERLOADED => ModelError::Transient(message),
        _ => ModelError::Permanent(message),
    }
}

/// Classify a transport failure into a model error.
fn classify_transport(err: &reqwest::Error) -> ModelError {
    if is_transient_transport(err) {
        ModelError::Transient(format!("request failed: {}", err))
    } else {
        ModelError::Permanent(format!("request failed: {}", err))
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    #[instrument(
        skip(self, request),
        fields(model = %request.model, turns = request.messages.len(), tools = request.has_tools())
    )]
    async fn create_message(
        &self,
        request: &MessageRequest,
    ) -> std::result::Result<MessageResponse, ModelError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(request)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| classify_transport(&e))?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        let parsed: MessageResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::Permanent(format!("malformed response: {}", e)))?;

        debug!(
            "Model responded: stop_reason={:?}, blocks={}, output_tokens={}",
            parsed.stop_reason,
            parsed.content.len(),
            parsed.usage.output_tokens
        );

        Ok(parsed)
    }
}
