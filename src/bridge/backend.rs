//! OpenAI-compatible chat completion client.
//!
//! Serves both Ollama's `/v1/chat/completions` endpoint and any other
//! endpoint speaking the same protocol. A bearer key is sent only when one
//! is configured.

use super::{ChatBackend, ChatMessage};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which kind of chat endpoint the bridge talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// Local Ollama.
    #[default]
    #[serde(rename = "ollama")]
    Ollama,
    /// Any OpenAI-compatible endpoint.
    #[serde(rename = "openai_compat")]
    OpenAiCompat,
}

impl BackendKind {
    /// Returns the backend name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAiCompat => "openai_compat",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai_compat" | "openai-compat" | "openai" => Ok(Self::OpenAiCompat),
            other => Err(Error::InvalidInput(format!(
                "unknown backend '{other}' (expected ollama or openai_compat)"
            ))),
        }
    }
}

/// Builds a blocking HTTP client with a request timeout.
///
/// Falls back to a default client if the builder fails.
#[must_use]
pub fn build_http_client(timeout: Duration) -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!("Failed to build chat HTTP client: {err}");
            reqwest::blocking::Client::new()
        })
}

/// Chat completion client for Ollama and OpenAI-compatible endpoints.
pub struct OpenAiCompatClient {
    kind: BackendKind,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
    client: reqwest::blocking::Client,
}

impl OpenAiCompatClient {
    /// Default Ollama endpoint.
    pub const DEFAULT_OLLAMA_URL: &'static str = "http://127.0.0.1:11434/v1/chat/completions";

    /// Default OpenAI-compatible endpoint.
    pub const DEFAULT_OPENAI_URL: &'static str = "http://127.0.0.1:8000/v1/chat/completions";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "llama3.1:8b";

    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Creates a client for a local Ollama instance.
    #[must_use]
    pub fn ollama() -> Self {
        Self {
            kind: BackendKind::Ollama,
            endpoint: Self::DEFAULT_OLLAMA_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            api_key: None,
            client: build_http_client(Self::DEFAULT_TIMEOUT),
        }
    }

    /// Creates a client for an OpenAI-compatible endpoint.
    #[must_use]
    pub fn openai_compat(endpoint: impl Into<String>) -> Self {
        Self {
            kind: BackendKind::OpenAiCompat,
            endpoint: endpoint.into(),
            ..Self::ollama()
        }
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the bearer key.
    #[must_use]
    pub fn with_api_key(mut self, key: SecretString) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_http_client(timeout);
        self
    }

    /// Returns the backend kind.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Returns the endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatBackend for OpenAiCompatClient {
    fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ChatMessage> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            tools,
            tool_choice: "auto",
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().map_err(|e| {
            let error_kind = if e.is_timeout() {
                "timeout"
            } else if e.is_connect() {
                "connect"
            } else {
                "request"
            };
            tracing::error!(
                provider = self.kind.as_str(),
                model = %self.model,
                error = %e,
                error_kind,
                "Chat request failed"
            );
            Error::Transport {
                operation: "chat_request".to_string(),
                cause: format!("{error_kind} error: {e}"),
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            tracing::error!(
                provider = self.kind.as_str(),
                model = %self.model,
                status = %status,
                "Chat API returned error status"
            );
            return Err(Error::Transport {
                operation: "chat_request".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let response: ChatCompletionResponse = response.json().map_err(|e| Error::Transport {
            operation: "chat_response".to_string(),
            cause: e.to_string(),
        })?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| Error::Transport {
                operation: "chat_response".to_string(),
                cause: "No choices in response".to_string(),
            })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: &'a [Value],
    tool_choice: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}
