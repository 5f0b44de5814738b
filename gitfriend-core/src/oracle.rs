//! Groq chat-completion client — the oracle behind every generated reply.
//!
//! Groq exposes an OpenAI-compatible `/chat/completions` endpoint. The client
//! owns its `reqwest::Client` with a construction-time timeout, retries
//! transient failures with exponential backoff and jitter, and takes a custom
//! base URL so tests can point it at a local mock server.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

use crate::config::OracleConfig;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

// ============================================================================
// Prompt types
// ============================================================================

/// Role of one prompt turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleRole {
    System,
    User,
    Assistant,
}

/// One turn of a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct OracleMessage {
    pub role: OracleRole,
    pub content: String,
}

impl OracleMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: OracleRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: OracleRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: OracleRole::Assistant,
            content: content.into(),
        }
    }
}

/// Stored chat turns map directly onto prompt turns; timestamps and metadata
/// are not part of the wire format.
impl From<&crate::models::Message> for OracleMessage {
    fn from(message: &crate::models::Message) -> Self {
        let role = match message.role {
            crate::models::MessageRole::User => OracleRole::User,
            crate::models::MessageRole::Assistant => OracleRole::Assistant,
        };
        Self {
            role,
            content: message.content.clone(),
        }
    }
}

// ============================================================================
// Error types
// ============================================================================

/// Completion errors
#[derive(Error, Debug)]
pub enum GroqError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Completion contained no content")]
    EmptyCompletion,

    #[error("All {attempts} retry attempts failed")]
    RetryExhausted { attempts: usize },
}

// ============================================================================
// Config types
// ============================================================================

/// Groq client configuration
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub timeout: Duration,
}

impl GroqConfig {
    /// Build a client config from the `[oracle]` file section. The API key
    /// comes from the argument or the `GROQ_API_KEY` environment variable.
    pub fn new(api_key: Option<String>, config: &OracleConfig) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
            .unwrap_or_default();

        Self {
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

// ============================================================================
// Groq API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [OracleMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: Option<GroqErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GroqErrorDetail {
    message: String,
}

// ============================================================================
// GroqClient
// ============================================================================

/// Groq chat-completion client.
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: Client,
    config: GroqConfig,
    base_url: String,
}

impl GroqClient {
    pub fn new(config: GroqConfig) -> Result<Self, GroqError> {
        Self::with_base_url(config, GROQ_BASE_URL.to_string())
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(config: GroqConfig, base_url: String) -> Result<Self, GroqError> {
        if config.api_key.is_empty() {
            return Err(GroqError::MissingApiKey);
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Build a client straight from the `[oracle]` file section, taking the
    /// API key from the environment.
    pub fn from_config(config: &OracleConfig) -> Result<Self, GroqError> {
        Self::new(GroqConfig::new(None, config))
    }

    /// Run a chat completion over the full turn list and return the
    /// assistant's text. Failed attempts are retried with backoff.
    pub async fn complete(&self, messages: &[OracleMessage]) -> Result<String, GroqError> {
        let retry_strategy = ExponentialBackoff::from_millis(self.config.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        let result = Retry::spawn(retry_strategy, || self.complete_once(messages)).await;

        match result {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::error!(
                    attempts = self.config.max_retries,
                    error = %e,
                    "All completion retry attempts failed"
                );
                Err(GroqError::RetryExhausted {
                    attempts: self.config.max_retries,
                })
            }
        }
    }

    /// Single-prompt convenience used by the insight pipeline.
    pub async fn generate(&self, prompt: &str) -> Result<String, GroqError> {
        self.complete(&[OracleMessage::user(prompt)]).await
    }

    async fn complete_once(&self, messages: &[OracleMessage]) -> Result<String, GroqError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GroqErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);

            tracing::error!(code = status.as_u16(), message = %message, "Groq API error");

            return Err(GroqError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(GroqError::EmptyCompletion)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_key: &str) -> GroqConfig {
        GroqConfig {
            api_key: api_key.to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.5,
            max_tokens: 512,
            max_retries: 3,
            retry_delay_ms: 100,
            timeout: Duration::from_secs(5),
        }
    }

    fn mock_completion_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": text } }
            ]
        })
    }

    #[tokio::test]
    async fn test_complete_posts_transcript_and_returns_text() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let client =
            GroqClient::with_base_url(config, mock_server.uri()).expect("Failed to create client");

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.3-70b-versatile",
                "messages": [
                    { "role": "system", "content": "You answer briefly." },
                    { "role": "user", "content": "undo last commit?" }
                ],
                "max_tokens": 512
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(mock_completion_response("git reset --soft HEAD~1")),
            )
            .mount(&mock_server)
            .await;

        let messages = vec![
            OracleMessage::system("You answer briefly."),
            OracleMessage::user("undo last commit?"),
        ];
        let result = client.complete(&messages).await;

        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result.err());
        assert_eq!(result.unwrap(), "git reset --soft HEAD~1");
    }

    #[tokio::test]
    async fn test_generate_wraps_prompt_in_single_user_turn() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let client =
            GroqClient::with_base_url(config, mock_server.uri()).expect("Failed to create client");

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    { "role": "user", "content": "analyze this" }
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(mock_completion_response("done")),
            )
            .mount(&mock_server)
            .await;

        let result = client.generate("analyze this").await;

        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result.err());
        assert_eq!(result.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_complete_returns_error_on_api_500() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let client =
            GroqClient::with_base_url(config, mock_server.uri()).expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "message": "Internal server error" }
            })))
            .mount(&mock_server)
            .await;

        let result = client.generate("hello").await;

        assert!(result.is_err(), "Expected error on 500 response");
        match result {
            Err(GroqError::RetryExhausted { attempts }) => {
                assert_eq!(attempts, 3, "Expected 3 retry attempts");
            }
            _ => panic!("Expected RetryExhausted error"),
        }
    }

    #[tokio::test]
    async fn test_complete_retries_on_429_then_succeeds() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let client =
            GroqClient::with_base_url(config, mock_server.uri()).expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit exceeded" }
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(mock_completion_response("recovered")),
            )
            .mount(&mock_server)
            .await;

        let result = client.generate("hello").await;

        assert!(result.is_ok(), "Expected success after retry");
        assert_eq!(result.unwrap(), "recovered");
    }

    #[tokio::test]
    async fn test_client_fails_with_missing_api_key() {
        let config = test_config("");
        let result = GroqClient::new(config);

        assert!(result.is_err(), "Expected error with missing API key");
        match result {
            Err(GroqError::MissingApiKey) => {}
            _ => panic!("Expected MissingApiKey error"),
        }
    }

    #[tokio::test]
    async fn test_empty_completion_is_an_error() {
        let mock_server = MockServer::start().await;
        let mut config = test_config("test-api-key");
        config.max_retries = 1;
        config.retry_delay_ms = 10;
        let client =
            GroqClient::with_base_url(config, mock_server.uri()).expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(mock_completion_response("   ")),
            )
            .mount(&mock_server)
            .await;

        let result = client.generate("hello").await;

        assert!(result.is_err(), "Blank completion must not be returned");
        match result {
            Err(GroqError::RetryExhausted { .. }) | Err(GroqError::EmptyCompletion) => {}
            other => panic!("Expected EmptyCompletion or RetryExhausted, got {:?}", other),
        }
    }
}
