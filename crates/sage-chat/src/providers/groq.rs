//! Completion client for Groq's OpenAI-compatible endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sage_core::config::LlmConfig;

use crate::capability::{CompletionProvider, CompletionService};
use crate::error::ChatError;

const SERVICE: &str = "completion";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Build the shared HTTP client used by every bound session.
fn build_http(config: &LlmConfig) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Normalize a base URL by stripping trailing slashes.
fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Chat-completions client bound to one API key.
#[derive(Clone)]
pub struct GroqClient {
    http: Client,
    base_url: String,
    model: String,
    temperature: f32,
    api_key: String,
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl GroqClient {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Self {
        Self::with_http(build_http(config), config, api_key)
    }

    fn with_http(http: Client, config: &LlmConfig, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: normalize_base_url(&config.base_url),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key: api_key.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        }
    }
}

/// Pull the first choice's text out of a successful response body.
fn parse_completion(body: &str) -> Result<String, ChatError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ChatError::external(SERVICE, format!("malformed response: {}", e)))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ChatError::external(SERVICE, "response contained no completion"))
}

/// Turn a non-2xx response into an error, preferring the API's own message.
fn status_error(status: reqwest::StatusCode, body: &str) -> ChatError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    ChatError::external(SERVICE, format!("API error {}: {}", status, detail))
}

#[async_trait]
impl CompletionService for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String, ChatError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "Sending completion request");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| ChatError::external(SERVICE, format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::external(SERVICE, format!("reading response: {}", e)))?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        parse_completion(&body)
    }
}

/// Hands out [`GroqClient`]s that share one connection pool.
pub struct GroqProvider {
    config: LlmConfig,
    http: Client,
}

impl GroqProvider {
    pub fn new(config: LlmConfig) -> Self {
        let http = build_http(&config);
        Self { config, http }
    }
}

impl CompletionProvider for GroqProvider {
    fn bind(&self, api_key: &str) -> Result<Arc<dyn CompletionService>, ChatError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ChatError::MissingApiKey);
        }
        Ok(Arc::new(GroqClient::with_http(
            self.http.clone(),
            &self.config,
            api_key,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        LlmConfig::default()
    }

    #[test]
    fn test_client_creation() {
        let client = GroqClient::new(&config(), "gsk_test");
        assert_eq!(client.model(), "llama-3.1-8b-instant");
        assert_eq!(
            client.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let mut cfg = config();
        cfg.base_url = "http://localhost:8000/v1//".to_string();
        let client = GroqClient::new(&cfg, "k");
        assert_eq!(client.endpoint(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = GroqClient::new(&config(), "gsk_super_secret");
        let dbg = format!("{:?}", client);
        assert!(dbg.contains("llama-3.1-8b-instant"));
        assert!(!dbg.contains("gsk_super_secret"));
    }

    #[test]
    fn test_request_body_shape() {
        let client = GroqClient::new(&config(), "k");
        let body = serde_json::to_value(client.request_body("Question: 2+2")).unwrap();
        assert_eq!(body["model"], "llama-3.1-8b-instant");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Question: 2+2");
        assert!(body["temperature"].is_number());
    }

    #[test]
    fn test_parse_completion_ok() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"42"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "42");
    }

    #[test]
    fn test_parse_completion_no_choices() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, ChatError::ExternalService { .. }));
        assert!(err.to_string().contains("no completion"));
    }

    #[test]
    fn test_parse_completion_null_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(parse_completion(body).is_err());
    }

    #[test]
    fn test_parse_completion_malformed() {
        let err = parse_completion("<html>502</html>").unwrap_err();
        assert!(err.to_string().contains("malformed response"));
    }

    #[test]
    fn test_status_error_uses_api_message() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        let err = status_error(reqwest::StatusCode::UNAUTHORIZED, body);
        let msg = err.to_string();
        assert!(msg.starts_with("completion error: API error 401"));
        assert!(msg.contains("Invalid API Key"));
    }

    #[test]
    fn test_status_error_falls_back_to_raw_body() {
        let err = status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down\n");
        assert!(err.to_string().ends_with("slow down"));
    }

    #[test]
    fn test_provider_rejects_blank_key() {
        let provider = GroqProvider::new(config());
        assert!(matches!(provider.bind(""), Err(ChatError::MissingApiKey)));
        assert!(matches!(provider.bind("   "), Err(ChatError::MissingApiKey)));
        assert!(provider.bind("gsk_live").is_ok());
    }
}
