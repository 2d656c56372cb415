//! Chat-completion client.
//!
//! [`ChatCompletion`] is the seam the generators and the conflict resolver
//! depend on. [`LlmClient`] implements it against an OpenAI-compatible
//! `POST {api_base}/chat/completions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::LlmConfig;
use crate::errors::LlmError;

const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    /// Model identifier; the client's default when `None`.
    pub model: Option<String>,
    /// Reply token cap; the client's default when `None`.
    pub max_tokens: Option<u32>,
    /// Optional system message sent ahead of the prompt.
    pub system: Option<String>,
}

impl CompletionOptions {
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Something that turns a prompt into free-form reply text.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, prompt: &str, options: &CompletionOptions)
        -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
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
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP chat-completion client with timeout and retry.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    api_key_env: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout_secs: u64,
    max_retries: u32,
    base_delay: Duration,
}

impl LlmClient {
    /// Build a client from resolved configuration. A missing key is only
    /// reported when a completion is attempted.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("gitscribe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let endpoint = format!(
            "{}/chat/completions",
            config.api_base.trim_end_matches('/')
        );
        debug!(endpoint = %endpoint, model = %config.model, "created LlmClient");

        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key.clone(),
            api_key_env: config.api_key_env.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Override the initial retry delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }

    async fn send_once(&self, api_key: &str, body: &ChatRequest<'_>) -> Result<String, LlmError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(LlmError::Authentication(status.as_u16()));
        }
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| LlmError::MalformedResponse("no choices[0].message.content".into()))
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout_secs)
        } else {
            LlmError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl ChatCompletion for LlmClient {
    #[instrument(skip(self, prompt, options), fields(prompt_len = prompt.len()))]
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::MissingApiKey(self.api_key_env.clone()))?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let body = ChatRequest {
            model: options.model.as_deref().unwrap_or(&self.model),
            messages,
            temperature: self.temperature,
            max_tokens: options.max_tokens.unwrap_or(self.max_tokens),
            stream: false,
        };

        let mut attempt = 0;
        loop {
            match self.send_once(api_key, &body).await {
                Ok(reply) => {
                    debug!(attempt, reply_len = reply.len(), "completion succeeded");
                    return Ok(reply);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    warn!(error = %e, attempt, ?delay, "completion failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config_for(server: &mockito::ServerGuard, max_retries: u32) -> LlmConfig {
        LlmConfig {
            api_base: format!("{}/openai/v1", server.url()),
            api_key: Some("test-key".into()),
            max_retries,
            ..LlmConfig::default()
        }
    }

    fn client_for(server: &mockito::ServerGuard, max_retries: u32) -> LlmClient {
        LlmClient::new(&config_for(server, max_retries))
            .unwrap()
            .with_base_delay(Duration::from_millis(1))
    }

    const OK_BODY: &str = r#"{"choices":[{"message":{"role":"assistant","content":"feat: add thing"}}]}"#;

    #[tokio::test]
    async fn test_complete_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "llama-3.3-70b-versatile",
                "messages": [{"role": "user", "content": "hello"}],
                "max_tokens": 512,
                "stream": false
            })))
            .with_status(200)
            .with_body(OK_BODY)
            .create_async()
            .await;

        let client = client_for(&server, 0);
        let reply = client
            .complete("hello", &CompletionOptions::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "feat: add thing");
    }

    #[tokio::test]
    async fn test_options_override_model_and_tokens() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/v1/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "other-model",
                "max_tokens": 4096,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .with_status(200)
            .with_body(OK_BODY)
            .create_async()
            .await;

        let options = CompletionOptions::default()
            .with_model(Some("other-model".into()))
            .with_max_tokens(4096)
            .with_system("be brief");
        client_for(&server, 0)
            .complete("hello", &options)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let config = LlmConfig {
            api_base: "http://127.0.0.1:9".into(),
            ..LlmConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        let result = client.complete("hi", &CompletionOptions::default()).await;
        assert!(matches!(result, Err(LlmError::MissingApiKey(ref v)) if v == "GROQ_API_KEY"));
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/v1/chat/completions")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let result = client_for(&server, 3)
            .complete("hi", &CompletionOptions::default())
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(LlmError::Authentication(401))));
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_budget_exhausted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/v1/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .expect(3)
            .create_async()
            .await;

        let result = client_for(&server, 2)
            .complete("hi", &CompletionOptions::default())
            .await;

        mock.assert_async().await;
        match result {
            Err(LlmError::Api { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/openai/v1/chat/completions")
            .with_status(429)
            .create_async()
            .await;

        let result = client_for(&server, 0)
            .complete("hi", &CompletionOptions::default())
            .await;
        assert!(matches!(result, Err(LlmError::RateLimited)));
    }

    #[tokio::test]
    async fn test_malformed_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/openai/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let result = client_for(&server, 0)
            .complete("hi", &CompletionOptions::default())
            .await;
        assert!(matches!(result, Err(LlmError::MalformedResponse(_))));
    }

    #[test]
    fn test_backoff_is_capped() {
        let client = LlmClient::new(&LlmConfig::default()).unwrap();
        assert_eq!(client.backoff(0), Duration::from_millis(500));
        assert_eq!(client.backoff(1), Duration::from_secs(1));
        assert_eq!(client.backoff(10), MAX_BACKOFF);
    }
}
