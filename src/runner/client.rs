//! @ai:module:intent Hosted model client for workflow generation (Bedrock Converse API)
//! @ai:module:layer infrastructure
//! @ai:module:public_api InferenceClientTrait, BedrockClient, MockInferenceClient, Completion
//! @ai:module:stateless false

use crate::config::ApiConfig;
use crate::error::{EvalError, Result};
use crate::runner::rate_limiter::{RateLimiter, RateLimiterTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the Bedrock API key
pub const API_KEY_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

const PROBE_PROMPT: &str = "Say OK";
const PROBE_MAX_TOKENS: u32 = 10;

/// @ai:intent Trait for hosted model clients
#[allow(async_fn_in_trait)]
pub trait InferenceClientTrait: Send + Sync {
    /// @ai:intent Send a prompt to a model and get its completion
    async fn generate(&self, prompt: &str, model_id: &str) -> Result<Completion>;

    /// @ai:intent Send a tiny prompt once, without retry, to test model access
    async fn probe(&self, model_id: &str) -> Result<Completion>;
}

/// @ai:intent Text and token usage of one model call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub stop_reason: String,
}

/// @ai:intent Converse API request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseRequest<'a> {
    messages: Vec<Message<'a>>,
    inference_config: InferenceConfig,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<TextBlock<'a>>,
}

#[derive(Debug, Serialize)]
struct TextBlock<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig {
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

/// @ai:intent Converse API response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    output: Output,
    #[serde(default)]
    usage: Usage,
    #[serde(default)]
    stop_reason: String,
}

#[derive(Debug, Deserialize)]
struct Output {
    message: OutputMessage,
}

#[derive(Debug, Deserialize)]
struct OutputMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// @ai:intent Bedrock runtime client with rate limiting and bounded retry
pub struct BedrockClient {
    client: reqwest::Client,
    config: ApiConfig,
    rate_limiter: Arc<RateLimiter>,
    api_key: String,
    endpoint: String,
    retry_base_delay: Duration,
}

impl BedrockClient {
    /// @ai:intent Create a new Bedrock client
    /// @ai:pre api_key is a valid Bedrock API key
    /// @ai:effects pure
    pub fn new(config: ApiConfig, api_key: String) -> Result<Self> {
        let rate_limiter = Arc::new(RateLimiter::new(config.requests_per_minute));
        Self::with_rate_limiter(config, api_key, rate_limiter)
    }

    /// @ai:intent Create a client reading the API key from the environment
    /// @ai:effects env
    pub fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let api_key = std::env::var(API_KEY_ENV)
            .with_context(|| format!("{} not set in environment", API_KEY_ENV))?;
        Ok(Self::new(config, api_key)?)
    }

    /// @ai:intent Create a client with a shared rate limiter
    /// @ai:effects pure
    pub fn with_rate_limiter(
        config: ApiConfig,
        api_key: String,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", config.region))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            config,
            rate_limiter,
            api_key,
            endpoint,
            retry_base_delay: Duration::from_secs(1),
        })
    }

    /// @ai:intent Override the first backoff delay (doubles on each retry)
    /// @ai:effects pure
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// @ai:intent Converse endpoint URL for a model
    /// @ai:effects pure
    fn converse_url(&self, model_id: &str) -> String {
        let encoded = model_id.replace(':', "%3A").replace('/', "%2F");
        format!("{}/model/{}/converse", self.endpoint, encoded)
    }

    /// @ai:intent Perform a single Converse call
    /// @ai:effects network
    async fn converse_once(&self, prompt: &str, model_id: &str, max_tokens: u32) -> Result<Completion> {
        self.rate_limiter.wait().await;

        let request = ConverseRequest {
            messages: vec![Message {
                role: "user",
                content: vec![TextBlock { text: prompt }],
            }],
            inference_config: InferenceConfig {
                max_tokens,
                temperature: self.config.temperature,
                top_p: self.config.top_p,
            },
        };

        let response = self
            .client
            .post(self.converse_url(model_id))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvalError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let api_response: ConverseResponse = response.json().await?;

        let text = api_response
            .output
            .message
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Completion {
            text,
            input_tokens: api_response.usage.input_tokens,
            output_tokens: api_response.usage.output_tokens,
            stop_reason: api_response.stop_reason,
        })
    }
}

impl InferenceClientTrait for BedrockClient {
    /// @ai:intent Call the model, retrying throttling, server and transport errors with backoff
    /// @ai:effects network, time
    async fn generate(&self, prompt: &str, model_id: &str) -> Result<Completion> {
        let mut attempt = 0;

        loop {
            match self.converse_once(prompt, model_id, self.config.max_tokens).await {
                Ok(completion) => return Ok(completion),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.retry_base_delay * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "{} failed ({}), retry {}/{} in {:?}",
                        model_id,
                        e,
                        attempt,
                        self.config.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// @ai:intent Single small call used by the access check
    /// @ai:effects network
    async fn probe(&self, model_id: &str) -> Result<Completion> {
        self.converse_once(PROBE_PROMPT, model_id, PROBE_MAX_TOKENS).await
    }
}

/// @ai:intent Mock client for dry runs and tests
pub struct MockInferenceClient {
    response: std::result::Result<Completion, (u16, String)>,
}

impl MockInferenceClient {
    /// @ai:intent Create a mock client that returns a fixed response
    /// @ai:effects pure
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Ok(Completion {
                text: response.into(),
                input_tokens: 5000,
                output_tokens: 3000,
                stop_reason: "end_turn".to_string(),
            }),
        }
    }

    /// @ai:intent Create a mock client whose every call fails with an API error
    /// @ai:effects pure
    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self {
            response: Err((status, body.into())),
        }
    }

    fn respond(&self) -> Result<Completion> {
        match &self.response {
            Ok(completion) => Ok(completion.clone()),
            Err((status, body)) => Err(EvalError::Api {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

impl InferenceClientTrait for MockInferenceClient {
    /// @ai:effects pure
    async fn generate(&self, _prompt: &str, _model_id: &str) -> Result<Completion> {
        self.respond()
    }

    /// @ai:effects pure
    async fn probe(&self, _model_id: &str) -> Result<Completion> {
        self.respond()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn test_config(endpoint: &str, max_retries: u32) -> ApiConfig {
        ApiConfig {
            endpoint: Some(endpoint.to_string()),
            requests_per_minute: 600,
            max_retries,
            ..Default::default()
        }
    }

    fn test_client(endpoint: &str, max_retries: u32) -> BedrockClient {
        BedrockClient::new(test_config(endpoint, max_retries), "test-key".to_string())
            .unwrap()
            .with_retry_delay(Duration::from_millis(1))
    }

    fn converse_body(text: &str) -> String {
        json!({
            "output": { "message": { "role": "assistant", "content": [{ "text": text }] } },
            "usage": { "inputTokens": 1200, "outputTokens": 800, "totalTokens": 2000 },
            "stopReason": "end_turn"
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_mock_client() {
        let client = MockInferenceClient::new("{\"steps\": []}");
        let completion = client.generate("prompt", "any-model").await.unwrap();
        assert!(completion.text.contains("steps"));
    }

    #[tokio::test]
    async fn test_converse_request_and_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/model/test-model/converse")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({
                "messages": [{ "role": "user", "content": [{ "text": "hello" }] }],
                "inferenceConfig": { "maxTokens": 8192 }
            })))
            .with_status(200)
            .with_body(converse_body("{\"steps\": []}"))
            .create_async()
            .await;

        let client = test_client(&server.url(), 0);
        let completion = client.generate("hello", "test-model").await.unwrap();

        mock.assert_async().await;
        assert_eq!(completion.text, "{\"steps\": []}");
        assert_eq!(completion.input_tokens, 1200);
        assert_eq!(completion.output_tokens, 800);
        assert_eq!(completion.stop_reason, "end_turn");
    }

    #[tokio::test]
    async fn test_throttling_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let throttled = server
            .mock("POST", "/model/test-model/converse")
            .with_status(429)
            .with_body("{\"message\": \"Too many requests\"}")
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server.url(), 2);
        let result = client.generate("hello", "test-model").await;

        throttled.assert_async().await;
        assert!(matches!(result, Err(EvalError::Api { status: 429, .. })));
    }

    #[tokio::test]
    async fn test_access_denied_fails_fast() {
        let mut server = mockito::Server::new_async().await;
        let denied = server
            .mock("POST", "/model/test-model/converse")
            .with_status(403)
            .with_body("{\"message\": \"AccessDeniedException\"}")
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url(), 3);
        let result = client.generate("hello", "test-model").await;

        denied.assert_async().await;
        assert!(matches!(result, Err(EvalError::Api { status: 403, .. })));
    }

    #[test]
    fn test_default_endpoint_and_model_encoding() {
        let config = ApiConfig {
            region: "eu-west-1".to_string(),
            ..Default::default()
        };
        let client = BedrockClient::new(config, "key".to_string()).unwrap();

        assert_eq!(
            client.converse_url("amazon.nova-pro-v1:0"),
            "https://bedrock-runtime.eu-west-1.amazonaws.com/model/amazon.nova-pro-v1%3A0/converse"
        );
    }
}
