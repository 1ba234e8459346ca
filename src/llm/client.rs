//! HTTP clients for the supported generation backends
//!
//! Each client owns a reqwest [`Client`] and knows only its own wire format.
//! Status codes, transport failures and undecodable bodies are folded into
//! [`ProviderError`] kinds here; retry and deadline policy live in
//! [`crate::llm::provider::Provider`].

use crate::core::error::ProviderError;
use crate::llm::provider::{CompletionBackend, GenerationParams, ProviderKind, SYSTEM_INSTRUCTION};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Send a prepared request and decode a success body
async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    params: &GenerationParams,
) -> Result<T, ProviderError> {
    let response = request
        .timeout(params.timeout)
        .header("content-type", "application/json")
        .send()
        .await
        .map_err(|e| transport_error(e, params))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(status.as_u16(), body));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
}

fn transport_error(e: reqwest::Error, params: &GenerationParams) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(params.timeout)
    } else {
        ProviderError::Network(e.to_string())
    }
}

fn non_empty(text: Option<String>) -> Result<String, ProviderError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ProviderError::MalformedResponse("Empty response".into())),
    }
}

/// OpenAI chat completions
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }
}

impl CompletionBackend for OpenAiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: SYSTEM_INSTRUCTION.into(),
                },
                Message {
                    role: "user".into(),
                    content: prompt.into(),
                },
            ],
        };

        let builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request);

        let completion: OpenAIResponse = send_json(builder, params).await?;
        non_empty(
            completion
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content),
        )
    }
}

/// Anthropic messages API
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }
}

impl CompletionBackend for AnthropicClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            system: SYSTEM_INSTRUCTION.into(),
            messages: vec![Message {
                role: "user".into(),
                content: prompt.into(),
            }],
        };

        let builder = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request);

        let completion: AnthropicResponse = send_json(builder, params).await?;
        non_empty(
            completion
                .content
                .into_iter()
                .find_map(|block| block.text),
        )
    }
}

/// Google generative language API
pub struct GoogleClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GoogleClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }
}

impl CompletionBackend for GoogleClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        // Gemini has no separate system slot on the v1beta text models
        let request = GoogleRequest {
            contents: vec![GoogleContent {
                role: "user".into(),
                parts: vec![GooglePart {
                    text: Some(format!("{}\n\n{}", SYSTEM_INSTRUCTION, prompt)),
                }],
            }],
            generation_config: GoogleGenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
            },
        };

        let builder = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&request);

        let completion: GoogleResponse = send_json(builder, params).await?;
        let text = completion
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            });
        non_empty(text)
    }
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

// OpenAI API format
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// Google API format
#[derive(Serialize)]
struct GoogleRequest {
    contents: Vec<GoogleContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GoogleGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GoogleContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Serialize, Deserialize)]
struct GooglePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
struct GoogleGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    #[serde(default)]
    content: Option<GoogleContent>,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ProviderErrorKind;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;
    use std::time::Duration;

    fn params() -> GenerationParams {
        GenerationParams {
            timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_openai_request_shape() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .body_contains("\"model\":\"gpt-4o\"")
                .body_contains("launch gazebo");
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "robo sim launch gazebo"}}]
            }));
        });

        let client = OpenAiClient::new("test-key", server.base_url(), "gpt-4o");
        let text = client.complete("launch gazebo", &params()).await.unwrap();

        mock.assert();
        assert_eq!(text, "robo sim launch gazebo");
    }

    #[tokio::test]
    async fn test_anthropic_request_shape() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("x-api-key", "test-key")
                .header("anthropic-version", ANTHROPIC_VERSION)
                .body_contains("\"system\"");
            then.status(200).json_body(json!({
                "content": [{"type": "text", "text": "robo echo /scan"}]
            }));
        });

        let client = AnthropicClient::new("test-key", server.base_url(), "claude-3-5-sonnet-20241022");
        let text = client.complete("echo scan", &params()).await.unwrap();

        mock.assert();
        assert_eq!(text, "robo echo /scan");
    }

    #[tokio::test]
    async fn test_google_request_shape() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-pro:generateContent")
                .query_param("key", "test-key")
                .body_contains("maxOutputTokens");
            then.status(200).json_body(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "robo nav goal --x 1 --y 2"}]}}]
            }));
        });

        let client = GoogleClient::new("test-key", server.base_url(), "gemini-pro");
        let text = client.complete("go to 1 2", &params()).await.unwrap();

        mock.assert();
        assert_eq!(text, "robo nav goal --x 1 --y 2");
    }

    #[tokio::test]
    async fn test_status_codes_map_to_kinds() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401).body("invalid api key");
        });

        let client = OpenAiClient::new("bad", server.base_url(), "gpt-4o");
        let err = client.complete("hi", &params()).await.unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::Authentication);

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(429).body("slow down");
        });
        let client = AnthropicClient::new("k", server.base_url(), "claude-3-5-sonnet-20241022");
        let err = client.complete("hi", &params()).await.unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).body("not json");
        });

        let client = OpenAiClient::new("k", server.base_url(), "gpt-4o");
        let err = client.complete("hi", &params()).await.unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({ "choices": [] }));
        });

        let client = OpenAiClient::new("k", server.base_url(), "gpt-4o");
        let err = client.complete("hi", &params()).await.unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) is not listening on loopback in test environments
        let client = OpenAiClient::new("k", "http://127.0.0.1:9", "gpt-4o");
        let err = client.complete("hi", &params()).await.unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::Network);
    }
}
