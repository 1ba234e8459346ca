//! Provider abstraction over interchangeable text-generation backends
//!
//! The backend set is closed: [`ProviderKind`] names every variant and a
//! [`Provider`] is built once from configuration. There is no failover; a
//! pipeline talks to the same backend for its whole lifetime so that the
//! steps of one multi-step instruction never come from different models.

use crate::core::config::{Credentials, ProviderSettings};
use crate::core::error::{ConfigError, ProviderError};
use crate::core::types::CompletionResult;
use crate::llm::client::{AnthropicClient, GoogleClient, OpenAiClient};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// System instruction sent alongside every prompt
pub const SYSTEM_INSTRUCTION: &str = "You convert natural language robotics instructions into CLI commands. Reply with commands only, one per line.";

/// Fixed pause before the single retry of a transient failure
pub const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Supported generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Google,
}

impl ProviderKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
        }
    }

    pub const fn all() -> &'static [ProviderKind] {
        &[
            ProviderKind::OpenAi,
            ProviderKind::Anthropic,
            ProviderKind::Google,
        ]
    }

    pub const fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Anthropic => "claude-3-5-sonnet-20241022",
            ProviderKind::Google => "gemini-pro",
        }
    }

    /// Environment variable holding this backend's API key
    pub const fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Google => "GOOGLE_API_KEY",
        }
    }

    pub const fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Google => "https://generativelanguage.googleapis.com",
        }
    }

    /// Guess the backend from a bare model name (`gpt-4o`, `claude-3-opus`)
    pub fn infer_from_model(model: &str) -> Option<ProviderKind> {
        let model = model.to_ascii_lowercase();
        if model.contains("gpt") || model.starts_with("o1") {
            Some(ProviderKind::OpenAi)
        } else if model.contains("claude") {
            Some(ProviderKind::Anthropic)
        } else if model.contains("gemini") {
            Some(ProviderKind::Google)
        } else {
            None
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "gpt" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "google" | "gemini" => Ok(ProviderKind::Google),
            _ => Err(format!("unknown provider: {}", s)),
        }
    }
}

impl serde::Serialize for ProviderKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for ProviderKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ProviderKind::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a model override string in `<provider>/<model>` format.
/// Returns (provider_override, model_name) where provider_override is None if not specified.
pub fn parse_model_override(value: &str) -> (Option<ProviderKind>, String) {
    let trimmed = value.trim();
    if let Some((provider_str, model)) = trimmed.split_once('/') {
        if let Ok(provider) = ProviderKind::from_str(provider_str) {
            let model = model.trim().to_string();
            if !model.is_empty() {
                return (Some(provider), model);
            }
        }
    }
    (None, trimmed.to_string())
}

/// Uniform knobs every backend maps onto its own request shape
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub retry_backoff: Duration,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 1000,
            timeout: Duration::from_secs(30),
            retry_backoff: RETRY_BACKOFF,
        }
    }
}

impl GenerationParams {
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self {
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: settings.timeout(),
            retry_backoff: RETRY_BACKOFF,
        }
    }
}

/// One outbound completion call against a concrete backend
#[allow(async_fn_in_trait)]
pub trait CompletionBackend: Send + Sync {
    fn kind(&self) -> ProviderKind;
    fn model(&self) -> &str;
    async fn complete(&self, prompt: &str, params: &GenerationParams)
        -> Result<String, ProviderError>;
}

/// The active backend of a pipeline
pub enum Provider {
    OpenAi(OpenAiClient),
    Anthropic(AnthropicClient),
    Google(GoogleClient),
}

impl Provider {
    pub fn new(
        kind: ProviderKind,
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: Option<String>,
    ) -> Self {
        let base_url = base_url.unwrap_or_else(|| kind.default_base_url().to_string());
        match kind {
            ProviderKind::OpenAi => Provider::OpenAi(OpenAiClient::new(api_key, base_url, model)),
            ProviderKind::Anthropic => {
                Provider::Anthropic(AnthropicClient::new(api_key, base_url, model))
            }
            ProviderKind::Google => Provider::Google(GoogleClient::new(api_key, base_url, model)),
        }
    }

    /// Resolve the configured backend; fails before any network traffic
    pub fn from_settings(
        settings: &ProviderSettings,
        credentials: &Credentials,
    ) -> Result<Self, ConfigError> {
        let (kind, model) = settings.resolve()?;
        let api_key = credentials
            .get(kind)
            .ok_or(ConfigError::MissingCredential {
                provider: kind.to_string(),
                env_var: kind.api_key_env(),
            })?;
        Ok(Self::new(kind, model, api_key, settings.base_url.clone()))
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::OpenAi(c) => c.kind(),
            Provider::Anthropic(c) => c.kind(),
            Provider::Google(c) => c.kind(),
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAi(c) => c.model(),
            Provider::Anthropic(c) => c.model(),
            Provider::Google(c) => c.model(),
        }
    }

    async fn attempt(&self, prompt: &str, params: &GenerationParams) -> Result<String, ProviderError> {
        let call = async {
            match self {
                Provider::OpenAi(c) => c.complete(prompt, params).await,
                Provider::Anthropic(c) => c.complete(prompt, params).await,
                Provider::Google(c) => c.complete(prompt, params).await,
            }
        };
        match tokio::time::timeout(params.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(params.timeout)),
        }
    }

    /// Run one generation, retrying a transient failure exactly once
    pub async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<CompletionResult, ProviderError> {
        let start = Instant::now();
        let text = match self.attempt(prompt, params).await {
            Ok(text) => text,
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    provider = %self.kind(),
                    "Transient provider failure ({}), retrying once in {:?}",
                    e,
                    params.retry_backoff
                );
                tokio::time::sleep(params.retry_backoff).await;
                self.attempt(prompt, params).await?
            }
            Err(e) => return Err(e),
        };

        if text.trim().is_empty() {
            return Err(ProviderError::MalformedResponse("empty completion".into()));
        }

        let latency = start.elapsed();
        tracing::debug!(provider = %self.kind(), "Completion received in {:?}", latency);
        Ok(CompletionResult {
            text,
            provider: self.kind(),
            model: self.model().to_string(),
            latency,
        })
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("kind", &self.kind())
            .field("model", &self.model())
            .finish()
    }
}
