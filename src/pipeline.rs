//! Natural language to command translation pipeline
//!
//! text -> normalize -> extract -> prompt -> provider -> parse -> validate -> score
//!
//! A [`Pipeline`] is built once from configuration and owns its provider
//! client and allow-list snapshot for its whole lifetime. It never runs a
//! command; validated candidates go back to the caller.

use crate::command::registry::CommandRegistry;
use crate::command::scorer::{ConfidenceScorer, ScoreBreakdown};
use crate::core::config::{Credentials, Settings};
use crate::core::error::{ConfigError, ProviderError};
use crate::core::types::{CommandCandidate, CompletionResult, EntitySet, Intent, Query};
use crate::llm::context::{build_prompt, template, PromptTemplate};
use crate::llm::parser::parse_completion;
use crate::llm::provider::{GenerationParams, Provider, ProviderKind};
use crate::nlp::analyze;
use crate::safety::{ContextPolicy, SafetyValidator};
use serde::Serialize;
use std::fmt;

/// Provider details of the completion a translation came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionMeta {
    pub provider: ProviderKind,
    pub model: String,
    pub latency_ms: u64,
}

impl From<&CompletionResult> for CompletionMeta {
    fn from(result: &CompletionResult) -> Self {
        Self {
            provider: result.provider,
            model: result.model.clone(),
            latency_ms: result.latency.as_millis() as u64,
        }
    }
}

/// Everything the pipeline produced for one query
#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    pub query: Query,
    pub intent: Intent,
    pub entities: EntitySet,
    pub candidates: Vec<CommandCandidate>,
    pub scores: Vec<ScoreBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionMeta>,
}

impl Translation {
    fn empty(query: Query) -> Self {
        Self {
            query,
            intent: Intent::Unknown,
            entities: EntitySet::new(),
            candidates: Vec::new(),
            scores: Vec::new(),
            completion: None,
        }
    }

    /// Validated candidates in generation order
    pub fn executable(&self) -> impl Iterator<Item = &CommandCandidate> {
        self.candidates.iter().filter(|c| c.is_validated())
    }
}

/// Engine and policy summary for status reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineInfo {
    pub engine: ProviderKind,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub safety_enabled: bool,
    pub context_policy: ContextPolicy,
    pub template_version: &'static str,
    pub allow_list: Vec<String>,
    pub available_engines: Vec<ProviderKind>,
}

impl fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let available: Vec<&str> = self.available_engines.iter().map(|k| k.as_str()).collect();
        writeln!(f, "Engine:         {} ({})", self.engine, self.model)?;
        writeln!(f, "Temperature:    {}", self.temperature)?;
        writeln!(f, "Max tokens:     {}", self.max_tokens)?;
        writeln!(f, "Timeout:        {}s", self.timeout_secs)?;
        writeln!(
            f,
            "Safety checks:  {} (context mismatches: {:?})",
            if self.safety_enabled { "enabled" } else { "hard checks only" },
            self.context_policy
        )?;
        writeln!(f, "Prompt:         {}", self.template_version)?;
        writeln!(f, "Namespaces:     {}", self.allow_list.join(", "))?;
        write!(
            f,
            "Keys present:   {}",
            if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            }
        )
    }
}

pub struct Pipeline {
    provider: Provider,
    params: GenerationParams,
    template: &'static PromptTemplate,
    validator: SafetyValidator,
    scorer: ConfidenceScorer,
    context_policy: ContextPolicy,
    available_engines: Vec<ProviderKind>,
}

impl Pipeline {
    /// Build from configuration; every configuration error surfaces here,
    /// before any network traffic
    pub fn new(
        settings: &Settings,
        credentials: &Credentials,
        registry: &dyn CommandRegistry,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let provider = Provider::from_settings(&settings.provider, credentials)?;
        let template = template(&settings.provider.template_version)?;
        let validator = SafetyValidator::new(registry.enumerate_commands(), &settings.safety)?;
        let scorer = ConfidenceScorer::new(settings.scoring.clone(), settings.registry.host.clone());

        tracing::info!(
            provider = %provider.kind(),
            model = provider.model(),
            "Pipeline ready"
        );

        Ok(Self {
            provider,
            params: GenerationParams::from_settings(&settings.provider),
            template,
            validator,
            scorer,
            context_policy: settings.safety.context_policy,
            available_engines: credentials.available(),
        })
    }

    /// Replace the generation parameters (shorter backoff in tests, for one)
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn engine_info(&self) -> EngineInfo {
        EngineInfo {
            engine: self.provider.kind(),
            model: self.provider.model().to_string(),
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
            timeout_secs: self.params.timeout.as_secs(),
            safety_enabled: self.validator.soft_checks_enabled(),
            context_policy: self.context_policy,
            template_version: self.template.version,
            allow_list: self.validator.allow_list().iter().cloned().collect(),
            available_engines: self.available_engines.clone(),
        }
    }

    /// Render the prompt a query would be sent with
    pub fn prompt_for(&self, query: &Query, entities: &EntitySet) -> String {
        build_prompt(self.template, entities, query)
    }

    /// Translate one query
    ///
    /// Empty input returns an empty translation without calling the provider.
    /// A provider failure returns the error and no candidates at all.
    pub async fn translate(&self, raw: &str) -> Result<Translation, ProviderError> {
        let query = Query::new(raw);
        if query.is_empty() {
            tracing::debug!("Empty query, skipping generation");
            return Ok(Translation::empty(query));
        }

        let (intent, entities) = analyze(&query);
        tracing::info!(%intent, entities = entities.len(), "Query analyzed");

        let prompt = self.prompt_for(&query, &entities);
        tracing::debug!(template = self.template.version, "Prompt:\n{}", prompt);

        let completion = self.provider.generate(&prompt, &self.params).await?;
        tracing::debug!("Completion:\n{}", completion.text);

        let (candidates, scores) = self.process_completion(intent, &entities, &completion.text);
        tracing::info!(
            candidates = candidates.len(),
            validated = candidates.iter().filter(|c| c.is_validated()).count(),
            latency_ms = completion.latency.as_millis() as u64,
            "Translation complete"
        );

        Ok(Translation {
            completion: Some(CompletionMeta::from(&completion)),
            query,
            intent,
            entities,
            candidates,
            scores,
        })
    }

    /// Parse, validate and score raw completion text
    pub fn process_completion(
        &self,
        intent: Intent,
        entities: &EntitySet,
        completion: &str,
    ) -> (Vec<CommandCandidate>, Vec<ScoreBreakdown>) {
        let mut candidates = parse_completion(completion);
        self.validator.validate_all(&mut candidates, intent, entities);
        let scores = self.scorer.apply(intent, entities, &mut candidates);
        (candidates, scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::registry::StaticRegistry;
    use crate::nlp::extract_entities;

    fn pipeline(settings: &Settings) -> Result<Pipeline, ConfigError> {
        let creds = Credentials::default().with_key(ProviderKind::OpenAi, "test-key");
        Pipeline::new(settings, &creds, &StaticRegistry::builtin("robo"))
    }

    #[test]
    fn test_missing_credential_fails_fast() {
        let err = Pipeline::new(
            &Settings::default(),
            &Credentials::default(),
            &StaticRegistry::builtin("robo"),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }

    #[test]
    fn test_unknown_template_fails_fast() {
        let mut settings = Settings::default();
        settings.provider.template_version = "v0".into();
        assert!(matches!(
            pipeline(&settings).err().unwrap(),
            ConfigError::UnknownTemplate(_)
        ));
    }

    #[test]
    fn test_process_completion_preserves_order() {
        let p = pipeline(&Settings::default()).unwrap();
        let entities = extract_entities("generate a talker node then launch webots");
        let (candidates, scores) = p.process_completion(
            Intent::Launch,
            &entities,
            "```\nrobo gen node talker\nrm -rf ~/ws\nrobo sim launch webots\n```",
        );
        let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["robo gen node talker", "rm -rf ~/ws", "robo sim launch webots"]
        );
        assert!(candidates[0].is_validated());
        assert!(!candidates[1].is_validated());
        assert!(candidates[2].is_validated());
        assert_eq!(scores.len(), 3);
        assert!(candidates[1].confidence < candidates[2].confidence);
    }

    #[test]
    fn test_engine_info() {
        let p = pipeline(&Settings::default()).unwrap();
        let info = p.engine_info();
        assert_eq!(info.engine, ProviderKind::OpenAi);
        assert_eq!(info.model, "gpt-4o");
        assert_eq!(info.template_version, "v2");
        assert_eq!(info.available_engines, vec![ProviderKind::OpenAi]);
        assert!(info.allow_list.contains(&"robo sim".to_string()));
        assert!(info.to_string().contains("Engine:         openai (gpt-4o)"));
    }

    #[tokio::test]
    async fn test_empty_query_needs_no_provider() {
        // Unreachable base URL: any provider call would fail
        let mut settings = Settings::default();
        settings.provider.base_url = Some("http://127.0.0.1:9".into());
        let p = pipeline(&settings).unwrap();

        let t = p.translate("   \t ").await.unwrap();
        assert!(t.candidates.is_empty());
        assert_eq!(t.intent, Intent::Unknown);
        assert!(t.completion.is_none());
    }
}
