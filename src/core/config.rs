//! Runtime configuration with documented defaults
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! `ROBOCMD_*` environment variables, then command-line flags (applied by
//! the binary). Provider credentials are kept apart in [`Credentials`] so
//! they never end up in a serialized settings dump.

use crate::command::scorer::ScoreWeights;
use crate::core::error::ConfigError;
use crate::llm::context::CURRENT_TEMPLATE_VERSION;
use crate::llm::provider::{parse_model_override, ProviderKind};
use crate::safety::ContextPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Name of the config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "robocmd.toml";

/// Top-level settings, one table per concern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: ProviderSettings,
    pub session: SessionSettings,
    pub safety: SafetySettings,
    pub scoring: ScoreWeights,
    pub registry: RegistrySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Backend name (`openai`, `anthropic`, `google`)
    ///
    /// Left unset, the backend is inferred from `model` and falls back to
    /// OpenAI. Set to an empty string to disable generation entirely.
    pub engine: Option<String>,

    /// Model name, optionally written as `provider/model`
    pub model: Option<String>,

    /// Override for the backend's API root (compatible gateways, tests)
    pub base_url: Option<String>,

    /// Sampling temperature, 0.0 to 2.0
    pub temperature: f32,

    /// Maximum completion size in tokens
    pub max_tokens: u32,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,

    /// Prompt template version used to build every prompt
    pub template_version: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            engine: None,
            model: None,
            base_url: None,
            temperature: 0.1,
            max_tokens: 1000,
            timeout_secs: 30,
            template_version: CURRENT_TEMPLATE_VERSION.to_string(),
        }
    }
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Decide which backend and model this configuration selects
    pub fn resolve(&self) -> Result<(ProviderKind, String), ConfigError> {
        let (model_provider, model) = match self.model.as_deref() {
            Some(value) if !value.trim().is_empty() => {
                let (provider, model) = parse_model_override(value);
                (provider, Some(model))
            }
            _ => (None, None),
        };

        let kind = match self.engine.as_deref().map(str::trim) {
            Some("") | Some("none") => return Err(ConfigError::NoProvider),
            Some(engine) => {
                let kind = ProviderKind::from_str(engine)
                    .map_err(|_| ConfigError::UnknownProvider(engine.to_string()))?;
                if let Some(other) = model_provider {
                    if other != kind {
                        return Err(ConfigError::Invalid(format!(
                            "model `{}` belongs to {} but engine is {}",
                            self.model.as_deref().unwrap_or_default(),
                            other,
                            kind
                        )));
                    }
                }
                kind
            }
            None => model_provider
                .or_else(|| model.as_deref().and_then(ProviderKind::infer_from_model))
                .unwrap_or(ProviderKind::OpenAi),
        };

        let model = model.unwrap_or_else(|| kind.default_model().to_string());
        Ok((kind, model))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Hand validated candidates to the executor without asking
    pub auto_execute: bool,

    /// Report what would run instead of running it
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetySettings {
    /// Enables the soft stage (context consistency, shell-operator warnings)
    ///
    /// The namespace, dangerous-pattern and destructive-operation checks
    /// always run.
    pub enabled: bool,

    /// What a context mismatch does to a candidate
    pub context_policy: ContextPolicy,

    /// Additional dangerous-pattern regexes
    pub extra_patterns: Vec<String>,

    /// Additional destructive-operation substrings
    pub extra_destructive: Vec<String>,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            context_policy: ContextPolicy::Warn,
            extra_patterns: Vec::new(),
            extra_destructive: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Binary name of the host robotics CLI
    pub host: String,

    /// Explicit namespace list; empty means the built-in registry
    pub namespaces: Vec<String>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            host: "robo".to_string(),
            namespaces: Vec::new(),
        }
    }
}

impl Settings {
    /// Load defaults, the first config file found, then the environment
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_paths().into_iter().find(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(settings)
    }

    /// Apply `ROBOCMD_*` overrides through an injectable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(engine) = lookup("ROBOCMD_ENGINE") {
            self.provider.engine = Some(engine.to_lowercase());
        }
        if let Some(model) = lookup("ROBOCMD_MODEL") {
            self.provider.model = Some(model);
        }
        if let Some(value) = lookup("ROBOCMD_TEMPERATURE") {
            self.provider.temperature = parse_env("ROBOCMD_TEMPERATURE", &value)?;
        }
        if let Some(value) = lookup("ROBOCMD_MAX_TOKENS") {
            self.provider.max_tokens = parse_env("ROBOCMD_MAX_TOKENS", &value)?;
        }
        if let Some(value) = lookup("ROBOCMD_TIMEOUT") {
            self.provider.timeout_secs = parse_env("ROBOCMD_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("ROBOCMD_AUTO_EXECUTE") {
            self.session.auto_execute = parse_flag("ROBOCMD_AUTO_EXECUTE", &value)?;
        }
        if let Some(value) = lookup("ROBOCMD_DRY_RUN") {
            self.session.dry_run = parse_flag("ROBOCMD_DRY_RUN", &value)?;
        }
        if let Some(value) = lookup("ROBOCMD_SAFETY_CHECKS") {
            self.safety.enabled = parse_flag("ROBOCMD_SAFETY_CHECKS", &value)?;
        }
        Ok(())
    }

    /// Check ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.provider;
        if !(0.0..=2.0).contains(&p.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature ({}) must be within 0.0..=2.0",
                p.temperature
            )));
        }
        if p.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be positive".into()));
        }
        if p.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        self.scoring.validate().map_err(ConfigError::Invalid)?;
        if self.registry.host.trim().is_empty() {
            return Err(ConfigError::Invalid("registry.host must not be empty".into()));
        }
        Ok(())
    }
}

/// Config files checked in order when no explicit path is given
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(
            PathBuf::from(home)
                .join(".config")
                .join("robocmd")
                .join("config.toml"),
        );
    }
    paths
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key} has invalid value `{value}`")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(format!(
            "{key} has invalid value `{value}`"
        ))),
    }
}

/// Provider API keys, read once at startup
#[derive(Clone, Default)]
pub struct Credentials {
    openai: Option<String>,
    anthropic: Option<String>,
    google: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |kind: ProviderKind| lookup(kind.api_key_env()).filter(|k| !k.trim().is_empty());
        Self {
            openai: read(ProviderKind::OpenAi),
            anthropic: read(ProviderKind::Anthropic),
            google: read(ProviderKind::Google),
        }
    }

    pub fn with_key(mut self, kind: ProviderKind, key: impl Into<String>) -> Self {
        let key = Some(key.into());
        match kind {
            ProviderKind::OpenAi => self.openai = key,
            ProviderKind::Anthropic => self.anthropic = key,
            ProviderKind::Google => self.google = key,
        }
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::OpenAi => self.openai.as_deref(),
            ProviderKind::Anthropic => self.anthropic.as_deref(),
            ProviderKind::Google => self.google.as_deref(),
        }
    }

    /// Backends that have a key configured
    pub fn available(&self) -> Vec<ProviderKind> {
        ProviderKind::all()
            .iter()
            .copied()
            .filter(|kind| self.get(*kind).is_some())
            .collect()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("available", &self.available())
            .finish()
    }
}
