use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoboError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl RoboError {
    /// Process exit status: 1 when a query failed at the provider, 2 for
    /// configuration and usage errors
    pub fn exit_status(&self) -> u8 {
        match self {
            RoboError::Provider(_) => 1,
            _ => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, RoboError>;

/// Coarse failure category of a provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    Authentication,
    RateLimited,
    Timeout,
    MalformedResponse,
    Unavailable,
    Network,
    Http,
}

impl ProviderErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Authentication => "authentication",
            ProviderErrorKind::RateLimited => "rate_limited",
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::MalformedResponse => "malformed_response",
            ProviderErrorKind::Unavailable => "unavailable",
            ProviderErrorKind::Network => "network",
            ProviderErrorKind::Http => "http",
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single generation call, tagged by kind
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("provider unavailable (status {status}): {body}")]
    Unavailable { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {body}")]
    Http { status: u16, body: String },
}

impl ProviderError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Authentication(_) => ProviderErrorKind::Authentication,
            ProviderError::RateLimited(_) => ProviderErrorKind::RateLimited,
            ProviderError::Timeout(_) => ProviderErrorKind::Timeout,
            ProviderError::MalformedResponse(_) => ProviderErrorKind::MalformedResponse,
            ProviderError::Unavailable { .. } => ProviderErrorKind::Unavailable,
            ProviderError::Network(_) => ProviderErrorKind::Network,
            ProviderError::Http { .. } => ProviderErrorKind::Http,
        }
    }

    /// Only transport hiccups and 5xx responses are worth one more attempt
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ProviderErrorKind::Network | ProviderErrorKind::Unavailable
        )
    }

    /// Map a non-success HTTP status onto an error kind
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ProviderError::Authentication(body),
            429 => ProviderError::RateLimited(body),
            500..=599 => ProviderError::Unavailable { status, body },
            _ => ProviderError::Http { status, body },
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no provider configured")]
    NoProvider,

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("missing credential for {provider}: set {env_var}")]
    MissingCredential {
        provider: String,
        env_var: &'static str,
    },

    #[error("unknown prompt template version: {0}")]
    UnknownTemplate(String),

    #[error("invalid safety pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status() {
        let provider: RoboError = ProviderError::Timeout(Duration::from_secs(1)).into();
        assert_eq!(provider.exit_status(), 1);

        let config: RoboError = ConfigError::NoProvider.into();
        assert_eq!(config.exit_status(), 2);

        let io: RoboError = std::io::Error::new(std::io::ErrorKind::Other, "closed").into();
        assert!(matches!(io, RoboError::Io(_)));
        assert_eq!(io.exit_status(), 2);

        let serde: RoboError = serde_json::from_str::<u8>("x").unwrap_err().into();
        assert!(matches!(serde, RoboError::Serde(_)));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ProviderError::from_status(401, "bad key".into()).kind(),
            ProviderErrorKind::Authentication
        );
        assert_eq!(
            ProviderError::from_status(403, String::new()).kind(),
            ProviderErrorKind::Authentication
        );
        assert_eq!(
            ProviderError::from_status(429, String::new()).kind(),
            ProviderErrorKind::RateLimited
        );
        assert_eq!(
            ProviderError::from_status(503, String::new()).kind(),
            ProviderErrorKind::Unavailable
        );
        assert_eq!(
            ProviderError::from_status(400, String::new()).kind(),
            ProviderErrorKind::Http
        );
    }

    #[test]
    fn test_only_network_failures_are_transient() {
        assert!(ProviderError::Network("reset".into()).is_transient());
        assert!(ProviderError::from_status(502, String::new()).is_transient());
        assert!(!ProviderError::Authentication(String::new()).is_transient());
        assert!(!ProviderError::MalformedResponse(String::new()).is_transient());
        assert!(!ProviderError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(!ProviderError::RateLimited(String::new()).is_transient());
    }

    #[test]
    fn test_error_messages_carry_detail() {
        let err = ConfigError::MissingCredential {
            provider: "openai".into(),
            env_var: "OPENAI_API_KEY",
        };
        assert_eq!(
            err.to_string(),
            "missing credential for openai: set OPENAI_API_KEY"
        );

        let err: RoboError = ProviderError::Timeout(Duration::from_millis(50)).into();
        assert_eq!(err.to_string(), "request timed out after 50ms");
    }
}
