pub mod config;
pub mod error;
pub mod types;

pub use config::{Credentials, Settings};
pub use error::{ConfigError, ProviderError, ProviderErrorKind, Result, RoboError};
pub use types::{CommandCandidate, CompletionResult, EntityKind, EntitySet, Intent, Query, Verdict};
