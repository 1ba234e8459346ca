//! Safety validation for generated commands

mod context;
mod destructive;
mod namespace;
mod patterns;
mod validator;

pub use context::ContextValidator;
pub use destructive::DestructiveOperationValidator;
pub use namespace::{split_segments, NamespaceValidator};
pub use patterns::PatternValidator;
pub use validator::{SafetyValidator, ValidationReport};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Validation finding types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyFinding {
    UnrecognizedNamespace { segment: String },
    DangerousPattern { name: String },
    DestructiveOperation { operation: String, category: String },
    ContextMismatch { reference: String },
    ShellOperator { operator: &'static str },
}

impl SafetyFinding {
    /// Hard findings reject the candidate outright
    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            SafetyFinding::UnrecognizedNamespace { .. }
                | SafetyFinding::DangerousPattern { .. }
                | SafetyFinding::DestructiveOperation { .. }
        )
    }
}

impl fmt::Display for SafetyFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyFinding::UnrecognizedNamespace { .. } => {
                write!(f, "unrecognized command namespace")
            }
            SafetyFinding::DangerousPattern { name } => {
                write!(f, "dangerous pattern: {}", name)
            }
            SafetyFinding::DestructiveOperation {
                operation,
                category,
            } => write!(f, "destructive operation: {} ({})", operation, category),
            SafetyFinding::ContextMismatch { reference } => {
                write!(f, "{} does not appear in the request", reference)
            }
            SafetyFinding::ShellOperator { operator } => {
                write!(f, "uses shell operator `{}`", operator)
            }
        }
    }
}

/// What to do when a candidate references entities the request never mentioned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextPolicy {
    #[default]
    Warn,
    Reject,
}
