//! Command registry: which namespaces the host CLI can run

use crate::core::config::RegistrySettings;
use std::collections::BTreeSet;

/// Subcommand groups of the host CLI
const HOST_SUBCOMMANDS: [&str; 7] = ["sim", "pub", "echo", "param", "node", "gen", "nav"];

/// Other robotics CLIs trusted alongside the host
const EXTERNAL_TOOLS: [&str; 3] = ["ros2", "gz", "webots"];

/// Source of trusted command namespace prefixes
pub trait CommandRegistry {
    fn enumerate_commands(&self) -> BTreeSet<String>;
}

/// Fixed prefix list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRegistry {
    prefixes: BTreeSet<String>,
}

impl StaticRegistry {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .map(|p: String| p.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// The host's subcommand groups plus the external robotics CLIs
    pub fn builtin(host: &str) -> Self {
        Self::new(
            HOST_SUBCOMMANDS
                .iter()
                .map(|sub| format!("{} {}", host, sub))
                .chain(EXTERNAL_TOOLS.iter().map(|t| t.to_string())),
        )
    }

    pub fn from_settings(settings: &RegistrySettings) -> Self {
        if settings.namespaces.is_empty() {
            Self::builtin(&settings.host)
        } else {
            Self::new(settings.namespaces.iter().cloned())
        }
    }
}

impl CommandRegistry for StaticRegistry {
    fn enumerate_commands(&self) -> BTreeSet<String> {
        self.prefixes.clone()
    }
}
