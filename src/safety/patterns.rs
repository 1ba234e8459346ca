//! Dangerous shell construct scan

use super::SafetyFinding;
use crate::core::error::ConfigError;
use regex::Regex;

/// Built-in dangerous constructs, each named in the rejection reason
const DANGEROUS_PATTERNS: &[(&str, &str)] = &[
    (
        "recursive deletion",
        r"(?i)\brm\s+(?:-\S+\s+)*(?:-[a-z]*r[a-z]*|--recursive)(?:\s|$)",
    ),
    (
        "privilege escalation",
        r"(?i)(?:^|[\s;&|(])(?:sudo|doas)\b|\bsu\s+-",
    ),
    ("fork bomb", r":\s*\(\s*\)\s*\{[^}]*:\s*\|\s*:\s*&"),
    (
        "world-writable permissions",
        r"(?i)\bchmod\s+(?:-r\s+)?(?:0?777|a\+w|o\+w)\b",
    ),
    ("raw disk write", r"(?i)\bdd\s+(?:\S+\s+)*if="),
    ("filesystem format", r"(?i)\bmkfs(?:\.\w+)?\b"),
    ("disk partitioning", r"(?i)\b(?:fdisk|sfdisk|parted)\b"),
    (
        "device overwrite",
        r"(?i)>\s*/dev/(?:sd[a-z]|nvme\d|hd[a-z]|mmcblk\d)",
    ),
    (
        "system power control",
        r"(?i)(?:^|[\s;&|])(?:reboot|poweroff|halt)(?:\s|$)|\bshutdown\s+(?:-[hrP]|now)\b",
    ),
    (
        "remote script execution",
        r"(?i)\b(?:curl|wget)\b[^|]*\|\s*(?:sudo\s+)?(?:ba|z|da|k)?sh\b",
    ),
    ("command substitution", r"\$\(|`"),
];

struct NamedPattern {
    name: String,
    regex: Regex,
}

pub struct PatternValidator {
    patterns: Vec<NamedPattern>,
}

impl PatternValidator {
    /// The built-in set plus configured extras
    ///
    /// Extras are named by their own source text in rejection reasons.
    pub fn new(extra_patterns: &[String]) -> Result<Self, ConfigError> {
        let mut patterns = Vec::with_capacity(DANGEROUS_PATTERNS.len() + extra_patterns.len());

        for (name, pattern) in DANGEROUS_PATTERNS {
            patterns.push(NamedPattern {
                name: (*name).to_string(),
                regex: compile(pattern)?,
            });
        }
        for pattern in extra_patterns {
            let case_insensitive = format!("(?i){}", pattern);
            patterns.push(NamedPattern {
                name: pattern.clone(),
                regex: compile(&case_insensitive).map_err(|e| match e {
                    ConfigError::InvalidPattern { message, .. } => ConfigError::InvalidPattern {
                        pattern: pattern.clone(),
                        message,
                    },
                    other => other,
                })?,
            });
        }

        Ok(Self { patterns })
    }

    pub fn builtin() -> Self {
        Self {
            patterns: DANGEROUS_PATTERNS
                .iter()
                .filter_map(|(name, pattern)| {
                    Regex::new(pattern).ok().map(|regex| NamedPattern {
                        name: (*name).to_string(),
                        regex,
                    })
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// First matching pattern, in table order
    pub fn validate(&self, text: &str) -> Vec<SafetyFinding> {
        let mut errors = Vec::new();

        if let Some(hit) = self.patterns.iter().find(|p| p.regex.is_match(text)) {
            errors.push(SafetyFinding::DangerousPattern {
                name: hit.name.clone(),
            });
        }

        errors
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}
