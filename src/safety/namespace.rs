//! Namespace allow-list check

use super::SafetyFinding;
use std::collections::BTreeSet;

/// Chaining operators that start a new command, longest first
const CHAIN_OPERATORS: [&str; 4] = ["&&", "||", ";", "|"];

/// Split a command line into the non-empty commands it chains together
pub fn split_segments(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut rest = text;
    loop {
        let next = CHAIN_OPERATORS
            .iter()
            .filter_map(|op| rest.find(op).map(|at| (at, op.len())))
            .min_by_key(|(at, len)| (*at, std::cmp::Reverse(*len)));
        match next {
            Some((at, len)) => {
                segments.push(rest[..at].trim());
                rest = &rest[at + len..];
            }
            None => {
                segments.push(rest.trim());
                break;
            }
        }
    }
    segments.retain(|s| !s.is_empty());
    segments
}

pub struct NamespaceValidator {
    prefixes: BTreeSet<String>,
}

impl NamespaceValidator {
    pub fn new(prefixes: BTreeSet<String>) -> Self {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn prefixes(&self) -> &BTreeSet<String> {
        &self.prefixes
    }

    /// Whether `segment` starts with a trusted prefix at a token boundary
    pub fn is_trusted(&self, segment: &str) -> bool {
        let tokens: Vec<String> = segment
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        self.prefixes.iter().any(|prefix| {
            let prefix_tokens: Vec<&str> = prefix.split_whitespace().collect();
            tokens.len() >= prefix_tokens.len()
                && prefix_tokens
                    .iter()
                    .zip(&tokens)
                    .all(|(p, t)| *p == t.as_str())
        })
    }

    /// The command must begin with a trusted prefix
    pub fn validate(&self, text: &str) -> Vec<SafetyFinding> {
        match split_segments(text).first() {
            Some(leading) if self.is_trusted(leading) => Vec::new(),
            Some(leading) => vec![SafetyFinding::UnrecognizedNamespace {
                segment: leading.to_string(),
            }],
            None => vec![SafetyFinding::UnrecognizedNamespace {
                segment: text.to_string(),
            }],
        }
    }

    /// Commands chained after the leading one must be trusted too
    pub fn validate_chained(&self, text: &str) -> Vec<SafetyFinding> {
        split_segments(text)
            .into_iter()
            .skip(1)
            .filter(|segment| !self.is_trusted(segment))
            .map(|segment| SafetyFinding::UnrecognizedNamespace {
                segment: segment.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> NamespaceValidator {
        NamespaceValidator::new(
            ["robo sim", "robo echo", "ros2"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }

    #[test]
    fn test_trusted_prefix() {
        assert!(validator().validate("robo sim launch gazebo").is_empty());
        assert!(validator().validate("ROS2 topic list").is_empty());
    }

    #[test]
    fn test_prefix_matches_on_token_boundary() {
        assert!(!validator().is_trusted("ros2x topic list"));
        assert!(!validator().is_trusted("robo simulate"));
        assert!(!validator().is_trusted("robo"));
    }

    #[test]
    fn test_unknown_namespace() {
        let errors = validator().validate("ls -la");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "unrecognized command namespace");
    }

    #[test]
    fn test_only_leading_command_decides_namespace() {
        assert!(validator().validate("robo sim status; rm -rf /tmp/x").is_empty());
        assert_eq!(validator().validate("ls; robo sim status").len(), 1);
        assert_eq!(validator().validate(" ; ").len(), 1);
    }

    #[test]
    fn test_chained_commands_checked() {
        assert!(validator()
            .validate_chained("robo sim launch gazebo && robo echo /scan")
            .is_empty());
        let errors = validator().validate_chained("robo sim status; rm -rf /tmp/x");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            SafetyFinding::UnrecognizedNamespace { segment } if segment == "rm -rf /tmp/x"
        ));
    }

    #[test]
    fn test_split_segments() {
        assert_eq!(
            split_segments("a && b || c; d | e"),
            vec!["a", "b", "c", "d", "e"]
        );
        assert_eq!(split_segments("robo sim list;"), vec!["robo sim list"]);
        assert!(split_segments(" ; ").is_empty());
    }
}
