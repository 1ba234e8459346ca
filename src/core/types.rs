//! Core type definitions shared by every pipeline stage

use crate::llm::provider::ProviderKind;
use crate::nlp::normalizer::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// A user query in both its raw and normalized forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    raw: String,
    normalized: String,
}

impl Query {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// True when normalization left nothing to translate
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// Coarse classification of what a query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Launch,
    Stop,
    Publish,
    Echo,
    Navigate,
    #[default]
    Unknown,
}

impl Intent {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Intent::Launch => "launch",
            Intent::Stop => "stop",
            Intent::Publish => "publish",
            Intent::Echo => "echo",
            Intent::Navigate => "navigate",
            Intent::Unknown => "unknown",
        }
    }

    /// Command prefixes a candidate should start with to fulfil this intent
    pub const fn command_family(&self) -> &'static [&'static str] {
        match self {
            Intent::Launch => &[
                "robo sim launch",
                "ros2 launch",
                "ros2 run",
                "gz sim",
                "webots",
            ],
            Intent::Stop => &["robo sim shutdown", "robo sim pause", "robo sim reset"],
            Intent::Publish => &["robo pub", "ros2 topic pub"],
            Intent::Echo => &["robo echo", "ros2 topic echo"],
            Intent::Navigate => &[
                "robo nav",
                "robo pub",
                "ros2 action send_goal",
                "ros2 topic pub",
            ],
            Intent::Unknown => &[],
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of structured values pulled out of query text
///
/// Variants are declared in name order so `EntitySet` serializes with
/// sorted keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Coordinate,
    NumericParameter,
    RobotModel,
    Simulator,
    Topic,
}

impl EntityKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Topic => "topic",
            EntityKind::Coordinate => "coordinate",
            EntityKind::NumericParameter => "numeric_parameter",
            EntityKind::RobotModel => "robot_model",
            EntityKind::Simulator => "simulator",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracted entities grouped by kind
///
/// Values keep first-seen order within a kind and are never duplicated.
/// Kinds are ordered, so serialization is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySet {
    entries: BTreeMap<EntityKind, Vec<String>>,
}

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value under `kind`, ignoring duplicates
    pub fn insert(&mut self, kind: EntityKind, value: impl Into<String>) {
        let value = value.into();
        let values = self.entries.entry(kind).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    pub fn get(&self, kind: EntityKind) -> &[String] {
        self.entries.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, kind: EntityKind, value: &str) -> bool {
        self.get(kind).iter().any(|v| v == value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Total number of values across all kinds
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.entries
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(kind, _)| *kind)
    }

    /// Iterate every (kind, value) pair in kind order
    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &str)> + '_ {
        self.entries
            .iter()
            .flat_map(|(kind, values)| values.iter().map(move |v| (*kind, v.as_str())))
    }

    /// Compact JSON with sorted keys, used verbatim inside prompts
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Raw output of one provider call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    pub text: String,
    pub provider: ProviderKind,
    pub model: String,
    pub latency: Duration,
}

/// Validation state of a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Freshly parsed, not yet seen by the validator
    Pending,
    Approved,
    Rejected { reason: String },
}

/// One generated command with its validation state and confidence
#[derive(Debug, Clone, PartialEq)]
pub struct CommandCandidate {
    pub text: String,
    pub verdict: Verdict,
    /// Soft findings that did not block the candidate
    pub warnings: Vec<String>,
    pub confidence: f32,
}

impl CommandCandidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            verdict: Verdict::Pending,
            warnings: Vec::new(),
            confidence: 0.0,
        }
    }

    pub fn is_validated(&self) -> bool {
        matches!(self.verdict, Verdict::Approved)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.verdict, Verdict::Pending)
    }

    /// Empty unless the candidate was rejected
    pub fn rejection_reason(&self) -> &str {
        match &self.verdict {
            Verdict::Rejected { reason } => reason,
            _ => "",
        }
    }

    pub fn approve(&mut self) {
        self.verdict = Verdict::Approved;
    }

    /// Mark as rejected; an empty reason is replaced so the invariant holds
    pub fn reject(&mut self, reason: impl Into<String>) {
        let mut reason = reason.into();
        if reason.trim().is_empty() {
            reason = "rejected by safety validation".to_string();
        }
        self.verdict = Verdict::Rejected { reason };
    }
}

#[derive(Serialize)]
struct CandidateRecord<'a> {
    text: &'a str,
    validated: bool,
    rejection_reason: &'a str,
    confidence: f32,
    warnings: &'a [String],
}

impl Serialize for CommandCandidate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        CandidateRecord {
            text: &self.text,
            validated: self.is_validated(),
            rejection_reason: self.rejection_reason(),
            confidence: self.confidence,
            warnings: &self.warnings,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_normalizes_on_construction() {
        let q = Query::new("  Launch   Gazebo ");
        assert_eq!(q.raw(), "  Launch   Gazebo ");
        assert_eq!(q.normalized(), "launch gazebo");
        assert!(!q.is_empty());
        assert!(Query::new(" \t\n").is_empty());
    }

    #[test]
    fn test_intent_default_is_unknown() {
        assert_eq!(Intent::default(), Intent::Unknown);
        assert!(Intent::Unknown.command_family().is_empty());
    }

    #[test]
    fn test_entity_set_dedupes_and_orders() {
        let mut set = EntitySet::new();
        set.insert(EntityKind::Topic, "/scan");
        set.insert(EntityKind::RobotModel, "turtlebot3_burger");
        set.insert(EntityKind::Topic, "/scan");
        set.insert(EntityKind::Topic, "/odom");

        assert_eq!(set.len(), 3);
        assert_eq!(set.get(EntityKind::Topic), ["/scan", "/odom"]);
        assert!(set.get(EntityKind::Coordinate).is_empty());
        assert_eq!(
            set.to_json(),
            r#"{"robot_model":["turtlebot3_burger"],"topic":["/scan","/odom"]}"#
        );
    }

    #[test]
    fn test_entity_json_keys_sorted() {
        let mut set = EntitySet::new();
        set.insert(EntityKind::Topic, "/scan");
        set.insert(EntityKind::Simulator, "gazebo");
        set.insert(EntityKind::Coordinate, "1,2");
        set.insert(EntityKind::RobotModel, "tiago");
        set.insert(EntityKind::NumericParameter, "0.5");

        assert_eq!(
            set.to_json(),
            r#"{"coordinate":["1,2"],"numeric_parameter":["0.5"],"robot_model":["tiago"],"simulator":["gazebo"],"topic":["/scan"]}"#
        );
    }

    #[test]
    fn test_empty_entity_set() {
        let set = EntitySet::new();
        assert!(set.is_empty());
        assert_eq!(set.to_json(), "{}");
    }

    #[test]
    fn test_rejection_reason_invariant() {
        let mut c = CommandCandidate::new("rm -rf /");
        assert!(c.is_pending());
        assert_eq!(c.rejection_reason(), "");

        c.reject("");
        assert!(!c.is_validated());
        assert!(!c.rejection_reason().is_empty());

        c.approve();
        assert!(c.is_validated());
        assert_eq!(c.rejection_reason(), "");
    }

    #[test]
    fn test_candidate_serializes_as_record() {
        let mut c = CommandCandidate::new("robo echo /scan");
        c.approve();
        c.confidence = 0.5;
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["text"], "robo echo /scan");
        assert_eq!(json["validated"], true);
        assert_eq!(json["rejection_reason"], "");
        assert_eq!(json["confidence"], 0.5);
    }
}
