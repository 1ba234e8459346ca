//! Confidence Scoring
//!
//! Scores already-validated candidates. The inputs are the classified intent,
//! the extracted entities and the candidate list with its verdicts; the
//! provider call itself never feeds in, so identical inputs always score the
//! same.

use crate::core::types::{CommandCandidate, EntityKind, EntitySet, Intent};
use crate::nlp::numbers_in;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// Relative weight of each scoring component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Candidate belongs to the intent's command family
    pub intent: f32,
    /// Share of extracted entities that made it into the candidates
    pub entity: f32,
    /// Candidate passed every hard safety check
    pub validation: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            intent: 0.4,
            entity: 0.3,
            validation: 0.3,
        }
    }
}

impl ScoreWeights {
    pub fn validate(&self) -> Result<(), String> {
        let weights = [self.intent, self.entity, self.validation];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("score weights must be finite and non-negative".to_string());
        }
        if weights.iter().sum::<f32>() <= 0.0 {
            return Err("score weights must have a positive sum".to_string());
        }
        Ok(())
    }

    fn total(&self) -> f32 {
        self.intent + self.entity + self.validation
    }
}

/// Component values behind one confidence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub intent_match: f32,
    pub entity_coverage: f32,
    pub validator_pass: f32,
    pub score: f32,
}

pub struct ConfidenceScorer {
    weights: ScoreWeights,
    host: String,
}

impl ConfidenceScorer {
    pub fn new(weights: ScoreWeights, host: impl Into<String>) -> Self {
        Self {
            weights,
            host: host.into(),
        }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// 1.0 when the candidate starts with one of the intent's family prefixes
    pub fn intent_match(&self, intent: Intent, text: &str) -> f32 {
        let tokens: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        let matched = intent.command_family().iter().any(|prefix| {
            let prefix = match prefix.strip_prefix("robo ") {
                Some(rest) => format!("{} {}", self.host, rest),
                None => prefix.to_string(),
            };
            let prefix_tokens: Vec<&str> = prefix.split_whitespace().collect();
            tokens.len() >= prefix_tokens.len()
                && prefix_tokens.iter().zip(&tokens).all(|(p, t)| *p == t)
        });
        if matched {
            1.0
        } else {
            0.0
        }
    }

    /// Fraction of extracted entities reflected anywhere in the candidate set
    pub fn entity_coverage(&self, entities: &EntitySet, candidates: &[CommandCandidate]) -> f32 {
        if entities.is_empty() {
            return 1.0;
        }

        let mut tokens: AHashSet<String> = AHashSet::new();
        let mut numbers: Vec<f64> = Vec::new();
        for candidate in candidates {
            let lowered = candidate.text.to_lowercase();
            tokens.extend(
                lowered
                    .split(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '/' | '-' | '.')))
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            );
            numbers.extend(numbers_in(&lowered));
        }

        let has_number = |value: &str| {
            value
                .parse::<f64>()
                .map(|n| numbers.iter().any(|m| (m - n).abs() < 1e-9))
                .unwrap_or(false)
        };

        let reflected = entities
            .iter()
            .filter(|(kind, value)| match kind {
                EntityKind::Topic | EntityKind::RobotModel => tokens.contains(*value),
                EntityKind::Simulator => match *value {
                    "gazebo" => ["gazebo", "gz", "ignition"]
                        .iter()
                        .any(|alias| tokens.contains(*alias)),
                    other => tokens.contains(other),
                },
                EntityKind::Coordinate => value.split(',').all(has_number),
                EntityKind::NumericParameter => value
                    .split_whitespace()
                    .next()
                    .is_some_and(has_number),
            })
            .count();

        reflected as f32 / entities.len() as f32
    }

    /// Score one candidate against the set it was generated with
    pub fn breakdown(
        &self,
        intent: Intent,
        entities: &EntitySet,
        candidate: &CommandCandidate,
        all: &[CommandCandidate],
    ) -> ScoreBreakdown {
        let intent_match = self.intent_match(intent, &candidate.text);
        let entity_coverage = self.entity_coverage(entities, all);
        let validator_pass = if candidate.is_validated() { 1.0 } else { 0.0 };

        let total = self.weights.total();
        let score = if total > 0.0 {
            (self.weights.intent * intent_match
                + self.weights.entity * entity_coverage
                + self.weights.validation * validator_pass)
                / total
        } else {
            0.0
        };

        ScoreBreakdown {
            intent_match,
            entity_coverage,
            validator_pass,
            score: score.clamp(0.0, 1.0),
        }
    }

    /// Set `confidence` on every candidate, returning the breakdowns in order
    pub fn apply(
        &self,
        intent: Intent,
        entities: &EntitySet,
        candidates: &mut [CommandCandidate],
    ) -> Vec<ScoreBreakdown> {
        let breakdowns: Vec<ScoreBreakdown> = candidates
            .iter()
            .map(|c| self.breakdown(intent, entities, c, candidates))
            .collect();
        for (candidate, breakdown) in candidates.iter_mut().zip(&breakdowns) {
            candidate.confidence = breakdown.score;
        }
        breakdowns
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(ScoreWeights::default(), "robo")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::extract_entities;

    fn approved(text: &str) -> CommandCandidate {
        let mut c = CommandCandidate::new(text);
        c.approve();
        c
    }

    #[test]
    fn test_default_weights_valid() {
        assert!(ScoreWeights::default().validate().is_ok());
        let bad = ScoreWeights {
            intent: -1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let zero = ScoreWeights {
            intent: 0.0,
            entity: 0.0,
            validation: 0.0,
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_full_confidence() {
        let entities = extract_entities("launch gazebo with turtlebot3 burger");
        let mut candidates = vec![approved("robo sim launch gazebo --robot turtlebot3_burger")];
        let breakdowns = ConfidenceScorer::default().apply(Intent::Launch, &entities, &mut candidates);
        assert_eq!(breakdowns[0].intent_match, 1.0);
        assert_eq!(breakdowns[0].entity_coverage, 1.0);
        assert!((candidates[0].confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejection_penalized() {
        let mut rejected = CommandCandidate::new("rm -rf /");
        rejected.reject("dangerous pattern: recursive deletion");
        let mut candidates = vec![rejected];
        ConfidenceScorer::default().apply(Intent::Unknown, &EntitySet::new(), &mut candidates);
        // Only entity coverage (vacuously full) contributes
        assert!((candidates[0].confidence - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_partial_entity_coverage() {
        let entities = extract_entities("navigate to (2, 3) at 0.5 m/s");
        let candidates = vec![approved("robo nav goal --x 2 --y 3")];
        let coverage = ConfidenceScorer::default().entity_coverage(&entities, &candidates);
        assert!((coverage - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_intent_family_respects_host() {
        let scorer = ConfidenceScorer::new(ScoreWeights::default(), "rcli");
        assert_eq!(scorer.intent_match(Intent::Echo, "rcli echo /scan"), 1.0);
        assert_eq!(scorer.intent_match(Intent::Echo, "robo echo /scan"), 0.0);
        assert_eq!(scorer.intent_match(Intent::Echo, "ros2 topic echo /scan"), 1.0);
        assert_eq!(scorer.intent_match(Intent::Unknown, "ros2 topic echo /scan"), 0.0);
    }

    #[test]
    fn test_deterministic() {
        let entities = extract_entities("echo /scan and /odom");
        let mut a = vec![approved("robo echo /scan"), CommandCandidate::new("cat /odom")];
        let mut b = a.clone();
        let scorer = ConfidenceScorer::default();
        assert_eq!(
            scorer.apply(Intent::Echo, &entities, &mut a),
            scorer.apply(Intent::Echo, &entities, &mut b)
        );
        assert_eq!(a, b);
    }
}
