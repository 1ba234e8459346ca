//! Context consistency: does the candidate stick to what was asked for

use super::SafetyFinding;
use crate::core::types::{EntityKind, EntitySet, Intent};
use crate::nlp::extract_entities;

/// Entity kinds a candidate may introduce only with cause
const CHECKED_KINDS: [EntityKind; 3] = [
    EntityKind::Topic,
    EntityKind::RobotModel,
    EntityKind::Simulator,
];

/// Values generation may reasonably add for an intent without being asked
fn intent_defaults(intent: Intent, kind: EntityKind) -> &'static [&'static str] {
    match (intent, kind) {
        (Intent::Publish | Intent::Navigate, EntityKind::Topic) => &["/cmd_vel", "/goal_pose"],
        (Intent::Echo, EntityKind::Topic) => &["/scan", "/odom", "/cmd_vel"],
        (Intent::Launch, EntityKind::Simulator) => &["gazebo"],
        (Intent::Launch, EntityKind::RobotModel) => &["turtlebot3_burger"],
        _ => &[],
    }
}

pub struct ContextValidator;

impl ContextValidator {
    /// Report entities in `text` that neither the request nor the intent accounts for
    pub fn validate(text: &str, intent: Intent, entities: &EntitySet) -> Vec<SafetyFinding> {
        let mut findings = Vec::new();
        let referenced = extract_entities(text);

        for kind in CHECKED_KINDS {
            for value in referenced.get(kind) {
                if entities.contains(kind, value) || intent_defaults(intent, kind).contains(&value.as_str()) {
                    continue;
                }
                findings.push(SafetyFinding::ContextMismatch {
                    reference: format!("{} {}", kind.as_str().replace('_', " "), value),
                });
            }
        }

        findings
    }
}
