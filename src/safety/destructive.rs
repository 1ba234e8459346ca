//! Known irreversible operations

use super::SafetyFinding;

/// Operation substrings and the category named in the rejection
const DESTRUCTIVE_OPERATIONS: &[(&str, &str)] = &[
    ("ros2 lifecycle set", "lifecycle termination"),
    ("ros2 param delete", "parameter deletion"),
    ("robo param delete", "parameter deletion"),
    ("killall", "mass process kill"),
    ("pkill", "mass process kill"),
    ("kill -9", "mass process kill"),
    ("ros2 daemon stop", "mass process kill"),
];

const CONFIGURED_CATEGORY: &str = "configured operation";

pub struct DestructiveOperationValidator {
    operations: Vec<(String, String)>,
}

impl DestructiveOperationValidator {
    pub fn new(extra_operations: &[String]) -> Self {
        let operations = DESTRUCTIVE_OPERATIONS
            .iter()
            .map(|(op, category)| (op.to_string(), category.to_string()))
            .chain(
                extra_operations
                    .iter()
                    .map(|op| op.trim().to_lowercase())
                    .filter(|op| !op.is_empty())
                    .map(|op| (op, CONFIGURED_CATEGORY.to_string())),
            )
            .collect();
        Self { operations }
    }

    /// Case-insensitive substring match, first listed operation wins
    pub fn validate(&self, text: &str) -> Vec<SafetyFinding> {
        let mut errors = Vec::new();
        let lowered = text.to_lowercase();

        if let Some((operation, category)) = self
            .operations
            .iter()
            .find(|(op, _)| lowered.contains(op.as_str()))
        {
            errors.push(SafetyFinding::DestructiveOperation {
                operation: operation.clone(),
                category: category.clone(),
            });
        }

        errors
    }
}

impl Default for DestructiveOperationValidator {
    fn default() -> Self {
        Self::new(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_deletion() {
        let errors = DestructiveOperationValidator::default().validate("ROS2 PARAM DELETE /turtlesim background_r");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "destructive operation: ros2 param delete (parameter deletion)"
        );
    }

    #[test]
    fn test_lifecycle_and_kill() {
        let validator = DestructiveOperationValidator::default();
        assert!(matches!(
            &validator.validate("ros2 lifecycle set /talker shutdown")[0],
            SafetyFinding::DestructiveOperation { category, .. } if category == "lifecycle termination"
        ));
        assert!(!validator.validate("killall gzserver").is_empty());
        assert!(!validator.validate("kill -9 1234").is_empty());
    }

    #[test]
    fn test_safe_commands() {
        let validator = DestructiveOperationValidator::default();
        assert!(validator.validate("robo param get /controller gain").is_empty());
        assert!(validator.validate("robo sim shutdown").is_empty());
    }

    #[test]
    fn test_configured_operations() {
        let validator = DestructiveOperationValidator::new(&["  ROBO SIM RESET ".to_string()]);
        let errors = validator.validate("robo sim reset --hard");
        assert_eq!(
            errors,
            vec![SafetyFinding::DestructiveOperation {
                operation: "robo sim reset".into(),
                category: CONFIGURED_CATEGORY.into(),
            }]
        );
    }
}
