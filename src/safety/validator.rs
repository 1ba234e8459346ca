//! Composite validator that runs every safety check in order

use super::{
    ContextPolicy, ContextValidator, DestructiveOperationValidator, NamespaceValidator,
    PatternValidator, SafetyFinding,
};
use crate::core::config::SafetySettings;
use crate::core::error::ConfigError;
use crate::core::types::{CommandCandidate, EntitySet, Intent};
use std::collections::BTreeSet;

/// Result of running all checks against one command
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// The hard finding that stopped validation, if any
    pub rejection: Option<SafetyFinding>,
    pub warnings: Vec<SafetyFinding>,
    pub passed_namespace: bool,
    pub passed_patterns: bool,
    pub passed_destructive: bool,
    pub passed_context: bool,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            rejection: None,
            warnings: Vec::new(),
            passed_namespace: true,
            passed_patterns: true,
            passed_destructive: true,
            passed_context: true,
        }
    }

    fn reject(&mut self, mut findings: Vec<SafetyFinding>) {
        if !findings.is_empty() {
            self.is_valid = false;
            self.rejection = Some(findings.swap_remove(0));
        }
    }

    pub fn add_namespace_errors(&mut self, errors: Vec<SafetyFinding>) {
        if !errors.is_empty() {
            self.passed_namespace = false;
            self.reject(errors);
        }
    }

    pub fn add_pattern_errors(&mut self, errors: Vec<SafetyFinding>) {
        if !errors.is_empty() {
            self.passed_patterns = false;
            self.reject(errors);
        }
    }

    pub fn add_destructive_errors(&mut self, errors: Vec<SafetyFinding>) {
        if !errors.is_empty() {
            self.passed_destructive = false;
            self.reject(errors);
        }
    }

    pub fn add_context_findings(&mut self, findings: Vec<SafetyFinding>, policy: ContextPolicy) {
        if findings.is_empty() {
            return;
        }
        self.passed_context = false;
        match policy {
            ContextPolicy::Warn => self.warnings.extend(findings),
            ContextPolicy::Reject => self.reject(findings),
        }
    }

    pub fn add_warnings(&mut self, warnings: Vec<SafetyFinding>) {
        self.warnings.extend(warnings);
    }

    /// Namespace, pattern and destructive checks all passed
    pub fn passed_hard_checks(&self) -> bool {
        self.passed_namespace && self.passed_patterns && self.passed_destructive
    }

    /// Rejection reason text; empty when valid
    pub fn reason(&self) -> String {
        self.rejection
            .as_ref()
            .map(|f| f.to_string())
            .unwrap_or_default()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Redirections and pipes that are allowed but worth a second look
fn shell_operator_warnings(text: &str) -> Vec<SafetyFinding> {
    let mut warnings = Vec::new();

    if text.contains(">>") {
        warnings.push(SafetyFinding::ShellOperator { operator: ">>" });
    } else if text.contains('>') {
        warnings.push(SafetyFinding::ShellOperator { operator: ">" });
    }
    if text.replace("||", "").contains('|') {
        warnings.push(SafetyFinding::ShellOperator { operator: "|" });
    }

    warnings
}

/// Side-effect-free safety gate for generated commands
pub struct SafetyValidator {
    namespace: NamespaceValidator,
    patterns: PatternValidator,
    destructive: DestructiveOperationValidator,
    context_policy: ContextPolicy,
    soft_checks: bool,
}

impl SafetyValidator {
    pub fn new(allow_list: BTreeSet<String>, settings: &SafetySettings) -> Result<Self, ConfigError> {
        Ok(Self {
            namespace: NamespaceValidator::new(allow_list),
            patterns: PatternValidator::new(&settings.extra_patterns)?,
            destructive: DestructiveOperationValidator::new(&settings.extra_destructive),
            context_policy: settings.context_policy,
            soft_checks: settings.enabled,
        })
    }

    pub fn allow_list(&self) -> &BTreeSet<String> {
        self.namespace.prefixes()
    }

    pub fn soft_checks_enabled(&self) -> bool {
        self.soft_checks
    }

    /// Run the checks in order; the first hard failure ends validation
    pub fn check(&self, text: &str, intent: Intent, entities: &EntitySet) -> ValidationReport {
        let mut report = ValidationReport::new();

        report.add_namespace_errors(self.namespace.validate(text));
        if !report.is_valid {
            return report;
        }

        report.add_pattern_errors(self.patterns.validate(text));
        if !report.is_valid {
            return report;
        }

        report.add_destructive_errors(self.destructive.validate(text));
        if !report.is_valid {
            return report;
        }

        report.add_namespace_errors(self.namespace.validate_chained(text));
        if !report.is_valid || !self.soft_checks {
            return report;
        }

        report.add_context_findings(
            ContextValidator::validate(text, intent, entities),
            self.context_policy,
        );
        report.add_warnings(shell_operator_warnings(text));
        report
    }

    /// Record the verdict and warnings on the candidate
    pub fn validate(
        &self,
        candidate: &mut CommandCandidate,
        intent: Intent,
        entities: &EntitySet,
    ) -> ValidationReport {
        let report = self.check(&candidate.text, intent, entities);
        candidate.warnings = report.warnings.iter().map(|w| w.to_string()).collect();
        if report.is_valid {
            candidate.approve();
        } else {
            tracing::warn!(command = %candidate.text, "Rejected: {}", report.reason());
            candidate.reject(report.reason());
        }
        report
    }

    pub fn validate_all(
        &self,
        candidates: &mut [CommandCandidate],
        intent: Intent,
        entities: &EntitySet,
    ) -> Vec<ValidationReport> {
        candidates
            .iter_mut()
            .map(|c| self.validate(c, intent, entities))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::registry::{CommandRegistry, StaticRegistry};
    use crate::nlp::extract_entities;

    fn validator(settings: &SafetySettings) -> SafetyValidator {
        SafetyValidator::new(StaticRegistry::builtin("robo").enumerate_commands(), settings).unwrap()
    }

    #[test]
    fn test_valid_command() {
        let entities = extract_entities("launch gazebo with turtlebot3 burger");
        let report = validator(&SafetySettings::default()).check(
            "robo sim launch gazebo --robot turtlebot3_burger",
            Intent::Launch,
            &entities,
        );
        assert!(report.is_valid);
        assert!(report.warnings.is_empty());
        assert_eq!(report.reason(), "");
    }

    #[test]
    fn test_first_hard_failure_short_circuits() {
        // Untrusted namespace wins over the dangerous pattern behind it
        let report = validator(&SafetySettings::default()).check(
            "rm -rf /",
            Intent::Unknown,
            &EntitySet::new(),
        );
        assert!(!report.passed_namespace);
        assert!(report.passed_patterns);
        assert_eq!(report.reason(), "unrecognized command namespace");
    }

    #[test]
    fn test_dangerous_pattern_inside_trusted_chain() {
        let report = validator(&SafetySettings::default()).check(
            "robo sim status && ros2 run demo talker $(whoami)",
            Intent::Launch,
            &EntitySet::new(),
        );
        assert!(report.passed_namespace);
        assert!(!report.passed_patterns);
        assert_eq!(report.reason(), "dangerous pattern: command substitution");
    }

    #[test]
    fn test_chained_recursive_delete_names_pattern() {
        let report = validator(&SafetySettings::default()).check(
            "robo sim reset && rm -rf ~/.ros",
            Intent::Stop,
            &EntitySet::new(),
        );
        assert!(report.passed_namespace);
        assert!(!report.passed_patterns);
        assert_eq!(report.reason(), "dangerous pattern: recursive deletion");
    }

    #[test]
    fn test_untrusted_chained_command_rejected_last() {
        let report = validator(&SafetySettings::default()).check(
            "robo sim status && ls -la",
            Intent::Unknown,
            &EntitySet::new(),
        );
        assert!(report.passed_patterns);
        assert!(report.passed_destructive);
        assert!(!report.passed_namespace);
        assert_eq!(report.reason(), "unrecognized command namespace");
    }

    #[test]
    fn test_destructive_operation() {
        let mut candidate = CommandCandidate::new("ros2 param delete /controller gain");
        validator(&SafetySettings::default()).validate(
            &mut candidate,
            Intent::Unknown,
            &EntitySet::new(),
        );
        assert!(!candidate.is_validated());
        assert_eq!(
            candidate.rejection_reason(),
            "destructive operation: ros2 param delete (parameter deletion)"
        );
    }

    #[test]
    fn test_context_mismatch_policies() {
        let entities = extract_entities("launch gazebo");
        let text = "robo sim launch webots";

        let mut candidate = CommandCandidate::new(text);
        validator(&SafetySettings::default()).validate(&mut candidate, Intent::Launch, &entities);
        assert!(candidate.is_validated());
        assert_eq!(
            candidate.warnings,
            vec!["simulator webots does not appear in the request"]
        );

        let strict = SafetySettings {
            context_policy: ContextPolicy::Reject,
            ..Default::default()
        };
        let mut candidate = CommandCandidate::new(text);
        validator(&strict).validate(&mut candidate, Intent::Launch, &entities);
        assert!(!candidate.is_validated());
        assert_eq!(
            candidate.rejection_reason(),
            "simulator webots does not appear in the request"
        );
    }

    #[test]
    fn test_shell_operator_warnings() {
        let mut candidate = CommandCandidate::new("robo echo /scan --count 5 > scan.txt");
        validator(&SafetySettings::default()).validate(&mut candidate, Intent::Echo, &EntitySet::new());
        assert!(candidate.is_validated());
        assert_eq!(candidate.warnings, vec!["uses shell operator `>`"]);
    }

    #[test]
    fn test_disabled_soft_stage_keeps_hard_checks() {
        let relaxed = SafetySettings {
            enabled: false,
            context_policy: ContextPolicy::Reject,
            ..Default::default()
        };
        let v = validator(&relaxed);

        let report = v.check("robo sim launch webots > log", Intent::Launch, &EntitySet::new());
        assert!(report.is_valid);
        assert!(report.warnings.is_empty());

        let report = v.check("sudo robo sim launch", Intent::Launch, &EntitySet::new());
        assert!(!report.is_valid);
    }
}
