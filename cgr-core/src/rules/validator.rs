//! Rule Set Validator
//!
//! Reports every problem in a rule set at once, unlike `Registry::build`,
//! which stops at the first. Errors (`E0xx`) are exactly the conditions that
//! make a registry build fail; warnings (`W0xx`) flag rules that load fine
//! but can never do what their author probably meant.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::context::{find_cycle, Pattern};

use super::manifest::{Activation, PatternDefinition, RuleDefinition, RuleSetManifest};

/// Validation result with detailed findings
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    /// Whether validation passed
    pub is_valid: bool,

    /// Error-level issues that must be fixed
    pub errors: Vec<ValidationIssue>,

    /// Warning-level issues that should be addressed
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: vec![],
            warnings: vec![],
        }
    }

    pub fn add_error(&mut self, issue: ValidationIssue) {
        self.is_valid = false;
        self.errors.push(issue);
    }

    pub fn add_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.errors.iter().chain(&self.warnings).any(|i| i.code == code)
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        format!(
            "{}: {} errors, {} warnings",
            if self.is_valid { "VALID" } else { "INVALID" },
            self.errors.len(),
            self.warnings.len()
        )
    }
}

/// A single validation issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Issue code
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Path to the problematic element (e.g., "rules[3].patterns[0]")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Suggested fix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
            suggestion: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[{}] {}: {}", self.code, path, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Rule set validator
#[derive(Debug, Clone)]
pub struct RuleSetValidator {
    check_warnings: bool,
}

impl RuleSetValidator {
    pub fn new() -> Self {
        Self {
            check_warnings: true,
        }
    }

    /// Only report errors
    pub fn errors_only(mut self) -> Self {
        self.check_warnings = false;
        self
    }

    /// Validate a rule set manifest
    pub fn validate(&self, manifest: &RuleSetManifest) -> ValidationResult {
        let mut result = self.validate_rules(&manifest.rules);

        if manifest.ruleset_version != super::VERSION {
            result.add_error(
                ValidationIssue::new(
                    "E001",
                    format!(
                        "Unsupported ruleset_version: expected {}, got {}",
                        super::VERSION,
                        manifest.ruleset_version
                    ),
                )
                .with_path("ruleset_version"),
            );
        }

        result
    }

    /// Validate bare rule definitions
    pub fn validate_rules(&self, rules: &[RuleDefinition]) -> ValidationResult {
        let mut result = ValidationResult::valid();

        let by_id = self.validate_identifiers(rules, &mut result);
        self.validate_patterns(rules, &mut result);
        let children = self.validate_children(rules, &by_id, &mut result);

        if let Some(cycle) = find_cycle(rules, &children) {
            result.add_error(
                ValidationIssue::new(
                    "E008",
                    format!("Cyclic child reference: {}", cycle.join(" -> ")),
                )
                .with_path(match by_id.get(cycle[0].as_str()) {
                    Some(index) => format!("rules[{}].children", index),
                    None => "rules".to_string(),
                })
                .with_suggestion("Remove one of the child references in the cycle"),
            );
        }

        if self.check_warnings {
            self.collect_warnings(rules, &children, &mut result);
        }

        result
    }

    /// E002/E003; returns the index of each id's first definition
    fn validate_identifiers<'a>(
        &self,
        rules: &'a [RuleDefinition],
        result: &mut ValidationResult,
    ) -> HashMap<&'a str, usize> {
        let mut by_id = HashMap::new();

        for (i, rule) in rules.iter().enumerate() {
            if rule.id.trim().is_empty() {
                result.add_error(
                    ValidationIssue::new("E002", "Rule id cannot be empty")
                        .with_path(format!("rules[{}].id", i)),
                );
                continue;
            }

            if let Some(first) = by_id.get(rule.id.as_str()) {
                result.add_error(
                    ValidationIssue::new("E003", format!("Duplicate rule id: {}", rule.id))
                        .with_path(format!("rules[{}].id", i))
                        .with_suggestion(format!("First defined at rules[{}]", first)),
                );
            } else {
                by_id.insert(rule.id.as_str(), i);
            }
        }

        by_id
    }

    /// E004/E005: every pattern must compile, every group must be non-empty
    fn validate_patterns(&self, rules: &[RuleDefinition], result: &mut ValidationResult) {
        for (i, rule) in rules.iter().enumerate() {
            for (j, pattern) in rule.patterns.iter().enumerate() {
                check_pattern(rule, pattern, format!("rules[{}].patterns[{}]", i, j), result);
            }

            for (g, group) in rule.groups.iter().enumerate() {
                if group.patterns.is_empty() {
                    result.add_error(
                        ValidationIssue::new("E005", "Pattern group has no patterns")
                            .with_path(format!("rules[{}].groups[{}]", i, g)),
                    );
                }
                for (j, pattern) in group.patterns.iter().enumerate() {
                    let path = format!("rules[{}].groups[{}].patterns[{}]", i, g, j);
                    check_pattern(rule, pattern, path, result);
                }
            }

            for (t, trigger) in rule.triggers.iter().enumerate() {
                let pattern = PatternDefinition::from_trigger(trigger);
                check_pattern(rule, &pattern, format!("rules[{}].triggers[{}]", i, t), result);
            }
        }
    }

    /// E006/E007; returns resolved child indices for the cycle check
    fn validate_children(
        &self,
        rules: &[RuleDefinition],
        by_id: &HashMap<&str, usize>,
        result: &mut ValidationResult,
    ) -> Vec<Vec<usize>> {
        let mut children = Vec::with_capacity(rules.len());

        for (i, rule) in rules.iter().enumerate() {
            let mut indices = Vec::new();

            for (c, child) in rule.children.iter().enumerate() {
                match by_id.get(child.id()) {
                    Some(&index) => indices.push(index),
                    None => result.add_error(
                        ValidationIssue::new(
                            "E006",
                            format!("Child references unknown rule: {}", child.id()),
                        )
                        .with_path(format!("rules[{}].children[{}]", i, c)),
                    ),
                }

                for (w, pattern) in child.condition().iter().enumerate() {
                    if let Err(e) = Pattern::compile(&rule.id, pattern) {
                        result.add_error(
                            ValidationIssue::new("E007", e.to_string())
                                .with_path(format!("rules[{}].children[{}].when[{}]", i, c, w)),
                        );
                    }
                }
            }

            children.push(indices);
        }

        children
    }

    fn collect_warnings(
        &self,
        rules: &[RuleDefinition],
        children: &[Vec<usize>],
        result: &mut ValidationResult,
    ) {
        let mut referenced = vec![false; rules.len()];
        for &index in children.iter().flatten() {
            referenced[index] = true;
        }

        if rules.is_empty() {
            result.add_warning(
                ValidationIssue::new("W005", "Rule set is empty; every change routes to nothing")
                    .with_path("rules"),
            );
        }

        for (i, rule) in rules.iter().enumerate() {
            if referenced[i] && rule.activation == Activation::OnRequest {
                result.add_warning(
                    ValidationIssue::new(
                        "W003",
                        format!(
                            "Rule '{}' is on_request but also a sub-guide; any included parent still pulls it in",
                            rule.id
                        ),
                    )
                    .with_path(format!("rules[{}].activation", i))
                    .with_suggestion("Use a conditional child reference to gate it under its parent"),
                );
            } else if !referenced[i] && !rule.has_patterns() {
                result.add_warning(
                    ValidationIssue::new(
                        "W001",
                        format!("Top-level rule '{}' has no patterns and can never match", rule.id),
                    )
                    .with_path(format!("rules[{}]", i))
                    .with_suggestion("Add patterns, or reference it as a child of another rule"),
                );
            }

            let mut seen = HashSet::new();
            for (c, child) in rule.children.iter().enumerate() {
                if !seen.insert(child.id()) {
                    result.add_warning(
                        ValidationIssue::new(
                            "W004",
                            format!("Rule '{}' lists child '{}' more than once", rule.id, child.id()),
                        )
                        .with_path(format!("rules[{}].children[{}]", i, c)),
                    );
                }
            }
        }
    }
}

impl Default for RuleSetValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_pattern(
    rule: &RuleDefinition,
    pattern: &PatternDefinition,
    path: String,
    result: &mut ValidationResult,
) {
    if let Err(e) = Pattern::compile(&rule.id, pattern) {
        result.add_error(ValidationIssue::new("E004", e.to_string()).with_path(path));
    }
}
