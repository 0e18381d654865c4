//! Error types for CGR operations
//!
//! Configuration is the only place routing can fail. Every problem found
//! while loading a rule set or building a [`Registry`](crate::Registry)
//! surfaces as a [`ConfigError`] naming the offending rule and the reason,
//! so an operator can fix the configuration without guessing.
//!
//! # Error Codes
//!
//! Each variant has a unique, stable error code (e.g., `DUPLICATE_RULE_ID`)
//! for programmatic handling, logging and aggregation.
//!
//! # Example
//!
//! ```rust
//! use cgr_core::error::{ConfigError, ErrorCategory};
//!
//! fn report(err: &ConfigError) {
//!     match err.category() {
//!         ErrorCategory::Validation => println!("fix the pattern: {}", err),
//!         ErrorCategory::Reference => println!("fix the rule graph: {}", err),
//!         ErrorCategory::Io => println!("check the file: {}", err),
//!     }
//!     if let Some(rule_id) = err.rule_id() {
//!         println!("offending rule: {}", rule_id);
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A single rule or pattern is malformed
    Validation,
    /// The rule graph is inconsistent (duplicates, dangling or cyclic references)
    Reference,
    /// The configuration could not be read or parsed
    Io,
}

/// Errors raised while loading a rule set or building a registry
///
/// All of these are fatal: a router must not start with an invalid registry.
#[derive(Error, Debug)]
pub enum ConfigError {
    // ═══════════════════════════════════════════════════════════════════════
    // Rule and pattern errors
    // ═══════════════════════════════════════════════════════════════════════

    /// A rule was defined with an empty id
    #[error("Rule at position {index} has an empty id. Every rule needs a stable document id.")]
    EmptyRuleId { index: usize },

    /// A pattern value is empty
    #[error("Rule '{rule_id}' has an empty {kind} pattern.")]
    EmptyPattern { rule_id: String, kind: String },

    /// A symbol regex does not compile
    #[error("Rule '{rule_id}' has an invalid symbol_regex '{pattern}': {reason}")]
    InvalidRegex {
        rule_id: String,
        pattern: String,
        reason: String,
    },

    /// A path glob does not compile
    #[error("Rule '{rule_id}' has an invalid path_glob '{pattern}': {reason}")]
    InvalidGlob {
        rule_id: String,
        pattern: String,
        reason: String,
    },

    /// A pattern group was declared with no patterns
    #[error("Rule '{rule_id}' declares an empty pattern group.")]
    EmptyGroup { rule_id: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Rule graph errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Two rules share the same id
    #[error("Duplicate rule id '{rule_id}'. Rule ids must be unique.")]
    DuplicateRuleId { rule_id: String },

    /// A child reference names a rule that does not exist
    #[error("Rule '{rule_id}' references unknown child '{child_id}'.")]
    UnknownChildReference { rule_id: String, child_id: String },

    /// The child graph contains a cycle
    #[error("Cyclic child reference: {}. Sub-guides must form an acyclic graph.", .cycle.join(" -> "))]
    CyclicReference { cycle: Vec<String> },

    // ═══════════════════════════════════════════════════════════════════════
    // Loading errors
    // ═══════════════════════════════════════════════════════════════════════

    /// The rule set declares a version this crate does not understand
    #[error("Unsupported ruleset_version: expected '{expected}', got '{actual}'.")]
    UnsupportedVersion { expected: String, actual: String },

    /// The rule set failed validation on load
    #[error("Invalid rule set: {reason}")]
    InvalidRuleSet { reason: String },

    /// Failed to read configuration from disk
    #[error("Failed to load rule set from '{path}': {reason}")]
    LoadError { path: String, reason: String },

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ConfigError {
    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConfigError::EmptyRuleId { .. }
            | ConfigError::EmptyPattern { .. }
            | ConfigError::InvalidRegex { .. }
            | ConfigError::InvalidGlob { .. }
            | ConfigError::EmptyGroup { .. }
            | ConfigError::InvalidRuleSet { .. } => ErrorCategory::Validation,

            ConfigError::DuplicateRuleId { .. }
            | ConfigError::UnknownChildReference { .. }
            | ConfigError::CyclicReference { .. } => ErrorCategory::Reference,

            ConfigError::UnsupportedVersion { .. }
            | ConfigError::LoadError { .. }
            | ConfigError::JsonError(_) => ErrorCategory::Io,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::EmptyRuleId { .. } => "EMPTY_RULE_ID",
            ConfigError::EmptyPattern { .. } => "EMPTY_PATTERN",
            ConfigError::InvalidRegex { .. } => "INVALID_REGEX",
            ConfigError::InvalidGlob { .. } => "INVALID_GLOB",
            ConfigError::EmptyGroup { .. } => "EMPTY_GROUP",
            ConfigError::DuplicateRuleId { .. } => "DUPLICATE_RULE_ID",
            ConfigError::UnknownChildReference { .. } => "UNKNOWN_CHILD_REFERENCE",
            ConfigError::CyclicReference { .. } => "CYCLIC_REFERENCE",
            ConfigError::UnsupportedVersion { .. } => "UNSUPPORTED_VERSION",
            ConfigError::InvalidRuleSet { .. } => "INVALID_RULE_SET",
            ConfigError::LoadError { .. } => "LOAD_ERROR",
            ConfigError::JsonError(_) => "JSON_ERROR",
        }
    }

    /// The id of the rule that caused this error, when one is known
    ///
    /// For cycles this is the first rule on the cycle.
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            ConfigError::EmptyPattern { rule_id, .. }
            | ConfigError::InvalidRegex { rule_id, .. }
            | ConfigError::InvalidGlob { rule_id, .. }
            | ConfigError::EmptyGroup { rule_id }
            | ConfigError::DuplicateRuleId { rule_id }
            | ConfigError::UnknownChildReference { rule_id, .. } => Some(rule_id),
            ConfigError::CyclicReference { cycle } => cycle.first().map(String::as_str),
            _ => None,
        }
    }

    /// Converts this error to a JSON-serializable response object
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
                rule_id: self.rule_id().map(str::to_string),
            },
        }
    }
}

/// JSON-serializable error response for operator tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "DUPLICATE_RULE_ID")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
    /// Offending rule, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}
