//! Routing result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::MatchedPattern;

/// Why a document was included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum InclusionReason {
    /// A rule whose own predicate matched in the top-level pass
    Matched { pattern: MatchedPattern },
    /// A sub-guide pulled in by an included parent
    Child {
        parent: String,
        /// The narrower predicate that held; `None` for unconditional children
        #[serde(skip_serializing_if = "Option::is_none")]
        pattern: Option<MatchedPattern>,
    },
}

/// Trace record for one included document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub rule_id: String,
    /// 0 for direct matches, parent depth + 1 for sub-guides
    pub depth: usize,
    pub reason: InclusionReason,
}

impl TraceEntry {
    /// The pattern that caused inclusion, if one did
    pub fn pattern(&self) -> Option<&MatchedPattern> {
        match &self.reason {
            InclusionReason::Matched { pattern } => Some(pattern),
            InclusionReason::Child { pattern, .. } => pattern.as_ref(),
        }
    }

    pub fn parent(&self) -> Option<&str> {
        match &self.reason {
            InclusionReason::Matched { .. } => None,
            InclusionReason::Child { parent, .. } => Some(parent),
        }
    }
}

/// Non-fatal conditions reported alongside a routing result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteWarning {
    /// An explicit request named a rule that does not exist
    UnknownRequest { rule_id: String },
    /// An explicitly requested rule was evaluated but none of its patterns matched
    RequestNotMatched { rule_id: String },
}

impl RouteWarning {
    /// Stable code for logging and client handling
    pub fn code(&self) -> &'static str {
        match self {
            RouteWarning::UnknownRequest { .. } => "UNKNOWN_REQUEST",
            RouteWarning::RequestNotMatched { .. } => "REQUEST_NOT_MATCHED",
        }
    }

    pub fn rule_id(&self) -> &str {
        match self {
            RouteWarning::UnknownRequest { rule_id }
            | RouteWarning::RequestNotMatched { rule_id } => rule_id,
        }
    }
}

impl std::fmt::Display for RouteWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteWarning::UnknownRequest { rule_id } => {
                write!(f, "Explicit request '{}' does not name a known rule", rule_id)
            }
            RouteWarning::RequestNotMatched { rule_id } => write!(
                f,
                "Explicitly requested rule '{}' did not match this change",
                rule_id
            ),
        }
    }
}

/// The ordered, deduplicated set of guides for one change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedResult {
    /// Correlation id for logs
    pub request_id: String,

    /// Fingerprint of the registry snapshot that produced this result
    pub registry_fingerprint: String,

    /// Distinct rule ids in discovery order
    pub documents: Vec<String>,

    /// One entry per document, same order
    pub trace: Vec<TraceEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RouteWarning>,

    pub resolved_at: DateTime<Utc>,
}

impl ResolvedResult {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.documents.iter().any(|d| d == rule_id)
    }

    /// Position of a document in presentation order
    pub fn position(&self, rule_id: &str) -> Option<usize> {
        self.documents.iter().position(|d| d == rule_id)
    }

    pub fn trace_for(&self, rule_id: &str) -> Option<&TraceEntry> {
        self.trace.iter().find(|t| t.rule_id == rule_id)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SignalKind;
    use crate::rules::PatternKind;

    fn sample() -> ResolvedResult {
        let pattern = MatchedPattern {
            kind: PatternKind::PathPrefix,
            pattern: "kernel/locking/".to_string(),
            signal: "kernel/locking/mutex.c".to_string(),
            signal_kind: SignalKind::Path,
        };

        ResolvedResult {
            request_id: "req-1".to_string(),
            registry_fingerprint: "abc".to_string(),
            documents: vec!["Locking".to_string(), "lockdep".to_string()],
            trace: vec![
                TraceEntry {
                    rule_id: "Locking".to_string(),
                    depth: 0,
                    reason: InclusionReason::Matched { pattern },
                },
                TraceEntry {
                    rule_id: "lockdep".to_string(),
                    depth: 1,
                    reason: InclusionReason::Child {
                        parent: "Locking".to_string(),
                        pattern: None,
                    },
                },
            ],
            warnings: vec![RouteWarning::UnknownRequest {
                rule_id: "ghost".to_string(),
            }],
            resolved_at: Utc::now(),
        }
    }

    #[test]
    fn test_lookup_helpers() {
        let result = sample();
        assert!(result.contains("lockdep"));
        assert_eq!(result.position("lockdep"), Some(1));
        assert_eq!(result.trace_for("lockdep").unwrap().parent(), Some("Locking"));
        assert!(result.trace_for("lockdep").unwrap().pattern().is_none());
        assert_eq!(
            result.trace_for("Locking").unwrap().pattern().unwrap().signal,
            "kernel/locking/mutex.c"
        );
    }

    #[test]
    fn test_result_serialization() {
        let result = sample();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["documents"][0], "Locking");
        assert_eq!(json["trace"][0]["reason"]["via"], "matched");
        assert_eq!(json["trace"][1]["reason"]["via"], "child");
        assert_eq!(json["warnings"][0]["type"], "unknown_request");

        let parsed: ResolvedResult = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.documents, result.documents);
        assert_eq!(parsed.trace, result.trace);
    }

    #[test]
    fn test_warning_codes_and_messages() {
        let warning = RouteWarning::RequestNotMatched {
            rule_id: "lockdep".to_string(),
        };
        assert_eq!(warning.code(), "REQUEST_NOT_MATCHED");
        assert_eq!(warning.rule_id(), "lockdep");
        assert!(warning.to_string().contains("lockdep"));
    }
}
