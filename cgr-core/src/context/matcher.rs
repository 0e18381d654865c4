//! Context Matcher - evaluates rule predicates against a change
//!
//! Determines whether a rule applies to a change based on:
//! - Touched paths (`path_prefix`, `path_glob`)
//! - Observed symbols (`symbol_regex`)
//!
//! Symbol regexes are also probed against paths unless
//! [`MatcherOptions::symbol_patterns_probe_paths`] is turned off, since
//! guide trigger lists mix function names and path fragments.

use serde::{Deserialize, Serialize};

use crate::routing::ChangeContext;
use crate::rules::{GroupMode, PatternKind};

use super::pattern::{Pattern, PatternGroup};
use super::registry::Rule;

/// Which half of a change context a signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Path,
    Symbol,
}

/// A pattern that fired, and the signal it fired on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPattern {
    pub kind: PatternKind,
    pub pattern: String,
    pub signal: String,
    pub signal_kind: SignalKind,
}

impl std::fmt::Display for MatchedPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let signal_kind = match self.signal_kind {
            SignalKind::Path => "path",
            SignalKind::Symbol => "symbol",
        };
        write!(
            f,
            "{} '{}' on {} '{}'",
            self.kind, self.pattern, signal_kind, self.signal
        )
    }
}

/// Result of matching a rule against a change context
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    /// Whether the rule applies
    pub matched: bool,
    /// Every pattern that fired, in group then pattern order
    pub matched_patterns: Vec<MatchedPattern>,
}

impl MatchResult {
    /// The pattern reported as the cause of inclusion
    pub fn first(&self) -> Option<&MatchedPattern> {
        self.matched_patterns.first()
    }

    /// Reason for match/no-match
    pub fn reason(&self) -> String {
        match self.first() {
            Some(pattern) if self.matched => format!("matched {}", pattern),
            _ => "no pattern matched".to_string(),
        }
    }
}

/// Matcher tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherOptions {
    /// Probe `symbol_regex` patterns against paths as well as symbols
    pub symbol_patterns_probe_paths: bool,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            symbol_patterns_probe_paths: true,
        }
    }
}

/// Stateless predicate evaluator
#[derive(Debug, Clone, Default)]
pub struct ContextMatcher {
    options: MatcherOptions,
}

impl ContextMatcher {
    /// Create a new matcher with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MatcherOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> MatcherOptions {
        self.options
    }

    /// Evaluate a rule's predicate, collecting every pattern that fired
    pub fn matches(&self, rule: &Rule, context: &ChangeContext) -> MatchResult {
        self.evaluate(rule.groups(), context)
    }

    /// Evaluate a list of groups (OR across groups), collecting every hit
    pub fn evaluate(&self, groups: &[PatternGroup], context: &ChangeContext) -> MatchResult {
        let mut result = MatchResult::default();

        for group in groups {
            let hits: Vec<MatchedPattern> = group
                .patterns()
                .iter()
                .filter_map(|p| self.probe(p, context))
                .collect();

            let group_matched = match group.mode() {
                GroupMode::Any => !hits.is_empty(),
                GroupMode::All => hits.len() == group.patterns().len(),
            };

            if group_matched {
                result.matched = true;
                result.matched_patterns.extend(hits);
            }
        }

        result
    }

    /// Short-circuiting variant: the first pattern of the first matching group
    ///
    /// Used on the resolution path, where only the cause of inclusion is kept.
    pub fn first_match(
        &self,
        groups: &[PatternGroup],
        context: &ChangeContext,
    ) -> Option<MatchedPattern> {
        groups.iter().find_map(|group| match group.mode() {
            GroupMode::Any => group.patterns().iter().find_map(|p| self.probe(p, context)),
            GroupMode::All => {
                let mut first = None;
                for pattern in group.patterns() {
                    let hit = self.probe(pattern, context)?;
                    first.get_or_insert(hit);
                }
                first
            }
        })
    }

    /// Test one pattern against the relevant signals, returning the first hit
    fn probe(&self, pattern: &Pattern, context: &ChangeContext) -> Option<MatchedPattern> {
        let hit = |signal: &str, signal_kind: SignalKind| MatchedPattern {
            kind: pattern.kind(),
            pattern: pattern.value().to_string(),
            signal: signal.to_string(),
            signal_kind,
        };

        if pattern.kind().is_path_kind() {
            return context
                .paths()
                .find(|path| pattern.is_match(path))
                .map(|path| hit(path, SignalKind::Path));
        }

        if let Some(symbol) = context.symbols().find(|s| pattern.is_match(s)) {
            return Some(hit(symbol, SignalKind::Symbol));
        }

        if self.options.symbol_patterns_probe_paths {
            return context
                .paths()
                .find(|path| pattern.is_match(path))
                .map(|path| hit(path, SignalKind::Path));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{GroupDefinition, PatternDefinition};

    fn group(defs: Vec<PatternDefinition>) -> Vec<PatternGroup> {
        vec![PatternGroup::compile("test", &GroupDefinition::any(defs)).unwrap()]
    }

    #[test]
    fn test_symbol_matching() {
        let matcher = ContextMatcher::new();
        let groups = group(vec![PatternDefinition::symbol_regex("spin_lock.*")]);

        let ctx = ChangeContext::new().with_symbol("spin_lock_irqsave");
        let hit = matcher.first_match(&groups, &ctx).unwrap();
        assert_eq!(hit.signal, "spin_lock_irqsave");
        assert_eq!(hit.signal_kind, SignalKind::Symbol);

        let ctx = ChangeContext::new().with_symbol("mutex_lock");
        assert!(matcher.first_match(&groups, &ctx).is_none());
    }

    #[test]
    fn test_symbol_regex_probes_paths() {
        let groups = group(vec![PatternDefinition::symbol_regex("bpf")]);
        let ctx = ChangeContext::new().with_path("kernel/bpf/verifier.c");

        let hit = ContextMatcher::new().first_match(&groups, &ctx).unwrap();
        assert_eq!(hit.signal_kind, SignalKind::Path);

        let strict = ContextMatcher::with_options(MatcherOptions {
            symbol_patterns_probe_paths: false,
        });
        assert!(strict.first_match(&groups, &ctx).is_none());
    }

    #[test]
    fn test_path_patterns_ignore_symbols() {
        let groups = group(vec![PatternDefinition::path_prefix("net/")]);
        let ctx = ChangeContext::new().with_symbol("net/core");
        assert!(ContextMatcher::new().first_match(&groups, &ctx).is_none());
    }

    #[test]
    fn test_all_group_requires_every_pattern() {
        let groups = vec![PatternGroup::compile(
            "test",
            &GroupDefinition::all(vec![
                PatternDefinition::path_prefix("drivers/net/"),
                PatternDefinition::symbol_regex("^napi_"),
            ]),
        )
        .unwrap()];
        let matcher = ContextMatcher::new();

        let only_path = ChangeContext::new().with_path("drivers/net/e1000/main.c");
        assert!(matcher.first_match(&groups, &only_path).is_none());
        assert!(!matcher.evaluate(&groups, &only_path).matched);

        let both = only_path.clone().with_symbol("napi_poll");
        let hit = matcher.first_match(&groups, &both).unwrap();
        assert_eq!(hit.kind, PatternKind::PathPrefix);

        let result = matcher.evaluate(&groups, &both);
        assert!(result.matched);
        assert_eq!(result.matched_patterns.len(), 2);
    }

    #[test]
    fn test_evaluate_collects_all_hits() {
        let groups = group(vec![
            PatternDefinition::path_prefix("kernel/locking/"),
            PatternDefinition::symbol_regex("mutex_.*"),
            PatternDefinition::symbol_regex("rcu_.*"),
        ]);
        let ctx = ChangeContext::new()
            .with_path("kernel/locking/mutex.c")
            .with_symbol("mutex_lock");

        let result = ContextMatcher::new().evaluate(&groups, &ctx);
        assert!(result.matched);
        assert_eq!(result.matched_patterns.len(), 2);
        assert!(result.reason().contains("kernel/locking/"));
    }

    #[test]
    fn test_no_match_reason() {
        let groups = group(vec![PatternDefinition::path_prefix("mm/")]);
        let result = ContextMatcher::new().evaluate(&groups, &ChangeContext::new());
        assert!(!result.matched);
        assert_eq!(result.reason(), "no pattern matched");
    }
}
