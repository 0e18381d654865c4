//! Resolver - computes the guide closure for one change
//!
//! 1. Walk every rule in definition order; `on_request` rules are only
//!    evaluated when explicitly requested. Sub-guides are evaluated on their
//!    own patterns here too.
//! 2. Every matching rule is appended to the document list.
//! 3. Children of included rules are processed breadth-first. A conditional
//!    child is included only when its own predicate holds.
//!
//! The included set is a bitmap over registry indices, so a rule reachable
//! from several parents is listed once, at its first discovery.

use std::collections::VecDeque;

use chrono::Utc;
use uuid::Uuid;

use crate::context::{ChildRef, ContextMatcher, MatcherOptions, Registry};
use crate::rules::Activation;

use super::request::ChangeContext;
use super::resolution::{InclusionReason, ResolvedResult, RouteWarning, TraceEntry};

/// Stateless resolution engine
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    matcher: ContextMatcher,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matcher(matcher: ContextMatcher) -> Self {
        Self { matcher }
    }

    pub fn with_options(options: MatcherOptions) -> Self {
        Self::with_matcher(ContextMatcher::with_options(options))
    }

    pub fn matcher(&self) -> &ContextMatcher {
        &self.matcher
    }

    /// Resolve the ordered, deduplicated document list for a change
    ///
    /// Never fails: problems with explicit requests are reported as warnings.
    pub fn resolve(&self, registry: &Registry, context: &ChangeContext) -> ResolvedResult {
        let mut included = vec![false; registry.len()];
        let mut documents = Vec::new();
        let mut trace = Vec::new();
        let mut queue: VecDeque<(usize, &ChildRef, usize)> = VecDeque::new();

        // Top-level pass
        for (index, rule) in registry.rules().iter().enumerate() {
            let eligible = match rule.activation() {
                Activation::Always => true,
                Activation::OnRequest => context.is_requested(rule.id()),
            };
            if !eligible {
                continue;
            }

            let Some(pattern) = self.matcher.first_match(rule.groups(), context) else {
                continue;
            };

            included[index] = true;
            documents.push(rule.id().to_string());
            trace.push(TraceEntry {
                rule_id: rule.id().to_string(),
                depth: 0,
                reason: InclusionReason::Matched { pattern },
            });
            queue.extend(rule.children().iter().map(|child| (index, child, 1)));
        }

        // Sub-guide closure
        while let Some((parent, child, depth)) = queue.pop_front() {
            if included[child.index()] {
                continue;
            }

            let pattern = if child.is_unconditional() {
                None
            } else {
                match self.matcher.first_match(child.condition(), context) {
                    Some(pattern) => Some(pattern),
                    None => continue,
                }
            };

            let rule = registry.rule_at(child.index());
            included[child.index()] = true;
            documents.push(rule.id().to_string());
            trace.push(TraceEntry {
                rule_id: rule.id().to_string(),
                depth,
                reason: InclusionReason::Child {
                    parent: registry.rule_at(parent).id().to_string(),
                    pattern,
                },
            });
            queue.extend(
                rule.children()
                    .iter()
                    .map(|grandchild| (child.index(), grandchild, depth + 1)),
            );
        }

        for entry in &trace {
            tracing::trace!(rule_id = %entry.rule_id, depth = entry.depth, "included guide");
        }

        ResolvedResult {
            request_id: Uuid::new_v4().to_string(),
            registry_fingerprint: registry.fingerprint().to_string(),
            documents,
            trace,
            warnings: request_warnings(registry, context, &included),
            resolved_at: Utc::now(),
        }
    }
}

/// Diagnose explicit requests, in request (lexicographic) order
fn request_warnings(
    registry: &Registry,
    context: &ChangeContext,
    included: &[bool],
) -> Vec<RouteWarning> {
    let mut warnings = Vec::new();

    for requested in context.explicit_requests() {
        let Some(index) = registry.index_of(requested) else {
            warnings.push(RouteWarning::UnknownRequest {
                rule_id: requested.to_string(),
            });
            continue;
        };

        if registry.rule_at(index).activation() == Activation::OnRequest && !included[index] {
            warnings.push(RouteWarning::RequestNotMatched {
                rule_id: requested.to_string(),
            });
        }
    }

    warnings
}
