//! Router facade
//!
//! Owns the published registry snapshot and is the only entry point callers
//! need. Each `route()` call clones the current `Arc<Registry>` under a short
//! read lock and resolves against that snapshot, so a concurrent `reload()`
//! never changes the registry underneath an in-flight request.

use std::sync::{Arc, PoisonError, RwLock};

use crate::context::{MatcherOptions, Registry};
use crate::error::Result;
use crate::rules::RuleDefinition;

use super::request::ChangeContext;
use super::resolution::ResolvedResult;
use super::resolver::Resolver;

/// Thread-safe routing entry point
///
/// ```rust
/// use cgr_core::{ChangeContext, Router, RuleDefinition};
///
/// let router = Router::from_definitions(vec![
///     RuleDefinition::new("Locking")
///         .path_prefix("kernel/locking/")
///         .symbol_regex("spin_lock.*|mutex_.*"),
/// ])
/// .unwrap();
///
/// let result = router.route(&ChangeContext::new().with_path("kernel/locking/mutex.c"));
/// assert_eq!(result.documents, vec!["Locking"]);
/// ```
#[derive(Debug)]
pub struct Router {
    registry: RwLock<Arc<Registry>>,
    resolver: Resolver,
}

impl Router {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            resolver: Resolver::new(),
        }
    }

    /// Build the registry and wrap it in a router
    pub fn from_definitions(definitions: Vec<RuleDefinition>) -> Result<Self> {
        Ok(Self::new(Registry::build(definitions)?))
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_matcher_options(self, options: MatcherOptions) -> Self {
        self.with_resolver(Resolver::with_options(options))
    }

    /// The currently published registry snapshot
    pub fn registry(&self) -> Arc<Registry> {
        // The guarded value is only ever replaced whole, so a poisoned lock
        // still holds a complete registry.
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Compute the guides relevant to a change
    pub fn route(&self, context: &ChangeContext) -> ResolvedResult {
        let registry = self.registry();

        if context.request_count() > 0
            && !context.explicit_requests().any(|id| registry.contains(id))
        {
            tracing::warn!(
                requests = context.request_count(),
                "none of the explicit requests name a known rule"
            );
        }

        let result = self.resolver.resolve(&registry, context);

        for warning in &result.warnings {
            tracing::warn!(
                request_id = %result.request_id,
                code = warning.code(),
                rule_id = warning.rule_id(),
                "{}",
                warning
            );
        }

        tracing::debug!(
            request_id = %result.request_id,
            paths = context.path_count(),
            symbols = context.symbol_count(),
            documents = result.documents.len(),
            "routed change"
        );

        result
    }

    /// Publish a new registry, returning the one it replaced
    ///
    /// Requests already holding the old snapshot finish against it.
    pub fn reload(&self, registry: Registry) -> Arc<Registry> {
        let next = Arc::new(registry);
        let mut published = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        tracing::info!(
            from = %short(published.fingerprint()),
            to = %short(next.fingerprint()),
            rules = next.len(),
            "reloaded guide registry"
        );

        std::mem::replace(&mut *published, next)
    }

    /// Build a registry from definitions and publish it
    ///
    /// On a build error the current registry stays published.
    pub fn reload_from(&self, definitions: Vec<RuleDefinition>) -> Result<Arc<Registry>> {
        let registry = Registry::build(definitions)?;
        Ok(self.reload(registry))
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
