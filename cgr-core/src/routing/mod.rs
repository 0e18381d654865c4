//! Routing - from a change description to an ordered guide list
//!
//! ## Flow
//!
//! ```text
//! ChangeContext ──► Router::route ──► Resolver::resolve ──► ResolvedResult
//!                      │                   │
//!                      │ Arc<Registry>     ├─ every rule (definition order)
//!                      │ snapshot          └─ sub-guides (breadth-first)
//! ```
//!
//! Routing never fails once a registry is built. Problems with explicit
//! requests come back as [`RouteWarning`]s on the result.

mod request;
mod resolution;
mod resolver;
mod router;

pub use request::ChangeContext;
pub use resolution::{InclusionReason, ResolvedResult, RouteWarning, TraceEntry};
pub use resolver::Resolver;
pub use router::Router;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleDefinition;

    #[test]
    fn test_diff_to_documents() {
        let router = Router::from_definitions(vec![
            RuleDefinition::new("Locking")
                .path_prefix("kernel/locking/")
                .symbol_regex("spin_lock.*|mutex_.*"),
            RuleDefinition::new("Mm").path_prefix("mm/"),
        ])
        .unwrap();

        let diff = "\
diff --git a/kernel/locking/spinlock.c b/kernel/locking/spinlock.c
--- a/kernel/locking/spinlock.c
+++ b/kernel/locking/spinlock.c
@@ -10,3 +10,3 @@ void _raw_spin_lock(raw_spinlock_t *lock)
 \tpreempt_disable();
-\told();
+\tnew();
 }
";
        let result = router.route(&ChangeContext::from_unified_diff(diff));
        assert_eq!(result.documents, vec!["Locking"]);
    }
}
