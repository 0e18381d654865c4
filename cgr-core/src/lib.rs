//! # CGR Core - Contextual Guide Router
//!
//! Given a description of a code change (touched paths and symbols), CGR
//! decides which domain guides are relevant and returns them as an ordered,
//! deduplicated list of guide ids.
//!
//! - **Rules**: declarative guide configuration (patterns, activation,
//!   sub-guides), loaded and validated from JSON
//! - **Registry**: the compiled, immutable routing table
//! - **Router**: the thread-safe entry point, with atomic registry reload
//!
//! Guide content is never read here; a downstream store fetches documents
//! by id.
//!
//! ## Example
//!
//! ```rust
//! use cgr_core::{ChangeContext, RuleSetLoader, Router};
//!
//! let rules = r#"{
//!     "ruleset_version": "1.0",
//!     "name": "kernel-guides",
//!     "rules": [
//!         {
//!             "id": "Locking",
//!             "patterns": [
//!                 {"kind": "path_prefix", "value": "kernel/locking/"},
//!                 {"kind": "symbol_regex", "value": "spin_lock.*|mutex_.*"}
//!             ],
//!             "children": ["lockdep"]
//!         },
//!         {"id": "lockdep"},
//!         {
//!             "id": "Tracing",
//!             "patterns": [
//!                 {"kind": "path_prefix", "value": "kernel/trace/"},
//!                 {"kind": "symbol_regex", "value": "trace_.*"}
//!             ]
//!         }
//!     ]
//! }"#;
//!
//! let registry = RuleSetLoader::new().load_registry_from_json(rules).unwrap();
//! let router = Router::new(registry);
//!
//! let change = ChangeContext::new()
//!     .with_path("kernel/locking/mutex.c")
//!     .with_symbol("mutex_lock");
//! let result = router.route(&change);
//!
//! assert_eq!(result.documents, vec!["Locking", "lockdep"]);
//! assert!(result.warnings.is_empty());
//! ```

pub mod context;
pub mod error;
pub mod routing;
pub mod rules;

// Re-export main types
pub use context::{ContextMatcher, MatchedPattern, MatcherOptions, Registry, Rule, SignalKind};
pub use error::{ConfigError, ErrorCategory, ErrorDetail, ErrorResponse, Result};
pub use routing::{
    ChangeContext, InclusionReason, ResolvedResult, Resolver, RouteWarning, Router, TraceEntry,
};
pub use rules::{
    Activation, ChildDefinition, GroupDefinition, GroupMode, PatternDefinition, PatternKind,
    RuleDefinition, RuleSetLoader, RuleSetManifest, RuleSetValidator,
};

/// Rule set format version
pub const RULESET_VERSION: &str = rules::VERSION;
