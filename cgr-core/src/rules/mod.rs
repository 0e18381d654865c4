//! Rule sets - the declarative guide configuration
//!
//! A rule set lists every guide the router knows about: its id, the
//! patterns that select it, when it is evaluated, and the sub-guides it
//! pulls in.
//!
//! ```json
//! {
//!   "ruleset_version": "1.0",
//!   "name": "kernel-guides",
//!   "rules": [
//!     {
//!       "id": "Locking",
//!       "document": "locking.md",
//!       "patterns": [
//!         {"kind": "path_prefix", "value": "kernel/locking/"},
//!         {"kind": "symbol_regex", "value": "spin_lock.*|mutex_.*"}
//!       ],
//!       "children": ["lockdep", {"id": "rt-mutex", "when": [{"kind": "symbol_regex", "value": "^rt_mutex_"}]}]
//!     }
//!   ]
//! }
//! ```

mod loader;
mod manifest;
mod validator;

pub use loader::RuleSetLoader;
pub use manifest::{
    Activation, ChildDefinition, GroupDefinition, GroupMode, PatternDefinition, PatternKind,
    RuleDefinition, RuleSetManifest,
};
pub use validator::{RuleSetValidator, ValidationIssue, ValidationResult};

/// Rule set format version
pub const VERSION: &str = "1.0";
