//! Guide Registry and Matcher - the routing table
//!
//! The registry holds every compiled rule; the matcher decides whether a
//! rule's predicate holds for one change.
//!
//! ## Architecture
//!
//! ```text
//! RuleSetManifest (rules[])        ChangeContext (paths, symbols)
//!         │                                 │
//!         ▼                                 ▼
//!    ┌──────────────────────────────────────────┐
//!    │              Registry                    │
//!    │                                          │
//!    │  1. Compile patterns (fail fast)         │
//!    │  2. Resolve child references by index    │
//!    │  3. Reject duplicate ids and cycles      │
//!    │  4. Record roots in definition order     │
//!    └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//!         ContextMatcher (per rule / per child)
//! ```

mod matcher;
mod pattern;
mod registry;

pub use matcher::{ContextMatcher, MatchResult, MatchedPattern, MatcherOptions, SignalKind};
pub use pattern::{Pattern, PatternGroup};
pub use registry::{ChildRef, Registry, Rule};

pub(crate) use pattern::normalize_path;
pub(crate) use registry::find_cycle;
