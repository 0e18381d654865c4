//! Rule set manifest types

use serde::{Deserialize, Serialize};

use super::VERSION;

/// A complete, declarative rule set as read from configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetManifest {
    /// Rule set format version (always "1.0")
    pub ruleset_version: String,

    /// Human-readable name
    pub name: String,

    /// Description of the rule set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Rule definitions; order is the presentation tie-break
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl RuleSetManifest {
    /// Create an empty manifest at the current format version
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            ruleset_version: VERSION.to_string(),
            name: name.into(),
            description: None,
            rules: vec![],
        }
    }

    /// Append a rule definition
    pub fn rule(mut self, rule: RuleDefinition) -> Self {
        self.rules.push(rule);
        self
    }

    /// Get a rule definition by id
    pub fn get_rule(&self, id: &str) -> Option<&RuleDefinition> {
        self.rules.iter().find(|r| r.id == id)
    }
}

/// The kind of signal a pattern is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Segment-aware path prefix (`net/` matches `net/core/dev.c`, not `network/`)
    PathPrefix,
    /// Shell glob over paths (`*`, `?`, `**`)
    PathGlob,
    /// Regular expression probed against symbols (and paths)
    SymbolRegex,
}

impl PatternKind {
    /// Whether this kind only ever looks at paths
    pub fn is_path_kind(&self) -> bool {
        matches!(self, PatternKind::PathPrefix | PatternKind::PathGlob)
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternKind::PathPrefix => write!(f, "path_prefix"),
            PatternKind::PathGlob => write!(f, "path_glob"),
            PatternKind::SymbolRegex => write!(f, "symbol_regex"),
        }
    }
}

/// A single pattern as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDefinition {
    pub kind: PatternKind,
    pub value: String,
}

impl PatternDefinition {
    pub fn new(kind: PatternKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn path_prefix(value: impl Into<String>) -> Self {
        Self::new(PatternKind::PathPrefix, value)
    }

    pub fn path_glob(value: impl Into<String>) -> Self {
        Self::new(PatternKind::PathGlob, value)
    }

    pub fn symbol_regex(value: impl Into<String>) -> Self {
        Self::new(PatternKind::SymbolRegex, value)
    }

    /// Classify a free-form trigger into a typed pattern
    ///
    /// Index files list triggers as loose text that mixes path fragments and
    /// identifiers. Classification rules, first hit wins:
    ///
    /// - contains regex-only syntax (`.*`, `|`, `^`, `$`, `+`, `(`)
    ///   → `symbol_regex`, even with a `/` (`net/.*sock`)
    /// - ends with `/` → `path_prefix`
    /// - contains a glob metacharacter and either a `/` or a leading `*.`
    ///   → `path_glob`
    /// - contains a `/` and no glob metacharacter → `path_prefix`
    /// - anything else → `symbol_regex`
    pub fn from_trigger(trigger: &str) -> Self {
        let trigger = trigger.trim();
        let has_regex_syntax = trigger.contains(".*")
            || trigger.contains(&['|', '^', '$', '+', '('][..]);
        let has_glob_meta = trigger.contains(&['*', '?', '['][..]);
        let has_separator = trigger.contains('/');

        if has_regex_syntax {
            Self::symbol_regex(trigger)
        } else if trigger.ends_with('/') {
            Self::path_prefix(trigger)
        } else if has_glob_meta && (has_separator || trigger.starts_with("*.")) {
            Self::path_glob(trigger)
        } else if has_separator {
            Self::path_prefix(trigger)
        } else {
            Self::symbol_regex(trigger)
        }
    }
}

/// How the patterns inside a group combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    /// Group matches if any pattern matches
    #[default]
    Any,
    /// Group matches only if every pattern matches
    All,
}

/// A group of patterns; a rule matches if any of its groups matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDefinition {
    #[serde(default)]
    pub mode: GroupMode,
    pub patterns: Vec<PatternDefinition>,
}

impl GroupDefinition {
    pub fn any(patterns: Vec<PatternDefinition>) -> Self {
        Self {
            mode: GroupMode::Any,
            patterns,
        }
    }

    pub fn all(patterns: Vec<PatternDefinition>) -> Self {
        Self {
            mode: GroupMode::All,
            patterns,
        }
    }
}

/// When a rule is evaluated on its own patterns
///
/// Mirrors the guide index's progressive disclosure: most guides load
/// whenever their triggers fire, a few only when a caller asks for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Evaluated for every change context
    #[default]
    Always,
    /// Evaluated only if the caller names the rule in `explicit_requests`
    OnRequest,
}

impl std::fmt::Display for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Activation::Always => write!(f, "always"),
            Activation::OnRequest => write!(f, "on_request"),
        }
    }
}

/// A reference from a rule to one of its sub-guides
///
/// Written either as a bare id (`"B"`, unconditional) or as an object with a
/// narrower predicate (`{"id": "B", "when": [...]}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildDefinition {
    Id(String),
    Conditional {
        id: String,
        #[serde(default)]
        when: Vec<PatternDefinition>,
    },
}

impl ChildDefinition {
    /// Id of the referenced rule
    pub fn id(&self) -> &str {
        match self {
            ChildDefinition::Id(id) => id,
            ChildDefinition::Conditional { id, .. } => id,
        }
    }

    /// Additional predicate; empty means the child is pulled in unconditionally
    pub fn condition(&self) -> &[PatternDefinition] {
        match self {
            ChildDefinition::Id(_) => &[],
            ChildDefinition::Conditional { when, .. } => when,
        }
    }
}

/// A guide entry as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Unique, stable document id
    pub id: String,

    /// Document location hint for the downstream store (e.g. "locking.md")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub activation: Activation,

    /// Typed patterns, each forming its own OR group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<PatternDefinition>,

    /// Explicit pattern groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupDefinition>,

    /// Free-form triggers, classified at load time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<String>,

    /// Sub-guides, in presentation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildDefinition>,
}

impl RuleDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            document: None,
            description: None,
            activation: Activation::Always,
            patterns: vec![],
            groups: vec![],
            triggers: vec![],
            children: vec![],
        }
    }

    pub fn document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn on_request(mut self) -> Self {
        self.activation = Activation::OnRequest;
        self
    }

    pub fn pattern(mut self, pattern: PatternDefinition) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn path_prefix(self, value: impl Into<String>) -> Self {
        self.pattern(PatternDefinition::path_prefix(value))
    }

    pub fn path_glob(self, value: impl Into<String>) -> Self {
        self.pattern(PatternDefinition::path_glob(value))
    }

    pub fn symbol_regex(self, value: impl Into<String>) -> Self {
        self.pattern(PatternDefinition::symbol_regex(value))
    }

    pub fn group(mut self, group: GroupDefinition) -> Self {
        self.groups.push(group);
        self
    }

    pub fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.triggers.push(trigger.into());
        self
    }

    pub fn child(mut self, id: impl Into<String>) -> Self {
        self.children.push(ChildDefinition::Id(id.into()));
        self
    }

    pub fn child_when(mut self, id: impl Into<String>, when: Vec<PatternDefinition>) -> Self {
        self.children.push(ChildDefinition::Conditional {
            id: id.into(),
            when,
        });
        self
    }

    /// All pattern groups in evaluation order
    ///
    /// Flat patterns come first (one group each), then declared groups, then
    /// classified triggers (one group each).
    pub fn effective_groups(&self) -> Vec<GroupDefinition> {
        let flat = self
            .patterns
            .iter()
            .cloned()
            .map(|p| GroupDefinition::any(vec![p]));
        let triggers = self
            .triggers
            .iter()
            .map(|t| GroupDefinition::any(vec![PatternDefinition::from_trigger(t)]));

        flat.chain(self.groups.iter().cloned()).chain(triggers).collect()
    }

    /// Whether this rule has anything to match on
    pub fn has_patterns(&self) -> bool {
        !self.patterns.is_empty() || !self.groups.is_empty() || !self.triggers.is_empty()
    }
}
