//! Compiled patterns
//!
//! Patterns are compiled once, at registry build time. A pattern that does not
//! compile is a configuration error, never a match-time surprise.

use glob::MatchOptions;
use regex::Regex;

use crate::error::{ConfigError, Result};
use crate::rules::{GroupDefinition, GroupMode, PatternDefinition, PatternKind};

/// Glob options: `*` and `?` stay within one path segment, `**` crosses them
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
enum Compiled {
    Prefix(String),
    Glob {
        pattern: glob::Pattern,
        /// Patterns without a separator also match the file name alone
        basename: bool,
    },
    Regex(Regex),
}

/// A single, compiled matchable condition
#[derive(Debug, Clone)]
pub struct Pattern {
    kind: PatternKind,
    value: String,
    compiled: Compiled,
}

impl Pattern {
    /// Compile a pattern definition for the given rule
    ///
    /// Path kinds are trimmed; a regex is compiled exactly as written.
    pub fn compile(rule_id: &str, definition: &PatternDefinition) -> Result<Self> {
        let mut value = definition.value.trim();
        if value.is_empty() {
            return Err(ConfigError::EmptyPattern {
                rule_id: rule_id.to_string(),
                kind: definition.kind.to_string(),
            });
        }

        let compiled = match definition.kind {
            PatternKind::PathPrefix => {
                let prefix = normalize_path(value);
                if prefix.is_empty() {
                    return Err(ConfigError::EmptyPattern {
                        rule_id: rule_id.to_string(),
                        kind: definition.kind.to_string(),
                    });
                }
                Compiled::Prefix(prefix.to_string())
            }
            PatternKind::PathGlob => {
                let glob_value = normalize_path(value);
                let pattern =
                    glob::Pattern::new(glob_value).map_err(|e| ConfigError::InvalidGlob {
                        rule_id: rule_id.to_string(),
                        pattern: value.to_string(),
                        reason: e.to_string(),
                    })?;
                Compiled::Glob {
                    pattern,
                    basename: !glob_value.contains('/'),
                }
            }
            PatternKind::SymbolRegex => {
                value = definition.value.as_str();
                let regex = Regex::new(value).map_err(|e| ConfigError::InvalidRegex {
                    rule_id: rule_id.to_string(),
                    pattern: value.to_string(),
                    reason: e.to_string(),
                })?;
                Compiled::Regex(regex)
            }
        };

        Ok(Self {
            kind: definition.kind,
            value: value.to_string(),
            compiled,
        })
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// The pattern as written in configuration (trimmed for path kinds)
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Test this pattern against one signal string
    ///
    /// Path kinds expect a normalized path; regexes search anywhere in the
    /// string.
    pub fn is_match(&self, signal: &str) -> bool {
        match &self.compiled {
            Compiled::Prefix(prefix) => prefix_matches(prefix, signal),
            Compiled::Glob { pattern, basename } => {
                pattern.matches_with(signal, GLOB_OPTIONS)
                    || (*basename && pattern.matches_with(file_name(signal), GLOB_OPTIONS))
            }
            Compiled::Regex(regex) => regex.is_match(signal),
        }
    }

    pub fn to_definition(&self) -> PatternDefinition {
        PatternDefinition::new(self.kind, self.value.clone())
    }
}

/// A compiled pattern group
#[derive(Debug, Clone)]
pub struct PatternGroup {
    mode: GroupMode,
    patterns: Vec<Pattern>,
}

impl PatternGroup {
    /// Compile a group definition; empty groups are rejected
    pub fn compile(rule_id: &str, definition: &GroupDefinition) -> Result<Self> {
        if definition.patterns.is_empty() {
            return Err(ConfigError::EmptyGroup {
                rule_id: rule_id.to_string(),
            });
        }

        let patterns = definition
            .patterns
            .iter()
            .map(|p| Pattern::compile(rule_id, p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            mode: definition.mode,
            patterns,
        })
    }

    /// A single OR group over the given patterns
    pub fn any_of(rule_id: &str, patterns: &[PatternDefinition]) -> Result<Self> {
        Self::compile(rule_id, &GroupDefinition::any(patterns.to_vec()))
    }

    pub fn mode(&self) -> GroupMode {
        self.mode
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

/// Strip the decorations diff tools and humans put in front of repo paths
pub(crate) fn normalize_path(path: &str) -> &str {
    let mut path = path.trim();
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else {
            return path;
        }
    }
}

/// Segment-aware prefix test
///
/// A prefix ending in `/` names a directory. Any other prefix matches the
/// exact path or the path followed by a separator, so `net` never matches
/// `network/foo.c`.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix.ends_with('/') {
        return path.starts_with(prefix);
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
