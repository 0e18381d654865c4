//! Guide Registry implementation

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::{ConfigError, Result};
use crate::rules::{Activation, RuleDefinition, RuleSetManifest};

use super::pattern::PatternGroup;

/// A compiled reference from a rule to one of its sub-guides
#[derive(Debug, Clone)]
pub struct ChildRef {
    id: String,
    index: usize,
    condition: Vec<PatternGroup>,
}

impl ChildRef {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Position of the referenced rule in the registry
    pub fn index(&self) -> usize {
        self.index
    }

    /// Additional predicate; empty means unconditional
    pub fn condition(&self) -> &[PatternGroup] {
        &self.condition
    }

    pub fn is_unconditional(&self) -> bool {
        self.condition.is_empty()
    }
}

/// A compiled guide entry
#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    document: Option<String>,
    description: Option<String>,
    activation: Activation,
    groups: Vec<PatternGroup>,
    children: Vec<ChildRef>,
    is_root: bool,
}

impl Rule {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Document location hint for the downstream store
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn groups(&self) -> &[PatternGroup] {
        &self.groups
    }

    pub fn children(&self) -> &[ChildRef] {
        &self.children
    }

    /// Whether no other rule references this one as a child
    pub fn is_root(&self) -> bool {
        self.is_root
    }
}

/// The immutable set of all rules
///
/// Built once from configuration and shared read-only afterwards. Lookup by
/// id is O(1); iteration always follows definition order.
#[derive(Debug)]
pub struct Registry {
    name: String,
    rules: Vec<Rule>,
    by_id: HashMap<String, usize>,
    roots: Vec<usize>,
    fingerprint: String,
    built_at: DateTime<Utc>,
}

impl Registry {
    /// Build a registry from rule definitions
    ///
    /// Fails on an empty or duplicate id, a pattern that does not compile,
    /// a child reference to an unknown id, or a cyclic child graph.
    pub fn build(definitions: Vec<RuleDefinition>) -> Result<Self> {
        Self::build_named("unnamed", definitions)
    }

    /// Build a registry from a loaded manifest
    pub fn from_manifest(manifest: RuleSetManifest) -> Result<Self> {
        Self::build_named(&manifest.name, manifest.rules)
    }

    fn build_named(name: &str, definitions: Vec<RuleDefinition>) -> Result<Self> {
        let fingerprint = fingerprint(&definitions)?;

        // Index ids
        let mut by_id = HashMap::with_capacity(definitions.len());
        for (index, definition) in definitions.iter().enumerate() {
            if definition.id.trim().is_empty() {
                return Err(ConfigError::EmptyRuleId { index });
            }
            if by_id.insert(definition.id.clone(), index).is_some() {
                return Err(ConfigError::DuplicateRuleId {
                    rule_id: definition.id.clone(),
                });
            }
        }

        // Resolve child references
        let mut child_indices = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            let mut indices = Vec::with_capacity(definition.children.len());
            for child in &definition.children {
                let index = by_id.get(child.id()).copied().ok_or_else(|| {
                    ConfigError::UnknownChildReference {
                        rule_id: definition.id.clone(),
                        child_id: child.id().to_string(),
                    }
                })?;
                indices.push(index);
            }
            child_indices.push(indices);
        }

        if let Some(cycle) = find_cycle(&definitions, &child_indices) {
            return Err(ConfigError::CyclicReference { cycle });
        }

        let mut referenced = vec![false; definitions.len()];
        for &index in child_indices.iter().flatten() {
            referenced[index] = true;
        }

        // Compile
        let mut rules = Vec::with_capacity(definitions.len());
        for ((definition, indices), is_child) in definitions
            .into_iter()
            .zip(child_indices)
            .zip(referenced)
        {
            let groups = definition
                .effective_groups()
                .iter()
                .map(|g| PatternGroup::compile(&definition.id, g))
                .collect::<Result<Vec<_>>>()?;

            let children = definition
                .children
                .iter()
                .zip(indices)
                .map(|(child, index)| -> Result<ChildRef> {
                    let condition = if child.condition().is_empty() {
                        vec![]
                    } else {
                        vec![PatternGroup::any_of(&definition.id, child.condition())?]
                    };
                    Ok(ChildRef {
                        id: child.id().to_string(),
                        index,
                        condition,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            rules.push(Rule {
                id: definition.id,
                document: definition.document,
                description: definition.description,
                activation: definition.activation,
                groups,
                children,
                is_root: !is_child,
            });
        }

        let roots: Vec<usize> = rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.is_root)
            .map(|(index, _)| index)
            .collect();

        tracing::debug!(
            registry = name,
            rules = rules.len(),
            roots = roots.len(),
            fingerprint = %&fingerprint[..12],
            "built guide registry"
        );

        Ok(Self {
            name: name.to_string(),
            rules,
            by_id,
            roots,
            fingerprint,
            built_at: Utc::now(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a rule by id
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.by_id.get(id).map(|&index| &self.rules[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Position of a rule in definition order
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub(crate) fn rule_at(&self, index: usize) -> &Rule {
        &self.rules[index]
    }

    /// Rules no other rule references, in definition order
    pub fn roots(&self) -> impl Iterator<Item = &Rule> {
        self.roots.iter().map(move |&index| &self.rules[index])
    }

    /// All rules in definition order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// SHA-256 (hex) of the definitions this registry was built from
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

fn fingerprint(definitions: &[RuleDefinition]) -> Result<String> {
    let canonical = serde_json::to_vec(definitions)?;
    Ok(hex::encode(Sha256::digest(&canonical)))
}

/// Find a cycle in the child graph, returned as the id path that closes it
///
/// `children[i]` lists the child indices of `definitions[i]`. Traversal
/// follows definition order, so the reported cycle is deterministic.
pub(crate) fn find_cycle(
    definitions: &[RuleDefinition],
    children: &[Vec<usize>],
) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; definitions.len()];
    // (node, position of the next child to visit)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for start in 0..definitions.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        marks[start] = Mark::OnStack;
        stack.push((start, 0));

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let Some(&child) = children[node].get(next) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match marks[child] {
                Mark::OnStack => {
                    let from = stack.iter().position(|&(n, _)| n == child).unwrap_or(0);
                    let cycle = stack[from..]
                        .iter()
                        .map(|&(n, _)| n)
                        .chain(std::iter::once(child))
                        .map(|index| definitions[index].id.clone())
                        .collect();
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    marks[child] = Mark::OnStack;
                    stack.push((child, 0));
                }
                Mark::Done => {}
            }
        }
    }

    None
}
