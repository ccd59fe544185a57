//! Transitive exclude rules carried along dependency edges.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::module::ModuleId;

/// A single exclude rule: an entire group, or one module within a group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExcludeSpec {
    pub group: String,
    pub module: Option<String>,
}

impl ExcludeSpec {
    pub fn group(group: &str) -> Self {
        Self {
            group: group.to_string(),
            module: None,
        }
    }

    pub fn module(group: &str, module: &str) -> Self {
        Self {
            group: group.to_string(),
            module: Some(module.to_string()),
        }
    }

    pub fn matches(&self, id: &ModuleId) -> bool {
        self.group == id.group && self.module.as_deref().is_none_or(|m| m == id.name)
    }
}

/// Accumulated exclude rules at a point in the graph.
///
/// Rules union along a single dependency chain (an exclusion declared
/// anywhere on the path applies below it) and intersect across distinct
/// incoming paths (a module is only excluded from a node if every path to
/// that node excludes it).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeSet {
    specs: BTreeSet<ExcludeSpec>,
}

impl ExcludeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs(specs: impl IntoIterator<Item = ExcludeSpec>) -> Self {
        Self {
            specs: specs.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn excludes(&self, id: &ModuleId) -> bool {
        self.specs.iter().any(|s| s.matches(id))
    }

    /// Rules from both sets, for extending a chain by one edge.
    pub fn union(&self, other: &ExcludeSet) -> ExcludeSet {
        ExcludeSet {
            specs: self.specs.union(&other.specs).cloned().collect(),
        }
    }

    /// Rules common to every set, for merging multiple incoming paths.
    /// An empty iterator yields the empty set: no incoming path, nothing
    /// excluded.
    pub fn intersect_all<'a>(sets: impl IntoIterator<Item = &'a ExcludeSet>) -> ExcludeSet {
        let mut iter = sets.into_iter();
        let Some(first) = iter.next() else {
            return ExcludeSet::new();
        };
        let mut specs = first.specs.clone();
        for set in iter {
            specs = specs.intersection(&set.specs).cloned().collect();
            if specs.is_empty() {
                break;
            }
        }
        ExcludeSet { specs }
    }
}
