//! Component and dependency metadata as returned by resolvers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::exclude::ExcludeSpec;
use crate::module::{ModuleId, ModuleVersionId};

/// What a dependency declaration points at: a module plus the requested
/// version requirement, before any substitution or resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentSelector {
    pub module: ModuleId,
    pub requirement: String,
}

impl ComponentSelector {
    pub fn new(group: &str, name: &str, requirement: &str) -> Self {
        Self {
            module: ModuleId::new(group, name),
            requirement: requirement.to_string(),
        }
    }
}

impl fmt::Display for ComponentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.requirement)
    }
}

/// One declared dependency of a configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyMetadata {
    pub selector: ComponentSelector,
    /// Versions vetoed by this declaration.
    #[serde(default)]
    pub reject: Option<String>,
    /// Exclude rules this declaration adds to its subtree.
    #[serde(default)]
    pub excludes: Vec<ExcludeSpec>,
    /// A constraint-only declaration: it narrows versions but does not by
    /// itself pull the target module into the graph.
    #[serde(default)]
    pub constraint: bool,
    /// Declared with `force`; dominates version conflicts when it sits on a
    /// direct edge of the root.
    #[serde(default)]
    pub force: bool,
    /// Explicit target configuration, bypassing attribute matching.
    #[serde(default)]
    pub target_configuration: Option<String>,
    /// Attributes requested from the target when matching variants.
    #[serde(default)]
    pub attributes: Attributes,
}

impl DependencyMetadata {
    pub fn new(group: &str, name: &str, requirement: &str) -> Self {
        Self {
            selector: ComponentSelector::new(group, name, requirement),
            reject: None,
            excludes: Vec::new(),
            constraint: false,
            force: false,
            target_configuration: None,
            attributes: Attributes::empty(),
        }
    }

    pub fn constraint(group: &str, name: &str, requirement: &str) -> Self {
        Self {
            constraint: true,
            ..Self::new(group, name, requirement)
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn rejecting(mut self, reject: &str) -> Self {
        self.reject = Some(reject.to_string());
        self
    }

    pub fn excluding(mut self, spec: ExcludeSpec) -> Self {
        self.excludes.push(spec);
        self
    }

    pub fn to_configuration(mut self, name: &str) -> Self {
        self.target_configuration = Some(name.to_string());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// A named variant of a component: attributes plus declared dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationMetadata {
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub dependencies: Vec<DependencyMetadata>,
}

impl ConfigurationMetadata {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Attributes::empty(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(name: &str, dependencies: Vec<DependencyMetadata>) -> Self {
        Self {
            name: name.to_string(),
            attributes: Attributes::empty(),
            dependencies,
        }
    }
}

/// Full metadata for one component: its identity and its configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentMetadata {
    pub id: ModuleVersionId,
    pub configurations: Vec<ConfigurationMetadata>,
}

/// Name of the configuration used when a dependency names no target and no
/// attribute match succeeds.
pub const DEFAULT_CONFIGURATION: &str = "default";

impl ComponentMetadata {
    /// Metadata with a single `default` configuration holding `dependencies`.
    pub fn with_default_configuration(
        id: ModuleVersionId,
        dependencies: Vec<DependencyMetadata>,
    ) -> Self {
        Self {
            id,
            configurations: vec![ConfigurationMetadata::with_dependencies(
                DEFAULT_CONFIGURATION,
                dependencies,
            )],
        }
    }

    pub fn configuration(&self, name: &str) -> Option<&ConfigurationMetadata> {
        self.configurations.iter().find(|c| c.name == name)
    }
}
