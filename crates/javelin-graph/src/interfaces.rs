//! Capability interfaces consumed by the graph builder.
//!
//! A build tool embeds the engine by implementing these traits over its
//! repository, project and cache layers. A single implementation per resolve
//! is the normal case; the engine only ever calls them through dynamic
//! dispatch.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use javelin_core::constraint::VersionConstraint;
use javelin_core::metadata::{ComponentMetadata, ComponentSelector};
use javelin_core::module::{ComponentId, ModuleId, ModuleVersionId};

use crate::options::ResolveContext;

/// A recoverable resolution failure, recorded on the edge or selector that
/// caused it and reported through the visitor.
#[derive(Debug, Clone)]
pub struct ResolveFailure {
    pub message: String,
}

impl ResolveFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of resolving a selector to a concrete component.
#[derive(Debug, Clone)]
pub struct IdResolution {
    /// The chosen version.
    pub version_id: ModuleVersionId,
    /// Resolver-assigned identity; derived from `version_id` when absent.
    pub id: Option<ComponentId>,
    /// Metadata the resolver happened to have on hand. Components resolved
    /// with eager metadata skip the fetch stage entirely.
    pub metadata: Option<ComponentMetadata>,
}

impl IdResolution {
    pub fn of_version(version_id: ModuleVersionId) -> Self {
        Self {
            version_id,
            id: None,
            metadata: None,
        }
    }
}

/// Resolves a dependency selector to a component id. May perform I/O, e.g.
/// to list available versions for a dynamic requirement.
#[async_trait]
pub trait ComponentIdResolver: Send + Sync {
    async fn resolve(
        &self,
        selector: &ComponentSelector,
        constraint: Option<&VersionConstraint>,
    ) -> Result<IdResolution, ResolveFailure>;
}

/// Fetches full component metadata.
#[async_trait]
pub trait ComponentMetadataResolver: Send + Sync {
    /// Answer without I/O whether metadata for `id` is cheap to obtain
    /// (already cached, or a local project). Cheap components are excluded
    /// from parallel prefetching.
    fn is_fetching_metadata_cheap(&self, id: &ComponentId) -> bool;

    /// Fetch full metadata. May perform I/O; called from the parallel fetch
    /// stage as well as serially at attachment time.
    async fn resolve(
        &self,
        id: &ComponentId,
        version_id: &ModuleVersionId,
    ) -> Result<ComponentMetadata, ResolveFailure>;
}

/// The fully resolved root of a graph.
#[derive(Debug, Clone)]
pub struct RootComponent {
    pub id: ComponentId,
    pub version_id: ModuleVersionId,
    pub metadata: ComponentMetadata,
}

/// Turns the resolve context into the root component.
#[async_trait]
pub trait RootComponentResolver: Send + Sync {
    async fn resolve(&self, context: &ResolveContext) -> Result<RootComponent, ResolveFailure>;
}

/// Rewrites selectors before resolution (dependency substitution rules).
pub trait SubstitutionApplicator: Send + Sync {
    /// Returning `None` keeps the original selector.
    fn substitute(&self, selector: &ComponentSelector) -> Option<ComponentSelector>;
}

/// The identity substitution.
#[derive(Debug, Default)]
pub struct NoSubstitution;

impl SubstitutionApplicator for NoSubstitution {
    fn substitute(&self, _selector: &ComponentSelector) -> Option<ComponentSelector> {
        None
    }
}

/// Module replacement rules (`org.old:lib` is replaced by `org.new:lib`).
pub trait ModuleReplacements: Send + Sync {
    /// The module that replaces `id`, if any.
    fn replacement_for(&self, id: &ModuleId) -> Option<ModuleId>;

    /// Whether `id` appears on either side of a replacement rule. Modules
    /// that participate are never compatibly selected; they always go
    /// through the conflict handler.
    fn participates_in_replacements(&self, id: &ModuleId) -> bool;
}

/// No replacement rules.
#[derive(Debug, Default)]
pub struct NoReplacements;

impl ModuleReplacements for NoReplacements {
    fn replacement_for(&self, _id: &ModuleId) -> Option<ModuleId> {
        None
    }

    fn participates_in_replacements(&self, _id: &ModuleId) -> bool {
        false
    }
}

/// Replacement rules backed by a source-to-target map.
#[derive(Debug, Default)]
pub struct MapReplacements {
    rules: HashMap<ModuleId, ModuleId>,
}

impl MapReplacements {
    pub fn from_rules(rules: impl IntoIterator<Item = (ModuleId, ModuleId)>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }
}

impl ModuleReplacements for MapReplacements {
    fn replacement_for(&self, id: &ModuleId) -> Option<ModuleId> {
        self.rules.get(id).cloned()
    }

    fn participates_in_replacements(&self, id: &ModuleId) -> bool {
        self.rules.contains_key(id) || self.rules.values().any(|target| target == id)
    }
}

/// Converts a component selector to the module identity used for conflict
/// bookkeeping.
pub trait SelectorConverter: Send + Sync {
    fn module_of(&self, selector: &ComponentSelector) -> ModuleId;
}

/// The canonical conversion: the selector's declared module.
#[derive(Debug, Default)]
pub struct DefaultSelectorConverter;

impl SelectorConverter for DefaultSelectorConverter {
    fn module_of(&self, selector: &ComponentSelector) -> ModuleId {
        selector.module.clone()
    }
}
