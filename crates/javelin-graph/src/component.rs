//! Component and module state tracked during a resolve.

use javelin_core::metadata::ComponentMetadata;
use javelin_core::module::{ComponentId, ModuleId, ModuleVersionId};

use crate::interfaces::ResolveFailure;
use crate::state::{ComponentIdx, EdgeIdx, ModuleIdx, NodeIdx, SelectorIdx};

/// Assembly-stage traversal marker. `Visiting` is how a closed cycle is
/// recognized and broken without revisiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VisitState {
    NotSeen,
    Visiting,
    Visited,
}

/// One candidate version of a module.
#[derive(Debug)]
pub(crate) struct ComponentState {
    pub id: ComponentId,
    pub version_id: ModuleVersionId,
    pub module: ModuleIdx,
    /// Materialized configurations, in creation order.
    pub nodes: Vec<NodeIdx>,
    /// Whether this version is the module's current selection.
    pub selected: bool,
    /// Cleared when the version is ruled out by conflict resolution or
    /// replacement.
    pub selectable: bool,
    pub visit_state: VisitState,
    /// Selectors that resolved to this version. Grows only; retargeting a
    /// selector does not rewrite history.
    pub all_resolvers: Vec<SelectorIdx>,
    pub metadata: Option<ComponentMetadata>,
    pub metadata_failure: Option<ResolveFailure>,
}

impl ComponentState {
    pub fn new(id: ComponentId, version_id: ModuleVersionId, module: ModuleIdx) -> Self {
        Self {
            id,
            version_id,
            module,
            nodes: Vec::new(),
            selected: false,
            selectable: true,
            visit_state: VisitState::NotSeen,
            all_resolvers: Vec::new(),
            metadata: None,
            metadata_failure: None,
        }
    }

    pub fn version(&self) -> &str {
        &self.version_id.version
    }

    /// Whether metadata is already on hand (or known to be unobtainable), so
    /// no fetch stage is needed for this component.
    pub fn fast_resolve(&self) -> bool {
        self.metadata.is_some() || self.metadata_failure.is_some()
    }
}

/// One module across all of its candidate versions.
#[derive(Debug)]
pub(crate) struct ModuleResolveState {
    pub id: ModuleId,
    /// Candidate versions in discovery order.
    pub versions: Vec<ComponentIdx>,
    pub selected: Option<ComponentIdx>,
    /// All selectors that reference this module, in creation order.
    pub selectors: Vec<SelectorIdx>,
    /// All edges whose selector resolved into this module. Used to retarget
    /// consumers when a conflict or compatible re-selection changes the
    /// chosen version.
    pub edges: Vec<EdgeIdx>,
}

impl ModuleResolveState {
    pub fn new(id: ModuleId) -> Self {
        Self {
            id,
            versions: Vec::new(),
            selected: None,
            selectors: Vec::new(),
            edges: Vec::new(),
        }
    }
}
