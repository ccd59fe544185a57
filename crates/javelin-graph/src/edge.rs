//! Edge state: a directed dependency between nodes.

use javelin_core::exclude::ExcludeSet;
use javelin_core::metadata::DependencyMetadata;

use crate::interfaces::ResolveFailure;
use crate::state::{ComponentIdx, NodeIdx, SelectorIdx};

/// A directed dependency from one node to a set of target nodes within a
/// target component.
///
/// Origin and declared requirement are immutable; the target component and
/// target nodes are assigned during selection and attachment, and can be
/// reassigned when conflict resolution changes the chosen version.
#[derive(Debug)]
pub(crate) struct EdgeState {
    pub from: NodeIdx,
    pub dep: DependencyMetadata,
    /// Position of the declaration in the source configuration's dependency
    /// list. Re-visits of the source node use this to avoid materializing
    /// the same declaration twice.
    pub dep_index: usize,
    /// Exclude rules in effect below this edge: the source node's effective
    /// excludes plus the declaration's own.
    pub excludes: ExcludeSet,
    pub selector: SelectorIdx,
    pub target: Option<ComponentIdx>,
    pub target_nodes: Vec<NodeIdx>,
    pub failure: Option<ResolveFailure>,
    /// Set when the edge is pruned; detached edges are skipped everywhere
    /// and never re-activated.
    pub detached: bool,
}

impl EdgeState {
    pub fn new(
        from: NodeIdx,
        dep: DependencyMetadata,
        dep_index: usize,
        excludes: ExcludeSet,
        selector: SelectorIdx,
    ) -> Self {
        Self {
            from,
            dep,
            dep_index,
            excludes,
            selector,
            target: None,
            target_nodes: Vec::new(),
            failure: None,
            detached: false,
        }
    }

    /// Whether the edge has been attached to at least one target node.
    pub fn attached(&self) -> bool {
        !self.target_nodes.is_empty()
    }
}
