//! The visitor protocol driven after traversal completes.
//!
//! Callback order is part of the contract: `start` precedes everything,
//! every `visit_node` precedes every `visit_edges`, and for any acyclic pair
//! of components A depending on B, A's nodes receive `visit_edges` strictly
//! before B's (consumer-first). Within a dependency cycle the order is
//! unspecified, but each selected node's `visit_edges` fires exactly once.

use javelin_core::constraint::VersionConstraint;
use javelin_core::metadata::{ComponentSelector, DependencyMetadata};
use javelin_core::module::ModuleVersionId;

use crate::interfaces::ResolveFailure;

/// A selected node (one configuration of a selected component).
#[derive(Debug)]
pub struct NodeRef<'a> {
    /// Stable id of this node within the resolve.
    pub id: usize,
    pub component: &'a ModuleVersionId,
    pub configuration: &'a str,
    pub is_root: bool,
}

/// A live incoming edge of a node.
#[derive(Debug)]
pub struct EdgeRef<'a> {
    /// Node the dependency was declared on.
    pub from_id: usize,
    pub from_component: &'a ModuleVersionId,
    pub dependency: &'a DependencyMetadata,
    /// Failure recorded while resolving or attaching this edge, if any.
    pub failure: Option<&'a ResolveFailure>,
}

/// A resolved (or failed) dependency selector.
#[derive(Debug)]
pub struct SelectorRef<'a> {
    pub requested: &'a ComponentSelector,
    pub constraint: Option<&'a VersionConstraint>,
    /// The component this selector resolved to, when resolution succeeded.
    pub resolved: Option<&'a ModuleVersionId>,
    pub failure: Option<&'a ResolveFailure>,
}

/// Receives the resolved graph. All methods default to no-ops so visitors
/// only implement the callbacks they care about.
pub trait GraphVisitor {
    fn start(&mut self, _root: &NodeRef<'_>) {}

    fn visit_selector(&mut self, _selector: &SelectorRef<'_>) {}

    /// Called once per selected node, before any `visit_edges` callback.
    fn visit_node(&mut self, _node: &NodeRef<'_>) {}

    /// Called once per selected node in consumer-first order, with the
    /// node's live incoming edges.
    fn visit_edges(&mut self, _node: &NodeRef<'_>, _incoming: &[EdgeRef<'_>]) {}

    fn finish(&mut self, _root: &NodeRef<'_>) {}
}
