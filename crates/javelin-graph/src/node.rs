//! Node state: one configuration of a component.

use crate::state::{ComponentIdx, EdgeIdx};

/// A configuration of a component, the vertex unit of the graph.
///
/// A node is selected while it is reachable from the root under the current
/// selections. Pruning a subtree flips the flag off; conflict resolution can
/// flip it back on and re-enqueue the node.
#[derive(Debug)]
pub(crate) struct NodeState {
    pub component: ComponentIdx,
    pub configuration: String,
    pub incoming: Vec<EdgeIdx>,
    pub outgoing: Vec<EdgeIdx>,
    pub selected: bool,
    /// Guard against duplicate entries in the ready queue.
    pub queued: bool,
    pub is_root: bool,
}

impl NodeState {
    pub fn new(component: ComponentIdx, configuration: &str) -> Self {
        Self {
            component,
            configuration: configuration.to_string(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
            selected: false,
            queued: false,
            is_root: false,
        }
    }
}
