//! A bundled visitor that materializes the emitted graph.
//!
//! [`GraphCollector`] listens to the visitor protocol and builds a
//! [`ResolvedGraph`] backed by petgraph, which embedding tools can query and
//! render without re-implementing the callbacks.

use std::collections::HashMap;
use std::collections::HashSet;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef as _;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use javelin_core::module::ModuleVersionId;

use crate::visitor::{EdgeRef, GraphVisitor, NodeRef, SelectorRef};

/// A vertex of the resolved graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedNode {
    pub component: ModuleVersionId,
    pub configuration: String,
}

impl std::fmt::Display for ResolvedNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.component)
    }
}

/// An edge of the resolved graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedDependency {
    /// The requirement string as declared.
    pub requested: String,
    pub constraint: bool,
}

/// A selector that failed to resolve, as reported through `visit_selector`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorFailure {
    pub requested: String,
    pub message: String,
}

/// The resolved dependency graph.
pub struct ResolvedGraph {
    graph: DiGraph<ResolvedNode, ResolvedDependency>,
    root: Option<NodeIndex>,
    failures: Vec<SelectorFailure>,
}

impl ResolvedGraph {
    /// Number of nodes, excluding the root.
    pub fn len(&self) -> usize {
        let total = self.graph.node_count();
        if self.root.is_some() {
            total.saturating_sub(1)
        } else {
            total
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn root(&self) -> Option<&ResolvedNode> {
        self.root.map(|idx| &self.graph[idx])
    }

    /// Selector failures recorded during the resolve.
    pub fn failures(&self) -> &[SelectorFailure] {
        &self.failures
    }

    /// All nodes except the root, sorted by component id.
    pub fn nodes(&self) -> Vec<&ResolvedNode> {
        let mut nodes: Vec<&ResolvedNode> = self
            .graph
            .node_indices()
            .filter(|idx| Some(*idx) != self.root)
            .map(|idx| &self.graph[idx])
            .collect();
        nodes.sort_by(|a, b| a.component.cmp(&b.component));
        nodes
    }

    /// Find a node by `group:name`, falling back to a bare name match.
    pub fn find(&self, key: &str) -> Option<&ResolvedNode> {
        self.resolve_key(key).map(|idx| &self.graph[idx])
    }

    /// Direct dependencies of a node identified by `group:name`.
    pub fn dependencies_of(&self, key: &str) -> Vec<&ResolvedNode> {
        let Some(idx) = self.resolve_key(key) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| &self.graph[e.target()])
            .collect()
    }

    /// Reverse dependencies: who depends on the node.
    pub fn dependents_of(&self, key: &str) -> Vec<&ResolvedNode> {
        let Some(idx) = self.resolve_key(key) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| &self.graph[e.source()])
            .collect()
    }

    /// A path from the root to the given node, if one exists.
    pub fn find_path(&self, key: &str) -> Option<Vec<&ResolvedNode>> {
        let root = self.root?;
        let target = self.resolve_key(key)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(root, target, &mut path, &mut visited) {
            Some(path.into_iter().map(|idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    /// Render the graph as an indented tree from the root. Shared subtrees
    /// are expanded once; repeat encounters print without children.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        let Some(root) = self.root else {
            return out;
        };
        out.push_str(&format!("{}\n", self.graph[root]));
        let children = self.sorted_children(root);
        let mut expanded = HashSet::new();
        expanded.insert(root);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.render_subtree(&mut out, child, "", i + 1 == count, &mut expanded);
        }
        out
    }

    fn render_subtree(
        &self,
        out: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        expanded: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        out.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));
        if !expanded.insert(idx) {
            return;
        }
        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.sorted_children(idx);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.render_subtree(out, child, &child_prefix, i + 1 == count, expanded);
        }
    }

    fn sorted_children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.target())
            .collect();
        children.sort_by(|a, b| self.graph[*a].component.cmp(&self.graph[*b].component));
        children.dedup();
        children
    }

    fn resolve_key(&self, key: &str) -> Option<NodeIndex> {
        // Exact group:name first, then bare module name.
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx].component.module.to_string() == key)
            .or_else(|| {
                self.graph
                    .node_indices()
                    .find(|&idx| self.graph[idx].component.module.name == key)
            })
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for edge in self.graph.edges(current) {
            if self.dfs_path(edge.target(), target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }
}

/// Visitor that records the emitted graph into a [`ResolvedGraph`].
#[derive(Default)]
pub struct GraphCollector {
    graph: DiGraph<ResolvedNode, ResolvedDependency>,
    by_visit_id: HashMap<usize, NodeIndex>,
    root: Option<NodeIndex>,
    failures: Vec<SelectorFailure>,
}

impl GraphCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_graph(self) -> ResolvedGraph {
        ResolvedGraph {
            graph: self.graph,
            root: self.root,
            failures: self.failures,
        }
    }

    fn ensure_node(&mut self, node: &NodeRef<'_>) -> NodeIndex {
        if let Some(&idx) = self.by_visit_id.get(&node.id) {
            return idx;
        }
        let idx = self.graph.add_node(ResolvedNode {
            component: node.component.clone(),
            configuration: node.configuration.to_string(),
        });
        self.by_visit_id.insert(node.id, idx);
        idx
    }
}

impl GraphVisitor for GraphCollector {
    fn start(&mut self, root: &NodeRef<'_>) {
        let idx = self.ensure_node(root);
        self.root = Some(idx);
    }

    fn visit_selector(&mut self, selector: &SelectorRef<'_>) {
        if let Some(failure) = selector.failure {
            self.failures.push(SelectorFailure {
                requested: selector.requested.to_string(),
                message: failure.message.clone(),
            });
        }
    }

    fn visit_node(&mut self, node: &NodeRef<'_>) {
        self.ensure_node(node);
    }

    fn visit_edges(&mut self, node: &NodeRef<'_>, incoming: &[EdgeRef<'_>]) {
        let to = self.ensure_node(node);
        for edge in incoming {
            let Some(&from) = self.by_visit_id.get(&edge.from_id) else {
                continue;
            };
            let duplicate = self
                .graph
                .edges_directed(to, Direction::Incoming)
                .any(|e| e.source() == from && e.weight().requested == edge.dependency.selector.requirement);
            if !duplicate {
                self.graph.add_edge(
                    from,
                    to,
                    ResolvedDependency {
                        requested: edge.dependency.selector.requirement.clone(),
                        constraint: edge.dependency.constraint,
                    },
                );
            }
        }
    }
}
