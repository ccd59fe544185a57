//! Global registry for one resolve: arenas of components, nodes, edges and
//! selectors, the module registry, and the ready queue of nodes to visit.
//!
//! Entities reference each other through stable arena indices rather than
//! owning links; the whole arena lives for exactly one resolve.

use std::collections::{HashMap, VecDeque};
use std::mem;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use javelin_core::constraint::VersionConstraint;
use javelin_core::exclude::ExcludeSet;
use javelin_core::metadata::{ComponentSelector, DependencyMetadata};
use javelin_core::module::{ComponentId, ModuleId, ModuleVersionId};

use crate::component::{ComponentState, ModuleResolveState};
use crate::conflict::ConflictCandidate;
use crate::edge::EdgeState;
use crate::interfaces::RootComponent;
use crate::node::NodeState;
use crate::selector_state::SelectorState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ComponentIdx(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeIdx(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EdgeIdx(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SelectorIdx(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ModuleIdx(pub usize);

pub(crate) struct ResolveState {
    pub components: Vec<ComponentState>,
    pub nodes: Vec<NodeState>,
    pub edges: Vec<EdgeState>,
    pub selectors: Vec<SelectorState>,
    /// Modules in discovery order; iteration order feeds the assembly stage,
    /// so it must be deterministic.
    pub modules: Vec<ModuleResolveState>,
    module_index: HashMap<ModuleId, ModuleIdx>,
    component_index: HashMap<ModuleVersionId, ComponentIdx>,
    selector_index: HashMap<(ComponentSelector, Option<String>), SelectorIdx>,
    queue: VecDeque<NodeIdx>,
    pub root_node: NodeIdx,
    pub root_component: ComponentIdx,
    /// Monotone mapping from version id to component id. Entries are added,
    /// never changed; concurrent fetch tasks may read it.
    id_cache: Arc<DashMap<ModuleVersionId, ComponentId>>,
    /// Edges retargeted by conflict resolution or compatible re-selection,
    /// waiting for serial re-attachment.
    reattach: Vec<EdgeIdx>,
}

impl ResolveState {
    pub fn new(root: RootComponent, root_configuration: &str) -> Self {
        let mut state = Self {
            components: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            selectors: Vec::new(),
            modules: Vec::new(),
            module_index: HashMap::new(),
            component_index: HashMap::new(),
            selector_index: HashMap::new(),
            queue: VecDeque::new(),
            root_node: NodeIdx(0),
            root_component: ComponentIdx(0),
            id_cache: Arc::new(DashMap::new()),
            reattach: Vec::new(),
        };

        let RootComponent {
            id,
            version_id,
            metadata,
        } = root;
        let component = state.component_for(&version_id, Some(id));
        state.components[component.0].metadata = Some(metadata);
        state.components[component.0].selected = true;
        let module = state.components[component.0].module;
        state.modules[module.0].selected = Some(component);

        let node = state.get_or_create_node(component, root_configuration);
        state.nodes[node.0].selected = true;
        state.nodes[node.0].is_root = true;
        state.root_component = component;
        state.root_node = node;
        state.enqueue(node);
        state
    }

    // ------------------------------------------------------------------
    // Registration

    pub fn module_for(&mut self, id: &ModuleId) -> ModuleIdx {
        if let Some(&idx) = self.module_index.get(id) {
            return idx;
        }
        let idx = ModuleIdx(self.modules.len());
        self.modules.push(ModuleResolveState::new(id.clone()));
        self.module_index.insert(id.clone(), idx);
        idx
    }

    /// Look up or create the component for a module version. At most one
    /// component exists per version id within a resolve.
    pub fn component_for(
        &mut self,
        version_id: &ModuleVersionId,
        provided_id: Option<ComponentId>,
    ) -> ComponentIdx {
        if let Some(&idx) = self.component_index.get(version_id) {
            return idx;
        }
        let module = self.module_for(&version_id.module);
        let id = self.component_id_for(version_id, provided_id);
        let idx = ComponentIdx(self.components.len());
        self.components
            .push(ComponentState::new(id, version_id.clone(), module));
        self.component_index.insert(version_id.clone(), idx);
        self.modules[module.0].versions.push(idx);
        idx
    }

    /// Component id for a version, through the monotone cache. The first
    /// write wins; later callers observe the same value forever.
    pub fn component_id_for(
        &self,
        version_id: &ModuleVersionId,
        provided: Option<ComponentId>,
    ) -> ComponentId {
        self.id_cache
            .entry(version_id.clone())
            .or_insert_with(|| provided.unwrap_or_else(|| ComponentId::for_version(version_id)))
            .clone()
    }

    /// Look up or create the selector state for a requirement. Identical
    /// declarations share one selector.
    pub fn selector_for(
        &mut self,
        requested: ComponentSelector,
        reject: Option<String>,
        module_id: &ModuleId,
    ) -> SelectorIdx {
        let key = (requested.clone(), reject.clone());
        if let Some(&idx) = self.selector_index.get(&key) {
            return idx;
        }
        let module = self.module_for(module_id);
        let constraint = VersionConstraint::from_strings(&requested.requirement, reject.as_deref());
        let idx = SelectorIdx(self.selectors.len());
        self.selectors.push(SelectorState::new(requested, constraint));
        self.selector_index.insert(key, idx);
        self.modules[module.0].selectors.push(idx);
        idx
    }

    pub fn add_edge(
        &mut self,
        from: NodeIdx,
        dep: DependencyMetadata,
        dep_index: usize,
        excludes: ExcludeSet,
        selector: SelectorIdx,
    ) -> EdgeIdx {
        let idx = EdgeIdx(self.edges.len());
        self.edges
            .push(EdgeState::new(from, dep, dep_index, excludes, selector));
        self.nodes[from.0].outgoing.push(idx);
        idx
    }

    /// Record the component an edge resolved to, indexing the edge on the
    /// target's module for later retargeting.
    pub fn record_edge_target(&mut self, edge: EdgeIdx, target: Option<ComponentIdx>) {
        self.edges[edge.0].target = target;
        if let Some(component) = target {
            let module = self.components[component.0].module;
            if !self.modules[module.0].edges.contains(&edge) {
                self.modules[module.0].edges.push(edge);
            }
        }
    }

    pub fn get_or_create_node(&mut self, component: ComponentIdx, configuration: &str) -> NodeIdx {
        for &n in &self.components[component.0].nodes {
            if self.nodes[n.0].configuration == configuration {
                return n;
            }
        }
        let idx = NodeIdx(self.nodes.len());
        self.nodes.push(NodeState::new(component, configuration));
        self.components[component.0].nodes.push(idx);
        idx
    }

    // ------------------------------------------------------------------
    // Ready queue

    pub fn enqueue(&mut self, node: NodeIdx) {
        if !self.nodes[node.0].queued {
            self.nodes[node.0].queued = true;
            self.queue.push_back(node);
        }
    }

    pub fn pop(&mut self) -> Option<NodeIdx> {
        let node = self.queue.pop_front()?;
        self.nodes[node.0].queued = false;
        Some(node)
    }

    // ------------------------------------------------------------------
    // Selection actions

    /// Make `candidate` the module's selection.
    pub fn select(&mut self, module: ModuleIdx, candidate: ComponentIdx) {
        debug!(
            module = %self.modules[module.0].id,
            version = self.components[candidate.0].version(),
            "selecting new module version"
        );
        self.modules[module.0].selected = Some(candidate);
        self.components[candidate.0].selected = true;
    }

    /// Select `candidate` while keeping the module's prior selection history
    /// intact, retargeting existing selectors and consumer edges.
    pub fn soft_select(&mut self, module: ModuleIdx, candidate: ComponentIdx) {
        debug!(
            module = %self.modules[module.0].id,
            version = self.components[candidate.0].version(),
            "soft-selecting module version"
        );
        self.modules[module.0].selected = Some(candidate);
        self.components[candidate.0].selected = true;
        self.components[candidate.0].selectable = true;
        for s in self.modules[module.0].selectors.clone() {
            if self.selectors[s.0].selected.is_some() {
                self.selectors[s.0].selected = Some(candidate);
            }
        }
        let pending = self.retarget_module_edges(module, candidate);
        self.reattach.extend(pending);
    }

    /// Drop the module's current selection and prune the subgraph that was
    /// only reachable through it. The deselected version is parked as
    /// non-selectable until conflict resolution decides its fate.
    pub fn deselect(&mut self, id: &ModuleId) {
        let Some(&module) = self.module_index.get(id) else {
            return;
        };
        let Some(previous) = self.modules[module.0].selected else {
            return;
        };
        if previous == self.root_component {
            return;
        }
        debug!(
            module = %id,
            version = self.components[previous.0].version(),
            "deselecting module version"
        );
        self.modules[module.0].selected = None;
        self.components[previous.0].selected = false;
        self.components[previous.0].selectable = false;
        for node in self.components[previous.0].nodes.clone() {
            if self.nodes[node.0].selected {
                self.nodes[node.0].selected = false;
                self.remove_outgoing_edges(node);
            }
        }
    }

    /// Apply a conflict decision: `winner` becomes the selection for the
    /// participating module (which loses entirely when the winner belongs to
    /// a replacement target module). Retargeted consumer edges are queued
    /// for serial re-attachment.
    pub fn restart_module(&mut self, id: &ModuleId, winner: &ModuleVersionId) {
        let Some(&module) = self.module_index.get(id) else {
            return;
        };
        let Some(&winner_component) = self.component_index.get(winner) else {
            return;
        };
        let winner_module = self.components[winner_component.0].module;
        debug!(module = %id, winner = %winner, "applying conflict resolution");

        self.modules[module.0].selected = if winner_module == module {
            Some(winner_component)
        } else {
            None
        };
        for version in self.modules[module.0].versions.clone() {
            if version == winner_component {
                self.components[version.0].selected = true;
                self.components[version.0].selectable = true;
            } else {
                let was_selected = self.components[version.0].selected;
                self.components[version.0].selected = false;
                self.components[version.0].selectable = false;
                if was_selected {
                    for node in self.components[version.0].nodes.clone() {
                        if self.nodes[node.0].selected {
                            self.nodes[node.0].selected = false;
                            self.remove_outgoing_edges(node);
                        }
                    }
                }
            }
        }
        if winner_module != module {
            self.modules[winner_module.0].selected = Some(winner_component);
            self.components[winner_component.0].selected = true;
            self.components[winner_component.0].selectable = true;
        }

        for s in self.modules[module.0].selectors.clone() {
            if self.selectors[s.0].selected.is_some() {
                self.selectors[s.0].selected = Some(winner_component);
            }
        }
        let pending = self.retarget_module_edges(module, winner_component);
        self.reattach.extend(pending);
    }

    /// Point every live consumer edge of `module` at `winner`, returning the
    /// edges that now need (re-)attachment.
    fn retarget_module_edges(
        &mut self,
        module: ModuleIdx,
        winner: ComponentIdx,
    ) -> Vec<EdgeIdx> {
        let mut pending = Vec::new();
        for edge in self.modules[module.0].edges.clone() {
            if self.edges[edge.0].detached {
                continue;
            }
            if !self.nodes[self.edges[edge.0].from.0].selected {
                continue;
            }
            if self.edges[edge.0].target == Some(winner) {
                if self.edges[edge.0].attached() {
                    // Re-expand a previously pruned subtree.
                    for t in self.edges[edge.0].target_nodes.clone() {
                        if !self.nodes[t.0].selected {
                            self.nodes[t.0].selected = true;
                            self.enqueue(t);
                        }
                    }
                } else {
                    pending.push(edge);
                }
                continue;
            }
            self.detach_edge_targets(edge);
            self.edges[edge.0].target = Some(winner);
            let winner_owner = self.components[winner.0].module;
            if winner_owner != module && !self.modules[winner_owner.0].edges.contains(&edge) {
                self.modules[winner_owner.0].edges.push(edge);
            }
            pending.push(edge);
        }
        pending
    }

    /// Detach every outgoing edge of `start`, cascading through nodes that
    /// lose their last incoming edge. Nodes that lose an incoming edge but
    /// stay reachable are re-queued: their effective excludes may have
    /// tightened.
    pub fn remove_outgoing_edges(&mut self, start: NodeIdx) {
        let mut worklist = vec![start];
        while let Some(n) = worklist.pop() {
            let outgoing = mem::take(&mut self.nodes[n.0].outgoing);
            for edge in outgoing {
                if self.edges[edge.0].detached {
                    continue;
                }
                self.edges[edge.0].detached = true;
                let targets = mem::take(&mut self.edges[edge.0].target_nodes);
                for t in targets {
                    self.nodes[t.0].incoming.retain(|&e| e != edge);
                    let node = &mut self.nodes[t.0];
                    if node.incoming.is_empty() && !node.is_root && node.selected {
                        node.selected = false;
                        worklist.push(t);
                    } else if node.selected {
                        self.enqueue(t);
                    }
                }
            }
        }
    }

    fn detach_edge_targets(&mut self, edge: EdgeIdx) {
        let targets = mem::take(&mut self.edges[edge.0].target_nodes);
        for t in targets {
            self.nodes[t.0].incoming.retain(|&e| e != edge);
            let node = &mut self.nodes[t.0];
            if node.incoming.is_empty() && !node.is_root && node.selected {
                node.selected = false;
                self.remove_outgoing_edges(t);
            } else if node.selected {
                self.enqueue(t);
            }
        }
    }

    /// Detach a single edge (without touching its siblings), cascading
    /// through targets that lose their last incoming edge.
    pub fn detach_edge(&mut self, edge: EdgeIdx) {
        if self.edges[edge.0].detached {
            return;
        }
        self.edges[edge.0].detached = true;
        self.detach_edge_targets(edge);
    }

    pub fn take_reattach(&mut self) -> Vec<EdgeIdx> {
        mem::take(&mut self.reattach)
    }

    // ------------------------------------------------------------------
    // Queries

    /// Exclude rules in effect at a node: the intersection of the rules
    /// carried by its live incoming edges.
    pub fn effective_excludes(&self, node: NodeIdx) -> ExcludeSet {
        if self.nodes[node.0].is_root {
            return ExcludeSet::new();
        }
        let sets: Vec<&ExcludeSet> = self.nodes[node.0]
            .incoming
            .iter()
            .filter(|&&e| !self.edges[e.0].detached)
            .map(|&e| &self.edges[e.0].excludes)
            .collect();
        ExcludeSet::intersect_all(sets)
    }

    /// Conflict candidates for a module, as seen by the conflict handler.
    pub fn candidates(&self, id: &ModuleId) -> Vec<ConflictCandidate> {
        let Some(&module) = self.module_index.get(id) else {
            return Vec::new();
        };
        self.modules[module.0]
            .versions
            .iter()
            .map(|&c| ConflictCandidate {
                id: self.components[c.0].version_id.clone(),
                selectable: self.components[c.0].selectable,
                forced_by_root: self.forced_by_root(c),
            })
            .collect()
    }

    /// Whether a live, forced edge of the root resolves to this component.
    fn forced_by_root(&self, component: ComponentIdx) -> bool {
        let module = self.components[component.0].module;
        self.modules[module.0].edges.iter().any(|&e| {
            let edge = &self.edges[e.0];
            !edge.detached
                && edge.from == self.root_node
                && edge.dep.force
                && edge.target == Some(component)
        })
    }

    pub fn describe_node(&self, node: NodeIdx) -> String {
        let n = &self.nodes[node.0];
        format!(
            "{} ({})",
            self.components[n.component.0].version_id, n.configuration
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use javelin_core::metadata::ComponentMetadata;

    fn root() -> RootComponent {
        let version_id = ModuleVersionId::new("com.example", "app", "1.0");
        RootComponent {
            id: ComponentId::for_version(&version_id),
            metadata: ComponentMetadata::with_default_configuration(version_id.clone(), vec![]),
            version_id,
        }
    }

    #[test]
    fn root_is_seeded_and_queued() {
        let mut state = ResolveState::new(root(), "default");
        assert!(state.nodes[state.root_node.0].is_root);
        assert!(state.components[state.root_component.0].selected);
        let popped = state.pop().unwrap();
        assert_eq!(popped, state.root_node);
        assert!(state.pop().is_none());
    }

    #[test]
    fn component_for_is_idempotent() {
        let mut state = ResolveState::new(root(), "default");
        let v = ModuleVersionId::new("org.example", "lib", "1.0");
        let a = state.component_for(&v, None);
        let b = state.component_for(&v, None);
        assert_eq!(a, b);
        assert_eq!(state.components.len(), 2);
    }

    #[test]
    fn component_id_cache_is_monotone() {
        let mut state = ResolveState::new(root(), "default");
        let v = ModuleVersionId::new("org.example", "lib", "1.0");
        let first = state.component_id_for(&v, Some(ComponentId::new("custom")));
        let second = state.component_id_for(&v, Some(ComponentId::new("other")));
        assert_eq!(first, second);
        assert_eq!(first.as_str(), "custom");
        let _ = state.component_for(&v, None);
    }

    #[test]
    fn enqueue_deduplicates() {
        let mut state = ResolveState::new(root(), "default");
        let v = ModuleVersionId::new("org.example", "lib", "1.0");
        let c = state.component_for(&v, None);
        let n = state.get_or_create_node(c, "default");
        state.enqueue(n);
        state.enqueue(n);
        // root + one copy of n
        let mut drained = Vec::new();
        while let Some(x) = state.pop() {
            drained.push(x);
        }
        assert_eq!(drained.len(), 2);
    }

    #[test]
    fn selector_for_shares_identical_declarations() {
        let mut state = ResolveState::new(root(), "default");
        let requested = ComponentSelector::new("org.example", "lib", "1.0");
        let module = requested.module.clone();
        let a = state.selector_for(requested.clone(), None, &module);
        let b = state.selector_for(requested, None, &module);
        assert_eq!(a, b);
        assert_eq!(state.selectors.len(), 1);
    }
}
