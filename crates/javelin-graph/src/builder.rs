//! The traversal driver.
//!
//! `GraphBuilder::resolve` seeds a fresh [`ResolveState`] with the root
//! component, then loops: pop a node, compute its outgoing edges, and run the
//! three-phase edge resolution (serial select, parallel fetch, serial
//! attach). When the ready queue drains, batched conflicts are resolved one
//! at a time, which may re-queue nodes. Once both are empty the selected
//! graph is emitted to the visitor in consumer-first order.
//!
//! The serial phases make graph shape a pure function of input order; the
//! parallel phase only fills per-component metadata that is idempotent.

use std::sync::Arc;

use tracing::debug;

use javelin_core::attributes::AttributesSchema;
use javelin_core::exclude::ExcludeSet;
use javelin_core::metadata::{DependencyMetadata, DEFAULT_CONFIGURATION};
use javelin_core::module::{ModuleId, ModuleVersionId};
use javelin_util::cancel::CancellationToken;
use javelin_util::errors::{JavelinError, JavelinResult};

use crate::component::VisitState;
use crate::conflict::{ConflictHandler, DefaultConflictHandler, DirectDependencyForcingResolver};
use crate::fetch::{FetchExecutor, MetadataFetch};
use crate::interfaces::{
    ComponentIdResolver, ComponentMetadataResolver, DefaultSelectorConverter, ModuleReplacements,
    NoReplacements, NoSubstitution, ResolveFailure, RootComponentResolver, SelectorConverter,
    SubstitutionApplicator,
};
use crate::options::{ResolveContext, ResolveOptions};
use crate::pending::PendingDependenciesHandler;
use crate::state::{ComponentIdx, EdgeIdx, ModuleIdx, NodeIdx, ResolveState, SelectorIdx};
use crate::visitor::{EdgeRef, GraphVisitor, NodeRef, SelectorRef};

/// Drops dependency declarations before they become edges.
pub type EdgeFilter = Box<dyn Fn(&DependencyMetadata) -> bool + Send + Sync>;

/// Builds dependency graphs. One builder can serve many resolves; all
/// per-resolve state lives in the arena created by [`GraphBuilder::resolve`].
pub struct GraphBuilder {
    id_resolver: Arc<dyn ComponentIdResolver>,
    metadata_resolver: Arc<dyn ComponentMetadataResolver>,
    root_resolver: Arc<dyn RootComponentResolver>,
    substitutions: Arc<dyn SubstitutionApplicator>,
    replacements: Arc<dyn ModuleReplacements>,
    selector_converter: Arc<dyn SelectorConverter>,
    attributes_schema: AttributesSchema,
    edge_filter: EdgeFilter,
    options: ResolveOptions,
    cancellation: CancellationToken,
    fetch_executor: FetchExecutor,
}

impl GraphBuilder {
    pub fn new(
        id_resolver: Arc<dyn ComponentIdResolver>,
        metadata_resolver: Arc<dyn ComponentMetadataResolver>,
        root_resolver: Arc<dyn RootComponentResolver>,
    ) -> Self {
        let options = ResolveOptions::default();
        Self {
            id_resolver,
            metadata_resolver,
            root_resolver,
            substitutions: Arc::new(NoSubstitution),
            replacements: Arc::new(NoReplacements),
            selector_converter: Arc::new(DefaultSelectorConverter),
            attributes_schema: AttributesSchema::new(),
            edge_filter: Box::new(|_| true),
            fetch_executor: FetchExecutor::new(options.max_concurrent_fetches),
            options,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.fetch_executor = FetchExecutor::new(options.max_concurrent_fetches);
        self.options = options;
        self
    }

    pub fn with_substitutions(mut self, substitutions: Arc<dyn SubstitutionApplicator>) -> Self {
        self.substitutions = substitutions;
        self
    }

    pub fn with_replacements(mut self, replacements: Arc<dyn ModuleReplacements>) -> Self {
        self.replacements = replacements;
        self
    }

    pub fn with_selector_converter(mut self, converter: Arc<dyn SelectorConverter>) -> Self {
        self.selector_converter = converter;
        self
    }

    pub fn with_attributes_schema(mut self, schema: AttributesSchema) -> Self {
        self.attributes_schema = schema;
        self
    }

    pub fn with_edge_filter(
        mut self,
        filter: impl Fn(&DependencyMetadata) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.edge_filter = Box::new(filter);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Resolve the graph rooted at `context` and drive `visitor` with the
    /// result.
    ///
    /// A root that fails to resolve is fatal and produces no visitor
    /// callbacks at all. Per-edge failures are recorded on the graph and
    /// reported through `visit_selector` and the edge refs instead.
    pub async fn resolve(
        &self,
        context: &ResolveContext,
        visitor: &mut dyn GraphVisitor,
    ) -> JavelinResult<()> {
        let root = self
            .root_resolver
            .resolve(context)
            .await
            .map_err(|failure| JavelinError::RootResolution {
                message: failure.message,
            })?;
        debug!(context = %context.name, root = %root.version_id, "starting graph resolution");

        let mut state = ResolveState::new(root, &context.root_configuration);
        let mut conflicts = DefaultConflictHandler::new(Arc::clone(&self.replacements));
        conflicts.register_resolver(Box::new(DirectDependencyForcingResolver));
        let mut pending = PendingDependenciesHandler::new();

        self.traverse(&mut state, &mut conflicts, &mut pending)
            .await?;
        self.assemble(&mut state, visitor);
        Ok(())
    }

    async fn traverse(
        &self,
        state: &mut ResolveState,
        conflicts: &mut dyn ConflictHandler,
        pending: &mut PendingDependenciesHandler,
    ) -> JavelinResult<()> {
        loop {
            self.check_cancelled()?;
            if let Some(node) = state.pop() {
                debug!(node = %state.describe_node(node), "visiting configuration");
                let edges = self.visit_outgoing(state, node, pending);
                self.resolve_edges(state, conflicts, node, &edges).await?;
            } else if conflicts.has_conflicts() {
                self.drain_one_conflict(state, conflicts).await?;
            } else {
                return Ok(());
            }
        }
    }

    /// Collect the new outgoing edges of a node: filtered, exclusion-checked,
    /// with constraint-only declarations routed through the pending handler.
    /// Edge order follows declaration order; re-visits only materialize
    /// declarations that have no live edge yet.
    fn visit_outgoing(
        &self,
        state: &mut ResolveState,
        node: NodeIdx,
        pending: &mut PendingDependenciesHandler,
    ) -> Vec<EdgeIdx> {
        if !state.nodes[node.0].selected {
            return Vec::new();
        }
        let component = state.nodes[node.0].component;
        let configuration = state.nodes[node.0].configuration.clone();
        let deps: Vec<DependencyMetadata> = match &state.components[component.0].metadata {
            Some(metadata) => metadata
                .configuration(&configuration)
                .map(|c| c.dependencies.clone())
                .unwrap_or_default(),
            None => return Vec::new(),
        };
        let effective = state.effective_excludes(node);

        // Pruning elsewhere may have tightened this node's excludes since
        // the last visit; retract live edges the rules now forbid.
        for edge in state.nodes[node.0].outgoing.clone() {
            if state.edges[edge.0].detached {
                continue;
            }
            let requested = &state.selectors[state.edges[edge.0].selector.0].requested;
            let module_id = self.selector_converter.module_of(requested);
            if effective.excludes(&module_id) {
                state.detach_edge(edge);
            }
        }

        let mut out = Vec::new();
        for (index, dep) in deps.into_iter().enumerate() {
            if !(self.edge_filter)(&dep) {
                continue;
            }
            let already_live = state.nodes[node.0]
                .outgoing
                .iter()
                .any(|&e| !state.edges[e.0].detached && state.edges[e.0].dep_index == index);
            if already_live {
                continue;
            }

            let requested = self
                .substitutions
                .substitute(&dep.selector)
                .unwrap_or_else(|| dep.selector.clone());
            let module_id = self.selector_converter.module_of(&requested);
            if effective.excludes(&module_id) {
                continue;
            }

            if dep.constraint {
                if !pending.is_active(&module_id) {
                    pending.defer(module_id, node);
                    continue;
                }
            } else {
                // A hard requirement releases any parked constraints on the
                // same module.
                for revisit in pending.activate(&module_id) {
                    if state.nodes[revisit.0].selected {
                        state.enqueue(revisit);
                    }
                }
            }

            let selector = state.selector_for(requested, dep.reject.clone(), &module_id);
            let excludes = effective.union(&ExcludeSet::from_specs(dep.excludes.clone()));
            let edge = state.add_edge(node, dep, index, excludes, selector);
            out.push(edge);
        }
        out
    }

    /// Three-phase barrier: serial select, parallel fetch, serial attach.
    async fn resolve_edges(
        &self,
        state: &mut ResolveState,
        conflicts: &mut dyn ConflictHandler,
        node: NodeIdx,
        edges: &[EdgeIdx],
    ) -> JavelinResult<()> {
        if edges.is_empty() {
            return Ok(());
        }

        self.check_cancelled()?;
        for &edge in edges {
            if let Some(candidate) = self.resolve_edge_target(state, edge).await {
                self.perform_selection(state, conflicts, candidate);
            }
        }
        // Selection may have retargeted selectors; re-sync edge targets
        // before deciding what to fetch.
        for &edge in edges {
            let selector = state.edges[edge.0].selector;
            let target = state.selectors[selector.0].selected;
            state.record_edge_target(edge, target);
        }

        self.check_cancelled()?;
        self.maybe_fetch_metadata_in_parallel(state, node, edges)
            .await;

        self.check_cancelled()?;
        let retargeted = state.take_reattach();
        for edge in retargeted {
            self.attach_edge(state, edge).await;
        }
        for &edge in edges {
            self.attach_edge(state, edge).await;
        }
        Ok(())
    }

    /// Resolve the edge's selector to a component (serially; the id resolver
    /// may perform I/O). Returns the proposed candidate for selection.
    async fn resolve_edge_target(
        &self,
        state: &mut ResolveState,
        edge: EdgeIdx,
    ) -> Option<ComponentIdx> {
        let selector = state.edges[edge.0].selector;
        if !state.selectors[selector.0].resolved {
            let requested = state.selectors[selector.0].requested.clone();
            let constraint = state.selectors[selector.0].constraint.clone();
            let result = self.id_resolver.resolve(&requested, constraint.as_ref()).await;
            state.selectors[selector.0].resolved = true;
            match result {
                Ok(resolution) => {
                    let component = state.component_for(&resolution.version_id, resolution.id);
                    if let Some(metadata) = resolution.metadata {
                        if state.components[component.0].metadata.is_none() {
                            state.components[component.0].metadata = Some(metadata);
                        }
                    }
                    if !state.components[component.0].all_resolvers.contains(&selector) {
                        state.components[component.0].all_resolvers.push(selector);
                    }
                    state.selectors[selector.0].selected = Some(component);
                }
                Err(failure) => {
                    debug!(selector = %requested, error = %failure, "selector failed to resolve");
                    state.selectors[selector.0].failure = Some(failure);
                }
            }
        }

        let mut target = state.selectors[selector.0].selected;
        // A ruled-out candidate falls back to the module's current selection
        // so the edge still lands on the surviving version.
        if let Some(component) = target {
            if !state.components[component.0].selectable {
                let module = state.components[component.0].module;
                if let Some(selected) = state.modules[module.0].selected {
                    state.selectors[selector.0].selected = Some(selected);
                    target = Some(selected);
                }
            }
        }
        if target.is_none() {
            state.edges[edge.0].failure = state.selectors[selector.0].failure.clone();
        }
        state.record_edge_target(edge, target);
        target
    }

    /// Select a proposed candidate, preferring the compatible-selection
    /// shortcut and falling back to conflict registration.
    fn perform_selection(
        &self,
        state: &mut ResolveState,
        conflicts: &mut dyn ConflictHandler,
        candidate: ComponentIdx,
    ) {
        if !state.components[candidate.0].selectable {
            return;
        }
        let module = state.components[candidate.0].module;
        if state.modules[module.0].selected == Some(candidate) {
            return;
        }
        if self.try_compatible_selection(state, candidate, module) {
            return;
        }

        let module_id = state.modules[module.0].id.clone();
        let versions_in_play = state.modules[module.0].versions.len();
        let potential = conflicts.register_module(&module_id, versions_in_play);
        if !potential.conflict_exists() {
            state.select(module, candidate);
        } else {
            debug!(
                candidate = %state.components[candidate.0].version_id,
                "found conflicting module version"
            );
            // Deselect every participating version and prune the subgraphs
            // hanging off them; the batched conflict decides the winner.
            potential.with_participating_modules(|participant| state.deselect(participant));
        }
    }

    /// The compatible-selection shortcut: avoid full conflict resolution
    /// when the selectors already agree.
    fn try_compatible_selection(
        &self,
        state: &mut ResolveState,
        candidate: ComponentIdx,
        module: ModuleIdx,
    ) -> bool {
        let current = state.modules[module.0].selected;
        let version = state.components[candidate.0].version_id.version.clone();
        let module_id = state.modules[module.0].id.clone();

        if current.is_none() && !self.replacements.participates_in_replacements(&module_id) {
            let selectors = state.modules[module.0].selectors.clone();
            if all_selectors_agree_with(state, &selectors, &version, |_| true) {
                state.select(module, candidate);
                return true;
            }
        }

        if let Some(current) = current {
            if current != candidate {
                let selected_by = state.components[candidate.0].all_resolvers.clone();
                let current_version = state.components[current.0].version_id.version.clone();
                if all_selectors_agree_with(state, &selected_by, &current_version, |_| true) {
                    // The candidate is subsumed by the current selection;
                    // point its selectors there so edges attach to it.
                    for &s in &selected_by {
                        state.selectors[s.0].selected = Some(current);
                    }
                    return true;
                }
                let selectors = state.modules[module.0].selectors.clone();
                if all_selectors_agree_with(state, &selectors, &version, |s| {
                    !selected_by.contains(&s)
                }) {
                    state.deselect(&module_id);
                    state.soft_select(module, candidate);
                    return true;
                }
            }
        }
        false
    }

    /// Scan the batch for components whose metadata is worth prefetching and
    /// dispatch them in parallel. Below the threshold, metadata is fetched
    /// serially at attachment time instead.
    async fn maybe_fetch_metadata_in_parallel(
        &self,
        state: &mut ResolveState,
        node: NodeIdx,
        edges: &[EdgeIdx],
    ) {
        let mut requiring: Vec<ComponentIdx> = Vec::new();
        for &edge in edges {
            let Some(component) = state.edges[edge.0].target else {
                continue;
            };
            let comp = &state.components[component.0];
            if comp.fast_resolve() || !comp.selected {
                continue;
            }
            if self.metadata_resolver.is_fetching_metadata_cheap(&comp.id) {
                continue;
            }
            requiring.push(component);
        }
        if requiring.len() < self.options.parallel_fetch_threshold {
            return;
        }

        debug!(
            count = requiring.len(),
            node = %state.describe_node(node),
            "fetching metadata in parallel"
        );
        let batch: Vec<MetadataFetch> = requiring
            .iter()
            .map(|&component| MetadataFetch {
                component,
                id: state.components[component.0].id.clone(),
                version_id: state.components[component.0].version_id.clone(),
            })
            .collect();
        let outcomes = self
            .fetch_executor
            .run_all(Arc::clone(&self.metadata_resolver), batch)
            .await;
        for outcome in outcomes {
            let comp = &mut state.components[outcome.component.0];
            if comp.fast_resolve() {
                continue;
            }
            match outcome.result {
                Ok(metadata) => comp.metadata = Some(metadata),
                Err(failure) => comp.metadata_failure = Some(failure),
            }
        }
    }

    /// Attach an edge to its target component's configurations, expanding
    /// target nodes and feeding the ready queue. Serial, in edge order.
    async fn attach_edge(&self, state: &mut ResolveState, edge: EdgeIdx) {
        if state.edges[edge.0].detached {
            return;
        }
        let Some(component) = state.edges[edge.0].target else {
            return;
        };
        if !state.components[component.0].selected {
            // Unattached until conflict resolution picks this version.
            return;
        }

        if !state.components[component.0].fast_resolve() {
            let id = state.components[component.0].id.clone();
            let version_id = state.components[component.0].version_id.clone();
            match self.metadata_resolver.resolve(&id, &version_id).await {
                Ok(metadata) => state.components[component.0].metadata = Some(metadata),
                Err(failure) => state.components[component.0].metadata_failure = Some(failure),
            }
        }
        if let Some(failure) = state.components[component.0].metadata_failure.clone() {
            state.edges[edge.0].failure = Some(failure);
            return;
        }

        let configurations = match self.select_configurations(state, edge, component) {
            Ok(names) => names,
            Err(failure) => {
                state.edges[edge.0].failure = Some(failure);
                return;
            }
        };
        for name in configurations {
            let target = state.get_or_create_node(component, &name);
            if !state.nodes[target.0].incoming.contains(&edge) {
                state.nodes[target.0].incoming.push(edge);
            }
            if !state.edges[edge.0].target_nodes.contains(&target) {
                state.edges[edge.0].target_nodes.push(target);
            }
            state.nodes[target.0].selected = true;
            state.enqueue(target);
        }
    }

    /// Pick the target configurations for an edge: an explicit name wins,
    /// then attribute matching, then the default configuration.
    fn select_configurations(
        &self,
        state: &ResolveState,
        edge: EdgeIdx,
        component: ComponentIdx,
    ) -> Result<Vec<String>, ResolveFailure> {
        let target_id = &state.components[component.0].version_id;
        let Some(metadata) = state.components[component.0].metadata.as_ref() else {
            return Err(ResolveFailure::new(format!(
                "metadata for {target_id} is missing"
            )));
        };
        let dep = &state.edges[edge.0].dep;

        if let Some(name) = &dep.target_configuration {
            if metadata.configuration(name).is_some() {
                return Ok(vec![name.clone()]);
            }
            return Err(ResolveFailure::new(format!(
                "configuration '{name}' not found on {target_id}"
            )));
        }
        if !dep.attributes.is_empty() {
            if let Some(config) = metadata
                .configurations
                .iter()
                .find(|c| self.attributes_schema.compatible(&dep.attributes, &c.attributes))
            {
                return Ok(vec![config.name.clone()]);
            }
            return Err(ResolveFailure::new(format!(
                "no configuration of {target_id} matches the requested attributes"
            )));
        }
        if metadata.configuration(DEFAULT_CONFIGURATION).is_some() {
            return Ok(vec![DEFAULT_CONFIGURATION.to_string()]);
        }
        match metadata.configurations.first() {
            Some(config) => Ok(vec![config.name.clone()]),
            None => Err(ResolveFailure::new(format!(
                "{target_id} has no configurations"
            ))),
        }
    }

    /// Resolve one batched conflict and re-attach the retargeted edges.
    async fn drain_one_conflict(
        &self,
        state: &mut ResolveState,
        conflicts: &mut dyn ConflictHandler,
    ) -> JavelinResult<()> {
        let mut decisions: Vec<(ModuleId, ModuleVersionId)> = Vec::new();
        conflicts
            .resolve_next_conflict(&|module| state.candidates(module), &mut |module, winner| {
                decisions.push((module.clone(), winner.clone()));
            })
            .map_err(|failure| JavelinError::Conflict {
                message: failure.message,
            })?;

        for (module, winner) in decisions {
            state.restart_module(&module, &winner);
        }
        let retargeted = state.take_reattach();
        for edge in retargeted {
            self.attach_edge(state, edge).await;
        }
        Ok(())
    }

    fn check_cancelled(&self) -> JavelinResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(JavelinError::Cancelled.into());
        }
        Ok(())
    }

    /// Emit the selected graph in consumer-first order, tolerating cycles.
    fn assemble(&self, state: &mut ResolveState, visitor: &mut dyn GraphVisitor) {
        let root = state.root_node;
        visitor.start(&node_ref(state, root));

        for index in 0..state.selectors.len() {
            visitor.visit_selector(&selector_ref(state, SelectorIdx(index)));
        }
        // Nodes strictly before any edges.
        for index in 0..state.nodes.len() {
            if state.nodes[index].selected {
                visitor.visit_node(&node_ref(state, NodeIdx(index)));
            }
        }

        // Consumer-first walk over the selected components. A component is
        // emitted once all of its consumers are, or as soon as a cycle back
        // to it closes.
        let mut queue: Vec<ComponentIdx> = state
            .modules
            .iter()
            .filter_map(|module| module.selected)
            .collect();
        while !queue.is_empty() {
            let component = queue[0];
            match state.components[component.0].visit_state {
                VisitState::NotSeen => {
                    state.components[component.0].visit_state = VisitState::Visiting;
                    let mut pos = 0;
                    for &node in &state.components[component.0].nodes {
                        if !state.nodes[node.0].selected {
                            continue;
                        }
                        for &edge in &state.nodes[node.0].incoming {
                            if state.edges[edge.0].detached {
                                continue;
                            }
                            let owner = state.nodes[state.edges[edge.0].from.0].component;
                            if state.components[owner.0].visit_state == VisitState::NotSeen {
                                queue.insert(pos, owner);
                                pos += 1;
                            }
                        }
                    }
                    if pos == 0 {
                        // All consumers visited.
                        state.components[component.0].visit_state = VisitState::Visited;
                        queue.remove(0);
                        emit_edges(state, component, visitor);
                    }
                }
                VisitState::Visiting => {
                    // A cycle closed with no unvisited consumer left; emit
                    // this component as the cycle's representative.
                    state.components[component.0].visit_state = VisitState::Visited;
                    queue.remove(0);
                    emit_edges(state, component, visitor);
                }
                VisitState::Visited => {
                    queue.remove(0);
                }
            }
        }

        visitor.finish(&node_ref(state, root));
    }
}

fn emit_edges(state: &ResolveState, component: ComponentIdx, visitor: &mut dyn GraphVisitor) {
    for &node in &state.components[component.0].nodes {
        if !state.nodes[node.0].selected {
            continue;
        }
        let incoming = incoming_refs(state, node);
        visitor.visit_edges(&node_ref(state, node), &incoming);
    }
}

fn node_ref(state: &ResolveState, node: NodeIdx) -> NodeRef<'_> {
    let n = &state.nodes[node.0];
    NodeRef {
        id: node.0,
        component: &state.components[n.component.0].version_id,
        configuration: &n.configuration,
        is_root: n.is_root,
    }
}

fn incoming_refs(state: &ResolveState, node: NodeIdx) -> Vec<EdgeRef<'_>> {
    state.nodes[node.0]
        .incoming
        .iter()
        .filter(|&&e| !state.edges[e.0].detached)
        .filter(|&&e| state.nodes[state.edges[e.0].from.0].selected)
        .map(|&e| {
            let edge = &state.edges[e.0];
            EdgeRef {
                from_id: edge.from.0,
                from_component: &state.components[state.nodes[edge.from.0].component.0].version_id,
                dependency: &edge.dep,
                failure: edge.failure.as_ref(),
            }
        })
        .collect()
}

fn selector_ref(state: &ResolveState, selector: SelectorIdx) -> SelectorRef<'_> {
    let s = &state.selectors[selector.0];
    SelectorRef {
        requested: &s.requested,
        constraint: s.constraint.as_ref(),
        resolved: s.selected.map(|c| &state.components[c.0].version_id),
        failure: s.failure.as_ref(),
    }
}

/// Whether every filtered selector with a version constraint positively
/// agrees with `version`.
///
/// A selector agrees when its preferred selector permits short-circuiting
/// and accepts `version`, and its rejected selector (if any) does not match.
/// Selectors without a version constraint are ignored. At least one selector
/// must agree: a module carrying only unconstrained selectors always falls
/// through to conflict handling.
fn all_selectors_agree_with(
    state: &ResolveState,
    selectors: &[SelectorIdx],
    version: &str,
    filter: impl Fn(SelectorIdx) -> bool,
) -> bool {
    let mut at_least_one_agrees = false;
    for &s in selectors {
        if !filter(s) {
            continue;
        }
        let Some(constraint) = &state.selectors[s.0].constraint else {
            continue;
        };
        match constraint.preferred() {
            Some(preferred) => {
                if !preferred.can_short_circuit_when_version_already_preselected()
                    || !preferred.accept(version)
                {
                    return false;
                }
            }
            None => return false,
        }
        if let Some(rejected) = constraint.rejected() {
            if rejected.accept(version) {
                return false;
            }
        }
        at_least_one_agrees = true;
    }
    at_least_one_agrees
}

#[cfg(test)]
mod tests {
    use super::*;
    use javelin_core::metadata::{ComponentMetadata, ComponentSelector};
    use javelin_core::module::{ComponentId, ModuleVersionId};
    use crate::interfaces::RootComponent;

    fn state_with_selectors(requirements: &[&str]) -> (ResolveState, Vec<SelectorIdx>) {
        let version_id = ModuleVersionId::new("com.example", "app", "1.0");
        let root = RootComponent {
            id: ComponentId::for_version(&version_id),
            metadata: ComponentMetadata::with_default_configuration(version_id.clone(), vec![]),
            version_id,
        };
        let mut state = ResolveState::new(root, "default");
        let module = javelin_core::module::ModuleId::new("org.example", "lib");
        let selectors = requirements
            .iter()
            .map(|req| {
                state.selector_for(
                    ComponentSelector::new("org.example", "lib", req),
                    None,
                    &module,
                )
            })
            .collect();
        (state, selectors)
    }

    #[test]
    fn overlapping_ranges_agree_on_common_version() {
        let (state, selectors) = state_with_selectors(&["[1.0,2.0)", "[1.5,3.0)"]);
        assert!(all_selectors_agree_with(&state, &selectors, "1.7", |_| true));
        assert!(!all_selectors_agree_with(&state, &selectors, "1.2", |_| true));
    }

    #[test]
    fn unconstrained_selectors_cannot_agree_alone() {
        let (state, selectors) = state_with_selectors(&["[1.0,2.0)", ""]);
        // The empty requirement is ignored, the range still agrees.
        assert!(all_selectors_agree_with(&state, &selectors, "1.7", |_| true));
        // With the constrained selector filtered out, nothing agrees.
        let constrained = selectors[0];
        assert!(!all_selectors_agree_with(&state, &selectors, "1.7", |s| {
            s != constrained
        }));
    }

    #[test]
    fn dynamic_selector_blocks_agreement() {
        let (state, selectors) = state_with_selectors(&["latest.release"]);
        assert!(!all_selectors_agree_with(&state, &selectors, "9.9", |_| true));
    }

    #[test]
    fn rejected_version_blocks_agreement() {
        let version_id = ModuleVersionId::new("com.example", "app", "1.0");
        let root = RootComponent {
            id: ComponentId::for_version(&version_id),
            metadata: ComponentMetadata::with_default_configuration(version_id.clone(), vec![]),
            version_id,
        };
        let mut state = ResolveState::new(root, "default");
        let module = javelin_core::module::ModuleId::new("org.example", "lib");
        let selector = state.selector_for(
            ComponentSelector::new("org.example", "lib", "[1.0,2.0)"),
            Some("1.7".to_string()),
            &module,
        );
        assert!(!all_selectors_agree_with(&state, &[selector], "1.7", |_| true));
        assert!(all_selectors_agree_with(&state, &[selector], "1.6", |_| true));
    }
}
