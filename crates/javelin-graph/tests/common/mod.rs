#![allow(dead_code)]

//! In-memory fixtures shared by the resolver integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use javelin_core::constraint::VersionConstraint;
use javelin_core::metadata::{ComponentMetadata, ComponentSelector, DependencyMetadata};
use javelin_core::module::{ComponentId, ModuleVersionId};
use javelin_core::version::Version;
use javelin_graph::{
    ComponentIdResolver, ComponentMetadataResolver, EdgeRef, GraphBuilder, GraphCollector,
    GraphVisitor, IdResolution, NodeRef, ResolveContext, ResolveFailure, ResolvedGraph,
    RootComponent, RootComponentResolver, SelectorRef,
};

/// The set of components the fixture resolvers can see, plus counters that
/// observe how the engine talks to them.
#[derive(Default)]
pub struct Universe {
    components: HashMap<ModuleVersionId, ComponentMetadata>,
    /// Components whose metadata fetch fails even though id resolution
    /// succeeds.
    broken_metadata: HashSet<ModuleVersionId>,
    pub id_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a component with the given dependencies in its default
    /// configuration.
    pub fn publish(&mut self, coordinate: &str, dependencies: Vec<DependencyMetadata>) {
        let id = mvid(coordinate);
        self.components.insert(
            id.clone(),
            ComponentMetadata::with_default_configuration(id, dependencies),
        );
    }

    /// Publish a component with explicit configurations.
    pub fn publish_configured(
        &mut self,
        coordinate: &str,
        configurations: Vec<javelin_core::metadata::ConfigurationMetadata>,
    ) {
        let id = mvid(coordinate);
        self.components.insert(
            id.clone(),
            ComponentMetadata {
                id,
                configurations,
            },
        );
    }

    /// Publish a component whose metadata fetch will fail.
    pub fn publish_broken(&mut self, coordinate: &str) {
        let id = mvid(coordinate);
        self.broken_metadata.insert(id.clone());
        self.components.insert(
            id.clone(),
            ComponentMetadata::with_default_configuration(id, vec![]),
        );
    }

    fn resolve_id(
        &self,
        selector: &ComponentSelector,
        constraint: Option<&VersionConstraint>,
    ) -> Result<IdResolution, ResolveFailure> {
        let mut candidates: Vec<&ModuleVersionId> = self
            .components
            .keys()
            .filter(|id| id.module == selector.module)
            .collect();
        candidates.sort_by(|a, b| Version::parse(&a.version).cmp(&Version::parse(&b.version)));
        let chosen = candidates.into_iter().rev().find(|id| match constraint {
            Some(c) => c.accepts(&id.version),
            None => true,
        });
        match chosen {
            Some(id) => Ok(IdResolution::of_version(id.clone())),
            None => Err(ResolveFailure::new(format!(
                "no version of {} satisfies '{}'",
                selector.module, selector.requirement
            ))),
        }
    }
}

pub struct UniverseIdResolver(pub Arc<Universe>);

#[async_trait]
impl ComponentIdResolver for UniverseIdResolver {
    async fn resolve(
        &self,
        selector: &ComponentSelector,
        constraint: Option<&VersionConstraint>,
    ) -> Result<IdResolution, ResolveFailure> {
        self.0.id_calls.fetch_add(1, Ordering::SeqCst);
        self.0.resolve_id(selector, constraint)
    }
}

pub struct UniverseMetadataResolver {
    pub universe: Arc<Universe>,
    pub cheap: bool,
}

#[async_trait]
impl ComponentMetadataResolver for UniverseMetadataResolver {
    fn is_fetching_metadata_cheap(&self, _id: &ComponentId) -> bool {
        self.cheap
    }

    async fn resolve(
        &self,
        _id: &ComponentId,
        version_id: &ModuleVersionId,
    ) -> Result<ComponentMetadata, ResolveFailure> {
        self.universe.metadata_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.universe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.universe
            .max_in_flight
            .fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.universe.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.universe.broken_metadata.contains(version_id) {
            return Err(ResolveFailure::new(format!(
                "metadata for {version_id} is unavailable"
            )));
        }
        match self.universe.components.get(version_id) {
            Some(metadata) => Ok(metadata.clone()),
            None => Err(ResolveFailure::new(format!("unknown component {version_id}"))),
        }
    }
}

pub struct FixtureRootResolver(pub RootComponent);

#[async_trait]
impl RootComponentResolver for FixtureRootResolver {
    async fn resolve(&self, _context: &ResolveContext) -> Result<RootComponent, ResolveFailure> {
        Ok(self.0.clone())
    }
}

pub struct FailingRootResolver;

#[async_trait]
impl RootComponentResolver for FailingRootResolver {
    async fn resolve(&self, context: &ResolveContext) -> Result<RootComponent, ResolveFailure> {
        Err(ResolveFailure::new(format!(
            "cannot resolve root for {}",
            context.name
        )))
    }
}

/// Records the visitor protocol as readable event strings and forwards the
/// callbacks to a [`GraphCollector`].
#[derive(Default)]
pub struct RecordingVisitor {
    pub events: Vec<String>,
    pub collector: GraphCollector,
}

impl GraphVisitor for RecordingVisitor {
    fn start(&mut self, root: &NodeRef<'_>) {
        self.events.push(format!("start {}", root.component));
        self.collector.start(root);
    }

    fn visit_selector(&mut self, selector: &SelectorRef<'_>) {
        let outcome = match (selector.resolved, selector.failure) {
            (Some(version), _) => format!("-> {version}"),
            (None, Some(failure)) => format!("-> failed: {failure}"),
            (None, None) => "-> unresolved".to_string(),
        };
        self.events
            .push(format!("selector {} {}", selector.requested, outcome));
        self.collector.visit_selector(selector);
    }

    fn visit_node(&mut self, node: &NodeRef<'_>) {
        self.events.push(format!(
            "node {} ({})",
            node.component, node.configuration
        ));
        self.collector.visit_node(node);
    }

    fn visit_edges(&mut self, node: &NodeRef<'_>, incoming: &[EdgeRef<'_>]) {
        self.events
            .push(format!("edges {} [{}]", node.component, incoming.len()));
        self.collector.visit_edges(node, incoming);
    }

    fn finish(&mut self, root: &NodeRef<'_>) {
        self.events.push(format!("finish {}", root.component));
        self.collector.finish(root);
    }
}

pub fn mvid(coordinate: &str) -> ModuleVersionId {
    ModuleVersionId::parse(coordinate).unwrap_or_else(|| panic!("bad coordinate {coordinate}"))
}

pub fn dep(group: &str, name: &str, requirement: &str) -> DependencyMetadata {
    DependencyMetadata::new(group, name, requirement)
}

pub fn root_component(coordinate: &str, dependencies: Vec<DependencyMetadata>) -> RootComponent {
    let version_id = mvid(coordinate);
    RootComponent {
        id: ComponentId::for_version(&version_id),
        metadata: ComponentMetadata::with_default_configuration(version_id.clone(), dependencies),
        version_id,
    }
}

pub fn builder(universe: &Arc<Universe>, root: RootComponent) -> GraphBuilder {
    builder_with_cheap_metadata(universe, root, false)
}

pub fn builder_with_cheap_metadata(
    universe: &Arc<Universe>,
    root: RootComponent,
    cheap: bool,
) -> GraphBuilder {
    GraphBuilder::new(
        Arc::new(UniverseIdResolver(Arc::clone(universe))),
        Arc::new(UniverseMetadataResolver {
            universe: Arc::clone(universe),
            cheap,
        }),
        Arc::new(FixtureRootResolver(root)),
    )
}

pub fn context() -> ResolveContext {
    ResolveContext::new("app:classpath", "default")
}

/// Opt-in log output for debugging test runs, initialized the same way the
/// embedding tools do it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

/// Resolve with a fresh recording visitor and hand back the events plus the
/// collected graph.
pub async fn resolve(builder: &GraphBuilder) -> (Vec<String>, ResolvedGraph) {
    init_tracing();
    let mut visitor = RecordingVisitor::default();
    builder
        .resolve(&context(), &mut visitor)
        .await
        .expect("resolution should succeed");
    let RecordingVisitor { events, collector } = visitor;
    (events, collector.into_graph())
}

/// Index of the first event matching the predicate.
pub fn event_index(events: &[String], needle: &str) -> usize {
    events
        .iter()
        .position(|e| e.starts_with(needle))
        .unwrap_or_else(|| panic!("event '{needle}' not found in {events:?}"))
}

pub fn has_event(events: &[String], needle: &str) -> bool {
    events.iter().any(|e| e.starts_with(needle))
}
