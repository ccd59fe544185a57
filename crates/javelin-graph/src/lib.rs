//! Dependency graph construction for the Javelin resolution engine.
//!
//! Given a resolve context and a set of external resolvers, [`GraphBuilder`]
//! walks the transitive graph of module versions, resolves version conflicts,
//! batches metadata fetches in parallel, and emits the selected graph to a
//! [`GraphVisitor`] in consumer-first order.
//!
//! The engine owns graph traversal and selection only. Repository I/O,
//! metadata parsing and artifact downloads live behind the resolver traits in
//! [`interfaces`].

pub mod builder;
pub mod collector;
pub mod conflict;
pub mod interfaces;
pub mod options;
pub mod visitor;

mod component;
mod edge;
mod fetch;
mod node;
mod pending;
mod selector_state;
mod state;

pub use builder::{EdgeFilter, GraphBuilder};
pub use collector::{GraphCollector, ResolvedDependency, ResolvedGraph, ResolvedNode, SelectorFailure};
pub use conflict::{
    ConflictCandidate, ConflictHandler, ConflictResolver, DefaultConflictHandler,
    DirectDependencyForcingResolver, LatestVersionResolver, PotentialConflict,
};
pub use interfaces::{
    ComponentIdResolver, ComponentMetadataResolver, DefaultSelectorConverter, IdResolution,
    MapReplacements, ModuleReplacements, NoReplacements, NoSubstitution, ResolveFailure,
    RootComponent, RootComponentResolver, SelectorConverter, SubstitutionApplicator,
};
pub use options::{ResolveContext, ResolveOptions};
pub use visitor::{EdgeRef, GraphVisitor, NodeRef, SelectorRef};
