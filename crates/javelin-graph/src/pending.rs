//! Deferral of constraint-only dependency declarations.
//!
//! A constraint narrows the version of a module but does not by itself pull
//! the module into the graph. Constraint edges are parked here until some
//! hard dependency requires the same module; activation re-queues the nodes
//! that declared them so the parked edges materialize on the next visit.

use std::collections::HashMap;
use std::mem;

use javelin_core::module::ModuleId;

use crate::state::NodeIdx;

#[derive(Debug, Default)]
pub(crate) struct PendingDependenciesHandler {
    modules: HashMap<ModuleId, PendingModule>,
}

#[derive(Debug, Default)]
struct PendingModule {
    active: bool,
    deferred: Vec<NodeIdx>,
}

impl PendingDependenciesHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a hard dependency has already been seen for this module.
    pub fn is_active(&self, module: &ModuleId) -> bool {
        self.modules.get(module).is_some_and(|m| m.active)
    }

    /// Park a constraint declared on `from` until the module activates.
    pub fn defer(&mut self, module: ModuleId, from: NodeIdx) {
        let entry = self.modules.entry(module).or_default();
        if !entry.deferred.contains(&from) {
            entry.deferred.push(from);
        }
    }

    /// A hard dependency targets this module: mark it active and hand back
    /// the nodes whose parked constraints should be revisited.
    pub fn activate(&mut self, module: &ModuleId) -> Vec<NodeIdx> {
        let entry = self.modules.entry(module.clone()).or_default();
        entry.active = true;
        mem::take(&mut entry.deferred)
    }
}
