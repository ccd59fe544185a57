//! Version conflict detection, batching, and resolution.
//!
//! Candidates are registered as the traversal discovers them; conflicts are
//! batched and resolved one at a time once the ready queue drains. Winners
//! are picked by a chain of [`ConflictResolver`]s, ending in latest-wins.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::debug;

use javelin_core::module::{ModuleId, ModuleVersionId};
use javelin_core::version::Version;

use crate::interfaces::{ModuleReplacements, ResolveFailure};

/// One candidate version of a module, as presented to conflict resolvers.
#[derive(Debug, Clone)]
pub struct ConflictCandidate {
    pub id: ModuleVersionId,
    /// False when the version has already been ruled out.
    pub selectable: bool,
    /// True when a forced dependency declared directly on the root resolves
    /// to this version.
    pub forced_by_root: bool,
}

/// Picks a winner among the candidates of a conflict, or defers to the next
/// resolver in the chain.
pub trait ConflictResolver: Send + Sync {
    fn select(&self, candidates: &[ConflictCandidate]) -> Option<ModuleVersionId>;
}

/// Constraints declared directly on the root dominate transitive ones: the
/// first candidate carried by a forced root edge wins outright.
#[derive(Debug, Default)]
pub struct DirectDependencyForcingResolver;

impl ConflictResolver for DirectDependencyForcingResolver {
    fn select(&self, candidates: &[ConflictCandidate]) -> Option<ModuleVersionId> {
        candidates
            .iter()
            .find(|c| c.forced_by_root)
            .map(|c| c.id.clone())
    }
}

/// The default tie-break: highest version wins. The first candidate wins
/// among equal versions, keeping the outcome deterministic.
#[derive(Debug, Default)]
pub struct LatestVersionResolver;

impl ConflictResolver for LatestVersionResolver {
    fn select(&self, candidates: &[ConflictCandidate]) -> Option<ModuleVersionId> {
        let mut best: Option<(&ConflictCandidate, Version)> = None;
        for candidate in candidates {
            let version = Version::parse(&candidate.id.version);
            match &best {
                Some((_, current)) if version <= *current => {}
                _ => best = Some((candidate, version)),
            }
        }
        best.map(|(c, _)| c.id.clone())
    }
}

/// Describes a detected conflict: every module dragged in through candidate
/// overlap or a replacement relation.
#[derive(Debug, Clone, Default)]
pub struct PotentialConflict {
    participants: Vec<ModuleId>,
}

impl PotentialConflict {
    pub(crate) fn none() -> Self {
        Self::default()
    }

    pub(crate) fn of(participants: Vec<ModuleId>) -> Self {
        Self { participants }
    }

    pub fn conflict_exists(&self) -> bool {
        !self.participants.is_empty()
    }

    pub fn with_participating_modules(&self, mut action: impl FnMut(&ModuleId)) {
        for module in &self.participants {
            action(module);
        }
    }
}

/// Supplies the current candidates of a module when a conflict is resolved.
pub type CandidateProvider<'a> = dyn Fn(&ModuleId) -> Vec<ConflictCandidate> + 'a;

/// The contract the traversal driver consumes.
pub trait ConflictHandler {
    /// Add a tie-break resolver. Resolvers run in registration order, before
    /// the latest-wins fallback.
    fn register_resolver(&mut self, resolver: Box<dyn ConflictResolver>);

    /// Record a candidate module with the number of versions currently in
    /// play. Returns the conflict it creates or joins, if any.
    fn register_module(&mut self, module: &ModuleId, versions_in_play: usize) -> PotentialConflict;

    fn has_conflicts(&self) -> bool;

    /// Resolve one batched conflict: pick a winner among the participating
    /// modules' candidates and invoke `action(module, winner)` for every
    /// participant.
    fn resolve_next_conflict(
        &mut self,
        candidates: &CandidateProvider<'_>,
        action: &mut dyn FnMut(&ModuleId, &ModuleVersionId),
    ) -> Result<(), ResolveFailure>;
}

/// Replacement-aware conflict handler with latest-wins as the final word.
pub struct DefaultConflictHandler {
    replacements: Arc<dyn ModuleReplacements>,
    resolvers: Vec<Box<dyn ConflictResolver>>,
    fallback: LatestVersionResolver,
    queue: VecDeque<Vec<ModuleId>>,
    seen: HashSet<ModuleId>,
}

impl DefaultConflictHandler {
    pub fn new(replacements: Arc<dyn ModuleReplacements>) -> Self {
        Self {
            replacements,
            resolvers: Vec::new(),
            fallback: LatestVersionResolver,
            queue: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Modules pulled into a conflict with `module` through replacement
    /// relations, in deterministic order.
    fn replacement_participants(&self, module: &ModuleId) -> Vec<ModuleId> {
        let mut extra = Vec::new();
        if let Some(target) = self.replacements.replacement_for(module) {
            if self.seen.contains(&target) && target != *module {
                extra.push(target);
            }
        }
        let mut sources: Vec<ModuleId> = self
            .seen
            .iter()
            .filter(|m| *m != module && self.replacements.replacement_for(m).as_ref() == Some(module))
            .cloned()
            .collect();
        sources.sort();
        extra.extend(sources);
        extra
    }

    fn enqueue_conflict(&mut self, mut participants: Vec<ModuleId>) -> Vec<ModuleId> {
        // Merge with any queued conflict sharing a participant.
        let queued: Vec<Vec<ModuleId>> = self.queue.drain(..).collect();
        for existing in queued {
            if existing.iter().any(|m| participants.contains(m)) {
                for m in existing {
                    if !participants.contains(&m) {
                        participants.push(m);
                    }
                }
            } else {
                self.queue.push_back(existing);
            }
        }
        self.queue.push_back(participants.clone());
        participants
    }

    /// Among the participants, modules that replace another participant
    /// shadow the replaced candidates entirely.
    fn candidate_pool(
        &self,
        participants: &[ModuleId],
        provider: &CandidateProvider<'_>,
    ) -> Vec<ConflictCandidate> {
        let targets: Vec<&ModuleId> = participants
            .iter()
            .filter(|m| {
                participants
                    .iter()
                    .any(|other| self.replacements.replacement_for(other).as_ref() == Some(*m))
            })
            .collect();
        let pool_from: Vec<&ModuleId> = if targets.is_empty() {
            participants.iter().collect()
        } else {
            targets
        };
        pool_from.into_iter().flat_map(|m| provider(m)).collect()
    }
}

impl ConflictHandler for DefaultConflictHandler {
    fn register_resolver(&mut self, resolver: Box<dyn ConflictResolver>) {
        self.resolvers.push(resolver);
    }

    fn register_module(&mut self, module: &ModuleId, versions_in_play: usize) -> PotentialConflict {
        self.seen.insert(module.clone());
        let mut participants = vec![module.clone()];
        participants.extend(self.replacement_participants(module));

        let conflict = versions_in_play > 1 || participants.len() > 1;
        if !conflict {
            return PotentialConflict::none();
        }
        let participants = self.enqueue_conflict(participants);
        debug!(module = %module, participants = participants.len(), "registered version conflict");
        PotentialConflict::of(participants)
    }

    fn has_conflicts(&self) -> bool {
        !self.queue.is_empty()
    }

    fn resolve_next_conflict(
        &mut self,
        candidates: &CandidateProvider<'_>,
        action: &mut dyn FnMut(&ModuleId, &ModuleVersionId),
    ) -> Result<(), ResolveFailure> {
        let Some(participants) = self.queue.pop_front() else {
            return Ok(());
        };

        let pool = self.candidate_pool(&participants, candidates);
        if pool.is_empty() {
            return Err(ResolveFailure::new(format!(
                "no candidate versions for conflicting modules {}",
                participants
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let mut winner = None;
        for resolver in &self.resolvers {
            winner = resolver.select(&pool);
            if winner.is_some() {
                break;
            }
        }
        let winner = match winner {
            Some(w) => w,
            None => self
                .fallback
                .select(&pool)
                .expect("non-empty candidate pool"),
        };
        debug!(winner = %winner, "resolved version conflict");

        for module in &participants {
            action(module, &winner);
        }
        Ok(())
    }
}
