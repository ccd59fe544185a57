//! Resolved version constraints: a preferred selector plus an optional veto.

use crate::selector::VersionSelector;

/// What a dependency declaration asks for once its requirement strings are
/// parsed: a preferred selector (the accept set) and an optional rejected
/// selector (the veto set).
#[derive(Debug, Clone)]
pub struct VersionConstraint {
    preferred: Option<VersionSelector>,
    rejected: Option<VersionSelector>,
}

impl VersionConstraint {
    /// A constraint that prefers versions matched by `requirement`.
    pub fn require(requirement: &str) -> Self {
        Self {
            preferred: Some(VersionSelector::parse(requirement)),
            rejected: None,
        }
    }

    /// A constraint with both an accept set and a veto set.
    pub fn require_rejecting(requirement: &str, reject: &str) -> Self {
        Self {
            preferred: Some(VersionSelector::parse(requirement)),
            rejected: Some(VersionSelector::parse(reject)),
        }
    }

    /// Parse from optional requirement strings. Returns `None` when there is
    /// no requirement at all; such declarations place no constraint on the
    /// version and are ignored by agreement checks.
    pub fn from_strings(requirement: &str, reject: Option<&str>) -> Option<Self> {
        if requirement.trim().is_empty() {
            return None;
        }
        Some(Self {
            preferred: Some(VersionSelector::parse(requirement)),
            rejected: reject
                .filter(|r| !r.trim().is_empty())
                .map(VersionSelector::parse),
        })
    }

    pub fn preferred(&self) -> Option<&VersionSelector> {
        self.preferred.as_ref()
    }

    pub fn rejected(&self) -> Option<&VersionSelector> {
        self.rejected.as_ref()
    }

    /// Whether `version` is inside the accept set and outside the veto set.
    pub fn accepts(&self, version: &str) -> bool {
        if let Some(preferred) = &self.preferred {
            if !preferred.accept(version) {
                return false;
            }
        }
        match &self.rejected {
            Some(rejected) => !rejected.accept(version),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_accepts_matching() {
        let c = VersionConstraint::require("[1.0,2.0)");
        assert!(c.accepts("1.5"));
        assert!(!c.accepts("2.1"));
    }

    #[test]
    fn reject_vetoes_inside_accept_set() {
        let c = VersionConstraint::require_rejecting("[1.0,2.0)", "1.3");
        assert!(c.accepts("1.2"));
        assert!(!c.accepts("1.3"));
    }

    #[test]
    fn empty_requirement_is_no_constraint() {
        assert!(VersionConstraint::from_strings("", None).is_none());
        assert!(VersionConstraint::from_strings("  ", None).is_none());
    }

    #[test]
    fn from_strings_with_reject() {
        let c = VersionConstraint::from_strings("1.+", Some("1.4")).unwrap();
        assert!(c.accepts("1.2"));
        assert!(!c.accepts("1.4"));
    }
}
