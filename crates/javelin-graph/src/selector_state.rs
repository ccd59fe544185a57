//! Selector state: one declared requirement and its resolution outcome.

use javelin_core::constraint::VersionConstraint;
use javelin_core::metadata::ComponentSelector;

use crate::interfaces::ResolveFailure;
use crate::state::ComponentIdx;

/// One dependency requirement after substitution, shared by every edge that
/// declares it identically.
///
/// `selected` tracks the component the selector currently points at; it is
/// retargeted when conflict resolution or a compatible re-selection changes
/// the module's chosen version. The component's `all_resolvers` list keeps
/// the original resolution history.
#[derive(Debug)]
pub(crate) struct SelectorState {
    pub requested: ComponentSelector,
    pub constraint: Option<VersionConstraint>,
    pub selected: Option<ComponentIdx>,
    pub failure: Option<ResolveFailure>,
    /// Whether id resolution has been attempted. Failed selectors are not
    /// retried within one resolve.
    pub resolved: bool,
}

impl SelectorState {
    pub fn new(requested: ComponentSelector, constraint: Option<VersionConstraint>) -> Self {
        Self {
            requested,
            constraint,
            selected: None,
            failure: None,
            resolved: false,
        }
    }
}
