use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all Javelin operations.
///
/// Only failures that abort an entire resolve are surfaced through this type.
/// Recoverable per-edge failures are recorded on the graph and reported to
/// the visitor instead.
#[derive(Debug, Error, Diagnostic)]
pub enum JavelinError {
    /// The root component of the resolve context could not be resolved.
    #[error("Failed to resolve root component: {message}")]
    #[diagnostic(help("Check that the resolve context names a resolvable project"))]
    RootResolution { message: String },

    /// The conflict handler failed while resolving a version conflict.
    #[error("Version conflict resolution failed: {message}")]
    Conflict { message: String },

    /// The embedding build cancelled the resolve.
    #[error("Dependency resolution was cancelled")]
    Cancelled,

    /// Dependency resolution failed for a reason not covered above.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type JavelinResult<T> = miette::Result<T>;
