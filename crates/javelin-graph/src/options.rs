//! Per-resolve tunables and the resolve context.

use serde::{Deserialize, Serialize};

/// Names the root of a resolution and the configuration to start from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveContext {
    /// Display name of the thing being resolved, e.g. `app:compileClasspath`.
    pub name: String,
    /// Configuration of the root component that seeds the traversal.
    pub root_configuration: String,
}

impl ResolveContext {
    pub fn new(name: &str, root_configuration: &str) -> Self {
        Self {
            name: name.to_string(),
            root_configuration: root_configuration.to_string(),
        }
    }
}

/// Tunables for a single resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Upper bound on concurrent metadata fetches.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    /// Minimum number of edges needing a download before the batch is
    /// dispatched in parallel. Below this, metadata is fetched serially at
    /// attachment time.
    #[serde(default = "default_parallel_fetch_threshold")]
    pub parallel_fetch_threshold: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
            parallel_fetch_threshold: default_parallel_fetch_threshold(),
        }
    }
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_parallel_fetch_threshold() -> usize {
    2
}
