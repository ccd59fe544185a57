//! Shared utilities for the Javelin resolution engine.
//!
//! Cross-cutting concerns used by the other Javelin crates: the unified
//! error type and the cooperative cancellation token checked by the
//! traversal driver.

pub mod cancel;
pub mod errors;
