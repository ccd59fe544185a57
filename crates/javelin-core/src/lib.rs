//! Core data types for the Javelin resolution engine.
//!
//! This crate defines the vocabulary of dependency resolution: module and
//! component identifiers, the version ordering and range grammar, version
//! selectors and constraints, component and dependency metadata, variant
//! attributes, and exclude rules.
//!
//! This crate is intentionally free of async code and I/O.

pub mod attributes;
pub mod constraint;
pub mod exclude;
pub mod metadata;
pub mod module;
pub mod selector;
pub mod version;
