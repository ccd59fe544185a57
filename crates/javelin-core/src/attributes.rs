//! Typed variant-selection attributes.
//!
//! Components expose configurations carrying attribute maps (usage, target
//! platform, and so on). When an edge is attached, the schema matches the
//! attributes requested by the dependency against each candidate
//! configuration.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// An immutable, ordered attribute map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Attributes {
    entries: BTreeMap<String, String>,
}

impl Attributes {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Interning factory for attribute maps.
///
/// Node materialization creates the same small attribute maps over and over;
/// the factory hands out shared instances so equality checks stay cheap.
#[derive(Debug, Default)]
pub struct AttributesFactory {
    interned: HashMap<Attributes, Arc<Attributes>>,
}

impl AttributesFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, attributes: Attributes) -> Arc<Attributes> {
        if let Some(existing) = self.interned.get(&attributes) {
            return Arc::clone(existing);
        }
        let shared = Arc::new(attributes.clone());
        self.interned.insert(attributes, Arc::clone(&shared));
        shared
    }
}

/// Compatibility rules between requested and provided attributes.
///
/// The default schema treats attributes as exact-match: a candidate is
/// compatible when every requested key is either absent from the candidate
/// or carries the same value.
#[derive(Debug, Clone, Default)]
pub struct AttributesSchema;

impl AttributesSchema {
    pub fn new() -> Self {
        Self
    }

    pub fn compatible(&self, requested: &Attributes, candidate: &Attributes) -> bool {
        requested
            .iter()
            .all(|(key, value)| candidate.get(key).is_none_or(|have| have == value))
    }
}
