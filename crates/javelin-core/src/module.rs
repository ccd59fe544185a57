//! Module, module-version, and component identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a module independent of its version: `(group, name)`.
///
/// Equality is by value. Two occurrences of `org.example:lib` are the same
/// module no matter which versions are in play.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    pub group: String,
    pub name: String,
}

impl ModuleId {
    pub fn new(group: &str, name: &str) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// A module pinned to a specific version string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleVersionId {
    pub module: ModuleId,
    pub version: String,
}

impl ModuleVersionId {
    pub fn new(group: &str, name: &str, version: &str) -> Self {
        Self {
            module: ModuleId::new(group, name),
            version: version.to_string(),
        }
    }

    /// Parse `"group:name:version"` shorthand.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, name, version] => Some(Self::new(group, name, version)),
            _ => None,
        }
    }
}

impl fmt::Display for ModuleVersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.version)
    }
}

/// An opaque, resolver-assigned component identity.
///
/// Resolvers may mint these however they like (repository URLs, project
/// paths). The engine only compares them and derives a default form from a
/// [`ModuleVersionId`] when the resolver does not supply one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId {
    repr: String,
}

impl ComponentId {
    pub fn new(repr: impl Into<String>) -> Self {
        Self { repr: repr.into() }
    }

    /// The default identity for a module version.
    pub fn for_version(id: &ModuleVersionId) -> Self {
        Self {
            repr: format!("module:{id}"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.repr
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_id_display() {
        let id = ModuleId::new("org.example", "lib");
        assert_eq!(id.to_string(), "org.example:lib");
    }

    #[test]
    fn version_id_parse_roundtrip() {
        let s = "org.example:lib:1.4.2";
        let id = ModuleVersionId::parse(s).unwrap();
        assert_eq!(id.module.group, "org.example");
        assert_eq!(id.module.name, "lib");
        assert_eq!(id.version, "1.4.2");
        assert_eq!(id.to_string(), s);
    }

    #[test]
    fn version_id_parse_rejects_short_forms() {
        assert!(ModuleVersionId::parse("org.example:lib").is_none());
        assert!(ModuleVersionId::parse("").is_none());
    }

    #[test]
    fn component_id_for_version_is_stable() {
        let v = ModuleVersionId::new("org.example", "lib", "1.0");
        assert_eq!(ComponentId::for_version(&v), ComponentId::for_version(&v));
    }
}
