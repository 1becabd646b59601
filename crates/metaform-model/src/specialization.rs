//! Abstract to concrete type mapping used when creating nested objects

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Mapping from abstract (interface) types to the concrete type instantiated
/// in their place
///
/// Types without an entry resolve to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Specializations {
    map: IndexMap<String, String>,
}

impl Specializations {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, abstract_type: impl Into<String>, concrete_type: impl Into<String>) -> Self {
        self.insert(abstract_type, concrete_type);
        self
    }

    /// Register the concrete type for `abstract_type`
    pub fn insert(&mut self, abstract_type: impl Into<String>, concrete_type: impl Into<String>) {
        self.map.insert(abstract_type.into(), concrete_type.into());
    }

    /// Concrete type to instantiate for `type_name`
    #[inline]
    #[must_use]
    pub fn resolve<'a>(&'a self, type_name: &'a str) -> &'a str {
        self.map.get(type_name).map_or(type_name, String::as_str)
    }

    /// Number of registered mappings
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if no mapping is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over `(abstract, concrete)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<A: Into<String>, C: Into<String>> FromIterator<(A, C)> for Specializations {
    fn from_iter<T: IntoIterator<Item = (A, C)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (a, c) in iter {
            table.insert(a, c);
        }
        table
    }
}
