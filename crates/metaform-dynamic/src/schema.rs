//! Type declarations for the dynamic model
//!
//! A schema is usually loaded from TOML:
//!
//! ```toml
//! [types.Party]
//! abstract = true
//! display = "name"
//!
//! [types.Party.properties]
//! name = "text"
//! role = "code:CI_RoleCode"
//!
//! [types.Person]
//! extends = "Party"
//!
//! [types.Document.properties]
//! title = "text"
//! keywords = { type = "text", collection = true }
//! contact = { type = "Party", collection = true }
//! ```
//!
//! Property types are scalar kind names (`text`, `integer`, `decimal`,
//! `boolean`, `angle`, `date`, `locale`, `charset`, `code:<List>`) or the name
//! of another declared type.

use crate::error::{ModelError, ModelResult};
use indexmap::IndexMap;
use metaform_model::{PropertyInfo, ScalarKind, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Declared types, by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    types: IndexMap<String, TypeDef>,
}

/// One declared type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Parent type whose properties are inherited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Abstract types cannot be instantiated
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Text property shown when an object is bound to a field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Own properties, in declaration order
    #[serde(default)]
    pub properties: IndexMap<String, PropertyDef>,
}

/// Declared property: `"text"` or `{ type = "Party", collection = true }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyDef {
    /// Single-valued property of the given type
    Short(String),
    /// Property with explicit cardinality
    Full {
        #[serde(rename = "type")]
        value_type: String,
        #[serde(default)]
        collection: bool,
    },
}

impl PropertyDef {
    /// Type name as written in the schema
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Short(name) | Self::Full { value_type: name, .. } => name,
        }
    }

    /// True for collection properties
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Full { collection: true, .. })
    }

    /// Codec-facing description
    #[must_use]
    pub fn info(&self) -> PropertyInfo {
        let value_type = match ScalarKind::from_name(self.type_name()) {
            Some(kind) => ValueType::Scalar(kind),
            None => ValueType::Object(self.type_name().to_string()),
        };
        PropertyInfo {
            collection: self.is_collection(),
            value_type,
        }
    }
}

impl TypeDef {
    /// Create empty concrete type
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inherit from `parent`
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    /// Mark as abstract
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Show `property` when an object of this type is bound to a field
    #[must_use]
    pub fn display(mut self, property: impl Into<String>) -> Self {
        self.display = Some(property.into());
        self
    }

    /// Add single-valued property
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, value_type: impl Into<String>) -> Self {
        self.properties.insert(name.into(), PropertyDef::Short(value_type.into()));
        self
    }

    /// Add collection property
    #[must_use]
    pub fn collection(mut self, name: impl Into<String>, value_type: impl Into<String>) -> Self {
        self.properties.insert(
            name.into(),
            PropertyDef::Full {
                value_type: value_type.into(),
                collection: true,
            },
        );
        self
    }
}

impl Schema {
    /// Create empty schema
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace type `name`
    #[must_use]
    pub fn with_type(mut self, name: impl Into<String>, def: TypeDef) -> Self {
        self.types.insert(name.into(), def);
        self
    }

    /// Parse and validate a TOML schema
    ///
    /// # Errors
    /// Returns `ModelError` for malformed TOML or an inconsistent schema
    pub fn from_toml(text: &str) -> ModelResult<Self> {
        let schema: Self = toml::from_str(text)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Check that parents and property types are declared and that no
    /// inheritance chain loops
    ///
    /// # Errors
    /// Returns the first inconsistency found
    pub fn validate(&self) -> ModelResult<()> {
        for (name, def) in &self.types {
            let mut seen = HashSet::new();
            let mut current = name.as_str();
            while let Some(parent) = self.types.get(current).and_then(|d| d.extends.as_deref()) {
                if !self.types.contains_key(parent) {
                    return Err(ModelError::UnknownParent {
                        type_name: current.to_string(),
                        parent: parent.to_string(),
                    });
                }
                if !seen.insert(parent) || parent == name.as_str() {
                    return Err(ModelError::InheritanceCycle(name.clone()));
                }
                current = parent;
            }
            for (property, prop) in &def.properties {
                if prop.type_name().is_empty() {
                    return Err(ModelError::MissingPropertyType {
                        type_name: name.clone(),
                        property: property.clone(),
                    });
                }
                if let ValueType::Object(target) = prop.info().value_type {
                    if !self.types.contains_key(&target) {
                        return Err(ModelError::UnknownType(target));
                    }
                }
            }
        }
        Ok(())
    }

    /// Declaration of `name`
    #[must_use]
    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Check if `name` is declared
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Check if `name` is declared abstract
    #[must_use]
    pub fn is_abstract(&self, name: &str) -> bool {
        self.types.get(name).is_some_and(|d| d.is_abstract)
    }

    /// All declared types
    pub fn types(&self) -> impl Iterator<Item = (&str, &TypeDef)> {
        self.types.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// `name` followed by its ancestors, nearest first
    fn lineage<'a>(&'a self, name: &str) -> impl Iterator<Item = (&'a str, &'a TypeDef)> + 'a {
        let mut next = self.types.get_key_value(name);
        // At most one step per declared type.
        let mut remaining = self.types.len();
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let (key, def) = next?;
            next = def.extends.as_deref().and_then(|parent| self.types.get_key_value(parent));
            Some((key.as_str(), def))
        })
    }

    /// Declaration of `property`, own or inherited
    #[must_use]
    pub fn property(&self, type_name: &str, property: &str) -> Option<&PropertyDef> {
        self.lineage(type_name).find_map(|(_, def)| def.properties.get(property))
    }

    /// All properties of `type_name`, ancestors' first
    #[must_use]
    pub fn properties(&self, type_name: &str) -> Vec<(&str, &PropertyDef)> {
        let chain: Vec<_> = self.lineage(type_name).collect();
        chain
            .into_iter()
            .rev()
            .flat_map(|(_, def)| def.properties.iter().map(|(name, prop)| (name.as_str(), prop)))
            .collect()
    }

    /// Check if `sub` is `sup` or inherits from it
    #[must_use]
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        self.lineage(sub).any(|(name, _)| name == sup)
    }

    /// Display property of `type_name`, own or inherited
    #[must_use]
    pub fn display_property(&self, type_name: &str) -> Option<&str> {
        self.lineage(type_name).find_map(|(_, def)| def.display.as_deref())
    }
}

impl FromStr for Schema {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_toml(s)
    }
}
