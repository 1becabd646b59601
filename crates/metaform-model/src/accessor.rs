//! Property accessor capability
//!
//! The codec never inspects a concrete metadata model directly. Every read,
//! write and introspection goes through [`PropertyAccessor`], implemented once
//! per object model.

use crate::scalar::{Scalar, ScalarKind};
use indexmap::IndexMap;

/// Value held by a property: a nested object or a leaf scalar
#[derive(Debug, Clone, PartialEq)]
pub enum Value<O> {
    /// Nested metadata object
    Object(O),
    /// Leaf value
    Scalar(Scalar),
}

impl<O> Value<O> {
    /// Get nested object, if this is one
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&O> {
        match self {
            Self::Object(o) => Some(o),
            Self::Scalar(_) => None,
        }
    }

    /// Get scalar, if this is one
    #[inline]
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Object(_) => None,
            Self::Scalar(s) => Some(s),
        }
    }
}

/// Current content of a property
#[derive(Debug, Clone, PartialEq)]
pub enum Property<O> {
    /// No value
    Absent,
    /// Single-valued property
    Single(Value<O>),
    /// Collection-valued property, in collection order
    Many(Vec<Value<O>>),
}

impl<O> Property<O> {
    /// Check if the property holds no value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Single(_) => false,
            Self::Many(values) => values.is_empty(),
        }
    }

    /// Flatten into a list of values
    #[must_use]
    pub fn into_values(self) -> Vec<Value<O>> {
        match self {
            Self::Absent => Vec::new(),
            Self::Single(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl<O> Default for Property<O> {
    fn default() -> Self {
        Self::Absent
    }
}

/// Declared type of a property's values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// Nested objects of the named (possibly abstract) type
    Object(String),
    /// Leaf values of the given kind
    Scalar(ScalarKind),
}

/// Static description of one property of a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    /// True if the property holds an ordered collection
    pub collection: bool,
    /// Declared type of the values (element type for collections)
    pub value_type: ValueType,
}

impl PropertyInfo {
    /// Single-valued property
    #[inline]
    #[must_use]
    pub fn single(value_type: ValueType) -> Self {
        Self {
            collection: false,
            value_type,
        }
    }

    /// Collection-valued property
    #[inline]
    #[must_use]
    pub fn collection(value_type: ValueType) -> Self {
        Self {
            collection: true,
            value_type,
        }
    }
}

/// Errors reported by accessor implementations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccessError {
    /// Type declares no such property
    #[error("type {type_name} has no property '{property}'")]
    UnknownProperty { type_name: String, property: String },

    /// Value cannot be interpreted as a metadata object
    #[error("value of type {0} is not a metadata object")]
    NotAnObject(String),

    /// Value does not fit the property's declared type
    #[error("property '{property}' expects {expected}, got {actual}")]
    TypeMismatch {
        property: String,
        expected: String,
        actual: String,
    },

    /// Property cannot be written
    #[error("property '{0}' is read-only")]
    ReadOnly(String),
}

/// Reflective access to one object model
///
/// `Object` is a cheap handle to a model instance. Handles must share state:
/// mutating a nested object obtained through [`PropertyAccessor::get`] is
/// visible through its parent.
pub trait PropertyAccessor {
    /// Handle to an object of the model
    type Object: Clone;

    /// Name of the object's runtime type
    fn type_name(&self, object: &Self::Object) -> String;

    /// Current value of `property` on `object`
    ///
    /// # Errors
    /// `AccessError::UnknownProperty` if the object's type has no such
    /// property; `AccessError::NotAnObject` if the handle cannot be read
    fn get(&self, object: &Self::Object, property: &str) -> Result<Property<Self::Object>, AccessError>;

    /// Description of `property` as declared by `type_name`
    fn property_info(&self, type_name: &str, property: &str) -> Option<PropertyInfo>;

    /// All non-empty properties of `object`, in declaration order
    fn properties(&self, object: &Self::Object) -> IndexMap<String, Property<Self::Object>>;

    /// Replace the value of `property` on `object`
    ///
    /// # Errors
    /// Returns error if the property is unknown, read-only, or the value
    /// does not fit its declared type
    fn set(&self, object: &Self::Object, property: &str, value: Property<Self::Object>) -> Result<(), AccessError>;

    /// Blank instance of `type_name`, or `None` for abstract or unknown types
    fn instantiate(&self, type_name: &str) -> Option<Self::Object>;

    /// String form of an object bound to a field
    fn display(&self, object: &Self::Object) -> String;
}
