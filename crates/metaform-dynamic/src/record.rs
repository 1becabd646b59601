//! Shared, mutable object instances

use indexmap::IndexMap;
use metaform_model::{Property, Scalar, Value};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Handle to one object of the dynamic model
///
/// Clones share the same underlying object: a nested record obtained from
/// its parent and then modified is modified in the parent too.
#[derive(Clone)]
pub struct Record {
    inner: Arc<RwLock<RecordData>>,
}

struct RecordData {
    type_name: String,
    properties: IndexMap<String, Property<Record>>,
}

impl Record {
    /// Create empty record of `type_name`
    ///
    /// No schema check is made; use [`DynamicModel::create`] for that.
    ///
    /// [`DynamicModel::create`]: crate::DynamicModel::create
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RecordData {
                type_name: type_name.into(),
                properties: IndexMap::new(),
            })),
        }
    }

    /// Runtime type name
    #[must_use]
    pub fn type_name(&self) -> String {
        self.inner.read().type_name.clone()
    }

    /// Current value of `name`, `Absent` if never set
    #[must_use]
    pub fn get(&self, name: &str) -> Property<Record> {
        self.inner.read().properties.get(name).cloned().unwrap_or_default()
    }

    /// Replace `name`; setting `Absent` removes it
    pub fn set(&self, name: impl Into<String>, value: Property<Record>) {
        let name = name.into();
        let mut data = self.inner.write();
        if value.is_empty() {
            data.properties.shift_remove(&name);
        } else {
            data.properties.insert(name, value);
        }
    }

    /// Set a single scalar
    pub fn set_scalar(&self, name: impl Into<String>, value: Scalar) {
        self.set(name, Property::Single(Value::Scalar(value)));
    }

    /// Set a list of scalars
    pub fn set_scalars(&self, name: impl Into<String>, values: impl IntoIterator<Item = Scalar>) {
        self.set(name, Property::Many(values.into_iter().map(Value::Scalar).collect()));
    }

    /// Set a single nested record
    pub fn set_object(&self, name: impl Into<String>, value: Record) {
        self.set(name, Property::Single(Value::Object(value)));
    }

    /// Set a list of nested records
    pub fn set_many(&self, name: impl Into<String>, values: impl IntoIterator<Item = Record>) {
        self.set(name, Property::Many(values.into_iter().map(Value::Object).collect()));
    }

    /// Single scalar of `name`, if that is what it holds
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<Scalar> {
        match self.get(name) {
            Property::Single(Value::Scalar(scalar)) => Some(scalar),
            _ => None,
        }
    }

    /// Non-empty properties in insertion order
    #[must_use]
    pub fn properties(&self) -> IndexMap<String, Property<Record>> {
        self.inner.read().properties.clone()
    }

    /// Check if both handles point to the same object
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Deep copy, sharing nothing with `self`
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        let data = self.inner.read();
        let copy = Self::new(data.type_name.clone());
        for (name, property) in &data.properties {
            let property = match property {
                Property::Absent => Property::Absent,
                Property::Single(value) => Property::Single(deep_value(value)),
                Property::Many(values) => Property::Many(values.iter().map(deep_value).collect()),
            };
            copy.set(name.clone(), property);
        }
        copy
    }
}

fn deep_value(value: &Value<Record>) -> Value<Record> {
    match value {
        Value::Object(record) => Value::Object(record.deep_clone()),
        Value::Scalar(scalar) => Value::Scalar(scalar.clone()),
    }
}

/// Structural equality: same type and equal properties, property order aside
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let left = self.inner.read();
        let right = other.inner.read();
        left.type_name == right.type_name
            && left.properties.len() == right.properties.len()
            && left
                .properties
                .iter()
                .all(|(name, value)| right.properties.get(name) == Some(value))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.read();
        let mut out = f.debug_struct(&data.type_name);
        for (name, value) in &data.properties {
            out.field(name, value);
        }
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let parent = Record::new("Document");
        let child = Record::new("Party");
        parent.set_many("contact", vec![child.clone()]);

        child.set_scalar("name", Scalar::text("Ada"));
        let Property::Many(values) = parent.get("contact") else { panic!("contact is a list") };
        let stored = values[0].as_object().unwrap();
        assert!(stored.ptr_eq(&child));
        assert_eq!(stored.scalar("name"), Some(Scalar::text("Ada")));
    }

    #[test]
    fn setting_absent_removes() {
        let record = Record::new("Document");
        record.set_scalar("title", Scalar::text("t"));
        record.set("title", Property::Absent);
        assert!(record.properties().is_empty());
        assert_eq!(record.get("title"), Property::Absent);
    }

    #[test]
    fn equality_is_structural() {
        let a = Record::new("Document");
        let b = Record::new("Document");
        a.set_scalar("title", Scalar::text("t"));
        a.set_scalars("keywords", [Scalar::text("x")]);
        b.set_scalars("keywords", [Scalar::text("x")]);
        assert_ne!(a, b);
        b.set_scalar("title", Scalar::text("t"));
        assert_eq!(a, b);
        assert_ne!(a, Record::new("Other"));
    }

    #[test]
    fn deep_clone_detaches() {
        let parent = Record::new("Document");
        let child = Record::new("Party");
        parent.set_object("owner", child.clone());
        let copy = parent.deep_clone();
        assert_eq!(copy, parent);
        child.set_scalar("name", Scalar::text("changed"));
        assert_ne!(copy, parent);
    }
}
