//! [`PropertyAccessor`] over schema-described records

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::schema::Schema;
use indexmap::IndexMap;
use metaform_model::{AccessError, Property, PropertyAccessor, PropertyInfo, Scalar, ScalarKind, Value, ValueType};

/// Object model whose types come from a [`Schema`]
#[derive(Debug, Clone, Default)]
pub struct DynamicModel {
    schema: Schema,
}

impl DynamicModel {
    /// Create model over `schema`
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    /// Schema in use
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Blank record of a declared, concrete type
    #[must_use]
    pub fn create(&self, type_name: &str) -> Option<Record> {
        (self.schema.contains(type_name) && !self.schema.is_abstract(type_name)).then(|| Record::new(type_name))
    }

    /// Like [`DynamicModel::create`], with the reason on failure
    ///
    /// # Errors
    /// `ModelError::UnknownType` or `ModelError::AbstractType`
    pub fn try_create(&self, type_name: &str) -> ModelResult<Record> {
        if !self.schema.contains(type_name) {
            return Err(ModelError::UnknownType(type_name.to_string()));
        }
        if self.schema.is_abstract(type_name) {
            return Err(ModelError::AbstractType(type_name.to_string()));
        }
        Ok(Record::new(type_name))
    }

    fn check_value(&self, property: &str, info: &PropertyInfo, value: &Value<Record>) -> Result<(), AccessError> {
        let mismatch = |expected: String, actual: String| AccessError::TypeMismatch {
            property: property.to_string(),
            expected,
            actual,
        };
        match (&info.value_type, value) {
            (ValueType::Scalar(expected), Value::Scalar(scalar)) => {
                let actual = scalar.kind();
                if scalar_fits(expected, &actual) {
                    Ok(())
                } else {
                    Err(mismatch(expected.to_string(), actual.to_string()))
                }
            }
            (ValueType::Object(expected), Value::Object(record)) => {
                let actual = record.type_name();
                if self.schema.is_subtype(&actual, expected) {
                    Ok(())
                } else {
                    Err(mismatch(expected.clone(), actual))
                }
            }
            (ValueType::Scalar(expected), Value::Object(record)) => Err(mismatch(expected.to_string(), record.type_name())),
            (ValueType::Object(expected), Value::Scalar(scalar)) => {
                Err(mismatch(expected.clone(), scalar.kind().to_string()))
            }
        }
    }
}

/// Decimals are accepted where angles are declared and the reverse
fn scalar_fits(expected: &ScalarKind, actual: &ScalarKind) -> bool {
    expected == actual
        || matches!(
            (expected, actual),
            (ScalarKind::Decimal, ScalarKind::Angle) | (ScalarKind::Angle, ScalarKind::Decimal)
        )
}

impl PropertyAccessor for DynamicModel {
    type Object = Record;

    fn type_name(&self, object: &Record) -> String {
        object.type_name()
    }

    fn get(&self, object: &Record, property: &str) -> Result<Property<Record>, AccessError> {
        let type_name = object.type_name();
        if self.schema.property(&type_name, property).is_none() {
            return Err(AccessError::UnknownProperty {
                type_name,
                property: property.to_string(),
            });
        }
        Ok(object.get(property))
    }

    fn property_info(&self, type_name: &str, property: &str) -> Option<PropertyInfo> {
        self.schema.property(type_name, property).map(crate::schema::PropertyDef::info)
    }

    fn properties(&self, object: &Record) -> IndexMap<String, Property<Record>> {
        let type_name = object.type_name();
        self.schema
            .properties(&type_name)
            .into_iter()
            .filter_map(|(name, _)| {
                let value = object.get(name);
                (!value.is_empty()).then(|| (name.to_string(), value))
            })
            .collect()
    }

    fn set(&self, object: &Record, property: &str, value: Property<Record>) -> Result<(), AccessError> {
        let type_name = object.type_name();
        let info = self
            .property_info(&type_name, property)
            .ok_or_else(|| AccessError::UnknownProperty {
                type_name: type_name.clone(),
                property: property.to_string(),
            })?;
        match &value {
            Property::Absent => {}
            Property::Single(v) => self.check_value(property, &info, v)?,
            Property::Many(values) => {
                if !info.collection && values.len() > 1 {
                    return Err(AccessError::TypeMismatch {
                        property: property.to_string(),
                        expected: "a single value".to_string(),
                        actual: format!("{} values", values.len()),
                    });
                }
                for v in values {
                    self.check_value(property, &info, v)?;
                }
            }
        }
        let value = match value {
            Property::Single(v) if info.collection => Property::Many(vec![v]),
            Property::Many(mut values) if !info.collection => values.pop().map_or(Property::Absent, Property::Single),
            other => other,
        };
        object.set(property, value);
        Ok(())
    }

    fn instantiate(&self, type_name: &str) -> Option<Record> {
        self.create(type_name)
    }

    fn display(&self, object: &Record) -> String {
        let type_name = object.type_name();
        let shown = self
            .schema
            .display_property(&type_name)
            .and_then(|name| object.scalar(name));
        match shown {
            Some(Scalar::Text(text)) => text,
            Some(other) => format!("{other:?}"),
            None => type_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeDef;

    fn model() -> DynamicModel {
        DynamicModel::new(
            Schema::new()
                .with_type("Party", TypeDef::new().abstract_type().display("name").property("name", "text"))
                .with_type("Person", TypeDef::new().extends("Party").property("age", "integer"))
                .with_type(
                    "Document",
                    TypeDef::new()
                        .property("title", "text")
                        .property("owner", "Party")
                        .collection("keywords", "text"),
                ),
        )
    }

    #[test]
    fn abstract_types_are_not_instantiated() {
        let model = model();
        assert!(model.instantiate("Party").is_none());
        assert!(model.instantiate("Person").is_some());
        assert!(model.instantiate("Unknown").is_none());
        assert!(matches!(model.try_create("Party"), Err(ModelError::AbstractType(_))));
    }

    #[test]
    fn unknown_property_is_reported() {
        let model = model();
        let doc = model.create("Document").unwrap();
        assert!(matches!(model.get(&doc, "colour"), Err(AccessError::UnknownProperty { .. })));
        assert_eq!(model.get(&doc, "title").unwrap(), Property::Absent);
    }

    #[test]
    fn set_checks_types() {
        let model = model();
        let doc = model.create("Document").unwrap();
        let person = model.create("Person").unwrap();
        model.set(&doc, "owner", Property::Single(Value::Object(person))).unwrap();

        let err = model
            .set(&doc, "title", Property::Single(Value::Scalar(Scalar::Integer(3))))
            .unwrap_err();
        assert!(matches!(err, AccessError::TypeMismatch { .. }));

        let other = model.create("Document").unwrap();
        let err = model.set(&doc, "owner", Property::Single(Value::Object(other))).unwrap_err();
        assert!(matches!(err, AccessError::TypeMismatch { .. }));
    }

    #[test]
    fn cardinality_is_normalized() {
        let model = model();
        let doc = model.create("Document").unwrap();
        model
            .set(&doc, "keywords", Property::Single(Value::Scalar(Scalar::text("a"))))
            .unwrap();
        assert!(matches!(doc.get("keywords"), Property::Many(v) if v.len() == 1));
    }

    #[test]
    fn properties_follow_declaration_order() {
        let model = model();
        let doc = model.create("Document").unwrap();
        doc.set_scalars("keywords", [Scalar::text("k")]);
        doc.set_scalar("title", Scalar::text("t"));
        let names: Vec<_> = model.properties(&doc).into_keys().collect();
        assert_eq!(names, ["title", "keywords"]);
    }

    #[test]
    fn display_uses_display_property() {
        let model = model();
        let person = model.create("Person").unwrap();
        assert_eq!(model.display(&person), "Person");
        person.set_scalar("name", Scalar::text("Ada"));
        assert_eq!(model.display(&person), "Ada");
    }
}
