//! JSON import and export of records
//!
//! Objects carry their type under `"@type"`. Scalars map to the closest JSON
//! type: numbers for integers, decimals and angles, booleans for flags,
//! strings for everything else (codes as `List.CODE`, dates as RFC 3339).

use crate::error::{ModelError, ModelResult};
use crate::model::DynamicModel;
use crate::record::Record;
use chrono::{DateTime, TimeZone, Utc};
use metaform_model::{CodeValue, Property, Scalar, ScalarKind, Value, ValueType};
use serde_json::{Map, Number, Value as Json};

/// Key holding an object's type name
pub const TYPE_KEY: &str = "@type";

impl DynamicModel {
    /// Export `record` and everything below it
    #[must_use]
    pub fn to_json(&self, record: &Record) -> Json {
        let mut map = Map::new();
        map.insert(TYPE_KEY.to_string(), Json::String(record.type_name()));
        for (name, property) in record.properties() {
            let json = match property {
                Property::Absent => continue,
                Property::Single(value) => self.value_to_json(&value),
                Property::Many(values) => Json::Array(values.iter().map(|v| self.value_to_json(v)).collect()),
            };
            map.insert(name, json);
        }
        Json::Object(map)
    }

    fn value_to_json(&self, value: &Value<Record>) -> Json {
        match value {
            Value::Object(record) => self.to_json(record),
            Value::Scalar(scalar) => scalar_to_json(scalar),
        }
    }

    /// Import a record from JSON text
    ///
    /// # Errors
    /// Same as [`DynamicModel::from_json`], plus malformed JSON
    pub fn from_json_str(&self, text: &str, root_type: Option<&str>) -> ModelResult<Record> {
        let json: Json = serde_json::from_str(text)?;
        self.from_json(&json, root_type)
    }

    /// Import a record
    ///
    /// The root type is taken from `"@type"`, or from `root_type` when the
    /// document has none.
    ///
    /// # Errors
    /// `ModelError` if a type is unknown or abstract, a property is not
    /// declared, or a value does not fit its property
    pub fn from_json(&self, json: &Json, root_type: Option<&str>) -> ModelResult<Record> {
        let declared = json
            .get(TYPE_KEY)
            .and_then(Json::as_str)
            .or(root_type)
            .ok_or_else(|| ModelError::invalid("$", format!("missing {TYPE_KEY}")))?;
        self.object_from_json(json, declared, "$")
    }

    fn object_from_json(&self, json: &Json, declared: &str, path: &str) -> ModelResult<Record> {
        let Json::Object(map) = json else {
            return Err(ModelError::invalid(path, "expected an object"));
        };
        let type_name = map.get(TYPE_KEY).and_then(Json::as_str).unwrap_or(declared);
        if !self.schema().is_subtype(type_name, declared) {
            return Err(ModelError::invalid(path, format!("{type_name} is not a {declared}")));
        }
        let record = self.try_create(type_name)?;
        for (name, value) in map {
            if name == TYPE_KEY || value.is_null() {
                continue;
            }
            let at = format!("{path}.{name}");
            let info = self
                .schema()
                .property(type_name, name)
                .ok_or_else(|| ModelError::invalid(&at, format!("{type_name} has no such property")))?
                .info();
            let property = if info.collection {
                let items = match value {
                    Json::Array(items) => items.as_slice(),
                    single => std::slice::from_ref(single),
                };
                let values = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.value_from_json(item, &info.value_type, &format!("{at}[{}]", i + 1)))
                    .collect::<ModelResult<Vec<_>>>()?;
                Property::Many(values)
            } else {
                Property::Single(self.value_from_json(value, &info.value_type, &at)?)
            };
            record.set(name.clone(), property);
        }
        Ok(record)
    }

    fn value_from_json(&self, json: &Json, value_type: &ValueType, path: &str) -> ModelResult<Value<Record>> {
        match value_type {
            ValueType::Object(declared) => Ok(Value::Object(self.object_from_json(json, declared, path)?)),
            ValueType::Scalar(kind) => scalar_from_json(json, kind)
                .map(Value::Scalar)
                .ok_or_else(|| ModelError::invalid(path, format!("expected {kind}"))),
        }
    }
}

fn scalar_to_json(scalar: &Scalar) -> Json {
    match scalar {
        Scalar::Text(s) | Scalar::Locale(s) | Scalar::Charset(s) => Json::String(s.clone()),
        Scalar::Integer(i) => Json::Number((*i).into()),
        Scalar::Decimal(d) | Scalar::Angle(d) => Number::from_f64(*d).map_or(Json::Null, Json::Number),
        Scalar::Boolean(b) => Json::Bool(*b),
        Scalar::Code(code) => Json::String(code.to_string()),
        Scalar::Date(date) => Json::String(date.to_rfc3339()),
    }
}

fn scalar_from_json(json: &Json, kind: &ScalarKind) -> Option<Scalar> {
    Some(match kind {
        ScalarKind::Text => Scalar::Text(json.as_str()?.to_string()),
        ScalarKind::Integer => Scalar::Integer(json.as_i64()?),
        ScalarKind::Decimal => Scalar::Decimal(json.as_f64()?),
        ScalarKind::Angle => Scalar::Angle(json.as_f64()?),
        ScalarKind::Boolean => Scalar::Boolean(json.as_bool()?),
        ScalarKind::Code(list) => {
            let text = json.as_str()?;
            let code = match text.split_once('.') {
                Some((prefix, code)) if prefix == list => code,
                Some(_) => return None,
                None => text,
            };
            Scalar::Code(CodeValue::new(list, code))
        }
        ScalarKind::Date => match json {
            Json::Number(n) => Scalar::Date(Utc.timestamp_millis_opt(n.as_i64()?).single()?),
            Json::String(s) => Scalar::Date(DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc)),
            _ => return None,
        },
        ScalarKind::Locale => Scalar::Locale(json.as_str()?.to_string()),
        ScalarKind::Charset => Scalar::Charset(json.as_str()?.to_string()),
    })
}
