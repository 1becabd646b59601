//! Applies a parsed submission to a destination object
//!
//! Entries are visited in path order. All entries below one occurrence of a
//! nested object are contiguous, so each nested object is created (or found)
//! once and filled by a recursive visit over its slice of entries.

use crate::config::CodecOptions;
use crate::error::{CodecError, ConfigurationError, ParseError, PathTypeError};
use crate::format::coerce;
use crate::ingestor::{Submission, Submitted};
use metaform_model::{NumerotedPath, Property, PropertyAccessor, PropertyInfo, Specializations, Value, ValueType};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

type Entries<'s> = [(&'s NumerotedPath, &'s Submitted)];

pub(crate) struct Updater<'a, A> {
    accessor: &'a A,
    specializations: &'a Specializations,
    options: &'a CodecOptions,
    skip_nulls: bool,
}

/// Per-object bookkeeping for one visit
#[derive(Default)]
struct Visit {
    /// Properties already written during this visit
    assigned: HashSet<Arc<str>>,
    /// Existing collection elements handed out so far, per property
    consumed: HashMap<Arc<str>, usize>,
}

impl<'a, A: PropertyAccessor> Updater<'a, A> {
    pub(crate) fn new(
        accessor: &'a A,
        specializations: &'a Specializations,
        options: &'a CodecOptions,
        skip_nulls: bool,
    ) -> Self {
        Self {
            accessor,
            specializations,
            options,
            skip_nulls,
        }
    }

    pub(crate) fn update(&self, destination: &A::Object, submission: &Submission) -> Result<(), CodecError> {
        let entries: Vec<_> = submission.iter().collect();
        let mut cursor = 0;
        self.visit(destination, &NumerotedPath::root(), &entries, &mut cursor)
    }

    fn visit(
        &self,
        object: &A::Object,
        parent: &NumerotedPath,
        entries: &Entries<'_>,
        cursor: &mut usize,
    ) -> Result<(), CodecError> {
        let type_name = self.accessor.type_name(object);
        let depth = parent.len();
        let mut visit = Visit::default();
        while let Some(&(path, submitted)) = entries.get(*cursor) {
            if path.len() <= depth || !parent.is_prefix_of(path) {
                break;
            }
            let segment = path.segment(depth);
            let info = self
                .accessor
                .property_info(&type_name, segment)
                .ok_or_else(|| ConfigurationError::UnknownProperty {
                    type_name: type_name.clone(),
                    property: segment.to_string(),
                    path: path.truncated(depth + 1),
                })?;

            if path.len() == depth + 1 {
                self.assign(object, path, submitted, &info, &mut visit)?;
                *cursor += 1;
                continue;
            }

            let ValueType::Object(declared) = &info.value_type else {
                return Err(PathTypeError::new(
                    path.truncated(depth + 1),
                    path.indices()[..=depth].to_vec(),
                    "property holds scalars and cannot be followed",
                )
                .into());
            };
            let scope = path.prefix(depth + 1);
            if info.collection {
                self.nested_element(object, segment, declared, &scope, entries, cursor, &mut visit)?;
            } else {
                self.nested_single(object, segment, declared, &scope, entries, cursor)?;
            }
        }
        Ok(())
    }

    /// Write the value(s) of a leaf property
    fn assign(
        &self,
        object: &A::Object,
        path: &NumerotedPath,
        submitted: &Submitted,
        info: &PropertyInfo,
        visit: &mut Visit,
    ) -> Result<(), CodecError> {
        let ValueType::Scalar(kind) = &info.value_type else {
            return Err(PathTypeError::new(path.to_string(), path.indices().to_vec(), "property holds objects, not values").into());
        };
        let segment = path.segment(path.len() - 1);
        tracing::trace!(path = %path, values = submitted.values().len(), "assigning");

        let mut scalars = Vec::new();
        for raw in submitted.values() {
            let scalar = coerce(raw, kind, self.options).map_err(|reason| ParseError::InvalidValue {
                path: path.to_string(),
                value: raw.as_text().unwrap_or("null").to_string(),
                reason,
            })?;
            scalars.extend(scalar);
        }

        let already = visit.assigned.contains(segment);
        if scalars.is_empty() {
            if self.skip_nulls || already {
                return Ok(());
            }
            self.set(object, path, segment, Property::Absent)?;
            visit.assigned.insert(Arc::clone(segment));
            return Ok(());
        }

        let property = if info.collection {
            let mut values = if already {
                self.get(object, path, segment)?.into_values()
            } else {
                Vec::new()
            };
            values.extend(scalars.into_iter().map(Value::Scalar));
            Property::Many(values)
        } else {
            if scalars.len() > 1 || already {
                return Err(ConfigurationError::NotMultiValued {
                    path: path.identifiers(),
                    count: scalars.len() + usize::from(already),
                }
                .into());
            }
            let Some(scalar) = scalars.pop() else {
                return Ok(());
            };
            Property::Single(Value::Scalar(scalar))
        };
        self.set(object, path, segment, property)?;
        visit.assigned.insert(Arc::clone(segment));
        Ok(())
    }

    fn nested_single(
        &self,
        object: &A::Object,
        segment: &Arc<str>,
        declared: &str,
        scope: &NumerotedPath,
        entries: &Entries<'_>,
        cursor: &mut usize,
    ) -> Result<(), CodecError> {
        if scope.last_index() > 1 {
            return Err(ConfigurationError::NotMultiValued {
                path: scope.identifiers(),
                count: scope.last_index() as usize,
            }
            .into());
        }
        let existing = match self.get(object, scope, segment)? {
            Property::Single(Value::Object(child)) => Some(child),
            _ => None,
        };
        let child = match existing {
            Some(child) => child,
            None => self.create(declared, scope)?,
        };
        self.visit(&child, scope, entries, cursor)?;
        self.set(object, scope, segment, Property::Single(Value::Object(child)))
    }

    #[allow(clippy::too_many_arguments)]
    fn nested_element(
        &self,
        object: &A::Object,
        segment: &Arc<str>,
        declared: &str,
        scope: &NumerotedPath,
        entries: &Entries<'_>,
        cursor: &mut usize,
        visit: &mut Visit,
    ) -> Result<(), CodecError> {
        let position = visit.consumed.entry(Arc::clone(segment)).or_insert(0);
        let existing = self
            .get(object, scope, segment)?
            .into_values()
            .into_iter()
            .nth(*position)
            .and_then(|value| match value {
                Value::Object(child) => Some(child),
                Value::Scalar(_) => None,
            });
        *position += 1;

        match existing {
            Some(child) => self.visit(&child, scope, entries, cursor),
            None => {
                let child = self.create(declared, scope)?;
                self.visit(&child, scope, entries, cursor)?;
                let mut values = self.get(object, scope, segment)?.into_values();
                values.push(Value::Object(child));
                self.set(object, scope, segment, Property::Many(values))
            }
        }
    }

    fn create(&self, declared: &str, scope: &NumerotedPath) -> Result<A::Object, CodecError> {
        let concrete = self.specializations.resolve(declared);
        let created = self.accessor.instantiate(concrete).ok_or_else(|| ConfigurationError::NoSpecialization {
            type_name: declared.to_string(),
            path: scope.to_string(),
        })?;
        tracing::trace!(path = %scope, type_name = concrete, "created nested object");
        Ok(created)
    }

    fn get(&self, object: &A::Object, path: &NumerotedPath, segment: &str) -> Result<Property<A::Object>, CodecError> {
        self.accessor.get(object, segment).map_err(|source| {
            ConfigurationError::Accessor {
                path: path.to_string(),
                source,
            }
            .into()
        })
    }

    fn set(
        &self,
        object: &A::Object,
        path: &NumerotedPath,
        segment: &str,
        value: Property<A::Object>,
    ) -> Result<(), CodecError> {
        self.accessor.set(object, segment, value).map_err(|source| {
            ConfigurationError::Accessor {
                path: path.to_string(),
                source,
            }
            .into()
        })
    }
}
