//! Object graph projection
//!
//! Walks a template against an object and produces the tree of occurrences
//! to emit: for each block, how many times it repeats, with which indices
//! and, for fields, which value. Projection finishes before any output is
//! written, so a path error never leaves a half-written form behind.

use crate::error::PathTypeError;
use crate::template::TemplateNode;
use metaform_model::{write_segments, AccessError, Property, PropertyAccessor, Scalar, Value};
use std::sync::Arc;

/// One occurrence of a template block
#[derive(Debug)]
pub(crate) struct ValueNode<'t> {
    pub(crate) template: &'t TemplateNode,
    /// Indices of the block's own path; empty for a block without path
    pub(crate) indices: Vec<u32>,
    pub(crate) kind: Kind<'t>,
}

#[derive(Debug)]
pub(crate) enum Kind<'t> {
    Field(Option<Scalar>),
    /// Occurrences of each child block, in template order
    Block(Vec<Vec<ValueNode<'t>>>),
}

impl ValueNode<'_> {
    /// True if nothing below this occurrence came from data
    fn is_hollow(&self) -> bool {
        match &self.kind {
            Kind::Field(_) => false,
            Kind::Block(children) => !children.is_empty() && children.iter().all(Vec::is_empty),
        }
    }
}

/// Nearest object bound by a block path, and that path's indices
struct Context<O> {
    object: Option<O>,
    indices: Vec<u32>,
}

pub(crate) struct Projector<'a, A> {
    accessor: &'a A,
    prune: bool,
}

impl<'a, A: PropertyAccessor> Projector<'a, A> {
    pub(crate) fn new(accessor: &'a A, prune: bool) -> Self {
        Self { accessor, prune }
    }

    /// Project the whole template; the root block is always present
    pub(crate) fn project<'t>(&self, root: &'t TemplateNode, object: &A::Object) -> Result<ValueNode<'t>, PathTypeError> {
        let context = Context {
            object: Some(object.clone()),
            indices: Vec::new(),
        };
        let occurrence = if root.path().is_none() {
            Some(ValueNode {
                template: root,
                indices: Vec::new(),
                kind: Kind::Block(self.children(root, &context, self.prune)?),
            })
        } else {
            self.occurrences(root, &context, self.prune)?.into_iter().next()
        };
        match occurrence {
            Some(occurrence) => Ok(occurrence),
            None => {
                tracing::debug!("no data for the root block, writing the blank form");
                self.occurrences(root, &context, false)?
                    .into_iter()
                    .next()
                    .ok_or_else(|| PathTypeError::new("", Vec::new(), "root block produced no occurrence"))
            }
        }
    }

    fn occurrences<'t>(
        &self,
        node: &'t TemplateNode,
        context: &Context<A::Object>,
        prune: bool,
    ) -> Result<Vec<ValueNode<'t>>, PathTypeError> {
        let Some(path) = node.path() else {
            let occurrence = ValueNode {
                template: node,
                indices: Vec::new(),
                kind: Kind::Block(self.children(node, context, prune)?),
            };
            if prune && occurrence.is_hollow() {
                return Ok(Vec::new());
            }
            return Ok(vec![occurrence]);
        };

        let mut found = match &context.object {
            Some(object) => self.resolve(object, path, &context.indices)?,
            None => Vec::new(),
        };
        if found.len() > node.max_occurs() {
            tracing::warn!(
                path = %path.join("."),
                found = found.len(),
                max = node.max_occurs(),
                "truncating occurrences"
            );
            found.truncate(node.max_occurs());
        }

        if found.is_empty() {
            if prune {
                return Ok(Vec::new());
            }
            let mut indices = context.indices.clone();
            indices.resize(path.len(), 0);
            let kind = if node.is_field() {
                Kind::Field(node.default_value().cloned())
            } else {
                let blank = Context {
                    object: None,
                    indices: indices.clone(),
                };
                Kind::Block(self.children(node, &blank, prune)?)
            };
            return Ok(vec![ValueNode {
                template: node,
                indices,
                kind,
            }]);
        }

        let mut occurrences = Vec::with_capacity(found.len());
        for (value, indices) in found {
            let kind = if node.is_field() {
                Kind::Field(Some(match value {
                    Value::Scalar(scalar) => scalar,
                    Value::Object(object) => Scalar::Text(self.accessor.display(&object)),
                }))
            } else {
                let object = match value {
                    Value::Object(object) => object,
                    Value::Scalar(_) => {
                        return Err(type_error(path, indices, "block path leads to a scalar"));
                    }
                };
                let nested = Context {
                    object: Some(object),
                    indices: indices.clone(),
                };
                Kind::Block(self.children(node, &nested, prune)?)
            };
            let occurrence = ValueNode {
                template: node,
                indices,
                kind,
            };
            if prune && occurrence.is_hollow() {
                continue;
            }
            occurrences.push(occurrence);
        }
        Ok(occurrences)
    }

    fn children<'t>(
        &self,
        node: &'t TemplateNode,
        context: &Context<A::Object>,
        prune: bool,
    ) -> Result<Vec<Vec<ValueNode<'t>>>, PathTypeError> {
        node.children()
            .map(|child| self.occurrences(child, context, prune))
            .collect()
    }

    /// Follow the part of `path` below the context object
    ///
    /// Returns every value reached, with the full indices leading to it:
    /// `0` through a single value, `k + 1` through the k-th element of a
    /// collection.
    fn resolve(
        &self,
        object: &A::Object,
        path: &[Arc<str>],
        base: &[u32],
    ) -> Result<Vec<(Value<A::Object>, Vec<u32>)>, PathTypeError> {
        let mut frontier = vec![(Value::Object(object.clone()), base.to_vec())];
        for (depth, segment) in path.iter().enumerate().skip(base.len()) {
            let mut next = Vec::new();
            for (value, indices) in frontier {
                let object = match value {
                    Value::Object(object) => object,
                    Value::Scalar(_) => {
                        return Err(type_error(&path[..=depth], indices, "property holds a scalar"));
                    }
                };
                let property = match self.accessor.get(&object, segment) {
                    Ok(property) => property,
                    // Subtypes of the declared type may lack the property.
                    Err(AccessError::UnknownProperty { .. }) => continue,
                    Err(e) => return Err(type_error(&path[..=depth], indices, e.to_string())),
                };
                match property {
                    Property::Absent => {}
                    Property::Single(value) => {
                        let mut indices = indices;
                        indices.push(0);
                        next.push((value, indices));
                    }
                    Property::Many(values) => {
                        for (k, value) in values.into_iter().enumerate() {
                            let mut nested = indices.clone();
                            nested.push(u32::try_from(k + 1).unwrap_or(u32::MAX));
                            next.push((value, nested));
                        }
                    }
                }
            }
            frontier = next;
        }
        Ok(frontier)
    }
}

fn type_error(path: &[Arc<str>], indices: Vec<u32>, reason: impl Into<String>) -> PathTypeError {
    let mut rendered = String::new();
    if write_segments(&mut rendered, path, &indices).is_err() {
        rendered = path.join(".");
    }
    PathTypeError::new(rendered, indices, reason)
}
