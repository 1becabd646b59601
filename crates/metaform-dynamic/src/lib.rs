//! Dynamic object model for the metaform codec
//!
//! Types are declared in a [`Schema`] (usually TOML) instead of Rust code.
//! [`Record`] handles share state, so the codec can fill a nested object
//! after attaching it to its parent. [`DynamicModel`] implements
//! [`PropertyAccessor`] over them and converts records to and from JSON.
//!
//! # Example
//!
//! ```rust
//! use metaform_dynamic::{DynamicModel, Schema};
//! use metaform_model::{PropertyAccessor, Scalar};
//!
//! let schema: Schema = "[types.Document.properties]\ntitle = \"text\"".parse().unwrap();
//! let model = DynamicModel::new(schema);
//! let doc = model.create("Document").unwrap();
//! doc.set_scalar("title", Scalar::text("Ocean Survey"));
//! assert_eq!(model.properties(&doc).len(), 1);
//! ```
//!
//! [`PropertyAccessor`]: metaform_model::PropertyAccessor

#![warn(unreachable_pub)]

mod error;
mod json;
mod model;
mod record;
mod schema;

pub use error::{ModelError, ModelResult};
pub use json::TYPE_KEY;
pub use model::DynamicModel;
pub use record::Record;
pub use schema::{PropertyDef, Schema, TypeDef};
