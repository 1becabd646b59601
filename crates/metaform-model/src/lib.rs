//! Metaform object model seam
//!
//! Vocabulary shared by the form codec and the object models it drives.
//!
//! # Core Concepts
//!
//! - [`PropertyAccessor`]: reflective get/set/introspect capability over one object model
//! - [`Scalar`]: leaf values (text, numbers, codes, dates, locales...)
//! - [`NumerotedPath`]: dotted property path with per-segment occurrence indices
//! - [`Specializations`]: abstract → concrete type table used when creating objects
//!
//! # Example
//!
//! ```rust
//! use metaform_model::NumerotedPath;
//!
//! let mut paths: Vec<NumerotedPath> = ["a[2].b", "a[1].c", "a[1].b"]
//!     .iter()
//!     .map(|p| p.parse().unwrap())
//!     .collect();
//! paths.sort();
//! assert_eq!(paths[0].to_string(), "a[1].b");
//! ```

#![warn(unreachable_pub)]

mod accessor;
mod path;
mod scalar;
mod specialization;

pub use accessor::{AccessError, Property, PropertyAccessor, PropertyInfo, Value, ValueType};
pub use path::{write_segments, NumerotedPath, PathError};
pub use scalar::{CodeValue, Scalar, ScalarKind};
pub use specialization::Specializations;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
