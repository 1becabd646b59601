//! Metaform form codec
//!
//! Converts metadata object graphs to and from a line-oriented, JSON-like
//! form, driven by a reusable template.
//!
//! # Core Concepts
//!
//! - [`Template`]: parsed once, shared read-only; blocks carry a property
//!   path, an optional value slot, a multiplicity and literal lines
//! - [`Codec`]: binds a template to a [`PropertyAccessor`] and writes or
//!   reads forms
//! - [`Submission`]: a submitted form as a sorted path → value(s) map
//!
//! # Example
//!
//! ```rust,ignore
//! use metaform_codec::{Codec, Template};
//!
//! let template: Template = std::fs::read_to_string("form.tpl")?.parse()?;
//! let codec = Codec::new(&template, &model);
//!
//! let form = codec.write_to_string(&record, true)?;
//! codec.read(form.lines(), &blank_record, true)?;
//! ```
//!
//! [`PropertyAccessor`]: metaform_model::PropertyAccessor

#![warn(unreachable_pub)]

mod codec;
mod config;
mod emitter;
mod error;
mod format;
mod ingestor;
mod intern;
mod lexer;
mod projector;
mod template;
mod updater;

pub use codec::Codec;
pub use config::{CodecOptions, DEFAULT_MAX_LINE_LENGTH};
pub use error::{CodecError, CodecResult, ConfigurationError, ParseError, PathTypeError};
pub use format::{coerce, write_quoted, write_scalar, DateRender, LOCALE_PREFIX};
pub use ingestor::{Submission, Submitted};
pub use intern::pool_size;
pub use lexer::{RawValue, Separator};
pub use template::{Template, TemplateNode, TemplateStats};

/// Attribute names understood by the codec
pub mod keywords {
    pub use crate::template::{CONTENT, DEFAULT_VALUE, MULTIPLICITY, PATH, RENDER, VALUE};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
