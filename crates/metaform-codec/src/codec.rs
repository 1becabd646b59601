//! Public entry point: write an object as a form, read a form into an object

use crate::emitter::Emitter;
use crate::error::CodecResult;
use crate::ingestor::Submission;
use crate::projector::Projector;
use crate::template::Template;
use crate::updater::Updater;
use metaform_model::{PropertyAccessor, Specializations};
use std::fmt::Write;

/// Template bound to an object model
///
/// Cheap to build; hold one per request or share one across threads when
/// the accessor allows it.
pub struct Codec<'a, A> {
    template: &'a Template,
    accessor: &'a A,
    specializations: Specializations,
}

impl<'a, A: PropertyAccessor> Codec<'a, A> {
    /// Create codec for `template` over the model behind `accessor`
    #[must_use]
    pub fn new(template: &'a Template, accessor: &'a A) -> Self {
        Self {
            template,
            accessor,
            specializations: Specializations::new(),
        }
    }

    /// Use `specializations` when creating objects of abstract types
    #[must_use]
    pub fn with_specializations(mut self, specializations: Specializations) -> Self {
        self.specializations = specializations;
        self
    }

    /// Template in use
    #[inline]
    #[must_use]
    pub fn template(&self) -> &Template {
        self.template
    }

    /// Write `object` as a form into `sink`
    ///
    /// With `prune_empty`, blocks without data are left out; otherwise every
    /// block appears at least once, fields showing their default value.
    ///
    /// # Errors
    /// `CodecError::PathType` if a template path crosses a scalar or the
    /// accessor refuses a read; nothing is written in that case.
    /// `CodecError::Write` if the sink fails.
    pub fn write<W: Write>(&self, object: &A::Object, sink: &mut W, prune_empty: bool) -> CodecResult<()> {
        let type_name = self.accessor.type_name(object);
        tracing::debug!(type_name = %type_name, prune_empty, "projecting object");
        let root = Projector::new(self.accessor, prune_empty).project(self.template.root(), object)?;
        Emitter::new(sink, self.template.options()).emit(&root)?;
        tracing::info!(type_name = %type_name, "form written");
        Ok(())
    }

    /// Write `object` as a form into a new string
    ///
    /// # Errors
    /// Same as [`Codec::write`]
    pub fn write_to_string(&self, object: &A::Object, prune_empty: bool) -> CodecResult<String> {
        let mut out = String::new();
        self.write(object, &mut out, prune_empty)?;
        Ok(out)
    }

    /// Parse a submitted form and apply it to `destination`
    ///
    /// The whole form is parsed before `destination` is touched, so syntax
    /// errors and duplicate paths leave it unchanged. With `skip_nulls`,
    /// empty values leave properties as they are; otherwise they clear them.
    ///
    /// # Errors
    /// `CodecError::Parse` for malformed forms and values that do not fit
    /// their property, `CodecError::Configuration` when the object model
    /// cannot hold a submitted path, `CodecError::PathType` when a path
    /// continues past a scalar property
    pub fn read<I, S>(&self, lines: I, destination: &A::Object, skip_nulls: bool) -> CodecResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let submission = Submission::parse(lines, self.template.options())?;
        self.apply(&submission, destination, skip_nulls)
    }

    /// Apply an already parsed submission to `destination`
    ///
    /// # Errors
    /// Same as [`Codec::read`], minus syntax errors
    pub fn apply(&self, submission: &Submission, destination: &A::Object, skip_nulls: bool) -> CodecResult<()> {
        tracing::debug!(entries = submission.len(), skip_nulls, "applying submission");
        Updater::new(self.accessor, &self.specializations, self.template.options(), skip_nulls)
            .update(destination, submission)?;
        tracing::info!(
            type_name = %self.accessor.type_name(destination),
            entries = submission.len(),
            "form read"
        );
        Ok(())
    }
}
