//! Error types for the form codec
//!
//! Provides error handling for:
//! - Template loading and form ingestion (syntax, paths, values)
//! - Path resolution against the object graph
//! - Object model configuration (specializations, unknown properties)

use metaform_model::{AccessError, PathError};

/// Malformed template or submitted form
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Input ended inside an unterminated block
    #[error("line {line}: unexpected end of input")]
    UnexpectedEnd { line: usize },

    /// Physical line above the configured limit
    #[error("line {line}: length {length} exceeds the limit of {limit} bytes")]
    LineTooLong { line: usize, length: usize, limit: usize },

    /// Line does not follow the format
    #[error("line {line}: {message}: {content}")]
    Syntax {
        line: usize,
        message: String,
        content: String,
    },

    /// Path attribute is not a valid numeroted path
    #[error("line {line}: invalid path \"{path}\": {source}")]
    InvalidPath {
        line: usize,
        path: String,
        #[source]
        source: PathError,
    },

    /// Value attribute before any path in its block
    #[error("line {line}: value has no preceding path")]
    MissingPath { line: usize },

    /// Second value submitted for a non-repeatable path
    #[error("line {line}: duplicate value for non-repeatable path \"{path}\"")]
    DuplicatePath { line: usize, path: String },

    /// Path does not strictly extend the enclosing block's path
    #[error("line {line}: path \"{path}\" does not extend its parent path \"{parent}\"")]
    PathNotNested { line: usize, path: String, parent: String },

    /// Block carries both a value slot and child blocks
    #[error("line {line}: block is both a field and a container")]
    FieldWithContent { line: usize },

    /// Field without a path attribute
    #[error("line {line}: field declares no path")]
    FieldWithoutPath { line: usize },

    /// Multiplicity attribute is not a positive integer
    #[error("line {line}: multiplicity must be a positive integer, found {found}")]
    InvalidMultiplicity { line: usize, found: String },

    /// Submitted value cannot be converted to the property type
    #[error("invalid value {value:?} for \"{path}\": {reason}")]
    InvalidValue {
        path: String,
        value: String,
        reason: String,
    },
}

impl ParseError {
    /// Create syntax error for line
    pub fn syntax(line: usize, message: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
            content: content.into(),
        }
    }

    /// Line number the error refers to, if any
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::UnexpectedEnd { line }
            | Self::LineTooLong { line, .. }
            | Self::Syntax { line, .. }
            | Self::InvalidPath { line, .. }
            | Self::MissingPath { line }
            | Self::DuplicatePath { line, .. }
            | Self::PathNotNested { line, .. }
            | Self::FieldWithContent { line }
            | Self::FieldWithoutPath { line }
            | Self::InvalidMultiplicity { line, .. } => Some(*line),
            Self::InvalidValue { .. } => None,
        }
    }
}

/// Declared path cannot be followed through the object graph
#[derive(Debug, thiserror::Error)]
#[error("cannot resolve \"{path}\" (occurrences {indices:?}): {reason}")]
pub struct PathTypeError {
    /// Dotted path truncated at the failing segment
    pub path: String,
    /// Occurrence indices up to the failing segment
    pub indices: Vec<u32>,
    /// What went wrong at that segment
    pub reason: String,
}

impl PathTypeError {
    /// Create path type error
    pub fn new(path: impl Into<String>, indices: Vec<u32>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            indices,
            reason: reason.into(),
        }
    }
}

/// Object model cannot satisfy a path
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// Abstract type with no registered concrete specialization
    #[error("no concrete specialization for type {type_name} (at \"{path}\")")]
    NoSpecialization { type_name: String, path: String },

    /// Destination type exposes no property for a path segment
    #[error("type {type_name} has no property '{property}' (at \"{path}\")")]
    UnknownProperty {
        type_name: String,
        property: String,
        path: String,
    },

    /// Several values submitted for a single-valued property
    #[error("{count} values submitted for single-valued property \"{path}\"")]
    NotMultiValued { path: String, count: usize },

    /// Accessor rejected an operation
    #[error("accessor failed at \"{path}\": {source}")]
    Accessor {
        path: String,
        #[source]
        source: AccessError,
    },
}

/// Combined codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("path type error: {0}")]
    PathType(#[from] PathTypeError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("write error: {0}")]
    Write(#[from] std::fmt::Error),
}

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError::DuplicatePath {
            line: 12,
            path: "citation.title".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "line 12: duplicate value for non-repeatable path \"citation.title\""
        );
        assert_eq!(err.line(), Some(12));
    }

    #[test]
    fn path_type_error_display() {
        let err = PathTypeError::new("contact[2].name.first", vec![2, 0], "property 'name' holds a scalar");
        assert!(err.to_string().contains("contact[2].name.first"));
        assert!(err.to_string().contains("[2, 0]"));
    }

    #[test]
    fn error_conversions() {
        let err: CodecError = ParseError::MissingPath { line: 3 }.into();
        assert!(matches!(err, CodecError::Parse(_)));

        let err: CodecError = ConfigurationError::NotMultiValued {
            path: "title".into(),
            count: 2,
        }
        .into();
        assert!(matches!(err, CodecError::Configuration(_)));
    }
}
