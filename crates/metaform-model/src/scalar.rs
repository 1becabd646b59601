//! Leaf values carried by metadata properties

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Leaf (non-object) property value
///
/// The variants mirror the value families the form format renders
/// differently: numbers and angles unquoted, codes and locales with a type
/// prefix, dates according to the field's render mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Free text
    Text(String),
    /// Whole number
    Integer(i64),
    /// Decimal number
    Decimal(f64),
    /// Boolean flag
    Boolean(bool),
    /// Angle in decimal degrees
    Angle(f64),
    /// Member of a code list
    Code(CodeValue),
    /// Instant in time
    Date(DateTime<Utc>),
    /// Language as a 3-letter ISO 639-2 code
    Locale(String),
    /// Character set by canonical name
    Charset(String),
}

impl Scalar {
    /// Create a text scalar
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Create a code list scalar
    #[inline]
    #[must_use]
    pub fn code(list: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Code(CodeValue::new(list, code))
    }

    /// Kind this value belongs to
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Text(_) => ScalarKind::Text,
            Self::Integer(_) => ScalarKind::Integer,
            Self::Decimal(_) => ScalarKind::Decimal,
            Self::Boolean(_) => ScalarKind::Boolean,
            Self::Angle(_) => ScalarKind::Angle,
            Self::Code(c) => ScalarKind::Code(c.list.clone()),
            Self::Date(_) => ScalarKind::Date,
            Self::Locale(_) => ScalarKind::Locale,
            Self::Charset(_) => ScalarKind::Charset,
        }
    }
}

/// Code list member, rendered `List.CODE`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeValue {
    /// Code list type name, e.g. `CI_RoleCode`
    pub list: String,
    /// Member identifier, e.g. `author`
    pub code: String,
}

impl CodeValue {
    /// Create code value
    #[inline]
    #[must_use]
    pub fn new(list: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            list: list.into(),
            code: code.into(),
        }
    }
}

impl Display for CodeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.list, self.code)
    }
}

/// Declared kind of a leaf property
///
/// Drives the conversion of submitted text back into a [`Scalar`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Text,
    Integer,
    Decimal,
    Boolean,
    Angle,
    /// Code list, with its type name
    Code(String),
    Date,
    Locale,
    Charset,
}

impl ScalarKind {
    /// Parse the names used in schemas: `text`, `integer`, `code:CI_RoleCode`...
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(list) = name.strip_prefix("code:") {
            return (!list.is_empty()).then(|| Self::Code(list.to_string()));
        }
        Some(match name {
            "text" => Self::Text,
            "integer" => Self::Integer,
            "decimal" => Self::Decimal,
            "boolean" => Self::Boolean,
            "angle" => Self::Angle,
            "date" => Self::Date,
            "locale" => Self::Locale,
            "charset" => Self::Charset,
            _ => return None,
        })
    }
}

impl Display for ScalarKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Integer => f.write_str("integer"),
            Self::Decimal => f.write_str("decimal"),
            Self::Boolean => f.write_str("boolean"),
            Self::Angle => f.write_str("angle"),
            Self::Code(list) => write!(f, "code:{list}"),
            Self::Date => f.write_str("date"),
            Self::Locale => f.write_str("locale"),
            Self::Charset => f.write_str("charset"),
        }
    }
}
