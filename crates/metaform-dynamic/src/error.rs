//! Error types for the dynamic model

/// Schema or data does not fit the dynamic model
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Schema text is not valid TOML or has the wrong shape
    #[error("invalid schema: {0}")]
    Schema(#[from] toml::de::Error),

    /// Data document is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Type name not declared in the schema
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// `extends` names an undeclared type
    #[error("type {type_name} extends unknown type {parent}")]
    UnknownParent { type_name: String, parent: String },

    /// `extends` chain loops back on itself
    #[error("inheritance cycle through type {0}")]
    InheritanceCycle(String),

    /// Property declared with an empty type
    #[error("property {type_name}.{property} declares no type")]
    MissingPropertyType { type_name: String, property: String },

    /// Abstract type used where an instance is needed
    #[error("type {0} is abstract")]
    AbstractType(String),

    /// Data does not match the schema
    #[error("{path}: {reason}")]
    Invalid { path: String, reason: String },
}

impl ModelError {
    /// Create invalid-data error
    pub fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;
