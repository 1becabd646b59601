//! Codec options

use serde::{Deserialize, Serialize};

/// Default upper bound on the length of one physical line (1 MiB)
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1 << 20;

/// Tunables shared by template loading, writing and reading
///
/// Every field has a default, so a partial TOML table is accepted:
///
/// ```toml
/// max_line_length = 65536
/// date_pattern = "%d/%m/%Y"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Lines longer than this (in bytes) are rejected
    pub max_line_length: usize,
    /// `chrono` pattern for fields rendered as dates
    pub date_pattern: String,
    /// `chrono` pattern for fields rendered as date-times
    pub date_time_pattern: String,
    /// Default of the `prune_empty` flag for callers that do not choose
    pub prune_empty: bool,
    /// Default of the `skip_nulls` flag for callers that do not choose
    pub skip_nulls: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            date_pattern: "%Y-%m-%d".to_string(),
            date_time_pattern: "%Y-%m-%d %H:%M:%S".to_string(),
            prune_empty: true,
            skip_nulls: true,
        }
    }
}
