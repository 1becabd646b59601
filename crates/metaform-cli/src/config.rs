//! Configuration file for the `metaform` tool
//!
//! ```toml
//! schema = "schemas/iso19115.toml"
//! root_type = "Metadata"
//!
//! [codec]
//! date_pattern = "%d/%m/%Y"
//! prune_empty = false
//!
//! [specializations]
//! Party = "Organisation"
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use anyhow::Context;
use metaform_codec::CodecOptions;
use metaform_model::Specializations;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings shared by all subcommands
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Schema file used when `--schema` is not given
    pub schema: Option<PathBuf>,
    /// Root object type used when `--root` is not given
    pub root_type: Option<String>,
    /// Codec tunables
    pub codec: CodecOptions,
    /// Concrete types to create for abstract ones
    pub specializations: Specializations,
}

impl CliConfig {
    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not valid TOML
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let mut config: Self = toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        if let (Some(schema), Some(dir)) = (config.schema.as_mut(), path.parent()) {
            if schema.is_relative() {
                *schema = dir.join(&*schema);
            }
        }
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise
    ///
    /// # Errors
    /// Same as [`CliConfig::load`]
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
