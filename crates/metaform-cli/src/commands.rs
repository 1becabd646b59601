//! Subcommand implementations
//!
//! Each command returns the text to print so it can be exercised without a
//! process boundary.

use crate::config::CliConfig;
use anyhow::{anyhow, Context};
use metaform_codec::{Codec, Template};
use metaform_dynamic::{DynamicModel, Schema};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Arguments of `metaform write`
#[derive(Debug, Clone, Default)]
pub struct WriteArgs {
    /// Schema file, overriding the configuration
    pub schema: Option<PathBuf>,
    /// Template file
    pub template: PathBuf,
    /// JSON document to render
    pub object: PathBuf,
    /// Root type when the document has no `@type`
    pub root: Option<String>,
    /// Pruning, overriding the configuration
    pub prune: Option<bool>,
}

/// Arguments of `metaform read`
#[derive(Debug, Clone, Default)]
pub struct ReadArgs {
    /// Schema file, overriding the configuration
    pub schema: Option<PathBuf>,
    /// Template file
    pub template: PathBuf,
    /// Submitted form
    pub form: PathBuf,
    /// Existing JSON document to update; a blank root object otherwise
    pub object: Option<PathBuf>,
    /// Root type
    pub root: Option<String>,
    /// Null handling, overriding the configuration
    pub skip_nulls: Option<bool>,
}

/// Render a JSON document as a form
///
/// # Errors
/// Returns error if an input cannot be loaded or the codec fails
pub fn write(config: &CliConfig, args: &WriteArgs) -> anyhow::Result<String> {
    let model = load_model(config, args.schema.as_deref())?;
    let template = load_template(config, &args.template)?;
    let root = args.root.as_deref().or(config.root_type.as_deref());

    let text = read_file(&args.object)?;
    let object = model
        .from_json_str(&text, root)
        .with_context(|| format!("loading object {}", args.object.display()))?;

    let prune = args.prune.unwrap_or(config.codec.prune_empty);
    let codec = Codec::new(&template, &model).with_specializations(config.specializations.clone());
    codec
        .write_to_string(&object, prune)
        .with_context(|| format!("writing form for {}", args.object.display()))
}

/// Apply a submitted form and return the resulting document as JSON
///
/// # Errors
/// Returns error if an input cannot be loaded or the codec fails
pub fn read(config: &CliConfig, args: &ReadArgs) -> anyhow::Result<String> {
    let model = load_model(config, args.schema.as_deref())?;
    let template = load_template(config, &args.template)?;
    let root = args.root.as_deref().or(config.root_type.as_deref());

    let destination = match &args.object {
        Some(path) => model
            .from_json_str(&read_file(path)?, root)
            .with_context(|| format!("loading object {}", path.display()))?,
        None => {
            let root = root.ok_or_else(|| anyhow!("--root is required when no object is given"))?;
            model.try_create(root)?
        }
    };

    let form = read_file(&args.form)?;
    let skip_nulls = args.skip_nulls.unwrap_or(config.codec.skip_nulls);
    let codec = Codec::new(&template, &model).with_specializations(config.specializations.clone());
    codec
        .read(form.lines(), &destination, skip_nulls)
        .with_context(|| format!("reading form {}", args.form.display()))?;

    let mut out = serde_json::to_string_pretty(&model.to_json(&destination))?;
    out.push('\n');
    Ok(out)
}

/// Parse a template and report its shape
///
/// # Errors
/// Returns error if the template cannot be read or parsed
pub fn check(config: &CliConfig, template: &Path) -> anyhow::Result<String> {
    let parsed = load_template(config, template)?;
    let stats = parsed.stats();
    let mut out = String::new();
    writeln!(out, "{}: ok", template.display())?;
    writeln!(out, "  blocks: {}", stats.nodes)?;
    writeln!(out, "  fields: {}", stats.fields)?;
    writeln!(out, "  paths:  {}", stats.paths)?;
    Ok(out)
}

fn load_model(config: &CliConfig, schema: Option<&Path>) -> anyhow::Result<DynamicModel> {
    let path = schema
        .or(config.schema.as_deref())
        .ok_or_else(|| anyhow!("no schema given (use --schema or set `schema` in the config file)"))?;
    let schema = Schema::from_toml(&read_file(path)?).with_context(|| format!("loading schema {}", path.display()))?;
    tracing::debug!(schema = %path.display(), types = schema.types().count(), "schema loaded");
    Ok(DynamicModel::new(schema))
}

fn load_template(config: &CliConfig, path: &Path) -> anyhow::Result<Template> {
    let text = read_file(path)?;
    Template::parse(text.lines(), config.codec.clone()).with_context(|| format!("loading template {}", path.display()))
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
