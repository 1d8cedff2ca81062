// src/models/manifest.rs

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::command::{Alias, ArgSpec, CommandSpec, ParsingMode};
use super::flag::FlagSpec;
use super::value::Value;
use crate::config::AppSettings;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Could not read the manifest: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("The manifest is malformed: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Invalid default for flag \"{flag}\": {reason}")]
    InvalidDefault { flag: String, reason: String },
}

pub type ManifestResult<T> = Result<T, ManifestError>;

/// Declarative description of a whole application.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Manifest {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub flags: Vec<FlagDecl>,
    #[serde(default)]
    pub commands: Vec<CommandDecl>,
}

impl Manifest {
    pub fn load(path: &Path) -> ManifestResult<Self> {
        log::debug!("Loading manifest from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ManifestResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FlagKind {
    Bool,
    Int,
    Int64,
    Uint,
    Uint64,
    Float64,
    Duration,
    #[default]
    String,
    StringSlice,
    IntSlice,
    Int64Slice,
    Float64Slice,
    StringMap,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct FlagDecl {
    pub name: String,
    pub kind: FlagKind,
    pub aliases: Vec<String>,
    pub usage: String,
    pub env: Vec<String>,
    pub default: Option<toml::Value>,
    pub required: bool,
    pub hidden: bool,
}

impl FlagDecl {
    pub fn to_spec(&self) -> ManifestResult<FlagSpec> {
        let mut spec = match self.kind {
            FlagKind::Bool => FlagSpec::bool(&self.name),
            FlagKind::Int => FlagSpec::int(&self.name),
            FlagKind::Int64 => FlagSpec::int64(&self.name),
            FlagKind::Uint => FlagSpec::uint(&self.name),
            FlagKind::Uint64 => FlagSpec::uint64(&self.name),
            FlagKind::Float64 => FlagSpec::float64(&self.name),
            FlagKind::Duration => FlagSpec::duration(&self.name),
            FlagKind::String => FlagSpec::string(&self.name),
            FlagKind::StringSlice => FlagSpec::string_slice(&self.name),
            FlagKind::IntSlice => FlagSpec::int_slice(&self.name),
            FlagKind::Int64Slice => FlagSpec::int64_slice(&self.name),
            FlagKind::Float64Slice => FlagSpec::float64_slice(&self.name),
            FlagKind::StringMap => FlagSpec::string_map(&self.name),
        }
        .usage(&self.usage);

        spec.aliases = self.aliases.clone();
        spec.env_vars = self.env.clone();
        spec.required = self.required;
        spec.hidden = self.hidden;

        if let Some(default) = &self.default {
            spec.default = self.parse_default(spec.default.clone(), default)?;
        }
        Ok(spec)
    }

    fn parse_default(&self, mut value: Value, raw: &toml::Value) -> ManifestResult<Value> {
        let items: Vec<String> = match raw {
            toml::Value::Array(items) => items.iter().map(scalar_to_string).collect(),
            toml::Value::Table(table) => table
                .iter()
                .map(|(k, v)| format!("{}={}", k, scalar_to_string(v)))
                .collect(),
            scalar => vec![scalar_to_string(scalar)],
        };
        for (i, item) in items.iter().enumerate() {
            value
                .set(item, i == 0)
                .map_err(|reason| ManifestError::InvalidDefault {
                    flag: self.name.clone(),
                    reason,
                })?;
        }
        Ok(value)
    }
}

fn scalar_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct CommandDecl {
    pub name: String,
    pub category: String,
    pub aliases: Vec<Alias>,
    pub usage: String,
    pub description: String,
    pub mode: ParsingMode,
    pub hidden: bool,
    pub flags: Vec<FlagDecl>,
    pub args: Vec<ArgSpec>,
    /// Shell line run by the command, with `{args}`, `{arg:NAME}` and
    /// `{flag:NAME}` placeholders.
    pub exec: Option<String>,
}

impl CommandDecl {
    /// The declared command, without handlers.
    pub fn to_spec(&self) -> ManifestResult<CommandSpec> {
        let mut spec = CommandSpec::new(&self.name)
            .category(&self.category)
            .usage(&self.usage)
            .description(&self.description)
            .mode(self.mode);
        spec.aliases = self.aliases.clone();
        spec.args = self.args.clone();
        spec.hidden = self.hidden;
        for flag in &self.flags {
            spec = spec.flag(flag.to_spec()?);
        }
        Ok(spec)
    }
}
