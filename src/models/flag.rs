// src/models/flag.rs

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use super::value::{Generic, Value};
use crate::constants::{
    ANSI_FLAG, DEFAULT_LOG_LEVEL, HELP_FLAG, HELP_FLAG_ALIAS, LOG_LEVEL_FLAG, NO_ANSI_FLAG,
    NO_INTERACTION_FLAG, QUIET_FLAG, QUIET_FLAG_ALIAS, VERBOSE_FLAG, VERBOSE_SHORT_FLAG,
    VERBOSITY_SHORTCUTS, VERSION_FLAG,
};
use crate::core::context::Context;

/// Callback run on an explicitly given flag once parsing succeeded.
pub type Validator = Rc<dyn Fn(&Context<'_>, &Value) -> anyhow::Result<()>>;

/// Shared cell a flag writes its final value into.
pub type Destination = Rc<RefCell<Value>>;

/// One declared flag: a canonical name, its aliases and a typed default.
#[derive(Clone)]
pub struct FlagSpec {
    pub name: String,
    pub aliases: Vec<String>,
    /// Repeated one to three times to form the verbosity shortcuts.
    pub shortcut: Option<String>,
    pub usage: String,
    pub env_vars: Vec<String>,
    pub hidden: bool,
    pub required: bool,
    pub default_text: String,
    pub default: Value,
    pub validator: Option<Validator>,
    pub destination: Option<Destination>,
}

impl fmt::Debug for FlagSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

impl FlagSpec {
    pub fn new(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            shortcut: None,
            usage: String::new(),
            env_vars: Vec::new(),
            hidden: false,
            required: false,
            default_text: String::new(),
            default,
            validator: None,
            destination: None,
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, Value::Bool(false))
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, Value::Int(0))
    }

    pub fn int64(name: impl Into<String>) -> Self {
        Self::new(name, Value::Int64(0))
    }

    pub fn uint(name: impl Into<String>) -> Self {
        Self::new(name, Value::Uint(0))
    }

    pub fn uint64(name: impl Into<String>) -> Self {
        Self::new(name, Value::Uint64(0))
    }

    pub fn float64(name: impl Into<String>) -> Self {
        Self::new(name, Value::Float64(0.0))
    }

    pub fn duration(name: impl Into<String>) -> Self {
        Self::new(name, Value::Duration(Duration::ZERO))
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, Value::String(String::new()))
    }

    pub fn string_slice(name: impl Into<String>) -> Self {
        Self::new(name, Value::StringSlice(Vec::new()))
    }

    pub fn int_slice(name: impl Into<String>) -> Self {
        Self::new(name, Value::IntSlice(Vec::new()))
    }

    pub fn int64_slice(name: impl Into<String>) -> Self {
        Self::new(name, Value::Int64Slice(Vec::new()))
    }

    pub fn float64_slice(name: impl Into<String>) -> Self {
        Self::new(name, Value::Float64Slice(Vec::new()))
    }

    pub fn string_map(name: impl Into<String>) -> Self {
        Self::new(name, Value::StringMap(BTreeMap::new()))
    }

    pub fn generic(name: impl Into<String>, value: Box<dyn Generic>) -> Self {
        Self::new(name, Value::Generic(value))
    }

    /// The verbosity family: `--name=N`, `--alias` and the repeated
    /// `-s`, `-ss`, `-sss` shortcuts all drive a single level.
    pub fn verbosity(
        name: impl Into<String>,
        alias: impl Into<String>,
        shortcut: impl Into<String>,
    ) -> Self {
        let mut flag = Self::new(name, Value::Verbosity(DEFAULT_LOG_LEVEL))
            .alias(alias)
            .usage("Increase the verbosity of messages: 1 for normal output, 2 and 3 for more verbose outputs and 4 for debug");
        flag.shortcut = Some(shortcut.into());
        flag
    }

    // --- Builder ---

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Adds a fallback environment variable. The list is consulted in
    /// reverse declaration order, so for scalar flags the first declared
    /// non-empty variable is the one that sticks.
    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env_vars.push(var.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = text.into();
        self
    }

    /// Replaces the default. The variant decides the flag's type.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = value;
        self
    }

    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Context<'_>, &Value) -> anyhow::Result<()> + 'static,
    {
        self.validator = Some(Rc::new(validator));
        self
    }

    pub fn destination(mut self, cell: Destination) -> Self {
        self.destination = Some(cell);
        self
    }

    // --- Capabilities ---

    /// Canonical name, aliases, then any verbosity shortcuts.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .filter(|n| !n.is_empty())
            .cloned()
            .collect();
        names.extend(self.shortcut_names().into_iter().map(|(name, _)| name));
        names
    }

    /// Shortcut names with the level each one sets.
    pub fn shortcut_names(&self) -> Vec<(String, u8)> {
        match &self.shortcut {
            Some(short) if !short.is_empty() => (1..=VERBOSITY_SHORTCUTS)
                .map(|i| (short.repeat(i), (i + 1) as u8))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names().iter().any(|n| n == name)
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_verbosity(&self) -> bool {
        matches!(self.default, Value::Verbosity(_))
    }

    /// Whether the flag never takes the following token as its value.
    pub fn is_self_contained(&self) -> bool {
        self.default.is_bool_like() || self.is_verbosity()
    }

    /// One help line: names, placeholder, usage and default.
    pub fn describe(&self) -> String {
        let names = if self.is_verbosity() {
            let shortcuts: Vec<String> =
                self.shortcut_names().into_iter().map(|(n, _)| n).collect();
            let mut parts = Vec::new();
            if !shortcuts.is_empty() {
                parts.push(format!("-{}", shortcuts.join("|")));
            }
            parts.extend(
                self.aliases
                    .iter()
                    .chain(std::iter::once(&self.name))
                    .filter(|n| !n.is_empty())
                    .map(|n| prefixed(n)),
            );
            parts.join(", ")
        } else {
            let mut parts: Vec<String> = self.names().iter().map(|n| prefixed(n)).collect();
            parts.sort_by_key(|n| n.len());
            let mut joined = parts.join(", ");
            if let Some(placeholder) = self.default.placeholder() {
                joined.push_str(&format!("={}", placeholder));
            }
            joined
        };

        let default = if self.default_text.is_empty() {
            match &self.default {
                Value::Bool(_) | Value::Verbosity(_) => String::new(),
                other => other.describe(),
            }
        } else {
            self.default_text.clone()
        };

        let mut line = format!("{}\t{}", names, self.usage.trim());
        if !default.is_empty() {
            line.push_str(&format!(" [default: {}]", default));
        }
        let env_vars: Vec<String> = self.env_vars.iter().map(|v| format!("${}", v)).collect();
        if !env_vars.is_empty() {
            line.push_str(&format!(" [{}]", env_vars.join(", ")));
        }
        line.trim_end().to_string()
    }
}

fn prefixed(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("-{}", name)
    } else {
        format!("--{}", name)
    }
}

/// Factories for the conventional flags every application may carry.
pub mod builtin {
    use super::*;

    pub fn help() -> FlagSpec {
        FlagSpec::bool(HELP_FLAG).alias(HELP_FLAG_ALIAS).usage("Show help")
    }

    pub fn version() -> FlagSpec {
        FlagSpec::bool(VERSION_FLAG).usage("Print the version")
    }

    pub fn verbosity() -> FlagSpec {
        FlagSpec::verbosity(LOG_LEVEL_FLAG, VERBOSE_FLAG, VERBOSE_SHORT_FLAG)
    }

    pub fn quiet() -> FlagSpec {
        FlagSpec::bool(QUIET_FLAG)
            .alias(QUIET_FLAG_ALIAS)
            .usage("Do not output any message")
    }

    pub fn no_interaction() -> FlagSpec {
        FlagSpec::bool(NO_INTERACTION_FLAG).usage("Disable all interactions")
    }

    pub fn ansi() -> FlagSpec {
        FlagSpec::bool(ANSI_FLAG).usage("Force ANSI output")
    }

    pub fn no_ansi() -> FlagSpec {
        FlagSpec::bool(NO_ANSI_FLAG).usage("Disable ANSI output")
    }
}

/// First flag declaring `name` as its canonical name, an alias or a shortcut.
pub fn find_flag<'f>(flags: &'f [FlagSpec], name: &str) -> Option<&'f FlagSpec> {
    flags.iter().find(|f| f.has_name(name))
}

/// Maps an alias to its canonical name. Verbosity names and unknown names
/// come back unchanged.
pub fn expand_shortcut(flags: &[FlagSpec], name: &str) -> String {
    match find_flag(flags, name) {
        Some(flag) if !flag.is_verbosity() => flag.name.clone(),
        _ => name.to_string(),
    }
}
