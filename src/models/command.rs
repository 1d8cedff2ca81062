// src/models/command.rs

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use super::flag::FlagSpec;
use crate::constants::CATEGORY_SEPARATOR;
use crate::core::context::Context;
use crate::core::resolver::segments_match;

/// Before, action and after callbacks of a command or of the application.
pub type Handler = Rc<dyn Fn(&Context<'_>) -> anyhow::Result<()>>;

/// How much of a command's own argument region is subject to flag parsing.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ParsingMode {
    /// Flags may appear anywhere around the positionals.
    #[default]
    Normal,
    /// Everything after the command name is opaque.
    Skipped,
    /// Flags are read until the first positional, the rest is opaque.
    SkippedAfterFirstArg,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
}

impl Alias {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hidden: false,
        }
    }

    pub fn hidden(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hidden: true,
        }
    }
}

/// One positional argument slot.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ArgSpec {
    pub name: String,
    pub default: String,
    pub description: String,
    pub optional: bool,
    pub slice: bool,
}

impl ArgSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn slice(mut self) -> Self {
        self.slice = true;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Help line for this argument.
    pub fn describe(&self) -> String {
        let mut usage = self.description.clone();
        if !self.default.is_empty() {
            usage.push_str(&format!(" [default: {:?}]", self.default));
        }
        if !self.optional {
            usage.push_str(" (required)");
        }
        format!("{}\t{}", self.name, usage.trim())
    }
}

/// Renders an argument list as ` [--] <a> [<b>] (<c>)...`.
pub fn args_usage(args: &[ArgSpec]) -> String {
    if args.is_empty() {
        return String::new();
    }

    let mut usage = String::from(" [--]");
    for arg in args {
        let mut element = format!("<{}>", arg.name);
        if arg.optional {
            element = format!("[{}]", element);
        } else if arg.slice {
            element = format!("({})", element);
        }
        if arg.slice {
            element.push_str("...");
        }
        usage.push(' ');
        usage.push_str(&element);
    }
    usage
}

/// A command the application can dispatch to.
#[derive(Clone, Default)]
pub struct CommandSpec {
    pub name: String,
    pub aliases: Vec<Alias>,
    pub category: String,
    pub usage: String,
    pub description: String,
    pub flags: Vec<FlagSpec>,
    pub args: Vec<ArgSpec>,
    pub mode: ParsingMode,
    pub hidden: bool,
    /// Name shown in help, `<app> <full name>` unless given.
    pub help_name: String,
    pub before: Option<Handler>,
    pub action: Option<Handler>,
    pub after: Option<Handler>,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.full_name())
            .field("aliases", &self.aliases)
            .field("flags", &self.flags)
            .field("args", &self.args)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(Alias::new(alias));
        self
    }

    pub fn hidden_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(Alias::hidden(alias));
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn flag(mut self, flag: FlagSpec) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn with_flags(mut self, flags: impl IntoIterator<Item = FlagSpec>) -> Self {
        self.flags.extend(flags);
        self
    }

    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn mode(mut self, mode: ParsingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn help_name(mut self, help_name: impl Into<String>) -> Self {
        self.help_name = help_name.into();
        self
    }

    pub fn before<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.before = Some(Rc::new(handler));
        self
    }

    pub fn action<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.action = Some(Rc::new(handler));
        self
    }

    pub fn after<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.after = Some(Rc::new(handler));
        self
    }

    /// `category:name`, or the bare name without a category.
    pub fn full_name(&self) -> String {
        if self.category.is_empty() {
            self.name.clone()
        } else {
            format!("{}{}{}", self.category, CATEGORY_SEPARATOR, self.name)
        }
    }

    /// Full name, or the visible aliases for a nameless command.
    pub fn preferred_name(&self) -> String {
        let name = self.full_name();
        if name.is_empty() && !self.aliases.is_empty() {
            return self
                .aliases
                .iter()
                .filter(|a| !a.name.is_empty())
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
        }
        name
    }

    /// Full name plus the aliases that are not hidden.
    pub fn names(&self) -> Vec<String> {
        let full = self.full_name();
        std::iter::once(full)
            .chain(
                self.aliases
                    .iter()
                    .filter(|a| !a.hidden)
                    .map(|a| a.name.clone()),
            )
            .filter(|n| !n.is_empty())
            .collect()
    }

    /// Exact mode compares against the full name and visible aliases. The
    /// fuzzy mode matches colon separated prefixes against every alias.
    pub fn has_name(&self, name: &str, exact: bool) -> bool {
        if exact {
            return self.names().iter().any(|n| n == name);
        }
        std::iter::once(self.full_name())
            .chain(self.aliases.iter().map(|a| a.name.clone()))
            .any(|candidate| segments_match(name, &candidate))
    }

    /// Lower-cases the name, category, help name and aliases.
    pub fn normalize_names(&mut self) {
        self.category = self.category.to_lowercase();
        self.name = self.name.to_lowercase();
        self.help_name = self.help_name.to_lowercase();
        for alias in &mut self.aliases {
            alias.name = alias.name.to_lowercase();
        }
    }

    pub fn visible_flags(&self) -> Vec<&FlagSpec> {
        self.flags.iter().filter(|f| !f.is_hidden()).collect()
    }

    pub fn args_usage(&self) -> String {
        args_usage(&self.args)
    }
}
