// src/core/flag_set.rs

use std::collections::{BTreeMap, HashMap};

use crate::constants::{HELP_FLAG, HELP_FLAG_ALIAS, TERMINATOR, VERBOSE_LEVEL};
use crate::errors::{UsageError, UsageResult};
use crate::models::{Destination, FlagSpec, Value};

/// Where a flag's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    CommandLine,
    Environment,
    /// Assigned by the program through `Context::set`.
    Program,
}

#[derive(Debug, Clone, Copy)]
enum Binding {
    Flag(usize),
    /// A verbosity shortcut setting `level` on the flag at the index.
    Shortcut(usize, u8),
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    value: Value,
    touched: bool,
    destination: Option<Destination>,
}

/// The parsed flags of one scope, plus the positionals left after them.
///
/// Only canonical names and verbosity shortcuts are registered. Aliases are
/// rewritten to canonical names before parsing.
#[derive(Debug, Clone)]
pub struct FlagSet {
    name: String,
    entries: Vec<Entry>,
    bindings: HashMap<String, Binding>,
    visited: BTreeMap<String, Origin>,
    args: Vec<String>,
}

impl FlagSet {
    pub fn new(name: impl Into<String>, flags: &[FlagSpec]) -> Self {
        let mut set = Self {
            name: name.into(),
            entries: Vec::with_capacity(flags.len()),
            bindings: HashMap::new(),
            visited: BTreeMap::new(),
            args: Vec::new(),
        };

        for flag in flags {
            let index = set.entries.len();
            if let Some(cell) = &flag.destination {
                *cell.borrow_mut() = flag.default.clone();
            }
            set.entries.push(Entry {
                name: flag.name.clone(),
                value: flag.default.clone(),
                touched: false,
                destination: flag.destination.clone(),
            });

            if !flag.name.is_empty() {
                set.bindings
                    .entry(flag.name.clone())
                    .or_insert(Binding::Flag(index));
            }
            if flag.is_verbosity() {
                for alias in flag.aliases.iter().filter(|a| !a.is_empty()) {
                    set.bindings
                        .entry(alias.clone())
                        .or_insert(Binding::Shortcut(index, VERBOSE_LEVEL));
                }
                for (shortcut, level) in flag.shortcut_names() {
                    set.bindings
                        .entry(shortcut)
                        .or_insert(Binding::Shortcut(index, level));
                }
            }
        }

        set
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parses flags from the front of `arguments`. Parsing stops at the
    /// first positional or right after a lone `--`. On error the remaining
    /// arguments are the ones following the offending token.
    pub fn parse(&mut self, arguments: &[String]) -> UsageResult<()> {
        let mut rest = arguments;
        let result = loop {
            match self.parse_one(rest) {
                Ok(Some(remaining)) => rest = remaining,
                Ok(None) => break Ok(()),
                Err((err, remaining)) => {
                    rest = remaining;
                    break Err(err);
                }
            }
        };

        self.args = match (&result, rest.first()) {
            (Ok(()), Some(first)) if first == TERMINATOR => rest[1..].to_vec(),
            _ => rest.to_vec(),
        };

        for (name, origin) in &self.visited {
            if *origin == Origin::CommandLine {
                log::trace!("Using CLI flags for '{}' configuration entry.", name);
            }
        }

        result
    }

    /// One step of the parse. `Ok(None)` means parsing is over.
    fn parse_one<'r>(
        &mut self,
        args: &'r [String],
    ) -> Result<Option<&'r [String]>, (UsageError, &'r [String])> {
        let Some(token) = args.first() else {
            return Ok(None);
        };
        if token.len() < 2 || !token.starts_with('-') {
            return Ok(None);
        }

        let mut dashes = 1;
        if token.as_bytes()[1] == b'-' {
            dashes = 2;
            if token.len() == 2 {
                // "--" terminates the flags; it is dropped in `parse`
                return Ok(None);
            }
        }

        let body = &token[dashes..];
        if body.is_empty() || body.starts_with('-') || body.starts_with('=') {
            return Err((UsageError::BadFlagSyntax(token.clone()), &args[1..]));
        }
        let mut rest = &args[1..];

        let (name, inline_value) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        let Some(binding) = self.bindings.get(name).copied() else {
            let err = if name == HELP_FLAG || name == HELP_FLAG_ALIAS {
                UsageError::HelpRequested
            } else {
                UsageError::UndefinedFlag(name.to_string())
            };
            return Err((err, rest));
        };

        let self_contained = match binding {
            Binding::Flag(index) => self.entries[index].value.is_bool_like(),
            Binding::Shortcut(..) => true,
        };

        if self_contained {
            let raw = inline_value.unwrap_or("true");
            self.apply(name, binding, raw, Origin::CommandLine)
                .map_err(|err| match err {
                    UsageError::InvalidValue { name, value, reason } => {
                        UsageError::InvalidBoolean { name, value, reason }
                    }
                    other => other,
                })
                .map_err(|err| (err, rest))?;
        } else {
            let raw = match inline_value {
                Some(value) => value,
                None => match rest.split_first() {
                    Some((value, remaining)) => {
                        rest = remaining;
                        value.as_str()
                    }
                    None => return Err((UsageError::MissingValue(name.to_string()), rest)),
                },
            };
            self.apply(name, binding, raw, Origin::CommandLine)
                .map_err(|err| (err, rest))?;
        }

        Ok(Some(rest))
    }

    /// Assigns a value by registered name.
    pub fn set(&mut self, name: &str, raw: &str, origin: Origin) -> UsageResult<()> {
        let binding = self
            .bindings
            .get(name)
            .copied()
            .ok_or_else(|| UsageError::NoSuchFlag(name.to_string()))?;
        self.apply(name, binding, raw, origin)
    }

    fn apply(&mut self, name: &str, binding: Binding, raw: &str, origin: Origin) -> UsageResult<()> {
        match binding {
            Binding::Flag(index) => self.store(index, raw, origin)?,
            Binding::Shortcut(index, level) => {
                let level = level.to_string();
                let raw = if raw.is_empty() || raw == "true" {
                    level.as_str()
                } else {
                    raw
                };
                self.store(index, raw, origin)?;
            }
        }
        self.visited.insert(name.to_string(), origin);
        Ok(())
    }

    fn store(&mut self, index: usize, raw: &str, origin: Origin) -> UsageResult<()> {
        let entry = &mut self.entries[index];
        entry
            .value
            .set(raw, !entry.touched)
            .map_err(|reason| UsageError::InvalidValue {
                name: entry.name.clone(),
                value: raw.to_string(),
                reason,
            })?;
        entry.touched = true;
        if let Some(cell) = &entry.destination {
            *cell.borrow_mut() = entry.value.clone();
        }
        let name = entry.name.clone();
        self.visited.insert(name, origin);
        Ok(())
    }

    /// Fills flags that were not given on the command line from the
    /// environment. Candidate variables are the flag's own, then one per
    /// prefix, tried in reverse order.
    pub fn apply_env<F>(&mut self, flags: &[FlagSpec], prefixes: &[String], lookup: F) -> UsageResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let given: Vec<String> = self.visited.keys().cloned().collect();

        for flag in flags {
            if given.iter().any(|n| *n == flag.name) {
                continue;
            }

            let mut candidates = flag.env_vars.clone();
            candidates.extend(
                prefixes
                    .iter()
                    .map(|prefix| format!("{}_{}", prefix, flag.name).replace('-', "_").to_uppercase()),
            );
            candidates.reverse();

            for var in candidates {
                let Some(value) = lookup(&var).filter(|v| !v.is_empty()) else {
                    continue;
                };
                log::trace!("Using {} from ENV for '{}' configuration entry.", var, flag.name);
                self.set(&flag.name, &value, Origin::Environment)?;
            }
        }

        Ok(())
    }

    /// Expands a leading `~` in every string flag that was set.
    pub fn expand_home_in_values(&mut self) {
        for entry in &mut self.entries {
            if !self.visited.contains_key(&entry.name) {
                continue;
            }
            if let Value::String(current) = &entry.value {
                let expanded = expand_home(current);
                if expanded != *current {
                    entry.value = Value::String(expanded);
                    if let Some(cell) = &entry.destination {
                        *cell.borrow_mut() = entry.value.clone();
                    }
                }
            }
        }
    }

    // --- Queries ---

    /// Whether `name` is registered in this set.
    pub fn has(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Current value of the flag registered as `name`. Shortcuts report the
    /// value of the flag they drive.
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.bindings.get(name)? {
            Binding::Flag(index) | Binding::Shortcut(index, _) => Some(&self.entries[*index].value),
        }
    }

    pub fn origin(&self, name: &str) -> Option<Origin> {
        self.visited.get(name).copied()
    }

    pub fn is_visited(&self, name: &str) -> bool {
        self.visited.contains_key(name)
    }

    /// Names that received a value, sorted.
    pub fn visited(&self) -> impl Iterator<Item = &str> {
        self.visited.keys().map(String::as_str)
    }

    /// Positionals left after the flags.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Expands `~` and `~/...` against the user home directory. Other forms,
/// `~user` included, come back unchanged.
pub fn expand_home(path: &str) -> String {
    let Some(rest) = path.strip_prefix('~') else {
        return path.to_string();
    };
    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
        log::warn!("Cannot expand user-specific home dir in {:?}", path);
        return path.to_string();
    }
    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.display(), rest),
        None => path.to_string(),
    }
}
