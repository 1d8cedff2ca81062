// src/core/context.rs

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::constants::{LOG_LEVEL_FLAG, TERMINATOR};
use crate::core::app::App;
use crate::core::args::Args;
use crate::core::flag_set::{FlagSet, Origin};
use crate::errors::{UsageError, UsageResult};
use crate::models::flag::{expand_shortcut, find_flag};
use crate::models::{CommandSpec, FlagSpec, Generic, Value};

/// What a handler sees: the parsed flags of one scope, the command it was
/// parsed for and a link to the enclosing scope.
///
/// Lookups walk from this scope to the application scope and stop at the
/// first one that knows the flag.
pub struct Context<'a> {
    app: &'a App,
    command: Option<&'a CommandSpec>,
    user_name: String,
    flags: &'a [FlagSpec],
    set: RefCell<FlagSet>,
    parent: Option<&'a Context<'a>>,
}

impl<'a> Context<'a> {
    /// `flags` are the declarations `set` was built from.
    pub fn new(
        app: &'a App,
        flags: &'a [FlagSpec],
        set: FlagSet,
        parent: Option<&'a Context<'a>>,
    ) -> Self {
        Self {
            app,
            command: None,
            user_name: String::new(),
            flags,
            set: RefCell::new(set),
            parent,
        }
    }

    /// Binds the context to a command and the name it was invoked with.
    pub fn with_command(mut self, command: &'a CommandSpec, user_name: impl Into<String>) -> Self {
        self.command = Some(command);
        self.user_name = user_name.into();
        self
    }

    pub(crate) fn set_command(&mut self, command: Option<&'a CommandSpec>, user_name: &str) {
        self.command = command;
        self.user_name = user_name.to_string();
    }

    pub fn app(&self) -> &'a App {
        self.app
    }

    pub fn command(&self) -> Option<&'a CommandSpec> {
        self.command
    }

    /// The command name as the user typed it.
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn parent(&self) -> Option<&'a Context<'a>> {
        self.parent
    }

    /// This context followed by its ancestors, innermost first.
    pub fn lineage(&self) -> Vec<&Context<'a>> {
        let mut lineage = vec![self];
        let mut current = self.parent;
        while let Some(ctx) = current {
            lineage.push(ctx);
            current = ctx.parent;
        }
        lineage
    }

    /// Positionals, without any `--`.
    pub fn args(&self) -> Args<'a> {
        let values = self
            .set
            .borrow()
            .args()
            .iter()
            .filter(|arg| *arg != TERMINATOR)
            .cloned()
            .collect();
        Args::new(values, self.command)
    }

    pub(crate) fn raw_args(&self) -> Args<'a> {
        Args::new(self.set.borrow().args().to_vec(), None)
    }

    pub fn narg(&self) -> usize {
        self.args().len()
    }

    /// Scope whose parsed set knows `name`, with the name it is registered
    /// under there. Aliases are expanded per scope.
    fn lookup_scope(&self, name: &str) -> Option<(&Context<'a>, String)> {
        self.lineage().into_iter().find_map(|ctx| {
            let mut name = name.to_string();
            if let Some(command) = ctx.command {
                name = expand_shortcut(&command.flags, &name);
            }
            name = expand_shortcut(ctx.flags, &name);
            name = expand_shortcut(&ctx.app.flags, &name);
            ctx.set.borrow().has(&name).then_some((ctx, name))
        })
    }

    /// The flag's value as seen from this scope.
    pub fn value(&self, name: &str) -> Option<Value> {
        let (ctx, name) = self.lookup_scope(name)?;
        let set = ctx.set.borrow();
        set.value(&name).cloned()
    }

    /// Whether the flag got a value, from the command line, the environment
    /// or `set`.
    pub fn is_set(&self, name: &str) -> bool {
        self.lookup_scope(name)
            .is_some_and(|(ctx, name)| ctx.set.borrow().is_visited(&name))
    }

    /// Whether the flag was given on the command line.
    pub fn is_set_on_cli(&self, name: &str) -> bool {
        self.lookup_scope(name).is_some_and(|(ctx, name)| {
            ctx.set.borrow().origin(&name) == Some(Origin::CommandLine)
        })
    }

    /// Whether the flag is declared by a command in the lineage or by the
    /// application.
    pub fn has_flag(&self, name: &str) -> bool {
        self.lineage()
            .iter()
            .filter_map(|ctx| ctx.command)
            .any(|command| find_flag(&command.flags, name).is_some())
            || find_flag(&self.app.flags, name).is_some()
    }

    /// Assigns a value to the flag in the nearest scope that knows it.
    pub fn set(&self, name: &str, value: &str) -> UsageResult<()> {
        let (ctx, name) = self
            .lookup_scope(name)
            .ok_or_else(|| UsageError::NoSuchFlag(name.to_string()))?;
        ctx.set.borrow_mut().set(&name, value, Origin::Program)
    }

    // --- Typed accessors; a missing flag reads as the zero value ---

    pub fn bool(&self, name: &str) -> bool {
        self.value(name).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn int(&self, name: &str) -> isize {
        self.int64(name).try_into().unwrap_or(0)
    }

    pub fn int64(&self, name: &str) -> i64 {
        self.value(name).and_then(|v| v.as_i64()).unwrap_or(0)
    }

    pub fn uint(&self, name: &str) -> usize {
        self.uint64(name).try_into().unwrap_or(0)
    }

    pub fn uint64(&self, name: &str) -> u64 {
        self.value(name).and_then(|v| v.as_u64()).unwrap_or(0)
    }

    pub fn float64(&self, name: &str) -> f64 {
        self.value(name).and_then(|v| v.as_f64()).unwrap_or(0.0)
    }

    pub fn duration(&self, name: &str) -> Duration {
        self.value(name)
            .and_then(|v| v.as_duration())
            .unwrap_or(Duration::ZERO)
    }

    pub fn string(&self, name: &str) -> String {
        self.value(name).map(|v| v.as_string()).unwrap_or_default()
    }

    pub fn string_slice(&self, name: &str) -> Vec<String> {
        match self.value(name) {
            Some(Value::StringSlice(v)) => v,
            _ => Vec::new(),
        }
    }

    pub fn int_slice(&self, name: &str) -> Vec<isize> {
        match self.value(name) {
            Some(Value::IntSlice(v)) => v,
            _ => Vec::new(),
        }
    }

    pub fn int64_slice(&self, name: &str) -> Vec<i64> {
        match self.value(name) {
            Some(Value::Int64Slice(v)) => v,
            _ => Vec::new(),
        }
    }

    pub fn float64_slice(&self, name: &str) -> Vec<f64> {
        match self.value(name) {
            Some(Value::Float64Slice(v)) => v,
            _ => Vec::new(),
        }
    }

    pub fn string_map(&self, name: &str) -> BTreeMap<String, String> {
        match self.value(name) {
            Some(Value::StringMap(v)) => v,
            _ => BTreeMap::new(),
        }
    }

    pub fn generic(&self, name: &str) -> Option<Box<dyn Generic>> {
        match self.value(name) {
            Some(Value::Generic(g)) => Some(g),
            _ => None,
        }
    }

    /// Current verbosity level, `0` without the verbosity flag.
    pub fn log_level(&self) -> u8 {
        match self.value(LOG_LEVEL_FLAG) {
            Some(Value::Verbosity(level)) => level,
            _ => 0,
        }
    }

    /// Runs `f` against this scope's parsed set.
    pub fn with_flag_set<R>(&self, f: impl FnOnce(&FlagSet) -> R) -> R {
        f(&self.set.borrow())
    }
}
