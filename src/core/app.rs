// src/core/app.rs

use std::collections::BTreeMap;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::config::{AppSettings, BuiltinFlags};
use crate::constants::{
    HELP_COMMAND, HELP_FLAG, LIST_COMMAND_ALIAS, SELF_CATEGORY, TERMINATOR, VERSION_COMMAND,
};
use crate::core::context::Context;
use crate::core::flag_set::FlagSet;
use crate::core::help;
use crate::core::reorder::fix_args;
use crate::core::resolver::{self, CommandMatch};
use crate::core::validation::{
    check_args_modes, check_flags_unicity, check_flags_unicity_in_scope, check_flags_validity,
    check_required_args, check_required_flags,
};
use crate::errors::{ConfigResult, Error, Result, UsageResult};
use crate::models::flag::find_flag;
use crate::models::{ArgSpec, CommandSpec, FlagSpec, Handler, ParsingMode, builtin};
use crate::system::io::{Output, configure_io};
use crate::system::render::{PlainRenderer, Renderer};

/// Reads an environment variable.
pub type EnvLookup = Rc<dyn Fn(&str) -> Option<String>>;

/// Commands sharing a category, in the order help lists them.
#[derive(Debug, Clone)]
pub struct CommandCategory<'a> {
    pub name: &'a str,
    pub commands: Vec<&'a CommandSpec>,
}

/// A command line application: global flags, commands and the hooks run
/// around them.
pub struct App {
    pub settings: AppSettings,
    pub flags: Vec<FlagSpec>,
    pub commands: Vec<CommandSpec>,
    pub before: Option<Handler>,
    pub action: Option<Handler>,
    pub after: Option<Handler>,
    renderer: Box<dyn Renderer>,
    output: Output,
    env: EnvLookup,
    categories: Vec<(String, Vec<usize>)>,
    is_set_up: bool,
}

impl App {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(AppSettings {
            name: name.into(),
            builtins: BuiltinFlags::default(),
            ..AppSettings::default()
        })
    }

    pub fn with_settings(settings: AppSettings) -> Self {
        Self {
            settings,
            flags: Vec::new(),
            commands: Vec::new(),
            before: None,
            action: None,
            after: None,
            renderer: Box::new(PlainRenderer),
            output: Output::stdio(),
            env: Rc::new(|name| std::env::var(name).ok()),
            categories: Vec::new(),
            is_set_up: false,
        }
    }

    // --- Builder ---

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.settings.usage = usage.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.settings.version = version.into();
        self
    }

    pub fn builtins(mut self, builtins: BuiltinFlags) -> Self {
        self.settings.builtins = builtins;
        self
    }

    pub fn flag_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.settings.flag_env_prefix.push(prefix.into());
        self
    }

    pub fn flag(mut self, flag: FlagSpec) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn command(mut self, command: CommandSpec) -> Self {
        self.commands.push(command);
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

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Sends output and errors to the given writers instead of stdio.
    pub fn writers(mut self, stdout: impl Write + 'static, stderr: impl Write + 'static) -> Self {
        self.output = Output::new(Box::new(stdout), Box::new(stderr));
        self
    }

    /// Replaces the environment the flags fall back to.
    pub fn env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'static,
    {
        self.env = Rc::new(lookup);
        self
    }

    // --- Accessors ---

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn env_var(&self, name: &str) -> Option<String> {
        (self.env)(name)
    }

    /// `<name> version <version> [<copyright>] (<channel>)`
    pub fn version_line(&self) -> String {
        let settings = &self.settings;
        let mut line = format!("{} version {}", settings.name, settings.version);
        if !settings.copyright.is_empty() {
            line.push(' ');
            line.push_str(&settings.copyright);
        }
        line.push_str(&format!(" ({})", settings.channel));
        line
    }

    /// Exact lookup by full name or visible alias.
    pub fn find_command(&self, name: &str) -> Option<&CommandSpec> {
        resolver::find_exact(&self.commands, name).map(|(_, command)| command)
    }

    pub fn best_command(&self, name: &str) -> Option<CommandMatch<'_>> {
        resolver::best_command(&self.commands, name)
    }

    /// Commands that are not hidden, sorted by full name.
    pub fn visible_commands(&self) -> Vec<&CommandSpec> {
        let mut commands: Vec<&CommandSpec> = self.commands.iter().filter(|c| !c.hidden).collect();
        commands.sort_by_key(|c| c.full_name());
        commands
    }

    pub fn visible_flags(&self) -> Vec<&FlagSpec> {
        self.flags.iter().filter(|f| !f.is_hidden()).collect()
    }

    /// Every category built at setup, sorted by name.
    pub fn categories(&self) -> Vec<CommandCategory<'_>> {
        self.categories
            .iter()
            .map(|(name, indexes)| CommandCategory {
                name: name.as_str(),
                commands: indexes.iter().filter_map(|&i| self.commands.get(i)).collect(),
            })
            .collect()
    }

    /// Categories with their visible commands; empty ones are left out.
    pub fn visible_categories(&self) -> Vec<CommandCategory<'_>> {
        self.categories()
            .into_iter()
            .filter_map(|mut category| {
                category.commands.retain(|c| !c.hidden);
                category.commands.sort_by_key(|c| c.full_name());
                (!category.commands.is_empty()).then_some(category)
            })
            .collect()
    }

    pub fn category(&self, name: &str) -> Option<CommandCategory<'_>> {
        self.categories().into_iter().find(|c| c.name == name)
    }

    // --- Setup ---

    /// Injects the built-in flags and commands, normalizes names and checks
    /// the declarations. Runs once; later calls do nothing.
    pub fn try_setup(&mut self) -> ConfigResult<()> {
        if self.is_set_up {
            return Ok(());
        }
        self.settings.apply_defaults();
        let builtins = self.settings.builtins;

        let mut injected = Vec::new();
        if builtins.help {
            injected.push(builtin::help());
        }
        if builtins.ansi {
            injected.push(builtin::no_ansi());
            injected.push(builtin::ansi());
        }
        if builtins.no_interaction {
            injected.push(builtin::no_interaction());
        }
        if builtins.quiet {
            injected.push(builtin::quiet());
        }
        if builtins.verbosity {
            injected.push(builtin::verbosity());
        }
        if builtins.version {
            injected.push(builtin::version());
        }
        for flag in injected.into_iter().rev() {
            if find_flag(&self.flags, &flag.name).is_none() {
                self.flags.insert(0, flag);
            }
        }

        if builtins.help_command && self.find_command(HELP_COMMAND).is_none() {
            self.commands.insert(0, help_command());
        }
        if builtins.version_command && self.find_command(VERSION_COMMAND).is_none() {
            self.commands.insert(0, version_command());
        }

        check_flags_unicity_in_scope("", &self.flags)?;

        for command in &mut self.commands {
            command.normalize_names();
            let full_name = command.full_name();
            if command.help_name.is_empty() {
                command.help_name = format!("{} {}", self.settings.help_name, full_name);
            }
            check_flags_unicity_in_scope(&full_name, &command.flags)?;
            check_flags_unicity(&self.flags, &command.flags, &full_name)?;
            check_args_modes(&command.args)?;
            if builtins.help && find_flag(&command.flags, HELP_FLAG).is_none() {
                command.flags.push(builtin::help());
            }
        }

        let mut categories: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, command) in self.commands.iter().enumerate() {
            categories.entry(command.category.clone()).or_default().push(index);
        }
        self.categories = categories.into_iter().collect();

        log::debug!(
            "Application '{}' set up with {} flags and {} commands",
            self.settings.name,
            self.flags.len(),
            self.commands.len()
        );
        self.is_set_up = true;
        Ok(())
    }

    // --- Parsing ---

    /// The application pass of the reordering engine.
    pub fn fix_args(&self, arguments: &[String]) -> Vec<String> {
        fix_args(arguments, &self.flags, &self.commands, ParsingMode::Normal, "")
    }

    /// Parses the application flags. The set is returned even on failure so
    /// help can still be shown from it.
    pub fn parse_args(&self, arguments: &[String]) -> (FlagSet, UsageResult<()>) {
        let fixed = self.fix_args(arguments);
        let mut set = FlagSet::new(self.settings.name.as_str(), &self.flags);
        let result = self.finish_parse(&mut set, &self.flags, &fixed);
        (set, result)
    }

    fn finish_parse(&self, set: &mut FlagSet, flags: &[FlagSpec], fixed: &[String]) -> UsageResult<()> {
        set.parse(fixed)?;
        set.apply_env(flags, &self.settings.flag_env_prefix, |name| self.env_var(name))?;
        set.expand_home_in_values();
        check_required_flags(flags, set)
    }

    // --- Running ---

    /// Parses `arguments` (without the program name) and dispatches them.
    ///
    /// # Panics
    ///
    /// When the declarations are invalid; see [`App::try_setup`].
    pub fn run(&mut self, arguments: &[String]) -> Result<()> {
        if let Err(err) = self.try_setup() {
            panic!("{}", err);
        }
        self.execute(arguments)
    }

    fn execute(&self, arguments: &[String]) -> Result<()> {
        let (set, parsed) = self.parse_args(arguments);
        let mut ctx = Context::new(self, &self.flags, set, None);
        configure_io(&ctx);

        if let Err(err) = parsed {
            help::show_app_help(&ctx);
            self.write_line();
            return Err(Error::IncorrectUsage(err));
        }
        validate(&self.flags, &ctx)?;

        let first = ctx.args().first().to_string();
        if !first.is_empty() {
            if let Some(found) = self.best_command(&first) {
                ctx.set_command(Some(found.command), &found.user_name);
            }
        }

        let result = self.dispatch(&ctx);
        match &self.after {
            Some(after) => match trap(after, &ctx) {
                Ok(()) => result,
                Err(err) => Err(Error::combine(result.err(), err)),
            },
            None => result,
        }
    }

    fn dispatch(&self, ctx: &Context<'_>) -> Result<()> {
        if let Some(before) = &self.before {
            if let Err(err) = trap(before, ctx) {
                if let Err(e) = self.output.write_out(&format!("{}\n\n", err)) {
                    log::warn!("Could not write the error: {}", e);
                }
                help::show_app_help(ctx);
                return Err(err);
            }
        }

        if help::check_help(ctx) {
            return help::show_app_help_action(ctx);
        }
        if help::check_version(ctx) {
            help::show_version(ctx);
            return Ok(());
        }

        if let Some(command) = ctx.command() {
            log::debug!("Dispatching to '{}'", command.full_name());
            return self.run_command(ctx, command);
        }

        match &self.action {
            Some(action) => trap(action, ctx),
            None => help::show_app_help_action(ctx),
        }
    }

    fn run_command(&self, parent: &Context<'_>, command: &CommandSpec) -> Result<()> {
        let tail = parent.raw_args().tail();
        let (set, parsed) = parse_command_args(self, command, &tail);
        let ctx = Context::new(self, &command.flags, set, Some(parent))
            .with_command(command, parent.user_name());
        let full_name = command.full_name();

        let checked = parsed
            .map_err(Error::IncorrectUsage)
            .and_then(|()| validate(&command.flags, &ctx))
            .and_then(|()| check_required_args(command, &ctx).map_err(Error::IncorrectUsage));
        if let Err(err) = checked {
            if let Error::IncorrectUsage(_) = err {
                help::show_command_help(&ctx, &full_name)?;
                self.write_line();
            }
            return Err(err);
        }

        if help::check_command_help(&ctx, &full_name)? {
            return Ok(());
        }

        let mut result = match &command.before {
            Some(before) => trap(before, &ctx).inspect_err(|_| {
                if let Err(e) = help::show_command_help(&ctx, &full_name) {
                    log::warn!("{}", e);
                }
            }),
            None => Ok(()),
        };

        if result.is_ok() {
            result = match &command.action {
                Some(action) => trap(action, &ctx),
                None => help::show_command_help(&ctx, &full_name).map_err(Error::from),
            };
        }

        if let Some(after) = &command.after {
            if let Err(err) = trap(after, &ctx) {
                result = Err(Error::combine(result.err(), err));
            }
        }
        result
    }

    fn write_line(&self) {
        if let Err(e) = self.output.write_out("\n") {
            log::warn!("Could not write to the output: {}", e);
        }
    }
}

/// Command pass of the reordering engine; the result always has `--`
/// between the flags and the positionals.
pub fn fix_command_args(command: &CommandSpec, arguments: &[String]) -> Vec<String> {
    fix_args(arguments, &command.flags, &[], command.mode, TERMINATOR)
}

/// Parses a command's own flags out of the arguments that follow it.
pub fn parse_command_args(
    app: &App,
    command: &CommandSpec,
    arguments: &[String],
) -> (FlagSet, UsageResult<()>) {
    let fixed = fix_command_args(command, arguments);
    let mut set = FlagSet::new(command.full_name(), &command.flags);
    let result = app.finish_parse(&mut set, &command.flags, &fixed);
    (set, result)
}

/// Runs a handler, turning a panic into an error.
fn trap(handler: &Handler, ctx: &Context<'_>) -> Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(ctx))) {
        Ok(result) => result.map_err(Error::from),
        Err(payload) => {
            log::debug!("Handler panicked");
            Err(Error::from_panic(payload))
        }
    }
}

/// Runs the flag validators of a scope, turning a panic into an error.
fn validate(flags: &[FlagSpec], ctx: &Context<'_>) -> Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(|| check_flags_validity(flags, ctx))) {
        Ok(checked) => checked.map_err(Error::IncorrectUsage),
        Err(payload) => {
            log::debug!("Flag validator panicked");
            Err(Error::from_panic(payload))
        }
    }
}

fn help_command() -> CommandSpec {
    CommandSpec::new(HELP_COMMAND)
        .category(SELF_CATEGORY)
        .alias(HELP_COMMAND)
        .alias(LIST_COMMAND_ALIAS)
        .usage("Display help for a command or a category of commands")
        .arg(
            ArgSpec::new("command_name")
                .optional()
                .description("The command name"),
        )
        .action(|ctx| Ok(help::show_app_help_action(ctx)?))
}

fn version_command() -> CommandSpec {
    CommandSpec::new(VERSION_COMMAND)
        .category(SELF_CATEGORY)
        .alias(VERSION_COMMAND)
        .usage("Display the application version")
        .action(|ctx| {
            help::show_version(ctx);
            Ok(())
        })
}
