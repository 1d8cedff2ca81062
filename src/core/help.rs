// src/core/help.rs

use crate::constants::{HELP_FLAG, VERSION_FLAG};
use crate::core::context::Context;
use crate::core::suggest::find_alternatives;
use crate::errors::{CommandNotFoundError, Result};

/// Prints the application help screen.
pub fn show_app_help(ctx: &Context<'_>) {
    let app = ctx.app();
    let written = app
        .output()
        .with_stdout(|out| app.renderer().app_help(ctx, out));
    if let Err(e) = written {
        log::warn!("Could not write the help screen: {}", e);
    }
}

/// Help for the command named by the first positional, or the application
/// help without one.
pub fn show_app_help_action(ctx: &Context<'_>) -> Result<()> {
    let args = ctx.args();
    if args.present() {
        show_command_help(ctx, args.first())?;
        return Ok(());
    }
    show_app_help(ctx);
    Ok(())
}

/// Prints the help of a command, or the listing of every category the name
/// starts. Nothing matching is a `CommandNotFoundError`.
pub fn show_command_help(ctx: &Context<'_>, name: &str) -> Result<(), CommandNotFoundError> {
    let app = ctx.app();

    let written = if let Some(found) = app.best_command(name) {
        app.output()
            .with_stdout(|out| app.renderer().command_help(ctx, found.command, out))
    } else {
        let categories: Vec<_> = app
            .visible_categories()
            .into_iter()
            .filter(|category| category.name.starts_with(name))
            .collect();
        if categories.is_empty() {
            return Err(CommandNotFoundError {
                command: name.to_string(),
                alternatives: find_alternatives(name, &app.visible_commands()),
            });
        }
        app.output()
            .with_stdout(|out| app.renderer().category_help(ctx, &categories, out))
    };

    if let Err(e) = written {
        log::warn!("Could not write the help of '{}': {}", name, e);
    }
    Ok(())
}

/// Prints the version line.
pub fn show_version(ctx: &Context<'_>) {
    let app = ctx.app();
    let written = app
        .output()
        .with_stdout(|out| app.renderer().version(ctx, out));
    if let Err(e) = written {
        log::warn!("Could not write the version: {}", e);
    }
}

/// Whether the help flag was given.
pub fn check_help(ctx: &Context<'_>) -> bool {
    ctx.app().settings.builtins.help && ctx.bool(HELP_FLAG)
}

/// Whether the version flag was given.
pub fn check_version(ctx: &Context<'_>) -> bool {
    ctx.app().settings.builtins.version && ctx.bool(VERSION_FLAG)
}

/// Shows the command's help when its help flag was given.
pub fn check_command_help(ctx: &Context<'_>, name: &str) -> Result<bool> {
    if !check_help(ctx) {
        return Ok(false);
    }
    show_command_help(ctx, name)?;
    Ok(true)
}
