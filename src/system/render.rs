// src/system/render.rs

use std::io::{self, Write};

use crate::core::app::CommandCategory;
use crate::core::context::Context;
use crate::models::{CommandSpec, FlagSpec};

/// Formats help and version screens. Applications may plug in their own.
pub trait Renderer {
    fn app_help(&self, ctx: &Context<'_>, out: &mut dyn Write) -> io::Result<()>;

    fn command_help(
        &self,
        ctx: &Context<'_>,
        command: &CommandSpec,
        out: &mut dyn Write,
    ) -> io::Result<()>;

    fn category_help(
        &self,
        ctx: &Context<'_>,
        categories: &[CommandCategory<'_>],
        out: &mut dyn Write,
    ) -> io::Result<()>;

    fn version(&self, ctx: &Context<'_>, out: &mut dyn Write) -> io::Result<()>;
}

/// Undecorated text output.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn app_help(&self, ctx: &Context<'_>, out: &mut dyn Write) -> io::Result<()> {
        let app = ctx.app();
        let settings = &app.settings;

        self.version(ctx, out)?;
        writeln!(out)?;
        if !settings.usage.is_empty() {
            writeln!(out, "{}", settings.usage)?;
            writeln!(out)?;
        }

        writeln!(out, "Usage:")?;
        writeln!(out, "  {} [command] [options] [arguments]", settings.help_name)?;

        let flags = app.visible_flags();
        if !flags.is_empty() {
            writeln!(out)?;
            writeln!(out, "Global options:")?;
            write_flags(&flags, out)?;
        }

        let categories = app.visible_categories();
        if !categories.is_empty() {
            writeln!(out)?;
            writeln!(out, "Available commands:")?;
            write_categories(&categories, out)?;
        }

        if !settings.description.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", settings.description)?;
        }
        Ok(())
    }

    fn command_help(
        &self,
        _ctx: &Context<'_>,
        command: &CommandSpec,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        if !command.usage.is_empty() {
            writeln!(out, "Description:")?;
            writeln!(out, "  {}", command.usage)?;
            writeln!(out)?;
        }

        let flags = command.visible_flags();
        writeln!(out, "Usage:")?;
        writeln!(
            out,
            "  {}{}{}",
            command.help_name,
            if flags.is_empty() { "" } else { " [options]" },
            command.args_usage()
        )?;

        let aliases: Vec<&str> = command
            .aliases
            .iter()
            .filter(|alias| !alias.hidden)
            .map(|alias| alias.name.as_str())
            .collect();
        if !aliases.is_empty() {
            writeln!(out)?;
            writeln!(out, "Aliases:")?;
            writeln!(out, "  {}", aliases.join(", "))?;
        }

        if !command.args.is_empty() {
            writeln!(out)?;
            writeln!(out, "Arguments:")?;
            let rows: Vec<String> = command.args.iter().map(|arg| arg.describe()).collect();
            write_rows(&rows, out)?;
        }

        if !flags.is_empty() {
            writeln!(out)?;
            writeln!(out, "Options:")?;
            write_flags(&flags, out)?;
        }

        if !command.description.is_empty() {
            writeln!(out)?;
            writeln!(out, "Help:")?;
            for line in command.description.lines() {
                writeln!(out, "  {}", line)?;
            }
        }
        Ok(())
    }

    fn category_help(
        &self,
        ctx: &Context<'_>,
        categories: &[CommandCategory<'_>],
        out: &mut dyn Write,
    ) -> io::Result<()> {
        writeln!(out, "Usage:")?;
        writeln!(
            out,
            "  {} [command] [options] [arguments]",
            ctx.app().settings.help_name
        )?;
        writeln!(out)?;
        writeln!(out, "Available commands:")?;
        write_categories(categories, out)
    }

    fn version(&self, ctx: &Context<'_>, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", ctx.app().version_line())
    }
}

fn write_flags(flags: &[&FlagSpec], out: &mut dyn Write) -> io::Result<()> {
    let rows: Vec<String> = flags.iter().map(|flag| flag.describe()).collect();
    write_rows(&rows, out)
}

fn write_categories(categories: &[CommandCategory<'_>], out: &mut dyn Write) -> io::Result<()> {
    let row = |command: &&CommandSpec| format!("{}\t{}", command.names().join(", "), command.usage);
    let all: Vec<String> = categories
        .iter()
        .flat_map(|category| category.commands.iter().map(row))
        .collect();
    let width = column_width(&all);

    for category in categories {
        if !category.name.is_empty() {
            writeln!(out, " {}", category.name)?;
        }
        for command in &category.commands {
            writeln!(out, "  {}", align(&row(command), width))?;
        }
    }
    Ok(())
}

/// Writes `left\tright` rows with the right column aligned.
fn write_rows(rows: &[String], out: &mut dyn Write) -> io::Result<()> {
    let width = column_width(rows);
    for row in rows {
        writeln!(out, "  {}", align(row, width))?;
    }
    Ok(())
}

fn column_width(rows: &[String]) -> usize {
    rows.iter()
        .filter_map(|row| row.split_once('\t'))
        .map(|(left, _)| left.chars().count())
        .max()
        .unwrap_or(0)
}

fn align(row: &str, width: usize) -> String {
    match row.split_once('\t') {
        Some((left, "")) => left.to_string(),
        Some((left, right)) => format!("{:<width$}  {}", left, right, width = width),
        None => row.to_string(),
    }
}
