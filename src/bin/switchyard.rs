// src/bin/switchyard.rs

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Parser;

use switchyard::cli::Cli;
use switchyard::config;
use switchyard::constants::LOG_LEVEL_FLAG;
use switchyard::core::app::{App, fix_command_args};
use switchyard::core::context::Context;
use switchyard::core::interpolator::Interpolator;
use switchyard::errors::ExitError;
use switchyard::models::{CommandDecl, CommandSpec, Manifest};
use switchyard::system::io::log_level_filter;
use switchyard::system::{executor, exit};

fn main() {
    // RUST_LOG=debug switchyard ... shows the resolution steps.
    env_logger::init();

    let cli = Cli::parse();

    match run_cli(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("\nError: {:?}", e);
            std::process::exit(1);
        }
    }
}

fn run_cli(cli: Cli) -> Result<i32> {
    log::debug!("CLI args parsed: {:?}", cli);

    let cwd = env::current_dir().context("Could not read the working directory")?;
    let path = config::manifest_path(cli.manifest.as_deref(), &cwd).map_err(anyhow::Error::msg)?;
    let manifest =
        Manifest::load(&path).with_context(|| format!("Could not load the manifest {:?}", path))?;

    // exec lines run next to the manifest
    let workdir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| cwd.clone(), Path::to_path_buf);

    let mut app = build_app(&manifest, workdir)?;
    app.try_setup().context("The manifest declares an invalid application")?;

    if cli.explain {
        explain(&app, &cli.args);
        return Ok(0);
    }

    Ok(exit::handle(app.run(&cli.args)))
}

fn build_app(manifest: &Manifest, workdir: PathBuf) -> Result<App> {
    let mut app = App::with_settings(manifest.app.clone()).before(|ctx| {
        if ctx.is_set(LOG_LEVEL_FLAG) {
            log::set_max_level(log_level_filter(ctx.log_level()));
        }
        Ok(())
    });

    for decl in &manifest.flags {
        app = app.flag(decl.to_spec()?);
    }
    for decl in &manifest.commands {
        app = app.command(command_from(decl, &workdir)?);
    }
    Ok(app)
}

fn command_from(decl: &CommandDecl, workdir: &Path) -> Result<CommandSpec> {
    let spec = decl.to_spec()?;
    let Some(template) = decl.exec.clone() else {
        return Ok(spec.action(report));
    };
    let workdir = workdir.to_path_buf();
    Ok(spec.action(move |ctx| run_exec(ctx, &template, &workdir)))
}

fn run_exec(ctx: &Context<'_>, template: &str, workdir: &Path) -> Result<()> {
    let line = Interpolator::new(ctx).interpolate(template);
    log::debug!("'{}' expands to '{}'", template, line);

    executor::execute_command(&line, workdir).map_err(|e| {
        let code = e.exit_code();
        anyhow::Error::new(ExitError::new(e.to_string(), code))
    })
}

/// Action of commands without `exec`: describes what was resolved.
fn report(ctx: &Context<'_>) -> Result<()> {
    let Some(command) = ctx.command() else {
        return Ok(());
    };

    let mut text = format!("Command: {}\n", command.full_name());
    if ctx.user_name() != command.full_name() {
        text.push_str(&format!("Invoked as: {}\n", ctx.user_name()));
    }

    let flags = set_flags(ctx);
    if !flags.is_empty() {
        text.push_str("Flags:\n");
        for (name, value) in flags {
            text.push_str(&format!("  --{}={}\n", name, value));
        }
    }

    let args = ctx.args();
    if !command.args.is_empty() {
        text.push_str("Arguments:\n");
        for arg in &command.args {
            let value = if arg.slice {
                format!("[{}]", args.tail().join(" "))
            } else {
                args.get(&arg.name).to_string()
            };
            text.push_str(&format!("  {}: {}\n", arg.name, value));
        }
    } else if args.present() {
        text.push_str(&format!("Arguments: {}\n", args.slice().join(" ")));
    }

    ctx.app().output().write_out(&text)?;
    Ok(())
}

/// Flags that received a value, command scope first. Verbosity shortcuts
/// are reported through `log-level`.
fn set_flags(ctx: &Context<'_>) -> Vec<(String, String)> {
    let app = ctx.app();
    let declared = |name: &str| {
        app.flags
            .iter()
            .chain(ctx.command().into_iter().flat_map(|c| c.flags.iter()))
            .any(|flag| flag.name == name)
    };

    ctx.lineage()
        .iter()
        .flat_map(|scope| {
            scope.with_flag_set(|set| {
                let mut values: Vec<(String, String)> = set
                    .visited()
                    .filter(|name| declared(name))
                    .filter_map(|name| set.value(name).map(|v| (name.to_string(), v.as_string())))
                    .collect();
                values.sort();
                values
            })
        })
        .collect()
}

fn explain(app: &App, args: &[String]) {
    println!("application: {}", app.fix_args(args).join(" "));

    let (set, _) = app.parse_args(args);
    let Some(first) = set.args().first() else {
        return;
    };
    let Some(found) = app.best_command(first) else {
        println!("command: none");
        return;
    };

    println!("command: {} (typed as {:?})", found.command.full_name(), found.user_name);
    let tail = set.args().get(1..).unwrap_or_default();
    println!(
        "command arguments: {}",
        fix_command_args(found.command, tail).join(" ")
    );
}
