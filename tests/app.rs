use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use switchyard::errors::{Error, ExitError, UsageError};
use switchyard::system::exit::exit_code;
use switchyard::system::io::Capture;
use switchyard::{App, ArgSpec, BuiltinFlags, CommandSpec, FlagSpec, ParsingMode, Value};

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn demo(out: &Capture) -> App {
    App::new("demo")
        .version("1.0.0")
        .writers(out.clone(), io::sink())
        .env_lookup(|_| None)
}

type Seen = Rc<RefCell<Vec<String>>>;

fn recorder() -> Seen {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn flags_are_lifted_around_the_command() {
    let seen = recorder();
    let record = seen.clone();
    let out = Capture::new();
    let mut app = demo(&out)
        .builtins(BuiltinFlags::none())
        .flag(FlagSpec::int("v").default_value(Value::Int(1)))
        .flag(FlagSpec::bool("q"))
        .command(
            CommandSpec::new("upload")
                .flag(FlagSpec::int("reference").alias("r"))
                .arg(ArgSpec::new("files").slice())
                .action(move |ctx| {
                    record.borrow_mut().push(format!(
                        "reference={} v={} q={} files={:?}",
                        ctx.int("reference"),
                        ctx.int("v"),
                        ctx.bool("q"),
                        ctx.args().tail()
                    ));
                    Ok(())
                }),
        );

    assert_eq!(
        app.fix_args(&args(&["-reference=4", "--v=3", "-q", "upload", "file1", "file2"])),
        args(&["--v=3", "-q", "upload", "-reference=4", "file1", "file2"])
    );

    app.run(&args(&["-reference=4", "--v=3", "-q", "upload", "file1", "file2"]))
        .unwrap();
    app.run(&args(&["upload", "file1", "-r", "5", "file2", "--v=2"])).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            r#"reference=4 v=3 q=true files=["file1", "file2"]"#,
            r#"reference=5 v=2 q=false files=["file1", "file2"]"#,
        ]
    );
}

#[test]
fn wrapped_programs_keep_their_arguments() {
    let seen = recorder();
    let record = seen.clone();
    let out = Capture::new();
    let mut app = demo(&out).command(
        CommandSpec::new("run")
            .mode(ParsingMode::SkippedAfterFirstArg)
            .flag(FlagSpec::int("reference"))
            .arg(ArgSpec::new("program").slice())
            .action(move |ctx| {
                record
                    .borrow_mut()
                    .push(format!("{} {:?} {}", ctx.int("reference"), ctx.args().slice(), ctx.log_level()));
                Ok(())
            }),
    );

    app.run(&args(&["run", "-vvv", "--reference", "8", "php", "-n", "vd.php", "-q"]))
        .unwrap();
    // "-q" belongs to the wrapped program once "php" switched parsing off
    assert_eq!(*seen.borrow(), vec![r#"8 ["php", "-n", "vd.php", "-q"] 4"#]);
}

#[test]
fn terminator_region_is_opaque() {
    let seen = recorder();
    let record = seen.clone();
    let out = Capture::new();
    let mut app = demo(&out).command(
        CommandSpec::new("exec")
            .flag(FlagSpec::bool("force"))
            .arg(ArgSpec::new("argv").optional().slice())
            .action(move |ctx| {
                record
                    .borrow_mut()
                    .push(format!("{} {:?}", ctx.bool("force"), ctx.args().slice()));
                Ok(())
            }),
    );

    app.run(&args(&["exec", "--force", "--", "--force", "-q"])).unwrap();
    assert_eq!(*seen.borrow(), vec![r#"true ["--force", "-q"]"#]);
}

#[test]
fn missing_and_extra_arguments() {
    let out = Capture::new();
    let mut app = demo(&out).command(
        CommandSpec::new("greet")
            .arg(ArgSpec::new("name"))
            .action(|_| Ok(())),
    );

    let err = app.run(&args(&["greet"])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Incorrect usage: Required argument \"name\" is not set"
    );
    assert!(out.contents().contains("demo greet [options] [--] <name>"));

    let err = app.run(&args(&["greet", "ada", "grace"])).unwrap_err();
    assert!(matches!(
        err,
        Error::IncorrectUsage(UsageError::TooManyArguments)
    ));
    assert_eq!(exit_code(&Err(err)), 1);
}

#[test]
fn unknown_flags_of_a_command_are_usage_errors() {
    let out = Capture::new();
    let mut app = demo(&out).command(CommandSpec::new("greet").action(|_| Ok(())));
    let err = app.run(&args(&["greet", "--nope"])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Incorrect usage: flag provided but not defined: -nope"
    );
}

#[test]
fn unknown_command_suggests_alternatives() {
    let out = Capture::new();
    let mut app = demo(&out).command(CommandSpec::new("upload").action(|_| Ok(())));

    let err = app.run(&args(&["uplaod"])).unwrap_err();
    match &err {
        Error::CommandNotFound(not_found) => {
            assert_eq!(not_found.command, "uplaod");
            assert_eq!(not_found.alternatives, vec!["upload"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Command \"uplaod\" does not exist.\n\nDid you mean this?\n    upload"
    );
    assert_eq!(exit_code(&Err(err)), 3);
}

#[test]
fn commands_resolve_by_abbreviation_and_hidden_alias() {
    let seen = recorder();
    let out = Capture::new();
    let record = seen.clone();
    let mut app = demo(&out)
        .command(
            CommandSpec::new("list")
                .category("project")
                .hidden_alias("ls")
                .action(move |ctx| {
                    record.borrow_mut().push(ctx.user_name().to_string());
                    Ok(())
                }),
        )
        .command(CommandSpec::new("link").category("project").action(|_| Ok(())));

    app.run(&args(&["p:lis"])).unwrap();
    app.run(&args(&["PROJECT:LIST"])).unwrap();
    app.run(&args(&["ls"])).unwrap();
    assert_eq!(*seen.borrow(), vec!["p:lis", "PROJECT:LIST", "ls"]);

    // ambiguous: falls through to the help action
    let err = app.run(&args(&["project:l"])).unwrap_err();
    assert!(matches!(err, Error::CommandNotFound(_)));
}

#[test]
fn help_and_version() {
    let out = Capture::new();
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();
    let mut app = demo(&out).command(
        CommandSpec::new("upload")
            .usage("Upload files")
            .flag(FlagSpec::int("slot"))
            .action(move |_| {
                flag.set(true);
                Ok(())
            }),
    );

    app.run(&args(&["--help"])).unwrap();
    let text = out.contents();
    assert!(text.starts_with("demo version 1.0.0 (dev)\n"));
    assert!(text.contains("Usage:\n  demo [command] [options] [arguments]"));
    assert!(text.contains("Global options:"));
    assert!(text.contains("upload"));

    let out = Capture::new();
    app = demo(&out).command(
        CommandSpec::new("upload")
            .usage("Upload files")
            .flag(FlagSpec::int("slot")),
    );
    app.run(&args(&["upload", "-h"])).unwrap();
    let text = out.contents();
    assert!(text.contains("Description:\n  Upload files"));
    assert!(text.contains("demo upload [options]"));
    assert!(text.contains("--slot=value"));

    app.run(&args(&["-V"])).unwrap();
    assert!(out.contents().ends_with("demo version 1.0.0 (dev)\n"));

    app.run(&args(&["help", "upload"])).unwrap();
    app.run(&args(&["version"])).unwrap();
    assert!(!ran.get());
}

#[test]
fn category_prefix_lists_its_commands() {
    let out = Capture::new();
    let mut app = demo(&out)
        .command(CommandSpec::new("list").category("project").usage("List projects"))
        .command(CommandSpec::new("deploy").category("env").usage("Deploy"));

    app.run(&args(&["help", "proj"])).unwrap();
    let text = out.contents();
    assert!(text.contains(" project\n"));
    assert!(text.contains("project:list"));
    assert!(!text.contains("env:deploy"));
}

#[test]
fn panics_become_errors_and_after_still_runs() {
    let out = Capture::new();
    let after_ran = Rc::new(Cell::new(false));
    let flag = after_ran.clone();
    let mut app = demo(&out)
        .command(
            CommandSpec::new("crash").action(|_| -> anyhow::Result<()> { panic!("boom") }),
        )
        .after(move |_| {
            flag.set(true);
            Ok(())
        });

    let err = app.run(&args(&["crash"])).unwrap_err();
    assert!(matches!(&err, Error::Panic(p) if p.message == "boom"));
    assert!(after_ran.get());
}

#[test]
fn panicking_validators_become_errors() {
    let out = Capture::new();
    let after_ran = Rc::new(Cell::new(false));
    let flag = after_ran.clone();
    let mut app = demo(&out)
        .command(
            CommandSpec::new("go")
                .flag(FlagSpec::int("x").validator(|_, _| -> anyhow::Result<()> { panic!("boom") }))
                .action(|_| Ok(())),
        )
        .after(move |_| {
            flag.set(true);
            Ok(())
        });

    let err = app.run(&args(&["go", "--x=1"])).unwrap_err();
    assert!(matches!(&err, Error::Panic(p) if p.message == "boom"), "{:?}", err);
    assert!(after_ran.get());
}

#[test]
fn after_errors_are_combined() {
    let out = Capture::new();
    let mut app = demo(&out).command(
        CommandSpec::new("deploy")
            .action(|_| Err(ExitError::new("deploy failed", 4).into()))
            .after(|_| anyhow::bail!("cleanup failed")),
    );

    let err = app.run(&args(&["deploy"])).unwrap_err();
    assert_eq!(err.to_string(), "deploy failed\ncleanup failed");
    assert_eq!(exit_code(&Err(err)), 4);
}

#[test]
fn application_before_failure_shows_help() {
    let out = Capture::new();
    let after_ran = Rc::new(Cell::new(false));
    let flag = after_ran.clone();
    let mut app = demo(&out)
        .before(|_| anyhow::bail!("not configured"))
        .after(move |_| {
            flag.set(true);
            Ok(())
        })
        .command(CommandSpec::new("deploy").action(|_| Ok(())));

    let err = app.run(&args(&["deploy"])).unwrap_err();
    assert_eq!(err.to_string(), "not configured");
    assert!(out.contents().starts_with("not configured\n\ndemo version"));
    assert!(after_ran.get());
}

#[test]
fn validators_reject_values() {
    let out = Capture::new();
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();
    let mut app = demo(&out).command(
        CommandSpec::new("scale")
            .flag(FlagSpec::int("replicas").validator(|_, value| {
                if value.as_i64().unwrap_or(0) > 10 {
                    anyhow::bail!("at most 10 replicas");
                }
                Ok(())
            }))
            .action(move |_| {
                flag.set(true);
                Ok(())
            }),
    );

    let err = app.run(&args(&["scale", "--replicas", "12"])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Incorrect usage: invalid value for flag \"replicas\": at most 10 replicas"
    );
    assert!(!ran.get());

    app.run(&args(&["scale", "--replicas", "3"])).unwrap();
    assert!(ran.get());
}

#[test]
fn environment_fallback() {
    let seen = recorder();
    let record = seen.clone();
    let out = Capture::new();
    let mut app = demo(&out)
        .flag_env_prefix("DEMO")
        .env_lookup(|name| match name {
            "DEMO_TOKEN" => Some("from-env".to_string()),
            "API_TOKEN" => Some("declared".to_string()),
            _ => None,
        })
        .flag(FlagSpec::string("token").env("API_TOKEN"))
        .command(CommandSpec::new("show").action(move |ctx| {
            record.borrow_mut().push(format!(
                "{} set={} cli={}",
                ctx.string("token"),
                ctx.is_set("token"),
                ctx.is_set_on_cli("token")
            ));
            Ok(())
        }));

    app.run(&args(&["show"])).unwrap();
    app.run(&args(&["show", "--token", "typed"])).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec!["declared set=true cli=false", "typed set=true cli=true"]
    );
}

#[test]
fn quiet_silences_output() {
    let out = Capture::new();
    let mut app = demo(&out).command(CommandSpec::new("say").action(|ctx| {
        ctx.app().output().write_out("hello\n")?;
        Ok(())
    }));

    app.run(&args(&["say", "-q"])).unwrap();
    assert_eq!(out.contents(), "");
}

#[test]
fn quiet_only_lasts_one_run() {
    let out = Capture::new();
    let mut app = demo(&out).command(CommandSpec::new("say").action(|ctx| {
        ctx.app().output().write_out("hi\n")?;
        Ok(())
    }));

    app.run(&args(&["-q", "say"])).unwrap();
    assert_eq!(out.contents(), "");

    app.run(&args(&["say"])).unwrap();
    assert_eq!(out.contents(), "hi\n");
}
