// src/core/validation.rs

use std::collections::{HashMap, HashSet};

use crate::core::context::Context;
use crate::core::flag_set::FlagSet;
use crate::errors::{ConfigError, ConfigResult, UsageError, UsageResult};
use crate::models::{ArgSpec, CommandSpec, FlagSpec};

/// No two flags of one scope may share a name, alias or shortcut.
pub fn check_flags_unicity_in_scope(scope: &str, flags: &[FlagSpec]) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for flag in flags {
        for name in flag.names() {
            if !seen.insert(name.clone()) {
                return Err(ConfigError::FlagRedefined {
                    scope: scope.to_string(),
                    name,
                });
            }
        }
    }
    Ok(())
}

/// A command may not reuse a name already taken by an application flag.
pub fn check_flags_unicity(
    app_flags: &[FlagSpec],
    command_flags: &[FlagSpec],
    command_name: &str,
) -> ConfigResult<()> {
    let app_names: HashSet<String> = app_flags.iter().flat_map(FlagSpec::names).collect();

    for flag in command_flags {
        for name in flag.names() {
            if !app_names.contains(&name) {
                continue;
            }
            return Err(if name == flag.name {
                ConfigError::FlagRedefinedByCommand {
                    command: command_name.to_string(),
                    name,
                }
            } else {
                ConfigError::AliasRedefinedByCommand {
                    command: command_name.to_string(),
                    name,
                    canonical: flag.name.clone(),
                }
            });
        }
    }
    Ok(())
}

/// Argument names are unique, a variadic argument comes last and required
/// arguments never follow optional ones.
pub fn check_args_modes(args: &[ArgSpec]) -> ConfigResult<()> {
    let mut names = HashSet::new();
    let mut has_slice = false;
    let mut has_optional = false;

    for arg in args {
        if !names.insert(arg.name.as_str()) {
            return Err(ConfigError::DuplicateArgument(arg.name.clone()));
        }
        if has_slice {
            return Err(ConfigError::ArgumentAfterSlice);
        }
        if !arg.optional && has_optional {
            return Err(ConfigError::RequiredAfterOptional);
        }
        has_slice |= arg.slice;
        has_optional |= arg.optional;
    }
    Ok(())
}

/// Every required flag must have received a value.
pub fn check_required_flags(flags: &[FlagSpec], set: &FlagSet) -> UsageResult<()> {
    match flags
        .iter()
        .find(|f| f.is_required() && !set.is_visited(&f.name))
    {
        Some(missing) => Err(UsageError::RequiredFlag(missing.name.clone())),
        None => Ok(()),
    }
}

/// Runs the validators of the flags that received a value, in declaration
/// order. The first failure wins.
pub fn check_flags_validity(flags: &[FlagSpec], ctx: &Context<'_>) -> UsageResult<()> {
    let values: HashMap<&str, _> = ctx.with_flag_set(|set| {
        flags
            .iter()
            .filter(|f| f.validator.is_some() && set.is_visited(&f.name))
            .filter_map(|f| set.value(&f.name).map(|v| (f.name.as_str(), v.clone())))
            .collect()
    });

    for flag in flags {
        let (Some(validator), Some(value)) = (&flag.validator, values.get(flag.name.as_str())) else {
            continue;
        };
        validator(ctx, value).map_err(|source| UsageError::InvalidFlag {
            name: flag.name.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Checks the positionals against the command's argument slots.
pub fn check_required_args(command: &CommandSpec, ctx: &Context<'_>) -> UsageResult<()> {
    let args = ctx.args();
    let mut has_slice = false;
    let mut maximum = 0;

    for arg in &command.args {
        if arg.slice {
            has_slice = true;
        } else {
            maximum += 1;
        }

        if arg.optional {
            continue;
        }

        if arg.slice {
            if args.tail().is_empty() {
                return Err(UsageError::RequiredArgument(arg.name.clone()));
            }
            break;
        }

        if args.get(&arg.name).is_empty() {
            return Err(UsageError::RequiredArgument(arg.name.clone()));
        }
    }

    if !has_slice && args.len() > maximum {
        return Err(UsageError::TooManyArguments);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuiltinFlags;
    use crate::core::app::App;
    use crate::models::builtin;
    use std::cell::Cell;
    use std::rc::Rc;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn duplicate_names_in_one_scope() {
        let flags = vec![FlagSpec::string("config").alias("c"), FlagSpec::bool("c")];
        assert_eq!(
            check_flags_unicity_in_scope("deploy", &flags),
            Err(ConfigError::FlagRedefined {
                scope: "deploy".into(),
                name: "c".into()
            })
        );
        assert_eq!(
            check_flags_unicity_in_scope("", &flags).unwrap_err().to_string(),
            "flag redefined: c"
        );
        assert!(check_flags_unicity_in_scope("x", &[builtin::verbosity(), builtin::quiet()]).is_ok());
    }

    #[test]
    fn command_flags_may_not_shadow_application_flags() {
        let app_flags = vec![builtin::quiet(), builtin::verbosity()];

        let err = check_flags_unicity(&app_flags, &[FlagSpec::bool("quiet")], "deploy").unwrap_err();
        assert_eq!(err.to_string(), "flag redefined by command deploy: quiet");

        let err = check_flags_unicity(&app_flags, &[FlagSpec::int("level").alias("vv")], "deploy")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "flag redefined by command deploy: vv (alias for level)"
        );

        assert!(check_flags_unicity(&app_flags, &[FlagSpec::bool("force")], "deploy").is_ok());
    }

    #[test]
    fn argument_shapes() {
        assert!(check_args_modes(&[ArgSpec::new("a"), ArgSpec::new("b").optional()]).is_ok());
        assert_eq!(
            check_args_modes(&[ArgSpec::new("a"), ArgSpec::new("a")]),
            Err(ConfigError::DuplicateArgument("a".into()))
        );
        assert_eq!(
            check_args_modes(&[ArgSpec::new("a").slice(), ArgSpec::new("b")]),
            Err(ConfigError::ArgumentAfterSlice)
        );
        assert_eq!(
            check_args_modes(&[ArgSpec::new("a").optional(), ArgSpec::new("b")]),
            Err(ConfigError::RequiredAfterOptional)
        );
    }

    #[test]
    fn required_flags() {
        let flags = vec![FlagSpec::string("required").required(), FlagSpec::string("optional")];

        let mut set = FlagSet::new("test", &flags);
        set.parse(&strings(&["--required", "foo"])).unwrap();
        assert!(check_required_flags(&flags, &set).is_ok());

        let mut set = FlagSet::new("test", &flags);
        set.parse(&strings(&["--optional", "foo"])).unwrap();
        assert_eq!(
            check_required_flags(&flags, &set).unwrap_err().to_string(),
            "Required flag \"required\" is not set"
        );
    }

    fn app_with(flags: Vec<FlagSpec>) -> App {
        let mut app = App::new("test").builtins(BuiltinFlags::none());
        app.flags = flags;
        app.try_setup().unwrap();
        app
    }

    #[test]
    fn validators_run_on_given_flags_in_order() {
        let called = Rc::new(Cell::new(0));
        let seen = called.clone();
        let app = app_with(vec![
            FlagSpec::string("foo").validator(move |_, _| {
                seen.set(seen.get() + 1);
                Ok(())
            }),
            FlagSpec::string("bar").validator(|_, value| {
                if value.as_string() != "bar" {
                    anyhow::bail!("invalid");
                }
                Ok(())
            }),
        ]);

        let (set, result) = app.parse_args(&strings(&["--foo", "x"]));
        result.unwrap();
        let ctx = Context::new(&app, &app.flags, set, None);
        assert!(check_flags_validity(&app.flags, &ctx).is_ok());
        assert_eq!(called.get(), 1);

        let (set, result) = app.parse_args(&strings(&["--bar", "baz"]));
        result.unwrap();
        let ctx = Context::new(&app, &app.flags, set, None);
        let err = check_flags_validity(&app.flags, &ctx).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for flag \"bar\": invalid");
        assert_eq!(called.get(), 1);
    }

    fn check_args(command: CommandSpec, args: &[&str]) -> UsageResult<()> {
        let app = app_with(Vec::new());
        let mut set = FlagSet::new("test", &[]);
        set.parse(&strings(args)).unwrap();
        let ctx = Context::new(&app, &[], set, None).with_command(&command, command.name.as_str());
        check_required_args(&command, &ctx)
    }

    #[test]
    fn required_arguments() {
        let single = || CommandSpec::new("single").arg(ArgSpec::new("name"));
        assert_eq!(
            check_args(single(), &[]).unwrap_err().to_string(),
            "Required argument \"name\" is not set"
        );
        assert!(check_args(single(), &["a"]).is_ok());
        assert!(matches!(
            check_args(single(), &["a", "b"]),
            Err(UsageError::TooManyArguments)
        ));

        let variadic = || {
            CommandSpec::new("variadic")
                .arg(ArgSpec::new("env"))
                .arg(ArgSpec::new("files").slice())
        };
        assert!(matches!(
            check_args(variadic(), &["prod"]),
            Err(UsageError::RequiredArgument(name)) if name == "files"
        ));
        assert!(check_args(variadic(), &["prod", "a", "b", "c"]).is_ok());

        let optional = || CommandSpec::new("optional").arg(ArgSpec::new("name").optional());
        assert!(check_args(optional(), &[]).is_ok());
        assert!(check_args(CommandSpec::new("none"), &["--", "x"]).is_err());
    }
}
