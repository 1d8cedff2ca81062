// src/core/reorder.rs

use crate::constants::TERMINATOR;
use crate::core::resolver::best_command;
use crate::models::flag::{expand_shortcut, find_flag};
use crate::models::{CommandSpec, FlagSpec, ParsingMode};

fn is_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

/// Bare, canonical name of a flag token: `--q=1` gives `quiet`.
fn clean_flag(flags: &[FlagSpec], token: &str) -> String {
    let name = token.split_once('=').map_or(token, |(name, _)| name);
    expand_shortcut(flags, name.trim_start_matches('-'))
}

/// Rewrites the flag name to its canonical form, keeping the dash count and
/// any `=value` suffix.
fn translate_shortcut(flags: &[FlagSpec], token: &str) -> String {
    let two_dashes = token.as_bytes().get(1) == Some(&b'-');
    let body = token.trim_start_matches('-');
    let body = match body.split_once('=') {
        Some((name, value)) => format!("{}={}", expand_shortcut(flags, name), value),
        None => expand_shortcut(flags, body),
    };
    if two_dashes {
        format!("--{}", body)
    } else {
        format!("-{}", body)
    }
}

/// Reorders command line arguments so that a left to right flag parser can
/// consume them: `flags ++ [command] ++ positionals`.
///
/// `upload -slot=4 --v=4 file1` becomes `--v=4 upload -slot=4 file1` when
/// `v` is a known flag and `slot` belongs to `upload`. The parsing mode of
/// the resolved command decides how much of the rest is looked at, so the
/// arguments of a wrapped program (`run php -n script.php`) stay untouched.
///
/// `default_command` pre-fills the command slot. A command's own pass uses
/// `--`, which makes a `--` token vanish from its place and reappear between
/// the flags and the positionals.
pub fn fix_args(
    args: &[String],
    flags: &[FlagSpec],
    commands: &[CommandSpec],
    default_mode: ParsingMode,
    default_command: &str,
) -> Vec<String> {
    let mut found_flags: Vec<String> = Vec::new();
    let mut non_flags: Vec<String> = Vec::new();
    let mut command = default_command.to_string();
    let mut mode = default_mode;
    let mut previous_flag_needs_value = false;

    for arg in args {
        if mode == ParsingMode::Skipped {
            non_flags.push(arg.clone());
            continue;
        }

        if arg == TERMINATOR {
            mode = ParsingMode::Skipped;
            if *arg != command {
                non_flags.push(arg.clone());
            }
            continue;
        }

        if is_flag(arg) {
            let cleaned = clean_flag(flags, arg);
            previous_flag_needs_value = false;

            if let Some(flag) = find_flag(flags, &cleaned) {
                let mut token = translate_shortcut(flags, arg);
                // an empty inline value ("-s=") asks for the next argument
                if token.find('=') == Some(token.len() - 1) {
                    token.pop();
                }
                if !token.contains('=') && !flag.is_self_contained() {
                    previous_flag_needs_value = true;
                }
                log::trace!("'{}' is flag '{}'", arg, token);
                found_flags.push(token);
            } else if default_command == TERMINATOR && mode == ParsingMode::Normal {
                // kept so the parser reports it instead of treating it as data
                previous_flag_needs_value = arg.trim().ends_with('=');
                log::trace!("'{}' is an unknown flag of the command", arg);
                found_flags.push(arg.clone());
            } else {
                log::trace!("'{}' is left for the command", arg);
                non_flags.push(arg.clone());
            }
            continue;
        }

        if previous_flag_needs_value {
            found_flags.push(arg.clone());
            previous_flag_needs_value = false;
            continue;
        }

        if command.is_empty() {
            if let Some(found) = best_command(commands, arg) {
                log::trace!("'{}' is command '{}'", arg, found.command.full_name());
                command = arg.clone();
                mode = found.command.mode;
                continue;
            }
        }

        if mode == ParsingMode::SkippedAfterFirstArg {
            mode = ParsingMode::Skipped;
        }
        non_flags.push(arg.clone());
    }

    if !command.is_empty() {
        found_flags.push(command);
    }
    found_flags.extend(non_flags);
    found_flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flag_set::FlagSet;
    use crate::errors::UsageError;
    use crate::models::{Value, builtin};

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn upload_flags() -> Vec<FlagSpec> {
        vec![
            FlagSpec::int("reference").alias("r"),
            FlagSpec::int("samples").alias("s"),
            FlagSpec::bool("test").alias("t"),
        ]
    }

    fn app_flags() -> Vec<FlagSpec> {
        vec![
            FlagSpec::int("v").default_value(Value::Int(1)),
            FlagSpec::string("server-id"),
            FlagSpec::string("server-token"),
            FlagSpec::string("config"),
            FlagSpec::bool("quiet").alias("q"),
        ]
    }

    fn commands() -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("agent"),
            CommandSpec::new("curl").with_flags(upload_flags()),
            CommandSpec::new("upload").with_flags(upload_flags()),
            CommandSpec::new("foo")
                .with_flags(upload_flags())
                .mode(ParsingMode::Skipped),
            CommandSpec::new("run")
                .with_flags(upload_flags())
                .mode(ParsingMode::SkippedAfterFirstArg),
        ]
    }

    fn app_pass(args: &[&str]) -> Vec<String> {
        fix_args(&strings(args), &app_flags(), &commands(), ParsingMode::Normal, "")
    }

    fn command_pass(mode: ParsingMode, args: &[&str]) -> Vec<String> {
        fix_args(&strings(args), &upload_flags(), &[], mode, TERMINATOR)
    }

    #[test]
    fn application_pass() {
        let cases: &[(&[&str], &[&str])] = &[
            (
                &["-reference=4", "--v=3", "-q", "upload", "file1", "file2"],
                &["--v=3", "-quiet", "upload", "-reference=4", "file1", "file2"],
            ),
            (
                &["-reference", "4", "--v=3", "-q", "upload", "file1", "file2"],
                &["--v=3", "-quiet", "upload", "-reference", "4", "file1", "file2"],
            ),
            (
                &["upload", "-reference=4", "-v=3", "-q", "upload", "file1", "file2"],
                &["-v=3", "-quiet", "upload", "-reference=4", "upload", "file1", "file2"],
            ),
            (
                &["curl", "-reference=4", "-v=3", "-q", "-X", "POST", "http://blackfire.io"],
                &["-v=3", "-quiet", "curl", "-reference=4", "-X", "POST", "http://blackfire.io"],
            ),
            (
                &["-server-id=a", "-server-token=b", "agent", "-v=4"],
                &["-server-id=a", "-server-token=b", "-v=4", "agent"],
            ),
            (
                &["run", "-v=4", "--reference", "8", "php", "vd.php"],
                &["-v=4", "run", "--reference", "8", "php", "vd.php"],
            ),
            (
                &["run", "--", "-v=4", "--reference", "8", "php", "vd.php"],
                &["run", "--", "-v=4", "--reference", "8", "php", "vd.php"],
            ),
            (
                &["-v=4", "foo", "--reference", "8", "php", "vd.php"],
                &["-v=4", "foo", "--reference", "8", "php", "vd.php"],
            ),
            (
                &["-config", "/Users/marc/.blackfire-d1.ini", "-reference=19", "upload", "profiler/README.md"],
                &["-config", "/Users/marc/.blackfire-d1.ini", "upload", "-reference=19", "profiler/README.md"],
            ),
            (
                &["--config=YWJjZA==", "upload", "file1"],
                &["--config=YWJjZA==", "upload", "file1"],
            ),
            (
                &["upload", "-config=k=v", "-config=", "a=", "file1"],
                &["-config=k=v", "-config", "a=", "upload", "file1"],
            ),
            (
                &["run", "-v=4", "--reference", "8", "php", "vd.php", "--config=foo", "--foo", "bar"],
                &["-v=4", "run", "--reference", "8", "php", "vd.php", "--config=foo", "--foo", "bar"],
            ),
        ];

        for (args, expected) in cases {
            assert_eq!(app_pass(args), strings(expected), "input: {:?}", args);
        }
    }

    #[test]
    fn command_pass_by_mode() {
        let args = ["-reference=4", "--samples=10", "-t", "file1", "-s=", "5", "-H='Host: foo'", "foo"];

        let normal = strings(&["-reference=4", "--samples=10", "-test", "-samples", "5", "-H='Host: foo'", "--", "file1", "foo"]);
        assert_eq!(command_pass(ParsingMode::Normal, &args), normal);

        let mut skipped = strings(&["--"]);
        skipped.extend(strings(&args));
        assert_eq!(command_pass(ParsingMode::Skipped, &args), skipped);

        assert_eq!(
            command_pass(ParsingMode::SkippedAfterFirstArg, &args),
            strings(&["-reference=4", "--samples=10", "-test", "--", "file1", "-s=", "5", "-H='Host: foo'", "foo"])
        );
    }

    #[test]
    fn only_an_empty_inline_value_is_stripped() {
        let flags = vec![FlagSpec::string("token"), FlagSpec::int("samples").alias("s")];
        let sorted = fix_args(&strings(&["--token=YWJjZA==", "file"]), &flags, &[], ParsingMode::Normal, TERMINATOR);
        assert_eq!(sorted, strings(&["--token=YWJjZA==", "--", "file"]));

        let sorted = fix_args(&strings(&["--samples=a==", "-s=", "="]), &flags, &[], ParsingMode::Normal, TERMINATOR);
        assert_eq!(sorted, strings(&["--samples=a==", "-samples", "=", "--"]));
    }

    #[test]
    fn empty_inline_value_at_the_end_is_missing() {
        assert_eq!(
            command_pass(ParsingMode::Normal, &["file1", "-s="]),
            strings(&["-samples", "--", "file1"])
        );

        let sorted = app_pass(&["-config="]);
        assert_eq!(sorted, strings(&["-config"]));

        let mut set = FlagSet::new("demo", &app_flags());
        let err = set.parse(&sorted).unwrap_err();
        assert!(matches!(err, UsageError::MissingValue(ref name) if name == "config"), "{:?}", err);
    }

    #[test]
    fn terminator_region_is_left_alone() {
        let args = ["-reference=4", "-s=", "5", "--", "--samples=10", "file1", "-f=", "3", "foo"];
        assert_eq!(
            command_pass(ParsingMode::Normal, &args),
            strings(&["-reference=4", "-samples", "5", "--", "--samples=10", "file1", "-f=", "3", "foo"])
        );
    }

    #[test]
    fn unknown_flags_stay_in_the_command_flags() {
        let args = ["-reference=4", "--unknown", "-r=", "-s=", "5", "--samples=10", "file1", "-f=", "3", "foo"];
        assert_eq!(
            command_pass(ParsingMode::Normal, &args),
            strings(&["-reference=4", "--unknown", "-reference", "-samples", "5", "--samples=10", "-f=", "3", "--", "file1", "foo"])
        );
    }

    #[test]
    fn verbosity_shortcuts_are_never_rewritten() {
        let flags = vec![builtin::verbosity()];
        let commands = vec![CommandSpec::new("envs").flag(FlagSpec::string("project").alias("p"))];
        for arg in ["--log-level=5", "--verbose", "-vvv", "-vv", "-v", "-v=3"] {
            let sorted = fix_args(
                &strings(&[arg, "-p", "agb6vnth4arfo", "envs"]),
                &flags,
                &commands,
                ParsingMode::Normal,
                "",
            );
            assert_eq!(sorted, strings(&[arg, "envs", "-p", "agb6vnth4arfo"]));
        }
    }

    #[test]
    fn deterministic() {
        let args = ["-q", "up", "-reference", "1", "x", "--", "-v"];
        assert_eq!(app_pass(&args), app_pass(&args));
    }
}
