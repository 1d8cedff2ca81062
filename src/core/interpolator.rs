// src/core/interpolator.rs

use crate::core::context::Context;

/// Fills `{args}`, `{arg:NAME}` and `{flag:NAME}` placeholders of a command
/// template from a parsed context. Unknown placeholders are left as they are.
pub struct Interpolator<'c, 'a> {
    ctx: &'c Context<'a>,
}

impl<'c, 'a> Interpolator<'c, 'a> {
    pub fn new(ctx: &'c Context<'a>) -> Self {
        Self { ctx }
    }

    pub fn interpolate(&self, input: &str) -> String {
        let mut result = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find('{') {
            result.push_str(&rest[..start]);
            let candidate = &rest[start..];
            match candidate.find('}') {
                Some(end) => {
                    let token = &candidate[1..end];
                    match self.resolve(token) {
                        Some(value) => result.push_str(&value),
                        None => result.push_str(&candidate[..=end]),
                    }
                    rest = &candidate[end + 1..];
                }
                None => {
                    result.push_str(candidate);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }

    fn resolve(&self, token: &str) -> Option<String> {
        if token == "args" {
            let args: Vec<String> = self.ctx.args().slice().iter().map(|a| quote(a)).collect();
            return Some(args.join(" "));
        }
        if let Some(name) = token.strip_prefix("arg:") {
            return Some(quote(self.ctx.args().get(name)));
        }
        if let Some(name) = token.strip_prefix("flag:") {
            return Some(quote(&self.ctx.value(name)?.as_string()));
        }
        None
    }
}

/// Quotes a word for the shell `executor::execute_command` runs lines with.
pub fn quote(word: &str) -> String {
    if cfg!(target_os = "windows") {
        quote_cmd(word)
    } else {
        quote_sh(word)
    }
}

fn is_safe(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@+,".contains(c))
}

/// Single-quotes a word for `sh` when it holds anything but safe characters.
pub fn quote_sh(word: &str) -> String {
    if is_safe(word) {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Double-quotes a word for `cmd /C`, doubling embedded quotes.
pub fn quote_cmd(word: &str) -> String {
    if is_safe(word) {
        word.to_string()
    } else {
        format!("\"{}\"", word.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuiltinFlags;
    use crate::core::app::{App, parse_command_args};
    use crate::models::{ArgSpec, CommandSpec, FlagSpec};

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn placeholders() {
        let mut app = App::new("test")
            .builtins(BuiltinFlags::none())
            .flag(FlagSpec::string("env").alias("e"))
            .command(
                CommandSpec::new("deploy")
                    .flag(FlagSpec::bool("force"))
                    .arg(ArgSpec::new("target"))
                    .arg(ArgSpec::new("files").optional().slice()),
            );
        app.try_setup().unwrap();

        let (set, result) = app.parse_args(&strings(&["-e", "prod", "deploy", "web", "a b.txt", "--force"]));
        result.unwrap();
        let root = Context::new(&app, &app.flags, set, None);
        let command = app.find_command("deploy").unwrap();
        let (set, result) = parse_command_args(&app, command, &root.raw_args().tail());
        result.unwrap();
        let ctx = Context::new(&app, &command.flags, set, Some(&root)).with_command(command, "deploy");

        let interpolator = Interpolator::new(&ctx);
        assert_eq!(
            interpolator.interpolate("rsync {args} --env={flag:env} {flag:force} -> {arg:target}"),
            format!("rsync web {} --env=prod true -> web", quote("a b.txt"))
        );
        assert_eq!(interpolator.interpolate("{unknown} {flag:nope} {open"), "{unknown} {flag:nope} {open");
    }

    #[test]
    fn quoting() {
        assert_eq!(quote_sh("plain-word"), "plain-word");
        assert_eq!(quote_sh(""), "''");
        assert_eq!(quote_sh("it's"), r"'it'\''s'");

        assert_eq!(quote_cmd("plain-word"), "plain-word");
        assert_eq!(quote_cmd("a b.txt"), "\"a b.txt\"");
        assert_eq!(quote_cmd("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_cmd("50%"), "\"50%\"");
    }
}
