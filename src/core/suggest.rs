// src/core/suggest.rs

use strsim::levenshtein;

use crate::models::CommandSpec;

/// Names worth suggesting for an unknown command, sorted.
///
/// A command whose category is the typed name, or close to it, is suggested
/// by its full name. Otherwise each of its names that starts or ends with
/// the typed name, or is within a third of its length in edits, is kept.
pub fn find_alternatives(name: &str, commands: &[&CommandSpec]) -> Vec<String> {
    let threshold = name.len() / 3;
    let mut alternatives = Vec::new();

    for command in commands {
        if !command.category.is_empty()
            && (command.category == name || levenshtein(name, &command.category) <= threshold)
        {
            alternatives.push(command.full_name());
            continue;
        }

        alternatives.extend(command.names().into_iter().filter(|candidate| {
            candidate.starts_with(name)
                || candidate.ends_with(name)
                || levenshtein(name, candidate) <= threshold
        }));
    }

    alternatives.sort();
    alternatives
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands() -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("list").category("project").alias("projects"),
            CommandSpec::new("deploy").category("env"),
            CommandSpec::new("help").category("self").alias("help").alias("list"),
            CommandSpec::new("upload"),
        ]
    }

    fn suggest(name: &str) -> Vec<String> {
        let commands = commands();
        let refs: Vec<&CommandSpec> = commands.iter().collect();
        find_alternatives(name, &refs)
    }

    #[test]
    fn prefix_suffix_and_typos() {
        assert_eq!(suggest("uplaod"), vec!["upload"]);
        assert_eq!(suggest("up"), vec!["upload"]);
        assert_eq!(suggest("ploy"), vec!["env:deploy"]);
        assert_eq!(suggest("lst"), vec!["list"]);
    }

    #[test]
    fn categories_suggest_their_commands() {
        assert_eq!(suggest("project"), vec!["project:list"]);
        assert_eq!(suggest("env"), vec!["env:deploy"]);
    }

    #[test]
    fn nothing_close() {
        assert!(suggest("zzzzzz").is_empty());
    }
}
