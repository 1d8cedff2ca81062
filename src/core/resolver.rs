// src/core/resolver.rs

use crate::constants::CATEGORY_SEPARATOR;
use crate::models::CommandSpec;

/// A resolved command together with the name the user actually typed.
#[derive(Debug, Clone)]
pub struct CommandMatch<'c> {
    pub command: &'c CommandSpec,
    pub index: usize,
    pub user_name: String,
}

/// Whether `pattern` abbreviates `candidate` segment by segment: both have
/// the same number of `:` separated segments and each pattern segment is a
/// prefix of the matching candidate segment (`p:lis` for `project:list`).
pub fn segments_match(pattern: &str, candidate: &str) -> bool {
    let mut wanted = pattern.split(CATEGORY_SEPARATOR);
    let mut available = candidate.split(CATEGORY_SEPARATOR);
    loop {
        match (wanted.next(), available.next()) {
            (None, None) => return true,
            (Some(prefix), Some(segment)) if segment.starts_with(prefix) => continue,
            _ => return false,
        }
    }
}

/// Exact lookup against full names and visible aliases.
pub fn find_exact<'c>(commands: &'c [CommandSpec], name: &str) -> Option<(usize, &'c CommandSpec)> {
    let name = name.to_lowercase();
    commands
        .iter()
        .enumerate()
        .find(|(_, c)| c.has_name(&name, true))
}

/// Exact match first, otherwise the only command the name abbreviates.
/// Several fuzzy candidates resolve to nothing.
pub fn best_command<'c>(commands: &'c [CommandSpec], name: &str) -> Option<CommandMatch<'c>> {
    if let Some((index, command)) = find_exact(commands, name) {
        log::debug!("Command '{}' resolved to '{}'", name, command.full_name());
        return Some(CommandMatch {
            command,
            index,
            user_name: name.to_string(),
        });
    }

    let lowered = name.to_lowercase();
    let mut matches = commands
        .iter()
        .enumerate()
        .filter(|(_, c)| c.has_name(&lowered, false));

    match (matches.next(), matches.next()) {
        (Some((index, command)), None) => {
            log::debug!("Command '{}' fuzzy matched '{}'", name, command.full_name());
            Some(CommandMatch {
                command,
                index,
                user_name: name.to_string(),
            })
        }
        (Some(_), Some(_)) => {
            log::debug!("Command '{}' is ambiguous", name);
            None
        }
        _ => None,
    }
}
