// src/core/args.rs

use crate::models::CommandSpec;

/// Positional arguments, bound to the argument slots of a command when
/// there is one.
#[derive(Debug, Clone, Default)]
pub struct Args<'a> {
    values: Vec<String>,
    command: Option<&'a CommandSpec>,
}

impl<'a> Args<'a> {
    pub fn new(values: Vec<String>, command: Option<&'a CommandSpec>) -> Self {
        Self { values, command }
    }

    /// Value of the named non-variadic slot, its default when missing, or an
    /// empty string for an unknown name.
    pub fn get(&self, name: &str) -> &str {
        let Some(command) = self.command else {
            return "";
        };
        command
            .args
            .iter()
            .enumerate()
            .find(|(_, arg)| arg.name == name && !arg.slice)
            .map(|(i, arg)| self.values.get(i).map_or(arg.default.as_str(), String::as_str))
            .unwrap_or("")
    }

    pub fn first(&self) -> &str {
        self.values.first().map_or("", String::as_str)
    }

    /// Everything from the variadic slot on when the command declares one,
    /// otherwise everything after the first value.
    pub fn tail(&self) -> Vec<String> {
        if let Some(position) = self
            .command
            .and_then(|c| c.args.iter().position(|arg| arg.slice))
        {
            return self.values.get(position..).unwrap_or_default().to_vec();
        }
        self.values.get(1..).unwrap_or_default().to_vec()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn present(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn slice(&self) -> Vec<String> {
        self.values.clone()
    }
}
