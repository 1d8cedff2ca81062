// src/system/executor.rs

use std::path::Path;
use std::process::{Command as StdCommand, Stdio};

use thiserror::Error;

use crate::constants::DEFAULT_ERROR_EXIT_CODE;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command '{0}' could not be started: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{0}' exited with status {1:?}")]
    NonZeroExitStatus(String, Option<i32>),
}

impl ExecutionError {
    /// Status to propagate to our own caller.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecutionError::NonZeroExitStatus(_, Some(code)) => *code,
            _ => DEFAULT_ERROR_EXIT_CODE,
        }
    }
}

/// Runs a command line through the platform shell in `cwd`, with the
/// current process's standard streams.
pub fn execute_command(command_line: &str, cwd: &Path) -> Result<(), ExecutionError> {
    log::info!("Running '{}' in {:?}", command_line, cwd);

    let (shell, arg) = if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };

    let status = StdCommand::new(shell)
        .arg(arg)
        .arg(command_line)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| ExecutionError::CommandFailed(command_line.to_string(), e))?;

    if !status.success() {
        return Err(ExecutionError::NonZeroExitStatus(
            command_line.to_string(),
            status.code(),
        ));
    }

    Ok(())
}
