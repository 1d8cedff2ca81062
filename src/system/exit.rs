// src/system/exit.rs

use std::io::Write;

use crate::constants::DEFAULT_ERROR_EXIT_CODE;
use crate::errors::{Error, Result};

/// Process exit status for the outcome of `App::run`.
pub fn exit_code(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => err.exit_code().unwrap_or(DEFAULT_ERROR_EXIT_CODE),
    }
}

/// Prints an error for the user. Each member of a combined error gets its
/// own line; empty messages are skipped.
pub fn print_error(err: &Error, out: &mut dyn Write) -> std::io::Result<()> {
    match err {
        Error::Multi(multi) => {
            for member in multi.errors() {
                print_error(member, out)?;
            }
            Ok(())
        }
        other => {
            let message = other.to_string();
            if message.is_empty() {
                return Ok(());
            }
            writeln!(out, "{}", message)
        }
    }
}

/// Reports a failed run on standard error and returns the exit status.
pub fn handle(result: Result<()>) -> i32 {
    let code = exit_code(&result);
    if let Err(err) = &result {
        log::debug!("Run failed with exit status {}: {:?}", code, err);
        if let Err(e) = print_error(err, &mut std::io::stderr()) {
            log::warn!("Could not report the error: {}", e);
        }
    }
    code
}
