// src/lib.rs

//! Command line normalization, parsing and dispatch.
//!
//! An [`App`] declares global flags and commands. Running it reorders the
//! arguments so flags may appear anywhere, parses the application flags,
//! resolves the command (exact, case-insensitive or abbreviated), parses
//! the command's own flags and calls its handlers with a [`Context`] that
//! looks flags up from the command scope outwards.

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod errors;
pub mod models;
pub mod system;

pub use crate::config::{AppSettings, BuiltinFlags};
pub use crate::core::app::App;
pub use crate::core::args::Args;
pub use crate::core::context::Context;
pub use crate::errors::{Error, Result};
pub use crate::models::{ArgSpec, CommandSpec, FlagSpec, ParsingMode, Value};
