// src/models/mod.rs

pub mod command;
pub mod flag;
pub mod manifest;
pub mod value;

pub use command::{Alias, ArgSpec, CommandSpec, Handler, ParsingMode, args_usage};
pub use flag::{Destination, FlagSpec, Validator, builtin};
pub use manifest::{CommandDecl, FlagDecl, FlagKind, Manifest, ManifestError};
pub use value::{Generic, Value};
