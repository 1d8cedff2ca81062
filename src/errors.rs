// src/errors.rs

use std::any::Any;
use std::fmt;

use thiserror::Error;

use crate::constants::COMMAND_NOT_FOUND_EXIT_CODE;

/// Mistakes in the application's own declarations. These are programming
/// errors and are reported once, at setup, before anything is parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{}flag redefined: {name}", scope_prefix(.scope))]
    FlagRedefined { scope: String, name: String },
    #[error("flag redefined by command {command}: {name}")]
    FlagRedefinedByCommand { command: String, name: String },
    #[error("flag redefined by command {command}: {name} (alias for {canonical})")]
    AliasRedefinedByCommand {
        command: String,
        name: String,
        canonical: String,
    },
    #[error("An argument with name \"{0}\" already exists.")]
    DuplicateArgument(String),
    #[error("Cannot add an argument after an array argument.")]
    ArgumentAfterSlice,
    #[error("Cannot add a required argument after an optional one.")]
    RequiredAfterOptional,
}

fn scope_prefix(scope: &str) -> String {
    if scope.is_empty() {
        String::new()
    } else {
        format!("{} ", scope)
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Problems with what the user typed.
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("flag provided but not defined: -{0}")]
    UndefinedFlag(String),
    #[error("bad flag syntax: {0}")]
    BadFlagSyntax(String),
    #[error("flag needs an argument: -{0}")]
    MissingValue(String),
    #[error("invalid value {value:?} for flag -{name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
    #[error("invalid boolean value {value:?} for -{name}: {reason}")]
    InvalidBoolean {
        name: String,
        value: String,
        reason: String,
    },
    #[error("flag: help requested")]
    HelpRequested,
    #[error("Required flag \"{0}\" is not set")]
    RequiredFlag(String),
    #[error("Required argument \"{0}\" is not set")]
    RequiredArgument(String),
    #[error("Too many arguments")]
    TooManyArguments,
    #[error("invalid value for flag \"{name}\": {source}")]
    InvalidFlag {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("no such flag -{0}")]
    NoSuchFlag(String),
}

pub type UsageResult<T> = Result<T, UsageError>;

/// An unknown command, with the alternatives worth suggesting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct CommandNotFoundError {
    pub command: String,
    pub alternatives: Vec<String>,
}

impl fmt::Display for CommandNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command {:?} does not exist.", self.command)?;
        match self.alternatives.as_slice() {
            [] => Ok(()),
            [only] => write!(f, "\n\nDid you mean this?\n    {}", only),
            many => write!(f, "\n\nDid you mean one of these?\n    {}", many.join("\n    ")),
        }
    }
}

/// A message paired with the process exit status it should produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ExitError {
    pub message: String,
    pub code: i32,
}

impl ExitError {
    pub fn new(message: impl Into<String>, code: i32) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

/// A panic trapped while a handler was running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PanicError {
    pub message: String,
}

/// Several errors that happened during one invocation, in order.
#[derive(Debug, Default)]
pub struct MultiError(Vec<Error>);

impl MultiError {
    pub fn new(errors: Vec<Error>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[Error] {
        &self.0
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("\n"))
    }
}

impl std::error::Error for MultiError {}

/// Everything `App::run` can fail with.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Incorrect usage: {0}")]
    IncorrectUsage(#[source] UsageError),
    #[error(transparent)]
    CommandNotFound(#[from] CommandNotFoundError),
    #[error(transparent)]
    Exit(#[from] ExitError),
    #[error(transparent)]
    Multi(#[from] MultiError),
    #[error(transparent)]
    Panic(#[from] PanicError),
    #[error(transparent)]
    Handler(anyhow::Error),
}

impl Error {
    /// Shortcut for an error that exits with `code`.
    pub fn exit(message: impl Into<String>, code: i32) -> Self {
        Error::Exit(ExitError::new(message, code))
    }

    /// The exit status this error asks for, if it carries one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::Exit(e) => Some(e.code),
            Error::CommandNotFound(_) => Some(COMMAND_NOT_FOUND_EXIT_CODE),
            Error::Multi(m) => m.errors().iter().find_map(Error::exit_code),
            Error::Handler(e) => handler_exit_code(e),
            Error::IncorrectUsage(_) | Error::Panic(_) => None,
        }
    }

    /// Combines a primary error with one raised afterwards. The primary error
    /// always stays first.
    pub fn combine(primary: Option<Error>, later: Error) -> Error {
        match primary {
            None => later,
            Some(Error::Multi(MultiError(mut errors))) => {
                errors.push(later);
                Error::Multi(MultiError(errors))
            }
            Some(first) => Error::Multi(MultiError(vec![first, later])),
        }
    }

    /// Turns a panic payload into an error. A payload that already is an
    /// `Error` is handed back untouched.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Error {
        let payload = match payload.downcast::<Error>() {
            Ok(err) => return *err,
            Err(other) => other,
        };
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Error::Panic(PanicError { message })
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(inner) => inner,
            Err(err) => Error::Handler(err),
        }
    }
}

fn handler_exit_code(err: &anyhow::Error) -> Option<i32> {
    if let Some(e) = err.downcast_ref::<ExitError>() {
        return Some(e.code);
    }
    if err.downcast_ref::<CommandNotFoundError>().is_some() {
        return Some(COMMAND_NOT_FOUND_EXIT_CODE);
    }
    None
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
