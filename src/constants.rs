// src/constants.rs

/// Token that ends flag interpretation for the rest of the command line.
pub const TERMINATOR: &str = "--";

/// Separator between a command category and its name (`project:list`).
pub const CATEGORY_SEPARATOR: char = ':';

/// Exit status used when an error carries no explicit code.
pub const DEFAULT_ERROR_EXIT_CODE: i32 = 1;

/// Exit status for an unknown command.
pub const COMMAND_NOT_FOUND_EXIT_CODE: i32 = 3;

// --- Built-in flags ---

pub const HELP_FLAG: &str = "help";
pub const HELP_FLAG_ALIAS: &str = "h";
pub const VERSION_FLAG: &str = "V";
pub const LOG_LEVEL_FLAG: &str = "log-level";
pub const VERBOSE_FLAG: &str = "verbose";
pub const VERBOSE_SHORT_FLAG: &str = "v";
pub const QUIET_FLAG: &str = "quiet";
pub const QUIET_FLAG_ALIAS: &str = "q";
pub const NO_INTERACTION_FLAG: &str = "no-interaction";
pub const ANSI_FLAG: &str = "ansi";
pub const NO_ANSI_FLAG: &str = "no-ansi";

/// Number of repeatable short verbosity shortcuts (`-v`, `-vv`, `-vvv`).
pub const VERBOSITY_SHORTCUTS: usize = 3;

/// Level set by `--verbose`.
pub const VERBOSE_LEVEL: u8 = 3;

/// Level in effect when no verbosity flag is given.
pub const DEFAULT_LOG_LEVEL: u8 = 1;

// --- Built-in commands ---

pub const SELF_CATEGORY: &str = "self";
pub const HELP_COMMAND: &str = "help";
pub const LIST_COMMAND_ALIAS: &str = "list";
pub const VERSION_COMMAND: &str = "version";

// --- Setup defaults ---

pub const DEFAULT_USAGE: &str = "A new cli application";
pub const DEFAULT_VERSION: &str = "0.0.0";
pub const DEFAULT_CHANNEL: &str = "dev";

// --- Demonstration binary ---

/// Manifest looked up in the working directory.
pub const LOCAL_MANIFEST_FILENAME: &str = "switchyard.toml";

/// Manifest looked up in the user configuration directory.
pub const CONFIG_MANIFEST_FILENAME: &str = "manifest.toml";

/// Name of the directory created under the system configuration directory.
pub const CONFIG_DIR_NAME: &str = "switchyard";

/// Environment variable that disables decorated output.
pub const NO_COLOR_ENV: &str = "NO_COLOR";
