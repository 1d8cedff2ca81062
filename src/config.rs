// src/config.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_MANIFEST_FILENAME, DEFAULT_CHANNEL, DEFAULT_USAGE, DEFAULT_VERSION,
    LOCAL_MANIFEST_FILENAME,
};

/// Application level settings. Every `App` owns its own copy, built from
/// defaults or deserialized from a manifest's `[app]` table.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub help_name: String,
    pub usage: String,
    pub version: String,
    pub channel: String,
    pub description: String,
    pub copyright: String,
    /// Prefixes used to derive one extra environment variable per flag.
    pub flag_env_prefix: Vec<String>,
    pub builtins: BuiltinFlags,
}

impl AppSettings {
    /// Fills empty fields with the setup defaults. The name falls back to the
    /// current executable's file name.
    pub fn apply_defaults(&mut self) {
        if self.name.is_empty() {
            self.name = executable_name();
        }
        if self.help_name.is_empty() {
            self.help_name = self.name.clone();
        }
        if self.usage.is_empty() {
            self.usage = DEFAULT_USAGE.to_string();
        }
        if self.version.is_empty() {
            self.version = DEFAULT_VERSION.to_string();
        }
        if self.channel.is_empty() {
            self.channel = DEFAULT_CHANNEL.to_string();
        }
    }
}

fn executable_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default()
}

/// Which conventional decorations get injected at setup.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct BuiltinFlags {
    pub help: bool,
    pub version: bool,
    pub verbosity: bool,
    pub quiet: bool,
    pub no_interaction: bool,
    pub ansi: bool,
    pub help_command: bool,
    pub version_command: bool,
}

impl Default for BuiltinFlags {
    fn default() -> Self {
        Self {
            help: true,
            version: true,
            verbosity: true,
            quiet: true,
            no_interaction: true,
            ansi: true,
            help_command: true,
            version_command: true,
        }
    }
}

impl BuiltinFlags {
    /// Nothing injected at all.
    pub fn none() -> Self {
        Self {
            help: false,
            version: false,
            verbosity: false,
            quiet: false,
            no_interaction: false,
            ansi: false,
            help_command: false,
            version_command: false,
        }
    }
}

/// Returns the switchyard configuration directory, creating it when missing.
pub fn get_config_dir() -> Result<PathBuf, String> {
    let config_path = dirs::config_dir()
        .ok_or("Could not find the system configuration directory.")?
        .join(CONFIG_DIR_NAME);
    log::debug!("Configuration directory: {:?}", config_path);
    if !config_path.exists() {
        fs::create_dir_all(&config_path).map_err(|e| {
            format!(
                "Could not create the configuration directory {:?}: {}",
                config_path, e
            )
        })?;
    }

    Ok(config_path)
}

/// Locates the manifest: the explicit path, then `./switchyard.toml`, then
/// the one in the configuration directory.
pub fn manifest_path(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf, String> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let local = cwd.join(LOCAL_MANIFEST_FILENAME);
    if local.is_file() {
        return Ok(local);
    }

    let global = get_config_dir()?.join(CONFIG_MANIFEST_FILENAME);
    if global.is_file() {
        return Ok(global);
    }

    Err(format!(
        "No manifest found: pass --manifest, or create {} or {:?}.",
        LOCAL_MANIFEST_FILENAME, global
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_only_empty_fields() {
        let mut settings = AppSettings {
            name: "tool".to_string(),
            version: "1.2.3".to_string(),
            ..Default::default()
        };
        settings.apply_defaults();
        assert_eq!(settings.help_name, "tool");
        assert_eq!(settings.usage, DEFAULT_USAGE);
        assert_eq!(settings.version, "1.2.3");
        assert_eq!(settings.channel, DEFAULT_CHANNEL);
    }

    #[test]
    fn local_manifest_wins_over_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(LOCAL_MANIFEST_FILENAME);
        fs::write(&local, "").unwrap();
        assert_eq!(manifest_path(None, dir.path()).unwrap(), local);

        let explicit = dir.path().join("other.toml");
        assert_eq!(
            manifest_path(Some(&explicit), dir.path()).unwrap(),
            explicit
        );
    }

    #[test]
    fn builtins_deserialize_partially() {
        let settings: AppSettings = toml::from_str("name = \"x\"\n[builtins]\nquiet = false\n").unwrap();
        assert!(!settings.builtins.quiet);
        assert!(settings.builtins.help);
    }
}
