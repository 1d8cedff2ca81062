// src/cli.rs

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Switchyard: runs a command line application declared in a TOML manifest.", long_about = None)]
pub struct Cli {
    /// Manifest to load instead of ./switchyard.toml or the one in the configuration directory.
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Print the normalized argument order instead of running anything.
    #[arg(long)]
    pub explain: bool,

    /// Arguments for the declared application, usually after `--`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
