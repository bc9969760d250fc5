//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::keyvalue::Style;

/// Top-level CLI entry point for the provisioning engine.
#[derive(Parser, Debug)]
#[command(
    name = "converge",
    about = "Idempotent provisioning of files and key/value configuration",
    version
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// How to render diffs of changed files
    #[arg(long, value_enum, default_value_t = DiffChoice::Auto, global = true)]
    pub diff: DiffChoice,
}

/// Diff renderer selection.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffChoice {
    /// External `diff` when available, otherwise built in
    Auto,
    /// Always run `colordiff`/`diff`
    External,
    /// Always use the built-in renderer
    Internal,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply every resource of a manifest
    Apply(ApplyOpts),
    /// Set keys in one key/value file
    Set(SetOpts),
    /// Print the detected assignment style of a file
    Detect(DetectOpts),
    /// Print version information
    Version,
}

/// Options for the `apply` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ApplyOpts {
    /// Manifest file (TOML)
    pub manifest: PathBuf,

    /// Exit with status 2 when anything changed
    #[arg(long)]
    pub detailed_exitcode: bool,
}

/// Options for the `set` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SetOpts {
    /// Existing file to edit
    pub path: PathBuf,

    /// Settings as KEY=VALUE
    #[arg(required = true, value_parser = parse_setting)]
    pub settings: Vec<(String, String)>,

    /// Assignment style instead of detecting it (shell or plain)
    #[arg(long)]
    pub style: Option<Style>,
}

/// Options for the `detect` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct DetectOpts {
    /// File to inspect
    pub path: PathBuf,
}

fn parse_setting(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}
