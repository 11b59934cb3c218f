//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};

/// hab - Home Assistant blueprint tooling
#[derive(Parser, Debug)]
#[command(name = "hab")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version(VersionArgs),

    /// Upgrade the CLI
    #[command(disable_version_flag = true)]
    Upgrade(UpgradeArgs),
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Upgrade command
#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Check for updates only
    #[arg(long, conflicts_with_all = ["list", "version"])]
    pub check: bool,

    /// List available versions
    #[arg(long, conflicts_with = "version")]
    pub list: bool,

    /// Install a specific version (downgrades allowed)
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
