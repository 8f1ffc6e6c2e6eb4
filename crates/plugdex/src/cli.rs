//! CLI definition.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, Context};

/// Manage plugin repositories, plugin metadata and manager settings.
#[derive(Debug, Parser)]
#[command(name = "plugdex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Settings file (defaults to ~/.plugdex/settings.toml)
    #[arg(long, env = "PLUGDEX_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage repositories (list, add, remove, reorder, rename)
    Repo(commands::repo::RepoArgs),

    /// Reload the release lists of all repositories
    Refresh,

    /// List the plugin releases offered by the repositories
    Plugins(commands::plugins::PluginsArgs),

    /// Read and write raw settings
    Settings(commands::settings::SettingsArgs),

    /// Show or change whether deprecated and experimental plugins are allowed
    Policy(commands::policy::PolicyArgs),
}

impl Cli {
    /// Runs the CLI command.
    pub fn run(self) -> Result<()> {
        let ctx = Context::new(self.settings)?;
        match self.command {
            Commands::Repo(args) => commands::repo::run(&ctx, args),
            Commands::Refresh => commands::refresh::run(&ctx),
            Commands::Plugins(ref args) => commands::plugins::run(&ctx, args),
            Commands::Settings(args) => commands::settings::run(&ctx, args),
            Commands::Policy(ref args) => commands::policy::run(&ctx, args),
        }
    }
}
