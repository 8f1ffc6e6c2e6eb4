//! Repository management commands.

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::{Args, Subcommand};
use plugdex_core::{ConstructionMethod, ErrorKind, IndexError, Priority};

use super::{Context, StdinPrompt};

/// Repository management commands.
#[derive(Debug, Args)]
pub struct RepoArgs {
    #[command(subcommand)]
    pub command: RepoCommand,
}

#[derive(Debug, Subcommand)]
pub enum RepoCommand {
    /// List repositories, highest priority first
    List,

    /// Add a repository
    Add(AddArgs),

    /// Remove a repository
    Remove(IdArgs),

    /// Move a repository up the priority order
    Raise(IdArgs),

    /// Move a repository down the priority order
    Lower(IdArgs),

    /// Rename a repository
    Rename(RenameArgs),

    /// Enable a repository
    Enable(IdArgs),

    /// Disable a repository
    Disable(IdArgs),
}

/// Arguments for the `repo add` command.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Repository type (e.g., "local")
    pub repo_type: String,

    /// Construction method: default, directory or userinput
    pub method: String,

    /// Directory of the repository (for the directory method)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Allow installing plugins into the directory
    #[arg(short, long)]
    pub writeable: bool,
}

/// Arguments for commands taking a repository id.
#[derive(Debug, Args)]
pub struct IdArgs {
    /// Repository id
    pub id: String,
}

/// Arguments for the `repo rename` command.
#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Repository id
    pub id: String,

    /// New display name
    pub name: String,
}

/// Runs the repo command.
pub fn run(ctx: &Context, args: RepoArgs) -> Result<()> {
    match args.command {
        RepoCommand::List => list(ctx),
        RepoCommand::Add(args) => add(ctx, &args),
        RepoCommand::Remove(args) => remove(ctx, &args),
        RepoCommand::Raise(args) => move_repo(ctx, &args, Priority::Higher),
        RepoCommand::Lower(args) => move_repo(ctx, &args, Priority::Lower),
        RepoCommand::Rename(args) => rename(ctx, &args),
        RepoCommand::Enable(args) => set_active(ctx, &args, true),
        RepoCommand::Disable(args) => set_active(ctx, &args, false),
    }
}

fn list(ctx: &Context) -> Result<()> {
    let index = ctx.index()?;

    if index.repos_len() == 0 {
        println!("No repositories configured.");
        return Ok(());
    }

    for repo in index.repos() {
        let url = repo.url().unwrap_or_else(|_| "-".to_string());
        println!("{repo} {url}");
    }

    Ok(())
}

fn add(ctx: &Context, args: &AddArgs) -> Result<()> {
    let mut index = ctx.index()?;
    let method: ConstructionMethod = args.method.parse()?;

    let mut prompt = StdinPrompt;
    let repo_args = match method {
        ConstructionMethod::Default => plugdex_core::RepoArgs::Default,
        ConstructionMethod::Directory => {
            let Some(path) = args.path.as_deref() else {
                bail!("the directory method requires --path");
            };
            plugdex_core::RepoArgs::Directory {
                path,
                writeable: args.writeable,
            }
        }
        ConstructionMethod::UserInput => plugdex_core::RepoArgs::UserInput(&mut prompt),
        ConstructionMethod::Config => {
            bail!("the config method only reloads persisted repositories")
        }
    };

    match index.add_repo(&args.repo_type, repo_args) {
        Ok(repo) => {
            println!("Added {repo}");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::Cancelled => {
            println!("Cancelled.");
            Ok(())
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to add {} repository", args.repo_type))
        }
    }
}

fn remove(ctx: &Context, args: &IdArgs) -> Result<()> {
    let mut index = ctx.index()?;

    match index.remove_repo(&args.id) {
        Ok(_) => {
            println!("Removed repository {}", args.id);
            Ok(())
        }
        Err(err @ IndexError::ProtectedRepository(_)) => {
            bail!("{err}; protected repositories cannot be removed")
        }
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", args.id)),
    }
}

fn move_repo(ctx: &Context, args: &IdArgs, direction: Priority) -> Result<()> {
    let mut index = ctx.index()?;
    index.change_repo_priority(&args.id, direction)?;

    for (position, repo) in index.repos().enumerate() {
        println!("{}. {}", position + 1, repo.id());
    }

    Ok(())
}

fn rename(ctx: &Context, args: &RenameArgs) -> Result<()> {
    let mut index = ctx.index()?;
    index.get_repo_mut(&args.id)?.set_name(&args.name)?;
    println!("Renamed {} to {}", args.id, args.name);
    Ok(())
}

fn set_active(ctx: &Context, args: &IdArgs, active: bool) -> Result<()> {
    let mut index = ctx.index()?;
    index.get_repo_mut(&args.id)?.set_active(active)?;

    let state = if active { "Enabled" } else { "Disabled" };
    println!("{state} repository {}", args.id);
    Ok(())
}
