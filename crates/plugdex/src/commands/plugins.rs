//! Plugin listing command.

use anyhow::{Context as _, Result};
use clap::Args;
use plugdex_core::{Index, PluginRelease};

use super::Context;

/// Arguments for the `plugins` command.
#[derive(Debug, Args)]
pub struct PluginsArgs {
    /// Only list the releases of this repository
    #[arg(short, long)]
    pub repo: Option<String>,
}

/// Runs the plugins command.
pub fn run(ctx: &Context, args: &PluginsArgs) -> Result<()> {
    let mut index = ctx.index()?;

    match &args.repo {
        Some(id) => index
            .get_repo_mut(id)?
            .refresh()
            .with_context(|| format!("failed to refresh {id}"))?,
        None => index
            .refresh_repos()
            .context("failed to refresh repositories")?,
    }

    let mut listed = 0;
    for repo in index.repos() {
        if args.repo.as_deref().is_some_and(|id| id != repo.id()) {
            continue;
        }
        for release in repo.releases() {
            if !is_allowed(&index, release.as_ref()) {
                continue;
            }
            println!("{}", format_release(release.as_ref()));
            listed += 1;
        }
    }

    if listed == 0 {
        println!("No plugins found.");
    }

    Ok(())
}

/// Filters out deprecated and experimental releases unless the policy allows them.
fn is_allowed(index: &Index, release: &dyn PluginRelease) -> bool {
    let flag = |name: &str| {
        release
            .metadata()
            .get_bool(name)
            .ok()
            .flatten()
            .unwrap_or(false)
    };

    (index.allow_deprecated() || !flag("deprecated"))
        && (index.allow_experimental() || !flag("experimental"))
}

fn format_release(release: &dyn PluginRelease) -> String {
    let version = release.version().unwrap_or("-");
    let broken = match release.metadata().get_str("error") {
        Ok(Some(_)) => " (broken)",
        _ => "",
    };
    format!(
        "{}  {}  {}{}",
        release.plugin_id(),
        version,
        release.repo_id(),
        broken
    )
}
