//! Refresh command.

use anyhow::{Context as _, Result};

use super::Context;

/// Runs the refresh command.
pub fn run(ctx: &Context) -> Result<()> {
    let mut index = ctx.index()?;

    if index.repos_len() == 0 {
        println!("No repositories configured.");
        return Ok(());
    }

    index
        .refresh_repos()
        .context("failed to refresh repositories")?;

    for repo in index.repos() {
        println!("{}: {} release(s)", repo.id(), repo.len());
    }

    Ok(())
}
