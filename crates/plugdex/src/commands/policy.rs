//! Plugin policy command.

use anyhow::Result;
use clap::Args;
use plugdex_config::{bool_to_str, str_to_bool};

use super::Context;

/// Arguments for the `policy` command.
#[derive(Debug, Args)]
pub struct PolicyArgs {
    /// Allow deprecated plugins (true/false, yes/no, on/off, 1/0)
    #[arg(long, value_name = "BOOL")]
    pub deprecated: Option<String>,

    /// Allow experimental plugins (true/false, yes/no, on/off, 1/0)
    #[arg(long, value_name = "BOOL")]
    pub experimental: Option<String>,
}

/// Runs the policy command.
pub fn run(ctx: &Context, args: &PolicyArgs) -> Result<()> {
    let mut index = ctx.index()?;

    if let Some(value) = &args.deprecated {
        index.set_allow_deprecated(str_to_bool(value)?)?;
    }
    if let Some(value) = &args.experimental {
        index.set_allow_experimental(str_to_bool(value)?)?;
    }

    println!("allow_deprecated = {}", bool_to_str(index.allow_deprecated()));
    println!(
        "allow_experimental = {}",
        bool_to_str(index.allow_experimental())
    );

    Ok(())
}
