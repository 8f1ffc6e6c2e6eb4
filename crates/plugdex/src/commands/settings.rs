//! Raw settings commands.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use super::Context;

/// Raw settings commands.
#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the value of a key as JSON
    Get(GetArgs),

    /// Set a key (string-typed keys take the value as is, others parse it as JSON)
    Set(SetArgs),

    /// List the known keys
    Keys(KeysArgs),
}

/// Arguments for the `settings get` command.
#[derive(Debug, Args)]
pub struct GetArgs {
    /// Settings key (e.g., "manager/priority")
    pub key: String,
}

/// Arguments for the `settings set` command.
#[derive(Debug, Args)]
pub struct SetArgs {
    /// Settings key
    pub key: String,

    /// New value
    pub value: String,
}

/// Arguments for the `settings keys` command.
#[derive(Debug, Args)]
pub struct KeysArgs {
    /// Only list the first segment of each key
    #[arg(long)]
    pub root: bool,
}

/// Runs the settings command.
pub fn run(ctx: &Context, args: SettingsArgs) -> Result<()> {
    let settings = ctx.settings()?;

    match args.command {
        SettingsCommand::Get(args) => {
            let value = settings.read(&args.key)?;
            println!("{}", serde_json::to_string(&value)?);
        }
        SettingsCommand::Set(args) => {
            let value = match settings.get(&args.key, Value::Null)? {
                Value::String(_) => Value::String(args.value),
                _ => parse_value(args.value),
            };
            settings
                .write(&args.key, value)
                .with_context(|| format!("failed to set {}", args.key))?;
        }
        SettingsCommand::Keys(args) => {
            if args.root {
                settings.keys_root().iter().for_each(|key| println!("{key}"));
            } else {
                settings.keys().iter().for_each(|key| println!("{key}"));
            }
        }
    }

    Ok(())
}

/// Parses a command-line value as JSON, falling back to a plain string.
fn parse_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("true".to_string()), json!(true));
        assert_eq!(parse_value("[\"a\"]".to_string()), json!(["a"]));
        assert_eq!(parse_value("/opt/plugins".to_string()), json!("/opt/plugins"));
        assert_eq!(parse_value("\"true\"".to_string()), json!("true"));
    }
}
