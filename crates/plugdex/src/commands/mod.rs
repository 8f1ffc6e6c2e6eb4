//! Command implementations.

pub mod plugins;
pub mod policy;
pub mod refresh;
pub mod repo;
pub mod settings;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use plugdex_config::{ConfigStore, default_store_path};
use plugdex_core::{BackendRegistry, Index, Settings, UserPrompt};
use tracing::debug;

/// Where the settings of this invocation live.
#[derive(Debug)]
pub struct Context {
    settings_path: PathBuf,
}

impl Context {
    /// Resolves the settings file, falling back to the default location.
    pub fn new(settings_path: Option<PathBuf>) -> Result<Self> {
        let settings_path = match settings_path {
            Some(path) => path,
            None => default_store_path().context("failed to locate the settings file")?,
        };
        Ok(Self { settings_path })
    }

    /// Opens the settings store.
    pub fn settings(&self) -> Result<Settings> {
        let store = ConfigStore::open(&self.settings_path).with_context(|| {
            format!("failed to load settings from {}", self.settings_path.display())
        })?;
        Ok(Settings::detached(store))
    }

    /// Opens the index and loads the persisted repositories.
    pub fn index(&self) -> Result<Index> {
        let mut registry = BackendRegistry::new();
        registry
            .register(plugdex_backend_local::backend())
            .context("failed to register the local backend")?;

        let mut index = Index::new(self.settings()?, Arc::new(registry))?;
        let loaded = index
            .load_repos()
            .context("failed to load persisted repositories")?;
        debug!(loaded, path = %self.settings_path.display(), "opened index");
        Ok(index)
    }
}

/// Asks questions on stdin; end of input aborts.
pub struct StdinPrompt;

impl UserPrompt for StdinPrompt {
    fn ask(&mut self, field: &str, default: Option<&str>) -> Option<String> {
        match default {
            Some(default) => print!("{field} [{default}]: "),
            None => print!("{field}: "),
        }
        io::stdout().flush().ok()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let answer = line.trim();
                match (answer.is_empty(), default) {
                    (true, Some(default)) => Some(default.to_string()),
                    _ => Some(answer.to_string()),
                }
            }
        }
    }
}
