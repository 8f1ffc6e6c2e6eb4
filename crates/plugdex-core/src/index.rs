//! The repository and plugin index.
//!
//! The index owns the repositories in priority order (highest first) and the
//! plugins by id. The priority order is persisted under `manager/priority` so
//! that [`Index::load_repos`] restores it on the next start.

use std::collections::BTreeMap;
use std::sync::Arc;

use plugdex_config::{
    CONFIG_KEY_ALLOW_DEPRECATED, CONFIG_KEY_ALLOW_EXPERIMENTAL, CONFIG_KEY_PRIORITY, bool_to_str,
    str_to_bool, value_type_name,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    BackendRegistry, ConstructionMethod, IndexError, IndexResult, Plugin, RepoArgs, Repository,
    Settings, SettingsError,
};

/// Direction of a priority change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Towards the front of the list.
    Higher,
    /// Towards the back of the list.
    Lower,
}

impl Priority {
    /// Returns the signed offset of this direction.
    pub const fn offset(self) -> i64 {
        match self {
            Self::Higher => -1,
            Self::Lower => 1,
        }
    }
}

impl TryFrom<i64> for Priority {
    type Error = IndexError;

    fn try_from(direction: i64) -> Result<Self, Self::Error> {
        match direction {
            -1 => Ok(Self::Higher),
            1 => Ok(Self::Lower),
            other => Err(IndexError::InvalidDirection(other)),
        }
    }
}

/// Index of repositories and plugins.
#[derive(Debug)]
pub struct Index {
    settings: Settings,
    backends: Arc<BackendRegistry>,
    repos: Vec<Box<dyn Repository>>,
    plugins: BTreeMap<String, Box<dyn Plugin>>,
    allow_deprecated: bool,
    allow_experimental: bool,
}

impl Index {
    /// Creates an empty index.
    ///
    /// The policy flags are read from the settings once, here.
    ///
    /// # Errors
    ///
    /// Returns an error if a policy flag holds something other than a
    /// boolean or a boolean string.
    pub fn new(settings: Settings, backends: Arc<BackendRegistry>) -> IndexResult<Self> {
        let allow_deprecated = read_flag(&settings, CONFIG_KEY_ALLOW_DEPRECATED)?;
        let allow_experimental = read_flag(&settings, CONFIG_KEY_ALLOW_EXPERIMENTAL)?;

        Ok(Self {
            settings,
            backends,
            repos: Vec::new(),
            plugins: BTreeMap::new(),
            allow_deprecated,
            allow_experimental,
        })
    }

    /// Returns the settings store.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the backend registry.
    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    /// Returns `true` if deprecated plugins are allowed.
    pub fn allow_deprecated(&self) -> bool {
        self.allow_deprecated
    }

    /// Allows or disallows deprecated plugins and persists the choice.
    ///
    /// # Errors
    ///
    /// Returns an error if the setting cannot be written.
    pub fn set_allow_deprecated(&mut self, allow: bool) -> IndexResult<()> {
        write_flag(&self.settings, CONFIG_KEY_ALLOW_DEPRECATED, allow)?;
        self.allow_deprecated = allow;
        Ok(())
    }

    /// Returns `true` if experimental plugins are allowed.
    pub fn allow_experimental(&self) -> bool {
        self.allow_experimental
    }

    /// Allows or disallows experimental plugins and persists the choice.
    ///
    /// # Errors
    ///
    /// Returns an error if the setting cannot be written.
    pub fn set_allow_experimental(&mut self, allow: bool) -> IndexResult<()> {
        write_flag(&self.settings, CONFIG_KEY_ALLOW_EXPERIMENTAL, allow)?;
        self.allow_experimental = allow;
        Ok(())
    }

    /// Returns the repositories, highest priority first.
    pub fn repos(&self) -> impl Iterator<Item = &dyn Repository> {
        self.repos.iter().map(|repo| &**repo)
    }

    /// Returns the number of repositories.
    pub fn repos_len(&self) -> usize {
        self.repos.len()
    }

    /// Creates a repository and appends it with the lowest priority.
    ///
    /// # Errors
    ///
    /// Returns an error if `repo_type` is unknown, the backend does not
    /// support the method carried by `args`, construction fails (including
    /// user cancellation), or the id is already in the index.
    pub fn add_repo(&mut self, repo_type: &str, args: RepoArgs<'_>) -> IndexResult<&dyn Repository> {
        let backends = Arc::clone(&self.backends);
        let backend = backends.get(repo_type)?;
        let repo = backend.construct(&self.settings, args)?;

        if self.position(repo.id()).is_some() {
            return Err(IndexError::DuplicateRepository(repo.id().to_string()));
        }

        let mut order = self.repo_ids();
        order.push(repo.id().to_string());
        self.write_priority(order)?;

        info!(id = repo.id(), repo_type, "added repository");
        self.repos.push(repo);
        Ok(&*self.repos[self.repos.len() - 1])
    }

    /// Rehydrates every persisted repository not yet in the index.
    ///
    /// Repositories are ordered by the persisted priority list. Ids missing
    /// from the list follow in discovery order. Returns how many
    /// repositories were loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if a persisted repository cannot be rehydrated.
    pub fn load_repos(&mut self) -> IndexResult<usize> {
        let backends = Arc::clone(&self.backends);
        let mut loaded = 0;

        for backend in backends.iter() {
            if !backend.supports(ConstructionMethod::Config) {
                continue;
            }
            for group in backend.config_groups(&self.settings)? {
                if self.position(group.name()).is_some() {
                    continue;
                }
                let repo = backend.construct(&self.settings, RepoArgs::Config(group))?;
                if self.position(repo.id()).is_some() {
                    return Err(IndexError::DuplicateRepository(repo.id().to_string()));
                }
                self.repos.push(repo);
                loaded += 1;
            }
        }

        let order = self.priority();
        self.repos.sort_by_key(|repo| {
            order
                .iter()
                .position(|id| id == repo.id())
                .unwrap_or(usize::MAX)
        });

        debug!(loaded, total = self.repos.len(), "loaded repositories");
        Ok(loaded)
    }

    /// Moves a repository one step up or down the priority order.
    ///
    /// Moving past either end, or reordering fewer than two repositories,
    /// leaves the order untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository has this id or the new order cannot
    /// be persisted.
    pub fn change_repo_priority(&mut self, repo_id: &str, direction: Priority) -> IndexResult<()> {
        let index = self
            .position(repo_id)
            .ok_or_else(|| IndexError::NoSuchRepository(repo_id.to_string()))?;

        let target = match direction {
            Priority::Higher => index.checked_sub(1),
            Priority::Lower => Some(index + 1).filter(|target| *target < self.repos.len()),
        };
        let Some(target) = target else {
            debug!(id = repo_id, ?direction, "repository already at the boundary");
            return Ok(());
        };

        self.repos.swap(index, target);
        if let Err(err) = self.write_priority(self.repo_ids()) {
            self.repos.swap(index, target);
            return Err(err);
        }

        debug!(id = repo_id, ?direction, position = target, "changed repository priority");
        Ok(())
    }

    /// Returns the repository with this id.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository has this id.
    pub fn get_repo(&self, repo_id: &str) -> IndexResult<&dyn Repository> {
        self.repos
            .iter()
            .find(|repo| repo.id() == repo_id)
            .map(|repo| &**repo)
            .ok_or_else(|| IndexError::NoSuchRepository(repo_id.to_string()))
    }

    /// Returns the repository with this id, mutably.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository has this id.
    pub fn get_repo_mut(&mut self, repo_id: &str) -> IndexResult<&mut dyn Repository> {
        match self.repos.iter_mut().find(|repo| repo.id() == repo_id) {
            Some(repo) => Ok(repo.as_mut()),
            None => Err(IndexError::NoSuchRepository(repo_id.to_string())),
        }
    }

    /// Tears down a repository and drops it from the index.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository has this id, the repository is
    /// protected, the new priority order cannot be persisted, or its teardown
    /// fails. The repository stays in the index on error.
    pub fn remove_repo(&mut self, repo_id: &str) -> IndexResult<Box<dyn Repository>> {
        let index = self
            .position(repo_id)
            .ok_or_else(|| IndexError::NoSuchRepository(repo_id.to_string()))?;

        if self.repos[index].protected() {
            return Err(IndexError::ProtectedRepository(repo_id.to_string()));
        }

        let order = self
            .repo_ids()
            .into_iter()
            .filter(|id| id != repo_id)
            .collect();
        self.write_priority(order)?;

        if let Err(err) = self.repos[index].remove() {
            if let Err(restore) = self.write_priority(self.repo_ids()) {
                warn!(id = repo_id, error = %restore, "failed to restore repository priority");
            }
            return Err(err.into());
        }
        let repo = self.repos.remove(index);

        info!(id = repo_id, "removed repository");
        Ok(repo)
    }

    /// Refreshes every repository in priority order.
    ///
    /// Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the first repository that fails to refresh.
    pub fn refresh_repos(&mut self) -> IndexResult<()> {
        for repo in &mut self.repos {
            if let Err(err) = repo.refresh() {
                warn!(id = repo.id(), error = %err, "failed to refresh repository");
                return Err(err.into());
            }
            debug!(id = repo.id(), releases = repo.len(), "refreshed repository");
        }
        Ok(())
    }

    /// Adds a plugin.
    ///
    /// # Errors
    ///
    /// Returns an error if a plugin with the same id is already present.
    pub fn add_plugin(&mut self, plugin: Box<dyn Plugin>) -> IndexResult<()> {
        if self.plugins.contains_key(plugin.id()) {
            return Err(IndexError::DuplicatePlugin(plugin.id().to_string()));
        }
        self.plugins.insert(plugin.id().to_string(), plugin);
        Ok(())
    }

    /// Returns the plugin with this id.
    ///
    /// # Errors
    ///
    /// Returns an error if no plugin has this id.
    pub fn get_plugin(&self, plugin_id: &str) -> IndexResult<&dyn Plugin> {
        self.plugins
            .get(plugin_id)
            .map(|plugin| &**plugin)
            .ok_or_else(|| IndexError::NoSuchPlugin(plugin_id.to_string()))
    }

    /// Drops a plugin from the index.
    ///
    /// # Errors
    ///
    /// Returns an error if no plugin has this id.
    pub fn remove_plugin(&mut self, plugin_id: &str) -> IndexResult<Box<dyn Plugin>> {
        self.plugins
            .remove(plugin_id)
            .ok_or_else(|| IndexError::NoSuchPlugin(plugin_id.to_string()))
    }

    /// Returns every plugin, sorted by id.
    pub fn plugins(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins.values().map(|plugin| &**plugin)
    }

    /// Returns the number of plugins.
    pub fn plugins_len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns the installed plugins.
    pub fn get_all_installed_plugins(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins().filter(|plugin| plugin.installed())
    }

    /// Returns the plugins available for installation.
    pub fn get_all_available_plugins(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins().filter(|plugin| plugin.available())
    }

    fn position(&self, repo_id: &str) -> Option<usize> {
        self.repos.iter().position(|repo| repo.id() == repo_id)
    }

    fn repo_ids(&self) -> Vec<String> {
        self.repos.iter().map(|repo| repo.id().to_string()).collect()
    }

    /// Returns the persisted priority list, skipping entries that are not
    /// strings.
    fn priority(&self) -> Vec<String> {
        match self.settings.get(CONFIG_KEY_PRIORITY, Value::Array(Vec::new())) {
            Ok(Value::Array(ids)) => ids
                .into_iter()
                .filter_map(|id| match id {
                    Value::String(id) => Some(id),
                    _ => None,
                })
                .collect(),
            Ok(other) => {
                warn!(
                    key = CONFIG_KEY_PRIORITY,
                    actual = value_type_name(&other),
                    "ignoring priority setting"
                );
                Vec::new()
            }
            Err(err) => {
                warn!(key = CONFIG_KEY_PRIORITY, error = %err, "ignoring priority setting");
                Vec::new()
            }
        }
    }

    fn write_priority(&self, order: Vec<String>) -> IndexResult<()> {
        let order = order.into_iter().map(Value::String).collect::<Vec<_>>();
        self.settings.write(CONFIG_KEY_PRIORITY, order)?;
        Ok(())
    }
}

/// Writes a policy flag in the canonical string encoding.
///
/// A flag stored as a JSON boolean is accepted on read, so it is dropped
/// first to keep the key string-typed.
fn write_flag(settings: &Settings, key: &'static str, allow: bool) -> IndexResult<()> {
    if !matches!(settings.read_durable(key)?, Value::String(_)) {
        settings.remove(key)?;
    }
    settings.write(key, bool_to_str(allow))?;
    Ok(())
}

fn read_flag(settings: &Settings, key: &'static str) -> IndexResult<bool> {
    match settings.get(key, Value::from(bool_to_str(false)))? {
        Value::Bool(flag) => Ok(flag),
        Value::String(s) => Ok(str_to_bool(&s).map_err(SettingsError::from)?),
        other => Err(IndexError::InvalidPolicy {
            key,
            actual: value_type_name(&other),
        }),
    }
}
