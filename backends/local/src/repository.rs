//! Local repositories and their constructors.

use std::fs;
use std::path::{Path, PathBuf};

use plugdex_config::{CONFIG_GROUP_MANAGER_REPOS, CONFIG_KEY_PLUGIN_PATH};
use plugdex_core::{
    PluginRelease, Repository, RepositoryBase, RepositoryError, RepositoryResult, Settings,
    SettingsGroup, UserPrompt,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::{LocalRelease, REPO_TYPE, find_plugins, plugin_modules};

/// Id of the repository holding the user's installed plugins.
pub const DEFAULT_REPO_ID: &str = "installed";

/// Name of the repository holding the user's installed plugins.
pub const DEFAULT_REPO_NAME: &str = "Installed plugins";

/// A directory of plugin modules.
#[derive(Debug)]
pub struct LocalRepository {
    base: RepositoryBase,
    path: PathBuf,
    writeable: bool,
}

impl LocalRepository {
    /// Returns the plugin directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if plugins may be installed into this directory.
    pub fn writeable(&self) -> bool {
        self.writeable
    }
}

impl Repository for LocalRepository {
    fn base(&self) -> &RepositoryBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RepositoryBase {
        &mut self.base
    }

    fn repo_type(&self) -> &'static str {
        REPO_TYPE
    }

    fn url(&self) -> RepositoryResult<String> {
        Ok(format!("file://{}", self.path.display()))
    }

    fn refresh(&mut self) -> RepositoryResult<()> {
        if !self.path.is_dir() {
            return Err(RepositoryError::NotADirectory(self.path.clone()));
        }

        let modules = plugin_modules(&self.path)?;
        let found = find_plugins(
            self.config_group().settings(),
            self.protected(),
            &modules,
        )?;

        let repo_id = self.id().to_string();
        let releases = modules
            .into_iter()
            .zip(found)
            .map(|(module, metadata)| {
                Box::new(LocalRelease::new(repo_id.clone(), module, metadata))
                    as Box<dyn PluginRelease>
            })
            .collect::<Vec<_>>();

        self.base.replace_releases(releases);
        Ok(())
    }

    fn remove(&mut self) -> RepositoryResult<()> {
        let removed = self.config_group().clear()?;
        info!(id = self.id(), removed, "removed local repository settings");
        Ok(())
    }
}

/// Creates the repository of the user's installed plugins.
///
/// The directory is taken from `paths/plugins`, falling back to
/// `<data dir>/plugdex/plugins`, and is created if missing.
///
/// # Errors
///
/// Returns an error if the default repository already has settings, no
/// directory can be determined or created, or the configuration cannot be
/// persisted.
pub fn from_default(settings: &Settings) -> RepositoryResult<Box<dyn Repository>> {
    let path = match settings.get(CONFIG_KEY_PLUGIN_PATH, Value::Null)? {
        Value::String(path) => PathBuf::from(path),
        Value::Null => dirs::data_dir()
            .map(|dir| dir.join("plugdex").join("plugins"))
            .ok_or_else(|| RepositoryError::InvalidSetting {
                key: CONFIG_KEY_PLUGIN_PATH.to_string(),
                reason: "not set and no data directory available".to_string(),
            })?,
        _ => {
            return Err(RepositoryError::InvalidSetting {
                key: CONFIG_KEY_PLUGIN_PATH.to_string(),
                reason: "expected a string".to_string(),
            });
        }
    };
    let group = claim_repo_group(settings, DEFAULT_REPO_ID)?;
    fs::create_dir_all(&path)?;

    create(group, DEFAULT_REPO_NAME, path, true, true)
}

/// Creates a repository for an existing directory.
///
/// The id is derived from the directory name.
///
/// # Errors
///
/// Returns an error if `path` is not a directory, a local repository with
/// the derived id already exists, or the configuration cannot be persisted.
pub fn from_directory(
    settings: &Settings,
    path: &Path,
    writeable: bool,
) -> RepositoryResult<Box<dyn Repository>> {
    let (group, path, name) = new_repo_group(settings, path)?;
    create(group, &name, path, false, writeable)
}

/// Creates a repository from the user's answers.
///
/// Asks for `path`, then for `name` (defaulting to the directory name).
///
/// # Errors
///
/// Returns [`RepositoryError::Cancelled`] if the user aborts, or any error of
/// [`from_directory`].
pub fn from_userinput(
    settings: &Settings,
    prompt: &mut dyn UserPrompt,
) -> RepositoryResult<Box<dyn Repository>> {
    let path = prompt.ask("path", None).ok_or(RepositoryError::Cancelled)?;
    let (group, path, default_name) = new_repo_group(settings, Path::new(path.trim()))?;

    let name = prompt
        .ask("name", Some(default_name.as_str()))
        .ok_or(RepositoryError::Cancelled)?;
    let name = match name.trim() {
        "" => default_name,
        name => name.to_string(),
    };

    create(group, &name, path, false, false)
}

/// Rehydrates a repository from its settings group.
///
/// # Errors
///
/// Returns an error if `name` or `path` is missing or a setting has the
/// wrong type.
pub fn from_config(
    _settings: &Settings,
    group: SettingsGroup,
) -> RepositoryResult<Box<dyn Repository>> {
    let name = read_string(&group, "name")?;
    let path = PathBuf::from(read_string(&group, "path")?);
    let active = read_flag(&group, "active", true)?;
    let protected = read_flag(&group, "protected", false)?;
    let writeable = read_flag(&group, "writeable", false)?;

    let base = RepositoryBase::new(
        group.name().to_string(),
        name,
        active,
        protected,
        Vec::new(),
        group,
    )?;
    debug!(id = base.id(), path = %path.display(), "rehydrated local repository");

    Ok(Box::new(LocalRepository {
        base,
        path,
        writeable,
    }))
}

fn repo_group(settings: &Settings, id: &str) -> RepositoryResult<SettingsGroup> {
    Ok(settings
        .group(CONFIG_GROUP_MANAGER_REPOS)?
        .group(REPO_TYPE)?
        .group(id)?)
}

/// Returns the settings group of a new repository.
///
/// Constructors never write into a group that already holds settings, so a
/// rejected add leaves the existing repository untouched.
fn claim_repo_group(settings: &Settings, id: &str) -> RepositoryResult<SettingsGroup> {
    let group = repo_group(settings, id)?;
    if !group.keys().is_empty() {
        return Err(RepositoryError::IdCollision(id.to_string()));
    }
    Ok(group)
}

/// Resolves `path` and claims the settings group of its id.
fn new_repo_group(
    settings: &Settings,
    path: &Path,
) -> RepositoryResult<(SettingsGroup, PathBuf, String)> {
    if !path.is_dir() {
        return Err(RepositoryError::NotADirectory(path.to_path_buf()));
    }
    let path = fs::canonicalize(path)?;

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let id = slugify(&name);

    let group = claim_repo_group(settings, &id)?;
    let name = if name.is_empty() { id } else { name };
    Ok((group, path, name))
}

fn create(
    group: SettingsGroup,
    name: &str,
    path: PathBuf,
    protected: bool,
    writeable: bool,
) -> RepositoryResult<Box<dyn Repository>> {
    let base = RepositoryBase::new(
        group.name().to_string(),
        name,
        true,
        protected,
        Vec::new(),
        group,
    )?;

    let group = base.config_group();
    group.write("name", name)?;
    group.write("path", path.to_string_lossy().into_owned())?;
    group.write("active", true)?;
    group.write("protected", protected)?;
    group.write("writeable", writeable)?;

    info!(id = base.id(), path = %path.display(), "created local repository");
    Ok(Box::new(LocalRepository {
        base,
        path,
        writeable,
    }))
}

fn read_string(group: &SettingsGroup, name: &str) -> RepositoryResult<String> {
    match group.read(name)? {
        Value::String(value) => Ok(value),
        _ => Err(invalid_setting(group, name, "expected a string")),
    }
}

fn read_flag(group: &SettingsGroup, name: &str, default: bool) -> RepositoryResult<bool> {
    match group.get(name, Value::Bool(default))? {
        Value::Bool(flag) => Ok(flag),
        Value::String(value) => plugdex_config::str_to_bool(&value)
            .map_err(|_| invalid_setting(group, name, "expected a boolean")),
        _ => Err(invalid_setting(group, name, "expected a boolean")),
    }
}

fn invalid_setting(group: &SettingsGroup, name: &str, reason: &str) -> RepositoryError {
    RepositoryError::InvalidSetting {
        key: format!("{}/{name}", group.root()),
        reason: reason.to_string(),
    }
}

/// Derives a repository id from a directory name.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str(REPO_TYPE);
    }
    slug
}
