//! Repository contract shared by every backend.
//!
//! A repository is one source of plugin releases. Concrete backends embed a
//! [`RepositoryBase`] for the state every repository has and implement
//! [`Repository`] for the parts that differ: where releases come from and
//! what has to be torn down on removal.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use plugdex_config::CONFIG_GROUP_MANAGER_REPOS;
use tracing::debug;

use crate::{
    PluginRelease, RepositoryError, RepositoryResult, Settings, SettingsGroup, SettingsResult,
};

/// State shared by every repository.
#[derive(Debug)]
pub struct RepositoryBase {
    id: String,
    name: String,
    active: bool,
    protected: bool,
    releases: Vec<Box<dyn PluginRelease>>,
    config_group: SettingsGroup,
}

impl RepositoryBase {
    /// Creates the base state of a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` or `name` is empty.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        active: bool,
        protected: bool,
        releases: impl IntoIterator<Item = Box<dyn PluginRelease>>,
        config_group: SettingsGroup,
    ) -> RepositoryResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(RepositoryError::EmptyId);
        }
        let name = name.into();
        if name.is_empty() {
            return Err(RepositoryError::EmptyName);
        }

        Ok(Self {
            id,
            name,
            active,
            protected,
            releases: releases.into_iter().collect(),
            config_group,
        })
    }

    /// Returns the repository id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the repository and persists the new name.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty or cannot be persisted.
    pub fn set_name(&mut self, name: impl Into<String>) -> RepositoryResult<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(RepositoryError::EmptyName);
        }
        self.config_group.write("name", name.as_str())?;
        self.name = name;
        Ok(())
    }

    /// Returns `true` if the repository is enabled.
    pub fn active(&self) -> bool {
        self.active
    }

    /// Enables or disables the repository and persists the flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag cannot be persisted.
    pub fn set_active(&mut self, active: bool) -> RepositoryResult<()> {
        self.config_group.write("active", active)?;
        self.active = active;
        Ok(())
    }

    /// Returns `true` if the repository cannot be removed.
    pub fn protected(&self) -> bool {
        self.protected
    }

    /// Returns the releases offered by this repository.
    pub fn releases(&self) -> &[Box<dyn PluginRelease>] {
        &self.releases
    }

    /// Replaces the release list.
    pub fn replace_releases(&mut self, releases: impl IntoIterator<Item = Box<dyn PluginRelease>>) {
        self.releases = releases.into_iter().collect();
        debug!(repo = %self.id, releases = self.releases.len(), "replaced releases");
    }

    /// Returns the number of releases.
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Returns `true` if the repository offers no release.
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Returns `true` if an equal release is offered by this repository.
    pub fn contains(&self, release: &dyn PluginRelease) -> bool {
        self.releases.iter().any(|r| r.same_release(release))
    }

    /// Returns the settings group of this repository.
    pub fn config_group(&self) -> &SettingsGroup {
        &self.config_group
    }
}

/// A source of plugin releases.
///
/// Implementors provide access to their [`RepositoryBase`] and override the
/// operations their backend supports. The defaults fail with
/// [`RepositoryError::NotImplemented`].
pub trait Repository: fmt::Debug {
    /// Returns the shared repository state.
    fn base(&self) -> &RepositoryBase;

    /// Returns the shared repository state mutably.
    fn base_mut(&mut self) -> &mut RepositoryBase;

    /// Returns the backend tag of this repository.
    fn repo_type(&self) -> &'static str;

    /// Returns the location releases are fetched from.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend has no notion of a location.
    fn url(&self) -> RepositoryResult<String> {
        Err(RepositoryError::not_implemented(self.repo_type(), "url"))
    }

    /// Reloads the release list from the backend's source of truth.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn refresh(&mut self) -> RepositoryResult<()> {
        Err(RepositoryError::not_implemented(self.repo_type(), "refresh"))
    }

    /// Runs backend teardown before the repository is dropped from the index.
    ///
    /// # Errors
    ///
    /// Returns an error if teardown fails.
    fn remove(&mut self) -> RepositoryResult<()> {
        Err(RepositoryError::not_implemented(self.repo_type(), "remove"))
    }

    /// Returns the repository id.
    fn id(&self) -> &str {
        self.base().id()
    }

    /// Returns the display name.
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Renames the repository.
    ///
    /// # Errors
    ///
    /// See [`RepositoryBase::set_name`].
    fn set_name(&mut self, name: &str) -> RepositoryResult<()> {
        self.base_mut().set_name(name)
    }

    /// Returns `true` if the repository is enabled.
    fn active(&self) -> bool {
        self.base().active()
    }

    /// Enables or disables the repository.
    ///
    /// # Errors
    ///
    /// See [`RepositoryBase::set_active`].
    fn set_active(&mut self, active: bool) -> RepositoryResult<()> {
        self.base_mut().set_active(active)
    }

    /// Returns `true` if the repository cannot be removed.
    fn protected(&self) -> bool {
        self.base().protected()
    }

    /// Returns the number of releases.
    fn len(&self) -> usize {
        self.base().len()
    }

    /// Returns `true` if the repository offers no release.
    fn is_empty(&self) -> bool {
        self.base().is_empty()
    }

    /// Returns `true` if an equal release is offered by this repository.
    fn contains(&self, release: &dyn PluginRelease) -> bool {
        self.base().contains(release)
    }

    /// Returns the releases offered by this repository.
    fn releases(&self) -> &[Box<dyn PluginRelease>] {
        self.base().releases()
    }

    /// Returns the settings group of this repository.
    fn config_group(&self) -> &SettingsGroup {
        self.base().config_group()
    }
}

impl fmt::Display for dyn Repository + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<repository id=\"{}\" name=\"{}\" type=\"{}\" plugin_releases={} protected={} active={}>",
            self.id(),
            self.name(),
            self.repo_type(),
            self.len(),
            yes_no(self.protected()),
            yes_no(self.active()),
        )
    }
}

const fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Returns one settings group per persisted repository of `repo_type`.
///
/// Repositories are persisted below `repos/<repo_type>/<repo id>/`.
///
/// # Errors
///
/// Returns an error if `repo_type` is empty.
pub fn get_repo_config_groups(
    settings: &Settings,
    repo_type: &str,
) -> SettingsResult<Vec<SettingsGroup>> {
    let backend_group = settings
        .group(CONFIG_GROUP_MANAGER_REPOS)?
        .group(repo_type)?;

    backend_group
        .keys_root()
        .iter()
        .map(|id| backend_group.group(id))
        .collect()
}

/// The ways a repository can come into being.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstructionMethod {
    /// From hardcoded defaults.
    Default,
    /// From a directory on the filesystem.
    Directory,
    /// From interactive user input.
    UserInput,
    /// Rehydrated from its persisted settings group.
    Config,
}

impl ConstructionMethod {
    /// Every method, in declaration order.
    pub const ALL: [Self; 4] = [Self::Default, Self::Directory, Self::UserInput, Self::Config];

    /// Returns the textual tag of this method.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Directory => "directory",
            Self::UserInput => "userinput",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for ConstructionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConstructionMethod {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| RepositoryError::UnknownMethod(s.to_string()))
    }
}

/// Asks the user for construction parameters.
pub trait UserPrompt {
    /// Asks for the value of `field`, offering `default` if any.
    ///
    /// Returns `None` if the user aborted.
    fn ask(&mut self, field: &str, default: Option<&str>) -> Option<String>;
}

/// Arguments of a repository constructor, one variant per method.
pub enum RepoArgs<'a> {
    Default,
    Directory { path: &'a Path, writeable: bool },
    UserInput(&'a mut dyn UserPrompt),
    Config(SettingsGroup),
}

impl RepoArgs<'_> {
    /// Returns the construction method these arguments are for.
    pub const fn method(&self) -> ConstructionMethod {
        match self {
            Self::Default => ConstructionMethod::Default,
            Self::Directory { .. } => ConstructionMethod::Directory,
            Self::UserInput(_) => ConstructionMethod::UserInput,
            Self::Config(_) => ConstructionMethod::Config,
        }
    }
}

impl fmt::Debug for RepoArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Directory { path, writeable } => f
                .debug_struct("Directory")
                .field("path", path)
                .field("writeable", writeable)
                .finish(),
            Self::UserInput(_) => f.write_str("UserInput"),
            Self::Config(group) => f.debug_tuple("Config").field(group).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, Metadata};
    use plugdex_config::ConfigStore;
    use serde_json::json;

    #[derive(Debug)]
    struct Release(Metadata);

    impl PluginRelease for Release {
        fn repo_id(&self) -> &str {
            "bare"
        }

        fn metadata(&self) -> &Metadata {
            &self.0
        }
    }

    fn release(id: &str) -> Box<dyn PluginRelease> {
        Box::new(Release(Metadata::new([("id", id), ("name", id)]).unwrap()))
    }

    #[derive(Debug)]
    struct BareRepository(RepositoryBase);

    impl Repository for BareRepository {
        fn base(&self) -> &RepositoryBase {
            &self.0
        }

        fn base_mut(&mut self) -> &mut RepositoryBase {
            &mut self.0
        }

        fn repo_type(&self) -> &'static str {
            "bare"
        }
    }

    fn group(settings: &Settings) -> SettingsGroup {
        settings.group("repos/bare/one").unwrap()
    }

    fn bare(settings: &Settings) -> BareRepository {
        let base = RepositoryBase::new(
            "one",
            "First",
            true,
            false,
            vec![release("a"), release("b")],
            group(settings),
        )
        .unwrap();
        BareRepository(base)
    }

    #[test]
    fn test_new_rejects_empty_id_and_name() {
        let settings = Settings::detached(ConfigStore::new());

        let err = RepositoryBase::new("", "x", true, false, Vec::new(), group(&settings))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::EmptyId));
        assert_eq!(err.kind(), ErrorKind::Value);

        let err = RepositoryBase::new("x", "", true, false, Vec::new(), group(&settings))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::EmptyName));
    }

    #[test]
    fn test_release_membership() {
        let settings = Settings::detached(ConfigStore::new());
        let repo = bare(&settings);

        assert_eq!(repo.len(), 2);
        assert!(repo.contains(release("a").as_ref()));
        assert!(!repo.contains(release("z").as_ref()));
    }

    #[test]
    fn test_set_name_persists() {
        let settings = Settings::detached(ConfigStore::new());
        let mut repo = bare(&settings);

        repo.set_name("Renamed").unwrap();
        assert_eq!(repo.name(), "Renamed");
        assert_eq!(settings.read("repos/bare/one/name").unwrap(), json!("Renamed"));

        assert!(matches!(repo.set_name(""), Err(RepositoryError::EmptyName)));
        assert_eq!(repo.name(), "Renamed");
    }

    #[test]
    fn test_set_active_persists() {
        let settings = Settings::detached(ConfigStore::new());
        let mut repo = bare(&settings);

        repo.set_active(false).unwrap();
        assert!(!repo.active());
        assert_eq!(settings.read("repos/bare/one/active").unwrap(), json!(false));
    }

    #[test]
    fn test_unimplemented_operations() {
        let settings = Settings::detached(ConfigStore::new());
        let mut repo = bare(&settings);

        assert_eq!(repo.url().unwrap_err().kind(), ErrorKind::NotImplemented);
        assert_eq!(repo.refresh().unwrap_err().kind(), ErrorKind::NotImplemented);
        assert_eq!(repo.remove().unwrap_err().kind(), ErrorKind::NotImplemented);
    }

    #[test]
    fn test_display() {
        let settings = Settings::detached(ConfigStore::new());
        let repo: Box<dyn Repository> = Box::new(bare(&settings));
        assert_eq!(
            repo.to_string(),
            "<repository id=\"one\" name=\"First\" type=\"bare\" plugin_releases=2 protected=no active=yes>"
        );
    }

    #[test]
    fn test_get_repo_config_groups() {
        let settings = Settings::detached(ConfigStore::new());
        settings.write("repos/bare/one/name", "One").unwrap();
        settings.write("repos/bare/two/name", "Two").unwrap();
        settings.write("repos/bare/two/active", true).unwrap();
        settings.write("repos/other/three/name", "Three").unwrap();

        let groups = get_repo_config_groups(&settings, "bare").unwrap();
        let roots: Vec<_> = groups.iter().map(SettingsGroup::root).collect();
        assert_eq!(roots, vec!["repos/bare/one", "repos/bare/two"]);

        assert!(get_repo_config_groups(&settings, "none").unwrap().is_empty());
    }

    #[test]
    fn test_construction_method_tags() {
        for method in ConstructionMethod::ALL {
            assert_eq!(method.as_str().parse::<ConstructionMethod>().unwrap(), method);
        }

        let err = "from_default".parse::<ConstructionMethod>().unwrap_err();
        assert!(matches!(err, RepositoryError::UnknownMethod(ref m) if m == "from_default"));
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_args_method() {
        let settings = Settings::detached(ConfigStore::new());
        let args = RepoArgs::Config(group(&settings));
        assert_eq!(args.method(), ConstructionMethod::Config);
        assert_eq!(
            RepoArgs::Directory { path: Path::new("/tmp"), writeable: false }.method(),
            ConstructionMethod::Directory
        );
    }
}
