//! Repository backend descriptors and their registry.
//!
//! Each backend registers the constructors it supports as a table keyed by
//! [`ConstructionMethod`]. The table is validated once, at registration, so
//! dispatch in [`Backend::construct`] is a plain lookup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    ConstructionMethod, IndexError, IndexResult, Metadata, RepoArgs, Repository, RepositoryError,
    RepositoryResult, Settings, SettingsGroup, SettingsResult, UserPrompt,
    get_repo_config_groups,
};

/// Builds a repository from hardcoded defaults.
pub type DefaultFn = fn(&Settings) -> RepositoryResult<Box<dyn Repository>>;

/// Builds a repository from a directory.
pub type DirectoryFn = fn(&Settings, &Path, bool) -> RepositoryResult<Box<dyn Repository>>;

/// Builds a repository by asking the user.
pub type UserInputFn = fn(&Settings, &mut dyn UserPrompt) -> RepositoryResult<Box<dyn Repository>>;

/// Rehydrates a repository from its settings group.
pub type ConfigFn = fn(&Settings, SettingsGroup) -> RepositoryResult<Box<dyn Repository>>;

/// Folds locally present plugin modules into metadata records.
///
/// Arguments are the settings, whether the plugins are protected, and the
/// module directories.
pub type FindPluginsFn = fn(&Settings, bool, &[PathBuf]) -> RepositoryResult<Vec<Metadata>>;

/// A repository constructor.
#[derive(Debug, Clone, Copy)]
pub enum Constructor {
    Default(DefaultFn),
    Directory(DirectoryFn),
    UserInput(UserInputFn),
    Config(ConfigFn),
}

impl Constructor {
    /// Returns the method this constructor implements.
    pub const fn method(&self) -> ConstructionMethod {
        match self {
            Self::Default(_) => ConstructionMethod::Default,
            Self::Directory(_) => ConstructionMethod::Directory,
            Self::UserInput(_) => ConstructionMethod::UserInput,
            Self::Config(_) => ConstructionMethod::Config,
        }
    }
}

/// Descriptor of a repository backend.
#[derive(Debug, Clone)]
pub struct Backend {
    repo_type: &'static str,
    description: &'static str,
    constructors: BTreeMap<ConstructionMethod, Constructor>,
    find_plugins: Option<FindPluginsFn>,
}

impl Backend {
    /// Creates a descriptor without constructors.
    pub fn new(repo_type: &'static str, description: &'static str) -> Self {
        Self {
            repo_type,
            description,
            constructors: BTreeMap::new(),
            find_plugins: None,
        }
    }

    /// Adds a constructor, replacing any previous one for the same method.
    #[must_use]
    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructors.insert(constructor.method(), constructor);
        self
    }

    /// Sets the plugin discovery hook.
    #[must_use]
    pub fn with_find_plugins(mut self, find_plugins: FindPluginsFn) -> Self {
        self.find_plugins = Some(find_plugins);
        self
    }

    /// Returns the backend tag.
    pub fn repo_type(&self) -> &'static str {
        self.repo_type
    }

    /// Returns the human-readable description.
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Returns the supported construction methods.
    pub fn methods(&self) -> impl Iterator<Item = ConstructionMethod> + '_ {
        self.constructors.keys().copied()
    }

    /// Returns `true` if the backend has a constructor for `method`.
    pub fn supports(&self, method: ConstructionMethod) -> bool {
        self.constructors.contains_key(&method)
    }

    /// Builds a repository with the constructor matching `args`.
    ///
    /// Constructors other than `Config` create a new repository: they must
    /// fail with [`RepositoryError::IdCollision`] before writing anything when
    /// the settings group of the id they derive already holds settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend does not support the method, the
    /// constructor fails, or the constructor returns a repository of another
    /// type.
    pub fn construct(
        &self,
        settings: &Settings,
        args: RepoArgs<'_>,
    ) -> IndexResult<Box<dyn Repository>> {
        let method = args.method();
        let constructor =
            self.constructors
                .get(&method)
                .ok_or_else(|| IndexError::UnsupportedMethod {
                    repo_type: self.repo_type.to_string(),
                    method,
                })?;

        let repo = match (*constructor, args) {
            (Constructor::Default(f), RepoArgs::Default) => f(settings)?,
            (Constructor::Directory(f), RepoArgs::Directory { path, writeable }) => {
                f(settings, path, writeable)?
            }
            (Constructor::UserInput(f), RepoArgs::UserInput(prompt)) => f(settings, prompt)?,
            (Constructor::Config(f), RepoArgs::Config(group)) => f(settings, group)?,
            _ => {
                return Err(IndexError::UnsupportedMethod {
                    repo_type: self.repo_type.to_string(),
                    method,
                });
            }
        };

        if repo.repo_type() != self.repo_type {
            return Err(IndexError::InvalidBackend {
                repo_type: self.repo_type.to_string(),
                reason: "constructor returned a repository of another type",
            });
        }

        debug!(repo_type = self.repo_type, %method, id = repo.id(), "constructed repository");
        Ok(repo)
    }

    /// Runs the plugin discovery hook.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend has no discovery hook or discovery
    /// fails.
    pub fn find_plugins(
        &self,
        settings: &Settings,
        protected: bool,
        plugin_modules: &[PathBuf],
    ) -> RepositoryResult<Vec<Metadata>> {
        match self.find_plugins {
            Some(f) => f(settings, protected, plugin_modules),
            None => Err(RepositoryError::not_implemented(
                self.repo_type,
                "find_plugins",
            )),
        }
    }

    /// Returns the settings groups of the persisted repositories of this
    /// backend.
    ///
    /// # Errors
    ///
    /// See [`get_repo_config_groups`].
    pub fn config_groups(&self, settings: &Settings) -> SettingsResult<Vec<SettingsGroup>> {
        get_repo_config_groups(settings, self.repo_type)
    }
}

/// The known repository backends, keyed by tag.
///
/// Built once at startup and shared with every [`Index`](crate::Index).
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<&'static str, Backend>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is empty, contains the key delimiter, is
    /// already registered, or the backend has no constructor.
    pub fn register(&mut self, backend: Backend) -> IndexResult<()> {
        let invalid = |reason| IndexError::InvalidBackend {
            repo_type: backend.repo_type.to_string(),
            reason,
        };

        if backend.repo_type.is_empty() {
            return Err(invalid("empty repository type"));
        }
        if backend.repo_type.contains(plugdex_config::CONFIG_DELIMITER) {
            return Err(invalid("repository type contains the key delimiter"));
        }
        if self.backends.contains_key(backend.repo_type) {
            return Err(invalid("repository type already registered"));
        }
        if backend.constructors.is_empty() {
            return Err(invalid("no constructors"));
        }

        debug!(
            repo_type = backend.repo_type,
            methods = ?backend.methods().collect::<Vec<_>>(),
            "registered backend"
        );
        self.backends.insert(backend.repo_type, backend);
        Ok(())
    }

    /// Returns the backend registered under `repo_type`.
    ///
    /// # Errors
    ///
    /// Returns an error if no backend has this tag.
    pub fn get(&self, repo_type: &str) -> IndexResult<&Backend> {
        self.backends
            .get(repo_type)
            .ok_or_else(|| IndexError::UnknownRepoType(repo_type.to_string()))
    }

    /// Returns `true` if a backend has this tag.
    pub fn contains(&self, repo_type: &str) -> bool {
        self.backends.contains_key(repo_type)
    }

    /// Returns the registered tags, sorted.
    pub fn repo_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.backends.keys().copied()
    }

    /// Returns the registered backends, sorted by tag.
    pub fn iter(&self) -> impl Iterator<Item = &Backend> {
        self.backends.values()
    }

    /// Runs the plugin discovery hook of a backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is unknown, the backend has no discovery
    /// hook, or discovery fails.
    pub fn find_plugins(
        &self,
        repo_type: &str,
        settings: &Settings,
        protected: bool,
        plugin_modules: &[PathBuf],
    ) -> IndexResult<Vec<Metadata>> {
        Ok(self
            .get(repo_type)?
            .find_plugins(settings, protected, plugin_modules)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, RepositoryBase};
    use plugdex_config::ConfigStore;

    #[derive(Debug)]
    struct Stub(RepositoryBase, &'static str);

    impl Repository for Stub {
        fn base(&self) -> &RepositoryBase {
            &self.0
        }

        fn base_mut(&mut self) -> &mut RepositoryBase {
            &mut self.0
        }

        fn repo_type(&self) -> &'static str {
            self.1
        }
    }

    fn stub(settings: &Settings, repo_type: &'static str) -> RepositoryResult<Box<dyn Repository>> {
        let group = settings.group("repos/stub/default")?;
        let base = RepositoryBase::new("default", "Default", true, false, Vec::new(), group)?;
        Ok(Box::new(Stub(base, repo_type)))
    }

    fn stub_default(settings: &Settings) -> RepositoryResult<Box<dyn Repository>> {
        stub(settings, "stub")
    }

    fn wrong_default(settings: &Settings) -> RepositoryResult<Box<dyn Repository>> {
        stub(settings, "other")
    }

    fn cancelled(
        _settings: &Settings,
        _prompt: &mut dyn UserPrompt,
    ) -> RepositoryResult<Box<dyn Repository>> {
        Err(RepositoryError::Cancelled)
    }

    struct Silent;

    impl UserPrompt for Silent {
        fn ask(&mut self, _field: &str, _default: Option<&str>) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_construct_dispatches_by_args() {
        let settings = Settings::detached(ConfigStore::new());
        let backend = Backend::new("stub", "Stub backend")
            .with_constructor(Constructor::Default(stub_default));

        let repo = backend.construct(&settings, RepoArgs::Default).unwrap();
        assert_eq!(repo.id(), "default");
        assert!(backend.supports(ConstructionMethod::Default));
        assert!(!backend.supports(ConstructionMethod::Config));
    }

    #[test]
    fn test_construct_unsupported_method() {
        let settings = Settings::detached(ConfigStore::new());
        let backend = Backend::new("stub", "Stub backend")
            .with_constructor(Constructor::Default(stub_default));

        let group = settings.group("repos/stub/x").unwrap();
        let err = backend
            .construct(&settings, RepoArgs::Config(group))
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::UnsupportedMethod { method: ConstructionMethod::Config, .. }
        ));
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_construct_propagates_cancellation() {
        let settings = Settings::detached(ConfigStore::new());
        let backend = Backend::new("stub", "Stub backend")
            .with_constructor(Constructor::UserInput(cancelled));

        let err = backend
            .construct(&settings, RepoArgs::UserInput(&mut Silent))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_construct_checks_repo_type() {
        let settings = Settings::detached(ConfigStore::new());
        let backend = Backend::new("stub", "Stub backend")
            .with_constructor(Constructor::Default(wrong_default));

        let err = backend.construct(&settings, RepoArgs::Default).unwrap_err();
        assert!(matches!(err, IndexError::InvalidBackend { .. }));
    }

    #[test]
    fn test_find_plugins_without_hook() {
        let settings = Settings::detached(ConfigStore::new());
        let backend = Backend::new("stub", "Stub backend")
            .with_constructor(Constructor::Default(stub_default));

        let err = backend.find_plugins(&settings, false, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
    }

    #[test]
    fn test_register_validates() {
        let mut registry = BackendRegistry::new();

        let err = registry.register(Backend::new("stub", "no constructors"));
        assert!(matches!(err, Err(IndexError::InvalidBackend { .. })));

        let err = registry
            .register(Backend::new("", "").with_constructor(Constructor::Default(stub_default)));
        assert!(err.is_err());

        let err = registry.register(
            Backend::new("a/b", "").with_constructor(Constructor::Default(stub_default)),
        );
        assert!(err.is_err());

        registry
            .register(Backend::new("stub", "").with_constructor(Constructor::Default(stub_default)))
            .unwrap();
        let err = registry
            .register(Backend::new("stub", "").with_constructor(Constructor::Default(stub_default)));
        assert!(err.is_err());

        assert_eq!(registry.repo_types().collect::<Vec<_>>(), vec!["stub"]);
    }

    #[test]
    fn test_get_unknown_type() {
        let registry = BackendRegistry::new();
        let err = registry.get("remote").unwrap_err();
        assert!(matches!(err, IndexError::UnknownRepoType(ref t) if t == "remote"));
        assert_eq!(err.kind(), ErrorKind::Value);
    }
}
