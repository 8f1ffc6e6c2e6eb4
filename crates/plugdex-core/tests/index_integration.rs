//! Integration tests for the index over a file-backed settings store.

use std::sync::Arc;

use plugdex_config::{CONFIG_KEY_ALLOW_DEPRECATED, ConfigStore};
use plugdex_core::{
    Backend, BackendRegistry, Constructor, Index, Metadata, PluginRelease, Priority, RepoArgs,
    Repository, RepositoryBase, RepositoryResult, Settings, SettingsGroup,
};
use serde_json::json;
use tempfile::TempDir;

const CATALOG: [&str; 3] = ["contour", "geocoder", "tiles"];

#[derive(Debug)]
struct CatalogRelease {
    repo_id: String,
    metadata: Metadata,
}

impl PluginRelease for CatalogRelease {
    fn repo_id(&self) -> &str {
        &self.repo_id
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// A repository whose releases come from a fixed catalog.
#[derive(Debug)]
struct CatalogRepository(RepositoryBase);

impl Repository for CatalogRepository {
    fn base(&self) -> &RepositoryBase {
        &self.0
    }

    fn base_mut(&mut self) -> &mut RepositoryBase {
        &mut self.0
    }

    fn repo_type(&self) -> &'static str {
        "catalog"
    }

    fn url(&self) -> RepositoryResult<String> {
        Ok(format!("catalog://{}", self.id()))
    }

    fn refresh(&mut self) -> RepositoryResult<()> {
        let mut releases: Vec<Box<dyn PluginRelease>> = Vec::new();
        for id in CATALOG {
            let metadata = Metadata::new([
                ("id", id),
                ("name", id),
                ("version_available", "1.0.0"),
                ("available", "true"),
            ])?;
            releases.push(Box::new(CatalogRelease {
                repo_id: self.id().to_string(),
                metadata,
            }));
        }
        self.base_mut().replace_releases(releases);
        Ok(())
    }

    fn remove(&mut self) -> RepositoryResult<()> {
        self.config_group().clear()?;
        Ok(())
    }
}

fn from_default(settings: &Settings) -> RepositoryResult<Box<dyn Repository>> {
    let group = settings.group("repos/catalog/official")?;
    group.write("name", "Official catalog")?;
    from_config(settings, group)
}

fn from_config(_settings: &Settings, group: SettingsGroup) -> RepositoryResult<Box<dyn Repository>> {
    let name = group.read("name")?;
    let base = RepositoryBase::new(
        group.name().to_string(),
        name.as_str().unwrap_or_default(),
        true,
        false,
        Vec::new(),
        group,
    )?;
    Ok(Box::new(CatalogRepository(base)))
}

fn backends() -> Arc<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry
        .register(
            Backend::new("catalog", "Fixed plugin catalog")
                .with_constructor(Constructor::Default(from_default))
                .with_constructor(Constructor::Config(from_config)),
        )
        .expect("register catalog backend");
    Arc::new(registry)
}

fn open(dir: &TempDir) -> Settings {
    let store = ConfigStore::open(dir.path().join("settings.toml")).expect("open store");
    Settings::detached(store)
}

#[test]
fn test_default_repository_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut index = Index::new(open(&dir), backends()).unwrap();
    assert!(!index.allow_deprecated());
    assert!(!index.allow_experimental());

    let repo = index.add_repo("catalog", RepoArgs::Default).unwrap();
    assert!(repo.is_empty());
    assert_eq!(repo.url().unwrap(), "catalog://official");

    index.refresh_repos().unwrap();

    assert_eq!(index.repos_len(), 1);
    let repo = index.get_repo("official").unwrap();
    assert_eq!(repo.len(), CATALOG.len());
    assert_eq!(repo.releases()[0].version(), Some("1.0.0"));
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let mut index = Index::new(open(&dir), backends()).unwrap();
        index.add_repo("catalog", RepoArgs::Default).unwrap();
        index.set_allow_deprecated(true).unwrap();
    }

    let settings = open(&dir);
    assert_eq!(settings.read(CONFIG_KEY_ALLOW_DEPRECATED).unwrap(), json!("true"));

    let mut index = Index::new(settings, backends()).unwrap();
    assert!(index.allow_deprecated());
    assert_eq!(index.load_repos().unwrap(), 1);
    assert_eq!(index.get_repo("official").unwrap().name(), "Official catalog");
}

#[test]
fn test_remove_repository_clears_its_settings() {
    let dir = TempDir::new().unwrap();
    let mut index = Index::new(open(&dir), backends()).unwrap();
    index.add_repo("catalog", RepoArgs::Default).unwrap();

    index.remove_repo("official").unwrap();
    assert_eq!(index.repos_len(), 0);

    let mut reopened = Index::new(open(&dir), backends()).unwrap();
    assert_eq!(reopened.load_repos().unwrap(), 0);
}

#[test]
fn test_priority_change_on_single_repository() {
    let dir = TempDir::new().unwrap();
    let mut index = Index::new(open(&dir), backends()).unwrap();
    index.add_repo("catalog", RepoArgs::Default).unwrap();

    index
        .change_repo_priority("official", Priority::try_from(-1).unwrap())
        .unwrap();
    assert_eq!(index.repos().next().map(|repo| repo.id()), Some("official"));
}
