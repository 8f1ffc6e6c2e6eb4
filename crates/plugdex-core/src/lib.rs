//! Core library for Plugdex.
//!
//! This crate provides the data and configuration core of the plugin manager:
//! - [`Settings`] / [`SettingsGroup`]: two-tier settings overlay with group scoping
//! - [`Metadata`]: schema-validated description of one plugin
//! - [`PluginRelease`] / [`Plugin`]: capabilities of releases and plugins
//! - [`Repository`]: contract implemented by every repository backend
//! - [`BackendRegistry`]: dispatch tables of the known repository backends
//! - [`Index`]: the registry of repositories (in priority order) and plugins

mod backend;
mod error;
mod host;
mod index;
mod metadata;
mod release;
mod repository;
mod settings;

pub use backend::{
    Backend, BackendRegistry, ConfigFn, Constructor, DefaultFn, DirectoryFn, FindPluginsFn,
    UserInputFn,
};
pub use error::{
    IndexError, IndexResult, MetadataError, MetadataResult, RepositoryError, RepositoryResult,
    SettingsError, SettingsResult,
};
pub use host::{HostSettings, HostValue, MemoryHostSettings};
pub use index::{Index, Priority};
pub use metadata::{DefaultValue, FieldSpec, FieldType, MetaValue, Metadata};
pub use plugdex_config::ErrorKind;
pub use release::{Plugin, PluginRelease};
pub use repository::{
    ConstructionMethod, RepoArgs, Repository, RepositoryBase, UserPrompt, get_repo_config_groups,
};
pub use settings::{Settings, SettingsGroup};
