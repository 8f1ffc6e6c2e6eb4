//! Discovery of plugin modules in a local directory.

use std::fs;
use std::path::{Path, PathBuf};

use plugdex_core::{MetaValue, Metadata, PluginRelease, RepositoryResult, Settings};
use tracing::{debug, warn};

/// Name of the metadata file inside a plugin directory.
pub const METADATA_FILE_NAME: &str = "metadata.txt";

/// A plugin found in a local repository.
#[derive(Debug)]
pub struct LocalRelease {
    repo_id: String,
    path: PathBuf,
    metadata: Metadata,
}

impl LocalRelease {
    /// Creates a release of the plugin installed at `path`.
    pub fn new(repo_id: impl Into<String>, path: impl Into<PathBuf>, metadata: Metadata) -> Self {
        Self {
            repo_id: repo_id.into(),
            path: path.into(),
            metadata,
        }
    }

    /// Returns the plugin directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the plugin's metadata could not be read.
    pub fn is_broken(&self) -> bool {
        matches!(self.metadata.get_str("error"), Ok(Some("broken")))
    }
}

impl PluginRelease for LocalRelease {
    fn repo_id(&self) -> &str {
        &self.repo_id
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// Lists the plugin directories below `dir`, sorted by name.
///
/// A plugin directory is a sub-directory holding a `metadata.txt`.
///
/// # Errors
///
/// Returns an error if `dir` cannot be listed.
pub fn plugin_modules(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut modules = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() && path.join(METADATA_FILE_NAME).is_file() {
            modules.push(path);
        }
    }
    modules.sort();
    Ok(modules)
}

/// Reads the metadata of locally installed plugin modules.
///
/// Every module yields a record. A module whose `metadata.txt` cannot be
/// read or validated yields a record flagged `error = "broken"`.
///
/// # Errors
///
/// Returns an error only if a fallback record cannot be built.
pub fn find_plugins(
    _settings: &Settings,
    protected: bool,
    plugin_modules: &[PathBuf],
) -> RepositoryResult<Vec<Metadata>> {
    let mut found = Vec::with_capacity(plugin_modules.len());

    for module in plugin_modules {
        let id = module_id(module);
        let library = module.to_string_lossy().into_owned();

        let local = vec![
            ("installed", MetaValue::Bool(true)),
            ("available", MetaValue::Bool(false)),
            ("readonly", MetaValue::Bool(protected)),
            ("library", MetaValue::Str(library)),
        ];

        match read_metadata(&id, module) {
            Ok(parsed) => {
                let values = parsed
                    .fields()
                    .map(|(name, value)| (name, value.clone()))
                    .chain(local)
                    .collect::<Vec<_>>();
                found.push(Metadata::new(values)?);
                debug!(id = %id, "found plugin");
            }
            Err(err) => {
                warn!(id = %id, path = %module.display(), error = %err, "broken plugin metadata");
                let values = [
                    ("id", MetaValue::Str(id.clone())),
                    ("name", MetaValue::Str(id)),
                    ("error", MetaValue::from("broken")),
                    ("error_details", MetaValue::Str(err)),
                ]
                .into_iter()
                .chain(local);
                found.push(Metadata::new(values)?);
            }
        }
    }

    Ok(found)
}

fn module_id(module: &Path) -> String {
    module
        .file_name()
        .map_or_else(|| module.to_string_lossy(), |name| name.to_string_lossy())
        .into_owned()
}

fn read_metadata(id: &str, module: &Path) -> Result<Metadata, String> {
    let text = fs::read_to_string(module.join(METADATA_FILE_NAME)).map_err(|err| err.to_string())?;
    Metadata::from_metadatatxt(id, &text).map_err(|err| err.to_string())
}
