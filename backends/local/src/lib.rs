//! Local directory repository backend.
//!
//! A local repository is a directory holding one sub-directory per plugin,
//! each with a `metadata.txt`:
//! ```text
//! plugins/
//! ├── contour_tools/
//! │   ├── metadata.txt
//! │   └── ...
//! └── geocoder/
//!     └── metadata.txt
//! ```
//!
//! Repositories are persisted below `repos/local/<id>/` with the keys
//! `name`, `path`, `active`, `protected` and `writeable`.

mod discovery;
mod repository;

use plugdex_core::{Backend, Constructor};

pub use discovery::{LocalRelease, METADATA_FILE_NAME, find_plugins, plugin_modules};
pub use repository::{
    DEFAULT_REPO_ID, DEFAULT_REPO_NAME, LocalRepository, from_config, from_default,
    from_directory, from_userinput,
};

/// Tag of the local backend.
pub const REPO_TYPE: &str = "local";

/// Returns the descriptor of the local backend.
#[must_use]
pub fn backend() -> Backend {
    Backend::new(REPO_TYPE, "Plugins installed in a local directory")
        .with_constructor(Constructor::Default(from_default))
        .with_constructor(Constructor::Directory(from_directory))
        .with_constructor(Constructor::UserInput(from_userinput))
        .with_constructor(Constructor::Config(from_config))
        .with_find_plugins(find_plugins)
}
