//! Durable settings tier for Plugdex.
//!
//! This crate owns the persisted half of the settings overlay: a flat,
//! `/`-delimited key-value store with JSON-compatible values, a table of
//! well-known keys with defaults, and the canonical string encoding of
//! booleans shared by every other crate.

mod defaults;
mod error;
mod loader;
mod store;
mod value;

pub use defaults::{
    CONFIG_DELIMITER, CONFIG_GROUP_MANAGER_REPOS, CONFIG_KEY_ALLOW_DEPRECATED,
    CONFIG_KEY_ALLOW_EXPERIMENTAL, CONFIG_KEY_PLUGIN_PATH, CONFIG_KEY_PRIORITY, default_keys,
    default_value,
};
pub use error::{ConfigError, ConfigResult, ErrorKind};
pub use loader::{SETTINGS_DIR_NAME, SETTINGS_FILE_NAME, default_store_path};
pub use store::ConfigStore;
pub use value::{bool_to_str, check_value, str_to_bool, value_type_name};
