//! Well-known settings keys and their defaults.

use serde_json::Value;

/// Separator between the segments of a hierarchical settings key.
pub const CONFIG_DELIMITER: char = '/';

/// Root group under which every repository type keeps its repositories.
pub const CONFIG_GROUP_MANAGER_REPOS: &str = "repos";

/// Whether deprecated plugins are shown (stored as `"true"` / `"false"`).
pub const CONFIG_KEY_ALLOW_DEPRECATED: &str = "manager/allow_deprecated";

/// Whether experimental plugins are shown (stored as `"true"` / `"false"`).
pub const CONFIG_KEY_ALLOW_EXPERIMENTAL: &str = "manager/allow_experimental";

/// Repository ids in priority order, highest priority first.
pub const CONFIG_KEY_PRIORITY: &str = "manager/priority";

/// Directory holding locally installed plugins.
pub const CONFIG_KEY_PLUGIN_PATH: &str = "paths/plugins";

const DEFAULT_KEYS: [&str; 3] = [
    CONFIG_KEY_ALLOW_DEPRECATED,
    CONFIG_KEY_ALLOW_EXPERIMENTAL,
    CONFIG_KEY_PRIORITY,
];

/// Returns the keys that have a built-in default.
pub fn default_keys() -> &'static [&'static str] {
    &DEFAULT_KEYS
}

/// Returns the built-in default for a key, if it has one.
pub fn default_value(key: &str) -> Option<Value> {
    match key {
        CONFIG_KEY_ALLOW_DEPRECATED | CONFIG_KEY_ALLOW_EXPERIMENTAL => {
            Some(Value::String("false".to_string()))
        }
        CONFIG_KEY_PRIORITY => Some(Value::Array(Vec::new())),
        _ => None,
    }
}
