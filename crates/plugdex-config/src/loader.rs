//! Settings file loading and saving.
//!
//! The durable tier is persisted as a TOML file with a single `[settings]`
//! table holding one quoted, flat key per entry:
//!
//! ```toml
//! [settings]
//! "manager/allow_deprecated" = "true"
//! "repos/local/installed/path" = "/home/user/.local/share/plugdex/plugins"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::store::validate_key;
use crate::{ConfigError, ConfigResult, check_value};

/// Default settings directory name, relative to the home directory.
pub const SETTINGS_DIR_NAME: &str = ".plugdex";

/// Default settings file name.
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

/// The settings file format.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    settings: BTreeMap<String, Value>,
}

/// Returns the default settings file path (`~/.plugdex/settings.toml`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_store_path() -> ConfigResult<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not determine home directory",
        )
    })?;

    Ok(home.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
}

/// Loads stored values from a settings file.
///
/// A missing file yields an empty map.
pub(crate) fn load_values(path: &Path) -> ConfigResult<BTreeMap<String, Value>> {
    debug!(?path, "loading settings");

    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let content = std::fs::read_to_string(path)?;
    let file: SettingsFile = toml::from_str(&content)?;

    for (key, value) in &file.settings {
        check_entry(key, value)?;
    }

    Ok(file.settings)
}

/// Applies the write-time key and value rules to an entry read from disk.
fn check_entry(key: &str, value: &Value) -> ConfigResult<()> {
    let reason = if validate_key(key).is_err() {
        "key must not be empty or contain empty segments"
    } else if !check_value(value) {
        "value must be JSON-compatible and must not contain nulls"
    } else {
        return Ok(());
    };

    Err(ConfigError::InvalidEntry {
        key: key.to_string(),
        reason,
    })
}

/// Writes stored values to a settings file, creating parent directories.
pub(crate) fn save_values(path: &Path, values: &BTreeMap<String, Value>) -> ConfigResult<()> {
    let file = SettingsFile {
        settings: values.clone(),
    };
    let content = toml::to_string_pretty(&file)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;

    debug!(?path, entries = values.len(), "saved settings");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_settings_file_name() {
        assert_eq!(SETTINGS_FILE_NAME, "settings.toml");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let values = load_values(&temp_dir.path().join("settings.toml")).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_load_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "").unwrap();

        let values = load_values(&path).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_load_flat_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
            [settings]
            "manager/allow_deprecated" = "true"
            "manager/priority" = ["installed", "extra"]
            "repos/local/extra/active" = false
        "#,
        )
        .unwrap();

        let values = load_values(&path).unwrap();
        assert_eq!(values["manager/allow_deprecated"], json!("true"));
        assert_eq!(values["manager/priority"], json!(["installed", "extra"]));
        assert_eq!(values["repos/local/extra/active"], json!(false));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();

        assert!(matches!(load_values(&path), Err(ConfigError::InvalidToml(_))));
    }

    #[test]
    fn test_load_rejects_malformed_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");

        for content in ["[settings]\n\"a//b\" = 1\n", "[settings]\n\"\" = 1\n"] {
            fs::write(&path, content).unwrap();
            let err = load_values(&path).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEntry { .. }), "{content:?}");
            assert_eq!(err.kind(), crate::ErrorKind::Io);
        }
    }

    #[test]
    fn test_load_rejects_empty_nested_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "[settings.repos]\n\"\" = \"x\"\n").unwrap();

        let err = load_values(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEntry { ref key, .. } if key == "repos"));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.toml");

        let mut values = BTreeMap::new();
        values.insert("paths/plugins".to_string(), json!("/opt/plugins"));
        save_values(&path, &values).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[settings]"));
        assert!(content.contains("\"paths/plugins\""));
        assert_eq!(load_values(&path).unwrap(), values);
    }
}
