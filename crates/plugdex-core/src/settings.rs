//! Two-tier settings overlay and prefix-scoped groups.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use plugdex_config::{CONFIG_DELIMITER, ConfigStore, check_value, value_type_name};
use serde_json::Value;
use tracing::debug;

use crate::{HostSettings, HostValue, SettingsError, SettingsResult};

struct SettingsInner {
    config: ConfigStore,
    host: Option<Box<dyn HostSettings>>,
}

/// Settings store layering an optional host tier over the durable store.
///
/// Reads prefer the host tier and fall back to the durable store. Writes go
/// to the durable store first (which validates them) and are then mirrored
/// into the host tier.
///
/// `Settings` is a handle: clones refer to the same underlying tiers. It is
/// meant to be used from a single thread.
#[derive(Clone)]
pub struct Settings {
    inner: Rc<RefCell<SettingsInner>>,
}

impl Settings {
    /// Creates a settings store over a durable store and an optional host tier.
    pub fn new(config: ConfigStore, host: Option<Box<dyn HostSettings>>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SettingsInner { config, host })),
        }
    }

    /// Creates a settings store without a host tier.
    pub fn detached(config: ConfigStore) -> Self {
        Self::new(config, None)
    }

    /// Returns `true` if a host tier is present.
    pub fn has_host(&self) -> bool {
        self.inner.borrow().host.is_some()
    }

    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the host value cannot be normalized, or if neither
    /// tier knows the key.
    pub fn read(&self, key: &str) -> SettingsResult<Value> {
        if let Some(value) = self.host_value(key)? {
            return Ok(value);
        }
        Ok(self.inner.borrow().config.read(key)?)
    }

    /// Reads a value, returning `default` if neither tier knows the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the host value cannot be normalized or the key is
    /// malformed.
    pub fn get(&self, key: &str, default: Value) -> SettingsResult<Value> {
        if let Some(value) = self.host_value(key)? {
            return Ok(value);
        }
        Ok(self.inner.borrow().config.get(key, default)?)
    }

    /// Reads a value from the durable tier only.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable tier does not know the key.
    pub fn read_durable(&self, key: &str) -> SettingsResult<Value> {
        Ok(self.inner.borrow().config.read(key)?)
    }

    /// Writes a value to the durable tier, then mirrors it into the host tier.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable tier rejects the value or the host
    /// tier refuses the mirrored write.
    pub fn write(&self, key: &str, value: impl Into<Value>) -> SettingsResult<()> {
        let value = value.into();
        let mut inner = self.inner.borrow_mut();

        inner.config.write(key, value.clone())?;

        if let Some(host) = inner.host.as_mut() {
            host.set_value(key, &value)
                .map_err(|reason| SettingsError::Host {
                    key: key.to_string(),
                    reason,
                })?;
        }

        Ok(())
    }

    /// Removes a key from both tiers.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed or persisting fails.
    pub fn remove(&self, key: &str) -> SettingsResult<()> {
        let mut inner = self.inner.borrow_mut();

        inner.config.remove(key)?;
        if let Some(host) = inner.host.as_mut() {
            host.remove(key);
        }

        Ok(())
    }

    /// Returns a view scoped to `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is empty.
    pub fn group(&self, root: &str) -> SettingsResult<SettingsGroup> {
        SettingsGroup::new(self.clone(), root)
    }

    /// Returns every known key.
    ///
    /// With a host tier present the host's enumeration is used, otherwise
    /// the durable store's.
    pub fn keys(&self) -> Vec<String> {
        let inner = self.inner.borrow();
        match &inner.host {
            Some(host) => host.all_keys(),
            None => inner.config.keys(),
        }
    }

    /// Returns the distinct first segments of all keys.
    pub fn keys_root(&self) -> BTreeSet<String> {
        self.keys()
            .iter()
            .filter_map(|key| key.split(CONFIG_DELIMITER).next())
            .map(str::to_string)
            .collect()
    }

    /// Persists the durable tier.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable tier cannot be written.
    pub fn save(&self) -> SettingsResult<()> {
        Ok(self.inner.borrow().config.save()?)
    }

    fn host_value(&self, key: &str) -> SettingsResult<Option<Value>> {
        let inner = self.inner.borrow();
        let Some(host) = inner.host.as_ref() else {
            return Ok(None);
        };

        match host.value(key) {
            Some(value) => convert_host_value(key, value),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Settings")
            .field("path", &inner.config.path())
            .field("host", &inner.host.is_some())
            .finish()
    }
}

/// Normalizes a host value into a settings value.
fn convert_host_value(key: &str, value: HostValue) -> SettingsResult<Option<Value>> {
    match value {
        HostValue::Json(Value::Null) => Ok(None),
        HostValue::Json(value) if check_value(&value) => Ok(Some(value)),
        HostValue::Json(value) => Err(SettingsError::UnknownHostDataType {
            key: key.to_string(),
            type_name: format!("{} containing null", value_type_name(&value)),
        }),
        HostValue::Date(date) => Ok(Some(Value::String(date.format("%Y-%m-%d").to_string()))),
        HostValue::Unsupported { type_name } => Err(SettingsError::UnknownHostDataType {
            key: key.to_string(),
            type_name,
        }),
    }
}

/// A view over [`Settings`] restricted to the keys below a root.
///
/// Groups hold no state of their own; every operation prefixes the name with
/// `root/` and delegates to the store.
#[derive(Clone)]
pub struct SettingsGroup {
    settings: Settings,
    root: String,
    base: String,
}

impl SettingsGroup {
    fn new(settings: Settings, root: &str) -> SettingsResult<Self> {
        if root.is_empty() {
            return Err(SettingsError::EmptyName("group root"));
        }

        Ok(Self {
            settings,
            root: root.to_string(),
            base: format!("{root}{CONFIG_DELIMITER}"),
        })
    }

    /// Returns the full root of this group.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the last segment of the root.
    pub fn name(&self) -> &str {
        self.root
            .rsplit(CONFIG_DELIMITER)
            .next()
            .unwrap_or(&self.root)
    }

    /// Returns the underlying settings store.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reads a value.
    ///
    /// # Errors
    ///
    /// See [`Settings::read`].
    pub fn read(&self, name: &str) -> SettingsResult<Value> {
        self.settings.read(&self.key(name)?)
    }

    /// Reads a value, returning `default` if unknown.
    ///
    /// # Errors
    ///
    /// See [`Settings::get`].
    pub fn get(&self, name: &str, default: Value) -> SettingsResult<Value> {
        self.settings.get(&self.key(name)?, default)
    }

    /// Writes a value.
    ///
    /// # Errors
    ///
    /// See [`Settings::write`].
    pub fn write(&self, name: &str, value: impl Into<Value>) -> SettingsResult<()> {
        self.settings.write(&self.key(name)?, value)
    }

    /// Removes a value.
    ///
    /// # Errors
    ///
    /// See [`Settings::remove`].
    pub fn remove(&self, name: &str) -> SettingsResult<()> {
        self.settings.remove(&self.key(name)?)
    }

    /// Removes every key below this group, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a removal cannot be persisted.
    pub fn clear(&self) -> SettingsResult<usize> {
        let keys = self.keys();
        for name in &keys {
            self.remove(name)?;
        }
        debug!(root = %self.root, removed = keys.len(), "cleared settings group");
        Ok(keys.len())
    }

    /// Returns a nested group `root/subroot`.
    ///
    /// # Errors
    ///
    /// Returns an error if `subroot` is empty.
    pub fn group(&self, subroot: &str) -> SettingsResult<SettingsGroup> {
        if subroot.is_empty() {
            return Err(SettingsError::EmptyName("group root"));
        }
        Self::new(self.settings.clone(), &format!("{}{subroot}", self.base))
    }

    /// Returns the keys below this group, relative to its root.
    pub fn keys(&self) -> BTreeSet<String> {
        self.relative_keys().collect()
    }

    /// Returns the distinct first segments of the keys below this group.
    pub fn keys_root(&self) -> BTreeSet<String> {
        self.relative_keys()
            .filter_map(|key| key.split(CONFIG_DELIMITER).next().map(str::to_string))
            .collect()
    }

    fn relative_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.settings.keys().into_iter().filter_map(|key| {
            key.strip_prefix(&self.base)
                .filter(|rest| !rest.is_empty())
                .map(str::to_string)
        })
    }

    fn key(&self, name: &str) -> SettingsResult<String> {
        if name.is_empty() {
            return Err(SettingsError::EmptyName("settings name"));
        }
        Ok(format!("{}{name}", self.base))
    }
}

impl fmt::Debug for SettingsGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsGroup")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
