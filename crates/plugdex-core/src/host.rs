//! Host settings tier.
//!
//! When Plugdex runs embedded in a host application, the host's own settings
//! service overrides the durable store: reads prefer it, writes are mirrored
//! into it. The host tier is injected at construction time and its absence
//! is a normal configuration.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::NaiveDate;
use serde_json::Value;

/// A value as delivered by the host settings service.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    /// A JSON-compatible value. `Null` means "no value".
    Json(Value),
    /// A calendar date, normalized to an ISO-8601 string on read.
    Date(NaiveDate),
    /// Anything else the host can store but Plugdex cannot represent.
    Unsupported { type_name: String },
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<NaiveDate> for HostValue {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

/// Settings service of a host application.
pub trait HostSettings {
    /// Returns the value stored under `key`, if any.
    fn value(&self, key: &str) -> Option<HostValue>;

    /// Stores a value under `key`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason if the host refuses the value.
    fn set_value(&mut self, key: &str, value: &Value) -> Result<(), String>;

    /// Removes the value stored under `key`, if any.
    fn remove(&mut self, key: &str);

    /// Returns every key the host knows about.
    fn all_keys(&self) -> Vec<String>;
}

/// In-memory host settings.
///
/// Clones share the same storage, so a caller can keep a handle to inspect
/// what was mirrored after handing a clone to [`Settings`](crate::Settings).
#[derive(Debug, Clone, Default)]
pub struct MemoryHostSettings {
    values: Rc<RefCell<BTreeMap<String, HostValue>>>,
}

impl MemoryHostSettings {
    /// Creates empty host settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw host value, bypassing any conversion.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<HostValue>) {
        self.values.borrow_mut().insert(key.into(), value.into());
    }

    /// Returns the raw host value stored under `key`.
    pub fn get(&self, key: &str) -> Option<HostValue> {
        self.values.borrow().get(key).cloned()
    }
}

impl HostSettings for MemoryHostSettings {
    fn value(&self, key: &str) -> Option<HostValue> {
        self.get(key)
    }

    fn set_value(&mut self, key: &str, value: &Value) -> Result<(), String> {
        self.insert(key, value.clone());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.values.borrow_mut().remove(key);
    }

    fn all_keys(&self) -> Vec<String> {
        self.values.borrow().keys().cloned().collect()
    }
}
