//! Persistent shared settings storage

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_json::Value;
use smol_str::SmolStr;

/// A single change observed in a [`SettingsStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChange {
    pub key: SmolStr,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Key/value storage shared between every document context of the host.
///
/// Writes made by any context are reported to every context through [`SettingsStore::take_changes`].
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    fn remove(&self, key: &str);
    /// Drain the change notifications that arrived since the last call
    fn take_changes(&self) -> Vec<SettingChange>;
}

/// An in-memory [`SettingsStore`]
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RefCell<BTreeMap<SmolStr, Value>>,
    changes: RefCell<Vec<SettingChange>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without emitting a change notification
    pub fn with_value(self, key: &str, value: Value) -> Self {
        self.values.borrow_mut().insert(SmolStr::new(key), value);
        self
    }

    fn record(&self, key: &str, old_value: Option<Value>, new_value: Option<Value>) {
        if old_value == new_value {
            return;
        }
        self.changes.borrow_mut().push(SettingChange {
            key: SmolStr::new(key),
            old_value,
            new_value,
        });
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        let old = self
            .values
            .borrow_mut()
            .insert(SmolStr::new(key), value.clone());
        self.record(key, old, Some(value));
    }

    fn remove(&self, key: &str) {
        let old = self.values.borrow_mut().remove(key);
        self.record(key, old, None);
    }

    fn take_changes(&self) -> Vec<SettingChange> {
        std::mem::take(&mut *self.changes.borrow_mut())
    }
}
