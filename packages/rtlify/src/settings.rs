//! Persisted enabled flag
//!
//! The flag lives in the host's shared [`SettingsStore`] under [`ENABLED_KEY`]. Stores written
//! by older versions use [`DEPRECATED_ENABLED_KEY`]; its value is moved over on first read.

use std::rc::Rc;

use rtlify_traits::SettingsStore;
use serde_json::Value;

use crate::{Engine, EngineError};

pub const ENABLED_KEY: &str = "rtlifyEnabled";
pub const DEPRECATED_ENABLED_KEY: &str = "autoRtlEnabled";

pub struct SettingsBridge {
    store: Rc<dyn SettingsStore>,
}

impl SettingsBridge {
    pub fn new(store: Rc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// The stored enabled flag, migrating the deprecated key if needed. Defaults to disabled.
    pub fn read_enabled(&self) -> bool {
        if let Some(value) = self.store.get(ENABLED_KEY) {
            return value.as_bool().unwrap_or(false);
        }

        let Some(value) = self.store.get(DEPRECATED_ENABLED_KEY) else {
            return false;
        };
        self.store.set(ENABLED_KEY, value.clone());
        self.store.remove(DEPRECATED_ENABLED_KEY);
        tracing::info!("Migrated setting {DEPRECATED_ENABLED_KEY} to {ENABLED_KEY}");
        value.as_bool().unwrap_or(false)
    }

    /// Bring a freshly created engine in line with the stored flag.
    /// Returns the flag that was applied.
    pub fn init(&self, engine: &mut Engine) -> Result<bool, EngineError> {
        let enabled = self.read_enabled();
        reconcile(engine, enabled)?;
        Ok(enabled)
    }

    /// Apply change notifications received since the last call. Only the latest write of the
    /// enabled flag matters.
    pub fn sync(&self, engine: &mut Engine) -> Result<(), EngineError> {
        let latest = self
            .store
            .take_changes()
            .into_iter()
            .filter(|change| change.key == ENABLED_KEY)
            .last();

        if let Some(change) = latest {
            let enabled = change
                .new_value
                .as_ref()
                .and_then(Value::as_bool)
                .unwrap_or(false);
            reconcile(engine, enabled)?;
        }
        Ok(())
    }

    /// Persist the enabled flag. Every context picks it up on its next [`SettingsBridge::sync`].
    pub fn set_enabled(&self, enabled: bool) {
        self.store.set(ENABLED_KEY, Value::Bool(enabled));
    }
}

fn reconcile(engine: &mut Engine, enabled: bool) -> Result<(), EngineError> {
    match (enabled, engine.is_enabled()) {
        (true, false) => engine.enable(),
        (false, true) => engine.disable(),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtlify_traits::MemorySettingsStore;

    #[test]
    fn test_missing_flag_reads_as_disabled() {
        let bridge = SettingsBridge::new(Rc::new(MemorySettingsStore::new()));
        assert!(!bridge.read_enabled());
    }

    #[test]
    fn test_non_boolean_flag_reads_as_disabled() {
        let store = MemorySettingsStore::new().with_value(ENABLED_KEY, Value::from("yes"));
        let bridge = SettingsBridge::new(Rc::new(store));
        assert!(!bridge.read_enabled());
    }
}
