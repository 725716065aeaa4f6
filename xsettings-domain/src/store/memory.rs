use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::{SettingsStore, StoreError, StoreValue};

/// Volatile store, used when no file is configured and in tests.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<BTreeMap<String, StoreValue>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, StoreValue)>,
        K: Into<String>,
    {
        Self {
            values: Mutex::new(values.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, StoreValue> {
        self.values.lock().clone()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn set_value(&self, key: &str, value: StoreValue) -> Result<(), StoreError> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn get_value(&self, key: &str) -> Result<Option<StoreValue>, StoreError> {
        Ok(self.values.lock().get(key).cloned())
    }
}
