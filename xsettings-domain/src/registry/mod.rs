//! Setting type registry.
//!
//! Maps XSETTINGS names such as `Net/DoubleClickTime` to their value type and
//! to the key under which the secondary store keeps them. The registry is
//! built once and shared read-only between the manager's threads.

mod entry;
mod table;


use std::collections::HashMap;

pub use entry::{color_to_hex, hex_to_color, Conversion, RegistryEntry};

#[derive(Debug, Clone, Default)]
pub struct SettingRegistry {
    entries: Vec<RegistryEntry>,
    index: HashMap<String, usize>,
}

impl SettingRegistry {
    /// Builds a registry from `entries`. A later entry for the same
    /// XSETTINGS name replaces an earlier one.
    pub fn new(entries: impl IntoIterator<Item = RegistryEntry>) -> Self {
        let mut registry = Self::empty();
        for entry in entries {
            match registry.index.get(&entry.xsettings_key) {
                Some(&pos) => registry.entries[pos] = entry,
                None => {
                    registry.index.insert(entry.xsettings_key.clone(), registry.entries.len());
                    registry.entries.push(entry);
                }
            }
        }
        registry
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The GTK, Xft and Qt keys published by the NovaDE session.
    pub fn with_defaults() -> Self {
        Self::new(
            table::DEFAULT_ENTRIES
                .iter()
                .map(|(xsettings_key, store_key, conversion)| RegistryEntry::new(*xsettings_key, *store_key, *conversion)),
        )
    }

    pub fn lookup(&self, xsettings_key: &str) -> Option<&RegistryEntry> {
        self.index.get(xsettings_key).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, xsettings_key: &str) -> bool {
        self.index.contains_key(xsettings_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
