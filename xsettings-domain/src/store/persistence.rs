use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{SettingsStore, StoreError, StoreValue};

/// A settings store kept in a flat TOML table on disk.
///
/// The whole file is rewritten on every `set_value`; the in-memory copy is
/// only updated once the file write succeeded.
#[derive(Debug)]
pub struct FilesystemSettingsStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, StoreValue>>,
}

impl FilesystemSettingsStore {
    /// Opens the store at `path`. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| StoreError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Settings store {:?} not found, starting empty", path);
                BTreeMap::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, values: Mutex::new(values) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_exists(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    fn write_file(&self, values: &BTreeMap<String, StoreValue>) -> Result<(), StoreError> {
        self.ensure_parent_exists()?;
        let content = toml::to_string_pretty(values).map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Write next to the target and rename so readers never see a partial file.
        let tmp_path = self.path.with_extension("toml.tmp");
        fs::write(&tmp_path, content).map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Io { path: self.path.clone(), source })
    }
}

impl SettingsStore for FilesystemSettingsStore {
    fn set_value(&self, key: &str, value: StoreValue) -> Result<(), StoreError> {
        let mut values = self.values.lock();
        let mut updated = values.clone();
        updated.insert(key.to_string(), value);
        self.write_file(&updated)?;
        *values = updated;
        debug!("Stored '{}' in {:?}", key, self.path);
        Ok(())
    }

    fn get_value(&self, key: &str) -> Result<Option<StoreValue>, StoreError> {
        Ok(self.values.lock().get(key).cloned())
    }
}
