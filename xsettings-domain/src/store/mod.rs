//! Secondary settings store.
//!
//! Every successful property write is mirrored into a key/value store so that
//! components which do not speak XSETTINGS can read the same configuration.
//! The store is a best-effort cache; the property stays authoritative.

mod memory;
mod persistence;


use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub use memory::MemorySettingsStore;
pub use persistence::FilesystemSettingsStore;

/// A store-native value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl StoreValue {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreValue::Bool(_) => "bool",
            StoreValue::Int(_) => "int",
            StoreValue::Double(_) => "double",
            StoreValue::String(_) => "string",
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on settings store {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize settings store: {0}")]
    Serialization(String),

    #[error("Failed to parse settings store {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Store rejected key '{key}': {reason}")]
    Rejected { key: String, reason: String },
}

pub trait SettingsStore: Send + Sync {
    fn set_value(&self, key: &str, value: StoreValue) -> Result<(), StoreError>;

    fn get_value(&self, key: &str) -> Result<Option<StoreValue>, StoreError>;
}
