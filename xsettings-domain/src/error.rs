use thiserror::Error;
use xsettings_core::FormatError;

use crate::display::DisplayServerError;
use crate::store::StoreError;

/// Errors surfaced by the XSETTINGS manager.
#[derive(Error, Debug)]
pub enum XSettingsError {
    /// The property bytes could not be decoded.
    #[error("Invalid xsettings property: {0}")]
    Format(#[from] FormatError),

    #[error("Property '{0}' not found")]
    PropertyNotFound(String),

    /// A typed accessor or conversion disagrees with the stored type.
    #[error("Type of property '{name}' does not match: expected {expected}, found {actual}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The setting was written to the property but has no store mapping.
    #[error("Property '{0}' is not registered with the settings store")]
    PropertyNotRegistered(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Reading or writing the property on the display server failed.
    #[error("Display server error: {0}")]
    Io(#[from] DisplayServerError),

    /// The property was written but the settings store rejected the mirrored value.
    #[error("Failed to mirror '{name}' into the settings store: {source}")]
    Mirror {
        name: String,
        #[source]
        source: StoreError,
    },
}

pub type Result<T> = std::result::Result<T, XSettingsError>;

impl XSettingsError {
    pub(crate) fn type_mismatch(name: &str, expected: &'static str, actual: &'static str) -> Self {
        XSettingsError::TypeMismatch { name: name.to_string(), expected, actual }
    }
}
