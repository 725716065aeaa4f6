//! Port to the display server that hosts the XSETTINGS property.
//!
//! The manager only needs raw property I/O and monitor names. The owner
//! window, the connection and any request timeout belong to the implementation
//! (see the X11 backend in `xsettings-system`).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayServerError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Failed to read the settings property: {0}")]
    Read(String),

    #[error("Failed to write the settings property: {0}")]
    Write(String),

    #[error("Could not resolve monitors: {0}")]
    Monitor(String),

    #[error("No primary monitor is configured")]
    NoPrimaryMonitor,
}

pub trait DisplayServer: Send + Sync {
    /// Current raw property value; empty when the property does not exist yet.
    fn read_property(&self) -> Result<Vec<u8>, DisplayServerError>;

    /// Replaces the property value.
    fn write_property(&self, data: &[u8]) -> Result<(), DisplayServerError>;

    /// Output name of the primary monitor, e.g. `eDP-1`.
    fn primary_monitor_name(&self) -> Result<String, DisplayServerError>;

    /// Output names of all connected monitors.
    fn connected_monitor_names(&self) -> Result<Vec<String>, DisplayServerError>;
}
