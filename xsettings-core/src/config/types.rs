//! Configuration data structures.
//!
//! These structs are deserialized from the daemon's TOML configuration file.
//! Missing sections and fields fall back to the values in [`super::defaults`];
//! unknown fields are rejected via `#[serde(deny_unknown_fields)]`.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "text"
//!
//! [store]
//! path = "/home/user/.config/novade/xsettings.toml"
//!
//! [display]
//! screen = 0
//!
//! [scale]
//! base_dpi = 96
//! derive_dpi_settings = true
//! ```

use serde::Deserialize;
use std::path::PathBuf;

use super::defaults;

/// Configuration for the logging subsystem.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level: "trace", "debug", "info", "warn" or "error" (case-insensitive).
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional file that receives a copy of the log, rotated daily.
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    /// "text" or "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        defaults::default_logging_config()
    }
}

/// Location of the secondary settings store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// When unset, `$XDG_CONFIG_HOME/novade/xsettings.toml` is used.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Which X screen the manager serves.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Screen number; `None` means the default screen of `$DISPLAY`.
    #[serde(default)]
    pub screen: Option<usize>,
}

/// Scale factor handling.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScaleConfig {
    /// DPI that corresponds to a scale factor of 1.0.
    #[serde(default = "defaults::default_base_dpi")]
    pub base_dpi: u32,
    /// Also publish `Xft/DPI`, `Gdk/WindowScalingFactor` and `Gdk/UnscaledDPI`
    /// whenever the per-monitor scale factors change.
    #[serde(default = "defaults::default_true")]
    pub derive_dpi_settings: bool,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        defaults::default_scale_config()
    }
}

/// Root configuration of the XSETTINGS manager.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XSettingsConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub scale: ScaleConfig,
}
