//! Default configuration values.
//!
//! Used by `serde`'s `default` attribute on the structs in [`super::types`].

use super::types::{LoggingConfig, ScaleConfig};

pub(crate) fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file_path: None,
        format: default_log_format(),
    }
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

pub(crate) fn default_log_format() -> String {
    "text".to_string()
}

pub(crate) fn default_scale_config() -> ScaleConfig {
    ScaleConfig {
        base_dpi: default_base_dpi(),
        derive_dpi_settings: default_true(),
    }
}

/// X11's notion of 1x.
pub(crate) fn default_base_dpi() -> u32 {
    96
}

pub(crate) fn default_true() -> bool {
    true
}
