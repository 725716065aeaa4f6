//! Configuration management for the XSETTINGS manager.
//!
//! - [`types`]: the configuration schema ([`XSettingsConfig`] and its sections).
//! - [`defaults`]: default values used when fields or sections are missing.
//! - [`loader`]: [`ConfigLoader`], which reads, parses and validates TOML files.

pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{DisplayConfig, LoggingConfig, ScaleConfig, StoreConfig, XSettingsConfig};
