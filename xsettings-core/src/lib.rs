//! # XSETTINGS Core Library (`xsettings-core`)
//!
//! Foundation of the NovaDE XSETTINGS manager. This crate has no knowledge of
//! X11 connections or the secondary settings store; it provides:
//!
//! - **Data model**: [`SettingsBlob`], [`SettingItem`] and the closed
//!   [`SettingValue`] variant (`Integer`, `String`, `Color`).
//! - **Property codec**: [`codec::decode`] and [`codec::encode`] for the
//!   `_XSETTINGS_SETTINGS` wire format, with [`FormatError`] for malformed data.
//! - **Configuration**: [`XSettingsConfig`] loaded from TOML by [`ConfigLoader`].
//! - **Logging**: `tracing` subscriber setup in [`logging`].
//! - **Errors**: [`CoreError`] and its specific variants.
//!
//! ```rust
//! use xsettings_core::codec;
//! use xsettings_core::{SettingValue, SettingsBlob};
//!
//! let mut blob = SettingsBlob::new();
//! let serial = blob.bump_serial();
//! blob.upsert("Net/DoubleClickTime", SettingValue::Integer(400), serial);
//!
//! let bytes = codec::encode(&blob);
//! assert_eq!(codec::decode(&bytes).unwrap(), blob);
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use codec::FormatError;
pub use config::{ConfigLoader, LoggingConfig, ScaleConfig, XSettingsConfig};
pub use error::{ConfigError, CoreError, LoggingError};
pub use logging::{init_logging, init_minimal_logging};
pub use types::{ByteOrder, Color, SettingItem, SettingType, SettingValue, SettingsBlob};
