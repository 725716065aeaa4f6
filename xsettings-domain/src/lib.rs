//! # XSETTINGS Domain Library (`xsettings-domain`)
//!
//! Business logic of the NovaDE XSETTINGS manager:
//!
//! - [`manager`]: the [`XSettingsService`] trait and its default
//!   implementation, which mediates typed reads and writes of the property.
//! - [`registry`]: which settings exist, their types and their store keys.
//! - [`scale`]: per-monitor scale factors and the DPI settings derived from them.
//! - [`store`]: the secondary key/value store that mirrors written settings.
//! - [`display`]: the port to the display server holding the property.
//!
//! Concrete display-server backends live in `xsettings-system`.

pub mod display;
pub mod error;
pub mod manager;
pub mod registry;
pub mod scale;
pub mod store;

pub use display::{DisplayServer, DisplayServerError};
pub use error::{Result, XSettingsError};
pub use manager::{DefaultXSettingsService, XSettingsService};
pub use registry::{Conversion, RegistryEntry, SettingRegistry};
pub use scale::ScaleMap;
pub use store::{FilesystemSettingsStore, MemorySettingsStore, SettingsStore, StoreError, StoreValue};
