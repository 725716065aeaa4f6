//! Core data types shared by the XSETTINGS layers.

pub mod setting;


pub use setting::{ByteOrder, Color, SettingItem, SettingType, SettingValue, SettingsBlob};
