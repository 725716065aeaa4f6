use std::fmt::{self, Display, Formatter};

use xsettings_core::{Color, SettingType, SettingValue};

use crate::error::{Result, XSettingsError};
use crate::store::StoreValue;

/// How a setting is represented in the secondary store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    /// XSETTINGS integer, store int.
    Integer,
    /// XSETTINGS integer (0/1), store bool.
    Boolean,
    String,
    /// XSETTINGS color, store string `#rrggbbaa`.
    HexColor,
}

impl Conversion {
    pub fn setting_type(self) -> SettingType {
        match self {
            Conversion::Integer | Conversion::Boolean => SettingType::Integer,
            Conversion::String => SettingType::String,
            Conversion::HexColor => SettingType::Color,
        }
    }

    fn store_kind(self) -> &'static str {
        match self {
            Conversion::Integer => "int",
            Conversion::Boolean => "bool",
            Conversion::String | Conversion::HexColor => "string",
        }
    }
}

impl Display for Conversion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            Conversion::Integer => "integer",
            Conversion::Boolean => "boolean",
            Conversion::String => "string",
            Conversion::HexColor => "hex-color",
        })
    }
}

/// Mapping of one XSETTINGS name to a secondary-store key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub xsettings_key: String,
    pub store_key: String,
    pub conversion: Conversion,
}

impl RegistryEntry {
    pub fn new(xsettings_key: impl Into<String>, store_key: impl Into<String>, conversion: Conversion) -> Self {
        Self {
            xsettings_key: xsettings_key.into(),
            store_key: store_key.into(),
            conversion,
        }
    }

    pub fn setting_type(&self) -> SettingType {
        self.conversion.setting_type()
    }

    /// Converts a property value into its store representation.
    pub fn to_store_value(&self, value: &SettingValue) -> Result<StoreValue> {
        match (self.conversion, value) {
            (Conversion::Integer, SettingValue::Integer(v)) => Ok(StoreValue::Int(i64::from(*v))),
            (Conversion::Boolean, SettingValue::Integer(v)) => Ok(StoreValue::Bool(*v != 0)),
            (Conversion::String, SettingValue::String(v)) => Ok(StoreValue::String(v.clone())),
            (Conversion::HexColor, SettingValue::Color(c)) => Ok(StoreValue::String(color_to_hex(c))),
            (conversion, value) => Err(XSettingsError::type_mismatch(
                &self.xsettings_key,
                conversion.setting_type().as_str(),
                value.setting_type().as_str(),
            )),
        }
    }

    /// Converts a store value back into a property value.
    pub fn from_store_value(&self, value: &StoreValue) -> Result<SettingValue> {
        match (self.conversion, value) {
            (Conversion::Integer, StoreValue::Int(v)) => i32::try_from(*v).map(SettingValue::Integer).map_err(|_| {
                XSettingsError::InvalidArgument(format!(
                    "Store value {} of '{}' does not fit a 32-bit integer",
                    v, self.store_key
                ))
            }),
            (Conversion::Boolean, StoreValue::Bool(v)) => Ok(SettingValue::Integer(i32::from(*v))),
            (Conversion::String, StoreValue::String(v)) => Ok(SettingValue::String(v.clone())),
            (Conversion::HexColor, StoreValue::String(v)) => hex_to_color(v).map(SettingValue::Color).ok_or_else(|| {
                XSettingsError::InvalidArgument(format!("'{}' of '{}' is not a #rrggbb[aa] color", v, self.store_key))
            }),
            (conversion, value) => {
                Err(XSettingsError::type_mismatch(&self.xsettings_key, conversion.store_kind(), value.kind()))
            }
        }
    }
}

/// Formats the upper 8 bits of every channel as `#rrggbbaa`.
pub fn color_to_hex(color: &Color) -> String {
    format!(
        "#{:02x}{:02x}{:02x}{:02x}",
        color.red >> 8,
        color.green >> 8,
        color.blue >> 8,
        color.alpha >> 8
    )
}

/// Parses `#rrggbb` or `#rrggbbaa`. Channels are widened to 16 bits by
/// repeating the byte; a missing alpha is opaque.
pub fn hex_to_color(text: &str) -> Option<Color> {
    let hex = text.strip_prefix('#')?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok().map(|b| u16::from(b) * 257);
    let alpha = if hex.len() == 8 { channel(6)? } else { u16::MAX };
    Some(Color::new(channel(0)?, channel(2)?, channel(4)?, alpha))
}
