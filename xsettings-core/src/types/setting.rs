//! In-memory representation of the XSETTINGS property.
//!
//! A [`SettingsBlob`] is the decoded form of the whole `_XSETTINGS_SETTINGS`
//! property: a byte order, a blob-level change serial and an ordered list of
//! [`SettingItem`]s. Every item carries a closed [`SettingValue`] variant so
//! that typed accessors can fail with a type mismatch instead of relying on
//! runtime downcasts.

use std::fmt;

/// Wire type tag of a setting.
///
/// The discriminants are the values written into the first byte of every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SettingType {
    Integer = 0,
    String = 1,
    Color = 2,
}

impl SettingType {
    /// Maps a wire tag back to a type, `None` for tags outside `{0, 1, 2}`.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(SettingType::Integer),
            1 => Some(SettingType::String),
            2 => Some(SettingType::Color),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SettingType::Integer => "integer",
            SettingType::String => "string",
            SettingType::Color => "color",
        }
    }
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An RGBA color with 16 bits per channel, as carried by XSETTINGS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub alpha: u16,
}

impl Color {
    pub const fn new(red: u16, green: u16, blue: u16, alpha: u16) -> Self {
        Self { red, green, blue, alpha }
    }

    /// Builds a color from exactly four channels in red, green, blue, alpha order.
    ///
    /// Returns `None` for any other slice length.
    pub fn from_channels(channels: &[u16]) -> Option<Self> {
        match channels {
            [red, green, blue, alpha] => Some(Self::new(*red, *green, *blue, *alpha)),
            _ => None,
        }
    }

    /// Channels in red, green, blue, alpha order.
    pub fn channels(&self) -> [u16; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }
}

/// Value of a single setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Integer(i32),
    String(String),
    Color(Color),
}

impl SettingValue {
    pub fn setting_type(&self) -> SettingType {
        match self {
            SettingValue::Integer(_) => SettingType::Integer,
            SettingValue::String(_) => SettingType::String,
            SettingValue::Color(_) => SettingType::Color,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            SettingValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            SettingValue::Color(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Integer(v) => write!(f, "{}", v),
            SettingValue::String(v) => write!(f, "{:?}", v),
            SettingValue::Color(c) => write!(f, "({}, {}, {}, {})", c.red, c.green, c.blue, c.alpha),
        }
    }
}

/// One named entry of the property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingItem {
    pub name: String,
    pub value: SettingValue,
    /// Blob serial at which this item last changed.
    pub serial: u32,
}

impl SettingItem {
    pub fn new(name: impl Into<String>, value: SettingValue, serial: u32) -> Self {
        Self { name: name.into(), value, serial }
    }

    pub fn setting_type(&self) -> SettingType {
        self.value.setting_type()
    }
}

/// Byte order declared in the first byte of the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// `LSBFirst` (0), what GTK and most managers write on x86.
    #[default]
    LsbFirst,
    /// `MSBFirst` (1).
    MsbFirst,
}

impl ByteOrder {
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            0 => Some(ByteOrder::LsbFirst),
            1 => Some(ByteOrder::MsbFirst),
            _ => None,
        }
    }

    pub fn marker(self) -> u8 {
        match self {
            ByteOrder::LsbFirst => 0,
            ByteOrder::MsbFirst => 1,
        }
    }
}

/// Decoded form of the whole XSETTINGS property.
///
/// Items keep their wire order. New items are appended, existing ones are
/// updated in place, so re-encoding an untouched blob reproduces its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsBlob {
    pub byte_order: ByteOrder,
    pub serial: u32,
    pub items: Vec<SettingItem>,
    /// Bytes following the last declared item. Not interpreted, written back as-is.
    pub trailing: Vec<u8>,
}

impl SettingsBlob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&SettingItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SettingItem> {
        self.items.iter_mut().find(|item| item.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Advances the blob serial and returns the new value.
    ///
    /// Wraps at `u32::MAX`; readers only compare serials for inequality.
    pub fn bump_serial(&mut self) -> u32 {
        self.serial = self.serial.wrapping_add(1);
        self.serial
    }

    /// Stores `value` under `name` with the given item serial.
    ///
    /// An existing item is updated in place, otherwise the item is appended.
    /// The caller is responsible for type-checking against an existing entry.
    pub fn upsert(&mut self, name: &str, value: SettingValue, serial: u32) {
        match self.get_mut(name) {
            Some(item) => {
                item.value = value;
                item.serial = serial;
            }
            None => self.items.push(SettingItem::new(name, value, serial)),
        }
    }
}
