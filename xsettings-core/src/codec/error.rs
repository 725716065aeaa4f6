use thiserror::Error;

/// A malformed or truncated XSETTINGS property.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// A header field or declared length runs past the end of the buffer.
    #[error("Truncated property while reading {what} at offset {offset}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        what: &'static str,
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// The first byte is neither `LSBFirst` (0) nor `MSBFirst` (1).
    #[error("Invalid byte order marker {0:#04x}")]
    InvalidByteOrder(u8),

    /// An item type tag outside `{0 = Integer, 1 = String, 2 = Color}`.
    #[error("Unknown setting type {tag} at offset {offset}")]
    UnknownType { tag: u8, offset: usize },

    #[error("Setting {what} at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { what: &'static str, offset: usize },
}
