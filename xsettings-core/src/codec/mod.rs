//! Codec for the `_XSETTINGS_SETTINGS` property.
//!
//! Converts between the binary layout published in the XSETTINGS
//! specification and a [`SettingsBlob`](crate::types::SettingsBlob).
//!
//! ```text
//! header   BYTE    byte-order (0 = LSBFirst, 1 = MSBFirst)
//!          3       unused
//!          CARD32  serial
//!          CARD32  N_SETTINGS
//! item     BYTE    type (0 = Integer, 1 = String, 2 = Color)
//!          1       unused
//!          CARD16  n, name length
//!          n       name
//!          P       padding to a multiple of 4
//!          CARD32  last-change serial
//! Integer  INT32   value
//! String   CARD32  m, value length
//!          m       value
//!          P       padding to a multiple of 4
//! Color    CARD16  red, CARD16 blue, CARD16 green, CARD16 alpha
//! ```
//!
//! Both functions are pure and hold no state; they can be called from any
//! thread without synchronization.

mod decode;
mod encode;
mod error;


pub use decode::decode;
pub use encode::encode;
pub use error::FormatError;

/// Size of the fixed property header in bytes.
pub const HEADER_LEN: usize = 12;

/// Number of zero bytes needed to bring `len` to a 4-byte boundary.
pub(crate) fn padding(len: usize) -> usize {
    (4 - (len % 4)) % 4
}
