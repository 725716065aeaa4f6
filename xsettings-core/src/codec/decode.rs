use byteorder::{BigEndian, ByteOrder as Endian, LittleEndian};

use super::{padding, FormatError, HEADER_LEN};
use crate::types::{ByteOrder, Color, SettingItem, SettingType, SettingValue, SettingsBlob};

/// Smallest possible item: tag, unused, name length, serial, INT32 payload.
const MIN_ITEM_LEN: usize = 12;

/// Decodes a raw `_XSETTINGS_SETTINGS` property value.
///
/// Fails with [`FormatError`] when the header is short, the byte order marker
/// is unknown, any declared length runs past the buffer, a type tag is not
/// one of the three known types, or a name/string is not UTF-8. Bytes after
/// the last declared item are kept in [`SettingsBlob::trailing`].
pub fn decode(data: &[u8]) -> Result<SettingsBlob, FormatError> {
    if data.len() < HEADER_LEN {
        return Err(FormatError::Truncated {
            what: "header",
            offset: 0,
            needed: HEADER_LEN,
            remaining: data.len(),
        });
    }
    let byte_order = ByteOrder::from_marker(data[0]).ok_or(FormatError::InvalidByteOrder(data[0]))?;
    match byte_order {
        ByteOrder::LsbFirst => decode_with::<LittleEndian>(data, byte_order),
        ByteOrder::MsbFirst => decode_with::<BigEndian>(data, byte_order),
    }
}

fn decode_with<E: Endian>(data: &[u8], byte_order: ByteOrder) -> Result<SettingsBlob, FormatError> {
    let mut reader = Reader::<E>::new(data);
    reader.skip("header", 4)?;
    let serial = reader.u32("serial")?;
    let count = reader.u32("setting count")? as usize;

    // The count comes from the wire; do not trust it for the allocation.
    let mut items = Vec::with_capacity(count.min(reader.remaining() / MIN_ITEM_LEN));
    for _ in 0..count {
        items.push(read_item(&mut reader)?);
    }

    Ok(SettingsBlob {
        byte_order,
        serial,
        items,
        trailing: reader.rest().to_vec(),
    })
}

fn read_item<E: Endian>(reader: &mut Reader<'_, E>) -> Result<SettingItem, FormatError> {
    let tag_offset = reader.offset();
    let tag = reader.u8("type")?;
    let setting_type = SettingType::from_tag(tag).ok_or(FormatError::UnknownType { tag, offset: tag_offset })?;
    reader.skip("unused", 1)?;

    let name_len = reader.u16("name length")? as usize;
    let name = reader.padded_str("name", name_len)?;
    let serial = reader.u32("last-change serial")?;

    let value = match setting_type {
        SettingType::Integer => SettingValue::Integer(reader.i32("integer value")?),
        SettingType::String => {
            // libxsettings reads a CARD32 here; real-world managers agree.
            let len = reader.u32("string length")? as usize;
            SettingValue::String(reader.padded_str("string value", len)?)
        }
        SettingType::Color => {
            let red = reader.u16("color")?;
            let blue = reader.u16("color")?;
            let green = reader.u16("color")?;
            let alpha = reader.u16("color")?;
            SettingValue::Color(Color { red, green, blue, alpha })
        }
    };

    Ok(SettingItem { name, value, serial })
}

/// Bounds-checked cursor over the property bytes.
struct Reader<'a, E> {
    data: &'a [u8],
    pos: usize,
    _endian: std::marker::PhantomData<E>,
}

impl<'a, E: Endian> Reader<'a, E> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, _endian: std::marker::PhantomData }
    }

    fn offset(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn take(&mut self, what: &'static str, len: usize) -> Result<&'a [u8], FormatError> {
        if len > self.remaining() {
            return Err(FormatError::Truncated {
                what,
                offset: self.pos,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn skip(&mut self, what: &'static str, len: usize) -> Result<(), FormatError> {
        self.take(what, len).map(|_| ())
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, FormatError> {
        Ok(self.take(what, 1)?[0])
    }

    fn u16(&mut self, what: &'static str) -> Result<u16, FormatError> {
        Ok(E::read_u16(self.take(what, 2)?))
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, FormatError> {
        Ok(E::read_u32(self.take(what, 4)?))
    }

    fn i32(&mut self, what: &'static str) -> Result<i32, FormatError> {
        Ok(E::read_i32(self.take(what, 4)?))
    }

    /// Reads `len` bytes of UTF-8 followed by padding to a 4-byte boundary.
    fn padded_str(&mut self, what: &'static str, len: usize) -> Result<String, FormatError> {
        let offset = self.pos;
        let padded = len
            .checked_add(padding(len))
            .ok_or(FormatError::Truncated { what, offset, needed: usize::MAX, remaining: self.remaining() })?;
        let bytes = self.take(what, padded)?;
        std::str::from_utf8(&bytes[..len])
            .map(str::to_owned)
            .map_err(|_| FormatError::InvalidUtf8 { what, offset })
    }
}
