use byteorder::{BigEndian, ByteOrder as Endian, LittleEndian};

use super::{padding, HEADER_LEN};
use crate::types::{ByteOrder, SettingItem, SettingValue, SettingsBlob};

/// Encodes a blob into the `_XSETTINGS_SETTINGS` wire layout.
///
/// Items are written in the order given, using the blob's byte order.
/// Padding is zero-filled and [`SettingsBlob::trailing`] is appended verbatim.
///
/// Names longer than `u16::MAX` bytes cannot be represented; callers validate
/// names before they enter a blob.
pub fn encode(blob: &SettingsBlob) -> Vec<u8> {
    match blob.byte_order {
        ByteOrder::LsbFirst => encode_with::<LittleEndian>(blob),
        ByteOrder::MsbFirst => encode_with::<BigEndian>(blob),
    }
}

fn encode_with<E: Endian>(blob: &SettingsBlob) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + blob.items.len() * 32 + blob.trailing.len());
    out.extend_from_slice(&[blob.byte_order.marker(), 0, 0, 0]);
    put_u32::<E>(&mut out, blob.serial);
    put_u32::<E>(&mut out, blob.items.len() as u32);

    for item in &blob.items {
        write_item::<E>(&mut out, item);
    }

    out.extend_from_slice(&blob.trailing);
    out
}

fn write_item<E: Endian>(out: &mut Vec<u8>, item: &SettingItem) {
    out.extend_from_slice(&[item.setting_type().tag(), 0]);
    put_u16::<E>(out, item.name.len() as u16);
    put_padded(out, item.name.as_bytes());
    put_u32::<E>(out, item.serial);

    match &item.value {
        SettingValue::Integer(v) => {
            let mut buf = [0u8; 4];
            E::write_i32(&mut buf, *v);
            out.extend_from_slice(&buf);
        }
        SettingValue::String(s) => {
            put_u32::<E>(out, s.len() as u32);
            put_padded(out, s.as_bytes());
        }
        SettingValue::Color(c) => {
            for channel in [c.red, c.blue, c.green, c.alpha] {
                put_u16::<E>(out, channel);
            }
        }
    }
}

fn put_u16<E: Endian>(out: &mut Vec<u8>, v: u16) {
    let mut buf = [0u8; 2];
    E::write_u16(&mut buf, v);
    out.extend_from_slice(&buf);
}

fn put_u32<E: Endian>(out: &mut Vec<u8>, v: u32) {
    let mut buf = [0u8; 4];
    E::write_u32(&mut buf, v);
    out.extend_from_slice(&buf);
}

fn put_padded(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(bytes);
    out.resize(out.len() + padding(bytes.len()), 0);
}
