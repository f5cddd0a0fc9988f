//! Exact little-endian codec over generic byte streams.
//!
//! The concrete transport is whatever implements `std::io::Read`/`Write`: a
//! file, a socket, or an in-memory buffer. Integers are fixed-width
//! little-endian; floats are IEEE-754 binary32 bit patterns, so every value
//! round-trips bit-exactly. There is no framing or versioning at this layer;
//! the surrounding container (replay file, network message) owns both.

use std::io::{self, Read, Write};

use glam::Vec2;

use crate::sim::PlayerSide;

/// Types that serialize field-by-field in a fixed documented order.
pub trait StreamCodec: Sized {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()>;
    fn decode<R: Read>(reader: &mut R) -> io::Result<Self>;
}

pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> io::Result<()> {
    writer.write_all(&[value])
}

pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

pub fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn write_f32<W: Write>(writer: &mut W, value: f32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

pub fn read_f32<R: Read>(reader: &mut R) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

pub fn write_bool<W: Write>(writer: &mut W, value: bool) -> io::Result<()> {
    write_u8(writer, value as u8)
}

pub fn read_bool<R: Read>(reader: &mut R) -> io::Result<bool> {
    match read_u8(reader)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid boolean byte {other:#04x}"),
        )),
    }
}

pub fn write_vec2<W: Write>(writer: &mut W, value: Vec2) -> io::Result<()> {
    write_f32(writer, value.x)?;
    write_f32(writer, value.y)
}

pub fn read_vec2<R: Read>(reader: &mut R) -> io::Result<Vec2> {
    let x = read_f32(reader)?;
    let y = read_f32(reader)?;
    Ok(Vec2::new(x, y))
}

/// Side bytes: 0 = left, 1 = right, 2 = no side.
pub fn write_side<W: Write>(writer: &mut W, side: Option<PlayerSide>) -> io::Result<()> {
    let byte = match side {
        Some(PlayerSide::Left) => 0,
        Some(PlayerSide::Right) => 1,
        None => 2,
    };
    write_u8(writer, byte)
}

pub fn read_side<R: Read>(reader: &mut R) -> io::Result<Option<PlayerSide>> {
    match read_u8(reader)? {
        0 => Ok(Some(PlayerSide::Left)),
        1 => Ok(Some(PlayerSide::Right)),
        2 => Ok(None),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid side byte {other:#04x}"),
        )),
    }
}

/// NUL-terminated string. The string must not contain interior NULs.
pub fn write_cstr<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    if value.as_bytes().contains(&0) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "string contains a NUL byte",
        ));
    }
    writer.write_all(value.as_bytes())?;
    write_u8(writer, 0)
}

pub fn read_cstr<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut bytes = Vec::new();
    loop {
        let byte = read_u8(reader)?;
        if byte == 0 {
            break;
        }
        bytes.push(byte);
    }
    String::from_utf8(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn primitives_round_trip() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0xDEAD_BEEF).unwrap();
        write_f32(&mut buf, -456.75).unwrap();
        write_bool(&mut buf, true).unwrap();
        write_vec2(&mut buf, Vec2::new(1.5, -2.25)).unwrap();
        write_side(&mut buf, Some(PlayerSide::Right)).unwrap();
        write_side(&mut buf, None).unwrap();

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_u32(&mut cursor).unwrap(), 0xDEAD_BEEF);
        assert_eq!(read_f32(&mut cursor).unwrap(), -456.75);
        assert!(read_bool(&mut cursor).unwrap());
        assert_eq!(read_vec2(&mut cursor).unwrap(), Vec2::new(1.5, -2.25));
        assert_eq!(read_side(&mut cursor).unwrap(), Some(PlayerSide::Right));
        assert_eq!(read_side(&mut cursor).unwrap(), None);
    }

    #[test]
    fn floats_round_trip_bit_exactly() {
        for value in [0.0f32, -0.0, f32::MAX, f32::MIN_POSITIVE, 455.5, 13.125] {
            let mut buf = Vec::new();
            write_f32(&mut buf, value).unwrap();
            let decoded = read_f32(&mut Cursor::new(buf)).unwrap();
            assert_eq!(decoded.to_bits(), value.to_bits());
        }
    }

    #[test]
    fn integers_are_little_endian() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0x0102_0304).unwrap();
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn cstr_round_trip_and_rejections() {
        let mut buf = Vec::new();
        write_cstr(&mut buf, "Player One").unwrap();
        assert_eq!(read_cstr(&mut Cursor::new(&buf)).unwrap(), "Player One");

        assert!(write_cstr(&mut Vec::new(), "bad\0name").is_err());

        // Unterminated string fails instead of inventing data.
        let unterminated = b"abc".to_vec();
        assert!(read_cstr(&mut Cursor::new(unterminated)).is_err());
    }

    #[test]
    fn invalid_enum_bytes_are_rejected() {
        assert!(read_bool(&mut Cursor::new(vec![7u8])).is_err());
        assert!(read_side(&mut Cursor::new(vec![9u8])).is_err());
    }
}
