// Big-endian binary codec, parameterized by the connection's negotiated
// IDSizes.
//
// JDWP identifier widths (field/method/object/reference-type/frame) are not
// fixed at compile time; they are negotiated with the peer immediately after
// the handshake via VirtualMachine.IDSizes. Every id-shaped value is read and
// written through `IdSizes` rather than a hardcoded width.

mod tag;
mod value;

pub use tag::Tag;
pub use value::{decode_tagged, Value, ValueData};

use crate::error::{JdwpError, JdwpResult};
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

/// Widths, in bytes, of the five identifier kinds used throughout JDWP.
/// Negotiated once per connection via `VirtualMachine.IDSizes` and never
/// revised afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSizes {
    pub field_id_size: u32,
    pub method_id_size: u32,
    pub object_id_size: u32,
    pub reference_type_id_size: u32,
    pub frame_id_size: u32,
}

impl IdSizes {
    /// The width the JVM almost always reports, and the one a caller needing
    /// a size ahead of the handshake (none should) would fall back to.
    pub const ALL_EIGHT: IdSizes = IdSizes {
        field_id_size: 8,
        method_id_size: 8,
        object_id_size: 8,
        reference_type_id_size: 8,
        frame_id_size: 8,
    };

    fn validate_width(width: u32) -> JdwpResult<usize> {
        match width {
            1 | 2 | 4 | 8 => Ok(width as usize),
            other => Err(JdwpError::Codec(format!("invalid id width: {other}"))),
        }
    }

    pub fn field_width(&self) -> JdwpResult<usize> {
        Self::validate_width(self.field_id_size)
    }
    pub fn method_width(&self) -> JdwpResult<usize> {
        Self::validate_width(self.method_id_size)
    }
    pub fn object_width(&self) -> JdwpResult<usize> {
        Self::validate_width(self.object_id_size)
    }
    pub fn reference_type_width(&self) -> JdwpResult<usize> {
        Self::validate_width(self.reference_type_id_size)
    }
    pub fn frame_width(&self) -> JdwpResult<usize> {
        Self::validate_width(self.frame_id_size)
    }
}

/// Which of the five id kinds a value belongs to; used to pick the right
/// width out of `IdSizes` at a single call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Field,
    Method,
    Object,
    ReferenceType,
    Frame,
}

impl IdKind {
    fn width(self, sizes: &IdSizes) -> JdwpResult<usize> {
        match self {
            IdKind::Field => sizes.field_width(),
            IdKind::Method => sizes.method_width(),
            IdKind::Object => sizes.object_width(),
            IdKind::ReferenceType => sizes.reference_type_width(),
            IdKind::Frame => sizes.frame_width(),
        }
    }
}

/// Reads an id of the given kind, zero-extended into a 64-bit carrier.
pub fn read_id(buf: &mut &[u8], sizes: &IdSizes, kind: IdKind) -> JdwpResult<u64> {
    let width = kind.width(sizes)?;
    if buf.remaining() < width {
        return Err(JdwpError::Codec(format!(
            "not enough data for {width}-byte id: {} remaining",
            buf.remaining()
        )));
    }
    let mut value: u64 = 0;
    for _ in 0..width {
        value = (value << 8) | buf.get_u8() as u64;
    }
    Ok(value)
}

/// Writes an id of the given kind. Fails if `value` has bits set above the
/// negotiated width.
pub fn write_id(out: &mut Vec<u8>, sizes: &IdSizes, kind: IdKind, value: u64) -> JdwpResult<()> {
    let width = kind.width(sizes)?;
    if width < 8 {
        let max = (1u128 << (width * 8)) - 1;
        if (value as u128) > max {
            return Err(JdwpError::Codec(format!(
                "id {value:#x} does not fit in {width}-byte width"
            )));
        }
    }
    for shift in (0..width).rev() {
        out.put_u8(((value >> (shift * 8)) & 0xff) as u8);
    }
    Ok(())
}

pub fn read_u8(buf: &mut &[u8]) -> JdwpResult<u8> {
    need(buf, 1)?;
    Ok(buf.get_u8())
}

pub fn read_i8(buf: &mut &[u8]) -> JdwpResult<i8> {
    need(buf, 1)?;
    Ok(buf.get_i8())
}

pub fn read_bool(buf: &mut &[u8]) -> JdwpResult<bool> {
    Ok(read_u8(buf)? != 0)
}

pub fn read_u16(buf: &mut &[u8]) -> JdwpResult<u16> {
    need(buf, 2)?;
    Ok(buf.get_u16())
}

pub fn read_i16(buf: &mut &[u8]) -> JdwpResult<i16> {
    need(buf, 2)?;
    Ok(buf.get_i16())
}

pub fn read_u32(buf: &mut &[u8]) -> JdwpResult<u32> {
    need(buf, 4)?;
    Ok(buf.get_u32())
}

pub fn read_i32(buf: &mut &[u8]) -> JdwpResult<i32> {
    need(buf, 4)?;
    Ok(buf.get_i32())
}

pub fn read_u64(buf: &mut &[u8]) -> JdwpResult<u64> {
    need(buf, 8)?;
    Ok(buf.get_u64())
}

pub fn read_i64(buf: &mut &[u8]) -> JdwpResult<i64> {
    need(buf, 8)?;
    Ok(buf.get_i64())
}

pub fn read_f32(buf: &mut &[u8]) -> JdwpResult<f32> {
    need(buf, 4)?;
    Ok(buf.get_f32())
}

pub fn read_f64(buf: &mut &[u8]) -> JdwpResult<f64> {
    need(buf, 8)?;
    Ok(buf.get_f64())
}

/// JDWP strings are a u32 length prefix followed by (modified) UTF-8 bytes.
/// We treat the payload as arbitrary UTF-8, not a NUL-terminated C string, per
/// spec's open question about embedded NULs.
pub fn read_string(buf: &mut &[u8]) -> JdwpResult<String> {
    let len = read_u32(buf)? as usize;
    need(buf, len)?;
    let bytes = buf[..len].to_vec();
    buf.advance(len);
    String::from_utf8(bytes).map_err(|e| JdwpError::Codec(format!("invalid UTF-8 in string: {e}")))
}

pub fn write_string(out: &mut Vec<u8>, s: &str) {
    out.put_u32(s.len() as u32);
    out.extend_from_slice(s.as_bytes());
}

/// Reads `len` raw bytes, failing rather than panicking if the buffer is
/// shorter than claimed (e.g. a truncated `Method.Bytecodes` reply).
pub fn read_bytes(buf: &mut &[u8], len: usize) -> JdwpResult<Vec<u8>> {
    need(buf, len)?;
    let bytes = buf[..len].to_vec();
    buf.advance(len);
    Ok(bytes)
}

fn need(buf: &[u8], n: usize) -> JdwpResult<()> {
    if buf.len() < n {
        Err(JdwpError::Codec(format!(
            "not enough data: need {n}, have {}",
            buf.len()
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips_at_every_valid_width() {
        for width in [1u32, 2, 4, 8] {
            let sizes = IdSizes {
                field_id_size: width,
                method_id_size: width,
                object_id_size: width,
                reference_type_id_size: width,
                frame_id_size: width,
            };
            let max = if width == 8 {
                u64::MAX
            } else {
                (1u64 << (width * 8)) - 1
            };
            for &value in &[0u64, 1, max] {
                let mut out = Vec::new();
                write_id(&mut out, &sizes, IdKind::Object, value).unwrap();
                assert_eq!(out.len(), width as usize);
                let mut slice = out.as_slice();
                let decoded = read_id(&mut slice, &sizes, IdKind::Object).unwrap();
                assert_eq!(decoded, value);
            }
        }
    }

    #[test]
    fn id_write_rejects_value_outside_width() {
        let sizes = IdSizes {
            field_id_size: 1,
            method_id_size: 1,
            object_id_size: 1,
            reference_type_id_size: 1,
            frame_id_size: 1,
        };
        let mut out = Vec::new();
        assert!(write_id(&mut out, &sizes, IdKind::Object, 256).is_err());
    }

    #[test]
    fn id_read_rejects_invalid_width() {
        let sizes = IdSizes {
            field_id_size: 3,
            method_id_size: 3,
            object_id_size: 3,
            reference_type_id_size: 3,
            frame_id_size: 3,
        };
        let mut data: &[u8] = &[0, 0, 0];
        assert!(read_id(&mut data, &sizes, IdKind::Object).is_err());
    }

    #[test]
    fn string_round_trips_unicode() {
        let mut out = Vec::new();
        write_string(&mut out, "Hello, 世界");
        let mut slice = out.as_slice();
        assert_eq!(read_string(&mut slice).unwrap(), "Hello, 世界");
    }

    #[test]
    fn string_decode_fails_on_truncated_payload() {
        let mut out = Vec::new();
        out.put_u32(10);
        out.extend_from_slice(b"short");
        let mut slice = out.as_slice();
        assert!(read_string(&mut slice).is_err());
    }

    #[test]
    fn read_bytes_fails_rather_than_panics_on_truncated_payload() {
        let data = [1u8, 2, 3];
        let mut slice = data.as_slice();
        assert!(read_bytes(&mut slice, 10).is_err());
    }

    #[test]
    fn read_bytes_round_trips() {
        let data = [1u8, 2, 3, 4];
        let mut slice = data.as_slice();
        assert_eq!(read_bytes(&mut slice, 3).unwrap(), vec![1, 2, 3]);
        assert_eq!(slice, &[4]);
    }
}
