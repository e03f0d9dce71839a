//! Helpers for decoding LEB128-encoded integers out of a byte slice.
//!
//! Every decoder takes the slice and a cursor. The cursor only moves when a
//! value was decoded completely; running off the end of the slice reports
//! `UnexpectedEnd` so a caller holding a partial buffer can retry later.
//!
//! <https://en.wikipedia.org/wiki/LEB128>
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeU32Error {
    #[error("uint32 too large")]
    TooLarge,

    #[error("uint32 representation too long")]
    RepresentationTooLong,

    #[error("unexpected end of input while decoding uint32")]
    UnexpectedEnd,
}

pub fn decode_u32(bytes: &[u8], pos: &mut usize) -> Result<u32, DecodeU32Error> {
    let mut cursor = *pos;
    let mut result: u32 = 0;
    let mut shift: u8 = 0;

    // 5 == ceil(32/7)
    for i in 1..=5 {
        let byte = *bytes.get(cursor).ok_or(DecodeU32Error::UnexpectedEnd)?;
        cursor += 1;

        result |= u32::from(byte & 0b0111_1111 /* 0x7F */) << shift;

        let continuation_bit = byte & 0b1000_0000 /* 0x80 */;
        if continuation_bit == 0 {
            if i == 5 && (byte & 0b1111_0000/* 0xF0 */) != 0 {
                // byte 5 only has room for the 4 high bits of the payload
                return Err(DecodeU32Error::TooLarge);
            }
            *pos = cursor;
            return Ok(result);
        }

        shift += 7;
    }

    Err(DecodeU32Error::RepresentationTooLong)
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeU64Error {
    #[error("uint64 too large")]
    TooLarge,

    #[error("uint64 representation too long")]
    RepresentationTooLong,

    #[error("unexpected end of input while decoding uint64")]
    UnexpectedEnd,
}

pub fn decode_u64(bytes: &[u8], pos: &mut usize) -> Result<u64, DecodeU64Error> {
    let mut cursor = *pos;
    let mut result: u64 = 0;
    let mut shift: u8 = 0;

    // 10 == ceil(64/7)
    for i in 1..=10 {
        let byte = *bytes.get(cursor).ok_or(DecodeU64Error::UnexpectedEnd)?;
        cursor += 1;

        result |= u64::from(byte & 0b0111_1111 /* 0x7F */) << shift;

        if byte & 0b1000_0000 /* 0x80 */ == 0 {
            if i == 10 && (byte & 0b1111_1110) != 0 {
                return Err(DecodeU64Error::TooLarge);
            }
            *pos = cursor;
            return Ok(result);
        }

        shift += 7;
    }

    Err(DecodeU64Error::RepresentationTooLong)
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeI32Error {
    #[error("int32 too large")]
    TooLarge,

    #[error("int32 representation too long")]
    RepresentationTooLong,

    #[error("unexpected end of input while decoding int32")]
    UnexpectedEnd,
}

pub fn decode_i32(bytes: &[u8], pos: &mut usize) -> Result<i32, DecodeI32Error> {
    let mut cursor = *pos;
    let mut result: i64 = 0;
    let mut shift: u8 = 0;

    // 5 == ceil(32/7)
    for _ in 1..=5 {
        let byte = *bytes.get(cursor).ok_or(DecodeI32Error::UnexpectedEnd)?;
        cursor += 1;

        result |= i64::from(byte & 0b0111_1111 /* 0x7F */) << shift;
        shift += 7;

        if byte & 0b1000_0000 /* 0x80 */ == 0 {
            if (byte & 0b0100_0000/* 0x40 */) != 0 {
                result |= !0 << shift;
            }

            let value = i32::try_from(result).map_err(|_| DecodeI32Error::TooLarge)?;
            *pos = cursor;
            return Ok(value);
        }
    }

    Err(DecodeI32Error::RepresentationTooLong)
}

/// Decodes a signed 33-bit integer, as used by block types and heap types
/// where negative values name built-in types and non-negative values are
/// type indices.
pub fn decode_s33(bytes: &[u8], pos: &mut usize) -> Result<i64, DecodeI32Error> {
    let mut cursor = *pos;
    let mut result: i64 = 0;
    let mut shift: u8 = 0;

    const MIN: i64 = -(1 << 32);
    const MAX: i64 = (1 << 32) - 1;

    for _ in 1..=5 {
        let byte = *bytes.get(cursor).ok_or(DecodeI32Error::UnexpectedEnd)?;
        cursor += 1;

        result |= i64::from(byte & 0b0111_1111) << shift;
        shift += 7;

        if byte & 0b1000_0000 == 0 {
            if (byte & 0b0100_0000) != 0 {
                result |= !0 << shift;
            }
            if !(MIN..=MAX).contains(&result) {
                return Err(DecodeI32Error::TooLarge);
            }
            *pos = cursor;
            return Ok(result);
        }
    }

    Err(DecodeI32Error::RepresentationTooLong)
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeI64Error {
    #[error("int64 representation too long")]
    RepresentationTooLong,

    #[error("int64 incorrect sign extension")]
    IncorrectSignExtension,

    #[error("unexpected end of input while decoding int64")]
    UnexpectedEnd,
}

pub fn decode_i64(bytes: &[u8], pos: &mut usize) -> Result<Int64, DecodeI64Error> {
    let mut cursor = *pos;
    let mut result: i64 = 0;
    let mut shift: u8 = 0;

    // 10 == ceil(64/7)
    for _ in 1..=10 {
        let byte = *bytes.get(cursor).ok_or(DecodeI64Error::UnexpectedEnd)?;
        cursor += 1;

        result |= i64::from(byte & 0b0111_1111 /* 0x7F */) << shift;
        shift += 7;

        if byte & 0b1000_0000 /* 0x80 */ == 0 {
            let on_10th_byte = shift >= 64;
            let is_negative = (byte & 0b0100_0000/* 0x40 */) != 0;

            if on_10th_byte {
                // the 10th byte carries a single payload bit; the remaining
                // six must repeat the sign
                let padding = byte & 0b0011_1111 /* 0x3F */;
                if (is_negative && padding != 0b0011_1111) || (!is_negative && padding != 0) {
                    return Err(DecodeI64Error::IncorrectSignExtension);
                }
            } else if is_negative {
                result |= !0 << shift;
            }

            *pos = cursor;
            return Ok(Int64::from(result));
        }
    }

    Err(DecodeI64Error::RepresentationTooLong)
}

/// A 64-bit integer literal, kept as its 8-byte little-endian two's
/// complement representation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Int64 {
    data: [u8; 8],
}

impl Int64 {
    pub const fn from_le_bytes(data: [u8; 8]) -> Self {
        Int64 { data }
    }

    pub const fn data(&self) -> &[u8; 8] {
        &self.data
    }

    pub const fn to_i64(self) -> i64 {
        i64::from_le_bytes(self.data)
    }

    /// The low 32 bits, reinterpreted as a signed integer.
    pub const fn to_int32(self) -> i32 {
        i32::from_le_bytes([self.data[0], self.data[1], self.data[2], self.data[3]])
    }

    /// The nearest double to the literal. Precision is lost beyond 2^53.
    pub fn to_double(self) -> f64 {
        self.to_i64() as f64
    }
}

impl From<i64> for Int64 {
    fn from(value: i64) -> Self {
        Int64 {
            data: value.to_le_bytes(),
        }
    }
}

impl fmt::Display for Int64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_i64())
    }
}

impl fmt::Debug for Int64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Int64({})", self.to_i64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_u32(mut value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
                out.push(byte);
            } else {
                out.push(byte);
                break;
            }
        }
        out
    }

    fn encode_sleb64(mut value: i64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            let done = (value == 0 && (byte & 0x40) == 0) || (value == -1 && (byte & 0x40) != 0);
            if done {
                out.push(byte);
                break;
            } else {
                byte |= 0x80;
                out.push(byte);
            }
        }
        out
    }

    fn read_u32_from(bytes: &[u8]) -> Result<u32, DecodeU32Error> {
        decode_u32(bytes, &mut 0)
    }

    fn read_i32_from(bytes: &[u8]) -> Result<i32, DecodeI32Error> {
        decode_i32(bytes, &mut 0)
    }

    fn read_i64_from(bytes: &[u8]) -> Result<i64, DecodeI64Error> {
        decode_i64(bytes, &mut 0).map(Int64::to_i64)
    }

    #[test]
    fn read_u32_decodes_simple_values() {
        for value in [0, 1, 127, 128, 624_485, u32::MAX] {
            assert_eq!(read_u32_from(&encode_u32(value)), Ok(value));
        }
    }

    #[test]
    fn read_u32_advances_cursor_past_value_only() {
        let bytes = [0xE5, 0x8E, 0x26, 0xFF];
        let mut pos = 0;
        assert_eq!(decode_u32(&bytes, &mut pos), Ok(624_485));
        assert_eq!(pos, 3);
    }

    #[test]
    fn read_u32_reports_truncation_without_moving() {
        let bytes = [0xE5, 0x8E];
        let mut pos = 0;
        assert_eq!(
            decode_u32(&bytes, &mut pos),
            Err(DecodeU32Error::UnexpectedEnd)
        );
        assert_eq!(pos, 0);
    }

    #[test]
    fn read_u32_rejects_too_large() {
        assert_eq!(
            read_u32_from(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F]),
            Err(DecodeU32Error::TooLarge)
        );
    }

    #[test]
    fn read_u32_rejects_representation_too_long() {
        assert_eq!(
            read_u32_from(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00]),
            Err(DecodeU32Error::RepresentationTooLong)
        );
    }

    #[test]
    fn read_i32_sign_extends_terminal_group() {
        assert_eq!(read_i32_from(&[0x7F]), Ok(-1));
        assert_eq!(read_i32_from(&[0x40]), Ok(-64));
        assert_eq!(read_i32_from(&[0x3F]), Ok(63));
        assert_eq!(read_i32_from(&[0x80, 0x7F]), Ok(-128));
        assert_eq!(
            read_i32_from(&[0x80, 0x80, 0x80, 0x80, 0x78]),
            Ok(i32::MIN)
        );
    }

    #[test]
    fn read_i32_rejects_out_of_range() {
        assert_eq!(
            read_i32_from(&[0x80, 0x80, 0x80, 0x80, 0x08]),
            Err(DecodeI32Error::TooLarge)
        );
    }

    #[test]
    fn read_i64_decodes_extremes() {
        for value in [0, 1, -1, 42, -43, i64::MAX, i64::MIN, 1 << 53, -(1 << 40)] {
            assert_eq!(read_i64_from(&encode_sleb64(value)), Ok(value));
        }
    }

    #[test]
    fn read_i64_rejects_bad_sign_extension() {
        let bytes = [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x41];
        assert_eq!(
            read_i64_from(&bytes),
            Err(DecodeI64Error::IncorrectSignExtension)
        );
    }

    #[test]
    fn read_s33_distinguishes_type_codes_from_indices() {
        assert_eq!(decode_s33(&[0x40], &mut 0), Ok(-64));
        assert_eq!(decode_s33(&[0x7F], &mut 0), Ok(-1));
        assert_eq!(decode_s33(&[0x05], &mut 0), Ok(5));
        assert_eq!(
            decode_s33(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F], &mut 0),
            Ok(u32::MAX as i64)
        );
    }

    #[test]
    fn int64_conversions() {
        let value = Int64::from(-2);
        assert_eq!(value.data(), &[0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(value.to_int32(), -2);
        assert_eq!(value.to_double(), -2.0);
        assert_eq!(value.to_string(), "-2");

        let big = Int64::from(i64::MIN);
        assert_eq!(big.to_string(), "-9223372036854775808");
        assert_eq!(big.to_int32(), 0);
    }
}
