//! Tag/length octet framing and signed-integer two's-complement encoding
//! (§4.1). These are pure functions over byte buffers; codecs in
//! `crate::codec` build on top of them but never touch a raw byte
//! themselves.

use crate::error::{DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind};
use crate::tag::{Class, Tag};
use num_bigint::BigInt;
use num_traits::Zero;

const MAX_TAG_CONTINUATION_OCTETS: u32 = 6;
const MAX_LENGTH_OCTETS: u8 = 4;

/// Appends the BER identifier octet(s) for `tag`, encoding `constructed`
/// in bit 6 of the leading octet.
pub fn encode_tag(out: &mut Vec<u8>, tag: Tag, constructed: bool) {
    let class_bits = tag.class.bits() << 6;
    let constructed_bit = if constructed { 0b0010_0000 } else { 0 };
    if tag.value < 31 {
        out.push(class_bits | constructed_bit | tag.value as u8);
        return;
    }

    out.push(class_bits | constructed_bit | 0x1F);
    let mut digits = Vec::new();
    let mut n = tag.value;
    digits.push((n & 0x7F) as u8);
    n >>= 7;
    while n > 0 {
        digits.push((n & 0x7F) as u8 | 0x80);
        n >>= 7;
    }
    digits.reverse();
    out.extend_from_slice(&digits);
}

/// Decodes a BER identifier octet (or octets) starting at `offset`.
/// Returns `(tag, is_constructed, bytes_consumed)`.
pub fn decode_tag(input: &[u8], offset: usize) -> Result<(Tag, bool, usize), DecodeError> {
    let first = *input
        .get(offset)
        .ok_or_else(|| DecodeError::new(DecodeErrorKind::UnexpectedEof { needed: 1 }, offset))?;
    let class = Class::from_bits(first >> 6);
    let constructed = first & 0b0010_0000 != 0;
    let low = first & 0x1F;

    if low != 0x1F {
        return Ok((Tag::new(class, low as u32), constructed, 1));
    }

    let mut value: u32 = 0;
    let mut consumed = 1usize;
    let mut continuations = 0u32;
    loop {
        if continuations >= MAX_TAG_CONTINUATION_OCTETS {
            return Err(DecodeError::new(DecodeErrorKind::TagTooLarge, offset));
        }
        let byte = *input.get(offset + consumed).ok_or_else(|| {
            DecodeError::new(DecodeErrorKind::UnexpectedEof { needed: 1 }, offset + consumed)
        })?;
        consumed += 1;
        continuations += 1;
        value = value
            .checked_shl(7)
            .and_then(|v| v.checked_add((byte & 0x7F) as u32))
            .ok_or_else(|| DecodeError::new(DecodeErrorKind::TagTooLarge, offset))?;
        if byte & 0x80 == 0 {
            break;
        }
    }

    Ok((Tag::new(class, value), constructed, consumed))
}

/// Appends the BER definite-form length octet(s) for `len`.
pub fn encode_length(out: &mut Vec<u8>, len: usize) -> Result<(), EncodeError> {
    if len <= 127 {
        out.push(len as u8);
        return Ok(());
    }

    let mut bytes = Vec::new();
    let mut n = len;
    while n > 0 {
        bytes.push((n & 0xFF) as u8);
        n >>= 8;
    }
    bytes.reverse();
    if bytes.len() > MAX_LENGTH_OCTETS as usize {
        return Err(EncodeError::new(EncodeErrorKind::LengthTooLarge));
    }
    out.push(0x80 | bytes.len() as u8);
    out.extend_from_slice(&bytes);
    Ok(())
}

/// Decodes a BER definite-form length starting at `offset`. Returns
/// `(length, bytes_consumed)`.
pub fn decode_length(input: &[u8], offset: usize) -> Result<(usize, usize), DecodeError> {
    let first = *input
        .get(offset)
        .ok_or_else(|| DecodeError::new(DecodeErrorKind::UnexpectedEof { needed: 1 }, offset))?;

    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let count = first & 0x7F;
    if count == 0 {
        return Err(DecodeError::new(DecodeErrorKind::IndefiniteLength, offset));
    }
    if count > MAX_LENGTH_OCTETS {
        return Err(DecodeError::new(DecodeErrorKind::LengthTooLarge, offset));
    }

    let mut value: usize = 0;
    for i in 0..count as usize {
        let byte = *input.get(offset + 1 + i).ok_or_else(|| {
            DecodeError::new(DecodeErrorKind::UnexpectedEof { needed: 1 }, offset + 1 + i)
        })?;
        value = (value << 8) | byte as usize;
    }

    Ok((value, 1 + count as usize))
}

/// Minimal two's-complement encoding of a signed integer (§4.1).
///
/// `BigInt::to_signed_bytes_be` already returns the fewest-bytes
/// two's-complement form (a leading `0x00`/`0xFF` only when the next byte's
/// MSB would otherwise misrepresent the sign), so this is a thin wrapper
/// that only special-cases zero, which `to_signed_bytes_be` represents as
/// an empty slice.
pub fn encode_signed_integer(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        return vec![0x00];
    }
    value.to_signed_bytes_be()
}

/// Decodes minimal two's-complement content octets into a [`BigInt`].
pub fn decode_signed_integer(
    content: &[u8],
    offset: usize,
) -> Result<BigInt, DecodeError> {
    if content.is_empty() {
        return Err(DecodeError::new(DecodeErrorKind::EmptyInteger, offset));
    }
    Ok(BigInt::from_signed_bytes_be(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rt_tag(class: Class, constructed: bool, value: u32) {
        let mut buf = Vec::new();
        encode_tag(&mut buf, Tag::new(class, value), constructed);
        let (tag, c, consumed) = decode_tag(&buf, 0).unwrap();
        assert_eq!(tag, Tag::new(class, value));
        assert_eq!(c, constructed);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn tag_roundtrip_short_and_long_form() {
        rt_tag(Class::Universal, false, 2);
        rt_tag(Class::Context, true, 4);
        rt_tag(Class::Context, true, 30);
        rt_tag(Class::Context, true, 31);
        rt_tag(Class::Universal, false, 127);
        rt_tag(Class::Universal, false, 128);
        rt_tag(Class::Universal, false, 16384);
    }

    #[test]
    fn length_short_form() {
        let mut buf = Vec::new();
        encode_length(&mut buf, 4).unwrap();
        assert_eq!(buf, vec![0x04]);
        assert_eq!(decode_length(&buf, 0).unwrap(), (4, 1));
    }

    #[test]
    fn length_long_form() {
        let mut buf = Vec::new();
        encode_length(&mut buf, 1000).unwrap();
        assert_eq!(buf, vec![0x82, 0x03, 0xE8]);
        assert_eq!(decode_length(&buf, 0).unwrap(), (1000, 3));
    }

    #[test]
    fn length_rejects_indefinite() {
        let err = decode_length(&[0x80], 0).unwrap_err();
        assert!(matches!(*err.kind, DecodeErrorKind::IndefiniteLength));
    }

    #[test]
    fn length_rejects_too_large() {
        let err = decode_length(&[0x85, 1, 2, 3, 4, 5], 0).unwrap_err();
        assert!(matches!(*err.kind, DecodeErrorKind::LengthTooLarge));
    }

    #[test]
    fn integer_42_and_minus_42() {
        assert_eq!(encode_signed_integer(&BigInt::from(42)), vec![0x2A]);
        assert_eq!(encode_signed_integer(&BigInt::from(-42)), vec![0xD6]);
        assert_eq!(encode_signed_integer(&BigInt::from(0)), vec![0x00]);
        assert_eq!(encode_signed_integer(&BigInt::from(127)), vec![0x7F]);
        assert_eq!(encode_signed_integer(&BigInt::from(128)), vec![0x00, 0x80]);
        assert_eq!(encode_signed_integer(&BigInt::from(-128)), vec![0x80]);
        assert_eq!(encode_signed_integer(&BigInt::from(-129)), vec![0xFF, 0x7F]);
    }

    #[test]
    fn integer_roundtrip() {
        for value in [0, 1, -1, 42, -42, 127, 128, -128, -129, i64::MAX as i128, i64::MIN as i128]
        {
            let big = BigInt::from(value);
            let encoded = encode_signed_integer(&big);
            let decoded = decode_signed_integer(&encoded, 0).unwrap();
            assert_eq!(decoded, big);
        }
    }

    #[test]
    fn empty_integer_content_is_a_decode_error() {
        let err = decode_signed_integer(&[], 0).unwrap_err();
        assert!(matches!(*err.kind, DecodeErrorKind::EmptyInteger));
    }
}
