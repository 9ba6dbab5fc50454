//! Small helpers shared by the codec layer and the public API: hex/byte
//! conversion for OCTET STRING's `HexString` convenience shape (§4.2, §6).

use crate::error::{EncodeError, EncodeErrorKind};

/// Parses a hex string into bytes, stripping every character that isn't a
/// hex digit (whitespace, `:`, `-`, a `0x` prefix, ...) so callers can
/// paste hex dumps verbatim. The only failure is an odd number of
/// remaining hex digits.
pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>, EncodeError> {
    let digits: Vec<u8> = text.chars().filter_map(|c| c.to_digit(16)).map(|d| d as u8).collect();

    if digits.len() % 2 != 0 {
        return Err(EncodeError::new(EncodeErrorKind::OddLengthHex));
    }

    Ok(digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

/// Renders `bytes` as lowercase hex, two characters per byte.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_hex() {
        assert_eq!(hex_to_bytes("01020304").unwrap(), vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn ignores_separators() {
        assert_eq!(hex_to_bytes("01:02-03 04").unwrap(), vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn rejects_odd_length() {
        let err = hex_to_bytes("010").unwrap_err();
        assert!(matches!(*err.kind, EncodeErrorKind::OddLengthHex));
    }

    #[test]
    fn strips_non_hex_characters_entirely() {
        assert_eq!(hex_to_bytes("0x1cafe").unwrap(), vec![0x01, 0xCA, 0xFE]);
        assert_eq!(hex_to_bytes("01,02").unwrap(), vec![0x01, 0x02]);
        assert_eq!(hex_to_bytes("zz").unwrap(), vec![]);
    }

    #[test]
    fn bytes_round_trip_through_hex() {
        let bytes = vec![0xDE, 0xAD, 0xBE, 0xEF];
        let hex = bytes_to_hex(&bytes);
        assert_eq!(hex, "deadbeef");
        assert_eq!(hex_to_bytes(&hex).unwrap(), bytes);
    }
}
