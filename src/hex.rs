//! Hex formatting for traffic dumps and hex parsing for the command line.

use std::fmt::Write;
use thiserror::Error;

/// Two lowercase hex digits per byte, separated by single spaces.
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, b) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HexError {
    #[error("invalid hex byte '{0}'")]
    InvalidByte(String),
}

/// Parse `"01 02 ff"`, `"0102ff"` or `"0x01,0x02"` into bytes.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, HexError> {
    let mut out = Vec::new();
    for token in input.split(|c: char| c.is_whitespace() || c == ',' || c == ':') {
        let token = token.trim_start_matches("0x").trim_start_matches("0X");
        if token.is_empty() {
            continue;
        }
        if token.len() % 2 != 0 {
            return Err(HexError::InvalidByte(token.to_string()));
        }
        for chunk in token.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| HexError::InvalidByte(token.to_string()))?;
            let byte = u8::from_str_radix(pair, 16)
                .map_err(|_| HexError::InvalidByte(pair.to_string()))?;
            out.push(byte);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_hex_dump() {
        assert_eq!(hex_dump(&[]), "");
        assert_eq!(hex_dump(&[0x01, 0x02, 0xab]), "01 02 ab");
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(parse_hex("01 02 ff").unwrap(), vec![1, 2, 255]);
        assert_eq!(parse_hex("0102ff").unwrap(), vec![1, 2, 255]);
        assert_eq!(parse_hex("0x01,0x02").unwrap(), vec![1, 2]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_hex("1").is_err());
        assert_eq!(parse_hex("zz"), Err(HexError::InvalidByte("zz".into())));
    }

    proptest! {
        #[test]
        fn dump_is_three_chars_per_byte(data in proptest::collection::vec(any::<u8>(), 1..64)) {
            let dump = hex_dump(&data);
            prop_assert_eq!(dump.len(), data.len() * 3 - 1);
            prop_assert_eq!(parse_hex(&dump).unwrap(), data);
        }
    }
}
