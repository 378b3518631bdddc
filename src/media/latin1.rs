// SPDX-License-Identifier: GPL-3.0-only

//! ISO-8859-1 (Latin-1) text codec
//!
//! Every byte maps to the code point of the same value, so decoding never
//! fails and encoding is its exact inverse for text in U+0000..=U+00FF.

use crate::errors::EncodingError;

/// Encode text as one byte per character
///
/// Fails on the first character above U+00FF instead of substituting it,
/// so a payload is never altered silently.
pub fn encode(text: &str) -> Result<Vec<u8>, EncodingError> {
    let mut bytes = Vec::with_capacity(text.len());
    for (index, character) in text.chars().enumerate() {
        let code = character as u32;
        if code > 0xFF {
            return Err(EncodingError { character, index });
        }
        bytes.push(code as u8);
    }
    Ok(bytes)
}

/// Decode bytes as Latin-1 text
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_identity() {
        assert_eq!(encode("HC1:6BF").unwrap(), b"HC1:6BF".to_vec());
    }

    #[test]
    fn test_high_half_maps_to_single_bytes() {
        let bytes = encode("ção\u{00FF}").unwrap();
        assert_eq!(bytes, vec![0xE7, 0xE3, 0x6F, 0xFF]);
    }

    #[test]
    fn test_round_trip_full_range() {
        let text: String = (0u32..=0xFF).filter_map(char::from_u32).collect();
        let bytes = encode(&text).unwrap();
        assert_eq!(bytes.len(), 256);
        assert_eq!(decode(&bytes), text);
    }

    #[test]
    fn test_decode_then_encode_preserves_binary() {
        let raw: Vec<u8> = vec![0x00, 0x80, 0x9F, 0xC3, 0xA9, 0xFF, 0x0A];
        assert_eq!(encode(&decode(&raw)).unwrap(), raw);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let err = encode("ok€").unwrap_err();
        assert_eq!(err.character, '€');
        assert_eq!(err.index, 2);
    }

    #[test]
    fn test_empty() {
        assert!(encode("").unwrap().is_empty());
        assert_eq!(decode(&[]), "");
    }
}
