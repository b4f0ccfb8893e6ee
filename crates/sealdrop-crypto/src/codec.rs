//! Byte, hex, base64url and text conversions.
//!
//! Hex is the relay wire encoding (ciphertext and IV in JSON bodies).
//! Base64url without padding is the fragment encoding, since it survives URLs
//! untouched.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::error::CryptoError;

/// Lowercase hex encoding.
pub fn hex_encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode hex of any (even) length. Accepts upper and lower case.
pub fn hex_decode(text: &str) -> Result<Vec<u8>, CryptoError> {
    hex::decode(text)
        .map_err(|e| CryptoError::InvalidEncoding { what: "hex", reason: e.to_string() })
}

/// Decode hex into exactly `N` bytes.
///
/// `what` names the field in the error.
pub fn hex_decode_array<const N: usize>(
    text: &str,
    what: &'static str,
) -> Result<[u8; N], CryptoError> {
    let bytes = hex_decode(text)?;
    to_array(&bytes, what)
}

/// Base64url encoding without padding.
pub fn base64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url without padding. Padded input is rejected.
pub fn base64url_decode(text: &str) -> Result<Vec<u8>, CryptoError> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| CryptoError::InvalidEncoding { what: "base64url", reason: e.to_string() })
}

/// UTF-8 bytes of a secret text.
pub fn text_to_bytes(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Interpret decrypted bytes as UTF-8 text.
pub fn bytes_to_text(bytes: Vec<u8>) -> Result<String, CryptoError> {
    String::from_utf8(bytes)
        .map_err(|e| CryptoError::InvalidEncoding { what: "utf-8", reason: e.to_string() })
}

/// Copy a slice into a fixed-size array, rejecting any other length.
pub fn to_array<const N: usize>(bytes: &[u8], what: &'static str) -> Result<[u8; N], CryptoError> {
    <[u8; N]>::try_from(bytes).map_err(|_| CryptoError::InvalidLength {
        what,
        expected: N,
        actual: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase() {
        assert_eq!(hex_encode(&[0xAB, 0x01, 0xFF]), "ab01ff");
    }

    #[test]
    fn hex_decode_accepts_uppercase() {
        assert_eq!(hex_decode("AB01ff").unwrap(), vec![0xAB, 0x01, 0xFF]);
    }

    #[test]
    fn hex_decode_rejects_odd_length() {
        assert!(matches!(hex_decode("abc"), Err(CryptoError::InvalidEncoding { what: "hex", .. })));
    }

    #[test]
    fn hex_decode_rejects_non_hex() {
        assert!(hex_decode("zz").is_err());
    }

    #[test]
    fn hex_decode_array_enforces_length() {
        let ok: [u8; 2] = hex_decode_array("0102", "iv").unwrap();
        assert_eq!(ok, [1, 2]);

        let err = hex_decode_array::<12>("0102", "iv").unwrap_err();
        assert_eq!(err, CryptoError::InvalidLength { what: "iv", expected: 12, actual: 2 });
    }

    #[test]
    fn base64url_uses_url_safe_alphabet() {
        // 0xFB 0xFF encodes to "+/8=" in the standard alphabet
        assert_eq!(base64url_encode(&[0xFB, 0xFF]), "-_8");
    }

    #[test]
    fn base64url_rejects_padding() {
        assert!(base64url_decode("-_8=").is_err());
        assert_eq!(base64url_decode("-_8").unwrap(), vec![0xFB, 0xFF]);
    }

    #[test]
    fn text_conversions() {
        assert_eq!(text_to_bytes("héllo"), "héllo".as_bytes());
        assert_eq!(bytes_to_text("héllo".as_bytes().to_vec()).unwrap(), "héllo");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = bytes_to_text(vec![0xFF, 0xFE]).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(hex_encode(&[]), "");
        assert_eq!(hex_decode("").unwrap(), Vec::<u8>::new());
        assert_eq!(base64url_decode("").unwrap(), Vec::<u8>::new());
    }
}
