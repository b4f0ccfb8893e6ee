//! Secret identifiers.
//!
//! An id is the only lookup key at the relay. It is 128 bits drawn from the
//! environment's CSPRNG, so ids cannot be enumerated or guessed.

use std::{fmt, str::FromStr};

use sealdrop_crypto::codec::{hex_decode_array, hex_encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::env::Environment;

/// Size of a secret id in bytes
pub const SECRET_ID_SIZE: usize = 16;

/// Length of the canonical hex rendering
pub const SECRET_ID_HEX_LEN: usize = SECRET_ID_SIZE * 2;

/// Opaque, unguessable identifier of a stored secret.
///
/// Displays and serializes as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretId([u8; SECRET_ID_SIZE]);

impl SecretId {
    /// Fresh random id.
    pub fn generate<E: Environment>(env: &E) -> Self {
        Self(env.random_array())
    }

    /// Wrap raw id bytes.
    pub fn from_bytes(bytes: [u8; SECRET_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw id bytes (storage key).
    pub fn as_bytes(&self) -> &[u8; SECRET_ID_SIZE] {
        &self.0
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex_encode(&self.0))
    }
}

impl FromStr for SecretId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != SECRET_ID_HEX_LEN {
            return Err(format!("expected {SECRET_ID_HEX_LEN} hex characters, got {}", s.len()));
        }
        // One spelling per id
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err("secret id must be lowercase hex".to_string());
        }
        hex_decode_array(s, "secret id").map(Self).map_err(|e| e.to_string())
    }
}

impl Serialize for SecretId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SecretId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_lowercase_hex() {
        let id = SecretId::from_bytes([0xAB; SECRET_ID_SIZE]);
        assert_eq!(id.to_string(), "ab".repeat(16));
    }

    #[test]
    fn parse_roundtrip() {
        let id = SecretId::from_bytes(*b"0123456789abcdef");
        assert_eq!(id.to_string().parse::<SecretId>().unwrap(), id);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!("abcd".parse::<SecretId>().is_err());
        assert!("ab".repeat(17).parse::<SecretId>().is_err());
        assert!("".parse::<SecretId>().is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!("zz".repeat(16).parse::<SecretId>().is_err());
    }

    #[test]
    fn parse_rejects_uppercase() {
        assert!("AB".repeat(16).parse::<SecretId>().is_err());
        assert!(format!("{}A", "a".repeat(31)).parse::<SecretId>().is_err());
        assert!("ab".repeat(16).parse::<SecretId>().is_ok());
    }

    #[test]
    fn parse_rejects_path_traversal() {
        assert!("../../etc/passwd".parse::<SecretId>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let id = SecretId::from_bytes([0x01; SECRET_ID_SIZE]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(16)));

        let back: SecretId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
