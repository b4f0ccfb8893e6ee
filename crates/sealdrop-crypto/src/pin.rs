//! PIN key derivation and key wrapping
//!
//! A PIN is low-entropy, so it is stretched with PBKDF2-HMAC-SHA256 under a
//! random per-secret salt before it is used as a key-encrypting key. The PIN
//! itself is never stored or transmitted; only the salt travels with the
//! wrapped key.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{
    cipher::{KEY_SIZE, Nonce, SecretKey, TAG_SIZE, decrypt, encrypt},
    codec::to_array,
    error::CryptoError,
};

/// PBKDF2 iteration count.
///
/// Fixed policy value, identical for every derivation. Fragment tokens carry
/// a format version so a later version can raise it without breaking links.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt size (16 bytes)
pub const SALT_SIZE: usize = 16;

/// Size of a wrapped data key: key plus GCM tag (48 bytes)
pub const WRAPPED_KEY_SIZE: usize = KEY_SIZE + TAG_SIZE;

/// A 128-bit random salt for PIN derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Wrap raw salt bytes. Caller MUST provide random bytes.
    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a salt from a slice of exactly [`SALT_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        to_array(bytes, "salt").map(Self)
    }

    /// Raw salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// A data key encrypted under a PIN-derived key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey {
    /// Encrypted data key with GCM tag
    pub ciphertext: [u8; WRAPPED_KEY_SIZE],
    /// Nonce used for wrapping, independent of the data nonce
    pub nonce: Nonce,
    /// Salt for PIN derivation
    pub salt: Salt,
}

/// Derive a key-encrypting key from a PIN.
///
/// Deterministic in `(pin, salt)`. Different salts give independent keys for
/// the same PIN. CPU-bound: async callers should run this off the executor.
pub fn derive_pin_key(pin: &str, salt: &Salt) -> SecretKey {
    pbkdf2_sha256(pin.as_bytes(), &salt.0, PBKDF2_ITERATIONS)
}

fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32) -> SecretKey {
    let mut out = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(password, salt, iterations, out.as_mut());
    SecretKey::from_bytes(*out)
}

/// Encrypt `key` under a key derived from `(pin, salt)`.
///
/// `salt` and `nonce` MUST be freshly random per call.
pub fn wrap_key(key: &SecretKey, pin: &str, salt: Salt, nonce: Nonce) -> WrappedKey {
    let pin_key = derive_pin_key(pin, &salt);
    let sealed = encrypt(key.as_bytes(), &pin_key, &nonce);

    let mut ciphertext = [0u8; WRAPPED_KEY_SIZE];
    debug_assert_eq!(sealed.len(), WRAPPED_KEY_SIZE);
    ciphertext.copy_from_slice(&sealed);

    WrappedKey { ciphertext, nonce, salt }
}

/// Recover the data key from a [`WrappedKey`] with a candidate PIN.
///
/// # Errors
///
/// - `AuthenticationFailure`: the PIN is wrong (or the wrapped key was
///   altered; the two are indistinguishable)
pub fn unwrap_key(wrapped: &WrappedKey, pin: &str) -> Result<SecretKey, CryptoError> {
    let pin_key = derive_pin_key(pin, &wrapped.salt);
    let raw = Zeroizing::new(decrypt(&wrapped.ciphertext, &pin_key, &wrapped.nonce)?);
    SecretKey::from_slice(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::hex_encode;

    // RFC 7914 / widely published PBKDF2-HMAC-SHA256 vectors, 32-byte output
    #[test]
    fn pbkdf2_known_answer_one_iteration() {
        let key = pbkdf2_sha256(b"password", b"salt", 1);
        assert_eq!(
            hex_encode(key.as_bytes()),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn pbkdf2_known_answer_two_iterations() {
        let key = pbkdf2_sha256(b"password", b"salt", 2);
        assert_eq!(
            hex_encode(key.as_bytes()),
            "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43"
        );
    }

    #[test]
    fn pbkdf2_known_answer_4096_iterations() {
        let key = pbkdf2_sha256(b"password", b"salt", 4096);
        assert_eq!(
            hex_encode(key.as_bytes()),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn derive_is_deterministic() {
        let salt = Salt::from_bytes([7u8; SALT_SIZE]);

        let k1 = derive_pin_key("1234", &salt);
        let k2 = derive_pin_key("1234", &salt);

        assert_eq!(k1.as_bytes(), k2.as_bytes(), "same inputs must produce same output");
    }

    #[test]
    fn different_salts_produce_different_keys() {
        let k1 = derive_pin_key("1234", &Salt::from_bytes([0u8; SALT_SIZE]));
        let k2 = derive_pin_key("1234", &Salt::from_bytes([1u8; SALT_SIZE]));

        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn different_pins_produce_different_keys() {
        let salt = Salt::from_bytes([3u8; SALT_SIZE]);
        assert_ne!(derive_pin_key("1234", &salt).as_bytes(), derive_pin_key("0000", &salt).as_bytes());
    }

    #[test]
    fn wrap_unwrap_roundtrip() {
        let key = SecretKey::from_bytes([0x5A; KEY_SIZE]);
        let wrapped = wrap_key(
            &key,
            "1234",
            Salt::from_bytes([1u8; SALT_SIZE]),
            Nonce::from_bytes([2u8; 12]),
        );

        let unwrapped = unwrap_key(&wrapped, "1234").unwrap();
        assert_eq!(unwrapped.as_bytes(), key.as_bytes());
    }

    #[test]
    fn unwrap_with_wrong_pin_fails() {
        let key = SecretKey::from_bytes([0x5A; KEY_SIZE]);
        let wrapped = wrap_key(
            &key,
            "1234",
            Salt::from_bytes([1u8; SALT_SIZE]),
            Nonce::from_bytes([2u8; 12]),
        );

        assert_eq!(unwrap_key(&wrapped, "0000").unwrap_err(), CryptoError::AuthenticationFailure);
    }

    #[test]
    fn unwrap_with_altered_salt_fails() {
        let key = SecretKey::from_bytes([0x5A; KEY_SIZE]);
        let mut wrapped = wrap_key(
            &key,
            "1234",
            Salt::from_bytes([1u8; SALT_SIZE]),
            Nonce::from_bytes([2u8; 12]),
        );
        wrapped.salt = Salt::from_bytes([9u8; SALT_SIZE]);

        assert_eq!(unwrap_key(&wrapped, "1234").unwrap_err(), CryptoError::AuthenticationFailure);
    }

    #[test]
    fn wrapped_key_is_fixed_size() {
        let wrapped = wrap_key(
            &SecretKey::from_bytes([0u8; KEY_SIZE]),
            "pin",
            Salt::from_bytes([0u8; SALT_SIZE]),
            Nonce::from_bytes([0u8; 12]),
        );
        assert_eq!(wrapped.ciphertext.len(), 48);
    }

    #[test]
    fn salt_from_slice_rejects_wrong_length() {
        assert!(Salt::from_slice(&[0u8; 15]).is_err());
        assert!(Salt::from_slice(&[0u8; SALT_SIZE]).is_ok());
    }
}
