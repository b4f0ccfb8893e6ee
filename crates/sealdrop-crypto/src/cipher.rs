//! Secret encryption using AES-256-GCM
//!
//! All functions are pure - keys and nonces must be provided by the caller.
//! This enables deterministic testing; production callers draw both from the
//! OS RNG and never reuse a nonce under the same key.

use std::fmt;

use aes_gcm::{
    Aes256Gcm, Key, KeyInit,
    aead::{Aead, generic_array::GenericArray},
};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{codec::to_array, error::CryptoError};

/// AES-256 key size (32 bytes)
pub const KEY_SIZE: usize = 32;

/// GCM nonce size (12 bytes)
pub const NONCE_SIZE: usize = 12;

/// GCM authentication tag size (16 bytes)
pub const TAG_SIZE: usize = 16;

/// A 256-bit symmetric key.
///
/// Zeroized on drop. `Debug` never prints key material.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_SIZE]);

impl SecretKey {
    /// Wrap raw key bytes.
    ///
    /// Caller MUST provide cryptographically secure random bytes for fresh
    /// keys.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a key from a slice of exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        to_array(bytes, "key").map(Self)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

/// A 96-bit GCM nonce (the "IV").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Wrap raw nonce bytes.
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a nonce from a slice of exactly [`NONCE_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        to_array(bytes, "nonce").map(Self)
    }

    /// Raw nonce bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// Encrypt with AES-256-GCM.
///
/// Returns ciphertext with the 16-byte tag appended, so the output is always
/// `plaintext.len() + TAG_SIZE` bytes.
///
/// # Security
///
/// - `nonce` MUST be unique for `key`. Reuse under GCM leaks the XOR of
///   plaintexts and allows tag forgery.
pub fn encrypt(plaintext: &[u8], key: &SecretKey, nonce: &Nonce) -> Vec<u8> {
    let Ok(ciphertext) = key.cipher().encrypt(GenericArray::from_slice(&nonce.0), plaintext) else {
        unreachable!("AES-256-GCM encryption cannot fail below the 64 GiB plaintext limit");
    };

    debug_assert_eq!(ciphertext.len(), plaintext.len() + TAG_SIZE);
    ciphertext
}

/// Decrypt and authenticate AES-256-GCM ciphertext (tag appended).
///
/// # Errors
///
/// - `AuthenticationFailure`: tag mismatch, which covers wrong key, wrong
///   nonce, tampered or truncated ciphertext alike
pub fn decrypt(ciphertext: &[u8], key: &SecretKey, nonce: &Nonce) -> Result<Vec<u8>, CryptoError> {
    key.cipher()
        .decrypt(GenericArray::from_slice(&nonce.0), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailure)
}
