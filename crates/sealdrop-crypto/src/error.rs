//! Error types for cryptographic operations

use thiserror::Error;

/// Errors from codec, cipher, and key-derivation operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Fixed-size input (key, nonce, salt) has the wrong length.
    ///
    /// Inputs are never truncated or padded to fit.
    #[error("invalid {what} length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Which input was malformed
        what: &'static str,
        /// Required length in bytes
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },

    /// Input is not valid in its textual encoding (hex, base64url, UTF-8)
    #[error("invalid {what} encoding: {reason}")]
    InvalidEncoding {
        /// Which input was malformed
        what: &'static str,
        /// Decoder message
        reason: String,
    },

    /// AEAD tag did not verify.
    ///
    /// Wrong key, wrong nonce, and tampered ciphertext are deliberately
    /// indistinguishable.
    #[error("authentication failed")]
    AuthenticationFailure,
}

impl CryptoError {
    /// Returns true if the caller supplied a malformed parameter, as opposed
    /// to well-formed data that failed authentication.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidLength { .. } | Self::InvalidEncoding { .. })
    }
}
