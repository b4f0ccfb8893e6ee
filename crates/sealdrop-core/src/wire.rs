//! JSON bodies exchanged between clients and the relay.
//!
//! Binary fields travel as lowercase hex. The relay validates shape only
//! (hex, IV length, minimum ciphertext length); it can never check that a
//! ciphertext decrypts.

use std::time::Duration;

use sealdrop_crypto::{
    NONCE_SIZE, Nonce, TAG_SIZE,
    codec::{hex_decode, hex_encode},
};
use serde::{Deserialize, Serialize};

use crate::{error::WireError, id::SecretId};

/// TTL applied when a create request omits `ttl_seconds` (1 day)
pub const DEFAULT_TTL_SECONDS: u64 = 86_400;

/// TTLs offered to external callers: 1 hour, 1 day, 1 week
pub const ALLOWED_TTL_SECONDS: [u64; 3] = [3_600, 86_400, 604_800];

/// `POST /api/create-secret` body.
///
/// Fields are optional at the serde level so a missing field surfaces as
/// [`WireError::MissingField`] instead of a generic JSON error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSecretRequest {
    /// Hex ciphertext with appended GCM tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciphertext_hex: Option<String>,
    /// Hex 12-byte data nonce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv_hex: Option<String>,
    /// Requested lifetime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCreate {
    /// Ciphertext bytes
    pub ciphertext: Vec<u8>,
    /// Data nonce
    pub iv: Nonce,
    /// Record lifetime
    pub ttl: Duration,
}

impl CreateSecretRequest {
    /// Build a request body from raw ciphertext and nonce.
    pub fn new(ciphertext: &[u8], iv: &Nonce, ttl_seconds: Option<u64>) -> Self {
        Self {
            ciphertext_hex: Some(hex_encode(ciphertext)),
            iv_hex: Some(hex_encode(iv.as_bytes())),
            ttl_seconds,
        }
    }

    /// Check every field and decode the binary ones.
    ///
    /// # Errors
    ///
    /// - `MissingField`: `ciphertext_hex` or `iv_hex` absent
    /// - `InvalidField`: bad hex, IV not 12 bytes, ciphertext shorter than a tag
    /// - `UnsupportedTtl`: `ttl_seconds` outside [`ALLOWED_TTL_SECONDS`]
    pub fn validate(&self) -> Result<ValidatedCreate, WireError> {
        let ciphertext_hex =
            self.ciphertext_hex.as_deref().ok_or(WireError::MissingField("ciphertext_hex"))?;
        let iv_hex = self.iv_hex.as_deref().ok_or(WireError::MissingField("iv_hex"))?;

        let ciphertext = decode_field("ciphertext_hex", ciphertext_hex)?;
        if ciphertext.len() < TAG_SIZE {
            return Err(WireError::InvalidField {
                field: "ciphertext_hex",
                reason: format!("must be at least {TAG_SIZE} bytes, got {}", ciphertext.len()),
            });
        }

        let iv = decode_iv(iv_hex)?;

        let ttl_seconds = self.ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS);
        if !ALLOWED_TTL_SECONDS.contains(&ttl_seconds) {
            return Err(WireError::UnsupportedTtl(ttl_seconds));
        }

        Ok(ValidatedCreate { ciphertext, iv, ttl: Duration::from_secs(ttl_seconds) })
    }
}

/// `201` body for a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSecretResponse {
    /// Id to embed in the share link
    pub id: SecretId,
    /// Lifetime actually applied
    pub expires_in_seconds: u64,
}

/// `GET /api/fetch-secret` query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSecretQuery {
    /// Secret id as 32 hex characters
    #[serde(default)]
    pub id: Option<String>,
}

/// `200` body for a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSecretResponse {
    /// Hex ciphertext with tag
    pub ciphertext_hex: String,
    /// Hex data nonce
    pub iv_hex: String,
}

impl FetchSecretResponse {
    /// Encode a stored record for the wire.
    pub fn new(ciphertext: &[u8], iv: &Nonce) -> Self {
        Self { ciphertext_hex: hex_encode(ciphertext), iv_hex: hex_encode(iv.as_bytes()) }
    }

    /// Decode the hex fields.
    pub fn decode(&self) -> Result<(Vec<u8>, Nonce), WireError> {
        let ciphertext = decode_field("ciphertext_hex", &self.ciphertext_hex)?;
        let iv = decode_iv(&self.iv_hex)?;
        Ok((ciphertext, iv))
    }
}

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request was malformed; retrying unchanged will fail again
    InvalidParameter,
    /// No record: never existed, already consumed, or expired
    NotFound,
    /// Backing store unavailable
    TransportFailure,
    /// Request body above the configured limit
    PayloadTooLarge,
    /// Unexpected relay fault
    Internal,
}

/// Body of every non-2xx relay response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Category
    pub code: ErrorCode,
}

fn decode_field(field: &'static str, text: &str) -> Result<Vec<u8>, WireError> {
    hex_decode(text).map_err(|e| WireError::InvalidField { field, reason: e.to_string() })
}

fn decode_iv(text: &str) -> Result<Nonce, WireError> {
    let bytes = decode_field("iv_hex", text)?;
    Nonce::from_slice(&bytes).map_err(|_| WireError::InvalidField {
        field: "iv_hex",
        reason: format!("must be {NONCE_SIZE} bytes, got {}", bytes.len()),
    })
}
