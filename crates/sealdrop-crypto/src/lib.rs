//! Sealdrop Cryptographic Primitives
//!
//! Cryptographic building blocks for sealdrop. Pure functions with
//! deterministic outputs. Callers provide random bytes (keys, nonces, salts)
//! for deterministic testing; production callers draw them from an OS CSPRNG.
//!
//! # Key Hierarchy
//!
//! Every secret is encrypted under a fresh data key. The data key either
//! travels out-of-band as-is, or is itself encrypted ("wrapped") under a key
//! derived from a short PIN.
//!
//! ```text
//! PIN + Salt
//!      │
//!      ▼
//! PBKDF2-HMAC-SHA256 (100k iterations) → PIN Key
//!      │
//!      ▼
//! AES-256-GCM(PIN Key, wrap nonce) → Wrapped Data Key
//!
//! Data Key (random, 256-bit)
//!      │
//!      ▼
//! AES-256-GCM(Data Key, nonce) → Ciphertext (stored at relay)
//! ```
//!
//! # Security
//!
//! Authenticity:
//! - AES-256-GCM appends a 16-byte tag; any mismatch is reported as
//!   [`CryptoError::AuthenticationFailure`] without leaking which input was
//!   wrong (key, nonce, or ciphertext)
//! - Decryption never returns partial plaintext
//!
//! Nonce discipline:
//! - Every key is random and used with exactly one nonce for data, and the
//!   PIN key with exactly one nonce for wrapping
//!
//! Key hygiene:
//! - [`SecretKey`] zeroizes its bytes on drop and never prints them

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cipher;
pub mod codec;
mod error;
pub mod pin;

pub use cipher::{KEY_SIZE, NONCE_SIZE, Nonce, SecretKey, TAG_SIZE, decrypt, encrypt};
pub use error::CryptoError;
pub use pin::{
    PBKDF2_ITERATIONS, SALT_SIZE, Salt, WRAPPED_KEY_SIZE, WrappedKey, derive_pin_key, unwrap_key,
    wrap_key,
};
