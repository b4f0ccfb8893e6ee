//! Fuzz target for opening direct-key envelopes
//!
//! Ciphertext and nonce come from the relay, which is not trusted for
//! integrity.
//!
//! # Invariants
//!
//! - NEVER panic on tampered ciphertext
//! - Tampered ciphertext never opens: it was not produced under this key

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealdrop_core::{OpenError, SecretEnvelope};
use sealdrop_crypto::{Nonce, SecretKey};

#[derive(Debug, Arbitrary)]
struct Tampered {
    key: [u8; 32],
    iv: [u8; 12],
    ciphertext: Vec<u8>,
    pin: Option<String>,
}

fuzz_target!(|input: Tampered| {
    let envelope = SecretEnvelope::Direct { key: SecretKey::from_bytes(input.key) };
    let result = envelope.open(&input.ciphertext, &Nonce::from_bytes(input.iv), input.pin.as_deref());
    assert_eq!(result, Err(OpenError::CorruptedLink));
});
