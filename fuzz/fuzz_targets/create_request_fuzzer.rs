//! Fuzz target for relay create-request validation
//!
//! # Strategy
//!
//! - Structured: arbitrary optional fields fed straight to `validate`
//! - Raw: arbitrary bytes through the JSON deserializer first
//!
//! # Invariants
//!
//! - NEVER panic
//! - Accepted requests have a 12-byte IV, a ciphertext of at least one tag,
//!   and one of the offered TTLs

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealdrop_core::wire::{ALLOWED_TTL_SECONDS, CreateSecretRequest};
use sealdrop_crypto::TAG_SIZE;

#[derive(Debug, Arbitrary)]
enum Input {
    Structured { ciphertext_hex: Option<String>, iv_hex: Option<String>, ttl_seconds: Option<u64> },
    Raw(Vec<u8>),
}

fuzz_target!(|input: Input| {
    let request = match input {
        Input::Structured { ciphertext_hex, iv_hex, ttl_seconds } => {
            CreateSecretRequest { ciphertext_hex, iv_hex, ttl_seconds }
        }
        Input::Raw(bytes) => match serde_json::from_slice::<CreateSecretRequest>(&bytes) {
            Ok(request) => request,
            Err(_) => return,
        },
    };

    if let Ok(valid) = request.validate() {
        assert!(valid.ciphertext.len() >= TAG_SIZE);
        assert!(ALLOWED_TTL_SECONDS.contains(&valid.ttl.as_secs()));
    }
});
