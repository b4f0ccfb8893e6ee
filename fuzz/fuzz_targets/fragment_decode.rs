//! Fuzz target for fragment token decoding
//!
//! Fragments arrive from pasted links, so every byte is attacker-controlled.
//!
//! # Invariants
//!
//! - NEVER panic on any input
//! - Anything that decodes re-encodes to the canonical token, and that token
//!   decodes to the same envelope kind

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealdrop_core::fragment::{from_fragment, to_fragment};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(envelope) = from_fragment(text) {
        let canonical = to_fragment(&envelope);
        let again = from_fragment(&canonical).expect("canonical token must decode");
        assert_eq!(envelope.requires_pin(), again.requires_pin());
        assert_eq!(canonical, to_fragment(&again));
    }
});
