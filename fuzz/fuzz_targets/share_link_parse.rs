//! Fuzz target for share link parsing
//!
//! # Invariants
//!
//! - NEVER panic on any input
//! - A parsed link formats to text that parses to the same id

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealdrop_core::ShareLink;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(link) = ShareLink::parse(text) {
        let formatted = link.to_string();
        let reparsed = ShareLink::parse(&formatted).expect("formatted link must parse");
        assert_eq!(link.id(), reparsed.id());
        assert_eq!(link.envelope().requires_pin(), reparsed.envelope().requires_pin());
    }
});
