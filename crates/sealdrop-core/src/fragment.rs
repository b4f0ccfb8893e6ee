//! URL fragment token for an envelope.
//!
//! # Format
//!
//! ```text
//! Direct (legacy, unversioned):
//!   base64url(key)                              43 chars
//!
//! PinWrapped:
//!   "p1." || base64url(wrap_iv || salt || wrapped_key)
//!                      12        16     48             = 76 bytes
//! ```
//!
//! All base64url is unpadded. A leading `#` is accepted and stripped. Tokens
//! with an unknown `p<N>.` prefix are reported as unsupported rather than
//! malformed so that a newer sender can be told apart from a damaged link.

use sealdrop_crypto::{
    KEY_SIZE, NONCE_SIZE, Nonce, SALT_SIZE, Salt, SecretKey, WRAPPED_KEY_SIZE, WrappedKey,
    codec::{base64url_decode, base64url_encode, to_array},
};

use crate::{envelope::SecretEnvelope, error::FragmentError};

/// Prefix of the current PIN-wrapped token version
pub const PIN_WRAPPED_PREFIX: &str = "p1.";

/// Decoded size of a `p1.` payload
pub const PIN_WRAPPED_PAYLOAD_SIZE: usize = NONCE_SIZE + SALT_SIZE + WRAPPED_KEY_SIZE;

/// Render an envelope as its canonical fragment token (without `#`).
pub fn to_fragment(envelope: &SecretEnvelope) -> String {
    match envelope {
        SecretEnvelope::Direct { key } => base64url_encode(key.as_bytes()),
        SecretEnvelope::PinWrapped(wrapped) => {
            let mut payload = Vec::with_capacity(PIN_WRAPPED_PAYLOAD_SIZE);
            payload.extend_from_slice(wrapped.nonce.as_bytes());
            payload.extend_from_slice(wrapped.salt.as_bytes());
            payload.extend_from_slice(&wrapped.ciphertext);
            format!("{PIN_WRAPPED_PREFIX}{}", base64url_encode(&payload))
        },
    }
}

/// Parse a fragment token back into an envelope.
///
/// # Errors
///
/// - `Empty`: nothing after the optional `#`
/// - `UnsupportedVersion`: a `p<N>.` prefix other than `p1.`
/// - `Malformed`: bad base64url or wrong decoded length
pub fn from_fragment(fragment: &str) -> Result<SecretEnvelope, FragmentError> {
    let token = fragment.strip_prefix('#').unwrap_or(fragment);
    if token.is_empty() {
        return Err(FragmentError::Empty);
    }

    if let Some(payload) = token.strip_prefix(PIN_WRAPPED_PREFIX) {
        return decode_pin_wrapped(payload);
    }

    if let Some(version) = version_prefix(token) {
        return Err(FragmentError::UnsupportedVersion(version.to_string()));
    }

    let bytes = base64url_decode(token)?;
    if bytes.len() != KEY_SIZE {
        return Err(FragmentError::Malformed(format!(
            "expected {KEY_SIZE}-byte key, got {} bytes",
            bytes.len()
        )));
    }
    let key = SecretKey::from_slice(&bytes)?;
    Ok(SecretEnvelope::Direct { key })
}

fn decode_pin_wrapped(payload: &str) -> Result<SecretEnvelope, FragmentError> {
    let bytes = base64url_decode(payload)?;
    if bytes.len() != PIN_WRAPPED_PAYLOAD_SIZE {
        return Err(FragmentError::Malformed(format!(
            "expected {PIN_WRAPPED_PAYLOAD_SIZE}-byte payload, got {} bytes",
            bytes.len()
        )));
    }

    let (nonce, rest) = bytes.split_at(NONCE_SIZE);
    let (salt, ciphertext) = rest.split_at(SALT_SIZE);

    Ok(SecretEnvelope::PinWrapped(WrappedKey {
        ciphertext: to_array(ciphertext, "wrapped key")?,
        nonce: Nonce::from_slice(nonce)?,
        salt: Salt::from_slice(salt)?,
    }))
}

/// Returns the `p<digits>` part if `token` starts with `p<digits>.`.
///
/// Base64url never contains `.`, so a dot is enough to tell a versioned token
/// from a legacy one.
fn version_prefix(token: &str) -> Option<&str> {
    let (version, _) = token.split_once('.')?;
    let digits = version.strip_prefix('p')?;
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin_envelope() -> SecretEnvelope {
        SecretEnvelope::PinWrapped(WrappedKey {
            ciphertext: [0xC3; WRAPPED_KEY_SIZE],
            nonce: Nonce::from_bytes([0x01; NONCE_SIZE]),
            salt: Salt::from_bytes([0x02; SALT_SIZE]),
        })
    }

    #[test]
    fn direct_token_is_bare_base64url_key() {
        let envelope = SecretEnvelope::Direct { key: SecretKey::from_bytes([0u8; KEY_SIZE]) };
        let token = to_fragment(&envelope);

        assert_eq!(token.len(), 43);
        assert_eq!(token, "A".repeat(43));
    }

    #[test]
    fn direct_roundtrip() {
        let key = SecretKey::from_bytes([0x42; KEY_SIZE]);
        let token = to_fragment(&SecretEnvelope::Direct { key: key.clone() });

        let SecretEnvelope::Direct { key: parsed } = from_fragment(&token).unwrap() else {
            unreachable!("direct token must parse as direct");
        };
        assert_eq!(parsed.as_bytes(), key.as_bytes());
    }

    #[test]
    fn pin_wrapped_roundtrip() {
        let token = to_fragment(&pin_envelope());
        assert!(token.starts_with("p1."));

        let SecretEnvelope::PinWrapped(parsed) = from_fragment(&token).unwrap() else {
            unreachable!("p1 token must parse as pin wrapped");
        };
        let SecretEnvelope::PinWrapped(expected) = pin_envelope() else { unreachable!() };
        assert_eq!(parsed, expected);
    }

    #[test]
    fn pin_wrapped_layout_is_iv_salt_key() {
        let token = to_fragment(&pin_envelope());
        let payload = base64url_decode(token.strip_prefix("p1.").unwrap()).unwrap();

        assert_eq!(payload.len(), 76);
        assert_eq!(&payload[..12], &[0x01; 12]);
        assert_eq!(&payload[12..28], &[0x02; 16]);
        assert_eq!(&payload[28..], &[0xC3; 48]);
    }

    #[test]
    fn leading_hash_is_stripped() {
        let token = to_fragment(&pin_envelope());
        assert!(from_fragment(&format!("#{token}")).is_ok());
    }

    #[test]
    fn empty_fragment() {
        assert_eq!(from_fragment("").unwrap_err(), FragmentError::Empty);
        assert_eq!(from_fragment("#").unwrap_err(), FragmentError::Empty);
    }

    #[test]
    fn unknown_version_is_unsupported() {
        assert_eq!(
            from_fragment("p2.AAAA").unwrap_err(),
            FragmentError::UnsupportedVersion("p2".to_string())
        );
        assert_eq!(
            from_fragment("p17.whatever").unwrap_err(),
            FragmentError::UnsupportedVersion("p17".to_string())
        );
    }

    #[test]
    fn truncated_tokens_are_malformed() {
        let token = to_fragment(&pin_envelope());
        let truncated = &token[..token.len() - 4];
        assert!(matches!(from_fragment(truncated), Err(FragmentError::Malformed(_))));

        assert!(matches!(from_fragment(&"A".repeat(42)), Err(FragmentError::Malformed(_))));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(from_fragment("not base64!"), Err(FragmentError::Malformed(_))));
        assert!(matches!(from_fragment("p1.***"), Err(FragmentError::Malformed(_))));
        assert!(matches!(from_fragment("px.AAAA"), Err(FragmentError::Malformed(_))));
    }
}
