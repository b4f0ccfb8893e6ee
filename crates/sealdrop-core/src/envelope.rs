//! Envelope builder and opener.
//!
//! Two construction modes, both supported indefinitely so previously issued
//! links keep working:
//!
//! ```text
//! Direct:      secret ──AES-GCM(K, iv)──> ciphertext      fragment = K
//!
//! PinWrapped:  secret ──AES-GCM(K, iv)──> ciphertext
//!              K ──AES-GCM(PBKDF2(pin, salt), wrap_iv)──> wrapped_key
//!                                                         fragment = (wrapped_key, wrap_iv, salt)
//! ```
//!
//! `(ciphertext, iv)` goes to the relay. The envelope goes into the URL
//! fragment and never travels over the relay channel.

use sealdrop_crypto::{
    CryptoError, Nonce, Salt, SecretKey, WrappedKey,
    codec::{bytes_to_text, text_to_bytes},
    decrypt, encrypt, unwrap_key, wrap_key,
};

use crate::{
    env::Environment,
    error::{OpenError, SealError},
};

/// Out-of-band key material needed to decrypt a stored secret.
#[derive(Debug, Clone)]
pub enum SecretEnvelope {
    /// The raw data key
    Direct {
        /// 256-bit data key
        key: SecretKey,
    },

    /// The data key wrapped under a PIN-derived key
    PinWrapped(WrappedKey),
}

impl SecretEnvelope {
    /// Returns true if opening needs a PIN from the receiver.
    pub fn requires_pin(&self) -> bool {
        matches!(self, Self::PinWrapped(_))
    }

    /// Recover the secret text from relay ciphertext.
    ///
    /// `pin` is ignored for `Direct` envelopes. For `PinWrapped` envelopes the
    /// PIN is checked first (key unwrap), then the data is decrypted.
    ///
    /// CPU-bound for `PinWrapped` (PBKDF2); async callers should run this on a
    /// blocking pool.
    ///
    /// # Errors
    ///
    /// - `PinRequired`: PIN-wrapped envelope with no PIN
    /// - `IncorrectPin`: key unwrap failed authentication
    /// - `CorruptedLink`: data decryption failed, or plaintext is not UTF-8
    pub fn open(&self, ciphertext: &[u8], iv: &Nonce, pin: Option<&str>) -> Result<String, OpenError> {
        let plaintext = match self {
            Self::Direct { key } => decrypt(ciphertext, key, iv),
            Self::PinWrapped(wrapped) => {
                let pin = pin.filter(|p| !p.is_empty()).ok_or(OpenError::PinRequired)?;
                let key = unwrap_key(wrapped, pin).map_err(|e| match e {
                    CryptoError::AuthenticationFailure => OpenError::IncorrectPin,
                    _ => OpenError::CorruptedLink,
                })?;
                decrypt(ciphertext, &key, iv)
            },
        }
        .map_err(|_| OpenError::CorruptedLink)?;

        bytes_to_text(plaintext).map_err(|_| OpenError::CorruptedLink)
    }
}

/// Output of [`seal`]: what goes to the relay plus what goes in the fragment.
#[derive(Debug, Clone)]
pub struct SealedSecret {
    /// AES-GCM ciphertext with tag, for the relay
    pub ciphertext: Vec<u8>,
    /// Data nonce, for the relay
    pub iv: Nonce,
    /// Key material, for the fragment only
    pub envelope: SecretEnvelope,
}

/// Encrypt `secret` under a fresh data key.
///
/// With `pin`, the data key is additionally wrapped under
/// `PBKDF2(pin, salt)` with a second, independent nonce. The PIN is not kept
/// anywhere in the result.
///
/// Draws key, nonces and salt from `env`. CPU-bound when a PIN is given.
pub fn seal<E: Environment>(
    env: &E,
    secret: &str,
    pin: Option<&str>,
) -> Result<SealedSecret, SealError> {
    if secret.is_empty() {
        return Err(SealError::EmptySecret);
    }
    if pin.is_some_and(str::is_empty) {
        return Err(SealError::EmptyPin);
    }

    let key = SecretKey::from_bytes(env.random_array());
    let iv = Nonce::from_bytes(env.random_array());
    let ciphertext = encrypt(&text_to_bytes(secret), &key, &iv);

    let envelope = match pin {
        None => SecretEnvelope::Direct { key },
        Some(pin) => {
            let salt = Salt::from_bytes(env.random_array());
            let wrap_iv = Nonce::from_bytes(env.random_array());
            SecretEnvelope::PinWrapped(wrap_key(&key, pin, salt, wrap_iv))
        },
    };

    Ok(SealedSecret { ciphertext, iv, envelope })
}
