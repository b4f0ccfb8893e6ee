//! Sender flow: text in, share link out.

use sealdrop_core::{ShareLink, env::Environment, seal, wire::CreateSecretRequest};

use crate::{error::ClientError, relay::RelayClient};

/// Seal `text`, store the ciphertext at the relay and build the share link.
///
/// With `pin`, the data key is wrapped under a PIN-derived key. Sealing runs
/// on the blocking pool because PBKDF2 is deliberately slow. Only ciphertext
/// and nonce leave this function towards the relay; key material ends up in
/// the returned link's fragment.
///
/// `ttl_seconds` of `None` lets the relay apply its default (1 day).
///
/// # Errors
///
/// - `Seal` if `text` or `pin` is empty
/// - `Relay` if the relay rejected the request or could not be reached
pub async fn share_secret<R, E>(
    relay: &R,
    env: &E,
    text: &str,
    pin: Option<&str>,
    ttl_seconds: Option<u64>,
    base_url: &str,
) -> Result<ShareLink, ClientError>
where
    R: RelayClient + ?Sized,
    E: Environment,
{
    let sealed = {
        let env = env.clone();
        let text = text.to_owned();
        let pin = pin.map(str::to_owned);
        tokio::task::spawn_blocking(move || seal(&env, &text, pin.as_deref())).await??
    };

    let request = CreateSecretRequest::new(&sealed.ciphertext, &sealed.iv, ttl_seconds);
    let created = relay.create_secret(request).await?;

    tracing::debug!(
        id = %created.id,
        expires_in_seconds = created.expires_in_seconds,
        pin = sealed.envelope.requires_pin(),
        "secret shared"
    );

    Ok(ShareLink::new(base_url, created.id, sealed.envelope))
}
