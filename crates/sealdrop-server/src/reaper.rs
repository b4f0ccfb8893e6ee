//! Background expiry.
//!
//! `take` already refuses expired records, but an unread record would sit in
//! storage until someone asks for it. The reaper bounds that to one interval.

use std::time::Duration;

use sealdrop_core::env::Environment;

use crate::{relay::Relay, storage::RelayStorage};

/// Default interval between purges
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(60);

/// Purge expired records every `interval`, forever.
///
/// Failures are logged and the loop continues; the next pass retries. Purging
/// runs on the blocking pool since durable backends fsync.
pub async fn run_reaper<E: Environment, S: RelayStorage>(relay: Relay<E, S>, interval: Duration) {
    tracing::info!(interval_secs = interval.as_secs(), "reaper started");

    loop {
        relay.env().sleep(interval).await;

        let pass = relay.clone();
        match tokio::task::spawn_blocking(move || pass.purge_expired()).await {
            Ok(Ok(_)) => {},
            Ok(Err(err)) => tracing::warn!(%err, "expiry purge failed"),
            Err(err) => tracing::error!(%err, "expiry purge task panicked"),
        }
    }
}
