//! In-process relay adapter.
//!
//! Connects the client flows straight to a [`Relay`] without HTTP. Request
//! validation and status mapping mirror the axum handlers, so scenario tests
//! exercise the same rejections a real client would see.

use async_trait::async_trait;
use sealdrop_client::{RelayClient, RelayClientError};
use sealdrop_core::{
    FetchedSecret, SecretId,
    wire::{CreateSecretRequest, CreateSecretResponse},
};
use sealdrop_server::{MemoryStorage, Relay, RelayError, RelayStorage};

use crate::SimEnv;

/// [`RelayClient`] backed by an in-process [`Relay`].
#[derive(Clone)]
pub struct LocalRelay<S: RelayStorage = MemoryStorage> {
    relay: Relay<SimEnv, S>,
}

impl LocalRelay<MemoryStorage> {
    /// Relay over fresh in-memory storage.
    pub fn in_memory(env: SimEnv) -> Self {
        Self::new(Relay::new(env, MemoryStorage::new()))
    }
}

impl<S: RelayStorage> LocalRelay<S> {
    /// Adapter over an existing relay.
    pub fn new(relay: Relay<SimEnv, S>) -> Self {
        Self { relay }
    }

    /// The wrapped relay.
    pub fn relay(&self) -> &Relay<SimEnv, S> {
        &self.relay
    }
}

fn unavailable(err: &RelayError) -> RelayClientError {
    tracing::warn!(%err, "simulated relay storage failure");
    RelayClientError::Unavailable { status: 503, message: err.to_string() }
}

#[async_trait]
impl<S: RelayStorage> RelayClient for LocalRelay<S> {
    async fn create_secret(
        &self,
        request: CreateSecretRequest,
    ) -> Result<CreateSecretResponse, RelayClientError> {
        let valid = request.validate().map_err(|e| {
            tracing::debug!(reason = %e, "simulated relay rejected create");
            RelayClientError::Rejected { status: 400, message: e.to_string() }
        })?;

        let expires_in_seconds = valid.ttl.as_secs();
        let id = self
            .relay
            .create(valid.ciphertext, valid.iv, valid.ttl)
            .map_err(|e| unavailable(&e))?;

        tracing::trace!(
            sim_elapsed_ms = self.relay.env().elapsed().as_millis() as u64,
            "simulated relay stored secret"
        );
        Ok(CreateSecretResponse { id, expires_in_seconds })
    }

    async fn fetch_secret(&self, id: SecretId) -> Result<Option<FetchedSecret>, RelayClientError> {
        let record = self.relay.consume(id).map_err(|e| unavailable(&e))?;
        Ok(record.map(|record| FetchedSecret { iv: record.nonce(), ciphertext: record.ciphertext }))
    }
}
