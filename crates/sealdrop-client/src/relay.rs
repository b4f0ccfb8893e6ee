//! Relay capability.
//!
//! The flows in this crate never talk HTTP directly; they go through
//! [`RelayClient`] so tests can substitute an in-process relay.

use std::sync::Arc;

use async_trait::async_trait;
use sealdrop_core::{
    FetchedSecret, SecretId,
    wire::{CreateSecretRequest, CreateSecretResponse},
};

use crate::error::RelayClientError;

/// Operations a relay offers to clients.
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Store a ciphertext and return its id.
    async fn create_secret(
        &self,
        request: CreateSecretRequest,
    ) -> Result<CreateSecretResponse, RelayClientError>;

    /// Consume the record under `id`.
    ///
    /// `Ok(None)` means the relay has no record: never existed, already
    /// viewed, or expired. Implementations must not retry this call.
    async fn fetch_secret(&self, id: SecretId) -> Result<Option<FetchedSecret>, RelayClientError>;
}

#[async_trait]
impl<T: RelayClient + ?Sized> RelayClient for Arc<T> {
    async fn create_secret(
        &self,
        request: CreateSecretRequest,
    ) -> Result<CreateSecretResponse, RelayClientError> {
        (**self).create_secret(request).await
    }

    async fn fetch_secret(&self, id: SecretId) -> Result<Option<FetchedSecret>, RelayClientError> {
        (**self).fetch_secret(id).await
    }
}
