//! HTTP relay client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, Response, StatusCode,
    header::{CACHE_CONTROL, HeaderMap, HeaderValue},
};
use sealdrop_core::{
    FetchedSecret, SecretId,
    wire::{CreateSecretRequest, CreateSecretResponse, ErrorResponse, FetchSecretResponse},
};

use crate::{error::RelayClientError, relay::RelayClient};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Attempts for a create before giving up
const CREATE_ATTEMPTS: u32 = 3;

/// Backoff before the second create attempt; doubles each time
const CREATE_BACKOFF: Duration = Duration::from_millis(200);

/// [`RelayClient`] over the relay's JSON API.
///
/// Every request carries `Cache-Control: no-store`. Creates are retried only
/// when the relay cannot have stored them (connect failure, 5xx); fetches are
/// never retried.
#[derive(Clone, Debug)]
pub struct HttpRelay {
    client: Client,
    base_url: String,
}

impl HttpRelay {
    /// Client for the relay at `base_url` with default timeouts.
    pub fn new(base_url: &str) -> Result<Self, RelayClientError> {
        Self::with_timeouts(base_url, DEFAULT_TIMEOUT, CONNECT_TIMEOUT)
    }

    /// Client with explicit request and connect timeouts.
    pub fn with_timeouts(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, RelayClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| RelayClientError::Connect(e.to_string()))?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    /// Relay base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create_once(
        &self,
        request: &CreateSecretRequest,
    ) -> Result<CreateSecretResponse, RelayClientError> {
        let response = self
            .client
            .post(self.url("/api/create-secret"))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() != StatusCode::CREATED {
            return Err(error_from(response).await);
        }

        response
            .json::<CreateSecretResponse>()
            .await
            .map_err(|e| RelayClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl RelayClient for HttpRelay {
    async fn create_secret(
        &self,
        request: CreateSecretRequest,
    ) -> Result<CreateSecretResponse, RelayClientError> {
        let mut backoff = CREATE_BACKOFF;
        let mut attempt = 1;
        loop {
            match self.create_once(&request).await {
                Err(err) if err.is_transient() && attempt < CREATE_ATTEMPTS => {
                    tracing::warn!(%err, attempt, "create failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                },
                result => return result,
            }
        }
    }

    async fn fetch_secret(&self, id: SecretId) -> Result<Option<FetchedSecret>, RelayClientError> {
        let response = self
            .client
            .get(self.url("/api/fetch-secret"))
            .query(&[("id", id.to_string())])
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::OK => {},
            StatusCode::NOT_FOUND => return Ok(None),
            _ => return Err(error_from(response).await),
        }

        let body = response
            .json::<FetchSecretResponse>()
            .await
            .map_err(|e| RelayClientError::InvalidResponse(e.to_string()))?;
        let (ciphertext, iv) =
            body.decode().map_err(|e| RelayClientError::InvalidResponse(e.to_string()))?;

        Ok(Some(FetchedSecret { ciphertext, iv }))
    }
}

fn transport_error(err: reqwest::Error) -> RelayClientError {
    if err.is_connect() {
        RelayClientError::Connect(err.to_string())
    } else {
        RelayClientError::Transport(err.to_string())
    }
}

async fn error_from(response: Response) -> RelayClientError {
    let status = response.status();
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };

    if status.is_server_error() {
        RelayClientError::Unavailable { status: status.as_u16(), message }
    } else {
        RelayClientError::Rejected { status: status.as_u16(), message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let relay = HttpRelay::new("https://drop.example.com/").unwrap();
        assert_eq!(relay.base_url(), "https://drop.example.com");
        assert_eq!(relay.url("/api/fetch-secret"), "https://drop.example.com/api/fetch-secret");
    }

    #[tokio::test]
    async fn unreachable_relay_is_connect_failure() {
        // Port 9 (discard) on loopback is closed on test hosts
        let relay = HttpRelay::with_timeouts(
            "http://127.0.0.1:9",
            Duration::from_secs(2),
            Duration::from_secs(1),
        )
        .unwrap();

        let err = relay.fetch_secret(SecretId::from_bytes([1; 16])).await.unwrap_err();
        assert!(matches!(err, RelayClientError::Connect(_)), "unexpected error: {err}");
        assert!(err.is_transient());
    }
}
