//! Sealdrop relay server.
//!
//! Production server exposing the relay store over HTTP with axum, using the
//! system wall clock and OS RNG.
//!
//! # Architecture
//!
//! The relay never sees key material. It stores `(ciphertext, iv)` under an
//! unguessable id and hands it out exactly once: [`Relay::consume`] is a
//! single atomic take on the storage backend, so the store, not the
//! application, is the synchronization point between concurrent requests.
//!
//! # Components
//!
//! - [`Relay`]: create / consume / purge over any [`RelayStorage`]
//! - [`storage`]: memory, redb and fault-injecting backends
//! - [`api`]: axum router for the JSON endpoints
//! - [`Server`]: binds a listener, serves the router, runs the reaper
//! - [`SystemEnv`]: production environment (wall clock, crypto RNG)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
mod error;
mod reaper;
pub mod relay;
pub mod storage;
mod system_env;

use std::{future::Future, net::SocketAddr, path::PathBuf, time::Duration};

pub use api::{ApiError, DEFAULT_MAX_BODY_BYTES, router};
use axum::Router;
pub use error::ServerError;
pub use reaper::{DEFAULT_REAP_INTERVAL, run_reaper};
pub use relay::{Relay, RelayError};
pub use storage::{ChaoticStorage, MemoryStorage, RedbStorage, RelayStorage, StorageError, StoredRecord};
pub use system_env::SystemEnv;
use tokio::{net::TcpListener, task::JoinHandle};

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:8080")
    pub bind_address: String,
    /// Redb database file. `None` keeps records in memory only.
    pub db_path: Option<PathBuf>,
    /// Interval between expiry purges
    pub reap_interval: Duration,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            db_path: None,
            reap_interval: DEFAULT_REAP_INTERVAL,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerRuntimeConfig {
    fn validate(&self) -> Result<(), ServerError> {
        if self.reap_interval.is_zero() {
            return Err(ServerError::Config("reap interval must be positive".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(ServerError::Config("max body size must be positive".to_string()));
        }
        Ok(())
    }
}

/// Production sealdrop relay.
pub struct Server {
    listener: TcpListener,
    router: Router,
    reaper: JoinHandle<()>,
}

impl Server {
    /// Open storage, bind the listener and start the reaper.
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let env = SystemEnv::new();
        let (router, reaper) = match &config.db_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "opening redb storage");
                let relay = Relay::new(env, RedbStorage::open(path)?);
                Self::wire(relay, &config)
            },
            None => {
                tracing::warn!("no database configured, secrets are lost on restart");
                Self::wire(Relay::new(env, MemoryStorage::new()), &config)
            },
        };

        let listener = match TcpListener::bind(&config.bind_address).await {
            Ok(listener) => listener,
            Err(err) => {
                reaper.abort();
                return Err(ServerError::Transport(format!(
                    "failed to bind {}: {err}",
                    config.bind_address
                )));
            },
        };

        Ok(Self { listener, router, reaper })
    }

    fn wire<S: RelayStorage>(
        relay: Relay<SystemEnv, S>,
        config: &ServerRuntimeConfig,
    ) -> (Router, JoinHandle<()>) {
        let reaper = tokio::spawn(run_reaper(relay.clone(), config.reap_interval));
        (router(relay, config.max_body_bytes), reaper)
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the process is terminated.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        tracing::info!("relay listening on {}", self.local_addr()?);

        let result = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::from);

        self.reaper.abort();
        tracing::info!("relay stopped");
        result
    }
}
