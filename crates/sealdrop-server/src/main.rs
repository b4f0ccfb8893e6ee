//! Sealdrop relay binary.
//!
//! # Usage
//!
//! ```bash
//! # In-memory relay (development)
//! sealdrop-server --bind 127.0.0.1:8080
//!
//! # Durable relay
//! sealdrop-server --bind 0.0.0.0:8080 --db /var/lib/sealdrop/relay.redb
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use sealdrop_server::{DEFAULT_MAX_BODY_BYTES, Server, ServerRuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sealdrop relay server
#[derive(Parser, Debug)]
#[command(name = "sealdrop-server")]
#[command(about = "One-time secret relay: stores ciphertext, serves it once")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Redb database file (in-memory storage when omitted)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Seconds between expiry purges
    #[arg(long, default_value = "60")]
    reap_interval_secs: u64,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Sealdrop relay starting");
    tracing::info!("Binding to {}", args.bind);

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        db_path: args.db,
        reap_interval: Duration::from_secs(args.reap_interval_secs),
        max_body_bytes: args.max_body_bytes,
    };

    let server = Server::bind(config).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(%err, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
