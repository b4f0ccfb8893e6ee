//! `HttpRelay` against a scripted axum stub.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use sealdrop_client::{HttpRelay, RelayClient, RelayClientError};
use sealdrop_core::{SecretId, wire::CreateSecretRequest};
use sealdrop_crypto::Nonce;
use serde_json::{Value, json};

#[derive(Default)]
struct Script {
    create_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    /// Creates answered 503 before the first success
    create_outages: usize,
    /// Every create answered 400
    reject_creates: bool,
    /// Creates are stored, then answered after this delay
    create_delay: Duration,
    saw_no_store: AtomicBool,
}

async fn create(
    State(script): State<Arc<Script>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let call = script.create_calls.fetch_add(1, Ordering::SeqCst);
    if headers.get(header::CACHE_CONTROL).is_some_and(|v| v == "no-store") {
        script.saw_no_store.store(true, Ordering::SeqCst);
    }

    if !script.create_delay.is_zero() {
        tokio::time::sleep(script.create_delay).await;
    }
    if script.reject_creates {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing required field: iv_hex", "code": "invalid_parameter" })),
        );
    }
    if call < script.create_outages {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "storage unavailable", "code": "transport_failure" })),
        );
    }
    (StatusCode::CREATED, Json(json!({ "id": "ab".repeat(16), "expires_in_seconds": 3_600 })))
}

async fn fetch_unavailable(State(script): State<Arc<Script>>) -> (StatusCode, Json<Value>) {
    script.fetch_calls.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": "storage unavailable", "code": "transport_failure" })),
    )
}

async fn spawn(script: Arc<Script>) -> HttpRelay {
    spawn_with_timeout(script, Duration::from_secs(30)).await
}

async fn spawn_with_timeout(script: Arc<Script>, timeout: Duration) -> HttpRelay {
    let router = Router::new()
        .route("/api/create-secret", post(create))
        .route("/api/fetch-secret", get(fetch_unavailable))
        .with_state(script);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

    HttpRelay::with_timeouts(&format!("http://{addr}"), timeout, Duration::from_secs(1)).unwrap()
}

fn request() -> CreateSecretRequest {
    CreateSecretRequest::new(&[0xAB; 32], &Nonce::from_bytes([1; 12]), Some(3_600))
}

#[tokio::test]
async fn create_retries_through_outage() {
    let script = Arc::new(Script { create_outages: 2, ..Script::default() });
    let relay = spawn(script.clone()).await;

    let created = relay.create_secret(request()).await.unwrap();
    assert_eq!(created.id, SecretId::from_bytes([0xAB; 16]));
    assert_eq!(created.expires_in_seconds, 3_600);
    assert_eq!(script.create_calls.load(Ordering::SeqCst), 3);
    assert!(script.saw_no_store.load(Ordering::SeqCst));
}

#[tokio::test]
async fn create_gives_up_after_bounded_attempts() {
    let script = Arc::new(Script { create_outages: usize::MAX, ..Script::default() });
    let relay = spawn(script.clone()).await;

    let err = relay.create_secret(request()).await.unwrap_err();
    assert!(matches!(err, RelayClientError::Unavailable { status: 503, .. }));
    assert_eq!(script.create_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn rejected_create_is_not_retried() {
    let script = Arc::new(Script { reject_creates: true, ..Script::default() });
    let relay = spawn(script.clone()).await;

    let err = relay.create_secret(request()).await.unwrap_err();
    assert_eq!(
        err,
        RelayClientError::Rejected {
            status: 400,
            message: "missing required field: iv_hex".to_string()
        }
    );
    assert_eq!(script.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn create_timed_out_after_send_is_not_resent() {
    let script =
        Arc::new(Script { create_delay: Duration::from_millis(800), ..Script::default() });
    let relay = spawn_with_timeout(script.clone(), Duration::from_millis(200)).await;

    let err = relay.create_secret(request()).await.unwrap_err();
    assert!(matches!(err, RelayClientError::Transport(_)), "unexpected error: {err}");
    assert!(!err.is_transient());

    // Give a resent request time to arrive before counting
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(script.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_fetch_is_never_retried() {
    let script = Arc::new(Script::default());
    let relay = spawn(script.clone()).await;

    let err = relay.fetch_secret(SecretId::from_bytes([1; 16])).await.unwrap_err();
    assert!(matches!(err, RelayClientError::Unavailable { status: 503, .. }));
    assert_eq!(script.fetch_calls.load(Ordering::SeqCst), 1);
}
