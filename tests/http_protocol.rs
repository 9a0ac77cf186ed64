//! End-to-end exercise of the authority service over real HTTP.

use std::sync::Arc;

use tokio::net::TcpListener;

use solohost::authority::{Authority, AuthorityStatus, HttpAuthority};
use solohost::registry::Registry;
use solohost::server::{router, AppState};
use solohost::Error;

const KEY: &str = "hunter2";

/// Serve the authority on an ephemeral port, returning its base URL.
async fn spawn_authority(dir: &tempfile::TempDir) -> String {
    let registry = Arc::new(Registry::open(dir.path().join("state.txt")));
    let app = router(AppState::new(registry, KEY));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_acquire_release_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let url = spawn_authority(&dir).await;
    let client = HttpAuthority::new(&url, KEY).unwrap();

    assert_eq!(client.query().await.unwrap(), AuthorityStatus::Vacant);

    client.acquire("10.0.0.1").await.unwrap();
    assert_eq!(
        client.query().await.unwrap(),
        AuthorityStatus::Occupied("10.0.0.1".to_string())
    );

    // Conflict names the current holder
    let err = client.acquire("10.0.0.2").await.unwrap_err();
    assert!(matches!(err, Error::AlreadyRunning { ref holder } if holder == "10.0.0.1"));

    // Release is idempotent
    client.release().await.unwrap();
    client.release().await.unwrap();
    assert_eq!(client.query().await.unwrap(), AuthorityStatus::Vacant);
}

#[tokio::test]
async fn test_invalid_key_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    let url = spawn_authority(&dir).await;
    let client = HttpAuthority::new(&url, "wrong").unwrap();

    assert!(matches!(client.query().await, Err(Error::InvalidKey)));
    assert!(matches!(
        client.acquire("10.0.0.1").await,
        Err(Error::InvalidKey)
    ));
    assert!(matches!(client.release().await, Err(Error::InvalidKey)));
}

#[tokio::test]
async fn test_unreachable_authority_reads_as_unavailable() {
    // Nothing listens here
    let client = HttpAuthority::new("http://127.0.0.1:9", KEY).unwrap();
    assert_eq!(client.query().await.unwrap(), AuthorityStatus::Unavailable);
}

#[tokio::test]
async fn test_wire_level_rejections() {
    let dir = tempfile::tempdir().unwrap();
    let url = spawn_authority(&dir).await;
    let http = reqwest::Client::new();

    // Missing message
    let response = http
        .post(&url)
        .form(&[("key", KEY)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
    assert_eq!(response.text().await.unwrap(), "No message supplied.");

    // Started without an identity
    let response = http
        .post(&url)
        .form(&[("key", KEY), ("message", "started")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
    assert_eq!(response.text().await.unwrap(), "No IP supplied!");

    // Unknown message value
    let response = http
        .post(&url)
        .form(&[("key", KEY), ("message", "paused")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
    assert_eq!(response.text().await.unwrap(), "No message supplied.");

    // Missing key on a query
    let response = http.get(&url).send().await.unwrap();
    assert_eq!(response.status(), 503);
    assert_eq!(response.text().await.unwrap(), "Invalid key.");
}

#[tokio::test]
async fn test_query_reply_shape() {
    let dir = tempfile::tempdir().unwrap();
    let url = spawn_authority(&dir).await;
    let http = reqwest::Client::new();

    let body = http
        .get(format!("{url}/?key={KEY}"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, r#"{"online":false}"#);

    let client = HttpAuthority::new(&url, KEY).unwrap();
    client.acquire("203.0.113.7").await.unwrap();

    let body = http
        .get(format!("{url}/?key={KEY}"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, r#"{"online":true,"ip":"203.0.113.7"}"#);
}
