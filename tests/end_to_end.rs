//! Full-stack tests: HTTP form → bridge → ingest server → store.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use message_relay::config::RelayConfig;
use message_relay::http::HttpServer;
use message_relay::lifecycle::Shutdown;
use message_relay::store::MemoryStore;
use tokio::net::TcpListener;

mod common;

/// Start ingest + http servers wired together on ephemeral ports.
async fn start_stack(store: Arc<MemoryStore>) -> (SocketAddr, Shutdown) {
    let (ingest_addr, shutdown) = common::start_ingest_server(store).await;
    let http_addr = start_http(&ingest_addr.to_string(), &shutdown).await;
    (http_addr, shutdown)
}

/// Start only the http server, pointing its bridge at `ingest_address`.
async fn start_http(ingest_address: &str, shutdown: &Shutdown) -> SocketAddr {
    let mut config = RelayConfig::default();
    config.bridge.ingest_address = ingest_address.to_string();
    config.bridge.connect_timeout_secs = 1;
    config.bridge.ack_timeout_secs = 2;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(&config);
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    addr
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// Address with nothing listening on it.
async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

#[tokio::test]
async fn form_submission_is_parsed_relayed_and_persisted() {
    let store = Arc::new(MemoryStore::new());
    let (http_addr, _shutdown) = start_stack(store.clone()).await;

    let res = client()
        .post(format!("http://{http_addr}/message"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("name=Alice&msg=Hello+World")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 303);
    assert_eq!(
        res.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/")
    );

    let documents = store.documents().await;
    assert_eq!(documents.len(), 1);
    let message = &documents[0].1;
    assert_eq!(message.fields.get("name").map(String::as_str), Some("Alice"));
    assert_eq!(
        message.fields.get("msg").map(String::as_str),
        Some("Hello World")
    );
}

#[tokio::test]
async fn malformed_body_fails_before_any_connection_is_opened() {
    // The bridge points at a closed port: if it tried to connect, the
    // response would be 502, not 400.
    let shutdown = Shutdown::new();
    let http_addr = start_http(&closed_port().await, &shutdown).await;

    let res = client()
        .post(format!("http://{http_addr}/message"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("name=Alice&bad")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn unreachable_ingest_server_reports_bad_gateway() {
    let shutdown = Shutdown::new();
    let http_addr = start_http(&closed_port().await, &shutdown).await;

    let res = client()
        .post(format!("http://{http_addr}/message"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("name=Alice&msg=hi")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
}

#[tokio::test]
async fn pages_and_static_assets_are_served() {
    let store = Arc::new(MemoryStore::new());
    let (http_addr, _shutdown) = start_stack(store).await;
    let client = client();

    let home = client
        .get(format!("http://{http_addr}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(home.status(), 200);
    assert!(home.text().await.unwrap().contains("<form"));

    let css = client
        .get(format!("http://{http_addr}/style.css"))
        .send()
        .await
        .unwrap();
    assert_eq!(css.status(), 200);

    let missing = client
        .get(format!("http://{http_addr}/no-such-page"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn hostile_field_content_survives_the_full_pipeline() {
    let store = Arc::new(MemoryStore::new());
    let (http_addr, _shutdown) = start_stack(store.clone()).await;

    // `a=b&c d☃` percent-encoded: separators and unicode in the value.
    let res = client()
        .post(format!("http://{http_addr}/message"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("msg=a%3Db%26c%20d%E2%98%83")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 303);

    let documents = store.documents().await;
    assert_eq!(documents.len(), 1);
    assert_eq!(
        documents[0].1.fields.get("msg").map(String::as_str),
        Some("a=b&c d☃")
    );
}
