//! Integration tests for the InvenTree client
//!
//! Each test starts a stub InvenTree server on a random local port and drives
//! the real reqwest transport against it.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::StreamExt;
use inventree_client::{
    ClientConfig, InvenTreeClient, InvenTreeClientTrait, InvenTreeError, Part, PrintProtocol, SharedClient,
};
use serde_json::{Map, Value, json};

const BASIC_ADMIN: &str = "Basic YWRtaW46aW52ZW50cmVl";
const TOKEN: &str = "0123456789abcdef";

#[derive(Clone)]
struct StubServer {
    api_version: u32,
    token_requests: Arc<AtomicUsize>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn authorized(headers: &HeaderMap) -> bool {
    let token = format!("Token {}", TOKEN);
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == BASIC_ADMIN || v == token)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Authentication credentials were not provided."})),
    )
        .into_response()
}

async fn api_root(State(server): State<StubServer>) -> Json<Value> {
    Json(json!({
        "server": "InvenTree",
        "version": "0.17.0",
        "instance": "Stub",
        "apiVersion": server.api_version,
    }))
}

async fn user_me(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"pk": 1, "username": "admin"})).into_response()
}

async fn user_token(
    State(server): State<StubServer>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == BASIC_ADMIN);
    if !basic {
        return unauthorized();
    }

    server.token_requests.fetch_add(1, Ordering::SeqCst);
    Json(json!({"token": TOKEN, "name": query.get("name")})).into_response()
}

fn part_record(pk: u64) -> Value {
    json!({"pk": pk, "name": format!("Part {}", pk), "active": true})
}

async fn part_list(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let parts = vec![part_record(1), part_record(2), part_record(3)];
    match query.get("limit").and_then(|l| l.parse::<usize>().ok()) {
        Some(limit) => Json(json!({
            "count": parts.len(),
            "next": null,
            "previous": null,
            "results": parts.into_iter().take(limit).collect::<Vec<_>>(),
        }))
        .into_response(),
        None => Json(Value::Array(parts)).into_response(),
    }
}

async fn part_create(headers: HeaderMap, Json(mut body): Json<Map<String, Value>>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    body.insert("pk".to_string(), json!(4));
    (StatusCode::CREATED, Json(Value::Object(body))).into_response()
}

async fn part_detail(headers: HeaderMap, Path(pk): Path<u64>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if (1..=3).contains(&pk) {
        Json(part_record(pk)).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
    }
}

async fn html_page() -> Html<&'static str> {
    Html("<html><body>Login</body></html>")
}

async fn media_file() -> Response {
    ([(header::CONTENT_TYPE, "application/octet-stream")], b"new contents".to_vec()).into_response()
}

async fn media_file_dropped() -> Response {
    // The connection breaks after the first chunk
    let chunks = futures::stream::iter([
        Ok(b"partial".as_slice()),
        Err(std::io::Error::other("connection dropped")),
    ])
    .then(|chunk| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        chunk
    });

    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(chunks),
    )
        .into_response()
}

async fn spawn_server(api_version: u32) -> (String, StubServer) {
    init_tracing();

    let server = StubServer {
        api_version,
        token_requests: Arc::new(AtomicUsize::new(0)),
    };

    let router = Router::new()
        .route("/api/", get(api_root))
        .route("/api/user/me/", get(user_me))
        .route("/api/user/token/", get(user_token))
        .route("/api/part/", get(part_list).post(part_create))
        .route("/api/part/{pk}/", get(part_detail))
        .route("/api/html/", get(html_page))
        .route("/media/files/data.bin", get(media_file))
        .route("/media/files/broken.bin", get(media_file_dropped))
        .route("/media/login/", get(html_page))
        .with_state(server.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });

    (format!("http://{}", addr), server)
}

async fn connect(host: &str) -> SharedClient {
    let config = ClientConfig::new(host).with_basic_auth("admin", "inventree");
    Arc::new(InvenTreeClient::connect(config).await.expect("connect"))
}

#[tokio::test]
async fn test_connect_requests_token() {
    let (host, server) = spawn_server(250).await;

    let config = ClientConfig::new(format!("{}/api/", host)).with_basic_auth("admin", "inventree");
    let client = InvenTreeClient::connect(config).await.expect("connect");

    assert_eq!(client.api_version(), 250);
    assert_eq!(client.print_protocol(), PrintProtocol::Modern);
    assert_eq!(client.base_url(), format!("{}/", host));
    assert_eq!(client.token(), Some(TOKEN));
    assert_eq!(client.username(), Some("admin"));
    assert_eq!(client.server_details()["instance"], json!("Stub"));
    assert_eq!(server.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_connect_with_token_skips_token_request() {
    let (host, server) = spawn_server(180).await;

    let config = ClientConfig::new(&host).with_token(TOKEN);
    let client = InvenTreeClient::connect(config).await.expect("connect");

    assert_eq!(client.print_protocol(), PrintProtocol::Legacy);
    assert_eq!(client.username(), Some("admin"));
    assert_eq!(server.token_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_connect_with_bad_credentials() {
    let (host, _) = spawn_server(250).await;

    let config = ClientConfig::new(&host).with_basic_auth("admin", "wrong");
    let err = InvenTreeClient::connect(config).await.expect_err("rejected");
    assert!(matches!(err, InvenTreeError::Authentication(_)), "{err:?}");
}

#[tokio::test]
async fn test_connect_rejects_old_server() {
    let (host, _) = spawn_server(1).await;

    let config = ClientConfig::new(&host).with_basic_auth("admin", "inventree");
    let err = InvenTreeClient::connect(config).await.expect_err("too old");
    assert!(matches!(err, InvenTreeError::IncompatibleServer { found: 1, .. }), "{err:?}");
}

#[tokio::test]
async fn test_list_and_count() -> anyhow::Result<()> {
    let (host, _) = spawn_server(250).await;
    let api = connect(&host).await;

    let parts = Part::list(&api, &[]).await?;
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[1].name(), Some("Part 2"));

    let paged = Part::list(&api, &[("limit", "2")]).await?;
    assert_eq!(paged.len(), 2);

    assert_eq!(Part::count(&api, &[]).await?, 3);
    Ok(())
}

#[tokio::test]
async fn test_create_adopts_server_record() -> anyhow::Result<()> {
    let (host, _) = spawn_server(250).await;
    let api = connect(&host).await;

    let mut data = Map::new();
    data.insert("pk".to_string(), json!(99));
    data.insert("name".to_string(), json!("Bracket"));

    let part = Part::create(&api, data).await?;
    assert_eq!(part.id(), Some(4));
    assert_eq!(part.name(), Some("Bracket"));
    Ok(())
}

#[tokio::test]
async fn test_missing_record_carries_status_and_url() {
    let (host, _) = spawn_server(250).await;
    let api = connect(&host).await;

    let err = Part::with_pk(&api, 99).await.expect_err("missing");
    assert_eq!(err.status_code(), Some(404));
    assert!(err.is_not_found());

    let InvenTreeError::Api(detail) = err else {
        panic!("expected an API error");
    };
    assert_eq!(detail.url, format!("{}/api/part/99/", host));
    assert_eq!(detail.method, "GET");
}

#[tokio::test]
async fn test_html_response_is_rejected() {
    let (host, _) = spawn_server(250).await;
    let api = connect(&host).await;

    let err = api.get("html", &[]).await.expect_err("not json");
    assert!(
        matches!(&err, InvenTreeError::ContentType { content_type, .. } if content_type.starts_with("text/html")),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_download_respects_overwrite() -> anyhow::Result<()> {
    let (host, _) = spawn_server(250).await;
    let api = connect(&host).await;

    let dir = tempfile::tempdir()?;
    let existing = dir.path().join("data.bin");
    std::fs::write(&existing, b"original")?;

    let err = api
        .download_file("/media/files/data.bin", dir.path(), false, &[])
        .await
        .expect_err("exists");
    assert!(matches!(err, InvenTreeError::FileExists(ref path) if path == &existing));
    assert_eq!(std::fs::read(&existing)?, b"original");

    let path = api
        .download_file("/media/files/data.bin", dir.path(), true, &[])
        .await?;
    assert_eq!(path, existing);
    assert_eq!(std::fs::read(&path)?, b"new contents");
    Ok(())
}

#[tokio::test]
async fn test_download_rejects_html() -> anyhow::Result<()> {
    let (host, _) = spawn_server(250).await;
    let api = connect(&host).await;

    let dir = tempfile::tempdir()?;
    let err = api
        .download_file("media/login/", &dir.path().join("page.html"), false, &[])
        .await
        .expect_err("html");
    assert!(matches!(err, InvenTreeError::ContentType { .. }));
    Ok(())
}

#[tokio::test]
async fn test_interrupted_download_leaves_no_file() -> anyhow::Result<()> {
    let (host, _) = spawn_server(250).await;
    let api = connect(&host).await;

    let dir = tempfile::tempdir()?;
    let target = dir.path().join("broken.bin");

    api.download_file("/media/files/broken.bin", dir.path(), false, &[])
        .await
        .expect_err("interrupted");
    assert!(!target.exists());

    // Nothing is left behind to block the next attempt
    let err = api
        .download_file("/media/files/broken.bin", dir.path(), false, &[])
        .await
        .expect_err("interrupted again");
    assert!(!matches!(err, InvenTreeError::FileExists(_)), "{err:?}");
    Ok(())
}
