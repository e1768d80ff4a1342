//! Gateway forwarding against real upstream servers on ephemeral ports.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::header::{ALLOW, HOST};
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::Router;
use shelf_gateway::{build_router, Gateway, Pools};
use shelf_kernel::settings::PoolSettings;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Upstream that answers `name|method|uri|host|request-id|body`.
async fn spawn_upstream(name: &'static str) -> String {
    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| async move {
            let header = |key: &str| {
                headers
                    .get(key)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string()
            };
            format!(
                "{name}|{method}|{uri}|{}|{}|{}",
                header(HOST.as_str()),
                header("x-request-id"),
                String::from_utf8_lossy(&body)
            )
        },
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{address}")
}

/// Upstream that answers with the listed request headers as
/// `name=value` lines, empty when absent, and sets two headers of its own.
async fn spawn_header_echo(names: &'static [&'static str]) -> String {
    let app = Router::new().fallback(move |headers: HeaderMap| async move {
        let lines: Vec<String> = names
            .iter()
            .map(|name| {
                let value = headers
                    .get(*name)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("");
                format!("{name}={value}")
            })
            .collect();
        (
            [("proxy-connection", "keep-alive"), ("x-upstream-tag", "catalog")],
            lines.join("\n"),
        )
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{address}")
}

/// An address nothing listens on.
async fn dead_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{address}")
}

async fn topology() -> Router {
    let settings = PoolSettings {
        full: vec![spawn_upstream("full").await],
        get: vec![spawn_upstream("get-1").await, spawn_upstream("get-2").await],
        post: vec![spawn_upstream("post").await],
        put: vec![spawn_upstream("put").await],
        delete: vec![spawn_upstream("delete").await],
    };
    build_router(Arc::new(Gateway::new(Pools::from_settings(&settings).unwrap())))
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    parts: Vec<String>,
}

impl Reply {
    fn pool(&self) -> &str {
        &self.parts[0]
    }

    fn error_code(&self) -> String {
        let body: serde_json::Value = serde_json::from_str(&self.parts.join("|")).unwrap();
        assert!(body["error"]["trace_id"].is_string());
        body["error"]["code"].as_str().unwrap().to_string()
    }
}

async fn send(router: &Router, method: Method, uri: &str, body: &'static str) -> Reply {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(HOST, "gateway.local")
        .body(Body::from(body))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    Reply {
        status,
        headers,
        parts: text.split('|').map(str::to_string).collect(),
    }
}

#[tokio::test]
async fn api_requests_reach_the_pool_for_their_method() {
    let router = topology().await;

    let reply = send(&router, Method::GET, "/api/books", "").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.pool().starts_with("get-"));

    let body = r#"{"name":"Dune","author":"Herbert","isbn":"0-441-17271-7","pages":412,"year":1965}"#;
    let reply = send(&router, Method::POST, "/api/books", body).await;
    assert_eq!(reply.pool(), "post");
    assert_eq!(reply.parts[1], "POST");
    assert_eq!(reply.parts[5], body);

    let reply = send(&router, Method::PUT, "/api/books", "{}").await;
    assert_eq!(reply.pool(), "put");

    let reply = send(
        &router,
        Method::DELETE,
        "/api/books/65f1c0ffee0000000000beef?force=1",
        "",
    )
    .await;
    assert_eq!(reply.pool(), "delete");
    assert_eq!(reply.parts[2], "/api/books/65f1c0ffee0000000000beef?force=1");
}

#[tokio::test]
async fn everything_outside_api_reaches_the_full_pool() {
    let router = topology().await;

    for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
        let reply = send(&router, method.clone(), "/", "").await;
        assert_eq!(reply.pool(), "full", "{method} /");
        assert_eq!(reply.parts[1], method.as_str());
    }

    for path in ["/books", "/authors", "/years", "/css/site.css", "/apiary"] {
        assert_eq!(send(&router, Method::GET, path, "").await.pool(), "full");
    }
}

#[tokio::test]
async fn unrouted_api_method_is_rejected_at_the_gateway() {
    let router = topology().await;

    let reply = send(&router, Method::PATCH, "/api/books", "{}").await;
    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(reply.headers[ALLOW], "GET, POST, PUT, DELETE");
    assert_eq!(reply.error_code(), "method_not_allowed");
}

#[tokio::test]
async fn pool_replicas_are_used_in_turn() {
    let router = topology().await;

    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(send(&router, Method::GET, "/api/books", "").await.pool().to_string());
    }
    assert_eq!(seen, vec!["get-1", "get-2", "get-1", "get-2"]);
}

#[tokio::test]
async fn upstream_sees_its_own_host_and_the_request_id() {
    let router = topology().await;

    let reply = send(&router, Method::GET, "/books", "").await;
    let host = &reply.parts[3];
    assert!(host.starts_with("127.0.0.1:"), "unexpected host {host}");

    let request_id = &reply.parts[4];
    assert!(!request_id.is_empty());
    assert_eq!(reply.headers["x-request-id"], request_id.as_str());
}

#[tokio::test]
async fn unreachable_upstream_is_a_bad_gateway() {
    let live = spawn_upstream("live").await;
    let settings = PoolSettings {
        full: vec![live.clone()],
        get: vec![dead_upstream().await],
        post: vec![live.clone()],
        put: vec![live.clone()],
        delete: vec![live],
    };
    let router = build_router(Arc::new(Gateway::new(Pools::from_settings(&settings).unwrap())));

    let reply = send(&router, Method::GET, "/api/books", "").await;
    assert_eq!(reply.status, StatusCode::BAD_GATEWAY);
    assert_eq!(reply.error_code(), "bad_gateway");

    let reply = send(&router, Method::GET, "/", "").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.pool(), "live");
}

#[tokio::test]
async fn hop_by_hop_headers_stop_at_the_gateway() {
    const NAMES: &[&str] = &["connection", "x-hop", "keep-alive", "te", "x-catalog-client"];
    let upstream = spawn_header_echo(NAMES).await;
    let settings = PoolSettings {
        full: vec![upstream.clone()],
        get: vec![upstream.clone()],
        post: vec![upstream.clone()],
        put: vec![upstream.clone()],
        delete: vec![upstream],
    };
    let router = build_router(Arc::new(Gateway::new(Pools::from_settings(&settings).unwrap())));

    let request = Request::builder()
        .uri("/books")
        .header("connection", "x-hop")
        .header("x-hop", "secret")
        .header("keep-alive", "timeout=5")
        .header("te", "trailers")
        .header("x-catalog-client", "shelf-tests")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("proxy-connection"));
    assert_eq!(response.headers()["x-upstream-tag"], "catalog");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let seen = String::from_utf8(bytes.to_vec()).unwrap();
    let seen: Vec<&str> = seen.lines().collect();
    assert_eq!(
        seen,
        vec![
            "connection=",
            "x-hop=",
            "keep-alive=",
            "te=",
            "x-catalog-client=shelf-tests",
        ]
    );
}
