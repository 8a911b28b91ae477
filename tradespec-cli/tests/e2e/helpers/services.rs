//! Mock HTTP services.

#![allow(dead_code)]

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use serde_json::Value;
use tokio::net::TcpListener;

use super::fixtures;

/// Serve `router` on an ephemeral port and return its base URL (`http://addr/`).
pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock service");
    let addr = listener.local_addr().expect("mock service addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}/")
}

/// Router answering `GET path` with a fixed JSON body.
pub fn json_route(router: Router, path: &str, body: Value) -> Router {
    router.route(
        path,
        get(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    )
}

/// Router answering `GET path` with a bare status code.
pub fn status_route(router: Router, path: &str, status: StatusCode) -> Router {
    router.route(path, get(move || async move { (status, "mock failure") }))
}

/// Quote service answering with `body`.
pub async fn quote_service(body: Value) -> String {
    spawn(json_route(Router::new(), "/", body)).await
}

/// Audit service answering with `trades`.
pub async fn audit_service(trades: Value) -> String {
    spawn(json_route(Router::new(), "/", trades)).await
}

/// Dashboard with an HTML root plus `operations/` and `discovery/`.
pub async fn dashboard(operations: Value, discovery: Value) -> String {
    let router = Router::new().route(
        "/",
        get(|| async { Html("<html><body>trader dashboard</body></html>") }),
    );
    let router = json_route(router, "/operations/", operations);
    let router = json_route(router, "/discovery/", discovery);
    spawn(router).await
}

/// Dashboard whose endpoints match every default expectation.
pub async fn healthy_dashboard() -> String {
    dashboard(fixtures::trades(3), fixtures::discovery_records(5, "UP")).await
}

/// An address nothing listens on.
pub async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}/")
}
