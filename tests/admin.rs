//! Admin server endpoints and lifecycle.

use axum::http::StatusCode;
use service_base::{AdminServer, Logger};

mod common;

#[tokio::test]
async fn test_metrics_and_cmdline() {
    let (server, addr) = common::start_admin(Logger::nop()).await;
    let client = common::client();

    let res = client.get(format!("http://{addr}/metrics")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("http://{addr}/debug/pprof/cmdline"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(!body.is_empty());

    server.shutdown();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_add_handler() {
    let (server, addr) = common::start_admin(Logger::nop()).await;

    // Registered after start on purpose.
    server.add_handler("/special-path", |request: axum::extract::Request| async move {
        if request.uri().path() != "/special-path" {
            return (StatusCode::BAD_REQUEST, String::new());
        }
        (StatusCode::OK, "special".to_string())
    });

    let res = common::client()
        .get(format!("http://{addr}/special-path"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "special");

    server.shutdown();
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (server, addr) = common::start_admin(Logger::nop()).await;

    let res = common::client()
        .get(format!("http://{addr}/nothing-here"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.shutdown();
}

#[tokio::test]
async fn test_add_version_handler() {
    let server = AdminServer::new(":0", Logger::nop());
    server.start().await.unwrap();
    server.add_version_handler("v0.1.0");

    let res = common::client()
        .get(format!("http://localhost{}/version", server.bind_addr()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "v0.1.0");

    server.shutdown();
}

#[tokio::test]
async fn test_bind_addr() {
    let server = AdminServer::new(":0", Logger::nop());
    server.add_handler("/test/ping", |_request| async { StatusCode::OK });

    server.start().await.unwrap();
    assert_ne!(server.bind_addr(), ":0");

    let res = common::client()
        .get(format!("http://localhost{}/test/ping", server.bind_addr()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.shutdown();
}

#[tokio::test]
async fn test_health_checks() {
    let (server, addr) = common::start_admin(Logger::nop()).await;
    let client = common::client();

    let res = client.get(format!("http://{addr}/live")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.add_liveness_check("cache", || Ok(()));
    server.add_readiness_check("db", || Err("connection refused".to_string()));

    let res = client.get(format!("http://{addr}/live")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["cache"], "good");

    let res = client.get(format!("http://{addr}/ready")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["db"], "connection refused");

    server.shutdown();
}

#[tokio::test]
async fn test_bind_failure_is_logged() {
    let (first, addr) = common::start_admin(Logger::nop()).await;

    let (buffer, logger) = Logger::buffer();
    let second = AdminServer::new(addr.to_string(), logger);
    assert!(second.start().await.is_err());

    let out = buffer.contents();
    assert!(out.contains("level=error"));
    assert!(out.contains("admin server failed to bind"));
    assert!(out.contains("caller_0="));

    first.shutdown();
}

#[tokio::test]
async fn test_shutdown_stops_serving() {
    let (server, addr) = common::start_admin(Logger::nop()).await;
    server.shutdown();
    server.wait().await.unwrap();

    let res = common::client().get(format!("http://{addr}/metrics")).send().await;
    assert!(res.is_err());
}
