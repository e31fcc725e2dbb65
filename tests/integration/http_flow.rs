//! HTTP routes over a real pack service.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use packserve::app::build_service;
use packserve::web::{build_router, WebAppState};
use tower::ServiceExt;

use super::common::package_fixtures::PackageWorkspace;

fn router(ws: &PackageWorkspace, packages: Vec<std::path::PathBuf>) -> Router {
    let service = build_service(&ws.config(packages), ws.sink.clone()).unwrap();
    build_router(WebAppState::new(service), true)
}

async fn fetch(app: &Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, body.to_vec())
}

#[tokio::test]
async fn test_list_then_download() {
    let ws = PackageWorkspace::new();
    let foo = ws.add_package("foo", "1.2.3");
    let bar = ws.add_package("@scope/bar", "0.1.0");
    let app = router(&ws, vec![foo, bar]);

    let (status, _, body) = fetch(&app, "/api/packages").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["packages"], serde_json::json!(["@scope/bar", "foo"]));

    let (status, content_type, body) = fetch(&app, "/42/foo.tgz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/gzip"));
    assert_eq!(body, b"tarball for foo@1.2.3\n");

    let (status, _, body) = fetch(&app, "/42/@scope/bar.tgz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"tarball for @scope/bar@0.1.0\n");
}

#[tokio::test]
async fn test_repeated_download_reuses_archive() {
    let ws = PackageWorkspace::new();
    let foo = ws.add_package("foo", "1.0.0");
    let app = router(&ws, vec![foo]);

    for _ in 0..3 {
        let (status, _, _) = fetch(&app, "/7/foo.tgz").await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(ws.invocations(), 1);
}

#[tokio::test]
async fn test_errors_map_to_statuses() {
    let ws = PackageWorkspace::new();
    let foo = ws.add_package("foo", "1.0.0");
    let app = router(&ws, vec![foo.clone()]);

    let (status, _, _) = fetch(&app, "/1/unknown.tgz").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = fetch(&app, "/bad%20nonce/foo.tgz").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ws.set_failing(&foo, true);
    let (status, content_type, body) = fetch(&app, "/2/foo.tgz").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["details"].as_str().unwrap().contains("exit code 1"));

    // the failure was evicted, so fixing the package makes the same URL work
    ws.set_failing(&foo, false);
    let (status, _, _) = fetch(&app, "/2/foo.tgz").await;
    assert_eq!(status, StatusCode::OK);
}
