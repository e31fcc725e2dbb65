//! `bump` against a live server.

use std::fs;

use packserve::app::build_service;
use packserve::bump::{run_bump, BumpOptions};
use packserve::web::{build_router, WebAppState};

use super::common::package_fixtures::PackageWorkspace;

/// Serve `ws` on an ephemeral port and return the base URL.
async fn spawn_server(ws: &PackageWorkspace) -> String {
    let foo = ws.add_package("foo", "1.0.0");
    let service = build_service(&ws.config(vec![foo]), ws.sink.clone()).unwrap();
    let app = build_router(WebAppState::new(service), true);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

const CONSUMER: &str = r#"{
  "name": "consumer",
  "dependencies": {
    "zod": "^3.0.0",
    "foo": "^1.0.0"
  }
}
"#;

#[tokio::test]
async fn test_bump_rewrites_served_dependencies() {
    let ws = PackageWorkspace::new();
    let url = spawn_server(&ws).await;
    let manifest = ws.root.join("consumer.json");
    fs::write(&manifest, CONSUMER).unwrap();

    let options = BumpOptions {
        manifest: manifest.clone(),
        url: url.clone(),
        nonce: "77".to_string(),
        dry_run: false,
        only: Vec::new(),
    };
    let rewrites = run_bump(&options).await.unwrap();

    assert_eq!(rewrites.len(), 1);
    let expected = format!(
        "{{\n  \"name\": \"consumer\",\n  \"dependencies\": {{\n    \"zod\": \"^3.0.0\",\n    \"foo\": \"{url}/77/foo.tgz\"\n  }}\n}}\n"
    );
    assert_eq!(fs::read_to_string(&manifest).unwrap(), expected);
}

#[tokio::test]
async fn test_bump_dry_run_leaves_manifest() {
    let ws = PackageWorkspace::new();
    let url = spawn_server(&ws).await;
    let manifest = ws.root.join("consumer.json");
    fs::write(&manifest, CONSUMER).unwrap();

    let options = BumpOptions {
        manifest: manifest.clone(),
        url,
        nonce: "1".to_string(),
        dry_run: true,
        only: Vec::new(),
    };
    let rewrites = run_bump(&options).await.unwrap();

    assert_eq!(rewrites.len(), 1);
    assert_eq!(fs::read_to_string(&manifest).unwrap(), CONSUMER);
}
