//! Pack runner, cache and service working together against a fake tool.

use std::sync::Arc;

use packserve::app::build_service;
use packserve::pack::{CommandPackRunner, PackError, PackFailure, PackRunner};
use packserve::stream::ColorRegistry;
use packserve::util::PackageManager;

use super::common::package_fixtures::PackageWorkspace;

#[tokio::test]
async fn test_end_to_end_pack_with_nonce() {
    let ws = PackageWorkspace::new();
    let foo = ws.add_package("foo", "1.2.3");
    let service = build_service(&ws.config(vec![foo]), ws.sink.clone()).unwrap();

    let path = service.request_package("foo", "42").await.unwrap();

    assert!(path.ends_with("foo-1.2.3.tgz"));
    assert_eq!(path, ws.archives().join("42").join("foo-1.2.3.tgz"));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "tarball for foo@1.2.3\n"
    );

    let lines = ws.sink.lines();
    assert!(lines.iter().all(|l| l.starts_with("[foo] ")));
    assert!(lines.iter().any(|l| l.contains("prepack")));
    assert!(lines.iter().any(|l| l.contains("npm notice")));
    assert!(!lines.iter().any(|l| l.contains("\"filename\"")));
}

#[tokio::test]
async fn test_concurrent_requests_share_one_build() {
    let ws = PackageWorkspace::new();
    let foo = ws.add_package("foo", "1.0.0");
    let service = build_service(&ws.config(vec![foo]), ws.sink.clone()).unwrap();

    let (a, b, c) = tokio::join!(
        service.request_package("foo", "1"),
        service.request_package("foo", "1"),
        service.request_package("foo", "1")
    );

    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
    assert_eq!(ws.invocations(), 1);

    service.request_package("foo", "2").await.unwrap();
    assert_eq!(ws.invocations(), 2);
}

#[tokio::test]
async fn test_failed_build_is_retried_on_next_request() {
    let ws = PackageWorkspace::new();
    let foo = ws.add_package("foo", "1.0.0");
    let service = build_service(&ws.config(vec![foo.clone()]), ws.sink.clone()).unwrap();

    ws.set_failing(&foo, true);
    let err = service.request_package("foo", "9").await.unwrap_err();
    assert!(matches!(
        err.build_error(),
        Some(PackError::Exit { code: Some(1) })
    ));
    assert!(ws.sink.lines().iter().any(|l| l.contains("npm ERR!")));

    ws.set_failing(&foo, false);
    let path = service.request_package("foo", "9").await.unwrap();
    assert!(path.ends_with("foo-1.0.0.tgz"));
    assert_eq!(ws.invocations(), 2);
}

#[tokio::test]
async fn test_scoped_package_and_unknown_name() {
    let ws = PackageWorkspace::new();
    let bar = ws.add_package("@scope/bar", "0.3.0");
    let service = build_service(&ws.config(vec![bar]), ws.sink.clone()).unwrap();

    assert_eq!(service.list(), vec!["@scope/bar"]);
    let path = service.request_package("@scope/bar", "1").await.unwrap();
    assert!(path.ends_with("scope-bar-0.3.0.tgz"));

    assert!(matches!(
        service.request_package("bar", "1").await,
        Err(PackFailure::UnknownPackage(_))
    ));
}

#[tokio::test]
async fn test_unusable_directories_are_skipped() {
    let ws = PackageWorkspace::new();
    let foo = ws.add_package("foo", "1.0.0");
    let missing = ws.root.join("does-not-exist");

    let service = build_service(&ws.config(vec![missing.clone(), foo]), ws.sink.clone()).unwrap();
    assert_eq!(service.list(), vec!["foo"]);

    assert!(build_service(&ws.config(vec![missing]), ws.sink.clone()).is_err());
}

#[tokio::test]
async fn test_runner_honors_configured_tool() {
    let ws = PackageWorkspace::new();
    let foo = ws.add_package("foo", "2.0.0");
    let runner = CommandPackRunner::new(
        ws.tool_paths(),
        PackageManager::Npm,
        Arc::new(ColorRegistry::new(false)),
        ws.sink.clone(),
    );

    let path = runner.pack(&foo, &ws.archives().join("x")).await.unwrap();

    assert!(path.is_absolute());
    assert!(path.ends_with("x/foo-2.0.0.tgz"));
}
