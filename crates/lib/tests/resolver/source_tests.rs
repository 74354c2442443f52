use std::sync::Arc;

use cairn_lib::metadata::{HttpIndex, IndexDirectory};
use cairn_lib::resolve::{ResolveError, Resolver};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use super::common::*;

#[tokio::test]
async fn resolves_from_index_directory() {
  let index = TempDir::new().unwrap();
  std::fs::write(
    index.path().join("libx.json"),
    r#"{"name": "libx", "versions": [
      {"version": "1.2", "requires": ["liby/[>=1.0 <2.0]"], "settings": ["os", "arch"],
       "cpp_info": {"libs": ["x"], "defines": ["LIBX_STATIC"]}}
    ]}"#,
  )
  .unwrap();
  std::fs::write(
    index.path().join("liby.json"),
    r#"{"name": "liby", "versions": [{"version": "1.0"}, {"version": "1.7"}, {"version": "2.0"}]}"#,
  )
  .unwrap();

  let graph = Resolver::new(Arc::new(IndexDirectory::new(index.path())), config(&package_root()))
    .resolve(&requirements(&["libx/1.2"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(graph.get("liby").unwrap().version.as_str(), "1.7");
  let libx = graph.get("libx").unwrap();
  assert_eq!(libx.artifacts.definitions, vec!["LIBX_STATIC"]);
  assert!(libx.package_folder.starts_with(package_root().join("libx").join("1.2")));
}

#[tokio::test]
async fn http_index_server_errors_are_retried() {
  let mut server = mockito::Server::new_async().await;
  let failing = server
    .mock("GET", "/fmt.json")
    .with_status(503)
    .expect(3)
    .create_async()
    .await;

  let mut cfg = config(&package_root());
  cfg.max_retries = 2;

  let err = Resolver::new(Arc::new(HttpIndex::new(&server.url()).unwrap()), cfg)
    .resolve(&requirements(&["fmt/10.2.1"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap_err();

  failing.assert_async().await;
  assert!(matches!(err, ResolveError::MetadataUnavailable { attempts: 3, .. }));
}

#[tokio::test]
async fn http_index_resolves_graph() {
  let mut server = mockito::Server::new_async().await;
  let _spdlog = server
    .mock("GET", "/spdlog.json")
    .with_body(r#"{"name": "spdlog", "versions": [{"version": "1.13.0", "requires": ["fmt/10.2.1"]}]}"#)
    .create_async()
    .await;
  let _fmt = server
    .mock("GET", "/fmt.json")
    .with_body(r#"{"name": "fmt", "versions": [{"version": "10.2.1", "cpp_info": {"libs": ["fmt"]}}]}"#)
    .create_async()
    .await;

  let graph = Resolver::new(Arc::new(HttpIndex::new(&server.url()).unwrap()), config(&package_root()))
    .resolve(&requirements(&["spdlog/1.13.0"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(graph.len(), 2);
  assert_eq!(graph.get("spdlog").unwrap().dependencies, vec!["fmt"]);
}
