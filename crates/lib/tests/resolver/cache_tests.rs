use std::sync::Arc;

use cairn_lib::metadata::MemorySource;
use cairn_lib::resolve::{ResolutionCache, ResolveError, Resolver};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use super::common::*;

fn populated() -> MemorySource {
  MemorySource::new()
    .with_package("spdlog", pkg("1.13.0").requires(r("fmt/10.2.1")).libs(["spdlog"]))
    .with_package("fmt", pkg("10.2.1").libs(["fmt"]))
}

#[tokio::test]
async fn exact_pins_are_served_from_cache() {
  let temp = TempDir::new().unwrap();
  let mut cfg = config(&package_root());
  cfg.cache_dir = Some(temp.path().to_path_buf());
  let refs = requirements(&["spdlog/1.13.0"]);

  let first = Resolver::new(Arc::new(populated()), cfg.clone())
    .resolve(&refs, &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();

  let cache = ResolutionCache::load(&ResolutionCache::path_in(temp.path()))
    .unwrap()
    .unwrap();
  assert_eq!(cache.len(), 2);

  // An empty source would fail every query.
  let empty = Arc::new(MemorySource::new());
  let second = Resolver::new(empty.clone(), cfg)
    .resolve(&refs, &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(empty.query_count(), 0);
  assert_eq!(first, second);
}

#[tokio::test]
async fn short_pin_reuses_zero_filled_entry() {
  let temp = TempDir::new().unwrap();
  let mut cfg = config(&package_root());
  cfg.cache_dir = Some(temp.path().to_path_buf());
  let refs = requirements(&["fmt/10.2"]);

  let source = Arc::new(MemorySource::new().with_package("fmt", pkg("10.2.0").libs(["fmt"])));
  for _ in 0..2 {
    let graph = Resolver::new(source.clone(), cfg.clone())
      .resolve(&refs, &linux_gcc(), &CancellationToken::new())
      .await
      .unwrap();
    assert_eq!(graph.get("fmt").unwrap().version.as_str(), "10.2.0");
  }

  assert_eq!(source.query_count(), 1);
}

#[tokio::test]
async fn ranges_always_query() {
  let temp = TempDir::new().unwrap();
  let mut cfg = config(&package_root());
  cfg.cache_dir = Some(temp.path().to_path_buf());

  let source = Arc::new(MemorySource::new().with_package("fmt", pkg("10.2.1")));
  Resolver::new(source.clone(), cfg.clone())
    .resolve(&requirements(&["fmt/[>=10.0 <11.0]"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();
  Resolver::new(source.clone(), cfg)
    .resolve(&requirements(&["fmt/[>=10.0 <11.0]"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(source.query_count(), 2);
}

#[tokio::test]
async fn cache_is_keyed_by_settings() {
  let temp = TempDir::new().unwrap();
  let mut cfg = config(&package_root());
  cfg.cache_dir = Some(temp.path().to_path_buf());
  let refs = requirements(&["fmt/10.2.1"]);

  Resolver::new(Arc::new(populated()), cfg.clone())
    .resolve(&refs, &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();

  let debug = linux_gcc().with(cairn_lib::settings::SettingsAxis::BuildType, "Debug");
  let err = Resolver::new(Arc::new(MemorySource::new()), cfg)
    .resolve(&refs, &debug, &CancellationToken::new())
    .await
    .unwrap_err();

  assert!(matches!(err, ResolveError::PackageNotFound { .. }));
}

#[tokio::test]
async fn corrupt_cache_is_ignored_and_replaced() {
  let temp = TempDir::new().unwrap();
  let path = ResolutionCache::path_in(temp.path());
  std::fs::write(&path, "{ definitely not json").unwrap();

  let mut cfg = config(&package_root());
  cfg.cache_dir = Some(temp.path().to_path_buf());

  Resolver::new(Arc::new(populated()), cfg)
    .resolve(&requirements(&["fmt/10.2.1"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();

  let cache = ResolutionCache::load(&path).unwrap().unwrap();
  assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn failed_resolution_leaves_cache_untouched() {
  let temp = TempDir::new().unwrap();
  let mut cfg = config(&package_root());
  cfg.cache_dir = Some(temp.path().to_path_buf());

  let source = MemorySource::new().with_package("spdlog", pkg("1.13.0").requires(r("fmt/10.2.1")));
  let err = Resolver::new(Arc::new(source), cfg)
    .resolve(&requirements(&["spdlog/1.13.0"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap_err();

  assert!(matches!(err, ResolveError::PackageNotFound { .. }));
  assert!(!ResolutionCache::path_in(temp.path()).exists());
}
