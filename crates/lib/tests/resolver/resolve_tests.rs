use std::sync::Arc;
use std::time::Duration;

use cairn_lib::metadata::MemorySource;
use cairn_lib::resolve::{ResolveError, Resolver};
use cairn_lib::settings::{SettingsAxis, SettingsContext};
use tokio_util::sync::CancellationToken;

use super::common::*;

fn resolver(source: impl cairn_lib::metadata::MetadataSource + 'static) -> Resolver {
  Resolver::new(Arc::new(source), config(&package_root()))
}

#[tokio::test]
async fn range_selects_highest_satisfying_version() {
  let source = MemorySource::new()
    .with_package("libx", pkg("1.2").requires(r("liby/[>=1.0 <2.0]")))
    .with_package("liby", pkg("1.0"))
    .with_package("liby", pkg("1.4"))
    .with_package("liby", pkg("2.0"));

  let graph = resolver(source)
    .resolve(&requirements(&["libx/1.2"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(graph.len(), 2);
  assert_eq!(graph.roots(), &["libx".to_string()]);
  assert_eq!(graph.get("libx").unwrap().version.as_str(), "1.2");
  assert_eq!(graph.get("liby").unwrap().version.as_str(), "1.4");
}

#[tokio::test]
async fn every_edge_is_satisfied_by_its_target() {
  let source = MemorySource::new()
    .with_package("app-core", pkg("3.0").requires(r("fmt/[>=9.0 <11.0]")).requires(r("zlib/1.3")))
    .with_package("spdlog", pkg("1.13.0").requires(r("fmt/^10.0")))
    .with_package("fmt", pkg("9.1.0"))
    .with_package("fmt", pkg("10.2.1"))
    .with_package("fmt", pkg("11.0.0"))
    .with_package("zlib", pkg("1.3"));

  let graph = resolver(source)
    .resolve(
      &requirements(&["app-core/3.0", "spdlog/1.13.0"]),
      &linux_gcc(),
      &CancellationToken::new(),
    )
    .await
    .unwrap();

  assert_eq!(graph.len(), 4);
  assert_eq!(graph.get("fmt").unwrap().version.as_str(), "10.2.1");
  let order: Vec<_> = graph.topological_order().iter().map(|n| n.name.as_str()).collect();
  assert_eq!(order, vec!["fmt", "spdlog", "zlib", "app-core"]);
}

#[tokio::test]
async fn incompatible_constraints_conflict() {
  let source = MemorySource::new()
    .with_package("a", pkg("1.0").requires(r("c/1.0")))
    .with_package("b", pkg("1.0").requires(r("c/2.0")))
    .with_package("c", pkg("1.0"))
    .with_package("c", pkg("2.0"));

  let err = resolver(source)
    .resolve(&requirements(&["a/1.0", "b/1.0"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap_err();

  match err {
    ResolveError::VersionConflict {
      package,
      selected,
      existing,
      existing_path,
      requested,
      requested_path,
    } => {
      assert_eq!(package, "c");
      assert_eq!(selected.as_str(), "1.0");
      assert_eq!(existing, "1.0");
      assert_eq!(existing_path.to_string(), "app -> a -> c");
      assert_eq!(requested, "2.0");
      assert_eq!(requested_path.to_string(), "app -> b -> c");
    }
    other => panic!("expected VersionConflict, got {other}"),
  }
}

#[tokio::test]
async fn two_node_cycle_is_rejected() {
  let source = MemorySource::new()
    .with_package("a", pkg("1.0").requires(r("b/1.0")))
    .with_package("b", pkg("1.0").requires(r("a/1.0")));

  let err = resolver(source)
    .resolve(&requirements(&["a/1.0"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap_err();

  match err {
    ResolveError::CyclicDependency { cycle, path } => {
      assert_eq!(cycle, vec!["a", "b", "a"]);
      assert_eq!(path.to_string(), "app -> a -> b -> a");
    }
    other => panic!("expected CyclicDependency, got {other}"),
  }
}

#[tokio::test]
async fn cycle_between_shared_dependencies_is_rejected() {
  // b and c are both reached from the roots first, so neither path repeats
  // a name; the cycle only shows up in the final graph.
  let source = MemorySource::new()
    .with_package("a", pkg("1.0").requires(r("b/1.0")))
    .with_package("c", pkg("1.0").requires(r("b/1.0")))
    .with_package("b", pkg("1.0").requires(r("c/1.0")));

  let err = resolver(source)
    .resolve(&requirements(&["a/1.0", "c/1.0"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap_err();

  assert!(matches!(err, ResolveError::CyclicDependency { .. }), "got {err}");
}

#[tokio::test]
async fn diamond_collapses_to_one_node() {
  let source = MemorySource::new()
    .with_package("left", pkg("1.0").requires(r("base/[>=1.0 <2.0]")))
    .with_package("right", pkg("1.0").requires(r("base/1.1")))
    .with_package("base", pkg("1.0"))
    .with_package("base", pkg("1.1"));

  let graph = resolver(source)
    .resolve(&requirements(&["left/1.0", "right/1.0"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(graph.len(), 3);
  let base = graph.get("base").unwrap();
  assert_eq!(base.version.as_str(), "1.1");
  assert_eq!(base.required_by.to_string(), "app -> left -> base");
}

#[tokio::test]
async fn missing_required_axis_fails_before_any_query() {
  let source = Arc::new(MemorySource::new().with_package("libx", pkg("1.0")));
  let settings = SettingsContext::new()
    .with(SettingsAxis::Os, "linux")
    .with(SettingsAxis::Compiler, "gcc")
    .with(SettingsAxis::BuildType, "Release");

  let err = Resolver::new(source.clone(), config(&package_root()))
    .resolve(&requirements(&["libx/1.0"]), &settings, &CancellationToken::new())
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    ResolveError::MissingAxis {
      axis: SettingsAxis::Arch,
      path: None
    }
  ));
  assert_eq!(source.query_count(), 0);
}

#[tokio::test]
async fn header_only_packages_ignore_compiler() {
  let source = || {
    MemorySource::new()
      .with_package("catch2", pkg("3.5.0").settings([]))
      .with_package("fmt", pkg("10.2.1").libs(["fmt"]))
  };
  let refs = requirements(&["catch2/3.5.0", "fmt/10.2.1"]);
  let clang = linux_gcc().with(SettingsAxis::Compiler, "clang");

  let with_gcc = resolver(source())
    .resolve(&refs, &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();
  let with_clang = resolver(source())
    .resolve(&refs, &clang, &CancellationToken::new())
    .await
    .unwrap();

  let catch2 = (with_gcc.get("catch2").unwrap(), with_clang.get("catch2").unwrap());
  assert!(catch2.0.relevant_axes.is_empty());
  assert_eq!(catch2.0.fingerprint, catch2.1.fingerprint);
  assert_eq!(catch2.0.package_folder, catch2.1.package_folder);

  let fmt = (with_gcc.get("fmt").unwrap(), with_clang.get("fmt").unwrap());
  assert_ne!(fmt.0.fingerprint, fmt.1.fingerprint);
  assert_ne!(with_gcc.settings_fingerprint(), with_clang.settings_fingerprint());
}

#[tokio::test]
async fn relevant_axes_limit_the_fingerprint() {
  let source = || MemorySource::new().with_package("zlib", pkg("1.3").settings([SettingsAxis::Os, SettingsAxis::Arch]));
  let debug = linux_gcc().with(SettingsAxis::BuildType, "Debug");

  let release = resolver(source())
    .resolve(&requirements(&["zlib/1.3"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();
  let debug = resolver(source())
    .resolve(&requirements(&["zlib/1.3"]), &debug, &CancellationToken::new())
    .await
    .unwrap();

  let node = release.get("zlib").unwrap();
  assert_eq!(node.relevant_axes, vec![SettingsAxis::Arch, SettingsAxis::Os]);
  assert_eq!(node.fingerprint, debug.get("zlib").unwrap().fingerprint);
}

#[tokio::test]
async fn concurrent_and_sequential_resolution_agree() {
  let build = || {
    let memory = MemorySource::new()
      .with_package("a", pkg("1.0").requires(r("shared/[>=1.0 <3.0]")).requires(r("x/1.0")))
      .with_package("b", pkg("1.0").requires(r("shared/1.5")).requires(r("y/1.0")))
      .with_package("c", pkg("1.0").requires(r("y/[>=1.0]")))
      .with_package("shared", pkg("1.5"))
      .with_package("shared", pkg("2.5"))
      .with_package("x", pkg("1.0"))
      .with_package("y", pkg("1.0"))
      .with_package("y", pkg("1.2"));
    // Earlier names answer last so completion order is the reverse of
    // frontier order.
    InstrumentedSource::new(memory)
      .delay("a", Duration::from_millis(60))
      .delay("b", Duration::from_millis(30))
      .delay("x", Duration::from_millis(40))
  };
  let refs = requirements(&["a/1.0", "b/1.0", "c/1.0"]);

  let mut sequential_config = config(&package_root());
  sequential_config.concurrency = 1;
  let sequential = Resolver::new(Arc::new(build()), sequential_config)
    .resolve(&refs, &linux_gcc(), &CancellationToken::new())
    .await;

  let mut concurrent_config = config(&package_root());
  concurrent_config.concurrency = 8;
  let concurrent = Resolver::new(Arc::new(build()), concurrent_config)
    .resolve(&refs, &linux_gcc(), &CancellationToken::new())
    .await;

  // shared/2.5 is selected via a first, then b's pin to 1.5 conflicts.
  match (sequential, concurrent) {
    (Err(ResolveError::VersionConflict { package: p1, .. }), Err(ResolveError::VersionConflict { package: p2, .. })) => {
      assert_eq!(p1, "shared");
      assert_eq!(p2, "shared");
    }
    (s, c) => panic!("expected matching conflicts, got {s:?} and {c:?}"),
  }
}

#[tokio::test]
async fn concurrent_and_sequential_graphs_are_identical() {
  let build = || {
    let memory = MemorySource::new()
      .with_package("a", pkg("1.0").requires(r("shared/[>=1.0 <3.0]")).requires(r("x/1.0")))
      .with_package("b", pkg("1.0").requires(r("shared/[>=2.0]")).requires(r("y/1.0")))
      .with_package("c", pkg("1.0").requires(r("y/[>=1.0]")))
      .with_package("shared", pkg("1.5"))
      .with_package("shared", pkg("2.5"))
      .with_package("x", pkg("1.0"))
      .with_package("y", pkg("1.0"))
      .with_package("y", pkg("1.2"));
    InstrumentedSource::new(memory)
      .delay("a", Duration::from_millis(60))
      .delay("b", Duration::from_millis(30))
      .delay("x", Duration::from_millis(40))
  };
  let refs = requirements(&["a/1.0", "b/1.0", "c/1.0"]);

  let mut graphs = Vec::new();
  for concurrency in [1, 2, 8] {
    let mut cfg = config(&package_root());
    cfg.concurrency = concurrency;
    let graph = Resolver::new(Arc::new(build()), cfg)
      .resolve(&refs, &linux_gcc(), &CancellationToken::new())
      .await
      .unwrap();
    graphs.push(graph);
  }

  assert_eq!(graphs[0], graphs[1]);
  assert_eq!(graphs[0], graphs[2]);
  // y is first reached through b (level 1, frontier order), pinned to 1.0.
  assert_eq!(graphs[0].get("y").unwrap().version.as_str(), "1.0");
  assert_eq!(graphs[0].get("y").unwrap().required_by.to_string(), "app -> b -> y");
}

#[tokio::test]
async fn shared_dependency_is_queried_once() {
  let memory = MemorySource::new()
    .with_package("a", pkg("1.0").requires(r("fmt/10.2.1")))
    .with_package("b", pkg("1.0").requires(r("fmt/[>=10.0]")))
    .with_package("c", pkg("1.0").requires(r("fmt/10.2.1")))
    .with_package("fmt", pkg("10.2.1"));
  let source = Arc::new(InstrumentedSource::new(memory).delay("fmt", Duration::from_millis(20)));

  Resolver::new(source.clone(), config(&package_root()))
    .resolve(&requirements(&["a/1.0", "b/1.0", "c/1.0"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(source.calls("fmt"), 1);
  assert_eq!(source.calls("a"), 1);
}

#[tokio::test]
async fn concurrency_is_bounded() {
  let mut memory = MemorySource::new();
  let mut names = Vec::new();
  for i in 0..8 {
    let name = format!("pkg{i}");
    memory = memory.with_package(&name, pkg("1.0"));
    names.push(format!("{name}/1.0"));
  }
  let mut source = InstrumentedSource::new(memory);
  for i in 0..8 {
    source = source.delay(&format!("pkg{i}"), Duration::from_millis(20));
  }
  let source = Arc::new(source);

  let mut cfg = config(&package_root());
  cfg.concurrency = 2;
  let refs: Vec<&str> = names.iter().map(String::as_str).collect();
  Resolver::new(source.clone(), cfg)
    .resolve(&requirements(&refs), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();

  assert!(source.max_in_flight() <= 2, "max in flight {}", source.max_in_flight());
}

#[tokio::test]
async fn slow_query_is_retried() {
  let memory = MemorySource::new().with_package("libx", pkg("1.0"));
  let source = Arc::new(InstrumentedSource::new(memory).stall("libx", 1));

  let mut cfg = config(&package_root());
  cfg.query_timeout = Duration::from_millis(50);
  cfg.max_retries = 2;

  let graph = Resolver::new(source.clone(), cfg)
    .resolve(&requirements(&["libx/1.0"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(graph.len(), 1);
  assert_eq!(source.calls("libx"), 2);
}

#[tokio::test]
async fn exhausted_retries_report_metadata_unavailable() {
  let memory = MemorySource::new().with_package("libx", pkg("1.0").requires(r("liby/1.0")));
  let source = Arc::new(InstrumentedSource::new(memory).stall("liby", usize::MAX));

  let mut cfg = config(&package_root());
  cfg.query_timeout = Duration::from_millis(20);
  cfg.max_retries = 2;

  let err = Resolver::new(source.clone(), cfg)
    .resolve(&requirements(&["libx/1.0"]), &linux_gcc(), &CancellationToken::new())
    .await
    .unwrap_err();

  match err {
    ResolveError::MetadataUnavailable {
      package, attempts, path, ..
    } => {
      assert_eq!(package, "liby");
      assert_eq!(attempts, 3);
      assert_eq!(path.to_string(), "app -> libx -> liby");
    }
    other => panic!("expected MetadataUnavailable, got {other}"),
  }
  assert_eq!(source.calls("liby"), 3);
}

#[tokio::test]
async fn cancelled_before_start() {
  let source = Arc::new(MemorySource::new().with_package("libx", pkg("1.0")));
  let cancel = CancellationToken::new();
  cancel.cancel();

  let err = Resolver::new(source.clone(), config(&package_root()))
    .resolve(&requirements(&["libx/1.0"]), &linux_gcc(), &cancel)
    .await
    .unwrap_err();

  assert!(matches!(err, ResolveError::Cancelled));
  assert_eq!(source.query_count(), 0);
}

#[tokio::test]
async fn cancelled_during_query() {
  let memory = MemorySource::new().with_package("libx", pkg("1.0"));
  let source = InstrumentedSource::new(memory).stall("libx", usize::MAX);
  let cancel = CancellationToken::new();

  let trigger = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(50)).await;
    trigger.cancel();
  });

  let started = std::time::Instant::now();
  let err = resolver(source)
    .resolve(&requirements(&["libx/1.0"]), &linux_gcc(), &cancel)
    .await
    .unwrap_err();

  assert!(matches!(err, ResolveError::Cancelled));
  assert!(started.elapsed() < Duration::from_secs(4));
}
