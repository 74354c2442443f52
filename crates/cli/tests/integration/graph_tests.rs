//! Graph command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn graph_prints_resolved_versions() {
  let env = TestEnv::from_fixture("sql101.toml");

  env
    .resolve_cmd("graph")
    .assert()
    .success()
    .stdout(predicate::str::contains("Resolved sql101 (6 packages)"))
    .stdout(predicate::str::contains("fmt/10.2.1"))
    .stdout(predicate::str::contains("sqlpp11/0.64"));

  assert!(!env.output_path().exists());
}

#[test]
fn graph_verbose_shows_requirement_paths() {
  let env = TestEnv::from_fixture("sql101.toml");

  env
    .resolve_cmd("graph")
    .arg("-v")
    .assert()
    .success()
    .stdout(predicate::str::contains("sql101 -> spdlog -> fmt"));
}

#[test]
fn graph_json_orders_dependencies_first() {
  let env = TestEnv::from_fixture("sql101.toml");

  let output = env.resolve_cmd("graph").arg("--format").arg("json").output().unwrap();
  assert!(output.status.success());

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let order: Vec<&str> = value["order"].as_array().unwrap().iter().map(|n| n.as_str().unwrap()).collect();
  assert_eq!(order.len(), 6);
  let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
  assert!(position("date") < position("sqlpp11"));
  assert!(position("fmt") < position("spdlog"));

  let roots = value["graph"]["roots"].as_array().unwrap();
  assert_eq!(roots[0], "sqlpp11");
}

#[test]
fn header_only_package_ignores_compiler() {
  let env = TestEnv::from_fixture("sql101.toml");

  let fingerprint = |compiler: &str| {
    let output = env
      .resolve_cmd("graph")
      .arg("-s")
      .arg(format!("compiler={}", compiler))
      .arg("--format")
      .arg("json")
      .output()
      .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    (
      value["graph"]["nodes"]["sqlpp11"]["fingerprint"].as_str().unwrap().to_string(),
      value["graph"]["nodes"]["gtest"]["fingerprint"].as_str().unwrap().to_string(),
    )
  };

  let (sqlpp_gcc, gtest_gcc) = fingerprint("gcc");
  let (sqlpp_clang, gtest_clang) = fingerprint("clang");
  assert_eq!(sqlpp_gcc, sqlpp_clang);
  assert_ne!(gtest_gcc, gtest_clang);
}
