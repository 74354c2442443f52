//! Settings command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn settings_shows_assignments_and_fingerprint() {
  let env = TestEnv::empty();

  env
    .cairn_cmd()
    .arg("settings")
    .arg("-s")
    .arg("compiler=clang")
    .assert()
    .success()
    .stdout(predicate::str::contains("compiler: clang"))
    .stdout(predicate::str::contains("fingerprint"));
}

#[test]
fn command_line_overrides_profile() {
  let env = TestEnv::empty();
  let profile = env.write_file(
    "profiles/clang.toml",
    "[settings]\nos = \"linux\"\ncompiler = \"clang\"\ncompiler_version = \"17\"\n",
  );

  let output = env
    .cairn_cmd()
    .arg("settings")
    .arg("--profile")
    .arg(&profile)
    .arg("-s")
    .arg("compiler.version=18")
    .arg("--format")
    .arg("json")
    .output()
    .unwrap();
  assert!(output.status.success());

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["settings"]["compiler"], "clang");
  assert_eq!(value["settings"]["compiler_version"], "18");
  assert_eq!(value["fingerprint"].as_str().unwrap().len(), 20);
}

#[test]
fn default_profile_is_layered_under_explicit_profile() {
  let env = TestEnv::empty();
  env.write_file(
    "home/config/profiles/default.toml",
    "[settings]\nbuild_type = \"Debug\"\ncompiler = \"gcc\"\n",
  );
  let profile = env.write_file("clang.toml", "[settings]\ncompiler = \"clang\"\n");

  let output = env
    .cairn_cmd()
    .arg("settings")
    .arg("--profile")
    .arg(&profile)
    .arg("--format")
    .arg("json")
    .output()
    .unwrap();
  assert!(output.status.success());

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["settings"]["build_type"], "Debug");
  assert_eq!(value["settings"]["compiler"], "clang");
}

#[test]
fn invalid_assignment_is_reported() {
  let env = TestEnv::empty();

  env
    .cairn_cmd()
    .arg("settings")
    .arg("-s")
    .arg("flavor=vanilla")
    .assert()
    .failure()
    .stderr(predicate::str::contains("UnknownAxis"));
}

#[test]
fn unreadable_profile_is_reported_as_json() {
  let env = TestEnv::empty();

  let output = env
    .cairn_cmd()
    .arg("settings")
    .arg("--profile")
    .arg(env.temp.path().join("absent.toml"))
    .arg("--format")
    .arg("json")
    .output()
    .unwrap();
  assert_eq!(output.status.code(), Some(1));

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["kind"], "Profile");
}
