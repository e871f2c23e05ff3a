use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn normalize_output(output: &[u8]) -> String {
    String::from_utf8_lossy(output).replace("\r\n", "\n")
}

fn cargo_project(dir: &Path) {
    fs::write(
        dir.join("Cargo.toml"),
        "[package]\nname = \"demo\"\nversion = \"0.2.0\"\n",
    )
    .expect("write Cargo.toml");
    fs::create_dir_all(dir.join("src")).expect("src");
    fs::create_dir_all(dir.join("tests")).expect("tests");
}

#[test]
fn export_prints_properties_for_cargo_project() {
    let tmp = tempdir().expect("tempdir");
    cargo_project(tmp.path());

    let assert = Command::cargo_bin("propex")
        .expect("binary")
        .current_dir(tmp.path())
        .arg("export")
        .assert()
        .success();

    let stdout = normalize_output(&assert.get_output().stdout);
    assert_eq!(
        stdout,
        "sonar.exclusions=target/**\n\
         sonar.projectName=demo\n\
         sonar.projectVersion=0.2.0\n\
         sonar.sources=src\n\
         sonar.tests=tests\n"
    );
}

#[test]
fn export_json_includes_config_overrides() {
    let tmp = tempdir().expect("tempdir");
    cargo_project(tmp.path());
    fs::write(
        tmp.path().join("propex.yml"),
        "sources: [build/generated]\nproperties:\n  sonar.projectKey: demo-key\n",
    )
    .expect("write propex.yml");
    fs::create_dir_all(tmp.path().join("build/generated")).expect("generated");

    let assert = Command::cargo_bin("propex")
        .expect("binary")
        .args(["export", "--json"])
        .arg(tmp.path())
        .assert()
        .success();

    let stdout = normalize_output(&assert.get_output().stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(parsed["sonar.projectKey"], "demo-key");
    let sources = parsed["sonar.sources"].as_str().expect("sources");
    assert!(sources.starts_with("src;build"), "sources were: {sources}");
}

#[test]
fn detect_lists_applicable_configurators() {
    let tmp = tempdir().expect("tempdir");
    cargo_project(tmp.path());
    fs::write(tmp.path().join("requirements.txt"), "requests\n").expect("requirements");

    Command::cargo_bin("propex")
        .expect("binary")
        .arg("detect")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::eq("rust\npython\n").or(predicate::eq("rust\r\npython\r\n")));
}

#[test]
fn only_with_non_applicable_configurator_fails() {
    let tmp = tempdir().expect("tempdir");
    cargo_project(tmp.path());

    let assert = Command::cargo_bin("propex")
        .expect("binary")
        .args(["export", "--only", "js"])
        .arg(tmp.path())
        .assert()
        .code(1);

    let stderr = normalize_output(&assert.get_output().stderr);
    assert!(stderr.contains("error (export)"), "stderr was: {stderr}");
    assert!(stderr.contains("does not apply"), "stderr was: {stderr}");
}

#[test]
fn broken_manifest_reports_project_context() {
    let tmp = tempdir().expect("tempdir");
    fs::write(tmp.path().join("package.json"), "{ not json").expect("package.json");

    Command::cargo_bin("propex")
        .expect("binary")
        .arg("export")
        .arg(tmp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("`js` failed to configure project"));
}

#[test]
fn missing_project_directory_is_reported() {
    let tmp = tempdir().expect("tempdir");

    Command::cargo_bin("propex")
        .expect("binary")
        .args(["detect"])
        .arg(tmp.path().join("missing"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}
