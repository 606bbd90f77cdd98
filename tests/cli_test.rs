//! Integration tests for the dsdlgen binary

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn dsdlgen() -> Command {
    let mut cmd = Command::cargo_bin("dsdlgen").unwrap();
    cmd.env_remove("DSDLGEN_TEMPLATE_DIR");
    cmd
}

/// Template root with the structure template and its shared header only
fn structure_templates_only() -> TempDir {
    let templates = TempDir::new().unwrap();
    fs::create_dir(templates.path().join("common")).unwrap();
    for name in ["StructureType.j2", "common/header.j2"] {
        fs::copy(
            fixtures().join("templates").join(name),
            templates.path().join(name),
        )
        .unwrap();
    }
    templates
}

#[test]
fn test_generate_command_writes_files() {
    let out = TempDir::new().unwrap();

    dsdlgen()
        .arg("generate")
        .arg("--manifest")
        .arg(fixtures().join("types.yaml"))
        .arg("--templates-dir")
        .arg(fixtures().join("templates"))
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated 3 file(s)"))
        .stdout(predicate::str::contains("Heartbeat_1_0.hpp"));

    assert!(out.path().join("uavcan/node/Heartbeat_1_0.hpp").is_file());
    assert!(out.path().join("uavcan/primitive/Value_1_0.hpp").is_file());
    assert!(out.path().join("uavcan/node/GetInfo_1_0.hpp").is_file());
}

#[test]
fn test_generate_dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");

    dsdlgen()
        .arg("generate")
        .arg("--manifest")
        .arg(fixtures().join("types.yaml"))
        .arg("--templates-dir")
        .arg(fixtures().join("templates"))
        .arg("--output-dir")
        .arg(&out)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run: rendered 3 file(s)"));

    assert!(!out.exists());
}

#[test]
fn test_template_dir_from_environment() {
    let out = TempDir::new().unwrap();

    dsdlgen()
        .env("DSDLGEN_TEMPLATE_DIR", fixtures().join("templates"))
        .arg("generate")
        .arg("--manifest")
        .arg(fixtures().join("types.json"))
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success();

    assert!(out.path().join("uavcan/node/Health_1_0.hpp").is_file());
}

#[test]
fn test_generate_from_config_file() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("from-config");
    let config = tmp.path().join("dsdlgen.toml");
    fs::write(
        &config,
        format!(
            "output_dir = {:?}\ntemplate_dir = {:?}\nfailure_policy = \"best_effort\"\n",
            out.display().to_string(),
            fixtures().join("templates").display().to_string()
        ),
    )
    .unwrap();

    dsdlgen()
        .arg("generate")
        .arg("--manifest")
        .arg(fixtures().join("types.json"))
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert!(out.join("uavcan/node/Health_1_0.hpp").is_file());
}

#[test]
fn test_missing_template_dir_fails() {
    let tmp = TempDir::new().unwrap();

    dsdlgen()
        .arg("generate")
        .arg("--manifest")
        .arg(fixtures().join("types.yaml"))
        .arg("--templates-dir")
        .arg(tmp.path().join("missing"))
        .arg("--output-dir")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_missing_variant_template_fails_without_writing() {
    let templates = structure_templates_only();
    let out = TempDir::new().unwrap();

    dsdlgen()
        .arg("generate")
        .arg("--manifest")
        .arg(fixtures().join("types.yaml"))
        .arg("--templates-dir")
        .arg(templates.path())
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_best_effort_reports_every_failure() {
    let templates = structure_templates_only();
    let out = TempDir::new().unwrap();

    dsdlgen()
        .arg("generate")
        .arg("--manifest")
        .arg(fixtures().join("types.yaml"))
        .arg("--templates-dir")
        .arg(templates.path())
        .arg("--output-dir")
        .arg(out.path())
        .arg("--best-effort")
        .assert()
        .failure()
        .stderr(predicate::str::contains("2 of 3 types failed to generate"));

    assert!(out.path().join("uavcan/node/Heartbeat_1_0.hpp").is_file());
}

#[test]
fn test_check_templates_command() {
    dsdlgen()
        .arg("check-templates")
        .arg("--templates-dir")
        .arg(fixtures().join("templates"))
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ StructureType.j2"))
        .stdout(predicate::str::contains("✓ UnionType.j2"))
        .stdout(predicate::str::contains("✓ ServiceType.j2"));
}

#[test]
fn test_check_templates_reports_missing() {
    let templates = TempDir::new().unwrap();
    fs::write(templates.path().join("UnionType.j2"), "").unwrap();

    dsdlgen()
        .arg("check-templates")
        .arg("--templates-dir")
        .arg(templates.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗ StructureType.j2 (missing)"))
        .stderr(predicate::str::contains("Missing templates"));
}
