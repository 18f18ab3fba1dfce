//! Integration tests for `collect` that do not need the host tracer.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_dry_run_lists_the_plan() {
    let env = TestEnv::new();

    env.command()
        .args(["collect", "alpine", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run, would perform:"))
        .stdout(predicate::str::contains("qemu <installed>"))
        .stdout(predicate::str::contains(
            "Start file-access trace for limactl, qemu-img, qemu-system-aarch64",
        ))
        .stdout(predicate::str::contains("Run VM template alpine"))
        .stdout(predicate::str::contains("deps-verification-arm64.txt"));
}

#[test]
fn test_dry_run_json() {
    let env = TestEnv::new();
    let output = env
        .command()
        .args(["collect", "--dry-run", "--no-trace", "--output", "json"])
        .env("BUNDLEDEPS_QEMU_VERSION", "9.0.2")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["dry_run"], true);
    let actions = json["actions_taken"].as_array().unwrap();
    assert_eq!(actions.len(), 2);
    assert!(actions[0].as_str().unwrap().ends_with("(qemu 9.0.2)"));
    assert!(json["warnings"][0]
        .as_str()
        .unwrap()
        .contains("runtime discovery disabled"));
}

/// Static-only collection on a complete install, bootstrapping then using a
/// baseline.
#[test]
fn test_static_collection_writes_then_verifies_a_baseline() {
    let env = TestEnv::new();
    env.file("Cellar/lima/1.0/bin/limactl", 4096)
        .link("bin/limactl", "../Cellar/lima/1.0/bin/limactl")
        .file("Cellar/qemu/9.0.2/bin/qemu-img", 1024)
        .file("Cellar/qemu/9.0.2/bin/qemu-system-aarch64", 8192)
        .link("bin/qemu-img", "../Cellar/qemu/9.0.2/bin/qemu-img")
        .link(
            "bin/qemu-system-aarch64",
            "../Cellar/qemu/9.0.2/bin/qemu-system-aarch64",
        )
        .link("share/qemu", "../Cellar/qemu/9.0.2/share/qemu");
    std::fs::create_dir_all(env.path("Cellar/qemu/9.0.2/share/qemu")).unwrap();
    let baselines = env.scratch("baselines");
    std::fs::create_dir_all(&baselines).unwrap();
    let baseline = baselines.join("deps-verification-arm64.txt");

    env.command()
        .args(["collect", "--no-trace", "--write-baseline"])
        .arg(&baseline)
        .env("BUNDLEDEPS_QEMU_VERSION", "9.0.2")
        .env("BUNDLEDEPS_BASELINE_DIR", &baselines)
        .assert()
        .success()
        .stdout(predicate::str::contains("Verification skipped"));
    assert!(baseline.is_file());

    let registry = env.scratch("registry.txt");
    env.command()
        .args(["collect", "--no-trace", "--registry-out"])
        .arg(&registry)
        .env("BUNDLEDEPS_QEMU_VERSION", "9.0.2")
        .env("BUNDLEDEPS_BASELINE_DIR", &baselines)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dependency verification PASSED"));
    assert!(registry.is_file());
}

#[test]
fn test_missing_seed_fails_collection() {
    let env = TestEnv::new();

    env.command()
        .args(["collect", "--no-trace", "--no-verify"])
        .env("BUNDLEDEPS_QEMU_VERSION", "9.0.2")
        .assert()
        .code(6)
        .stderr(predicate::str::contains("bin/limactl"));
}
