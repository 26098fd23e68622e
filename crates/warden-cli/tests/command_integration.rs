//! Integration tests for CLI commands.
//!
//! Each test initializes a project in a temporary directory and drives the
//! binary against it.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A command that ignores the caller's environment and user config.
fn isolated(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("warden").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"));
    for (name, _) in std::env::vars_os() {
        if name.to_string_lossy().starts_with("WARDEN_") {
            cmd.env_remove(name);
        }
    }
    cmd
}

fn warden(project: &Path) -> Command {
    let mut cmd = isolated(&project.join(".home"));
    cmd.arg("--no-color").arg("--project").arg(project);
    cmd
}

fn initialized() -> TempDir {
    let temp = TempDir::new().unwrap();
    isolated(&temp.path().join(".home"))
        .arg("init")
        .arg(temp.path())
        .assert()
        .success();
    temp
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn init_writes_gitignore_entry() {
    let temp = initialized();

    let gitignore = fs::read_to_string(temp.path().join(".gitignore")).unwrap();
    assert!(gitignore.lines().any(|l| l == "warden.local.toml"));
}

#[test]
fn init_twice_fails() {
    let temp = initialized();

    isolated(&temp.path().join(".home"))
        .arg("init")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

// ============================================================================
// Policies
// ============================================================================

#[test]
fn policies_lists_sample_policies() {
    let temp = initialized();

    warden(temp.path())
        .arg("policies")
        .assert()
        .success()
        .stdout(predicate::str::contains("reports"))
        .stdout(predicate::str::contains("admin_panel"))
        .stdout(predicate::str::contains("legacy_export"))
        .stdout(predicate::str::contains("locked"));
}

#[test]
fn policies_without_config_is_empty() {
    let temp = TempDir::new().unwrap();

    warden(temp.path())
        .arg("policies")
        .assert()
        .success()
        .stdout(predicate::str::contains("No policies declared"));
}

// ============================================================================
// Check
// ============================================================================

#[test]
fn check_grants_matching_principal() {
    let temp = initialized();

    warden(temp.path())
        .args([
            "check", "reports", "--user", "ann", "--role", "analyst", "--claim", "dept=finance",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Access granted"));
}

#[test]
fn check_denies_missing_claim() {
    let temp = initialized();

    warden(temp.path())
        .args(["check", "reports", "--user", "ann", "--role", "analyst"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required claim 'dept'"));
}

#[test]
fn check_denies_unlisted_role() {
    let temp = initialized();

    warden(temp.path())
        .args(["check", "reports", "--user", "ann", "--role", "intern"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Access denied by policy 'reports'"));
}

#[test]
fn check_allows_user_id_listed_as_role() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("warden.toml"),
        "[policies.billing]\nallow_users = [\"bob\"]\n",
    )
    .unwrap();

    warden(temp.path())
        .args(["check", "billing", "--user", "bob"])
        .assert()
        .success();

    warden(temp.path())
        .args(["check", "billing", "--user", "eve"])
        .assert()
        .failure();
}

#[test]
fn check_deny_list_without_allow_list() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("warden.toml"),
        "[policies.wiki]\ndeny_roles = [\"contractor\"]\n",
    )
    .unwrap();

    warden(temp.path())
        .args(["check", "wiki", "--user", "ann"])
        .assert()
        .success();

    warden(temp.path())
        .args(["check", "wiki", "--user", "ann", "--role", "contractor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("role 'contractor' is denied"));
}

#[test]
fn check_locked_policy_denies_everyone() {
    let temp = initialized();

    warden(temp.path())
        .args(["check", "legacy_export", "--user", "ann", "--role", "admin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("grants access to no one"));
}

#[test]
fn check_anonymous_is_refused() {
    let temp = initialized();

    warden(temp.path())
        .args(["check", "profile", "--anonymous"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not authenticated"));
}

#[test]
fn check_unknown_policy_fails() {
    let temp = initialized();

    warden(temp.path())
        .args(["check", "nope", "--user", "ann"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Declared policies: admin_panel, legacy_export, profile, reports",
        ))
        .stderr(predicate::str::contains("Unknown policy: nope"));
}

#[test]
fn check_rejects_malformed_claim() {
    let temp = initialized();

    warden(temp.path())
        .args(["check", "profile", "--user", "ann", "--claim", "dept"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected type=value"));
}

#[test]
fn local_config_overrides_project() {
    let temp = initialized();
    fs::write(
        temp.path().join("warden.local.toml"),
        "[policies.reports]\nallow_roles = [\"intern\"]\n",
    )
    .unwrap();

    warden(temp.path())
        .args(["check", "reports", "--user", "ann", "--role", "intern", "--claim", "dept=eng"])
        .assert()
        .success();
}

#[test]
fn env_list_override_applies() {
    let temp = initialized();

    warden(temp.path())
        .env("WARDEN_POLICIES__PROFILE__ALLOW_ROLES", "admin,ops")
        .args(["check", "profile", "--user", "ann"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("matches no allowed role or user"));

    warden(temp.path())
        .env("WARDEN_POLICIES__PROFILE__ALLOW_ROLES", "admin,ops")
        .args(["check", "profile", "--user", "ann", "--role", "ops"])
        .assert()
        .success();
}

#[test]
#[cfg(target_os = "linux")] // XDG layout
fn user_config_is_layered_under_project() {
    let temp = initialized();
    let user_dir = temp.path().join(".home/.config/warden");
    fs::create_dir_all(&user_dir).unwrap();
    fs::write(
        user_dir.join("config.toml"),
        "[policies.audit_log]\nallow_roles = [\"auditor\"]\n",
    )
    .unwrap();

    warden(temp.path())
        .args(["check", "audit_log", "--user", "ann", "--role", "auditor"])
        .assert()
        .success();
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn config_show_text() {
    let temp = initialized();

    warden(temp.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warden Configuration"))
        .stdout(predicate::str::contains("reports"));
}

#[test]
fn config_show_json() {
    let temp = initialized();

    let output = warden(temp.path())
        .args(["config", "show", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["locked"][0], "legacy_export");
    assert!(value["policies"]["profile"].is_object());
}

#[test]
fn config_show_rejects_unknown_format() {
    let temp = initialized();

    warden(temp.path())
        .args(["config", "show", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}

#[test]
fn config_validate_accepts_sample() {
    let temp = initialized();

    warden(temp.path())
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn config_validate_reports_parse_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("warden.toml"), "[policies.reports\n").unwrap();

    warden(temp.path())
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("validation failed"));
}

#[test]
fn config_validate_rejects_locked_duplicate() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("warden.toml"),
        "locked = [\"reports\"]\n\n[policies.reports]\nallow_roles = [\"admin\"]\n",
    )
    .unwrap();

    warden(temp.path())
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reports"));
}

#[test]
fn explicit_config_file_is_layered() {
    let temp = initialized();
    let extra = temp.path().join("extra.toml");
    fs::write(&extra, "locked = [\"profile_v2\"]\n").unwrap();

    warden(temp.path())
        .arg("--config")
        .arg(&extra)
        .args(["check", "profile_v2", "--user", "ann"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("grants access to no one"));
}
