//! CLI Integration Tests
//!
//! Runs the binary against a config with every backend disabled, so no
//! terminal application is ever scripted.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const OFFLINE_CONFIG: &str = "[discovery]\nbackends = []\n";

/// Get the binary to test.
fn termroute() -> Command {
    Command::cargo_bin("termroute").unwrap()
}

/// A temp dir holding an offline config, plus the config path argument.
fn offline() -> (TempDir, String) {
    let temp = TempDir::new().unwrap();
    let file = temp.child("termroute.toml");
    file.write_str(OFFLINE_CONFIG).unwrap();
    let path = file.path().display().to_string();
    (temp, path)
}

// ============================================================================
// Help & Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    termroute()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Send commands to the terminals"));
}

#[test]
fn test_version_flag() {
    termroute()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_send_help() {
    termroute()
        .args(["send", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--to"))
        .stdout(predicate::str::contains("--yes"));
}

// ============================================================================
// Discovery Tests
// ============================================================================

#[test]
fn test_list_without_backends() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No terminals found"));
}

#[test]
fn test_list_json() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_config_from_env() {
    let (_temp, config) = offline();
    termroute()
        .env("TERMROUTE_CONFIG", &config)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No terminals found"));
}

#[test]
fn test_resolve_local_keyword() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "resolve", "Here"])
        .assert()
        .success()
        .stdout(predicate::str::contains("local"));
}

#[test]
fn test_resolve_unknown() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "resolve", "api"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Terminal 'api' not found"));
}

#[test]
fn test_suggest_nothing() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "suggest", "ter"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No suggestions for 'ter'"));
}

#[test]
fn test_focused_without_backends() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "focused"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No focused terminal"));
}

// ============================================================================
// Routing Tests
// ============================================================================

#[cfg(unix)]
#[test]
fn test_send_runs_locally() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "send", "echo routed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("routed"));
}

#[cfg(unix)]
#[test]
fn test_send_propagates_exit_code() {
    let (_temp, config) = offline();
    termroute().args(["--config", &config, "send", "exit 3"]).assert().code(3);
}

#[test]
fn test_send_dangerous_local_can_be_declined() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "send", "mkfs /dev/null"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dangerous command detected: mkfs"))
        .stdout(predicate::str::contains("Cancelled"));
}

#[test]
fn test_send_to_unknown_target() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "send", "ls", "--to", "terminal 2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Terminal 'terminal 2' not found"));
}

#[test]
fn test_text_to_local_is_rejected() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "text", "hello", "--to", "local"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot send raw text to the local terminal"));
}

#[test]
fn test_parse_unresolved_contextual() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "parse", "in warp, npm test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("target: (current)"))
        .stdout(predicate::str::contains("command: in warp, npm test"));
}

#[test]
fn test_status() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Current target: Local Terminal"))
        .stdout(predicate::str::contains("Terminals: 0"));
}

#[test]
fn test_status_json() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "status", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_targets\": 0"));
}

// ============================================================================
// Alias Tests
// ============================================================================

#[test]
fn test_alias_list_empty() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "alias", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No aliases configured"));
}

#[test]
fn test_alias_remove_persists() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("termroute.toml");
    file.write_str(
        "[discovery]\nbackends = []\n\n[[aliases]]\nname = \"api\"\ntarget = \"Warp:1\"\n",
    )
    .unwrap();
    let config = file.path().display().to_string();

    termroute()
        .args(["--config", &config, "alias", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api -> Warp:1"));

    termroute()
        .args(["--config", &config, "alias", "remove", "API"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed alias"));

    file.assert(predicate::str::contains("Warp:1").not());
}

#[test]
fn test_alias_remove_missing() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "alias", "remove", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No alias named 'nope'"));
}

#[test]
fn test_alias_set_unknown_target() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "alias", "set", "warp 1", "api"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Terminal 'warp 1' not found"));
}

// ============================================================================
// Interactive Session Tests
// ============================================================================

#[test]
fn test_repl_session() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "repl"])
        .write_stdin("list terminals\nswitch to warp\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No terminals found"))
        .stdout(predicate::str::contains("Could not find terminal: warp"))
        .stdout(predicate::str::contains("Goodbye!"));
}

#[test]
fn test_repl_ends_on_eof() {
    let (_temp, config) = offline();
    termroute().args(["--config", &config, "repl"]).write_stdin("").assert().success();
}

// ============================================================================
// Config & Completions Tests
// ============================================================================

#[test]
fn test_config_path() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("termroute.toml"));
}

#[test]
fn test_config_shows_defaults() {
    let (_temp, config) = offline();
    termroute()
        .args(["--config", &config, "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("refresh_interval_secs = 5"))
        .stdout(predicate::str::contains("history_limit = 50"));
}

#[test]
fn test_completions_bash() {
    termroute()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("termroute"));
}
