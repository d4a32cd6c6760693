#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, TempDir};

fn config_dir(json: &str) -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("orderboard.json"), json).unwrap();
    dir
}

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("orderboard-cli").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

const CONFIG: &str = r#"{"token":"secret","target_channel_id":1001,"help_image":null}"#;

#[test]
fn missing_config_is_fatal() {
    let dir = tempdir().unwrap();
    cli(&dir)
        .arg("check-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading configuration"));
}

#[test]
fn malformed_config_is_fatal() {
    let dir = config_dir(r#"{"token":"secret","target_channel_id":1001,"timezone":"Nowhere/City"}"#);
    cli(&dir)
        .arg("check-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown timezone"));
}

#[test]
fn check_config_prints_effective_settings() {
    let dir = config_dir(CONFIG);
    cli(&dir)
        .arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("reset: daily at 12:30 (Asia/Seoul)"))
        .stdout(predicate::str::contains("target channel: 1001"));
}

#[test]
fn preview_renders_orders() {
    let dir = config_dir(CONFIG);
    cli(&dir)
        .args(["preview", "--orders", "Alice=Salad,Bob=Poke", "--at", "10:15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 ordering right now"))
        .stdout(predicate::str::contains("👤 **Bob**: Poke"))
        .stdout(predicate::str::contains("Last update: 10:15"));
}

#[test]
fn console_session_orders_then_resets() {
    let dir = config_dir(CONFIG);
    let script = "start\norder Alice Salad\norder Bob Poke\norder Alice Soup\ntick 12:30\ntick 12:30\n";
    cli(&dir)
        .args(["run", "--manual-clock"])
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("👤 **Alice**: Soup\n👤 **Bob**: Poke"))
        .stdout(predicate::str::contains("Today's orders have been cleared."))
        .stdout(predicate::str::contains("reset: 2 order(s) cleared"))
        .stdout(predicate::str::contains("no reset at 12:30"))
        .stdout(predicate::str::contains("No orders yet"));
}

#[test]
fn console_rejects_start_elsewhere() {
    let dir = config_dir(CONFIG);
    cli(&dir)
        .args(["run", "--manual-clock"])
        .write_stdin("start 9999\nboard\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("only be used in <#1001>"))
        .stdout(predicate::str::contains("no board yet"));
}
