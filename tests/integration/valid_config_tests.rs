//! Runs a full collection pass with valid configs. These read the host's real
//! counters and processes, so they only check the shape of the output.

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::{no_cfg_sbcmon_command, sbcmon_command, temp_config};

#[test]
fn test_empty() {
    no_cfg_sbcmon_command()
        .arg("-r")
        .arg("250ms")
        .assert()
        .success()
        .stdout(predicate::str::contains("cpu: "))
        .stdout(predicate::str::contains("cpu0:").not());
}

#[test]
fn test_per_core() {
    sbcmon_command(&["-C", "./tests/valid_configs/per_core.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cpu0: "));
}

#[test]
fn test_finds_itself() {
    sbcmon_command(&["-C", "./tests/valid_configs/self_process.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("process sbcmon: pid "))
        .stdout(predicate::str::contains("  exe: "));
}

#[test]
fn test_missing_process() {
    no_cfg_sbcmon_command()
        .args(["-r", "250", "-p", "definitely-not-a-running-program"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "process definitely-not-a-running-program: not running",
        ));
}

#[test]
fn test_args_override_config() {
    let config = temp_config("[process]\nname = \"definitely-not-a-running-program\"\n");

    sbcmon_command(&["-C", config.path().to_str().unwrap()])
        .args(["-r", "250", "-p", "sbcmon"])
        .assert()
        .success()
        .stdout(predicate::str::contains("process sbcmon: pid "));
}

#[test]
fn test_wireless_adapter() {
    // Whether /proc/net/wireless exists depends on the host, but the adapter
    // should never be found either way.
    no_cfg_sbcmon_command()
        .args(["-r", "250", "-a", "sbcmon-test0", "--backend", "proc"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("wireless sbcmon-test0: no wireless backend available").or(
                predicate::str::contains("wireless sbcmon-test0: wireless adapter not found"),
            ),
        );
}

#[cfg(feature = "logging")]
#[test]
fn test_debug_log() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("debug.log");

    no_cfg_sbcmon_command()
        .args(["-r", "250", "-p", "sbcmon", "--debug_log"])
        .arg(&log)
        .assert()
        .success();

    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.contains("[DEBUG]"));
}
