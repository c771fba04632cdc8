//! These tests are mostly here just to ensure that invalid results will be
//! caught when passing arguments.

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::{no_cfg_sbcmon_command, sbcmon_command};

#[test]
fn test_small_rate() {
    no_cfg_sbcmon_command()
        .arg("-r")
        .arg("249")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'--rate' must be greater than 250ms",
        ));
}

#[test]
fn test_invalid_rate() {
    no_cfg_sbcmon_command()
        .arg("--rate")
        .arg("often")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'--rate' was set with an invalid value",
        ));
}

#[test]
fn test_empty_process_name() {
    no_cfg_sbcmon_command()
        .arg("-p")
        .arg("")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'--process' was set with an invalid value",
        ));
}

#[test]
fn test_empty_adapter() {
    no_cfg_sbcmon_command()
        .arg("-a")
        .arg("")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'--adapter' was set with an invalid value",
        ));
}

#[test]
fn test_invalid_backend() {
    no_cfg_sbcmon_command()
        .arg("--backend")
        .arg("wext")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'wext'"));
}

#[test]
fn test_missing_config() {
    sbcmon_command(&["-C", "./tests/does_not_exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not read the config file"));
}

#[test]
fn test_help() {
    sbcmon_command(&["--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Process Options"))
        .stdout(predicate::str::contains("Wireless Options"))
        .stdout(predicate::str::contains("--disable_pid_caching"));
}

#[test]
fn test_version() {
    sbcmon_command(&["--version"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("sbcmon"));
}
