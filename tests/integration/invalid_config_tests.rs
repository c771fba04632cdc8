//! These tests are for testing some invalid config-file-specific options.

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::{sbcmon_command, temp_config};

#[test]
fn test_toml_mismatch_type() {
    sbcmon_command(&["-C", "./tests/invalid_configs/toml_mismatch_type.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid type"));
}

#[test]
fn test_unknown_backend() {
    sbcmon_command(&["-C", "./tests/invalid_configs/unknown_backend.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown variant"));
}

#[test]
fn test_invalid_sync_interval() {
    sbcmon_command(&["-C", "./tests/invalid_configs/invalid_sync_interval.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'sync_interval' in '[process]' was set with an invalid value",
        ));
}

#[test]
fn test_small_rate() {
    sbcmon_command(&["-C", "./tests/invalid_configs/small_rate.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'rate' in '[general]' must be greater than 250ms",
        ));
}

/// Rejected by the TOML parser itself.
#[test]
fn test_duplicate_key() {
    sbcmon_command(&["-C", "./tests/invalid_configs/duplicate_key.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate key"));
}

#[test]
fn test_unclosed_table() {
    let config = temp_config("[process\nname = \"nginx\"\n");

    sbcmon_command(&["-C", config.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file error"));
}
