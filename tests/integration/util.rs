use std::{ffi::OsString, io::Write, path::Path, process::Command};

use tempfile::NamedTempFile;

const SBCMON_EXE_PATH: &str = env!("CARGO_BIN_EXE_sbcmon");
const DEFAULT_CFG: [&str; 2] = ["-C", "./tests/valid_configs/empty_config.toml"];

pub fn abs_path(path: &str) -> OsString {
    let path = Path::new(path);

    if path.exists() {
        path.canonicalize().unwrap().into_os_string()
    } else {
        // Let sbcmon complain about it.
        path.to_owned().into_os_string()
    }
}

/// Returns the [`Command`] of a binary invocation of sbcmon with the given
/// arguments. Config paths are made absolute.
pub fn sbcmon_command(args: &[&str]) -> Command {
    let mut cmd = Command::new(SBCMON_EXE_PATH);

    let mut prev = "";
    for arg in args.iter() {
        if prev == "-C" {
            cmd.arg(abs_path(arg));
        } else {
            cmd.arg(arg);
        }

        prev = arg;
    }

    cmd
}

/// Returns the [`Command`] of a binary invocation of sbcmon using the empty
/// config file, so the user's own config can't get in the way.
pub fn no_cfg_sbcmon_command() -> Command {
    sbcmon_command(&DEFAULT_CFG)
}

/// Writes a throwaway config file.
pub fn temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();

    file
}
