//! The TOML config file.

pub mod cpu;
pub mod general;
pub mod process;
pub mod wireless;

use std::{fs, io, path::Path};

use serde::Deserialize;

use self::{cpu::CpuConfig, general::GeneralConfig, process::ProcessConfig, wireless::WirelessConfig};
use super::{OptionError, OptionResult};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub(crate) general: GeneralConfig,
    #[serde(default)]
    pub(crate) cpu: CpuConfig,
    #[serde(default)]
    pub(crate) process: ProcessConfig,
    #[serde(default)]
    pub(crate) wireless: WirelessConfig,
}

impl Config {
    /// Reads the config at `path`. If the file doesn't exist and `must_exist` is
    /// false, the defaults are used instead.
    pub fn read(path: &Path, must_exist: bool) -> OptionResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(toml_edit::de::from_str(&contents)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound && !must_exist => {
                log::debug!("No config file at {}, using defaults", path.display());
                Ok(Config::default())
            }
            Err(err) => Err(OptionError::config_file(path, &err)),
        }
    }
}

/// A value that may be given as either a string or a number, such as a duration
/// of `"10s"` or `10000`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub(crate) enum StringOrNum {
    String(String),
    Num(u64),
}

impl From<String> for StringOrNum {
    fn from(value: String) -> Self {
        StringOrNum::String(value)
    }
}

impl From<u64> for StringOrNum {
    fn from(value: u64) -> Self {
        StringOrNum::Num(value)
    }
}
