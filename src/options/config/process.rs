use serde::Deserialize;

use super::StringOrNum;

/// Settings for tracking a named process.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ProcessConfig {
    /// The process to look for.
    pub(crate) name: Option<String>,

    #[serde(default)]
    pub(crate) disable_pid_caching: bool,

    pub(crate) sync_interval: Option<StringOrNum>,
}
