use serde::Deserialize;

/// CPU settings.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct CpuConfig {
    /// Report every core, not just the average.
    #[serde(default)]
    pub(crate) per_core: bool,
}
