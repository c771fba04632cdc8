use serde::Deserialize;

use crate::collection::wireless::BackendKind;

/// Settings for the wireless link.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct WirelessConfig {
    /// The adapter to report on, such as `wlan0`.
    pub(crate) adapter: Option<String>,

    /// Forces a specific backend instead of picking the best available one.
    pub(crate) backend: Option<BackendKind>,
}
